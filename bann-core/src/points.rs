//! Row-major point sets.
//!
//! A `PointSet` stores `len` vectors of dimension `dim` in one flat buffer:
//! point `i` is `coords[i*dim..(i+1)*dim]`. Every vector of one set shares
//! the same dimension; construction rejects ragged input.

use crate::error::{BannError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct PointSet {
    coords: Vec<f64>,
    dim: usize,
    len: usize,
}

impl PointSet {
    /// Wrap a flat row-major buffer.
    pub fn from_flat(coords: Vec<f64>, dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(BannError::dimension(1, 0, "point dimension must be positive"));
        }
        if coords.len() % dim != 0 {
            return Err(BannError::dimension(
                dim,
                coords.len() % dim,
                format!("flat buffer of {} values is not a multiple of the dimension", coords.len()),
            ));
        }
        let len = coords.len() / dim;
        Ok(PointSet { coords, dim, len })
    }

    /// Copy rows into a new set. All rows must share the first row's length.
    ///
    /// An empty slice yields an empty set of dimension 0.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Ok(PointSet {
                coords: Vec::new(),
                dim: 0,
                len: 0,
            });
        };
        let dim = first.as_ref().len();
        if dim == 0 {
            return Err(BannError::dimension(1, 0, "row 0 is empty"));
        }
        let mut coords = Vec::with_capacity(dim * rows.len());
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != dim {
                return Err(BannError::dimension(dim, row.len(), format!("row {i}")));
            }
            coords.extend_from_slice(row);
        }
        Ok(PointSet {
            coords,
            dim,
            len: rows.len(),
        })
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.coords[i * self.dim..(i + 1) * self.dim]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[f64]> + '_ {
        // chunks_exact panics on 0; an empty set has no rows anyway.
        self.coords.chunks_exact(self.dim.max(1))
    }

    pub fn as_flat(&self) -> &[f64] {
        &self.coords
    }

    /// Fails with a dimension error unless `actual` equals this set's dimension.
    pub fn expect_dim(&self, actual: usize, context: &str) -> Result<()> {
        if actual != self.dim {
            return Err(BannError::dimension(self.dim, actual, context.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows() {
        let set = PointSet::from_rows(&[vec![0.1, 0.2], vec![0.3, 0.4], vec![0.5, 0.6]]).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.dim(), 2);
        assert_eq!(set.row(1), &[0.3, 0.4]);
        assert_eq!(set.iter().count(), 3);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = PointSet::from_rows(&[vec![0.1, 0.2], vec![0.3]]).unwrap_err();
        assert!(err.is_dimension());
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn test_from_flat() {
        let set = PointSet::from_flat(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.row(1), &[4.0, 5.0, 6.0]);
        assert!(PointSet::from_flat(vec![1.0, 2.0, 3.0], 2).unwrap_err().is_dimension());
        assert!(PointSet::from_flat(vec![], 0).unwrap_err().is_dimension());
    }

    #[test]
    fn test_empty() {
        let rows: Vec<Vec<f64>> = Vec::new();
        let set = PointSet::from_rows(&rows).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.iter().count(), 0);
    }
}
