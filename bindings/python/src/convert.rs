// bindings/python/src/convert.rs
use pyo3::exceptions::{PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyString;

use bann_core::{BannError, DivergenceKind, PointSet};

/// Every engine error surfaces as `ValueError`.
pub fn to_py_err(err: BannError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// A 2-D numeric matrix argument: an ndarray with `ndim == 2` or a nested
/// sequence of rows.
#[derive(Debug)]
pub struct Matrix(pub PointSet);

impl<'source> FromPyObject<'source> for Matrix {
    fn extract(ob: &'source PyAny) -> PyResult<Self> {
        if ob.is_instance_of::<PyString>() {
            return Err(PyTypeError::new_err(
                "expected a 2-D numeric matrix, got str",
            ));
        }

        let rows: Vec<Vec<f64>> = if ob.hasattr("ndim")? && ob.hasattr("tolist")? {
            let ndim: usize = ob.getattr("ndim")?.extract()?;
            if ndim != 2 {
                return Err(PyValueError::new_err(format!(
                    "expected a 2-D matrix, got {ndim} dimension(s)"
                )));
            }
            ob.call_method0("tolist")?.extract()?
        } else {
            match ob.extract::<Vec<Vec<f64>>>() {
                Ok(rows) => rows,
                Err(_) if ob.extract::<Vec<f64>>().is_ok() => {
                    return Err(PyValueError::new_err(
                        "expected a 2-D matrix, got a 1-D sequence",
                    ));
                }
                Err(_) => {
                    return Err(PyTypeError::new_err(format!(
                        "expected a 2-D numeric matrix, got {}",
                        ob.get_type().name()?
                    )));
                }
            }
        };

        PointSet::from_rows(&rows).map(Matrix).map_err(to_py_err)
    }
}

/// The `div` argument: a tag string, or an explicit `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum DivArg {
    Tag(String),
    Missing,
}

impl DivArg {
    pub fn kl() -> Self {
        DivArg::Tag(DivergenceKind::KullbackLeibler.tag().to_owned())
    }

    pub fn kind(&self) -> PyResult<DivergenceKind> {
        match self {
            DivArg::Tag(tag) => tag.parse().map_err(to_py_err),
            DivArg::Missing => Err(to_py_err(BannError::parameter(
                "div",
                "a divergence tag is required, got None",
            ))),
        }
    }
}

impl<'source> FromPyObject<'source> for DivArg {
    fn extract(ob: &'source PyAny) -> PyResult<Self> {
        if ob.is_none() {
            return Ok(DivArg::Missing);
        }
        if !ob.is_instance_of::<PyString>() {
            return Err(PyTypeError::new_err(format!(
                "divergence tag must be a str, got {}",
                ob.get_type().name()?
            )));
        }
        Ok(DivArg::Tag(ob.extract()?))
    }
}

/// Python ints arrive signed; anything below 1 is a parameter error.
pub fn neighbor_count(k: i64) -> PyResult<usize> {
    usize::try_from(k)
        .ok()
        .filter(|&k| k >= 1)
        .ok_or_else(|| to_py_err(BannError::parameter("k", format!("must be at least 1, got {k}"))))
}

/// Index rows as an `(n, k)` int ndarray when numpy is importable, else a
/// list of lists.
pub fn index_matrix(py: Python<'_>, rows: Vec<Vec<usize>>, k: usize) -> PyResult<PyObject> {
    let n = rows.len();
    match py.import("numpy") {
        Ok(np) => {
            let arr = np.call_method1("asarray", (rows, "int64"))?;
            Ok(arr.call_method1("reshape", ((n, k),))?.into_py(py))
        }
        Err(_) => Ok(rows.into_py(py)),
    }
}
