// bindings/python/src/index.rs
use pyo3::prelude::*;

use bann_tree::{BuildConfig, IndexCache, KnnResult, SearchParams};

use crate::convert::{index_matrix, neighbor_count, to_py_err, DivArg, Matrix};

/// Reusable index over one data matrix.
///
/// Trees are built per divergence on first use and kept until the data is
/// replaced or `clear()` is called.
#[pyclass(module = "bann")]
pub struct BannIndex {
    cache: IndexCache,
}

#[pymethods]
impl BannIndex {
    #[new]
    #[pyo3(signature = (data, leaf_size=32, max_depth=64))]
    fn new(data: Matrix, leaf_size: usize, max_depth: usize) -> PyResult<Self> {
        let config = BuildConfig {
            leaf_size,
            max_depth,
        };
        let cache = IndexCache::new(data.0, config).map_err(to_py_err)?;
        Ok(BannIndex { cache })
    }

    /// Same as the module-level `k_search`, against this index's data.
    #[pyo3(signature = (query, k=1, eps=0.0, div=DivArg::kl()))]
    fn k_search(
        &self,
        py: Python<'_>,
        query: Matrix,
        k: i64,
        eps: f64,
        div: DivArg,
    ) -> PyResult<PyObject> {
        let kind = div.kind()?;
        let k = neighbor_count(k)?;
        let params = SearchParams::new(k, eps).map_err(to_py_err)?;
        let query = query.0;
        let hits = py
            .allow_threads(|| self.cache.k_search(&query, &params, kind))
            .map_err(to_py_err)?;
        let rows = hits.iter().map(KnnResult::indices).collect();
        index_matrix(py, rows, k)
    }

    /// Same as the module-level `bhaus`, with this index's data as `data`.
    #[pyo3(signature = (query, eps=0.0, div=DivArg::kl()))]
    fn bhaus(&self, py: Python<'_>, query: Matrix, eps: f64, div: DivArg) -> PyResult<f64> {
        let kind = div.kind()?;
        let query = query.0;
        let result = py
            .allow_threads(|| self.cache.hausdorff(&query, eps, kind))
            .map_err(to_py_err)?;
        Ok(result.value)
    }

    /// Replace the data; every cached tree is dropped.
    fn set_data(&self, data: Matrix) -> PyResult<()> {
        self.cache.replace_data(data.0).map_err(to_py_err)
    }

    /// Drop cached trees, keeping the data.
    fn clear(&self) {
        self.cache.invalidate();
    }

    /// Tags of the divergences with a built tree.
    #[getter]
    fn cached(&self) -> Vec<&'static str> {
        self.cache.cached_kinds().into_iter().map(|k| k.tag()).collect()
    }

    #[getter]
    fn dim(&self) -> usize {
        self.cache.data().dim()
    }

    fn __len__(&self) -> usize {
        self.cache.data().len()
    }

    fn __repr__(&self) -> String {
        let data = self.cache.data();
        format!("BannIndex(n={}, dim={})", data.len(), data.dim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyo3::exceptions::PyValueError;

    fn eval<'py>(py: Python<'py>, code: &str) -> &'py PyAny {
        py.eval(code, None, None).unwrap()
    }

    #[test]
    fn test_index_lifecycle() {
        Python::with_gil(|py| {
            let cls = py.get_type::<BannIndex>();
            let index = cls.call1((eval(py, "[[0.1], [0.6]]"),)).unwrap();
            let query = eval(py, "[[0.3]]");

            let hits = index.call_method1("k_search", (query, 1, 0.0, "dkl")).unwrap();
            let hits = if hits.hasattr("tolist").unwrap() {
                hits.call_method0("tolist").unwrap()
            } else {
                hits
            };
            assert_eq!(hits.extract::<Vec<Vec<usize>>>().unwrap(), vec![vec![0]]);

            let h: f64 = index
                .call_method1("bhaus", (query, 0.0, "se"))
                .unwrap()
                .extract()
                .unwrap();
            assert!((h - 0.039999999999999994).abs() < 1e-12);

            let cached: Vec<String> = index.getattr("cached").unwrap().extract().unwrap();
            assert_eq!(cached, vec!["dkl", "se"]);

            index.call_method1("set_data", (eval(py, "[[0.2], [0.4], [0.8]]"),)).unwrap();
            let cached: Vec<String> = index.getattr("cached").unwrap().extract().unwrap();
            assert!(cached.is_empty());
            assert_eq!(index.len().unwrap(), 3);

            let err = index.call_method1("set_data", (eval(py, "[]"),)).unwrap_err();
            assert!(err.is_instance_of::<PyValueError>(py));
            let err = index.call_method1("set_data", (eval(py, "[0.1, 0.2]"),)).unwrap_err();
            assert!(err.is_instance_of::<PyValueError>(py));
            assert_eq!(index.len().unwrap(), 3);
        });
    }
}
