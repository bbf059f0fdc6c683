// bindings/python/src/functions.rs
use pyo3::prelude::*;

use bann_tree::{bregman_hausdorff, k_search as search_all, symmetric_bregman_hausdorff};

use crate::convert::{index_matrix, neighbor_count, to_py_err, DivArg, Matrix};

/// Indices of the `k` nearest data rows for each query row.
///
/// Args:
///     data: (n, d) matrix
///     query: (m, d) matrix
///     k: neighbors per query, 1 <= k <= n (default: 1)
///     eps: approximation slack, 0 for exact (default: 0)
///     div: one of "kl", "dkl", "is", "dis", "se" (default: "kl")
///
/// Returns:
///     (m, k) int matrix, each row ascending by divergence
#[pyfunction]
#[pyo3(signature = (data, query, k=1, eps=0.0, div=DivArg::kl()))]
pub fn k_search(
    py: Python<'_>,
    data: Matrix,
    query: Matrix,
    k: i64,
    eps: f64,
    div: DivArg,
) -> PyResult<PyObject> {
    let kind = div.kind()?;
    let k = neighbor_count(k)?;
    let (Matrix(data), Matrix(query)) = (data, query);
    let rows = py
        .allow_threads(move || search_all(data, &query, k, eps, kind))
        .map_err(to_py_err)?;
    index_matrix(py, rows, k)
}

/// Bregman–Hausdorff divergence of `query` from `data`:
/// max over query rows q of min over data rows p of D(p, q).
#[pyfunction]
#[pyo3(signature = (data, query, eps=0.0, div=DivArg::kl()))]
pub fn bhaus(py: Python<'_>, data: Matrix, query: Matrix, eps: f64, div: DivArg) -> PyResult<f64> {
    let kind = div.kind()?;
    let (Matrix(data), Matrix(query)) = (data, query);
    let result = py
        .allow_threads(move || bregman_hausdorff(data, &query, eps, kind))
        .map_err(to_py_err)?;
    Ok(result.value)
}

/// max(bhaus(a, b), bhaus(b, a)).
#[pyfunction]
#[pyo3(signature = (a, b, eps=0.0, div=DivArg::kl()))]
pub fn bhaus_symmetric(py: Python<'_>, a: Matrix, b: Matrix, eps: f64, div: DivArg) -> PyResult<f64> {
    let kind = div.kind()?;
    let (Matrix(a), Matrix(b)) = (a, b);
    py.allow_threads(move || symmetric_bregman_hausdorff(a, b, eps, kind))
        .map_err(to_py_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyo3::exceptions::{PyTypeError, PyValueError};
    use pyo3::wrap_pyfunction;

    fn eval<'py>(py: Python<'py>, code: &str) -> &'py PyAny {
        py.eval(code, None, None).unwrap()
    }

    /// ndarray or list of lists, as plain rows.
    fn rows(obj: &PyAny) -> Vec<Vec<usize>> {
        let obj = if obj.hasattr("tolist").unwrap() {
            obj.call_method0("tolist").unwrap()
        } else {
            obj
        };
        obj.extract().unwrap()
    }

    #[test]
    fn test_scalar_scenario() {
        Python::with_gil(|py| {
            let search = wrap_pyfunction!(k_search, py).unwrap();
            let haus = wrap_pyfunction!(bhaus, py).unwrap();
            let data = eval(py, "[[0.1], [0.6]]");
            let query = eval(py, "[[0.3]]");

            let expected = [
                ("kl", 1, 0.09013877113318905),
                ("dkl", 0, 0.09205584583201637),
                ("is", 1, 0.3068528194400544),
                ("dis", 1, 0.1931471805599454),
                ("se", 0, 0.039999999999999994),
            ];
            for (tag, nn, h) in expected {
                let got = search.call1((data, query, 1, 0.0, tag)).unwrap();
                assert_eq!(rows(got), vec![vec![nn]], "{tag}");
                let got: f64 = haus.call1((data, query, 0.0, tag)).unwrap().extract().unwrap();
                assert!((got - h).abs() < 1e-12, "{tag}: {got} vs {h}");
            }

            // div defaults to kl
            assert_eq!(rows(search.call1((data, query)).unwrap()), vec![vec![1]]);
        });
    }

    #[test]
    fn test_boundary_errors() {
        Python::with_gil(|py| {
            let search = wrap_pyfunction!(k_search, py).unwrap();
            let data = eval(py, "[[0.1], [0.6]]");
            let query = eval(py, "[[0.3]]");

            let value_errors = [
                search.call1((data, query, 0, 0.0, py.None())),
                search.call1((data, query, 1, 0.0, "not_a_divergence")),
                search.call1((eval(py, "[0.1, 0.6]"), query, 1, 0.0, "kl")),
                search.call1((data, eval(py, "[0.3, 0.4]"), 1, 0.0, "kl")),
                search.call1((data, query, 3, 0.0, "kl")),
                search.call1((data, query, 1, -0.5, "kl")),
                search.call1((data, eval(py, "[[0.3, 0.4]]"), 1, 0.0, "kl")),
                search.call1((eval(py, "[[0.0], [0.6]]"), query, 1, 0.0, "kl")),
            ];
            for (i, res) in value_errors.into_iter().enumerate() {
                assert!(res.unwrap_err().is_instance_of::<PyValueError>(py), "case {i}");
            }

            let type_errors = [
                search.call1((data, query, 1, 0.0, 123)),
                search.call1(("not an ndarray", query, 1, 0.0, "kl")),
                search.call1((data, "not an ndarray", 1, 0.0, "kl")),
            ];
            for (i, res) in type_errors.into_iter().enumerate() {
                assert!(res.unwrap_err().is_instance_of::<PyTypeError>(py), "case {i}");
            }
        });
    }

    #[test]
    fn test_symmetric_is_max_of_directions() {
        Python::with_gil(|py| {
            let haus = wrap_pyfunction!(bhaus, py).unwrap();
            let sym = wrap_pyfunction!(bhaus_symmetric, py).unwrap();
            let a = eval(py, "[[0.1, 0.2], [0.6, 0.3]]");
            let b = eval(py, "[[0.3, 0.3], [0.9, 0.1], [0.2, 0.5]]");
            for tag in ["kl", "dkl", "is", "dis", "se"] {
                let ab: f64 = haus.call1((a, b, 0.0, tag)).unwrap().extract().unwrap();
                let ba: f64 = haus.call1((b, a, 0.0, tag)).unwrap().extract().unwrap();
                let both: f64 = sym.call1((a, b, 0.0, tag)).unwrap().extract().unwrap();
                assert!((both - ab.max(ba)).abs() < 1e-12, "{tag}");
            }
        });
    }
}
