// bindings/python/src/lib.rs

#![allow(non_local_definitions)]

use pyo3::prelude::*;
use pyo3::wrap_pyfunction;

mod convert;
mod functions;
mod index;

use functions::*;
use index::BannIndex;

#[pymodule]
fn bann(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<BannIndex>()?;

    m.add_function(wrap_pyfunction!(k_search, m)?)?;
    m.add_function(wrap_pyfunction!(bhaus, m)?)?;
    m.add_function(wrap_pyfunction!(bhaus_symmetric, m)?)?;

    Ok(())
}
