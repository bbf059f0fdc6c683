//! # bann-core
//!
//! Shared building blocks for Bregman nearest-neighbor search:
//!
//! - **Divergence catalog**: the five supported kinds (`kl`, `dkl`, `is`,
//!   `dis`, `se`), each backed by a separable generator with its gradient
//!   and inverse gradient, domain checks and kind-specific ball bounds.
//! - **Point sets**: row-major, fixed-dimension vector collections.
//! - **Errors**: the parameter / dimension / domain taxonomy.
//! - **Parallel execution**: scoped-thread map for independent queries.

pub mod divergence;
pub mod error;
pub mod parallel;
pub mod points;

pub use divergence::{DivergenceKind, Generator, Requirement, BURG, ENTROPY, SQUARED_NORM};
pub use error::{BannError, Result, Role};
pub use parallel::try_map_indexed;
pub use points::PointSet;
