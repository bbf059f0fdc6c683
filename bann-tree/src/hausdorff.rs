//! Bregman–Hausdorff divergences between point sets.
//!
//! For an index over P under kind D and a query set Q:
//!
//! ```text
//! h(P, Q) = max_{q ∈ Q} min_{p ∈ P} D(q, p)
//! ```
//!
//! Each q issues a 1-NN sieve query. A query stops early once any candidate
//! falls below the running maximum: its nearest neighbor can only be closer
//! still, so it cannot raise h.
//!
//! ## Direction convention
//!
//! `bregman_hausdorff(data, query, kind)` is
//! `max_{q ∈ query} min_{p ∈ data} D_kind(p, q)`, with the data point in
//! the first slot. That is the reverse of the k-NN convention, so the
//! index over `data` is built for `kind.dual()`:
//!
//! | tag   | value                               |
//! |-------|-------------------------------------|
//! | `kl`  | max_q min_p KL(p ‖ q)               |
//! | `dkl` | max_q min_p KL(q ‖ p)               |
//! | `is`  | max_q min_p IS(p ‖ q)               |
//! | `dis` | max_q min_p IS(q ‖ p)               |
//! | `se`  | max_q min_p ‖p − q‖²                |

use std::time::{Duration, Instant};

use bann_core::{BannError, DivergenceKind, PointSet, Result};

use crate::search::check_eps;
use crate::tree::{BregmanIndex, BuildConfig};

/// A directed Hausdorff value and where it was attained.
#[derive(Debug, Clone, PartialEq)]
pub struct HausdorffResult {
    /// The (1 + ε)-approximate directed divergence; 0 for an empty query set.
    pub value: f64,
    /// (query index, data index) realizing `value`, if any query raised it.
    pub witness: Option<(usize, usize)>,
    /// Total divergence evaluations across all 1-NN queries.
    pub distance_calls: usize,
    /// Wall time of the query loop, validation excluded.
    pub elapsed: Duration,
}

/// max over `queries` of the 1-NN divergence into `index`.
pub fn directed_hausdorff(
    index: &BregmanIndex,
    queries: &PointSet,
    eps: f64,
) -> Result<HausdorffResult> {
    check_eps(eps)?;
    if !queries.is_empty() {
        index
            .points()
            .expect_dim(queries.dim(), "hausdorff query set against index")?;
    }
    for (i, q) in queries.iter().enumerate() {
        index.check_query(q, i)?;
    }

    let started = Instant::now();
    let mut value = 0.0f64;
    let mut witness = None;
    let mut distance_calls = 0usize;

    for (qi, q) in queries.iter().enumerate() {
        let res = index.sieve(q, 1, eps, Some(value));
        distance_calls += res.distance_calls;
        if let Some(best) = res.hits.first() {
            if best.divergence > value {
                value = best.divergence;
                witness = Some((qi, best.index));
            }
        }
    }

    let elapsed = started.elapsed();
    tracing::debug!(
        kind = %index.kind(),
        queries = queries.len(),
        data = index.len(),
        value,
        distance_calls,
        elapsed = ?elapsed,
        "directed hausdorff"
    );

    Ok(HausdorffResult {
        value,
        witness,
        distance_calls,
        elapsed,
    })
}

/// Bregman–Hausdorff divergence of `query` from `data` under the tag `kind`,
/// with the data point in the divergence's first slot (see module docs).
pub fn bregman_hausdorff(
    data: PointSet,
    query: &PointSet,
    eps: f64,
    kind: DivergenceKind,
) -> Result<HausdorffResult> {
    check_eps(eps)?;
    if !query.is_empty() && !data.is_empty() {
        data.expect_dim(query.dim(), "query set against data set")?;
    }
    let index = BregmanIndex::build(data, kind.dual(), &BuildConfig::default())?;
    directed_hausdorff(&index, query, eps)
}

/// Symmetric composition over two indices built for the same kind:
/// the larger of `h(B, A)` (A's points queried into B) and `h(A, B)`.
pub fn symmetric_hausdorff(
    index_a: &BregmanIndex,
    index_b: &BregmanIndex,
    eps: f64,
) -> Result<f64> {
    if index_a.kind() != index_b.kind() {
        return Err(BannError::parameter(
            "kind",
            format!(
                "indices built for different divergences: `{}` and `{}`",
                index_a.kind(),
                index_b.kind()
            ),
        ));
    }
    let a_into_b = directed_hausdorff(index_b, index_a.points(), eps)?;
    let b_into_a = directed_hausdorff(index_a, index_b.points(), eps)?;
    Ok(a_into_b.value.max(b_into_a.value))
}

/// `max(bregman_hausdorff(a, b), bregman_hausdorff(b, a))`, building both
/// indices once.
pub fn symmetric_bregman_hausdorff(
    a: PointSet,
    b: PointSet,
    eps: f64,
    kind: DivergenceKind,
) -> Result<f64> {
    check_eps(eps)?;
    a.expect_dim(b.dim(), "second set against first set")?;
    let config = BuildConfig::default();
    let index_a = BregmanIndex::build(a, kind.dual(), &config)?;
    let index_b = BregmanIndex::build(b, kind.dual(), &config)?;
    symmetric_hausdorff(&index_a, &index_b, eps)
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
