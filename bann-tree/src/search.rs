//! k-NN and range search on the Bregman ball tree.
//!
//! Two algorithms:
//!
//! 1. **Sieve k-NN**: best-first traversal with two priority queues,
//!    - Q: min-heap of clusters keyed by their lower bound,
//!    - H: max-heap of the best K hits (worst current hit on top).
//!
//!    A cluster is expanded unless `bound · (1 + ε) > worst(H)`. With ε = 0
//!    the result is exact; with ε > 0 every returned hit is within a factor
//!    (1 + ε) of the true K-th smallest divergence, since every point left
//!    behind was certified to exceed `worst(H) / (1 + ε)` at the time and
//!    `worst(H)` only decreases.
//!
//! 2. **Range search**: depth-first walk returning every point with
//!    divergence ≤ ρ, pruning clusters whose lower bound exceeds ρ.
//!
//! Results are ascending by divergence, ties by ascending data index.
//! Searches only read the index; all state is per call.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Instant;

use bann_core::{try_map_indexed, BannError, DivergenceKind, PointSet, Result, Role};

use crate::tree::{BregmanIndex, BuildConfig};

// ─────────────────────────────────────────────────────────────────────
// Parameters and results
// ─────────────────────────────────────────────────────────────────────

/// Validated k-NN parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
    k: usize,
    eps: f64,
}

impl SearchParams {
    /// `k ≥ 1`; `eps` finite and non-negative (0 requests exact results).
    pub fn new(k: usize, eps: f64) -> Result<Self> {
        if k == 0 {
            return Err(BannError::parameter("k", "must be at least 1"));
        }
        check_eps(eps)?;
        Ok(SearchParams { k, eps })
    }

    pub fn exact(k: usize) -> Result<Self> {
        Self::new(k, 0.0)
    }

    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    #[inline]
    pub fn eps(&self) -> f64 {
        self.eps
    }
}

pub(crate) fn check_eps(eps: f64) -> Result<()> {
    if !eps.is_finite() || eps < 0.0 {
        return Err(BannError::parameter(
            "eps",
            format!("must be finite and non-negative, got {eps}"),
        ));
    }
    Ok(())
}

/// One search hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Original data index.
    pub index: usize,
    /// D(query, data[index]) under the index's kind.
    pub divergence: f64,
}

/// Result of k-NN search: the k nearest neighbors to the query.
#[derive(Debug, Clone)]
pub struct KnnResult {
    /// Sorted by divergence ascending, ties by index.
    /// Length is min(k, dataset_size).
    pub hits: Vec<Neighbor>,
    /// Number of divergence evaluations (points and cluster centers).
    pub distance_calls: usize,
    /// Number of clusters skipped on their bounds.
    pub clusters_pruned: usize,
}

impl KnnResult {
    pub fn indices(&self) -> Vec<usize> {
        self.hits.iter().map(|h| h.index).collect()
    }
}

/// Result of range search: every point within the radius.
#[derive(Debug, Clone)]
pub struct RangeResult {
    /// Sorted by divergence ascending, ties by index.
    pub hits: Vec<Neighbor>,
    pub distance_calls: usize,
    pub clusters_pruned: usize,
}

// ─────────────────────────────────────────────────────────────────────
// Candidate heap
// ─────────────────────────────────────────────────────────────────────

/// A (key, id) pair totally ordered by key, then id.
#[derive(Debug, Clone, Copy)]
struct Keyed {
    key: f64,
    id: usize,
}

impl PartialEq for Keyed {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Keyed {}

impl PartialOrd for Keyed {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Keyed {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .total_cmp(&other.key)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// The best `k` (divergence, index) pairs seen so far; worst on top.
struct CandidateHeap {
    k: usize,
    heap: BinaryHeap<Keyed>,
}

impl CandidateHeap {
    fn new(k: usize) -> Self {
        CandidateHeap {
            k,
            heap: BinaryHeap::with_capacity(k + 1),
        }
    }

    /// Divergence a new point must not exceed to enter; +∞ until full.
    #[inline]
    fn worst(&self) -> f64 {
        if self.heap.len() < self.k {
            f64::INFINITY
        } else {
            self.heap.peek().map_or(f64::INFINITY, |w| w.key)
        }
    }

    #[inline]
    fn offer(&mut self, divergence: f64, index: usize) {
        let cand = Keyed {
            key: divergence,
            id: index,
        };
        if self.heap.len() < self.k {
            self.heap.push(cand);
        } else if let Some(&worst) = self.heap.peek() {
            if cand < worst {
                self.heap.pop();
                self.heap.push(cand);
            }
        }
    }

    fn into_sorted(self) -> Vec<Neighbor> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|c| Neighbor {
                index: c.id,
                divergence: c.key,
            })
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────
// k-NN
// ─────────────────────────────────────────────────────────────────────

impl BregmanIndex {
    /// Fails with a dimension error on a length mismatch and a domain error
    /// if the query lies outside the kind's query-side domain.
    pub(crate) fn check_query(&self, query: &[f64], index: usize) -> Result<()> {
        if query.len() != self.dim() {
            return Err(BannError::dimension(
                self.dim(),
                query.len(),
                format!("query {index} against index"),
            ));
        }
        self.kind().check_point(query, Role::Query, index)
    }

    /// The `min(k, n)` nearest data points to `query`.
    pub fn knn(&self, query: &[f64], params: &SearchParams) -> Result<KnnResult> {
        self.check_query(query, 0)?;
        Ok(self.sieve(query, params.k, params.eps, None))
    }

    /// k-NN for every row of `queries`, in row order, across threads.
    ///
    /// Unlike [`BregmanIndex::knn`], asking for more neighbors than there
    /// are data points is a parameter error here, so every row has
    /// exactly `k` entries.
    pub fn knn_batch(&self, queries: &PointSet, params: &SearchParams) -> Result<Vec<KnnResult>> {
        if params.k > self.len() {
            return Err(BannError::parameter(
                "k",
                format!(
                    "requesting {} neighbors from {} data points",
                    params.k,
                    self.len()
                ),
            ));
        }
        if !queries.is_empty() {
            self.points().expect_dim(queries.dim(), "query set against index")?;
        }
        try_map_indexed(queries.len(), |i| {
            let q = queries.row(i);
            self.check_query(q, i)?;
            Ok(self.sieve(q, params.k, params.eps, None))
        })
    }

    /// Sieve k-NN over a validated query.
    ///
    /// With `floor = Some(f)`, stops as soon as the worst kept hit drops
    /// below `f`. Only meaningful for callers that need to know whether the
    /// K-th divergence reaches `f` (the Hausdorff engine).
    pub(crate) fn sieve(&self, query: &[f64], k: usize, eps: f64, floor: Option<f64>) -> KnnResult {
        let started = Instant::now();
        let kind = self.kind();
        let slack = 1.0 + eps;
        let mut distance_calls = 0usize;
        let mut clusters_pruned = 0usize;

        let mut hits = CandidateHeap::new(k);
        let mut queue: BinaryHeap<Reverse<Keyed>> = BinaryHeap::new();

        let root = self.root();
        let root_div = kind.divergence_unchecked(query, &root.center);
        distance_calls += 1;
        queue.push(Reverse(Keyed {
            key: root.lower_bound(kind, query, root_div),
            id: 0,
        }));

        while let Some(Reverse(entry)) = queue.pop() {
            if floor.is_some_and(|f| hits.worst() < f) {
                break;
            }
            // Termination: nothing left in Q can beat the worst hit
            if entry.key * slack > hits.worst() {
                clusters_pruned += queue.len() + 1;
                break;
            }

            let cluster = self.node(entry.id);
            if cluster.is_leaf() {
                for (orig_idx, point) in self.cluster_points(cluster) {
                    distance_calls += 1;
                    if let Some(d) = kind.divergence_within(query, point, hits.worst()) {
                        hits.offer(d, orig_idx);
                    }
                }
                continue;
            }

            for child_idx in [cluster.left, cluster.right].into_iter().flatten() {
                let child = self.node(child_idx);
                let child_div = kind.divergence_unchecked(query, &child.center);
                distance_calls += 1;
                let bound = child.lower_bound(kind, query, child_div);
                if bound * slack > hits.worst() {
                    clusters_pruned += 1;
                    continue;
                }
                queue.push(Reverse(Keyed {
                    key: bound,
                    id: child_idx,
                }));
            }
        }

        tracing::trace!(
            kind = %kind,
            k,
            eps,
            distance_calls,
            clusters_pruned,
            elapsed = ?started.elapsed(),
            "knn query"
        );

        KnnResult {
            hits: hits.into_sorted(),
            distance_calls,
            clusters_pruned,
        }
    }

    // ─────────────────────────────────────────────────────────────────
    // Range search
    // ─────────────────────────────────────────────────────────────────

    /// Every data point `p` with D(query, p) ≤ `radius`.
    pub fn range_search(&self, query: &[f64], radius: f64) -> Result<RangeResult> {
        if radius.is_nan() || radius < 0.0 {
            return Err(BannError::parameter(
                "radius",
                format!("must be non-negative, got {radius}"),
            ));
        }
        self.check_query(query, 0)?;

        let kind = self.kind();
        let mut hits = Vec::new();
        let mut distance_calls = 0usize;
        let mut clusters_pruned = 0usize;
        let mut stack = vec![0usize];

        while let Some(node_idx) = stack.pop() {
            let cluster = self.node(node_idx);
            let center_div = kind.divergence_unchecked(query, &cluster.center);
            distance_calls += 1;

            if cluster.lower_bound(kind, query, center_div) > radius {
                clusters_pruned += 1;
                continue;
            }

            let all_inside = cluster
                .upper_bound(kind, center_div)
                .is_some_and(|u| u <= radius);

            if cluster.is_leaf() || all_inside {
                for (orig_idx, point) in self.cluster_points(cluster) {
                    distance_calls += 1;
                    if all_inside {
                        hits.push(Keyed {
                            key: kind.divergence_unchecked(query, point),
                            id: orig_idx,
                        });
                    } else if let Some(d) = kind.divergence_within(query, point, radius) {
                        hits.push(Keyed {
                            key: d,
                            id: orig_idx,
                        });
                    }
                }
            } else {
                stack.extend([cluster.left, cluster.right].into_iter().flatten());
            }
        }

        hits.sort_unstable();
        Ok(RangeResult {
            hits: hits
                .into_iter()
                .filter(|h| h.key <= radius)
                .map(|h| Neighbor {
                    index: h.id,
                    divergence: h.key,
                })
                .collect(),
            distance_calls,
            clusters_pruned,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────
// One-shot surface
// ─────────────────────────────────────────────────────────────────────

/// Build an index over `data` and return, for each query row, the indices
/// of its `k` nearest data points under `kind`, ascending by divergence.
pub fn k_search(
    data: PointSet,
    queries: &PointSet,
    k: usize,
    eps: f64,
    kind: DivergenceKind,
) -> Result<Vec<Vec<usize>>> {
    let params = SearchParams::new(k, eps)?;
    if !queries.is_empty() && !data.is_empty() {
        data.expect_dim(queries.dim(), "query set against data set")?;
    }
    let index = BregmanIndex::build(data, kind, &BuildConfig::default())?;
    let results = index.knn_batch(queries, &params)?;
    Ok(results.iter().map(KnnResult::indices).collect())
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
