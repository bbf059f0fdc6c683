//! Bregman ball tree: divisive binary partitioning under a fixed divergence.
//!
//! Partition step for a cluster C under kind D (query slot first):
//!
//! ```text
//! 1. c ← Bregman centroid of C                 (minimizes Σ D(c, x))
//! 2. R ← max D(c, x)  ∀x ∈ C                   (radius)
//! 3. l ← argmax D(c, x)  ∀x ∈ C                (left pole)
//! 4. r ← argmax D(l, x)  ∀x ∈ C                (right pole)
//! 5. assign x to the nearer pole, ties left
//! 6. one 2-means step: re-assign x to the nearer of the two group centroids
//! 7. recurse on both halves
//! ```
//!
//! Pole ties go to the lowest original index, so the build is deterministic.
//!
//! After construction, the dataset indices are reordered depth-first so each
//! cluster is the contiguous slice `reordered[offset..offset+cardinality]`.
//!
//! ## Bounds
//!
//! Bregman divergences have no triangle inequality, so a cluster cannot be
//! discarded on `D(q, c) − R` alone. Every node therefore carries two
//! certificates:
//!
//! - the **coordinate box** `[lo, hi]` of its members. All five kinds are
//!   sums of one-dimensional divergences, each unimodal in either argument
//!   with its minimum at equality, so `Σ d(qᵢ, clamp(qᵢ, loᵢ, hiᵢ))` never
//!   exceeds the divergence to any member;
//! - the **ball** `(c, R)`, usable only where the kind provides a bound
//!   (`se`: `(√D(q,c) − √R)²`).
//!
//! The node's lower bound is the larger of the two.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bann_core::{BannError, DivergenceKind, PointSet, Result, Role};

/// Relative slack applied to lower bounds to absorb rounding in their sums.
const BOUND_SLACK: f64 = 1e-12;

/// Largest accepted `BuildConfig::max_depth`. Construction recurses once
/// per level.
pub const MAX_TREE_DEPTH: usize = 512;

// ─────────────────────────────────────────────────────────────────────
// Cluster node
// ─────────────────────────────────────────────────────────────────────

/// A node in the Bregman ball tree.
#[derive(Debug, Clone)]
pub struct Cluster {
    /// Generalized centroid of the members. Not necessarily a data point.
    pub center: Vec<f64>,

    /// max D(center, x) over members, center in the query slot.
    pub radius: f64,

    /// Per-coordinate minimum over members.
    pub lo: Vec<f64>,

    /// Per-coordinate maximum over members.
    pub hi: Vec<f64>,

    /// Number of points in this cluster.
    pub cardinality: usize,

    /// Start offset in the depth-first reordered dataset.
    pub offset: usize,

    /// Depth in the tree (root = 0).
    pub depth: usize,

    /// Left child index in the tree's node array, or None if leaf.
    pub left: Option<usize>,

    /// Right child index in the tree's node array, or None if leaf.
    pub right: Option<usize>,
}

impl Cluster {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.left.is_none()
    }

    /// Divergence from `query` to the nearest point of the coordinate box.
    #[inline]
    pub fn box_lower_bound(&self, kind: DivergenceKind, query: &[f64]) -> f64 {
        query
            .iter()
            .zip(self.lo.iter().zip(&self.hi))
            .map(|(&q, (&lo, &hi))| kind.component(q, q.clamp(lo, hi)))
            .sum()
    }

    /// Lower bound on D(query, x) for every member x, given the exact
    /// `center_div` = D(query, center).
    #[inline]
    pub fn lower_bound(&self, kind: DivergenceKind, query: &[f64], center_div: f64) -> f64 {
        let by_box = self.box_lower_bound(kind, query);
        let by_ball = kind.ball_lower_bound(center_div, self.radius).unwrap_or(0.0);
        by_box.max(by_ball) * (1.0 - BOUND_SLACK)
    }

    /// Upper bound on D(query, x) for every member, where the kind has one.
    #[inline]
    pub fn upper_bound(&self, kind: DivergenceKind, center_div: f64) -> Option<f64> {
        kind.ball_upper_bound(center_div, self.radius)
            .map(|u| u * (1.0 + BOUND_SLACK))
    }
}

// ─────────────────────────────────────────────────────────────────────
// Bregman index
// ─────────────────────────────────────────────────────────────────────

/// Stopping criteria for tree construction.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Stop splitting when a cluster has ≤ this many points.
    pub leaf_size: usize,
    /// Stop splitting at this tree depth. At most [`MAX_TREE_DEPTH`].
    pub max_depth: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            leaf_size: 32,
            max_depth: 64,
        }
    }
}

/// A Bregman ball tree over one data set for one divergence kind.
///
/// Immutable once built: any number of searches may run against it
/// concurrently. Rebuild when either the data or the kind changes.
#[derive(Debug)]
pub struct BregmanIndex {
    kind: DivergenceKind,
    points: Arc<PointSet>,

    /// All cluster nodes, stored flat. nodes[0] is the root.
    nodes: Vec<Cluster>,

    /// Depth-first permutation: reordered[i] = original dataset index.
    reordered: Vec<usize>,

    num_leaves: usize,
    depth: usize,
    build_elapsed: Duration,
}

impl BregmanIndex {
    /// Build an index over `points` for searches under `kind`.
    ///
    /// Fails with a dimension error on an empty set, a parameter error on a
    /// zero `leaf_size` or a `max_depth` above [`MAX_TREE_DEPTH`], and a
    /// domain error if any coordinate lies outside the data-side domain of
    /// `kind`.
    pub fn build(
        points: impl Into<Arc<PointSet>>,
        kind: DivergenceKind,
        config: &BuildConfig,
    ) -> Result<Self> {
        let started = Instant::now();
        let points = points.into();
        if points.is_empty() {
            return Err(BannError::dimension(1, 0, "cannot index an empty data set"));
        }
        if config.leaf_size == 0 {
            return Err(BannError::parameter("leaf_size", "must be at least 1"));
        }
        if config.max_depth > MAX_TREE_DEPTH {
            return Err(BannError::parameter(
                "max_depth",
                format!("must be at most {MAX_TREE_DEPTH}, got {}", config.max_depth),
            ));
        }
        kind.check_points(&points, Role::Data)?;

        let count = points.len();
        let mut indices: Vec<usize> = (0..count).collect();
        let mut nodes = Vec::with_capacity(2 * count.div_ceil(config.leaf_size));

        let mut builder = Builder {
            kind,
            points: &points,
            config,
            nodes: &mut nodes,
        };
        builder.partition(&mut indices, 0, 0);

        let num_leaves = nodes.iter().filter(|c| c.is_leaf()).count();
        let depth = nodes.iter().map(|c| c.depth).max().unwrap_or(0);
        let build_elapsed = started.elapsed();

        tracing::debug!(
            kind = %kind,
            points = count,
            dim = points.dim(),
            nodes = nodes.len(),
            leaves = num_leaves,
            depth,
            elapsed = ?build_elapsed,
            "built bregman index"
        );

        Ok(BregmanIndex {
            kind,
            points,
            nodes,
            reordered: indices,
            num_leaves,
            depth,
            build_elapsed,
        })
    }

    /// Build with [`BuildConfig::default`].
    pub fn with_defaults(points: impl Into<Arc<PointSet>>, kind: DivergenceKind) -> Result<Self> {
        Self::build(points, kind, &BuildConfig::default())
    }

    #[inline]
    pub fn kind(&self) -> DivergenceKind {
        self.kind
    }

    #[inline]
    pub fn points(&self) -> &PointSet {
        &self.points
    }

    pub fn shared_points(&self) -> Arc<PointSet> {
        Arc::clone(&self.points)
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.points.dim()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn root(&self) -> &Cluster {
        &self.nodes[0]
    }

    pub fn nodes(&self) -> &[Cluster] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> &Cluster {
        &self.nodes[idx]
    }

    pub fn reordered(&self) -> &[usize] {
        &self.reordered
    }

    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Wall time spent in [`BregmanIndex::build`], validation included.
    pub fn build_elapsed(&self) -> Duration {
        self.build_elapsed
    }

    /// (original_index, point) pairs of a cluster's members.
    pub fn cluster_points<'a>(
        &'a self,
        cluster: &Cluster,
    ) -> impl Iterator<Item = (usize, &'a [f64])> + 'a {
        let start = cluster.offset;
        let end = start + cluster.cardinality;
        self.reordered[start..end]
            .iter()
            .map(move |&orig_idx| (orig_idx, self.points.row(orig_idx)))
    }
}

// ─────────────────────────────────────────────────────────────────────
// Construction
// ─────────────────────────────────────────────────────────────────────

struct Builder<'a> {
    kind: DivergenceKind,
    points: &'a PointSet,
    config: &'a BuildConfig,
    nodes: &'a mut Vec<Cluster>,
}

impl Builder<'_> {
    /// Partition `indices[start..]` (this cluster's members) and push the
    /// subtree depth-first. Returns the node's index.
    fn partition(&mut self, working: &mut [usize], start: usize, depth: usize) -> usize {
        let n = working.len();
        let kind = self.kind;
        let points = self.points;
        let dim = points.dim();
        let node_idx = self.nodes.len();

        // ── Center, radius and coordinate box ──
        let center = kind.centroid(dim, working.iter().map(|&i| points.row(i)));
        let mut lo = vec![f64::INFINITY; dim];
        let mut hi = vec![f64::NEG_INFINITY; dim];
        let mut radius = 0.0f64;
        let mut left_pole = working[0];
        let mut left_pole_div = f64::NEG_INFINITY;
        for &i in working.iter() {
            let p = points.row(i);
            for ((l, h), &v) in lo.iter_mut().zip(hi.iter_mut()).zip(p) {
                *l = l.min(v);
                *h = h.max(v);
            }
            let d = kind.divergence_unchecked(&center, p);
            radius = radius.max(d);
            if farther(d, i, left_pole_div, left_pole) {
                left_pole_div = d;
                left_pole = i;
            }
        }

        self.nodes.push(Cluster {
            center,
            radius,
            lo,
            hi,
            cardinality: n,
            offset: start,
            depth,
            left: None,
            right: None,
        });

        if n <= self.config.leaf_size || depth >= self.config.max_depth {
            return node_idx;
        }

        let Some(split) = self.bipartition(working, left_pole) else {
            // Every member coincides; nothing to separate.
            return node_idx;
        };

        let (left_half, right_half) = working.split_at_mut(split);
        let left_idx = self.partition(left_half, start, depth + 1);
        self.nodes[node_idx].left = Some(left_idx);
        let right_idx = self.partition(right_half, start + split, depth + 1);
        self.nodes[node_idx].right = Some(right_idx);

        node_idx
    }

    /// Reorder `working` so the left group comes first; returns its length.
    /// `None` when no non-trivial split exists.
    fn bipartition(&self, working: &mut [usize], left_pole: usize) -> Option<usize> {
        let kind = self.kind;
        let points = self.points;
        let left_data = points.row(left_pole);

        // ── Right pole: farthest from the left pole ──
        let mut right_pole = left_pole;
        let mut right_pole_div = f64::NEG_INFINITY;
        for &i in working.iter() {
            let d = kind.divergence_unchecked(left_data, points.row(i));
            if farther(d, i, right_pole_div, right_pole) {
                right_pole_div = d;
                right_pole = i;
            }
        }
        if right_pole_div <= 0.0 {
            return None;
        }
        let right_data = points.row(right_pole);

        // ── Seed assignment by pole, ties left ──
        let mut side: Vec<bool> = working
            .iter()
            .map(|&i| {
                let p = points.row(i);
                kind.divergence_unchecked(left_data, p) <= kind.divergence_unchecked(right_data, p)
            })
            .collect();
        if !is_proper(&side) {
            return None;
        }

        // ── One 2-means step from the pole groups ──
        let dim = points.dim();
        let left_center = kind.centroid(
            dim,
            working.iter().zip(&side).filter(|(_, &s)| s).map(|(&i, _)| points.row(i)),
        );
        let right_center = kind.centroid(
            dim,
            working.iter().zip(&side).filter(|(_, &s)| !s).map(|(&i, _)| points.row(i)),
        );
        let refined: Vec<bool> = working
            .iter()
            .map(|&i| {
                let p = points.row(i);
                kind.divergence_unchecked(&left_center, p)
                    <= kind.divergence_unchecked(&right_center, p)
            })
            .collect();
        if is_proper(&refined) {
            side = refined;
        }

        // Dutch-flag partition: lefts to front, rights to back
        let mut cursor = 0;
        for i in 0..working.len() {
            if side[i] {
                working.swap(cursor, i);
                side.swap(cursor, i);
                cursor += 1;
            }
        }
        Some(cursor)
    }
}

/// Strictly farther, or equally far with a lower original index.
#[inline]
fn farther(d: f64, idx: usize, best: f64, best_idx: usize) -> bool {
    d > best || (d == best && idx < best_idx)
}

/// Both sides non-empty.
fn is_proper(side: &[bool]) -> bool {
    side.iter().any(|&s| s) && side.iter().any(|&s| !s)
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
