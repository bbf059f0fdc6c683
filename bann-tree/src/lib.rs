//! # bann-tree
//!
//! Bregman ball-tree index with sieve k-NN and Bregman–Hausdorff search.
//!
//! 1. **Index**: divisive binary partition of the data under one fixed
//!    divergence kind. Every node stores a generalized centroid, a radius
//!    and a coordinate bounding box.
//!
//! 2. **Sieve k-NN**: best-first traversal keyed on node lower bounds.
//!    Exact at `eps = 0`, and within a factor `1 + eps` of the true k-th
//!    divergence otherwise. Also range search and parallel batches.
//!
//! 3. **Bregman–Hausdorff**: the directed set divergence, computed as a
//!    1-NN query per point with early abort against the running maximum.
//!
//! ## Design
//!
//! - Data is shared through `Arc<PointSet>` so cached indices and callers
//!   see the same rows without copies.
//! - Depth-first reordering keeps every cluster a contiguous index slice.
//! - Batch queries fan out over scoped threads; a single query is
//!   sequential.
//!
//! ## References
//!
//! - Cayton. Fast nearest neighbor retrieval for Bregman divergences. ICML 2008.
//! - Nielsen, Piro, Barlaud. Bregman vantage point trees. ICME 2009.
//! - Banerjee, Merugu, Dhillon, Ghosh. Clustering with Bregman divergences. JMLR 2005.

pub mod cache;
pub mod hausdorff;
pub mod search;
pub mod tree;

pub use cache::IndexCache;
pub use hausdorff::{
    bregman_hausdorff, directed_hausdorff, symmetric_bregman_hausdorff, symmetric_hausdorff,
    HausdorffResult,
};
pub use search::{k_search, KnnResult, Neighbor, RangeResult, SearchParams};
pub use tree::{BregmanIndex, BuildConfig, Cluster, MAX_TREE_DEPTH};

pub use bann_core::{BannError, DivergenceKind, PointSet, Result};
