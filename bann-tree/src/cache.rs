//! Per-kind index cache over one data set.
//!
//! Holds the current data plus at most one built index per divergence kind.
//! Indices are built on first use and shared by `Arc`; replacing the data
//! drops every cached index.
//!
//! Each kind has its own slot lock, held across that kind's build. Lookups
//! and builds for other kinds never wait on it, and the data lock is only
//! taken long enough to clone the `Arc`.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use bann_core::{BannError, DivergenceKind, PointSet, Result};

use crate::hausdorff::{directed_hausdorff, HausdorffResult};
use crate::search::{KnnResult, SearchParams};
use crate::tree::{BregmanIndex, BuildConfig};

const SLOTS: usize = DivergenceKind::ALL.len();

/// Lazily built indices over a shared data set, one per divergence kind.
#[derive(Debug)]
pub struct IndexCache {
    data: RwLock<Arc<PointSet>>,
    slots: [Mutex<Option<Arc<BregmanIndex>>>; SLOTS],
    config: BuildConfig,
}

fn require_points(data: &PointSet) -> Result<()> {
    if data.is_empty() {
        return Err(BannError::dimension(1, 0, "cannot index an empty data set"));
    }
    Ok(())
}

/// Whether `index` was built over exactly `data`.
fn built_over(index: &BregmanIndex, data: &Arc<PointSet>) -> bool {
    std::ptr::eq(index.points(), Arc::as_ptr(data))
}

impl IndexCache {
    /// Fails on an empty data set. Domain checks happen per kind, when the
    /// index for that kind is first built.
    pub fn new(data: impl Into<Arc<PointSet>>, config: BuildConfig) -> Result<Self> {
        let data = data.into();
        require_points(&data)?;
        Ok(Self {
            data: RwLock::new(data),
            slots: Default::default(),
            config,
        })
    }

    pub fn data(&self) -> Arc<PointSet> {
        Arc::clone(&self.data.read())
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// The index for `kind`, building it if it is not cached yet.
    ///
    /// Concurrent callers asking for the same kind share one build.
    pub fn index(&self, kind: DivergenceKind) -> Result<Arc<BregmanIndex>> {
        let mut slot = self.slots[kind.ordinal()].lock();
        let data = self.data();
        if let Some(index) = slot.as_ref().filter(|index| built_over(index, &data)) {
            return Ok(Arc::clone(index));
        }

        let index = Arc::new(BregmanIndex::build(data, kind, &self.config)?);
        tracing::debug!(
            kind = %kind,
            points = index.len(),
            elapsed = ?index.build_elapsed(),
            "cached index built"
        );
        *slot = Some(Arc::clone(&index));
        Ok(index)
    }

    /// Swap in new data and drop every cached index.
    ///
    /// A build already running for the old data finishes, but its index is
    /// never handed out for the new data.
    pub fn replace_data(&self, data: impl Into<Arc<PointSet>>) -> Result<()> {
        let data = data.into();
        require_points(&data)?;
        *self.data.write() = data;
        self.invalidate();
        tracing::debug!("index cache data replaced");
        Ok(())
    }

    /// Drop every cached index, keeping the data.
    pub fn invalidate(&self) {
        for slot in &self.slots {
            *slot.lock() = None;
        }
    }

    /// Kinds that currently have a built index over the current data, in
    /// [`DivergenceKind::ALL`] order. A kind whose build is in flight is
    /// not reported.
    pub fn cached_kinds(&self) -> Vec<DivergenceKind> {
        let data = self.data();
        DivergenceKind::ALL
            .into_iter()
            .filter(|kind| {
                self.slots[kind.ordinal()]
                    .try_lock()
                    .is_some_and(|slot| slot.as_ref().is_some_and(|i| built_over(i, &data)))
            })
            .collect()
    }

    /// Batch k-NN of `queries` against the cached index for `kind`.
    pub fn k_search(
        &self,
        queries: &PointSet,
        params: &SearchParams,
        kind: DivergenceKind,
    ) -> Result<Vec<KnnResult>> {
        self.index(kind)?.knn_batch(queries, params)
    }

    /// Directed Bregman–Hausdorff divergence of `queries` from the cached
    /// data under the tag `kind`; reuses the index for `kind.dual()`.
    pub fn hausdorff(
        &self,
        queries: &PointSet,
        eps: f64,
        kind: DivergenceKind,
    ) -> Result<HausdorffResult> {
        let index = self.index(kind.dual())?;
        directed_hausdorff(&index, queries, eps)
    }
}
