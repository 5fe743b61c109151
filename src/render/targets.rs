use std::collections::HashMap;

use crate::foundation::core::Resolution;
use crate::render::backend::Raster;

/// Pool configuration for cached render targets.
#[derive(Debug, Clone, Copy)]
pub struct TargetPoolOpts {
    /// Maximum bytes retained across all buckets.
    pub max_pool_bytes: usize,
    /// Maximum number of retained targets per resolution bucket.
    pub max_targets_per_bucket: usize,
}

impl Default for TargetPoolOpts {
    fn default() -> Self {
        Self {
            max_pool_bytes: 64 * 1024 * 1024,
            max_targets_per_bucket: 2,
        }
    }
}

/// Allocation counters of a [`TargetPool`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TargetPoolStats {
    /// Targets currently held for reuse.
    pub retained_targets: usize,
    /// Bytes currently held for reuse.
    pub retained_bytes: usize,
    /// Fresh allocations since creation.
    pub alloc_targets: u64,
    /// Bytes of fresh allocations since creation.
    pub alloc_bytes: u64,
    /// Targets returned but not retained (caps exceeded).
    pub dropped_on_release: u64,
    /// Targets dropped by [`TargetPool::clear`].
    pub cleared_targets: u64,
}

/// Bounded pool of single-channel render targets keyed by resolution.
///
/// Luma and chroma passes use different sizes, so a steady-state stream cycles through one
/// bucket per plane size without allocating.
#[derive(Debug, Default)]
pub struct TargetPool {
    opts: TargetPoolOpts,
    stats: TargetPoolStats,
    buckets: HashMap<Resolution, Vec<Raster>>,
}

impl TargetPool {
    /// Create an empty pool.
    pub fn new(opts: TargetPoolOpts) -> Self {
        Self {
            opts,
            stats: TargetPoolStats::default(),
            buckets: HashMap::new(),
        }
    }

    /// Current counters.
    pub fn stats(&self) -> TargetPoolStats {
        self.stats.clone()
    }

    /// Take a target of `res` filled with `clear`, reusing a retained one when possible.
    pub fn borrow(&mut self, res: Resolution, clear: u8) -> Raster {
        let bytes = res.area();
        if let Some(mut r) = self.buckets.get_mut(&res).and_then(Vec::pop) {
            self.stats.retained_targets = self.stats.retained_targets.saturating_sub(1);
            self.stats.retained_bytes = self.stats.retained_bytes.saturating_sub(bytes);
            r.data.fill(clear);
            return r;
        }

        self.stats.alloc_targets = self.stats.alloc_targets.saturating_add(1);
        self.stats.alloc_bytes = self.stats.alloc_bytes.saturating_add(bytes as u64);
        Raster::filled(res, clear)
    }

    /// Return a target for reuse.
    pub fn release(&mut self, raster: Raster) {
        let res = raster.resolution();
        let bytes = res.area();
        if raster.data.len() != bytes
            || self.opts.max_targets_per_bucket == 0
            || self.stats.retained_bytes.saturating_add(bytes) > self.opts.max_pool_bytes
        {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        let bucket = self.buckets.entry(res).or_default();
        if bucket.len() >= self.opts.max_targets_per_bucket {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }
        bucket.push(raster);
        self.stats.retained_targets = self.stats.retained_targets.saturating_add(1);
        self.stats.retained_bytes = self.stats.retained_bytes.saturating_add(bytes);
    }

    /// Drop every retained target.
    pub fn clear(&mut self) {
        let n = self.stats.retained_targets as u64;
        self.buckets.clear();
        self.stats.cleared_targets = self.stats.cleared_targets.saturating_add(n);
        self.stats.retained_targets = 0;
        self.stats.retained_bytes = 0;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/targets.rs"]
mod tests;
