//! Lifecycle manager statistics.
//!
//! # Usage
//!
//! ```rust,ignore
//! let stats = manager.stats().snapshot();
//! println!("Cache hits: {}", stats.cache_hits);
//! println!("Loads: {}", stats.loads);
//! ```

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lifecycle manager counters.
///
/// All counters are atomic and monotonically increasing, and can be read
/// while operations are in progress.
#[derive(Debug, Default)]
pub struct ManagerStats {
    /// Root entities created.
    roots_created: AtomicU64,
    /// Child entities created.
    children_created: AtomicU64,
    /// Lookups served from a transaction cache.
    cache_hits: AtomicU64,
    /// Lookups that re-hydrated from the store.
    loads: AtomicU64,
    /// Lookups that found nothing anywhere.
    not_found: AtomicU64,
    /// Entities removed on request.
    removals: AtomicU64,
    /// Descendants removed by cascade.
    cascaded_removals: AtomicU64,
    /// Failed creations and removals.
    failures: AtomicU64,
}

impl ManagerStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_create(&self, root: bool) {
        if root {
            self.roots_created.fetch_add(1, Ordering::Relaxed);
        } else {
            self.children_created.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_removal(&self, cascaded: bool) {
        if cascaded {
            self.cascaded_removals.fetch_add(1, Ordering::Relaxed);
        } else {
            self.removals.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of lookups served from a transaction cache.
    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    /// Returns the number of lookups re-hydrated from the store.
    pub fn loads(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }

    /// Returns the number of failed creations and removals.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            roots_created: self.roots_created.load(Ordering::Relaxed),
            children_created: self.children_created.load(Ordering::Relaxed),
            cache_hits: self.cache_hits(),
            loads: self.loads(),
            not_found: self.not_found.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
            cascaded_removals: self.cascaded_removals.load(Ordering::Relaxed),
            failures: self.failures(),
        }
    }
}

/// A point-in-time snapshot of manager statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    /// Root entities created.
    pub roots_created: u64,
    /// Child entities created.
    pub children_created: u64,
    /// Lookups served from a transaction cache.
    pub cache_hits: u64,
    /// Lookups that re-hydrated from the store.
    pub loads: u64,
    /// Lookups that found nothing anywhere.
    pub not_found: u64,
    /// Entities removed on request.
    pub removals: u64,
    /// Descendants removed by cascade.
    pub cascaded_removals: u64,
    /// Failed creations and removals.
    pub failures: u64,
}

impl StatsSnapshot {
    /// Returns the fraction of lookups served from a transaction cache.
    #[must_use]
    pub fn cache_hit_ratio(&self) -> f64 {
        let lookups = self.cache_hits + self.loads + self.not_found;
        if lookups == 0 {
            0.0
        } else {
            self.cache_hits as f64 / lookups as f64
        }
    }
}
