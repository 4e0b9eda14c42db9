//! Message lookup metrics.
//!
//! Tracks how often catalog lookups are answered by the requested locale,
//! by a fallback bundle, or not at all. Counters are owned by the catalog
//! they describe and are safe to bump from concurrent requests.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Lookup counters for one message catalog.
#[derive(Debug, Default)]
pub struct LookupMetrics {
    /// Lookups answered by a bundle of the requested locale
    direct_hits: AtomicUsize,

    /// Lookups answered by the fallback locale or the base bundle
    fallback_hits: AtomicUsize,

    /// Lookups with no entry anywhere in the chain
    misses: AtomicUsize,
}

impl LookupMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_direct_hit(&self) {
        self.direct_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback_hit(&self) {
        self.fallback_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn direct_hits(&self) -> usize {
        self.direct_hits.load(Ordering::Relaxed)
    }

    pub fn fallback_hits(&self) -> usize {
        self.fallback_hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    /// Snapshot the counters.
    pub fn report(&self) -> MetricsReport {
        let direct = self.direct_hits();
        let fallback = self.fallback_hits();
        let misses = self.misses();
        let total = direct + fallback + misses;
        let hit_rate = if total > 0 {
            ((direct + fallback) as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            lookups: total,
            direct_hits: direct,
            fallback_hits: fallback,
            misses,
            hit_rate,
        }
    }
}

/// Point-in-time view of the lookup counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub lookups: usize,
    pub direct_hits: usize,
    pub fallback_hits: usize,
    pub misses: usize,

    /// Percentage (0-100) of lookups that found any entry
    pub hit_rate: f64,
}
