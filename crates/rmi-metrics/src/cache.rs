//! Single-entry bundle cache keyed by dataset fingerprint.

use std::sync::Arc;

use crate::bundle::MetricsBundle;
use crate::engine::MetricsEngine;
use crate::loader::Dataset;

/// Holds the bundle of the most recently loaded dataset.
///
/// A request for the same fingerprint returns the cached bundle without
/// recomputing; a new fingerprint evicts the old entry.
#[derive(Debug, Default)]
pub struct BundleCache {
    entry: Option<Arc<MetricsBundle>>,
    hits: u64,
    misses: u64,
}

impl BundleCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(
        &mut self,
        dataset: &Dataset,
        engine: &MetricsEngine,
    ) -> Arc<MetricsBundle> {
        if let Some(bundle) = self.get(dataset.fingerprint()) {
            self.hits += 1;
            tracing::debug!(fingerprint = dataset.fingerprint(), "bundle cache hit");
            return bundle;
        }

        self.misses += 1;
        if let Some(old) = &self.entry {
            tracing::debug!(evicted = old.fingerprint(), "replacing cached bundle");
        }
        let bundle = Arc::new(engine.compute(dataset));
        self.entry = Some(Arc::clone(&bundle));
        bundle
    }

    /// Cached bundle for `fingerprint`, if it is the current entry.
    #[must_use]
    pub fn get(&self, fingerprint: &str) -> Option<Arc<MetricsBundle>> {
        self.entry
            .as_ref()
            .filter(|bundle| bundle.fingerprint() == fingerprint)
            .map(Arc::clone)
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }

    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_bytes;

    const CSV_A: &str = "name,city,cuisine,rating,review_text,delivery_time,price,menu_items\n\
                         Bistro A,Austin,Thai,4,good,30,12,Curry\n";
    const CSV_B: &str = "name,city,cuisine,rating,review_text,delivery_time,price,menu_items\n\
                         Cafe B,Dallas,Sushi,3,bad,45,30,Roll\n";

    #[test]
    fn same_dataset_returns_cached_bundle() {
        let dataset = load_bytes(CSV_A.as_bytes()).unwrap();
        let engine = MetricsEngine::default();
        let mut cache = BundleCache::new();

        let first = cache.get_or_compute(&dataset, &engine);
        let second = cache.get_or_compute(&dataset, &engine);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn reloaded_identical_bytes_hit_the_cache() {
        let engine = MetricsEngine::default();
        let mut cache = BundleCache::new();
        let first = cache.get_or_compute(&load_bytes(CSV_A.as_bytes()).unwrap(), &engine);
        let second = cache.get_or_compute(&load_bytes(CSV_A.as_bytes()).unwrap(), &engine);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn new_dataset_replaces_entry() {
        let engine = MetricsEngine::default();
        let mut cache = BundleCache::new();
        let a = load_bytes(CSV_A.as_bytes()).unwrap();
        let b = load_bytes(CSV_B.as_bytes()).unwrap();

        let bundle_a = cache.get_or_compute(&a, &engine);
        let bundle_b = cache.get_or_compute(&b, &engine);

        assert!(!Arc::ptr_eq(&bundle_a, &bundle_b));
        assert!(cache.get(a.fingerprint()).is_none());
        assert!(cache.get(b.fingerprint()).is_some());
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn clear_forces_recompute() {
        let engine = MetricsEngine::default();
        let mut cache = BundleCache::new();
        let a = load_bytes(CSV_A.as_bytes()).unwrap();
        cache.get_or_compute(&a, &engine);
        cache.clear();
        assert!(cache.get(a.fingerprint()).is_none());
        cache.get_or_compute(&a, &engine);
        assert_eq!(cache.misses(), 2);
    }
}
