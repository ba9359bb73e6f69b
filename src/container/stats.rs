use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters updated while resolving. Disabled counters stay at zero.
#[derive(Default)]
pub(crate) struct InnerStats {
    enabled: bool,
    total_resolutions: AtomicUsize,
    cache_hits: AtomicUsize,
    cache_misses: AtomicUsize,
    transient_creations: AtomicUsize,
    injections: AtomicUsize,
}

impl InnerStats {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    #[inline]
    fn bump(&self, counter: &AtomicUsize) {
        if self.enabled {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn resolution(&self) {
        self.bump(&self.total_resolutions);
    }

    pub(crate) fn cache_hit(&self) {
        self.bump(&self.cache_hits);
    }

    pub(crate) fn cache_miss(&self) {
        self.bump(&self.cache_misses);
    }

    pub(crate) fn transient_creation(&self) {
        self.bump(&self.transient_creations);
    }

    pub(crate) fn injection(&self) {
        self.bump(&self.injections);
    }

    pub(crate) fn snapshot(&self, registered_services: usize, active_singletons: usize) -> ContainerStats {
        ContainerStats {
            total_resolutions: self.total_resolutions.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            transient_creations: self.transient_creations.load(Ordering::Relaxed),
            injections: self.injections.load(Ordering::Relaxed),
            registered_services,
            active_singletons,
        }
    }
}

/// Point-in-time view of the container counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerStats {
    /// Calls into the resolver, reserved names included.
    pub total_resolutions: usize,
    /// Singleton lookups answered from the instance cache.
    pub cache_hits: usize,
    /// Singleton constructions.
    pub cache_misses: usize,
    pub transient_creations: usize,
    /// Manual `inject` invocations.
    pub injections: usize,
    pub registered_services: usize,
    pub active_singletons: usize,
}

impl ContainerStats {
    /// Share of singleton lookups served from the cache, in `0.0..=1.0`.
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} resolutions, {:.1}% cache hit rate, {} registered services, {} active singletons",
            self.total_resolutions,
            self.hit_rate() * 100.0,
            self.registered_services,
            self.active_singletons
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let stats = ContainerStats {
            cache_hits: 9,
            cache_misses: 1,
            ..ContainerStats::default()
        };
        assert!((stats.hit_rate() - 0.9).abs() < f64::EPSILON);
        assert_eq!(ContainerStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_disabled_counters_stay_zero() {
        let stats = InnerStats::new(false);
        stats.resolution();
        stats.cache_hit();
        assert_eq!(stats.snapshot(2, 1).total_resolutions, 0);

        let stats = InnerStats::new(true);
        stats.resolution();
        stats.cache_hit();
        let snapshot = stats.snapshot(2, 1);
        assert_eq!(snapshot.total_resolutions, 1);
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(snapshot.registered_services, 2);
    }
}
