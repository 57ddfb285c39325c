// Copyright @yucwang 2026

use std::sync::atomic::{AtomicU64, Ordering};

/// Concurrent ray/path counters shared by all render workers.
pub struct RayStatistics {
    shadow_rays: AtomicU64,
    scatter_rays: AtomicU64,
    paths: AtomicU64,
    // Bucket i counts paths of length i; the last bucket collects the rest.
    path_lengths: Vec<AtomicU64>,
}

impl RayStatistics {
    pub fn new(max_path_length: u32) -> Self {
        let buckets = max_path_length as usize + 2;
        Self {
            shadow_rays: AtomicU64::new(0),
            scatter_rays: AtomicU64::new(0),
            paths: AtomicU64::new(0),
            path_lengths: (0..buckets).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    pub fn record_shadow_ray(&self) {
        self.shadow_rays.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scatter_ray(&self) {
        self.scatter_rays.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_path(&self, length: u32) {
        self.paths.fetch_add(1, Ordering::Relaxed);
        let last = self.path_lengths.len() - 1;
        let bucket = (length as usize).min(last);
        self.path_lengths[bucket].fetch_add(1, Ordering::Relaxed);
    }

    pub fn shadow_rays(&self) -> u64 {
        self.shadow_rays.load(Ordering::Relaxed)
    }

    pub fn scatter_rays(&self) -> u64 {
        self.scatter_rays.load(Ordering::Relaxed)
    }

    pub fn paths(&self) -> u64 {
        self.paths.load(Ordering::Relaxed)
    }

    pub fn path_length_histogram(&self) -> Vec<u64> {
        self.path_lengths.iter().map(|c| c.load(Ordering::Relaxed)).collect()
    }

    pub fn average_path_length(&self) -> f64 {
        let paths = self.paths();
        if paths == 0 {
            return 0.0;
        }
        let total: u64 = self
            .path_length_histogram()
            .iter()
            .enumerate()
            .map(|(len, count)| len as u64 * count)
            .sum();
        total as f64 / paths as f64
    }

    pub fn log_summary(&self) {
        log::info!(
            "Ray statistics: {} paths, {} scatter rays, {} shadow rays, average path length {:.3}.",
            self.paths(),
            self.scatter_rays(),
            self.shadow_rays(),
            self.average_path_length()
        );
        for (len, count) in self.path_length_histogram().iter().enumerate() {
            if *count > 0 {
                log::debug!("  path length {}: {}", len, count);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RayStatistics;

    #[test]
    fn test_ray_statistics_counters() {
        let stats = RayStatistics::new(2);
        stats.record_shadow_ray();
        stats.record_shadow_ray();
        stats.record_scatter_ray();
        stats.record_path(0);
        stats.record_path(2);
        stats.record_path(9);

        assert_eq!(stats.shadow_rays(), 2);
        assert_eq!(stats.scatter_rays(), 1);
        assert_eq!(stats.paths(), 3);
        assert_eq!(stats.path_length_histogram(), vec![1, 0, 1, 1]);
        assert!((stats.average_path_length() - 5.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_ray_statistics_concurrent_increments() {
        let stats = RayStatistics::new(4);
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..1000 {
                        stats.record_scatter_ray();
                    }
                });
            }
        });
        assert_eq!(stats.scatter_rays(), 4000);
    }
}
