//! Request counters and latency statistics for the predictor.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Latency samples kept before the oldest half is dropped.
const MAX_LATENCY_SAMPLES: usize = 10_000;

/// Metrics collector for inference requests
pub struct PipelineMetrics {
    /// Total requests answered with a label
    pub requests_processed: AtomicU64,
    /// Total requests rejected (schema mismatch, malformed input)
    pub requests_failed: AtomicU64,
    /// Predictions per label
    labels: RwLock<BTreeMap<String, u64>>,
    /// Per-call latency (in microseconds)
    latencies: RwLock<Vec<u64>>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            requests_processed: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            labels: RwLock::new(BTreeMap::new()),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record one inference call that produced `labels`.
    pub fn record_batch<'a>(&self, latency: Duration, labels: impl IntoIterator<Item = &'a str>) {
        let mut count = 0;
        let mut by_label = self.labels.write().unwrap_or_else(PoisonError::into_inner);
        for label in labels {
            *by_label.entry(label.to_string()).or_insert(0) += 1;
            count += 1;
        }
        drop(by_label);
        self.requests_processed.fetch_add(count, Ordering::Relaxed);

        let mut times = self.latencies.write().unwrap_or_else(PoisonError::into_inner);
        times.push(latency.as_micros() as u64);
        if times.len() > MAX_LATENCY_SAMPLES {
            times.drain(0..MAX_LATENCY_SAMPLES / 2);
        }
    }

    /// Record `count` rejected requests.
    pub fn record_failure(&self, count: u64) {
        self.requests_failed.fetch_add(count, Ordering::Relaxed);
    }

    /// Latency statistics over the retained samples
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let times = self.latencies.read().unwrap_or_else(PoisonError::into_inner);
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let percentile = |p: f64| sorted[((count as f64 * p) as usize).min(count - 1)];

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: percentile(0.50),
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Predictions per label
    pub fn get_label_counts(&self) -> BTreeMap<String, u64> {
        self.labels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Requests per second since startup
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.requests_processed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let processed = self.requests_processed.load(Ordering::Relaxed);
        let failed = self.requests_failed.load(Ordering::Relaxed);
        let stats = self.get_processing_stats();

        info!(
            processed,
            failed,
            throughput = format!("{:.1} req/s", self.get_throughput()),
            "Predictor summary"
        );
        info!(
            calls = stats.count,
            mean_us = stats.mean_us,
            p50_us = stats.p50_us,
            p95_us = stats.p95_us,
            p99_us = stats.p99_us,
            max_us = stats.max_us,
            "Inference latency"
        );
        for (label, count) in self.get_label_counts() {
            let pct = if processed > 0 {
                count as f64 / processed as f64 * 100.0
            } else {
                0.0
            };
            info!(label = %label, count, share = format!("{:.1}%", pct), "Predicted label");
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = PipelineMetrics::new();

        metrics.record_batch(Duration::from_micros(100), ["High"]);
        metrics.record_batch(Duration::from_micros(300), ["Low", "High"]);
        metrics.record_failure(1);

        assert_eq!(metrics.requests_processed.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.requests_failed.load(Ordering::Relaxed), 1);

        let labels = metrics.get_label_counts();
        assert_eq!(labels.get("High"), Some(&2));
        assert_eq!(labels.get("Low"), Some(&1));
    }

    #[test]
    fn test_processing_stats() {
        let metrics = PipelineMetrics::new();
        for us in [100, 200, 300, 400] {
            metrics.record_batch(Duration::from_micros(us), ["Medium"]);
        }

        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean_us, 250);
        assert_eq!(stats.p50_us, 300);
        assert_eq!(stats.max_us, 400);
    }

    #[test]
    fn test_poisoned_lock_still_counts() {
        let metrics = PipelineMetrics::new();
        let poisoned = std::thread::scope(|s| {
            s.spawn(|| {
                let _guard = metrics.labels.write().unwrap();
                panic!("writer panicked while holding the label lock");
            })
            .join()
        });
        assert!(poisoned.is_err());
        assert!(metrics.labels.is_poisoned());

        metrics.record_batch(Duration::from_micros(50), ["High", "Low"]);

        assert_eq!(metrics.requests_processed.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.get_label_counts().get("High"), Some(&1));
        assert_eq!(metrics.get_processing_stats().count, 1);
    }

    #[test]
    fn test_empty_stats() {
        assert_eq!(
            PipelineMetrics::new().get_processing_stats(),
            ProcessingStats::default()
        );
    }
}
