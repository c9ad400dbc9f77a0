//! Performance metrics and statistics tracking for fraud checks.

use crate::types::Verdict;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for the check service
pub struct PipelineMetrics {
    /// Submissions that produced a verdict
    pub submissions_processed: AtomicU64,
    /// Submissions rejected by form validation
    pub rejected_submissions: AtomicU64,
    /// Verdicts that came back fraudulent
    pub fraud_verdicts: AtomicU64,
    /// Sentinel fallbacks per categorical column
    unseen_by_column: RwLock<HashMap<String, u64>>,
    /// End-to-end processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Model inference times (in microseconds)
    model_times: RwLock<HashMap<String, Vec<u64>>>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl PipelineMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            submissions_processed: AtomicU64::new(0),
            rejected_submissions: AtomicU64::new(0),
            fraud_verdicts: AtomicU64::new(0),
            unseen_by_column: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            model_times: RwLock::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Record a completed check
    pub fn record_submission(&self, processing_time: Duration, verdict: Verdict) {
        self.submissions_processed.fetch_add(1, Ordering::Relaxed);
        if verdict.is_fraud() {
            self.fraud_verdicts.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    /// Record a submission rejected before inference
    pub fn record_rejection(&self) {
        self.rejected_submissions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record categorical columns that fell back to the sentinel
    pub fn record_unseen(&self, columns: &[&str]) {
        if columns.is_empty() {
            return;
        }
        if let Ok(mut by_column) = self.unseen_by_column.write() {
            for column in columns {
                *by_column.entry(column.to_string()).or_insert(0) += 1;
            }
        }
    }

    /// Record model inference time
    pub fn record_model_time(&self, model_name: &str, duration: Duration) {
        if let Ok(mut times) = self.model_times.write() {
            let model_times = times.entry(model_name.to_string()).or_insert_with(Vec::new);
            model_times.push(duration.as_micros() as u64);
            // Keep only last 1000 per model
            if model_times.len() > 1000 {
                model_times.drain(0..500);
            }
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        self.processing_times
            .read()
            .map(|times| ProcessingStats::from_samples(&times))
            .unwrap_or_default()
    }

    /// Get model performance stats
    pub fn get_model_stats(&self) -> HashMap<String, ModelStats> {
        let Ok(times) = self.model_times.read() else {
            return HashMap::new();
        };

        times
            .iter()
            .filter(|(_, samples)| !samples.is_empty())
            .map(|(model, samples)| {
                let stats = ProcessingStats::from_samples(samples);
                (
                    model.clone(),
                    ModelStats {
                        calls: stats.count,
                        mean_us: stats.mean_us,
                        p50_us: stats.p50_us,
                        p99_us: stats.p99_us,
                    },
                )
            })
            .collect()
    }

    /// Sentinel fallbacks per categorical column
    pub fn get_unseen_by_column(&self) -> HashMap<String, u64> {
        self.unseen_by_column
            .read()
            .map(|by_column| by_column.clone())
            .unwrap_or_default()
    }

    /// Get current throughput (checks per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.submissions_processed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Share of verdicts that were fraudulent, in percent
    pub fn fraud_rate(&self) -> f64 {
        let processed = self.submissions_processed.load(Ordering::Relaxed);
        if processed == 0 {
            return 0.0;
        }
        self.fraud_verdicts.load(Ordering::Relaxed) as f64 / processed as f64 * 100.0
    }

    /// Point-in-time copy for the metrics endpoint
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            submissions_processed: self.submissions_processed.load(Ordering::Relaxed),
            rejected_submissions: self.rejected_submissions.load(Ordering::Relaxed),
            fraud_verdicts: self.fraud_verdicts.load(Ordering::Relaxed),
            fraud_rate_pct: self.fraud_rate(),
            throughput_per_sec: self.get_throughput(),
            unseen_by_column: self.get_unseen_by_column(),
            processing: self.get_processing_stats(),
            models: self.get_model_stats(),
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let snapshot = self.snapshot();
        let processing = &snapshot.processing;

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║                FRAUD CHECK - METRICS SUMMARY                 ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Checks Processed: {:>8}  │  Rejected: {:>8}            ║",
            snapshot.submissions_processed, snapshot.rejected_submissions
        );
        info!(
            "║ Fraud Verdicts:   {:>8}  │  Fraud Rate: {:>6.1}%          ║",
            snapshot.fraud_verdicts, snapshot.fraud_rate_pct
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Processing Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        if !snapshot.unseen_by_column.is_empty() {
            info!("╠══════════════════════════════════════════════════════════════╣");
            info!("║ Unseen Categorical Values:                                   ║");
            for (column, count) in &snapshot.unseen_by_column {
                info!("║   {:10}: {:>6}                                         ║", column, count);
            }
        }
        info!("╚══════════════════════════════════════════════════════════════╝");

        if !snapshot.models.is_empty() {
            info!("Model Inference Times (μs):");
            for (model, stats) in &snapshot.models {
                info!(
                    "  {}: mean={} p50={} p99={} (calls={})",
                    model, stats.mean_us, stats.p50_us, stats.p99_us, stats.calls
                );
            }
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default, Clone, Serialize)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

impl ProcessingStats {
    fn from_samples(samples: &[u64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut sorted = samples.to_vec();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        Self {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: sorted[count - 1],
        }
    }
}

/// Model-specific statistics
#[derive(Debug, Clone, Serialize)]
pub struct ModelStats {
    pub calls: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p99_us: u64,
}

/// Serializable view of all counters
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub submissions_processed: u64,
    pub rejected_submissions: u64,
    pub fraud_verdicts: u64,
    pub fraud_rate_pct: f64,
    pub throughput_per_sec: f64,
    pub unseen_by_column: HashMap<String, u64>,
    pub processing: ProcessingStats,
    pub models: HashMap<String, ModelStats>,
}

/// Real-time metrics reporter that prints periodic summaries
pub struct MetricsReporter {
    metrics: Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs: interval_secs.max(1),
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
