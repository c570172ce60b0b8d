//! Runtime Metrics
//!
//! Counters, gauges and histograms shared between tasks. The relay records
//! connection and broadcast activity; the headless client records frame
//! times. Snapshots export as JSON.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

/// Observations kept per histogram; older ones are discarded
const HISTOGRAM_WINDOW: usize = 4096;

/// Metrics collector shared by all components
#[derive(Clone)]
pub struct MetricsCollector {
    counters: Arc<RwLock<HashMap<String, u64>>>,
    gauges: Arc<RwLock<HashMap<String, f64>>>,
    histograms: Arc<RwLock<HashMap<String, Histogram>>>,
    start_time: Instant,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            counters: Arc::new(RwLock::new(HashMap::new())),
            gauges: Arc::new(RwLock::new(HashMap::new())),
            histograms: Arc::new(RwLock::new(HashMap::new())),
            start_time: Instant::now(),
        }
    }

    /// Increment a counter by `value`
    pub fn increment_counter(&self, name: &str, value: u64) {
        let mut counters = self.counters.write();
        *counters.entry(name.to_string()).or_insert(0) += value;
    }

    /// Set a gauge value
    pub fn set_gauge(&self, name: &str, value: f64) {
        let mut gauges = self.gauges.write();
        gauges.insert(name.to_string(), value);
    }

    /// Record a histogram observation
    pub fn record_histogram(&self, name: &str, value: f64) {
        let mut histograms = self.histograms.write();
        histograms
            .entry(name.to_string())
            .or_insert_with(Histogram::new)
            .record(value);
    }

    /// Get a counter value
    pub fn get_counter(&self, name: &str) -> Option<u64> {
        self.counters.read().get(name).copied()
    }

    /// Get a gauge value
    pub fn get_gauge(&self, name: &str) -> Option<f64> {
        self.gauges.read().get(name).copied()
    }

    /// Get histogram statistics
    pub fn get_histogram(&self, name: &str) -> Option<HistogramStats> {
        self.histograms.read().get(name).map(|h| h.stats())
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: SystemTime::now(),
            uptime: self.start_time.elapsed(),
            counters: self.counters.read().clone(),
            gauges: self.gauges.read().clone(),
            histograms: self
                .histograms
                .read()
                .iter()
                .map(|(k, v)| (k.clone(), v.stats()))
                .collect(),
        }
    }

    /// Export metrics as JSON
    pub fn export_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Sliding window of observations
struct Histogram {
    values: VecDeque<f64>,
    total: u64,
}

impl Histogram {
    fn new() -> Self {
        Self {
            values: VecDeque::new(),
            total: 0,
        }
    }

    fn record(&mut self, value: f64) {
        if self.values.len() == HISTOGRAM_WINDOW {
            self.values.pop_front();
        }
        self.values.push_back(value);
        self.total += 1;
    }

    fn stats(&self) -> HistogramStats {
        if self.values.is_empty() {
            return HistogramStats::default();
        }

        let mut sorted: Vec<f64> = self.values.iter().copied().collect();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let count = sorted.len() as f64;
        let sum: f64 = sorted.iter().sum();
        let mean = sum / count;
        let variance = sorted.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / count;

        HistogramStats {
            count: self.total,
            sum,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            mean,
            stddev: variance.sqrt(),
            p50: percentile(&sorted, 0.50),
            p95: percentile(&sorted, 0.95),
            p99: percentile(&sorted, 0.99),
        }
    }
}

/// Inclusive percentile over sorted values (p=0 → first, p=1 → last)
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }
    let index = ((sorted_values.len() - 1) as f64 * p) as usize;
    sorted_values[index.min(sorted_values.len() - 1)]
}

/// Histogram statistics over the retained window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HistogramStats {
    /// Total number of observations ever recorded
    pub count: u64,
    /// Sum of retained observations
    pub sum: f64,
    /// Minimum retained value
    pub min: f64,
    /// Maximum retained value
    pub max: f64,
    /// Mean of retained observations
    pub mean: f64,
    /// Standard deviation of retained observations
    pub stddev: f64,
    /// 50th percentile (median)
    pub p50: f64,
    /// 95th percentile
    pub p95: f64,
    /// 99th percentile
    pub p99: f64,
}

/// Point-in-time snapshot of all collected metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// When this snapshot was taken
    pub timestamp: SystemTime,
    /// Uptime at snapshot time
    pub uptime: Duration,
    /// Counter values (monotonically increasing)
    pub counters: HashMap<String, u64>,
    /// Gauge values (current state)
    pub gauges: HashMap<String, f64>,
    /// Histogram statistics
    pub histograms: HashMap<String, HistogramStats>,
}

pub mod metric_names {
    //! Metric names shared by the relay and the headless client.

    /// Currently connected clients
    pub const CONNECTIONS_ACTIVE: &str = "connections_active";
    /// Connections accepted since start
    pub const CONNECTIONS_TOTAL: &str = "connections_total";
    /// Connections refused because the relay was full
    pub const CONNECTIONS_REJECTED: &str = "connections_rejected_total";

    /// Cursor updates accepted from clients
    pub const MESSAGES_RECEIVED: &str = "messages_received_total";
    /// Client frames that failed to parse or validate
    pub const MESSAGES_INVALID: &str = "messages_invalid_total";

    /// Cursor table broadcasts sent
    pub const BROADCASTS: &str = "broadcasts_total";
    /// Broadcast frames dropped on full client queues
    pub const BROADCASTS_DROPPED: &str = "broadcasts_dropped_total";

    /// Frames simulated by the headless client
    pub const FRAMES: &str = "frames_total";
    /// Simulation time per frame (milliseconds)
    pub const FRAME_TIME_MS: &str = "frame_time_ms";
    /// Remote cursors visible in the last frame
    pub const REMOTE_CURSORS: &str = "remote_cursors";
    /// Reconnect attempts made by the client channel
    pub const RECONNECTS: &str = "reconnects_total";
}

/// Timer helper for measuring durations
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
