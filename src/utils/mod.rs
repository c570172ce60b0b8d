//! Utility Functions
//!
//! Runtime metrics, logging setup and user-friendly error formatting.
//!
//! ## Metrics
//!
//! ```rust
//! use cursor_tether::utils::{metric_names, MetricsCollector};
//!
//! let metrics = MetricsCollector::new();
//! metrics.increment_counter(metric_names::BROADCASTS, 1);
//! metrics.record_histogram(metric_names::FRAME_TIME_MS, 0.8);
//!
//! let json = metrics.export_json().unwrap();
//! assert!(json.contains("broadcasts_total"));
//! ```
//!
//! ## Error Formatting
//!
//! ```rust
//! use cursor_tether::utils::format_user_error;
//!
//! let error = anyhow::anyhow!("Failed to bind 0.0.0.0:3000");
//! eprintln!("{}", format_user_error(&error));
//! ```
//!
//! Error categories with context-aware help:
//! - Network errors → port conflicts, permissions, listen address
//! - Config errors → file path, TOML syntax, value ranges
//! - Connection errors → relay not running, URL format

pub mod errors;
pub mod logging;
pub mod metrics;

pub use errors::format_user_error;
pub use logging::{init_logging, LogOptions};
pub use metrics::{metric_names, HistogramStats, MetricsCollector, MetricsSnapshot, Timer};
