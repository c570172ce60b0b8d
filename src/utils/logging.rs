//! Tracing subscriber setup shared by the binaries

use anyhow::{Context, Result};
use std::fs::File;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Logging options collected from CLI and config
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// `-v` count; 0 uses `level`
    pub verbosity: u8,
    /// Level when not verbose
    pub level: String,
    /// "json", "compact" or anything else for pretty
    pub format: String,
    /// Log file written in addition to stdout
    pub file: Option<PathBuf>,
    /// Directory for daily rolling logs, used when `file` is unset
    pub dir: Option<PathBuf>,
    /// Prefix for rolling log files
    pub file_prefix: String,
}

impl LogOptions {
    /// Effective level
    pub fn effective_level(&self) -> &str {
        match self.verbosity {
            0 => &self.level,
            1 => "debug",
            _ => "trace",
        }
    }

    /// Filter directives used when `RUST_LOG` is not set
    pub fn default_directives(&self) -> String {
        format!(
            "cursor_tether={level},cursor_tether_relay={level},cursor_tether_headless={level},tungstenite=info,tokio_tungstenite=info,warn",
            level = self.effective_level()
        )
    }
}

/// Install the global subscriber
///
/// The returned guard flushes the file writer on drop and must live until
/// the program exits.
pub fn init_logging(options: &LogOptions) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.default_directives()));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    layers.push(match options.format.as_str() {
        "json" => fmt::layer().json().boxed(),
        "compact" => fmt::layer().compact().boxed(),
        _ => fmt::layer().pretty().boxed(),
    });

    let mut guard = None;
    let writer = if let Some(path) = &options.file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file: {}", path.display()))?;
        Some(tracing_appender::non_blocking(file))
    } else {
        options.dir.as_ref().map(|dir| {
            tracing_appender::non_blocking(tracing_appender::rolling::daily(
                dir,
                &options.file_prefix,
            ))
        })
    };

    if let Some((writer, worker_guard)) = writer {
        guard = Some(worker_guard);
        let layer = fmt::layer().with_writer(writer).with_ansi(false);
        layers.push(match options.format.as_str() {
            "json" => layer.json().boxed(),
            _ => layer.boxed(),
        });
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
