//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Relay server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:3000")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Maximum number of concurrent connections
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Interval between cursor table broadcasts (ms)
    #[serde(default = "default_broadcast_interval_ms")]
    pub broadcast_interval_ms: u64,

    /// Outbound frames queued per client before broadcasts are dropped
    #[serde(default = "default_client_queue_size")]
    pub client_queue_size: usize,
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}
fn default_max_connections() -> usize {
    256
}
fn default_broadcast_interval_ms() -> u64 {
    100
}
fn default_client_queue_size() -> usize {
    8
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            max_connections: default_max_connections(),
            broadcast_interval_ms: default_broadcast_interval_ms(),
            client_queue_size: default_client_queue_size(),
        }
    }
}

/// Client channel and viewport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Relay WebSocket URL
    #[serde(default = "default_url")]
    pub url: String,

    /// Delay before reconnecting after close or error (ms)
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Canvas width (pixels)
    #[serde(default = "default_canvas_width")]
    pub canvas_width: f32,

    /// Canvas height (pixels)
    #[serde(default = "default_canvas_height")]
    pub canvas_height: f32,

    /// Camera distance to the cursor plane (world units)
    #[serde(default = "default_camera_distance")]
    pub camera_distance: f32,

    /// Vertical field of view at the ideal canvas height (degrees)
    #[serde(default = "default_ideal_fov")]
    pub ideal_fov: f32,
}

fn default_url() -> String {
    "ws://127.0.0.1:3000".to_string()
}
fn default_reconnect_delay_ms() -> u64 {
    1000
}
fn default_canvas_width() -> f32 {
    1280.0
}
fn default_canvas_height() -> f32 {
    800.0
}
fn default_camera_distance() -> f32 {
    5.0
}
fn default_ideal_fov() -> f32 {
    crate::viewport::camera::DEFAULT_IDEAL_FOV
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            canvas_width: default_canvas_width(),
            canvas_height: default_canvas_height(),
            camera_distance: default_camera_distance(),
            ideal_fov: default_ideal_fov(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level ("trace", "debug", "info", "warn", "error")
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for log files (None = console only)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Enable metrics collection
    #[serde(default = "default_metrics")]
    pub metrics: bool,
}

fn default_level() -> String {
    "info".to_string()
}
fn default_metrics() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            log_dir: None,
            metrics: default_metrics(),
        }
    }
}
