//! Configuration management
//!
//! Handles loading, validation, and merging of configuration from:
//! - TOML files
//! - Environment variables (through the CLI)
//! - CLI arguments
//!
//! Every section and field has a default, so an empty file is a valid
//! configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

pub mod types;

pub use types::{ClientConfig, LoggingConfig, ServerConfig};

use crate::character::CharacterConfig;
use crate::cursor::SmootherConfig;
use crate::rope::RopeConfig;
use crate::scene::SceneConfig;
use crate::viewport::{self, Viewport};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Relay server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Client channel configuration
    #[serde(default)]
    pub client: ClientConfig,
    /// Rope simulation configuration
    #[serde(default)]
    pub rope: RopeConfig,
    /// Tethered character configuration
    #[serde(default)]
    pub character: CharacterConfig,
    /// Remote cursor smoothing configuration
    #[serde(default)]
    pub smoother: SmootherConfig,
    /// Scene configuration
    #[serde(default)]
    pub scene: SceneConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn unit_interval(value: f32) -> bool {
    (0.0..=1.0).contains(&value)
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Create default configuration
    pub fn default_config() -> Result<Self> {
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.server
            .listen_addr
            .parse::<SocketAddr>()
            .context("Invalid listen address")?;

        if self.server.max_connections == 0 {
            anyhow::bail!("server.max_connections must be at least 1");
        }
        if self.server.max_connections > tokio::sync::Semaphore::MAX_PERMITS {
            anyhow::bail!(
                "server.max_connections must be at most {}",
                tokio::sync::Semaphore::MAX_PERMITS
            );
        }
        if self.server.broadcast_interval_ms == 0 {
            anyhow::bail!("server.broadcast_interval_ms must be positive");
        }
        if self.server.client_queue_size == 0 {
            anyhow::bail!("server.client_queue_size must be at least 1");
        }

        if !self.client.url.starts_with("ws://") && !self.client.url.starts_with("wss://") {
            anyhow::bail!("Invalid client url (expected ws:// or wss://): {}", self.client.url);
        }
        if self.client.reconnect_delay_ms == 0 {
            anyhow::bail!("client.reconnect_delay_ms must be positive");
        }
        self.viewport().context("Invalid client viewport")?;

        let rope = &self.rope;
        if !rope.resolution.is_finite() || rope.resolution <= 0.0 {
            anyhow::bail!("rope.resolution must be positive: {}", rope.resolution);
        }
        if !rope.length.is_finite() || rope.length <= 0.0 {
            anyhow::bail!("rope.length must be positive: {}", rope.length);
        }
        if rope.solver_iterations == 0 {
            anyhow::bail!("rope.solver_iterations must be at least 1");
        }
        if !unit_interval(rope.damping) {
            anyhow::bail!("rope.damping must be in 0.0-1.0: {}", rope.damping);
        }
        if !rope.mass.is_finite() || !rope.gravity.is_finite() {
            anyhow::bail!("rope.mass and rope.gravity must be finite");
        }
        if !rope.start_offset.is_finite() || !rope.end_offset.is_finite() {
            anyhow::bail!("rope offsets must be finite");
        }

        let character = &self.character;
        if !unit_interval(character.damping) {
            anyhow::bail!("character.damping must be in 0.0-1.0: {}", character.damping);
        }
        if !character.repel_threshold.is_finite() || !character.seek_threshold.is_finite() {
            anyhow::bail!(
                "character thresholds must be finite: repel_threshold {}, seek_threshold {}",
                character.repel_threshold,
                character.seek_threshold
            );
        }
        if character.repel_threshold < 0.0 || character.seek_threshold < character.repel_threshold
        {
            anyhow::bail!(
                "character thresholds must satisfy 0 <= repel_threshold ({}) <= seek_threshold ({})",
                character.repel_threshold,
                character.seek_threshold
            );
        }
        if !character.seek_gain.is_finite() || !character.drift.is_finite() {
            anyhow::bail!("character.seek_gain and character.drift must be finite");
        }
        if !character.depth.is_finite() || !character.cursor_offset.is_finite() {
            anyhow::bail!("character.depth and character.cursor_offset must be finite");
        }

        if self.smoother.history_size == 0 {
            anyhow::bail!("smoother.history_size must be at least 1");
        }
        if self.smoother.min_interval_ms == 0
            || self.smoother.min_interval_ms > self.smoother.max_interval_ms
        {
            anyhow::bail!(
                "smoother intervals must satisfy 0 < min ({}) <= max ({})",
                self.smoother.min_interval_ms,
                self.smoother.max_interval_ms
            );
        }

        if self.scene.send_interval_ms == 0 {
            anyhow::bail!("scene.send_interval_ms must be positive");
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Invalid log level: {}", self.logging.level),
        }

        Ok(())
    }

    /// Override config with CLI arguments
    pub fn with_overrides(mut self, listen: Option<String>, port: u16) -> Self {
        if let Some(listen_addr) = listen {
            self.server.listen_addr = format!("{}:{}", listen_addr, port);
        } else if let Ok(mut addr) = self.server.listen_addr.parse::<SocketAddr>() {
            addr.set_port(port);
            self.server.listen_addr = addr.to_string();
        }

        self
    }

    /// Viewport described by the client section
    pub fn viewport(&self) -> viewport::Result<Viewport> {
        Viewport::from_camera(
            self.client.canvas_width,
            self.client.canvas_height,
            self.client.camera_distance,
            self.client.ideal_fov,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default_config().unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:3000");
        assert_eq!(config.server.broadcast_interval_ms, 100);
        assert_eq!(config.rope.solver_iterations, 500);
        assert_eq!(config.smoother.max_interval_ms, 300);
        assert!(!config.scene.tether_remote);
    }

    #[test]
    fn test_config_validation_invalid_address() {
        let mut config = Config::default_config().unwrap();
        config.server.listen_addr = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_rope() {
        let mut config = Config::default_config().unwrap();
        config.rope.resolution = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default_config().unwrap();
        config.rope.solver_iterations = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default_config().unwrap();
        config.rope.damping = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_thresholds() {
        let mut config = Config::default_config().unwrap();
        config.character.repel_threshold = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_non_finite_character() {
        let mut config = Config::default_config().unwrap();
        config.character.seek_threshold = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default_config().unwrap();
        config.character.repel_threshold = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default_config().unwrap();
        config.character.depth = f32::INFINITY;
        assert!(config.validate().is_err());

        let mut config = Config::default_config().unwrap();
        config.character.cursor_offset = glam::Vec3::new(0.0, f32::NAN, 0.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_smoother_intervals() {
        let mut config = Config::default_config().unwrap();
        config.smoother.min_interval_ms = 500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_url_and_log_level() {
        let mut config = Config::default_config().unwrap();
        config.client.url = "http://localhost:3000".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default_config().unwrap();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_with_overrides() {
        let config = Config::default_config().unwrap();
        let config = config.with_overrides(None, 4000);
        assert_eq!(config.server.listen_addr, "0.0.0.0:4000");

        let config = config.with_overrides(Some("127.0.0.1".to_string()), 4001);
        assert_eq!(config.server.listen_addr, "127.0.0.1:4001");
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default_config().unwrap();
        config.scene.tether_remote = true;
        config.rope.gravity = glam::Vec3::new(0.0, -9.8, 0.0);

        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert!(parsed.scene.tether_remote);
        assert_eq!(parsed.rope.gravity, glam::Vec3::new(0.0, -9.8, 0.0));
        assert_eq!(parsed.server.listen_addr, config.server.listen_addr);
        parsed.validate().unwrap();
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
listen_addr = "127.0.0.1:9000"

[rope]
solver_iterations = 50
"#
        )
        .unwrap();

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.server.max_connections, 256);
        assert_eq!(config.rope.solver_iterations, 50);
        assert_eq!(config.rope.resolution, 0.25);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[smoother]\nhistory_size = 0").unwrap();
        assert!(Config::load(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/cursor-tether.toml").unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read config file"));
    }
}
