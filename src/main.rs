//! cursor-tether-relay
//!
//! Entry point for the relay server binary.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use cursor_tether::config::Config;
use cursor_tether::server::RelayServer;
use cursor_tether::utils::{format_user_error, init_logging, LogOptions};

/// Command-line arguments for cursor-tether-relay
#[derive(Parser, Debug)]
#[command(name = "cursor-tether-relay")]
#[command(version, about = "Shared cursor presence relay", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// Listen address
    #[arg(short, long, env = "CURSOR_TETHER_LISTEN")]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short, long, env = "CURSOR_TETHER_PORT", default_value = "3000")]
    pub port: u16,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log format (json|pretty|compact)
    #[arg(long, default_value = "pretty")]
    pub log_format: String,

    /// Write logs to file (in addition to stdout)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config first so the logging section applies; report the failure once logging is up
    let (config, load_error) = match Config::load(&args.config) {
        Ok(config) => (config, None),
        Err(e) => (Config::default_config()?, Some(e)),
    };

    let _log_guard = init_logging(&LogOptions {
        verbosity: args.verbose,
        level: config.logging.level.clone(),
        format: args.log_format.clone(),
        file: args.log_file.clone(),
        dir: config.logging.log_dir.clone(),
        file_prefix: "cursor-tether-relay.log".to_string(),
    })?;

    info!("════════════════════════════════════════════════════════");
    info!("  cursor-tether-relay v{}", env!("CARGO_PKG_VERSION"));
    info!("  Profile: {}", if cfg!(debug_assertions) { "debug" } else { "release" });
    info!("════════════════════════════════════════════════════════");

    if let Some(e) = load_error {
        warn!("Failed to load config: {:#}, using defaults", e);
    }

    // Override config with CLI args
    let config = config.with_overrides(args.listen.clone(), args.port);
    if let Err(e) = config.validate() {
        eprintln!("{}", format_user_error(&e));
        return Err(e);
    }

    info!("Configuration loaded successfully");
    debug!("Config: {:?}", config);

    let server = RelayServer::new(config);
    if let Err(e) = server.run().await {
        eprintln!("{}", format_user_error(&e));
        return Err(e);
    }

    Ok(())
}
