//! cursor-tether-headless
//!
//! Runs a presence scene without a window: a synthetic cursor circles the
//! canvas, updates go to the relay, remote cursors are smoothed, and the
//! tether is simulated at a fixed frame rate.

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec2;
use std::f32::consts::TAU;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use cursor_tether::client::{ChannelEvent, CursorChannel};
use cursor_tether::config::Config;
use cursor_tether::cursor::PointerEvent;
use cursor_tether::scene::{FrameSnapshot, Scene};
use cursor_tether::utils::{
    format_user_error, init_logging, metric_names, LogOptions, MetricsCollector, Timer,
};

/// Command-line arguments for cursor-tether-headless
#[derive(Parser, Debug)]
#[command(name = "cursor-tether-headless")]
#[command(version, about = "Headless cursor presence client", long_about = None)]
pub struct Args {
    /// Relay URL (overrides client.url)
    #[arg(short, long, env = "CURSOR_TETHER_URL")]
    pub url: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// Frames per second
    #[arg(long, default_value = "60")]
    pub fps: u32,

    /// Stop after this many frames (runs until Ctrl+C when omitted)
    #[arg(long)]
    pub frames: Option<u64>,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log format (json|pretty|compact)
    #[arg(long, default_value = "compact")]
    pub log_format: String,
}

/// Seconds for one lap of the synthetic cursor
const LAP_SECONDS: f32 = 6.0;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (mut config, load_error) = match Config::load(&args.config) {
        Ok(config) => (config, None),
        Err(e) => (Config::default_config()?, Some(e)),
    };

    let _log_guard = init_logging(&LogOptions {
        verbosity: args.verbose,
        level: config.logging.level.clone(),
        format: args.log_format.clone(),
        file: None,
        dir: config.logging.log_dir.clone(),
        file_prefix: "cursor-tether-headless.log".to_string(),
    })?;

    if let Some(e) = load_error {
        warn!("Failed to load config: {:#}, using defaults", e);
    }
    if let Some(url) = args.url.clone() {
        config.client.url = url;
    }

    if let Err(e) = run(config, &args).await {
        eprintln!("{}", format_user_error(&e));
        return Err(e);
    }
    Ok(())
}

async fn run(config: Config, args: &Args) -> Result<()> {
    config.validate()?;
    if args.fps == 0 {
        anyhow::bail!("--fps must be at least 1");
    }

    let viewport = config.viewport().context("Invalid client viewport")?;
    let mut scene = Scene::new(
        config.scene.clone(),
        config.rope.clone(),
        config.character.clone(),
        config.smoother.clone(),
        viewport,
    )
    .context("Invalid rope configuration")?;

    let mut channel = CursorChannel::connect(
        config.client.url.clone(),
        Duration::from_millis(config.client.reconnect_delay_ms),
    )?;

    info!(
        "Headless client: {} at {} fps, canvas {}x{}",
        config.client.url, args.fps, viewport.canvas_width, viewport.canvas_height
    );

    let metrics = MetricsCollector::new();
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / args.fps as f64));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let started = Instant::now();
    let mut last_frame = started;
    let mut frame_count: u64 = 0;
    let mut entered = false;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
            _ = ticker.tick() => {}
        }

        let now = Instant::now();
        let dt = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;
        let timer = Timer::new();

        while let Some(event) = channel.try_recv() {
            match event {
                ChannelEvent::Connected => info!("Relay connected"),
                ChannelEvent::Message(message) => scene.handle_server_message(message, now),
                ChannelEvent::Disconnected => {
                    warn!("Relay disconnected, reconnecting");
                    scene.handle_disconnect();
                    metrics.increment_counter(metric_names::RECONNECTS, 1);
                }
            }
        }

        let viewport = scene.tracker().current();
        let pointer = circle_position(
            now.duration_since(started).as_secs_f32(),
            viewport.canvas_width,
            viewport.canvas_height,
        );
        let event = if entered {
            PointerEvent::Move(pointer)
        } else {
            entered = true;
            PointerEvent::Enter(pointer)
        };

        let outbound = scene
            .handle_pointer(event, now)
            .or_else(|| scene.poll_outbound(now));
        if let Some(update) = outbound {
            channel.send(update)?;
        }

        let snapshot = scene.frame(now, dt);
        frame_count += 1;

        metrics.record_histogram(metric_names::FRAME_TIME_MS, timer.elapsed_ms());
        metrics.increment_counter(metric_names::FRAMES, 1);
        metrics.set_gauge(metric_names::REMOTE_CURSORS, scene.remote_count() as f64);

        trace!("Frame {}: {} cursors", frame_count, snapshot.cursors.len());
        if frame_count % u64::from(args.fps) == 0 {
            log_frame(&scene, &snapshot);
        }

        if args.frames.is_some_and(|limit| frame_count >= limit) {
            info!("Rendered {} frames", frame_count);
            break;
        }
    }

    if config.logging.metrics {
        info!("Final metrics:\n{}", metrics.export_json()?);
    }
    channel.shutdown();
    Ok(())
}

/// Pointer position on a circle around the canvas center
fn circle_position(elapsed: f32, width: f32, height: f32) -> Vec2 {
    let angle = elapsed / LAP_SECONDS * TAU;
    let radius = 0.35 * width.min(height);
    Vec2::new(
        width * 0.5 + radius * angle.cos(),
        height * 0.5 + radius * angle.sin(),
    )
}

fn log_frame(scene: &Scene, snapshot: &FrameSnapshot) {
    let id = scene.self_id().unwrap_or("-");
    match snapshot.tethers.first() {
        Some(tether) => debug!(
            "[{}] {} remote cursors, character at ({:.2}, {:.2}, {:.2}), rope end z {:.2}",
            id,
            scene.remote_count(),
            tether.character.x,
            tether.character.y,
            tether.character.z,
            tether.rope.last().map_or(0.0, |p| p.z)
        ),
        None => debug!("[{}] {} remote cursors", id, scene.remote_count()),
    }
}
