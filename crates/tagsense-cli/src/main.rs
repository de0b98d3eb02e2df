//! `tagsense` – headless marker-distance daemon.
//!
//! 1. Loads `~/.tagsense/config.toml` (defaults when absent); exits non-zero
//!    if the file exists but is unreadable or invalid.
//! 2. Opens the detection feed for the configured camera; exits non-zero if
//!    it cannot.
//! 3. Installs a SIGINT/SIGTERM handler and runs the control loop until the
//!    signal arrives, the feed ends, or the loop fails, then forces the
//!    indicator off and exits 0.

mod config;

use std::panic::{self, AssertUnwindSafe};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tagsense_hal::JsonLinesFeed;
use tagsense_middleware::FileChannels;
use tagsense_runtime::{ControlLoop, init_tracing};
use tracing::{error, info, warn};

fn main() -> ExitCode {
    let _telemetry = init_tracing("tagsense");

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load_or_default() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "refusing to start");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = cfg.validate() {
        error!(error = %e, "refusing to start");
        return ExitCode::FAILURE;
    }
    info!(
        path = %config::config_path().display(),
        camera_id = cfg.camera_id,
        near_threshold = cfg.near_threshold,
        batch_size = cfg.batch_size,
        debounce_threshold = cfg.debounce_threshold,
        "configuration"
    );

    // ── Frame source ──────────────────────────────────────────────────────
    // Opened before the signal handler goes in: a feed that never connects
    // can still be interrupted the default way.
    let feed_path = cfg.feed_path();
    let feed = match JsonLinesFeed::open(cfg.source_id(), &feed_path) {
        Ok(feed) => {
            info!(
                path = %feed_path.display(),
                mode = ?feed.mode(),
                marker_size = cfg.marker_size,
                "opened detection feed"
            );
            feed
        }
        Err(e) => {
            error!(error = %e, "cannot open camera");
            return ExitCode::FAILURE;
        }
    };

    // ── Signal handling ───────────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || shutdown_flag.store(true, Ordering::SeqCst)) {
        warn!(error = %e, "failed to install signal handler; only end of feed will stop the loop");
    }

    // ── Control loop ──────────────────────────────────────────────────────
    let channels = FileChannels::new(cfg.channel_paths());
    let mut control = ControlLoop::new(
        cfg.control_config(),
        Box::new(feed),
        Box::new(channels.clone()),
        Box::new(channels),
    );
    // A panic inside the loop is a shutdown request like any other.
    match panic::catch_unwind(AssertUnwindSafe(|| control.run(&shutdown))) {
        Ok(reason) => info!(?reason, frames = control.frames(), "tagsense exiting"),
        Err(_) => {
            error!("control loop panicked");
            control.shutdown();
        }
    }

    ExitCode::SUCCESS
}
