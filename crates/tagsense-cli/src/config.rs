//! Daemon configuration – reads `~/.tagsense/config.toml`.
//!
//! Every field has a default, so a missing file or a partial file is fine.
//! `TAGSENSE_*` environment variables override individual fields after the
//! file is read.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tagsense_middleware::ChannelPaths;
use tagsense_perception::BatchResetPolicy;
use tagsense_runtime::ControlLoopConfig;
use tagsense_types::TagError;

/// Static configuration of the detection daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Capture device index. Also names the detection feed.
    #[serde(default = "default_camera_id")]
    pub camera_id: u32,

    /// Printed marker edge length in meters. The detector solves pose scale
    /// with it; the daemon validates it and logs it next to the feed it
    /// opens so the two can be checked against each other.
    #[serde(default = "default_marker_size")]
    pub marker_size: f64,

    /// Forward distance (meters) below which a marker counts as close.
    #[serde(default = "default_near_threshold")]
    pub near_threshold: f64,

    /// Samples per published average.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Consecutive frames needed to flip the indicator.
    #[serde(default = "default_debounce_threshold")]
    pub debounce_threshold: u32,

    #[serde(default)]
    pub batch_reset: BatchResetPolicy,

    /// Detection feed written by the detector. Defaults to
    /// `/run/tagsense/camera<camera_id>.jsonl`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_path: Option<PathBuf>,

    /// Directory holding the status and mode files.
    #[serde(default = "default_status_dir")]
    pub status_dir: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub led_status_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_status_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_status_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_path: Option<PathBuf>,

    /// Pause between loop iterations in microseconds.
    #[serde(default)]
    pub idle_pause_us: u64,

    /// How long to wait before re-reading a followed feed file that has no
    /// new frame yet, in milliseconds.
    #[serde(default = "default_feed_poll_ms")]
    pub feed_poll_ms: u64,
}

fn default_camera_id() -> u32 {
    8
}
fn default_marker_size() -> f64 {
    0.08
}
fn default_near_threshold() -> f64 {
    tagsense_perception::DEFAULT_NEAR_THRESHOLD_M
}
fn default_batch_size() -> usize {
    tagsense_perception::DEFAULT_BATCH_SIZE
}
fn default_debounce_threshold() -> u32 {
    tagsense_perception::DEFAULT_DEBOUNCE_THRESHOLD
}
fn default_feed_poll_ms() -> u64 {
    10
}
fn default_status_dir() -> PathBuf {
    PathBuf::from("/run/tagsense")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_id: default_camera_id(),
            marker_size: default_marker_size(),
            near_threshold: default_near_threshold(),
            batch_size: default_batch_size(),
            debounce_threshold: default_debounce_threshold(),
            batch_reset: BatchResetPolicy::default(),
            feed_path: None,
            status_dir: default_status_dir(),
            led_status_path: None,
            x_status_path: None,
            z_status_path: None,
            mode_path: None,
            idle_pause_us: 0,
            feed_poll_ms: default_feed_poll_ms(),
        }
    }
}

impl Config {
    /// Identifier of the frame source, e.g. `"camera8"`.
    pub fn source_id(&self) -> String {
        format!("camera{}", self.camera_id)
    }

    pub fn feed_path(&self) -> PathBuf {
        self.feed_path.clone().unwrap_or_else(|| {
            PathBuf::from("/run/tagsense").join(format!("{}.jsonl", self.source_id()))
        })
    }

    /// Channel files: conventional names under `status_dir`, replaced by
    /// any explicitly configured path.
    pub fn channel_paths(&self) -> ChannelPaths {
        let mut paths = ChannelPaths::in_dir(&self.status_dir);
        if let Some(p) = &self.led_status_path {
            paths.actuator = p.clone();
        }
        if let Some(p) = &self.x_status_path {
            paths.lateral = p.clone();
        }
        if let Some(p) = &self.z_status_path {
            paths.forward = p.clone();
        }
        if let Some(p) = &self.mode_path {
            paths.mode = p.clone();
        }
        paths
    }

    pub fn control_config(&self) -> ControlLoopConfig {
        ControlLoopConfig {
            near_threshold_m: self.near_threshold,
            batch_size: self.batch_size,
            batch_reset: self.batch_reset,
            debounce_threshold: self.debounce_threshold,
            idle_pause: Duration::from_micros(self.idle_pause_us),
            feed_poll: Duration::from_millis(self.feed_poll_ms),
        }
    }

    /// Reject values the control loop cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`TagError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<(), TagError> {
        if self.batch_size == 0 {
            return Err(TagError::InvalidConfig("batch_size must be at least 1".into()));
        }
        if self.debounce_threshold == 0 {
            return Err(TagError::InvalidConfig(
                "debounce_threshold must be at least 1".into(),
            ));
        }
        if !(self.marker_size.is_finite() && self.marker_size > 0.0) {
            return Err(TagError::InvalidConfig(format!(
                "marker_size must be positive, got {}",
                self.marker_size
            )));
        }
        if !(self.near_threshold.is_finite() && self.near_threshold > 0.0) {
            return Err(TagError::InvalidConfig(format!(
                "near_threshold must be positive, got {}",
                self.near_threshold
            )));
        }
        Ok(())
    }
}

/// Path of the config file: `TAGSENSE_CONFIG` if set, otherwise
/// `~/.tagsense/config.toml`.
pub fn config_path() -> PathBuf {
    if let Ok(p) = std::env::var("TAGSENSE_CONFIG") {
        return PathBuf::from(p);
    }
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".tagsense").join("config.toml")
}

/// Load the config, or defaults plus environment overrides when there is no
/// file.
///
/// # Errors
///
/// A file that exists but cannot be read or parsed is
/// [`TagError::InvalidConfig`]; the daemon must not start on a config it
/// could not read.
pub fn load_or_default() -> Result<Config, TagError> {
    load_or_default_from(&config_path())
}

pub(crate) fn load_or_default_from(path: &Path) -> Result<Config, TagError> {
    match load_from(path)? {
        Some(cfg) => Ok(cfg),
        None => {
            let mut cfg = Config::default();
            apply_env_overrides(&mut cfg);
            Ok(cfg)
        }
    }
}

/// Read `path`. Returns `None` if the file does not exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, TagError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        TagError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
    })?;
    let mut cfg: Config = toml::from_str(&raw)
        .map_err(|e| TagError::InvalidConfig(format!("failed to parse {}: {e}", path.display())))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `TAGSENSE_*` environment overrides to `cfg`. Unparseable values
/// are ignored.
///
/// | Variable | Config field |
/// |---|---|
/// | `TAGSENSE_CAMERA_ID` | `camera_id` |
/// | `TAGSENSE_FEED_PATH` | `feed_path` |
/// | `TAGSENSE_STATUS_DIR` | `status_dir` |
/// | `TAGSENSE_NEAR_THRESHOLD` | `near_threshold` |
/// | `TAGSENSE_BATCH_SIZE` | `batch_size` |
/// | `TAGSENSE_DEBOUNCE_THRESHOLD` | `debounce_threshold` |
/// | `TAGSENSE_MARKER_SIZE` | `marker_size` |
/// | `TAGSENSE_BATCH_RESET` | `batch_reset` (`reset_then_add` or `discard_overflow`) |
/// | `TAGSENSE_IDLE_PAUSE_US` | `idle_pause_us` |
/// | `TAGSENSE_FEED_POLL_MS` | `feed_poll_ms` |
/// | `TAGSENSE_LED_STATUS_PATH` | `led_status_path` |
/// | `TAGSENSE_X_STATUS_PATH` | `x_status_path` |
/// | `TAGSENSE_Z_STATUS_PATH` | `z_status_path` |
/// | `TAGSENSE_MODE_PATH` | `mode_path` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("TAGSENSE_CAMERA_ID")
        && let Ok(id) = v.parse::<u32>()
    {
        cfg.camera_id = id;
    }
    if let Ok(v) = std::env::var("TAGSENSE_FEED_PATH") {
        cfg.feed_path = Some(PathBuf::from(v));
    }
    if let Ok(v) = std::env::var("TAGSENSE_STATUS_DIR") {
        cfg.status_dir = PathBuf::from(v);
    }
    if let Ok(v) = std::env::var("TAGSENSE_NEAR_THRESHOLD")
        && let Ok(m) = v.parse::<f64>()
    {
        cfg.near_threshold = m;
    }
    if let Ok(v) = std::env::var("TAGSENSE_BATCH_SIZE")
        && let Ok(n) = v.parse::<usize>()
    {
        cfg.batch_size = n;
    }
    if let Ok(v) = std::env::var("TAGSENSE_DEBOUNCE_THRESHOLD")
        && let Ok(n) = v.parse::<u32>()
    {
        cfg.debounce_threshold = n;
    }
    if let Ok(v) = std::env::var("TAGSENSE_MARKER_SIZE")
        && let Ok(m) = v.parse::<f64>()
    {
        cfg.marker_size = m;
    }
    if let Ok(v) = std::env::var("TAGSENSE_BATCH_RESET") {
        match v.trim() {
            "reset_then_add" => cfg.batch_reset = BatchResetPolicy::ResetThenAdd,
            "discard_overflow" => cfg.batch_reset = BatchResetPolicy::DiscardOverflow,
            _ => {}
        }
    }
    if let Ok(v) = std::env::var("TAGSENSE_IDLE_PAUSE_US")
        && let Ok(us) = v.parse::<u64>()
    {
        cfg.idle_pause_us = us;
    }
    if let Ok(v) = std::env::var("TAGSENSE_FEED_POLL_MS")
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.feed_poll_ms = ms;
    }
    if let Ok(v) = std::env::var("TAGSENSE_LED_STATUS_PATH") {
        cfg.led_status_path = Some(PathBuf::from(v));
    }
    if let Ok(v) = std::env::var("TAGSENSE_X_STATUS_PATH") {
        cfg.x_status_path = Some(PathBuf::from(v));
    }
    if let Ok(v) = std::env::var("TAGSENSE_Z_STATUS_PATH") {
        cfg.z_status_path = Some(PathBuf::from(v));
    }
    if let Ok(v) = std::env::var("TAGSENSE_MODE_PATH") {
        cfg.mode_path = Some(PathBuf::from(v));
    }
}
