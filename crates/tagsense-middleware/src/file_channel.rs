//! [`FileChannels`] – one file per channel.
//!
//! Each write stores the bare value with no trailing newline, so readers can
//! `cat` the file and compare directly. The value goes to a temporary file in
//! the same directory which is then renamed over the channel file: a reader
//! sees the old value or the new one, never an empty file. The mode file is
//! read and trimmed on every call.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tagsense_types::TagError;
use tempfile::NamedTempFile;
use tracing::trace;

use crate::channel::{ModeSource, StatusChannel, StatusSink};

/// Filesystem location of every channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPaths {
    pub actuator: PathBuf,
    pub lateral: PathBuf,
    pub forward: PathBuf,
    pub mode: PathBuf,
}

impl ChannelPaths {
    /// Conventional file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            actuator: dir.join("led_status.txt"),
            lateral: dir.join("x_status"),
            forward: dir.join("z_status"),
            mode: dir.join("robot_mode"),
        }
    }

    fn status_path(&self, channel: StatusChannel) -> &Path {
        match channel {
            StatusChannel::Actuator => &self.actuator,
            StatusChannel::Lateral => &self.lateral,
            StatusChannel::Forward => &self.forward,
        }
    }
}

/// File-backed [`StatusSink`] and [`ModeSource`].
#[derive(Debug, Clone)]
pub struct FileChannels {
    paths: ChannelPaths,
}

impl FileChannels {
    pub fn new(paths: ChannelPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ChannelPaths {
        &self.paths
    }
}

impl StatusSink for FileChannels {
    fn write(&mut self, channel: StatusChannel, value: &str) -> Result<(), TagError> {
        let path = self.paths.status_path(channel);
        replace_contents(path, value).map_err(|e| TagError::Channel {
            channel: channel.key().to_string(),
            details: format!("write {}: {e}", path.display()),
        })?;
        trace!(channel = %channel, value, "status written");
        Ok(())
    }
}

/// Write `value` to a sibling temp file and rename it onto `path`.
fn replace_contents(path: &Path, value: &str) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(value.as_bytes())?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl ModeSource for FileChannels {
    fn read_mode(&mut self) -> Result<String, TagError> {
        let path = &self.paths.mode;
        fs::read_to_string(path)
            .map(|raw| raw.trim().to_string())
            .map_err(|e| TagError::Channel {
                channel: "robot_mode".to_string(),
                details: format!("read {}: {e}", path.display()),
            })
    }
}
