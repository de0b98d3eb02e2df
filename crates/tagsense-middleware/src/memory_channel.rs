//! In-process channels that keep a log of every write.
//!
//! Clones share the same storage, so a test can hand one clone to the
//! control loop and inspect another afterwards.

use std::sync::{Arc, Mutex, MutexGuard};

use tagsense_types::TagError;

use crate::channel::{ModeSource, StatusChannel, StatusSink};

#[derive(Debug, Default)]
struct Inner {
    writes: Vec<(StatusChannel, String)>,
    mode: Option<String>,
    fail_writes: bool,
}

/// Shared in-memory [`StatusSink`] and [`ModeSource`].
#[derive(Debug, Clone, Default)]
pub struct MemoryChannels {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryChannels {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means a test thread panicked mid-write.
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Set the value returned by [`ModeSource::read_mode`]. `None` makes
    /// reads fail.
    pub fn set_mode(&self, mode: Option<&str>) {
        self.lock().mode = mode.map(str::to_string);
    }

    /// Make every subsequent write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Every successful write, oldest first.
    pub fn writes(&self) -> Vec<(StatusChannel, String)> {
        self.lock().writes.clone()
    }

    /// Values written to `channel`, oldest first.
    pub fn values(&self, channel: StatusChannel) -> Vec<String> {
        self.lock()
            .writes
            .iter()
            .filter(|(c, _)| *c == channel)
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// Most recent value written to `channel`.
    pub fn latest(&self, channel: StatusChannel) -> Option<String> {
        self.values(channel).pop()
    }
}

impl StatusSink for MemoryChannels {
    fn write(&mut self, channel: StatusChannel, value: &str) -> Result<(), TagError> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(TagError::Channel {
                channel: channel.key().to_string(),
                details: "simulated write failure".to_string(),
            });
        }
        inner.writes.push((channel, value.to_string()));
        Ok(())
    }
}

impl ModeSource for MemoryChannels {
    fn read_mode(&mut self) -> Result<String, TagError> {
        self.lock()
            .mode
            .as_deref()
            .map(|m| m.trim().to_string())
            .ok_or_else(|| TagError::Channel {
                channel: "robot_mode".to_string(),
                details: "mode not set".to_string(),
            })
    }
}
