//! Channel identities and the capabilities every adapter implements.

use std::fmt;

use tagsense_types::TagError;

/// Outbound status channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusChannel {
    /// Proximity indicator, `"ON"` or `"OFF"`.
    Actuator,
    /// Lateral batch average.
    Lateral,
    /// Forward batch average or entry/exit sentinel.
    Forward,
}

impl StatusChannel {
    pub const ALL: [StatusChannel; 3] = [
        StatusChannel::Actuator,
        StatusChannel::Lateral,
        StatusChannel::Forward,
    ];

    /// Stable key used in logs and by key-value adapters.
    pub fn key(self) -> &'static str {
        match self {
            StatusChannel::Actuator => "led_status",
            StatusChannel::Lateral => "x_status",
            StatusChannel::Forward => "z_status",
        }
    }
}

impl fmt::Display for StatusChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Write-only destination for status values.
pub trait StatusSink {
    /// Replace the current value of `channel` with `value`.
    ///
    /// # Errors
    ///
    /// Returns [`TagError::Channel`] if the value could not be stored.
    fn write(&mut self, channel: StatusChannel, value: &str) -> Result<(), TagError>;
}

/// Read-only view of the externally controlled operating mode.
pub trait ModeSource {
    /// Return the raw mode string, trimmed of surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`TagError::Channel`] if the mode could not be read.
    fn read_mode(&mut self) -> Result<String, TagError>;
}
