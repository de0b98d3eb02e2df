use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which marker dictionary produced a detection.
///
/// The primary family is gated by the operating mode; the secondary family
/// is classified the same way regardless of mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagFamily {
    Primary,
    Secondary,
}

/// Marker position relative to the camera, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseTranslation {
    /// Lateral offset.
    pub x: f64,
    /// Vertical offset.
    #[serde(default)]
    pub y: f64,
    /// Forward distance.
    pub z: f64,
}

/// One marker seen in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub family: TagFamily,
    /// Decoded marker identity, when the detector reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_id: Option<u32>,
    /// `None` when the detector could not solve a reliable pose.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose: Option<PoseTranslation>,
}

impl Detection {
    /// Build a detection with a solved pose.
    pub fn with_pose(family: TagFamily, x: f64, z: f64) -> Self {
        Self {
            family,
            tag_id: None,
            pose: Some(PoseTranslation { x, y: 0.0, z }),
        }
    }

    /// Build a detection the detector could not solve a pose for.
    pub fn without_pose(family: TagFamily) -> Self {
        Self {
            family,
            tag_id: None,
            pose: None,
        }
    }

    /// Forward distance in meters, if a pose is available.
    pub fn forward_distance(&self) -> Option<f64> {
        self.pose.map(|p| p.z)
    }
}

/// Every detection reported for a single captured frame, in detector order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub detections: Vec<Detection>,
}

impl Frame {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    /// Detections of `family` that carry a pose, in detector order.
    pub fn posed(&self, family: TagFamily) -> impl Iterator<Item = &Detection> {
        self.detections
            .iter()
            .filter(move |d| d.family == family && d.pose.is_some())
    }
}

/// Externally controlled context deciding which classification applies to
/// primary-family markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatingMode {
    Entry,
    Exit,
    /// Anything other than `ENTRY`/`EXIT`, including a failed read.
    Unknown,
}

impl OperatingMode {
    /// Interpret the raw contents of the mode channel.
    ///
    /// Surrounding whitespace is ignored; matching is case-sensitive.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "ENTRY" => OperatingMode::Entry,
            "EXIT" => OperatingMode::Exit,
            _ => OperatingMode::Unknown,
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatingMode::Entry => write!(f, "ENTRY"),
            OperatingMode::Exit => write!(f, "EXIT"),
            OperatingMode::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Value published on the lateral and forward status channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatusToken {
    /// Scaled distance estimate, written with one decimal place.
    Numeric(f64),
    /// Primary marker closer than the entry threshold.
    Entered1,
    /// Secondary marker closer than the entry threshold.
    Entered2,
    /// Primary marker beyond the exit threshold.
    Exited,
}

impl fmt::Display for StatusToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusToken::Numeric(v) => write!(f, "{v:.1}"),
            StatusToken::Entered1 => write!(f, "entered1"),
            StatusToken::Entered2 => write!(f, "entered2"),
            StatusToken::Exited => write!(f, "exited"),
        }
    }
}

/// Debounced state of the proximity indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProximityState {
    Close,
    #[default]
    Far,
}

impl ProximityState {
    /// Literal written to the actuator-status channel.
    pub fn as_status(self) -> &'static str {
        match self {
            ProximityState::Close => "ON",
            ProximityState::Far => "OFF",
        }
    }
}

/// A flip of the debounced proximity indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorTransition {
    TurnOn,
    TurnOff,
}

impl ActuatorTransition {
    /// State the indicator is in after this transition.
    pub fn target(self) -> ProximityState {
        match self {
            ActuatorTransition::TurnOn => ProximityState::Close,
            ActuatorTransition::TurnOff => ProximityState::Far,
        }
    }
}

/// Error type shared by every TagSense crate.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TagError {
    /// A single frame could not be read or decoded. The loop skips it.
    #[error("Frame read failed on {source_id}: {details}")]
    FrameRead { source_id: String, details: String },

    /// The frame source broke in a way later frames cannot recover from.
    #[error("Frame source fault on {source_id}: {details}")]
    SourceFault { source_id: String, details: String },

    /// The frame source could not be opened at startup.
    #[error("Frame source {source_id} unavailable: {details}")]
    SourceUnavailable { source_id: String, details: String },

    #[error("Channel {channel} I/O error: {details}")]
    Channel { channel: String, details: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TagError {
    /// `true` for errors the control loop skips rather than shuts down on.
    pub fn is_transient(&self) -> bool {
        matches!(self, TagError::FrameRead { .. } | TagError::Channel { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parse_trims_and_matches_exactly() {
        assert_eq!(OperatingMode::parse("ENTRY\n"), OperatingMode::Entry);
        assert_eq!(OperatingMode::parse("  EXIT "), OperatingMode::Exit);
        assert_eq!(OperatingMode::parse("entry"), OperatingMode::Unknown);
        assert_eq!(OperatingMode::parse(""), OperatingMode::Unknown);
        assert_eq!(OperatingMode::parse("IDLE"), OperatingMode::Unknown);
    }

    #[test]
    fn status_token_display() {
        assert_eq!(StatusToken::Numeric(10.0).to_string(), "10.0");
        assert_eq!(StatusToken::Numeric(-12.3).to_string(), "-12.3");
        // Float noise from the offset subtraction is not published.
        assert_eq!(StatusToken::Numeric(60.3 - 50.0).to_string(), "10.3");
        assert_eq!(StatusToken::Entered1.to_string(), "entered1");
        assert_eq!(StatusToken::Entered2.to_string(), "entered2");
        assert_eq!(StatusToken::Exited.to_string(), "exited");
    }

    #[test]
    fn proximity_state_defaults_to_far() {
        assert_eq!(ProximityState::default(), ProximityState::Far);
        assert_eq!(ProximityState::Far.as_status(), "OFF");
        assert_eq!(ProximityState::Close.as_status(), "ON");
        assert_eq!(ActuatorTransition::TurnOn.target(), ProximityState::Close);
    }

    #[test]
    fn detection_deserializes_from_feed_json() {
        let json = r#"{"detections":[
            {"family":"primary","tag_id":3,"pose":{"x":0.1,"y":0.0,"z":0.75}},
            {"family":"secondary"}
        ]}"#;
        let frame: Frame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.detections.len(), 2);
        assert_eq!(frame.detections[0].family, TagFamily::Primary);
        assert_eq!(frame.detections[0].tag_id, Some(3));
        assert_eq!(frame.detections[0].forward_distance(), Some(0.75));
        assert_eq!(frame.detections[1].family, TagFamily::Secondary);
        assert!(frame.detections[1].pose.is_none());
    }

    #[test]
    fn frame_posed_filters_family_and_pose() {
        let frame = Frame::new(vec![
            Detection::with_pose(TagFamily::Secondary, 0.0, 1.0),
            Detection::without_pose(TagFamily::Primary),
            Detection::with_pose(TagFamily::Primary, 0.2, 0.4),
        ]);
        let primary: Vec<_> = frame.posed(TagFamily::Primary).collect();
        assert_eq!(primary.len(), 1);
        assert_eq!(primary[0].forward_distance(), Some(0.4));
        assert_eq!(frame.posed(TagFamily::Secondary).count(), 1);
        assert!(Frame::default().is_empty());
    }

    #[test]
    fn tag_error_display_and_transience() {
        let err = TagError::FrameRead {
            source_id: "camera8".to_string(),
            details: "bad json".to_string(),
        };
        assert!(err.to_string().contains("camera8"));
        assert!(err.is_transient());

        let fatal = TagError::SourceFault {
            source_id: "camera8".to_string(),
            details: "broken pipe".to_string(),
        };
        assert!(!fatal.is_transient());
        assert!(TagError::InvalidConfig("batch_size".into())
            .to_string()
            .contains("Invalid configuration"));
    }
}
