//! Scripted frame source for running the control loop without a camera.
//!
//! [`SimSource`] replays a fixed script of [`SimStep`]s, one per
//! [`next_frame`][FrameSource::next_frame] call, then reports end of stream.
//!
//! # Example
//!
//! ```rust
//! use tagsense_hal::{FrameSource, SimSource};
//! use tagsense_types::{Detection, TagFamily};
//!
//! let mut src = SimSource::new("sim")
//!     .with_detections(vec![Detection::with_pose(TagFamily::Primary, 0.0, 0.7)])
//!     .with_empty_frames(2);
//!
//! assert_eq!(src.next_frame().unwrap().unwrap().detections.len(), 1);
//! assert!(src.next_frame().unwrap().unwrap().is_empty());
//! ```

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tagsense_types::{Detection, Frame, TagError};

use crate::source::FrameSource;

/// One scripted outcome of a frame acquisition.
#[derive(Debug, Clone)]
pub enum SimStep {
    Frame(Frame),
    /// A single unreadable frame.
    ReadError(String),
    /// A fault that breaks the source.
    Fault(String),
    /// No frame yet; the source is still live.
    Stall,
}

/// A [`FrameSource`] that replays a script. Always succeeds to open.
pub struct SimSource {
    id: String,
    script: VecDeque<SimStep>,
    served: usize,
    released: Arc<AtomicBool>,
}

impl SimSource {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            script: VecDeque::new(),
            served: 0,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Append a frame containing `detections`.
    pub fn with_detections(mut self, detections: Vec<Detection>) -> Self {
        self.script.push_back(SimStep::Frame(Frame::new(detections)));
        self
    }

    /// Append `count` frames with nothing in view.
    pub fn with_empty_frames(mut self, count: usize) -> Self {
        for _ in 0..count {
            self.script.push_back(SimStep::Frame(Frame::default()));
        }
        self
    }

    /// Append an arbitrary step.
    pub fn with_step(mut self, step: SimStep) -> Self {
        self.script.push_back(step);
        self
    }

    /// Shared flag that becomes `true` once [`FrameSource::release`] runs.
    /// Lets a test observe release after the source has been boxed.
    pub fn released_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.released)
    }

    /// Number of script steps consumed so far.
    pub fn served(&self) -> usize {
        self.served
    }
}

impl FrameSource for SimSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, TagError> {
        let Some(step) = self.script.pop_front() else {
            return Ok(None);
        };
        self.served += 1;
        match step {
            SimStep::Frame(frame) => Ok(Some(frame)),
            SimStep::ReadError(details) => Err(TagError::FrameRead {
                source_id: self.id.clone(),
                details,
            }),
            SimStep::Fault(details) => Err(TagError::SourceFault {
                source_id: self.id.clone(),
                details,
            }),
            SimStep::Stall => Ok(None),
        }
    }

    fn is_finished(&self) -> bool {
        self.script.is_empty()
    }

    fn release(&mut self) {
        self.script.clear();
        self.released.store(true, Ordering::SeqCst);
    }
}
