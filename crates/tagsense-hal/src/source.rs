//! Generic `FrameSource` trait for the perception collaborator.

use tagsense_types::{Frame, TagError};

/// A producer of per-frame marker detections.
///
/// Implementations wrap whatever captures images and solves marker poses.
/// The control loop calls [`next_frame`][FrameSource::next_frame] once per
/// iteration; it is the only blocking call in the loop.
pub trait FrameSource {
    /// Stable identifier for this source, e.g. `"camera8"`.
    fn id(&self) -> &str;

    /// Block until the next frame is available.
    ///
    /// Returns `Ok(None)` when no frame could be taken. Whether that is the
    /// end of the source is answered by [`is_finished`][FrameSource::is_finished].
    ///
    /// # Errors
    ///
    /// Returns [`TagError::FrameRead`] when a single frame is unreadable
    /// (the caller skips it) and [`TagError::SourceFault`] when the source
    /// itself is broken.
    fn next_frame(&mut self) -> Result<Option<Frame>, TagError>;

    /// `true` once `Ok(None)` from [`next_frame`][FrameSource::next_frame]
    /// means no frame will ever follow. Sources that can run dry for a while
    /// and then resume (a followed file) return `false` until released.
    fn is_finished(&self) -> bool {
        true
    }

    /// Release the underlying capture resource.
    ///
    /// Must be safe to call more than once.
    fn release(&mut self);
}
