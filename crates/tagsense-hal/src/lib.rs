//! `tagsense-hal` – Frame acquisition.
//!
//! The control loop never talks to a camera or a marker detector directly.
//! It pulls one [`Frame`][tagsense_types::Frame] of detections at a time from
//! a [`FrameSource`][source::FrameSource].
//!
//! # Modules
//!
//! - [`source`] – the [`FrameSource`][source::FrameSource] trait.
//! - [`feed`] – [`JsonLinesFeed`][feed::JsonLinesFeed]: reads one JSON frame
//!   per line from the detector process, either a FIFO or a regular file
//!   followed as the detector appends to it.
//! - [`sim`] – [`SimSource`][sim::SimSource]: scripted frames for headless
//!   tests.

pub mod feed;
pub mod sim;
pub mod source;

pub use feed::{FeedMode, JsonLinesFeed};
pub use sim::{SimSource, SimStep};
pub use source::FrameSource;
