//! `tagsense-middleware` – Status channels
//!
//! The control loop never writes files directly. It talks to a
//! [`StatusSink`] for outbound status and a [`ModeSource`] for the operating
//! mode; adapters decide where the values actually live.
//!
//! # Modules
//!
//! - [`channel`] – [`StatusChannel`], the [`StatusSink`] and [`ModeSource`]
//!   traits.
//! - [`file_channel`] – [`FileChannels`]: one small file per channel,
//!   overwritten on every write.
//! - [`memory_channel`] – [`MemoryChannels`]: in-process channels that record
//!   every write, for tests and simulation.

pub mod channel;
pub mod file_channel;
pub mod memory_channel;

pub use channel::{ModeSource, StatusChannel, StatusSink};
pub use file_channel::{ChannelPaths, FileChannels};
pub use memory_channel::MemoryChannels;
