//! `tagsense-runtime` – The control loop engine
//!
//! # Modules
//!
//! - [`control_loop`] – [`ControlLoop`][control_loop::ControlLoop]: pulls one
//!   frame per tick, drives the debouncer, aggregator and classifier, and
//!   owns the single idempotent shutdown routine.
//! - [`publisher`] – [`StatusPublisher`][publisher::StatusPublisher]:
//!   best-effort status output that logs and swallows write failures.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: installs the
//!   global `tracing` subscriber with an optional OTLP span exporter.

pub mod control_loop;
pub mod publisher;
pub mod telemetry;

pub use control_loop::{ControlLoop, ControlLoopConfig, LoopState, StopReason, TickOutcome};
pub use publisher::StatusPublisher;
pub use telemetry::{LogFormat, TracerProviderGuard, init_tracing};
