//! [`ControlLoop`] – the perception-to-actuation orchestrator.
//!
//! Each [`tick`][ControlLoop::tick]:
//!
//! 1. **Acquire** – pull one [`Frame`] from the [`FrameSource`]. A live
//!    source with nothing new makes the tick [`TickOutcome::Idle`].
//! 2. **Debounce** – feed "any marker of either family closer than the near
//!    threshold" to the [`ProximityDebouncer`]; publish `ON`/`OFF` when the
//!    indicator flips.
//! 3. **Aggregate** – for every posed primary detection (only while the mode
//!    is `ENTRY` or `EXIT`), then every posed secondary detection, add the
//!    pose to the shared [`SampleAggregator`].
//! 4. **Classify & publish** – whenever a batch completes, publish the
//!    lateral average and the forward [`classify`] token.
//!
//! # Shutdown
//!
//! [`run`][ControlLoop::run] checks the shutdown flag before every frame
//! acquisition. Any exit path (signal, end of feed, unrecoverable error)
//! ends in [`shutdown`][ControlLoop::shutdown], which releases the source
//! and forces the indicator off exactly once. Dropping the loop, including
//! during a panic unwind, runs the same routine.
//!
//! # Example
//!
//! ```rust
//! use std::sync::atomic::AtomicBool;
//! use tagsense_hal::SimSource;
//! use tagsense_middleware::{MemoryChannels, StatusChannel};
//! use tagsense_runtime::control_loop::{ControlLoop, ControlLoopConfig, StopReason};
//!
//! let channels = MemoryChannels::new();
//! let source = SimSource::new("sim").with_empty_frames(10);
//! let mut control = ControlLoop::new(
//!     ControlLoopConfig::default(),
//!     Box::new(source),
//!     Box::new(channels.clone()),
//!     Box::new(channels.clone()),
//! );
//!
//! let reason = control.run(&AtomicBool::new(false));
//! assert_eq!(reason, StopReason::EndOfFeed);
//! assert_eq!(channels.values(StatusChannel::Actuator), vec!["OFF", "OFF"]);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tagsense_hal::FrameSource;
use tagsense_middleware::{ModeSource, StatusChannel, StatusSink};
use tagsense_perception::{
    BatchResetPolicy, ProximityDebouncer, SampleAggregator, classify, is_gated_out,
};
use tagsense_perception::aggregator::DEFAULT_BATCH_SIZE;
use tagsense_perception::debounce::{DEFAULT_DEBOUNCE_THRESHOLD, DEFAULT_NEAR_THRESHOLD_M};
use tagsense_types::{
    ActuatorTransition, Detection, Frame, OperatingMode, PoseTranslation, ProximityState,
    StatusToken, TagError, TagFamily,
};
use tracing::{debug, error, info, warn};

use crate::publisher::StatusPublisher;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Tuning for [`ControlLoop`].
#[derive(Debug, Clone, PartialEq)]
pub struct ControlLoopConfig {
    /// Forward distance (meters) below which a marker counts as close.
    pub near_threshold_m: f64,
    /// Samples per published average.
    pub batch_size: usize,
    pub batch_reset: BatchResetPolicy,
    /// Consecutive frames required to flip the indicator.
    pub debounce_threshold: u32,
    /// Pause between iterations. Zero disables it.
    pub idle_pause: Duration,
    /// Wait before asking again when a live source has no frame yet.
    pub feed_poll: Duration,
}

impl Default for ControlLoopConfig {
    fn default() -> Self {
        Self {
            near_threshold_m: DEFAULT_NEAR_THRESHOLD_M,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_reset: BatchResetPolicy::default(),
            debounce_threshold: DEFAULT_DEBOUNCE_THRESHOLD,
            idle_pause: Duration::ZERO,
            feed_poll: Duration::from_millis(10),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Outcomes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    ShuttingDown,
}

/// Result of a single [`ControlLoop::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The frame had at least one detection and was fully processed.
    Processed,
    /// Nothing was in view; only the debouncer ran.
    Empty,
    /// The source is live but had no new frame; nothing ran.
    Idle,
    /// The source has no more frames.
    EndOfFeed,
}

/// Why [`ControlLoop::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Signal,
    EndOfFeed,
    Fault,
}

// ─────────────────────────────────────────────────────────────────────────────
// ControlLoop
// ─────────────────────────────────────────────────────────────────────────────

/// Owns every piece of mutable state in the pipeline and drives it one frame
/// at a time.
pub struct ControlLoop {
    config: ControlLoopConfig,
    source: Box<dyn FrameSource>,
    mode: Box<dyn ModeSource>,
    publisher: StatusPublisher,
    aggregator: SampleAggregator,
    debouncer: ProximityDebouncer,
    state: LoopState,
    frames: u64,
}

impl ControlLoop {
    /// Assemble the loop and force the indicator off.
    pub fn new(
        config: ControlLoopConfig,
        source: Box<dyn FrameSource>,
        mode: Box<dyn ModeSource>,
        sink: Box<dyn StatusSink>,
    ) -> Self {
        let aggregator = SampleAggregator::with_policy(config.batch_size, config.batch_reset);
        let debouncer = ProximityDebouncer::new(config.debounce_threshold);
        let mut publisher = StatusPublisher::new(sink);
        publisher.publish_actuator(ProximityState::Far);
        info!(source = source.id(), "detection started");

        Self {
            config,
            source,
            mode,
            publisher,
            aggregator,
            debouncer,
            state: LoopState::Running,
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Debounced indicator state.
    pub fn proximity(&self) -> ProximityState {
        self.debouncer.state()
    }

    /// Frames acquired so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Status writes that have failed so far.
    pub fn publish_failures(&self) -> u64 {
        self.publisher.failures()
    }

    /// Run one acquisition and processing cycle.
    ///
    /// # Errors
    ///
    /// Propagates the source's [`TagError`]. Transient errors
    /// ([`TagError::is_transient`]) leave every piece of state untouched.
    pub fn tick(&mut self) -> Result<TickOutcome, TagError> {
        if self.state == LoopState::ShuttingDown {
            return Ok(TickOutcome::EndOfFeed);
        }

        let Some(frame) = self.source.next_frame()? else {
            if self.source.is_finished() {
                return Ok(TickOutcome::EndOfFeed);
            }
            return Ok(TickOutcome::Idle);
        };
        self.frames += 1;

        let any_close = self.any_close(&frame);
        if let Some(transition) = self.debouncer.update(any_close) {
            self.apply_transition(transition);
        }

        if frame.is_empty() {
            return Ok(TickOutcome::Empty);
        }
        debug!(
            frame = self.frames,
            detections = frame.detections.len(),
            any_close,
            "frame acquired"
        );

        let mode = self.read_mode();
        for family in [TagFamily::Primary, TagFamily::Secondary] {
            if is_gated_out(family, mode) {
                continue;
            }
            for pose in frame.posed(family).filter_map(|d| d.pose) {
                self.ingest(family, mode, pose);
            }
        }

        Ok(TickOutcome::Processed)
    }

    /// Tick until `shutdown` is set, the feed ends, or a non-transient error
    /// occurs, then shut down.
    pub fn run(&mut self, shutdown: &AtomicBool) -> StopReason {
        let reason = loop {
            if shutdown.load(Ordering::SeqCst) {
                info!("termination requested");
                break StopReason::Signal;
            }

            match self.tick() {
                Ok(TickOutcome::EndOfFeed) => {
                    info!("detection feed ended");
                    break StopReason::EndOfFeed;
                }
                Ok(TickOutcome::Idle) => {
                    thread::sleep(self.config.feed_poll);
                    continue;
                }
                Ok(_) => {}
                Err(e) if e.is_transient() => {
                    warn!(error = %e, "failed to grab frame; skipping");
                }
                Err(e) => {
                    error!(error = %e, "unexpected error in control loop");
                    break StopReason::Fault;
                }
            }

            if !self.config.idle_pause.is_zero() {
                thread::sleep(self.config.idle_pause);
            }
        };

        self.shutdown();
        reason
    }

    /// Release the frame source and force the indicator off.
    ///
    /// Only the first call has any effect.
    pub fn shutdown(&mut self) {
        if self.state == LoopState::ShuttingDown {
            return;
        }
        self.state = LoopState::ShuttingDown;
        self.source.release();
        self.debouncer.reset();
        self.publisher.publish_actuator(ProximityState::Far);
        info!(frames = self.frames, "detection stopped; indicator off");
    }

    // ── internals ─────────────────────────────────────────────────────────

    fn any_close(&self, frame: &Frame) -> bool {
        frame
            .detections
            .iter()
            .filter_map(Detection::forward_distance)
            .any(|z| z < self.config.near_threshold_m)
    }

    fn apply_transition(&mut self, transition: ActuatorTransition) {
        self.publisher.publish_actuator(transition.target());
        match transition {
            ActuatorTransition::TurnOn => info!("indicator ON (elevator entered)"),
            ActuatorTransition::TurnOff => info!("indicator OFF (elevator exited)"),
        }
    }

    fn read_mode(&mut self) -> OperatingMode {
        match self.mode.read_mode() {
            Ok(raw) => OperatingMode::parse(&raw),
            Err(e) => {
                warn!(error = %e, "operating mode unavailable; treating as unset");
                OperatingMode::Unknown
            }
        }
    }

    fn ingest(&mut self, family: TagFamily, mode: OperatingMode, pose: PoseTranslation) {
        let Some(avg) = self.aggregator.accumulate(pose.x, pose.z) else {
            return;
        };

        self.publisher
            .publish_token(StatusChannel::Lateral, StatusToken::Numeric(avg.x));
        if let Some(token) = classify(family, mode, &avg) {
            info!(?family, %mode, x = avg.x, z = avg.z, %token, "batch classified");
            self.publisher.publish_token(StatusChannel::Forward, token);
        }
    }
}

impl Drop for ControlLoop {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
