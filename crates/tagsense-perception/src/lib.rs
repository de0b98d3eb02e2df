//! `tagsense-perception` – Signal conditioning.
//!
//! Turns the noisy, intermittent stream of per-frame marker distances into
//! stable values worth publishing.
//!
//! # Modules
//!
//! - [`aggregator`] – [`SampleAggregator`][aggregator::SampleAggregator]:
//!   fixed-size batches of pose samples, averaged and truncated to one
//!   decimal place.
//! - [`classifier`] – [`classify`][classifier::classify]: maps a batch
//!   average to an entry/exit [`StatusToken`][tagsense_types::StatusToken]
//!   according to the marker family and operating mode.
//! - [`debounce`] – [`ProximityDebouncer`][debounce::ProximityDebouncer]:
//!   consecutive-count hysteresis for the proximity indicator.

pub mod aggregator;
pub mod classifier;
pub mod debounce;

pub use aggregator::{BatchAverage, BatchResetPolicy, DEFAULT_BATCH_SIZE, SampleAggregator};
pub use classifier::{ENTRY_THRESHOLD_M, EXIT_THRESHOLD_M, classify, is_gated_out};
pub use debounce::{DEFAULT_DEBOUNCE_THRESHOLD, DEFAULT_NEAR_THRESHOLD_M, ProximityDebouncer};
