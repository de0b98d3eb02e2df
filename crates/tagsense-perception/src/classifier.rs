//! Mode-aware entry/exit classification of batch averages.
//!
//! | Family    | Mode    | Condition (meters) | Token                 |
//! |-----------|---------|--------------------|-----------------------|
//! | primary   | ENTRY   | `z ≥ 0.50`         | `Numeric(z_cm − 50)`  |
//! | primary   | ENTRY   | `z < 0.50`         | `entered1`            |
//! | primary   | EXIT    | `z < 1.00`         | `Numeric(z_cm)`       |
//! | primary   | EXIT    | `z ≥ 1.00`         | `exited`              |
//! | primary   | unknown | –                  | none                  |
//! | secondary | any     | `z ≥ 0.50`         | `Numeric(z_cm)`       |
//! | secondary | any     | `z < 0.50`         | `entered2`            |
//!
//! Thresholds are compared against the unscaled forward mean; the published
//! number is the scaled, truncated average.

use tagsense_types::{OperatingMode, StatusToken, TagFamily};

use crate::aggregator::BatchAverage;

/// Forward distance below which a marker counts as entered.
pub const ENTRY_THRESHOLD_M: f64 = 0.50;

/// Forward distance at or beyond which a primary marker counts as exited.
pub const EXIT_THRESHOLD_M: f64 = 1.00;

/// Offset subtracted from the scaled average while entering, so that the
/// published number reads zero at the entry threshold.
pub const ENTRY_OFFSET_CM: f64 = 50.0;

/// `true` when detections of `family` must not be aggregated under `mode`.
pub fn is_gated_out(family: TagFamily, mode: OperatingMode) -> bool {
    family == TagFamily::Primary && mode == OperatingMode::Unknown
}

/// Decide which token to publish for a freshly completed batch.
///
/// Returns `None` for primary markers when no mode is set.
pub fn classify(
    family: TagFamily,
    mode: OperatingMode,
    avg: &BatchAverage,
) -> Option<StatusToken> {
    let z_m = avg.mean_z_m;
    let token = match (family, mode) {
        (TagFamily::Primary, OperatingMode::Entry) => {
            if z_m >= ENTRY_THRESHOLD_M {
                StatusToken::Numeric(avg.z - ENTRY_OFFSET_CM)
            } else {
                StatusToken::Entered1
            }
        }
        (TagFamily::Primary, OperatingMode::Exit) => {
            if z_m < EXIT_THRESHOLD_M {
                StatusToken::Numeric(avg.z)
            } else {
                StatusToken::Exited
            }
        }
        (TagFamily::Primary, OperatingMode::Unknown) => return None,
        (TagFamily::Secondary, _) => {
            if z_m >= ENTRY_THRESHOLD_M {
                StatusToken::Numeric(avg.z)
            } else {
                StatusToken::Entered2
            }
        }
    };
    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::scale_truncate;

    fn avg(z_m: f64) -> BatchAverage {
        BatchAverage {
            x: 0.0,
            z: scale_truncate(z_m),
            mean_x_m: 0.0,
            mean_z_m: z_m,
        }
    }

    #[test]
    fn entry_far_publishes_offset_distance() {
        let token = classify(TagFamily::Primary, OperatingMode::Entry, &avg(0.60));
        assert_eq!(token, Some(StatusToken::Numeric(10.0)));
    }

    #[test]
    fn entry_near_publishes_entered1() {
        let token = classify(TagFamily::Primary, OperatingMode::Entry, &avg(0.30));
        assert_eq!(token, Some(StatusToken::Entered1));
    }

    #[test]
    fn entry_threshold_is_inclusive() {
        let token = classify(TagFamily::Primary, OperatingMode::Entry, &avg(0.50));
        assert_eq!(token, Some(StatusToken::Numeric(0.0)));
    }

    #[test]
    fn exit_near_publishes_distance() {
        let token = classify(TagFamily::Primary, OperatingMode::Exit, &avg(0.80));
        assert_eq!(token, Some(StatusToken::Numeric(80.0)));
    }

    #[test]
    fn exit_far_publishes_exited() {
        let token = classify(TagFamily::Primary, OperatingMode::Exit, &avg(1.20));
        assert_eq!(token, Some(StatusToken::Exited));
        let at_threshold = classify(TagFamily::Primary, OperatingMode::Exit, &avg(1.00));
        assert_eq!(at_threshold, Some(StatusToken::Exited));
    }

    #[test]
    fn primary_without_mode_is_skipped() {
        assert!(is_gated_out(TagFamily::Primary, OperatingMode::Unknown));
        let token = classify(TagFamily::Primary, OperatingMode::Unknown, &avg(0.3));
        assert_eq!(token, None);
    }

    #[test]
    fn secondary_ignores_mode() {
        for mode in [
            OperatingMode::Entry,
            OperatingMode::Exit,
            OperatingMode::Unknown,
        ] {
            assert!(!is_gated_out(TagFamily::Secondary, mode));
            assert_eq!(
                classify(TagFamily::Secondary, mode, &avg(0.80)),
                Some(StatusToken::Numeric(80.0))
            );
            assert_eq!(
                classify(TagFamily::Secondary, mode, &avg(0.45)),
                Some(StatusToken::Entered2)
            );
        }
    }
}
