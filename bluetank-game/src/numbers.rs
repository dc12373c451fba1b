//! Numeric helpers centralizing clamping and safe casts.

use chrono::{DateTime, Utc};
use num_traits::cast::cast;

use crate::constants::{LEVEL_MAX, LEVEL_MIN};

/// Clamp a level into `[0, 100]`, mapping NaN to the floor.
#[must_use]
pub fn clamp_level(value: f64) -> f64 {
    if value.is_nan() {
        return LEVEL_MIN;
    }
    value.clamp(LEVEL_MIN, LEVEL_MAX)
}

/// Sanitize an elapsed-minutes input: negative or non-finite spans count as zero.
#[must_use]
pub fn non_negative_minutes(minutes: f64) -> f64 {
    if minutes.is_finite() && minutes > 0.0 {
        minutes
    } else {
        0.0
    }
}

/// Fractional minutes between two instants; negative when `later` precedes `earlier`.
#[must_use]
pub fn minutes_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    let millis = (later - earlier).num_milliseconds();
    cast::<i64, f64>(millis).unwrap_or(0.0) / 60_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn clamp_level_handles_bounds_and_nan() {
        assert!((clamp_level(120.0) - 100.0).abs() < f64::EPSILON);
        assert!(clamp_level(-3.0).abs() < f64::EPSILON);
        assert!(clamp_level(f64::NAN).abs() < f64::EPSILON);
        assert!((clamp_level(42.5) - 42.5).abs() < f64::EPSILON);
    }

    #[test]
    fn minutes_between_is_fractional_and_signed() {
        let start = DateTime::from_timestamp(0, 0).unwrap();
        let later = start + TimeDelta::seconds(90);
        assert!((minutes_between(start, later) - 1.5).abs() < 1e-9);
        assert!((minutes_between(later, start) + 1.5).abs() < 1e-9);
    }

    #[test]
    fn negative_minutes_collapse_to_zero() {
        assert!(non_negative_minutes(-4.0).abs() < f64::EPSILON);
        assert!(non_negative_minutes(f64::INFINITY).abs() < f64::EPSILON);
        assert!((non_negative_minutes(0.25) - 0.25).abs() < f64::EPSILON);
    }
}
