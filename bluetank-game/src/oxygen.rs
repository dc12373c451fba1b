//! Oxygen: tap aeration, background decay, status bands and kingfisher risk.
use serde::{Deserialize, Serialize};

use crate::constants::{
    OXYGEN_DECAY_PER_MINUTE, OXYGEN_OKAY_MIN, OXYGEN_OPTIMAL_MIN, OXYGEN_PER_TAP,
    OXYGEN_RISK_CRITICAL_BELOW, OXYGEN_RISK_CRITICAL_POINTS, OXYGEN_RISK_LOW_BELOW,
    OXYGEN_RISK_LOW_POINTS, OXYGEN_STRESSED_MIN, SPAM_RISK_POINTS,
};
use crate::numbers::{clamp_level, non_negative_minutes};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OxygenStatus {
    Optimal,
    Okay,
    Stressed,
    Critical,
}

/// One player tap.
#[must_use]
pub fn add_oxygen(level: f64) -> f64 {
    clamp_level(level + OXYGEN_PER_TAP)
}

/// Natural loss over `minutes` (fractional allowed).
#[must_use]
pub fn decay(level: f64, minutes: f64) -> f64 {
    clamp_level(level - OXYGEN_DECAY_PER_MINUTE * non_negative_minutes(minutes))
}

#[must_use]
pub fn classify(level: f64) -> OxygenStatus {
    if level >= OXYGEN_OPTIMAL_MIN {
        OxygenStatus::Optimal
    } else if level >= OXYGEN_OKAY_MIN {
        OxygenStatus::Okay
    } else if level >= OXYGEN_STRESSED_MIN {
        OxygenStatus::Stressed
    } else {
        OxygenStatus::Critical
    }
}

/// Risk points shown to the player after a tap. Informational only; the
/// kingfisher computes its own probability from raw tank state.
#[must_use]
pub fn threat_contribution(level: f64, is_spamming: bool) -> u8 {
    let mut risk = 0;
    if level < OXYGEN_RISK_CRITICAL_BELOW {
        risk += OXYGEN_RISK_CRITICAL_POINTS;
    } else if level < OXYGEN_RISK_LOW_BELOW {
        risk += OXYGEN_RISK_LOW_POINTS;
    }
    if is_spamming {
        risk += SPAM_RISK_POINTS;
    }
    risk
}
