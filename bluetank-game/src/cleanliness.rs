//! Cleanliness: dirt from feeding and time, water changes, status bands.
use serde::{Deserialize, Serialize};

use crate::constants::{
    CLEAN_DIRTY_MIN, CLEAN_MIN, CLEAN_OKAY_MIN, CLEAN_VERY_DIRTY_MIN, DIRT_PER_MINUTE, FEED_DIRT,
    LEVEL_MAX, OVERFEED_DIRT, TOXIC_BELOW,
};
use crate::numbers::{clamp_level, non_negative_minutes};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanlinessStatus {
    Clean,
    Okay,
    Dirty,
    VeryDirty,
    Toxic,
}

#[must_use]
pub fn apply_feed_dirt(cleanliness: f64, overfed: bool) -> f64 {
    let dirt = if overfed { OVERFEED_DIRT } else { FEED_DIRT };
    clamp_level(cleanliness - dirt)
}

/// Dirt accrued over `minutes`: one point every 15 seconds.
#[must_use]
pub fn decay(cleanliness: f64, minutes: f64) -> f64 {
    clamp_level(cleanliness - DIRT_PER_MINUTE * non_negative_minutes(minutes))
}

/// A water change always restores a pristine tank.
#[must_use]
pub const fn reset_from_water_change() -> f64 {
    LEVEL_MAX
}

#[must_use]
pub fn classify(cleanliness: f64) -> CleanlinessStatus {
    if cleanliness >= CLEAN_MIN {
        CleanlinessStatus::Clean
    } else if cleanliness >= CLEAN_OKAY_MIN {
        CleanlinessStatus::Okay
    } else if cleanliness >= CLEAN_DIRTY_MIN {
        CleanlinessStatus::Dirty
    } else if cleanliness >= CLEAN_VERY_DIRTY_MIN {
        CleanlinessStatus::VeryDirty
    } else {
        CleanlinessStatus::Toxic
    }
}

/// Toxic water costs fish health during ticks.
#[must_use]
pub fn is_damaging(cleanliness: f64) -> bool {
    cleanliness < TOXIC_BELOW
}
