//! Domain errors raised by eligibility checks. Formula functions never fail.
use thiserror::Error;

use crate::state::{FishId, GrowthStage};

/// A player action that the current fish or threat state does not allow.
#[derive(Debug, Error, PartialEq)]
pub enum FishError {
    #[error("fish {0} is no longer in the tank")]
    Gone(FishId),
    #[error("fish is still a {stage} - wait for it to grow")]
    NotAdult { stage: GrowthStage },
    #[error("fish was fed recently; next feed allowed in {remaining_minutes:.1} minutes")]
    FeedCooldown { remaining_minutes: f64 },
    #[error("no kingfisher attack is pending for this tank")]
    NoAttackPending,
}

/// A lookup key outside its closed enumeration.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct UnknownKey {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownKey {
    #[must_use]
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}
