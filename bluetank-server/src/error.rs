//! Errors surfaced to callers of player actions.
use bluetank_game::FishError;
use thiserror::Error;

use crate::store::StoreError;

/// Outcome categories every action maps its failures onto.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The record is missing or belongs to another owner.
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    InvalidState(String),
    /// Storage failed; details are logged, never returned.
    #[error("internal error")]
    Internal,
}

impl From<FishError> for ServiceError {
    fn from(err: FishError) -> Self {
        Self::InvalidState(err.to_string())
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InsufficientFunds { .. } | StoreError::TankExists(_) => {
                Self::InvalidState(err.to_string())
            }
            StoreError::Conflict { .. } | StoreError::Missing(_) | StoreError::Unavailable(_) => {
                log::warn!("storage failure: {err}");
                Self::Internal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bluetank_game::{FishId, OwnerId};

    #[test]
    fn storage_details_stay_internal() {
        let err = ServiceError::from(StoreError::Unavailable("disk on fire".into()));
        assert_eq!(err, ServiceError::Internal);
        assert_eq!(err.to_string(), "internal error");
    }

    #[test]
    fn player_mistakes_are_invalid_state() {
        let funds = ServiceError::from(StoreError::InsufficientFunds {
            needed: 20,
            available: 5,
        });
        assert!(matches!(funds, ServiceError::InvalidState(_)));
        let exists = ServiceError::from(StoreError::TankExists(OwnerId::from("ana")));
        assert!(matches!(exists, ServiceError::InvalidState(_)));
        let gone = ServiceError::from(FishError::Gone(FishId(3)));
        assert_eq!(
            gone,
            ServiceError::InvalidState("fish fish-3 is no longer in the tank".into())
        );
    }
}
