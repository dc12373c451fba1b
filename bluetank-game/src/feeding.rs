//! Feeding eligibility, hunger and overfeed penalties.
//!
//! Feeding is always allowed under the default [`CooldownPolicy::Permissive`]:
//! a second feed inside five minutes is merely classified as overfeeding.
//! The documented 30-minute cooldown only blocks feeds when a deployment
//! opts into [`CooldownPolicy::Enforced`].
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    FEED_COOLDOWN_MINUTES, HUNGER_FULL_MIN, HUNGER_HUNGRY_MIN, HUNGER_OKAY_MIN, HUNGER_PER_FEED,
    OVERFEED_HEALTH_PENALTY, OVERFEED_WINDOW_MINUTES,
};
use crate::error::FishError;
use crate::numbers::{clamp_level, minutes_between};
use crate::state::Fish;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CooldownPolicy {
    #[default]
    Permissive,
    Enforced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HungerStatus {
    Full,
    Okay,
    Hungry,
    Starving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedEligibility {
    pub allowed: bool,
    pub overfed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedResult {
    pub new_hunger: f64,
    pub new_health: f64,
    pub overfed: bool,
}

/// Observed behavior: always allowed, overfed inside the five-minute window.
#[must_use]
pub fn evaluate(last_fed: Option<DateTime<Utc>>, now: DateTime<Utc>) -> FeedEligibility {
    let overfed = last_fed.is_some_and(|fed| minutes_between(fed, now) < OVERFEED_WINDOW_MINUTES);
    FeedEligibility {
        allowed: true,
        overfed,
    }
}

/// Cooldown gate; a no-op unless the policy is enforced.
///
/// # Errors
///
/// Returns [`FishError::FeedCooldown`] when the enforced cooldown has not elapsed.
pub fn check_cooldown(
    policy: CooldownPolicy,
    last_fed: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<(), FishError> {
    let (CooldownPolicy::Enforced, Some(fed)) = (policy, last_fed) else {
        return Ok(());
    };
    let since = minutes_between(fed, now);
    if since < FEED_COOLDOWN_MINUTES {
        return Err(FishError::FeedCooldown {
            remaining_minutes: FEED_COOLDOWN_MINUTES - since.max(0.0),
        });
    }
    Ok(())
}

/// Compute the post-feed hunger and health of `fish`.
///
/// # Errors
///
/// Returns [`FishError::Gone`] for a retired fish and
/// [`FishError::FeedCooldown`] when an enforced cooldown blocks the feed.
pub fn apply(
    fish: &Fish,
    now: DateTime<Utc>,
    policy: CooldownPolicy,
) -> Result<FeedResult, FishError> {
    if !fish.is_alive() {
        return Err(FishError::Gone(fish.id));
    }
    check_cooldown(policy, fish.last_fed, now)?;
    let FeedEligibility { overfed, .. } = evaluate(fish.last_fed, now);
    let new_health = if overfed {
        clamp_level(fish.health - OVERFEED_HEALTH_PENALTY)
    } else {
        fish.health
    };
    Ok(FeedResult {
        new_hunger: clamp_level(fish.hunger + HUNGER_PER_FEED),
        new_health,
        overfed,
    })
}

#[must_use]
pub fn classify(hunger: f64) -> HungerStatus {
    if hunger >= HUNGER_FULL_MIN {
        HungerStatus::Full
    } else if hunger >= HUNGER_OKAY_MIN {
        HungerStatus::Okay
    } else if hunger >= HUNGER_HUNGRY_MIN {
        HungerStatus::Hungry
    } else {
        HungerStatus::Starving
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FishId, OwnerId, Species, TankId};
    use chrono::TimeDelta;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn fish() -> Fish {
        Fish::egg(
            FishId(7),
            TankId(1),
            OwnerId::from("cy"),
            Species::Glowling,
            now(),
        )
    }

    #[test]
    fn first_feed_is_never_overfed() {
        let eligibility = evaluate(None, now());
        assert!(eligibility.allowed);
        assert!(!eligibility.overfed);
    }

    #[test]
    fn feeding_inside_five_minutes_overfeeds() {
        let fed = now() - TimeDelta::minutes(4);
        assert!(evaluate(Some(fed), now()).overfed);
        let fed = now() - TimeDelta::minutes(5);
        assert!(!evaluate(Some(fed), now()).overfed);
    }

    #[test]
    fn apply_raises_hunger_and_penalizes_overfeed() {
        let mut f = fish();
        f.hunger = 80.0;
        f.health = 5.0;
        f.last_fed = Some(now() - TimeDelta::minutes(1));
        let result = apply(&f, now(), CooldownPolicy::Permissive).unwrap();
        assert!((result.new_hunger - 100.0).abs() < f64::EPSILON);
        assert!(result.new_health.abs() < f64::EPSILON);
        assert!(result.overfed);
    }

    #[test]
    fn apply_keeps_health_on_normal_feed() {
        let mut f = fish();
        f.hunger = 10.0;
        f.health = 70.0;
        let result = apply(&f, now(), CooldownPolicy::Permissive).unwrap();
        assert!((result.new_hunger - 50.0).abs() < f64::EPSILON);
        assert!((result.new_health - 70.0).abs() < f64::EPSILON);
        assert!(!result.overfed);
    }

    #[test]
    fn enforced_cooldown_blocks_recent_feeds() {
        let mut f = fish();
        f.last_fed = Some(now() - TimeDelta::minutes(10));
        let err = apply(&f, now(), CooldownPolicy::Enforced).unwrap_err();
        match err {
            FishError::FeedCooldown { remaining_minutes } => {
                assert!((remaining_minutes - 20.0).abs() < 1e-9);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(apply(&f, now(), CooldownPolicy::Permissive).is_ok());
        f.last_fed = Some(now() - TimeDelta::minutes(30));
        assert!(apply(&f, now(), CooldownPolicy::Enforced).is_ok());
    }

    #[test]
    fn retired_fish_cannot_eat() {
        let mut f = fish();
        f.retire();
        assert_eq!(
            apply(&f, now(), CooldownPolicy::Permissive),
            Err(FishError::Gone(FishId(7)))
        );
    }

    #[test]
    fn hunger_bands() {
        assert_eq!(classify(60.0), HungerStatus::Full);
        assert_eq!(classify(40.0), HungerStatus::Okay);
        assert_eq!(classify(20.0), HungerStatus::Hungry);
        assert_eq!(classify(19.0), HungerStatus::Starving);
    }
}
