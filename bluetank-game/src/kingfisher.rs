//! Kingfisher threat engine.
//!
//! A threat check walks `Idle -> Evaluating -> {NoThreat | Warned | Attacking}`.
//! An attack is only settled when the caller submits an [`AttackOutcome`];
//! there is no timer here. Deciding that the player ran out of time is the
//! calling layer's job, which then submits [`AttackOutcome::Failed`].
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::constants::{
    ATTACK_BASE_PERCENT, ATTACK_CAP_PERCENT, ATTACK_DIRTY_BELOW, ATTACK_DIRTY_POINTS,
    ATTACK_STARVING_BELOW, ATTACK_STARVING_POINTS, CAUTION_MIN_PERCENT, DANGER_MIN_PERCENT,
    OXYGEN_RISK_CRITICAL_BELOW, OXYGEN_RISK_CRITICAL_POINTS, OXYGEN_RISK_LOW_BELOW,
    OXYGEN_RISK_LOW_POINTS, SPAM_RISK_POINTS, WARNING_MIN_PERCENT,
};
use crate::error::FishError;
use crate::state::{Fish, FishId, GrowthStage, Tank, TankId};

/// Realtime event name pushed to the owner when an attack starts.
pub const ATTACK_EVENT: &str = "kingfisher_attack";
pub const ATTACK_MESSAGE: &str = "ATTACK! Tap Repel now!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningTier {
    Caution,
    Warning,
    Danger,
}

impl WarningTier {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Danger => "DANGER! Kingfisher is circling!",
            Self::Warning => "WARNING! Kingfisher spotted nearby!",
            Self::Caution => "CAUTION! Kingfisher in the area!",
        }
    }
}

/// Attack chance in percent, always within `[5, 50]`.
///
/// Oxygen and cleanliness are read from raw tank state here rather than
/// through [`crate::oxygen::threat_contribution`].
#[must_use]
pub fn attack_probability(tank: &Tank, fish: &[Fish], is_spamming: bool) -> u8 {
    let mut probability = ATTACK_BASE_PERCENT;

    if tank.oxygen_level < OXYGEN_RISK_CRITICAL_BELOW {
        probability += OXYGEN_RISK_CRITICAL_POINTS;
    } else if tank.oxygen_level < OXYGEN_RISK_LOW_BELOW {
        probability += OXYGEN_RISK_LOW_POINTS;
    }

    if tank.cleanliness < ATTACK_DIRTY_BELOW {
        probability += ATTACK_DIRTY_POINTS;
    }

    if fish
        .iter()
        .any(|f| f.is_alive() && f.hunger < ATTACK_STARVING_BELOW)
    {
        probability += ATTACK_STARVING_POINTS;
    }

    if is_spamming {
        probability += SPAM_RISK_POINTS;
    }

    probability.min(ATTACK_CAP_PERCENT)
}

#[must_use]
pub const fn warning_tier(probability: u8) -> Option<WarningTier> {
    if probability >= DANGER_MIN_PERCENT {
        Some(WarningTier::Danger)
    } else if probability >= WARNING_MIN_PERCENT {
        Some(WarningTier::Warning)
    } else if probability >= CAUTION_MIN_PERCENT {
        Some(WarningTier::Caution)
    } else {
        None
    }
}

/// Uniform draw in `[0, 100)`; the kingfisher strikes when it lands below `probability`.
pub fn roll_attack<R: Rng + ?Sized>(probability: u8, rng: &mut R) -> bool {
    let draw: f64 = rng.gen_range(0.0..100.0);
    draw < f64::from(probability)
}

/// Uniform pick among living adults. Eggs and juveniles are never taken.
pub fn select_victim<'a, R: Rng + ?Sized>(fish: &'a [Fish], rng: &mut R) -> Option<&'a Fish> {
    let adults: Vec<&Fish> = fish
        .iter()
        .filter(|f| f.is_alive() && f.growth_stage == GrowthStage::Adult)
        .collect();
    adults.choose(rng).copied()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackOutcome {
    Repelled,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ThreatPhase {
    Idle,
    Evaluating,
    NoThreat,
    Warned { tier: WarningTier },
    Attacking,
    Repelled,
    /// The attack went through; `victim` is `None` when no adult was available.
    Failed { victim: Option<FishId> },
}

impl ThreatPhase {
    #[must_use]
    pub const fn is_attacking(self) -> bool {
        matches!(self, Self::Attacking)
    }

    /// Settle an attack with the player's response.
    ///
    /// # Errors
    ///
    /// Returns [`FishError::NoAttackPending`] unless the phase is `Attacking`.
    pub fn resolve(
        self,
        outcome: AttackOutcome,
        victim: Option<FishId>,
    ) -> Result<Self, FishError> {
        if !self.is_attacking() {
            return Err(FishError::NoAttackPending);
        }
        Ok(match outcome {
            AttackOutcome::Repelled => Self::Repelled,
            AttackOutcome::Failed => Self::Failed { victim },
        })
    }
}

/// Result of one threat check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatAssessment {
    pub probability: u8,
    pub warning: Option<WarningTier>,
    pub phase: ThreatPhase,
}

/// Evaluate the threat for `tank` and roll for an attack (the `Evaluating`
/// step); the returned phase is one of the three evaluation results.
///
/// The roll always consumes one draw. An attack needs at least one living
/// fish in the tank; otherwise the check falls back to its warning tier.
pub fn assess<R: Rng + ?Sized>(
    tank: &Tank,
    fish: &[Fish],
    is_spamming: bool,
    rng: &mut R,
) -> ThreatAssessment {
    let probability = attack_probability(tank, fish, is_spamming);
    let warning = warning_tier(probability);
    let strikes = roll_attack(probability, rng);

    let phase = if strikes && fish.iter().any(Fish::is_alive) {
        ThreatPhase::Attacking
    } else if let Some(tier) = warning {
        ThreatPhase::Warned { tier }
    } else {
        ThreatPhase::NoThreat
    };

    ThreatAssessment {
        probability,
        warning,
        phase,
    }
}

/// Settle an attack. On failure the victim is picked from `fish` and
/// returned; the caller retires it.
///
/// # Errors
///
/// Returns [`FishError::NoAttackPending`] when `phase` is not `Attacking`.
pub fn resolve_attack<'a, R: Rng + ?Sized>(
    phase: ThreatPhase,
    outcome: AttackOutcome,
    fish: &'a [Fish],
    rng: &mut R,
) -> Result<(ThreatPhase, Option<&'a Fish>), FishError> {
    if !phase.is_attacking() {
        return Err(FishError::NoAttackPending);
    }
    let victim = match outcome {
        AttackOutcome::Repelled => None,
        AttackOutcome::Failed => select_victim(fish, rng),
    };
    let settled = phase.resolve(outcome, victim.map(|f| f.id))?;
    Ok((settled, victim))
}

/// Payload delivered with [`ATTACK_EVENT`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatEvent {
    pub tank_id: TankId,
    pub probability: u8,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ThreatEvent {
    #[must_use]
    pub fn attack(tank_id: TankId, probability: u8, timestamp: DateTime<Utc>) -> Self {
        Self {
            tank_id,
            probability,
            message: ATTACK_MESSAGE.to_string(),
            timestamp,
        }
    }
}
