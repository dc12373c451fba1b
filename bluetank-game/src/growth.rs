//! Growth progression: environment multiplier, per-species progress, stage
//! advancement and the one-time sell value assigned at adulthood.
use crate::constants::{
    CRITICAL_CLEAN_BELOW, CRITICAL_HUNGER_BELOW, CRITICAL_OXYGEN_BELOW, GROWTH_COMPLETE,
    GROWTH_MULT_CRITICAL, GROWTH_MULT_NORMAL, GROWTH_MULT_STRAINED, GROWTH_MULT_THRIVING,
    STRAINED_CLEAN_BELOW, STRAINED_HUNGER_BELOW, STRAINED_OXYGEN_BELOW, THRIVING_CLEAN_ABOVE,
    THRIVING_HUNGER_ABOVE, THRIVING_OXYGEN_ABOVE,
};
use crate::numbers::{clamp_level, non_negative_minutes};
use crate::state::{Fish, GrowthStage, Rarity, Species};

/// Growth speed factor for the given readings.
///
/// Critical conditions always win: a tank that is comfortable on two axes
/// but critical on the third grows at the critical rate.
#[must_use]
pub fn growth_multiplier(oxygen: f64, cleanliness: f64, hunger: f64) -> f64 {
    if oxygen < CRITICAL_OXYGEN_BELOW
        || cleanliness < CRITICAL_CLEAN_BELOW
        || hunger < CRITICAL_HUNGER_BELOW
    {
        return GROWTH_MULT_CRITICAL;
    }
    if oxygen > THRIVING_OXYGEN_ABOVE
        && cleanliness > THRIVING_CLEAN_ABOVE
        && hunger > THRIVING_HUNGER_ABOVE
    {
        return GROWTH_MULT_THRIVING;
    }
    if oxygen < STRAINED_OXYGEN_BELOW
        || cleanliness < STRAINED_CLEAN_BELOW
        || hunger < STRAINED_HUNGER_BELOW
    {
        return GROWTH_MULT_STRAINED;
    }
    GROWTH_MULT_NORMAL
}

/// Progress after `minutes` at `multiplier`, capped at a full bar.
#[must_use]
pub fn progress(fish: &Fish, multiplier: f64, minutes: f64) -> f64 {
    let per_minute = (GROWTH_COMPLETE / fish.species.base_minutes()) * multiplier.max(0.0);
    let gained = per_minute * non_negative_minutes(minutes);
    clamp_level(fish.growth_progress + gained).min(GROWTH_COMPLETE)
}

#[must_use]
pub fn should_advance(progress: f64) -> bool {
    progress >= GROWTH_COMPLETE
}

#[must_use]
pub const fn next_stage(stage: GrowthStage) -> GrowthStage {
    stage.next()
}

/// Species does not affect the price today; only rarity does.
#[must_use]
pub const fn sell_value(_species: Species, rarity: Rarity) -> u32 {
    rarity.sell_value()
}

/// Result of growing one fish for one interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthStep {
    pub progress: f64,
    pub stage: GrowthStage,
    pub advanced: bool,
    /// Set only on the step that reaches adulthood.
    pub sell_value: Option<u32>,
}

/// Grow `fish` for `minutes`. Adults are finished and do not accumulate
/// progress; a completed bar advances the stage and resets progress to zero.
#[must_use]
pub fn grow(fish: &Fish, multiplier: f64, minutes: f64) -> GrowthStep {
    if fish.growth_stage == GrowthStage::Adult {
        return GrowthStep {
            progress: fish.growth_progress,
            stage: GrowthStage::Adult,
            advanced: false,
            sell_value: None,
        };
    }

    let progressed = progress(fish, multiplier, minutes);
    if !should_advance(progressed) {
        return GrowthStep {
            progress: progressed,
            stage: fish.growth_stage,
            advanced: false,
            sell_value: None,
        };
    }

    let stage = next_stage(fish.growth_stage);
    let value = (stage == GrowthStage::Adult && fish.sell_value().is_none())
        .then(|| sell_value(fish.species, fish.rarity));
    GrowthStep {
        progress: 0.0,
        stage,
        advanced: true,
        sell_value: value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FishId, OwnerId, TankId};
    use chrono::DateTime;

    fn fish(species: Species) -> Fish {
        Fish::egg(
            FishId(1),
            TankId(1),
            OwnerId::from("dee"),
            species,
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        )
    }

    #[test]
    fn multiplier_bands() {
        assert!((growth_multiplier(80.0, 80.0, 80.0) - 1.5).abs() < f64::EPSILON);
        assert!((growth_multiplier(70.0, 80.0, 80.0) - 1.0).abs() < f64::EPSILON);
        assert!((growth_multiplier(35.0, 80.0, 80.0) - 0.6).abs() < f64::EPSILON);
        assert!((growth_multiplier(50.0, 20.0, 50.0) - 0.6).abs() < f64::EPSILON);
        assert!((growth_multiplier(50.0, 50.0, 5.0) - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn critical_dominates_comfortable() {
        assert!((growth_multiplier(10.0, 90.0, 90.0) - 0.2).abs() < f64::EPSILON);
        assert!((growth_multiplier(90.0, 5.0, 90.0) - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn progress_uses_species_rate_and_caps() {
        let f = fish(Species::Glowling);
        assert!((progress(&f, 1.0, 10.0) - 50.0).abs() < 1e-9);
        assert!((progress(&f, 0.2, 10.0) - 10.0).abs() < 1e-9);
        assert!((progress(&f, 1.5, 60.0) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unrecognized_species_grows_at_default_rate() {
        let f = fish(Species::Unrecognized);
        assert!((progress(&f, 1.0, 5.0) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn full_bar_advances_and_resets() {
        let f = fish(Species::Silverfin);
        let step = grow(&f, 1.0, 5.0);
        assert!(step.advanced);
        assert_eq!(step.stage, GrowthStage::Juvenile);
        assert!(step.progress.abs() < f64::EPSILON);
        assert_eq!(step.sell_value, None);
    }

    #[test]
    fn reaching_adult_assigns_sell_value_once() {
        let mut f = fish(Species::SpiritLotus);
        f.growth_stage = GrowthStage::Juvenile;
        f.growth_progress = 99.0;
        let step = grow(&f, 1.0, 10.0);
        assert_eq!(step.stage, GrowthStage::Adult);
        assert_eq!(step.sell_value, Some(500));

        f.growth_stage = GrowthStage::Adult;
        f.growth_progress = 0.0;
        let idle = grow(&f, 1.5, 1_000.0);
        assert!(!idle.advanced);
        assert!(idle.progress.abs() < f64::EPSILON);
    }
}
