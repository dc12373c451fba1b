//! One environment tick for a single tank: oxygen, then cleanliness, then
//! growth, scaled by the real elapsed time since the previous tick.
//!
//! Growth uses the readings that held at the start of the interval; toxic
//! damage uses the cleanliness at its end.
use chrono::{DateTime, TimeDelta, Utc};

use crate::cleanliness;
use crate::constants::{
    ADULT_INCOME_PER_TICK, HUNGER_DECAY_PER_MINUTE, TOXIC_HEALTH_LOSS_PER_MINUTE,
};
use crate::growth::{self, GrowthStep};
use crate::numbers::{clamp_level, minutes_between, non_negative_minutes};
use crate::oxygen;
use crate::state::{Fish, FishId, Tank};

/// Minutes since the tank's last environment tick, or `None` when less than
/// `min_elapsed` has passed (including clocks that moved backwards).
#[must_use]
pub fn due_minutes(tank: &Tank, now: DateTime<Utc>, min_elapsed: TimeDelta) -> Option<f64> {
    if now - tank.last_environment_tick < min_elapsed {
        return None;
    }
    Some(minutes_between(tank.last_environment_tick, now))
}

#[derive(Debug, Clone, PartialEq)]
pub struct FishTick {
    pub fish_id: FishId,
    pub hunger: f64,
    pub health: f64,
    pub growth: GrowthStep,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TankTick {
    pub minutes: f64,
    pub oxygen_level: f64,
    pub cleanliness: f64,
    pub fish: Vec<FishTick>,
    /// Coins earned by the owner this tick from living adults.
    pub income: u32,
}

impl TankTick {
    /// Fish that advanced a stage during this tick.
    pub fn advanced(&self) -> impl Iterator<Item = &FishTick> {
        self.fish.iter().filter(|tick| tick.growth.advanced)
    }

    /// Write the tick into in-memory records and move the environment clock to `now`.
    pub fn apply_to(&self, tank: &mut Tank, fish: &mut [Fish], now: DateTime<Utc>) {
        tank.oxygen_level = self.oxygen_level;
        tank.cleanliness = self.cleanliness;
        tank.advance_environment_clock(now);
        for update in &self.fish {
            let Some(target) = fish.iter_mut().find(|f| f.id == update.fish_id) else {
                continue;
            };
            target.hunger = update.hunger;
            target.health = update.health;
            target.growth_stage = update.growth.stage;
            target.growth_progress = update.growth.progress;
            if let Some(value) = update.growth.sell_value {
                target.assign_sell_value(value);
                target.matured_at.get_or_insert(now);
            }
        }
    }
}

/// Advance `tank` and its living `fish` by `minutes`. Retired fish are skipped.
#[must_use]
pub fn advance_tank(tank: &Tank, fish: &[Fish], minutes: f64) -> TankTick {
    let minutes = non_negative_minutes(minutes);
    let oxygen_level = oxygen::decay(tank.oxygen_level, minutes);
    let cleanliness = cleanliness::decay(tank.cleanliness, minutes);
    let toxic = cleanliness::is_damaging(cleanliness);

    let mut income = 0;
    let mut ticks = Vec::with_capacity(fish.len());
    for f in fish.iter().filter(|f| f.is_alive()) {
        if f.is_adult() {
            income += ADULT_INCOME_PER_TICK;
        }
        let multiplier = growth::growth_multiplier(tank.oxygen_level, tank.cleanliness, f.hunger);
        let health = if toxic {
            clamp_level(f.health - TOXIC_HEALTH_LOSS_PER_MINUTE * minutes)
        } else {
            f.health
        };
        ticks.push(FishTick {
            fish_id: f.id,
            hunger: clamp_level(f.hunger - HUNGER_DECAY_PER_MINUTE * minutes),
            health,
            growth: growth::grow(f, multiplier, minutes),
        });
    }

    TankTick {
        minutes,
        oxygen_level,
        cleanliness,
        fish: ticks,
        income,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{GrowthStage, OwnerId, Species, TankId};

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn short_gaps_are_not_due() {
        let tank = Tank::new(TankId(1), OwnerId::from("max"), t0());
        let half = TimeDelta::seconds(30);
        assert_eq!(due_minutes(&tank, t0() + TimeDelta::seconds(29), half), None);
        assert_eq!(due_minutes(&tank, t0() - TimeDelta::minutes(3), half), None);
        let minutes = due_minutes(&tank, t0() + TimeDelta::seconds(90), half).unwrap();
        assert!((minutes - 1.5).abs() < 1e-9);
    }

    #[test]
    fn toxic_water_hurts_and_hunger_decays() {
        let mut tank = Tank::new(TankId(1), OwnerId::from("nia"), t0());
        tank.cleanliness = 12.0;
        let mut fish = Fish::egg(FishId(1), tank.id, tank.owner.clone(), Species::Moonfish, t0());
        fish.health = 50.0;
        let tick = advance_tank(&tank, &[fish], 2.0);
        assert!((tick.cleanliness - 4.0).abs() < 1e-9);
        assert!((tick.fish[0].health - 40.0).abs() < 1e-9);
        assert!((tick.fish[0].hunger - 76.0).abs() < 1e-9);
    }

    #[test]
    fn adults_earn_income_and_retired_fish_are_skipped() {
        let tank = Tank::new(TankId(1), OwnerId::from("oz"), t0());
        let mut adult = Fish::egg(FishId(1), tank.id, tank.owner.clone(), Species::Glowling, t0());
        adult.growth_stage = GrowthStage::Adult;
        let mut gone = adult.clone();
        gone.id = FishId(2);
        gone.retire();
        let hunger = adult.hunger;
        let tick = advance_tank(&tank, &[adult, gone], 1.0);
        assert_eq!(tick.income, 1);
        assert_eq!(tick.fish.len(), 1);
        assert!((tick.fish[0].hunger - (hunger - HUNGER_DECAY_PER_MINUTE)).abs() < 1e-9);
    }
}
