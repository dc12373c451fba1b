//! Tank and fish records plus the closed lookup enumerations they reference.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::cleanliness::{self, CleanlinessStatus};
use crate::constants::{
    DEFAULT_BASE_MINUTES, DEFAULT_SELL_VALUE, NEW_EGG_HEALTH, NEW_EGG_HUNGER,
    NEW_TANK_CLEANLINESS, NEW_TANK_OXYGEN, NEW_TANK_SIZE,
};
use crate::error::UnknownKey;
use crate::oxygen::{self, OxygenStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TankId(pub u64);

impl fmt::Display for TankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tank-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FishId(pub u64);

impl fmt::Display for FishId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fish-{}", self.0)
    }
}

/// Opaque account identifier issued by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Fish species. `Unrecognized` absorbs legacy keys and uses the documented defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Silverfin,
    Bubbletail,
    Glowling,
    EmberCarp,
    CrystalCarp,
    Moonfish,
    SpiritLotus,
    #[serde(other)]
    Unrecognized,
}

impl Species {
    pub const ALL: [Self; 7] = [
        Self::Silverfin,
        Self::Bubbletail,
        Self::Glowling,
        Self::EmberCarp,
        Self::CrystalCarp,
        Self::Moonfish,
        Self::SpiritLotus,
    ];

    /// Minutes to fill one stage of growth at a neutral multiplier.
    #[must_use]
    pub const fn base_minutes(self) -> f64 {
        match self {
            Self::Silverfin => 5.0,
            Self::Bubbletail => 10.0,
            Self::Glowling => 20.0,
            Self::EmberCarp => 25.0,
            Self::CrystalCarp => 40.0,
            Self::Moonfish => 45.0,
            Self::SpiritLotus => 120.0,
            Self::Unrecognized => DEFAULT_BASE_MINUTES,
        }
    }

    /// Rarity assigned to eggs of this species at purchase.
    #[must_use]
    pub const fn rarity(self) -> Rarity {
        match self {
            Self::Silverfin | Self::Unrecognized => Rarity::Common,
            Self::Bubbletail => Rarity::Uncommon,
            Self::Glowling | Self::EmberCarp => Rarity::Rare,
            Self::CrystalCarp | Self::Moonfish => Rarity::Epic,
            Self::SpiritLotus => Rarity::Legendary,
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Silverfin => "silverfin",
            Self::Bubbletail => "bubbletail",
            Self::Glowling => "glowling",
            Self::EmberCarp => "ember_carp",
            Self::CrystalCarp => "crystal_carp",
            Self::Moonfish => "moonfish",
            Self::SpiritLotus => "spirit_lotus",
            Self::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Species {
    type Err = UnknownKey;

    /// Accepts display names too: `"Ember Carp"` parses as `EmberCarp`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace(' ', "_");
        Self::ALL
            .into_iter()
            .find(|species| species.key() == key)
            .ok_or_else(|| UnknownKey::new("species", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    #[serde(other)]
    Unrecognized,
}

impl Rarity {
    /// Coins paid for an adult of this rarity; unknown rarities pay like common.
    #[must_use]
    pub const fn sell_value(self) -> u32 {
        match self {
            Self::Common | Self::Unrecognized => DEFAULT_SELL_VALUE,
            Self::Uncommon => 25,
            Self::Rare => 60,
            Self::Epic => 150,
            Self::Legendary => 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthStage {
    Egg,
    Juvenile,
    Adult,
}

impl GrowthStage {
    /// Stage reached after a full progress bar; adult is terminal.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Egg => Self::Juvenile,
            Self::Juvenile | Self::Adult => Self::Adult,
        }
    }
}

impl fmt::Display for GrowthStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Egg => "egg",
            Self::Juvenile => "juvenile",
            Self::Adult => "adult",
        })
    }
}

/// One aquarium; oxygen and cleanliness always lie in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tank {
    pub id: TankId,
    pub owner: OwnerId,
    pub oxygen_level: f64,
    pub cleanliness: f64,
    pub last_environment_tick: DateTime<Utc>,
    pub size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_skin: Option<String>,
    /// Bumped by the store on every committed write.
    #[serde(default)]
    pub version: u64,
}

impl Tank {
    #[must_use]
    pub fn new(id: TankId, owner: OwnerId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            owner,
            oxygen_level: NEW_TANK_OXYGEN,
            cleanliness: NEW_TANK_CLEANLINESS,
            last_environment_tick: now,
            size: NEW_TANK_SIZE,
            theme_skin: None,
            version: 0,
        }
    }

    #[must_use]
    pub fn oxygen_status(&self) -> OxygenStatus {
        oxygen::classify(self.oxygen_level)
    }

    #[must_use]
    pub fn cleanliness_status(&self) -> CleanlinessStatus {
        cleanliness::classify(self.cleanliness)
    }

    /// Move the environment clock forward; earlier instants are ignored.
    pub fn advance_environment_clock(&mut self, now: DateTime<Utc>) {
        if now > self.last_environment_tick {
            self.last_environment_tick = now;
        }
    }
}

/// One inhabitant. `alive` and `sell_value` are write-once and only reachable
/// through [`Fish::retire`] and [`Fish::assign_sell_value`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fish {
    pub id: FishId,
    pub tank_id: TankId,
    pub owner: OwnerId,
    pub species: Species,
    pub rarity: Rarity,
    pub hunger: f64,
    pub health: f64,
    pub growth_stage: GrowthStage,
    pub growth_progress: f64,
    alive: bool,
    pub last_fed: Option<DateTime<Utc>>,
    sell_value: Option<u32>,
    pub hatched_at: DateTime<Utc>,
    pub matured_at: Option<DateTime<Utc>>,
}

impl Fish {
    /// A freshly purchased egg; rarity follows the species table.
    #[must_use]
    pub fn egg(
        id: FishId,
        tank_id: TankId,
        owner: OwnerId,
        species: Species,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tank_id,
            owner,
            species,
            rarity: species.rarity(),
            hunger: NEW_EGG_HUNGER,
            health: NEW_EGG_HEALTH,
            growth_stage: GrowthStage::Egg,
            growth_progress: 0.0,
            alive: true,
            last_fed: None,
            sell_value: None,
            hatched_at: now,
            matured_at: None,
        }
    }

    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    #[must_use]
    pub fn is_adult(&self) -> bool {
        self.growth_stage == GrowthStage::Adult
    }

    #[must_use]
    pub const fn sell_value(&self) -> Option<u32> {
        self.sell_value
    }

    /// Remove the fish from play (sold or stolen). Irreversible.
    pub fn retire(&mut self) {
        self.alive = false;
    }

    /// Fix the sell value; later calls keep the first value.
    pub fn assign_sell_value(&mut self, value: u32) {
        if self.sell_value.is_none() {
            self.sell_value = Some(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn epoch() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn species_parse_accepts_display_names() {
        assert_eq!("Ember Carp".parse::<Species>().unwrap(), Species::EmberCarp);
        assert_eq!("silverfin".parse::<Species>().unwrap(), Species::Silverfin);
        let err = "goldfsh".parse::<Species>().unwrap_err();
        assert_eq!(err.kind, "species");
    }

    #[test]
    fn unknown_keys_deserialize_to_defaults() {
        let species: Species = serde_json::from_str("\"koi\"").unwrap();
        assert_eq!(species, Species::Unrecognized);
        assert!((species.base_minutes() - 10.0).abs() < f64::EPSILON);
        let rarity: Rarity = serde_json::from_str("\"mythic\"").unwrap();
        assert_eq!(rarity.sell_value(), 10);
    }

    #[test]
    fn stages_never_regress() {
        assert_eq!(GrowthStage::Egg.next(), GrowthStage::Juvenile);
        assert_eq!(GrowthStage::Juvenile.next(), GrowthStage::Adult);
        assert_eq!(GrowthStage::Adult.next(), GrowthStage::Adult);
    }

    #[test]
    fn retire_and_sell_value_are_write_once() {
        let mut fish = Fish::egg(
            FishId(1),
            TankId(1),
            OwnerId::from("ann"),
            Species::Moonfish,
            epoch(),
        );
        assert_eq!(fish.rarity, Rarity::Epic);
        fish.assign_sell_value(150);
        fish.assign_sell_value(1);
        assert_eq!(fish.sell_value(), Some(150));
        fish.retire();
        fish.retire();
        assert!(!fish.is_alive());
    }

    #[test]
    fn environment_clock_is_monotonic() {
        let mut tank = Tank::new(TankId(3), OwnerId::from("bo"), epoch());
        tank.advance_environment_clock(epoch() - chrono::TimeDelta::minutes(5));
        assert_eq!(tank.last_environment_tick, epoch());
        let later = epoch() + chrono::TimeDelta::minutes(1);
        tank.advance_environment_clock(later);
        assert_eq!(tank.last_environment_tick, later);
    }
}
