//! Response shapes returned by player actions.
use bluetank_game::{
    AttackOutcome, CleanlinessStatus, Fish, FishId, HungerStatus, OxygenStatus, Rarity, Species,
    Tank, ThreatPhase, feeding,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FishView {
    #[serde(flatten)]
    pub fish: Fish,
    pub hunger_status: HungerStatus,
}

impl From<Fish> for FishView {
    fn from(fish: Fish) -> Self {
        Self {
            hunger_status: feeding::classify(fish.hunger),
            fish,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TankView {
    #[serde(flatten)]
    pub tank: Tank,
    pub oxygen_status: OxygenStatus,
    pub cleanliness_status: CleanlinessStatus,
    pub fish: Vec<FishView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OxygenReport {
    pub oxygen_level: f64,
    pub status: OxygenStatus,
    /// Oxygen's share of the attack chance after this tap.
    pub kingfisher_risk: u8,
    pub spam_detected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedReport {
    pub fish_id: FishId,
    pub hunger: f64,
    pub health: f64,
    pub hunger_status: HungerStatus,
    pub overfed: bool,
    pub cleanliness: f64,
    pub cleanliness_status: CleanlinessStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanReport {
    pub cleanliness: f64,
    pub status: CleanlinessStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatReport {
    pub attack_incoming: bool,
    pub probability: u8,
    #[serde(flatten)]
    pub phase: ThreatPhase,
    pub warning_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StolenFish {
    pub fish_id: FishId,
    pub species: Species,
    pub rarity: Rarity,
}

impl From<&Fish> for StolenFish {
    fn from(fish: &Fish) -> Self {
        Self {
            fish_id: fish.id,
            species: fish.species,
            rarity: fish.rarity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackReport {
    pub outcome: AttackOutcome,
    pub fish_safe: bool,
    pub stolen: Option<StolenFish>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleReport {
    pub fish_id: FishId,
    pub coins_earned: u32,
    pub balance: i64,
}
