//! Blue Tank Simulation Engine
//!
//! Platform-agnostic core logic for the Blue Tank living aquarium: oxygen and
//! cleanliness dynamics, fish feeding and growth, the kingfisher threat and
//! tap-spam detection. This crate performs no I/O and holds no clocks; every
//! time-dependent function takes the current instant as an argument and every
//! random decision takes an injected RNG.

pub mod cleanliness;
pub mod constants;
pub mod economy;
pub mod error;
pub mod feeding;
pub mod growth;
pub mod kingfisher;
pub mod numbers;
pub mod oxygen;
pub mod rng;
pub mod spam;
pub mod state;
pub mod tick;

// Re-export commonly used types
pub use cleanliness::CleanlinessStatus;
pub use economy::{egg_price, sale_value};
pub use error::{FishError, UnknownKey};
pub use feeding::{CooldownPolicy, FeedEligibility, FeedResult, HungerStatus};
pub use growth::GrowthStep;
pub use kingfisher::{
    ATTACK_EVENT, AttackOutcome, ThreatAssessment, ThreatEvent, ThreatPhase, WarningTier,
};
pub use oxygen::OxygenStatus;
pub use rng::{CountingRng, ThreatRng};
pub use spam::SpamDetector;
pub use state::{Fish, FishId, GrowthStage, OwnerId, Rarity, Species, Tank, TankId};
pub use tick::{FishTick, TankTick, advance_tank, due_minutes};
