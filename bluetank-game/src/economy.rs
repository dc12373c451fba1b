//! Egg prices and sale eligibility.
use crate::error::FishError;
use crate::growth;
use crate::state::{Fish, Species};

/// Coin price of an egg. `None` for species that cannot be bought.
#[must_use]
pub const fn egg_price(species: Species) -> Option<u32> {
    match species {
        Species::Silverfin => Some(20),
        Species::Bubbletail => Some(40),
        Species::Glowling => Some(80),
        Species::EmberCarp => Some(100),
        Species::CrystalCarp => Some(200),
        Species::Moonfish => Some(250),
        Species::SpiritLotus => Some(1_000),
        Species::Unrecognized => None,
    }
}

/// Coins a sale of `fish` would pay.
///
/// # Errors
///
/// Returns [`FishError::Gone`] for a retired fish and [`FishError::NotAdult`]
/// for eggs and juveniles.
pub fn sale_value(fish: &Fish) -> Result<u32, FishError> {
    if !fish.is_alive() {
        return Err(FishError::Gone(fish.id));
    }
    if !fish.is_adult() {
        return Err(FishError::NotAdult {
            stage: fish.growth_stage,
        });
    }
    Ok(fish
        .sell_value()
        .unwrap_or_else(|| growth::sell_value(fish.species, fish.rarity)))
}
