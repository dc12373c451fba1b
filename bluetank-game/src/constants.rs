//! Centralized balance and tuning constants for Blue Tank simulation logic.
//!
//! These values define the deterministic math for the tank simulation.
//! Keeping them together ensures that gameplay can only be adjusted via
//! code changes reviewed in version control, rather than through runtime
//! configuration.

// Shared level bounds ------------------------------------------------------
pub(crate) const LEVEL_MIN: f64 = 0.0;
pub(crate) const LEVEL_MAX: f64 = 100.0;

// Oxygen tuning ------------------------------------------------------------
pub(crate) const OXYGEN_PER_TAP: f64 = 10.0;
pub(crate) const OXYGEN_DECAY_PER_MINUTE: f64 = 2.0;
pub(crate) const OXYGEN_OPTIMAL_MIN: f64 = 70.0;
pub(crate) const OXYGEN_OKAY_MIN: f64 = 40.0;
pub(crate) const OXYGEN_STRESSED_MIN: f64 = 20.0;
pub(crate) const OXYGEN_RISK_CRITICAL_BELOW: f64 = 20.0;
pub(crate) const OXYGEN_RISK_LOW_BELOW: f64 = 30.0;
pub(crate) const OXYGEN_RISK_CRITICAL_POINTS: u8 = 30;
pub(crate) const OXYGEN_RISK_LOW_POINTS: u8 = 20;
pub(crate) const SPAM_RISK_POINTS: u8 = 10;

// Cleanliness tuning -------------------------------------------------------
pub(crate) const FEED_DIRT: f64 = 5.0;
pub(crate) const OVERFEED_DIRT: f64 = 20.0;
/// One point of dirt every 15 seconds.
pub(crate) const DIRT_PER_MINUTE: f64 = 4.0;
pub(crate) const CLEAN_MIN: f64 = 80.0;
pub(crate) const CLEAN_OKAY_MIN: f64 = 50.0;
pub(crate) const CLEAN_DIRTY_MIN: f64 = 25.0;
pub(crate) const CLEAN_VERY_DIRTY_MIN: f64 = 10.0;
pub(crate) const TOXIC_BELOW: f64 = 10.0;
pub(crate) const TOXIC_HEALTH_LOSS_PER_MINUTE: f64 = 5.0;

// Feeding tuning -----------------------------------------------------------
pub(crate) const HUNGER_PER_FEED: f64 = 40.0;
pub(crate) const OVERFEED_HEALTH_PENALTY: f64 = 10.0;
pub(crate) const OVERFEED_WINDOW_MINUTES: f64 = 5.0;
/// Documented cooldown; only enforced under `CooldownPolicy::Enforced`.
pub const FEED_COOLDOWN_MINUTES: f64 = 30.0;
pub(crate) const HUNGER_DECAY_PER_MINUTE: f64 = 2.0;
pub(crate) const HUNGER_FULL_MIN: f64 = 60.0;
pub(crate) const HUNGER_OKAY_MIN: f64 = 40.0;
pub(crate) const HUNGER_HUNGRY_MIN: f64 = 20.0;

// Growth tuning ------------------------------------------------------------
pub(crate) const GROWTH_COMPLETE: f64 = 100.0;
pub(crate) const GROWTH_MULT_THRIVING: f64 = 1.5;
pub(crate) const GROWTH_MULT_NORMAL: f64 = 1.0;
pub(crate) const GROWTH_MULT_STRAINED: f64 = 0.6;
pub(crate) const GROWTH_MULT_CRITICAL: f64 = 0.2;
pub(crate) const THRIVING_OXYGEN_ABOVE: f64 = 70.0;
pub(crate) const THRIVING_CLEAN_ABOVE: f64 = 70.0;
pub(crate) const THRIVING_HUNGER_ABOVE: f64 = 60.0;
pub(crate) const CRITICAL_OXYGEN_BELOW: f64 = 20.0;
pub(crate) const CRITICAL_CLEAN_BELOW: f64 = 10.0;
pub(crate) const CRITICAL_HUNGER_BELOW: f64 = 10.0;
pub(crate) const STRAINED_OXYGEN_BELOW: f64 = 40.0;
pub(crate) const STRAINED_CLEAN_BELOW: f64 = 25.0;
pub(crate) const STRAINED_HUNGER_BELOW: f64 = 20.0;
pub(crate) const DEFAULT_BASE_MINUTES: f64 = 10.0;
pub(crate) const DEFAULT_SELL_VALUE: u32 = 10;

// Kingfisher tuning --------------------------------------------------------
pub(crate) const ATTACK_BASE_PERCENT: u8 = 5;
pub(crate) const ATTACK_CAP_PERCENT: u8 = 50;
pub(crate) const ATTACK_DIRTY_BELOW: f64 = 35.0;
pub(crate) const ATTACK_DIRTY_POINTS: u8 = 20;
pub(crate) const ATTACK_STARVING_BELOW: f64 = 20.0;
pub(crate) const ATTACK_STARVING_POINTS: u8 = 10;
pub(crate) const DANGER_MIN_PERCENT: u8 = 40;
pub(crate) const WARNING_MIN_PERCENT: u8 = 25;
pub(crate) const CAUTION_MIN_PERCENT: u8 = 10;

// Tap spam tuning ----------------------------------------------------------
pub(crate) const SPAM_WINDOW_MS: i64 = 1_000;
/// More taps than this inside the window counts as spamming.
pub(crate) const SPAM_TAP_THRESHOLD: usize = 6;

// Tank defaults ------------------------------------------------------------
pub(crate) const NEW_TANK_OXYGEN: f64 = 70.0;
pub(crate) const NEW_TANK_CLEANLINESS: f64 = 100.0;
pub(crate) const NEW_TANK_SIZE: u32 = 1;
pub(crate) const NEW_EGG_HUNGER: f64 = 80.0;
pub(crate) const NEW_EGG_HEALTH: f64 = 100.0;
pub(crate) const ADULT_INCOME_PER_TICK: u32 = 1;
