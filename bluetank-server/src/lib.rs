//! Blue Tank server core
//!
//! Wires the pure simulation in `bluetank_game` to storage, time, realtime
//! delivery and a periodic tick scheduler. Player actions and scheduled
//! ticks share one read-modify-write path per tank so they converge on the
//! same state whatever order they interleave in.

pub mod aquarium;
pub mod clock;
pub mod config;
pub mod error;
pub mod locks;
pub mod notifier;
pub mod scheduler;
pub mod sim;
pub mod store;

pub use aquarium::{Aquarium, PendingAttack, TickOutcome};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, ConsistencyMode, ServerConfig};
pub use error::ServiceError;
pub use notifier::{ChannelNotifier, LogNotifier, Notification, RealtimeNotifier};
pub use scheduler::{TickReport, TickScheduler};
pub use store::{FishPatch, MemoryStore, StateStore, StoreError, TankCommit, TankPatch};
