//! The aquarium service: player actions and per-tank ticks over a
//! [`StateStore`], with one consistency strategy shared by both paths.
//!
//! Every write is a read-modify-write cycle on a single tank: load the tank
//! and its living fish, run pure formulas from `bluetank_game` on that
//! snapshot, commit the result. In [`ConsistencyMode::Lock`] the cycle runs
//! under a per-tank lock; in [`ConsistencyMode::Optimistic`] it commits
//! against the version it read and starts over on conflict.
mod actions;
mod views;

pub use views::{
    AttackReport, CleanReport, FeedReport, FishView, OxygenReport, SaleReport, StolenFish,
    TankView, ThreatReport,
};

use bluetank_game::{
    Fish, FishId, GrowthStage, OwnerId, SpamDetector, Tank, TankId, ThreatRng, advance_tank,
    due_minutes,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::clock::Clock;
use crate::config::{ConsistencyMode, ServerConfig};
use crate::error::ServiceError;
use crate::locks::TankLocks;
use crate::notifier::RealtimeNotifier;
use crate::store::{FishPatch, StateStore, StoreError, TankCommit, TankPatch};

/// Writes planned against one snapshot of a tank.
pub(crate) struct Plan<T> {
    tank: TankPatch,
    fish: Vec<(FishId, FishPatch)>,
    write: bool,
    output: T,
}

impl<T> Plan<T> {
    pub(crate) const fn write(tank: TankPatch, fish: Vec<(FishId, FishPatch)>, output: T) -> Self {
        Self {
            tank,
            fish,
            write: true,
            output,
        }
    }

    pub(crate) const fn read_only(output: T) -> Self {
        Self {
            tank: TankPatch {
                oxygen_level: None,
                cleanliness: None,
                last_environment_tick: None,
            },
            fish: Vec::new(),
            write: false,
            output,
        }
    }
}

/// An attack waiting for the player's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAttack {
    pub probability: u8,
    pub since: DateTime<Utc>,
}

/// What a tick did to one tank.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// The tank was ticked too recently.
    NotDue,
    Advanced {
        minutes: f64,
        stage_advances: usize,
        income: u32,
    },
}

pub struct Aquarium<S, N> {
    pub(crate) store: S,
    pub(crate) notifier: N,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: ServerConfig,
    locks: TankLocks,
    spam: Mutex<SpamDetector>,
    rng: Mutex<ThreatRng>,
    pending: Mutex<HashMap<TankId, PendingAttack>>,
}

impl<S: StateStore, N: RealtimeNotifier> Aquarium<S, N> {
    pub fn new(store: S, notifier: N, clock: Arc<dyn Clock>, config: ServerConfig) -> Self {
        let rng = config
            .rng_seed
            .map_or_else(ThreatRng::from_entropy, ThreatRng::from_seed);
        log::debug!(
            "aquarium ready: consistency {:?}, threat seed {}",
            config.consistency,
            rng.seed()
        );
        Self {
            spam: Mutex::new(SpamDetector::new(config.spam_ttl(), config.spam_max_actors)),
            rng: Mutex::new(rng),
            locks: TankLocks::new(),
            pending: Mutex::new(HashMap::new()),
            store,
            notifier,
            clock,
            config,
        }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn notifier(&self) -> &N {
        &self.notifier
    }

    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn spam(&self) -> MutexGuard<'_, SpamDetector> {
        self.spam.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn rng(&self) -> MutexGuard<'_, ThreatRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<TankId, PendingAttack>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed behind the kingfisher's rolls, whether configured or drawn from entropy.
    #[must_use]
    pub fn threat_seed(&self) -> u64 {
        self.rng().seed()
    }

    #[must_use]
    pub fn pending_attack(&self, tank: TankId) -> Option<PendingAttack> {
        self.pending().get(&tank).copied()
    }

    pub(crate) fn record_attack(&self, tank: TankId, attack: PendingAttack) {
        self.pending().insert(tank, attack);
    }

    pub(crate) fn take_attack(&self, tank: TankId) -> Option<PendingAttack> {
        self.pending().remove(&tank)
    }

    pub(crate) async fn load(
        &self,
        tank_id: TankId,
        owner: &OwnerId,
    ) -> Result<(Tank, Vec<Fish>), ServiceError> {
        let tank = self
            .store
            .get_tank(tank_id, owner)
            .await?
            .ok_or(ServiceError::NotFound("tank"))?;
        let fish = self.store.list_alive_fish(tank_id).await?;
        Ok((tank, fish))
    }

    /// Run one read-modify-write cycle on `tank_id` and return the tank as
    /// stored afterwards with the planner's output.
    ///
    /// `plan` may run more than once under optimistic consistency, so it
    /// must not have side effects beyond the plan it returns.
    pub(crate) async fn mutate_tank<T, F>(
        &self,
        tank_id: TankId,
        owner: &OwnerId,
        mut plan: F,
    ) -> Result<(Tank, T), ServiceError>
    where
        F: FnMut(&Tank, &[Fish]) -> Result<Plan<T>, ServiceError> + Send,
        T: Send,
    {
        match self.config.consistency {
            ConsistencyMode::Lock => {
                let _guard = self.locks.acquire(tank_id).await;
                let (tank, fish) = self.load(tank_id, owner).await?;
                let planned = plan(&tank, &fish)?;
                Ok(self.apply_plan(tank, planned, None).await?)
            }
            ConsistencyMode::Optimistic => {
                for attempt in 1..=self.config.max_commit_retries {
                    let (tank, fish) = self.load(tank_id, owner).await?;
                    let planned = plan(&tank, &fish)?;
                    let version = Some(tank.version);
                    match self.apply_plan(tank, planned, version).await {
                        Err(StoreError::Conflict { .. }) => {
                            log::debug!("{tank_id} changed during attempt {attempt}; retrying");
                        }
                        other => return Ok(other?),
                    }
                }
                log::warn!(
                    "{tank_id} still contended after {} attempts",
                    self.config.max_commit_retries
                );
                Err(ServiceError::Internal)
            }
        }
    }

    async fn apply_plan<T>(
        &self,
        tank: Tank,
        plan: Plan<T>,
        expected_version: Option<u64>,
    ) -> Result<(Tank, T), StoreError> {
        if !plan.write {
            return Ok((tank, plan.output));
        }
        let commit = TankCommit {
            tank_id: tank.id,
            expected_version,
            tank: plan.tank,
            fish: plan.fish,
        };
        let stored = self.store.commit(commit).await?;
        Ok((stored, plan.output))
    }

    /// Advance one tank by the time elapsed since its last tick, then pay
    /// the owner for living adults.
    ///
    /// # Errors
    ///
    /// Storage failures map to [`ServiceError::Internal`]; a tank that has
    /// vanished is `NotFound`.
    pub async fn tick_tank(
        &self,
        tank_id: TankId,
        owner: &OwnerId,
        now: DateTime<Utc>,
    ) -> Result<TickOutcome, ServiceError> {
        let min_elapsed = self.config.min_tick_elapsed();
        let (_, tick) = self
            .mutate_tank(tank_id, owner, |tank, fish| {
                let Some(minutes) = due_minutes(tank, now, min_elapsed) else {
                    return Ok(Plan::read_only(None));
                };
                let tick = advance_tank(tank, fish, minutes);
                let patch = TankPatch {
                    oxygen_level: Some(tick.oxygen_level),
                    cleanliness: Some(tick.cleanliness),
                    last_environment_tick: Some(now),
                };
                let fish_patches = tick
                    .fish
                    .iter()
                    .map(|update| {
                        let matured = update.growth.advanced
                            && update.growth.stage == GrowthStage::Adult;
                        let patch = FishPatch {
                            hunger: Some(update.hunger),
                            health: Some(update.health),
                            growth_stage: Some(update.growth.stage),
                            growth_progress: Some(update.growth.progress),
                            sell_value: update.growth.sell_value,
                            matured_at: matured.then_some(now),
                            ..FishPatch::default()
                        };
                        (update.fish_id, patch)
                    })
                    .collect();
                Ok(Plan::write(patch, fish_patches, Some(tick)))
            })
            .await?;

        let Some(tick) = tick else {
            return Ok(TickOutcome::NotDue);
        };
        if tick.income > 0 {
            self.store
                .adjust_balance(owner, i64::from(tick.income))
                .await?;
        }
        for update in tick.advanced() {
            log::info!(
                "{} in {tank_id} grew into {}",
                update.fish_id,
                update.growth.stage
            );
        }
        Ok(TickOutcome::Advanced {
            minutes: tick.minutes,
            stage_advances: tick.advanced().count(),
            income: tick.income,
        })
    }

    /// Evict idle spam windows and unused tank locks.
    pub fn sweep(&self, now: DateTime<Utc>) {
        let evicted = self.spam().sweep(now);
        let pruned = self.locks.prune();
        if evicted + pruned > 0 {
            log::debug!("swept {evicted} idle tappers and {pruned} tank locks");
        }
    }
}
