//! Storage boundary for tanks, fish and coin balances.
//!
//! One tank plus its fish is the unit of consistency: [`StateStore::commit`]
//! applies a tank patch and any number of fish patches atomically, optionally
//! guarded by the tank version read at the start of the cycle.
use async_trait::async_trait;
use bluetank_game::numbers::clamp_level;
use bluetank_game::{Fish, FishId, GrowthStage, OwnerId, Rarity, Species, Tank, TankId};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{tank_id} changed concurrently (expected version {expected}, found {found})")]
    Conflict {
        tank_id: TankId,
        expected: u64,
        found: u64,
    },
    #[error("not enough coins: need {needed}, have {available}")]
    InsufficientFunds { needed: i64, available: i64 },
    #[error("owner {0} already has a tank")]
    TankExists(OwnerId),
    #[error("record missing: {0}")]
    Missing(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Partial update of a tank. Levels are clamped and the environment clock
/// never moves backwards when applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TankPatch {
    pub oxygen_level: Option<f64>,
    pub cleanliness: Option<f64>,
    pub last_environment_tick: Option<DateTime<Utc>>,
}

impl TankPatch {
    pub fn apply(&self, tank: &mut Tank) {
        if let Some(level) = self.oxygen_level {
            tank.oxygen_level = clamp_level(level);
        }
        if let Some(level) = self.cleanliness {
            tank.cleanliness = clamp_level(level);
        }
        if let Some(at) = self.last_environment_tick {
            tank.advance_environment_clock(at);
        }
    }
}

/// Partial update of a fish. There is no way to revive a fish or to lower
/// its growth stage through a patch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FishPatch {
    pub hunger: Option<f64>,
    pub health: Option<f64>,
    pub growth_stage: Option<GrowthStage>,
    pub growth_progress: Option<f64>,
    pub last_fed: Option<DateTime<Utc>>,
    pub sell_value: Option<u32>,
    pub matured_at: Option<DateTime<Utc>>,
    pub retire: bool,
}

impl FishPatch {
    #[must_use]
    pub fn retire() -> Self {
        Self {
            retire: true,
            ..Self::default()
        }
    }

    pub fn apply(&self, fish: &mut Fish) {
        if !fish.is_alive() {
            return;
        }
        if let Some(hunger) = self.hunger {
            fish.hunger = clamp_level(hunger);
        }
        if let Some(health) = self.health {
            fish.health = clamp_level(health);
        }
        if let Some(stage) = self.growth_stage {
            fish.growth_stage = fish.growth_stage.max(stage);
        }
        if let Some(progress) = self.growth_progress {
            fish.growth_progress = clamp_level(progress);
        }
        if let Some(fed) = self.last_fed {
            fish.last_fed = Some(fed);
        }
        if let Some(value) = self.sell_value {
            fish.assign_sell_value(value);
        }
        if let Some(at) = self.matured_at {
            fish.matured_at.get_or_insert(at);
        }
        if self.retire {
            fish.retire();
        }
    }
}

/// Everything written by one read-modify-write cycle on a tank.
#[derive(Debug, Clone, PartialEq)]
pub struct TankCommit {
    pub tank_id: TankId,
    /// When set, the commit fails with [`StoreError::Conflict`] unless the
    /// stored version still matches.
    pub expected_version: Option<u64>,
    pub tank: TankPatch,
    pub fish: Vec<(FishId, FishPatch)>,
}

impl TankCommit {
    #[must_use]
    pub fn new(tank_id: TankId) -> Self {
        Self {
            tank_id,
            expected_version: None,
            tank: TankPatch::default(),
            fish: Vec::new(),
        }
    }
}

/// Durable tank and fish records. Every owner-scoped read answers `None`
/// for records that exist but belong to someone else.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Open the owner's only tank and credit `starting_coins` in the same write.
    async fn create_tank(
        &self,
        owner: &OwnerId,
        starting_coins: u32,
        now: DateTime<Utc>,
    ) -> Result<Tank, StoreError>;

    async fn get_tank(&self, id: TankId, owner: &OwnerId) -> Result<Option<Tank>, StoreError>;

    /// Unscoped listing for the tick scheduler.
    async fn list_tanks(&self) -> Result<Vec<Tank>, StoreError>;

    async fn get_fish(
        &self,
        id: FishId,
        tank: TankId,
        owner: &OwnerId,
    ) -> Result<Option<Fish>, StoreError>;

    async fn list_alive_fish(&self, tank: TankId) -> Result<Vec<Fish>, StoreError>;

    async fn create_fish(
        &self,
        tank: TankId,
        species: Species,
        rarity: Rarity,
        now: DateTime<Utc>,
    ) -> Result<Fish, StoreError>;

    /// Apply `commit` atomically and return the tank as stored afterwards.
    async fn commit(&self, commit: TankCommit) -> Result<Tank, StoreError>;

    async fn update_tank(&self, id: TankId, patch: TankPatch) -> Result<Tank, StoreError> {
        let mut commit = TankCommit::new(id);
        commit.tank = patch;
        self.commit(commit).await
    }

    async fn update_fish(
        &self,
        tank: TankId,
        id: FishId,
        patch: FishPatch,
    ) -> Result<(), StoreError> {
        let mut commit = TankCommit::new(tank);
        commit.fish.push((id, patch));
        self.commit(commit).await.map(|_| ())
    }

    async fn balance(&self, owner: &OwnerId) -> Result<i64, StoreError>;

    /// Add `delta` coins (negative to spend). Never lets a balance go below zero.
    async fn adjust_balance(&self, owner: &OwnerId, delta: i64) -> Result<i64, StoreError>;
}

#[derive(Debug, Default)]
struct Inner {
    tanks: BTreeMap<TankId, Tank>,
    fish: BTreeMap<FishId, Fish>,
    balances: HashMap<OwnerId, i64>,
    faulty: HashSet<TankId>,
    next_tank: u64,
    next_fish: u64,
}

impl Inner {
    fn check_fault(&self, id: TankId) -> Result<(), StoreError> {
        if self.faulty.contains(&id) {
            return Err(StoreError::Unavailable(format!("{id} is unreachable")));
        }
        Ok(())
    }
}

/// In-process store used by the binary and the test suites.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every read and write touching `tank` fail until cleared.
    pub async fn inject_fault(&self, tank: TankId) {
        self.inner.write().await.faulty.insert(tank);
    }

    pub async fn clear_fault(&self, tank: TankId) {
        self.inner.write().await.faulty.remove(&tank);
    }

    /// Unscoped fish lookup, including retired fish.
    pub async fn fish_record(&self, id: FishId) -> Option<Fish> {
        self.inner.read().await.fish.get(&id).cloned()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn create_tank(
        &self,
        owner: &OwnerId,
        starting_coins: u32,
        now: DateTime<Utc>,
    ) -> Result<Tank, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.tanks.values().any(|tank| &tank.owner == owner) {
            return Err(StoreError::TankExists(owner.clone()));
        }
        inner.next_tank += 1;
        let tank = Tank::new(TankId(inner.next_tank), owner.clone(), now);
        inner.tanks.insert(tank.id, tank.clone());
        let balance = inner.balances.entry(owner.clone()).or_insert(0);
        *balance = balance.saturating_add(i64::from(starting_coins));
        Ok(tank)
    }

    async fn get_tank(&self, id: TankId, owner: &OwnerId) -> Result<Option<Tank>, StoreError> {
        let inner = self.inner.read().await;
        inner.check_fault(id)?;
        Ok(inner
            .tanks
            .get(&id)
            .filter(|tank| &tank.owner == owner)
            .cloned())
    }

    async fn list_tanks(&self) -> Result<Vec<Tank>, StoreError> {
        Ok(self.inner.read().await.tanks.values().cloned().collect())
    }

    async fn get_fish(
        &self,
        id: FishId,
        tank: TankId,
        owner: &OwnerId,
    ) -> Result<Option<Fish>, StoreError> {
        let inner = self.inner.read().await;
        inner.check_fault(tank)?;
        Ok(inner
            .fish
            .get(&id)
            .filter(|fish| fish.tank_id == tank && &fish.owner == owner)
            .cloned())
    }

    async fn list_alive_fish(&self, tank: TankId) -> Result<Vec<Fish>, StoreError> {
        let inner = self.inner.read().await;
        inner.check_fault(tank)?;
        Ok(inner
            .fish
            .values()
            .filter(|fish| fish.tank_id == tank && fish.is_alive())
            .cloned()
            .collect())
    }

    async fn create_fish(
        &self,
        tank: TankId,
        species: Species,
        rarity: Rarity,
        now: DateTime<Utc>,
    ) -> Result<Fish, StoreError> {
        let mut inner = self.inner.write().await;
        inner.check_fault(tank)?;
        let owner = inner
            .tanks
            .get(&tank)
            .map(|t| t.owner.clone())
            .ok_or_else(|| StoreError::Missing(tank.to_string()))?;
        inner.next_fish += 1;
        let mut fish = Fish::egg(FishId(inner.next_fish), tank, owner, species, now);
        fish.rarity = rarity;
        inner.fish.insert(fish.id, fish.clone());
        Ok(fish)
    }

    async fn commit(&self, commit: TankCommit) -> Result<Tank, StoreError> {
        let mut inner = self.inner.write().await;
        inner.check_fault(commit.tank_id)?;

        let Some(current) = inner.tanks.get(&commit.tank_id) else {
            return Err(StoreError::Missing(commit.tank_id.to_string()));
        };
        if let Some(expected) = commit.expected_version
            && expected != current.version
        {
            return Err(StoreError::Conflict {
                tank_id: commit.tank_id,
                expected,
                found: current.version,
            });
        }
        if let Some((id, _)) = commit.fish.iter().find(|(id, _)| {
            inner
                .fish
                .get(id)
                .is_none_or(|fish| fish.tank_id != commit.tank_id)
        }) {
            return Err(StoreError::Missing(id.to_string()));
        }

        for (id, patch) in &commit.fish {
            if let Some(fish) = inner.fish.get_mut(id) {
                patch.apply(fish);
            }
        }
        let tank = inner
            .tanks
            .get_mut(&commit.tank_id)
            .ok_or_else(|| StoreError::Missing(commit.tank_id.to_string()))?;
        commit.tank.apply(tank);
        tank.version += 1;
        Ok(tank.clone())
    }

    async fn balance(&self, owner: &OwnerId) -> Result<i64, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .balances
            .get(owner)
            .copied()
            .unwrap_or(0))
    }

    async fn adjust_balance(&self, owner: &OwnerId, delta: i64) -> Result<i64, StoreError> {
        let mut inner = self.inner.write().await;
        let balance = inner.balances.entry(owner.clone()).or_insert(0);
        let next = balance.saturating_add(delta);
        if next < 0 {
            return Err(StoreError::InsufficientFunds {
                needed: -delta,
                available: *balance,
            });
        }
        *balance = next;
        Ok(next)
    }
}
