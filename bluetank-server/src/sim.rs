//! Headless simulation: scripted keepers play against a manual clock while
//! the scheduler ticks every simulated minute.
use bluetank_game::{ATTACK_EVENT, AttackOutcome, FishId, GrowthStage, OwnerId, Species, TankId};
use chrono::TimeDelta;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::aquarium::{Aquarium, TankView};
use crate::clock::ManualClock;
use crate::error::ServiceError;
use crate::notifier::{ChannelNotifier, Notification};
use crate::scheduler::{TickReport, TickScheduler};
use crate::store::MemoryStore;

pub type SimAquarium = Aquarium<MemoryStore, ChannelNotifier>;

/// How diligently a scripted owner looks after their tank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Keeper {
    Attentive,
    Casual,
    Neglectful,
}

impl Keeper {
    pub const ALL: [Self; 3] = [Self::Attentive, Self::Casual, Self::Neglectful];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Attentive => "Attentive",
            Self::Casual => "Casual",
            Self::Neglectful => "Neglectful",
        }
    }

    /// Actions for this simulated minute given the current tank and purse.
    #[must_use]
    pub fn decide(self, minute: u32, view: &TankView, coins: i64) -> Vec<KeeperAction> {
        let (every, oxygen_floor, hunger_floor, clean_floor) = match self {
            Self::Attentive => (1, 60.0, 50.0, 50.0),
            Self::Casual => (5, 40.0, 30.0, 30.0),
            Self::Neglectful => (20, 15.0, 10.0, 5.0),
        };
        if minute % every != 0 {
            return Vec::new();
        }

        let mut actions = Vec::new();
        if view.tank.oxygen_level < oxygen_floor {
            actions.push(KeeperAction::Tap);
        }
        if view.tank.cleanliness < clean_floor {
            actions.push(KeeperAction::Clean);
        }
        for fish in &view.fish {
            if fish.fish.hunger < hunger_floor {
                actions.push(KeeperAction::Feed(fish.fish.id));
            }
            if self != Self::Neglectful && fish.fish.growth_stage == GrowthStage::Adult {
                actions.push(KeeperAction::Sell(fish.fish.id));
            }
        }
        if view.fish.is_empty() && coins >= 20 {
            actions.push(KeeperAction::BuyEgg(Species::Silverfin));
        }
        actions
    }

    /// Whether the keeper gets to the repel button in time.
    #[must_use]
    pub const fn repels(self, minute: u32) -> bool {
        match self {
            Self::Attentive => true,
            Self::Casual => minute % 2 == 0,
            Self::Neglectful => false,
        }
    }
}

impl fmt::Display for Keeper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeeperAction {
    Tap,
    Feed(FishId),
    Clean,
    Sell(FishId),
    BuyEgg(Species),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationConfig {
    pub minutes: u32,
    pub owners: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub owner: OwnerId,
    pub keeper: Keeper,
    pub tank_id: TankId,
    pub coins: i64,
    pub fish_alive: usize,
    pub fish_sold: usize,
    pub fish_lost: usize,
    pub attacks: usize,
    pub repelled: usize,
    pub oxygen_level: f64,
    pub cleanliness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    /// Threat seed in effect, drawn from entropy when none was configured.
    pub seed: u64,
    pub minutes: u32,
    pub ticks: TickReport,
    pub owners: Vec<OwnerSummary>,
}

struct Player {
    summary: OwnerSummary,
    inbox: UnboundedReceiver<Notification>,
}

/// Play `config.minutes` simulated minutes. The clock advances one minute
/// per step and the scheduler runs a full pass after the keepers act.
///
/// # Errors
///
/// Returns the first action error other than a rejected player move.
pub async fn run_simulation(
    aquarium: Arc<SimAquarium>,
    clock: &ManualClock,
    config: SimulationConfig,
) -> Result<SimulationReport, ServiceError> {
    let scheduler = TickScheduler::new(Arc::clone(&aquarium));
    let mut players = Vec::with_capacity(config.owners);
    for index in 0..config.owners {
        let keeper = Keeper::ALL[index % Keeper::ALL.len()];
        let owner = OwnerId::new(format!("keeper-{}", index + 1));
        let tank = aquarium.create_tank(&owner).await?;
        aquarium
            .buy_egg(&owner, tank.id, Species::Silverfin)
            .await?;
        let inbox = aquarium.notifier().connect(&owner);
        players.push(Player {
            summary: OwnerSummary {
                owner,
                keeper,
                tank_id: tank.id,
                coins: 0,
                fish_alive: 0,
                fish_sold: 0,
                fish_lost: 0,
                attacks: 0,
                repelled: 0,
                oxygen_level: tank.oxygen_level,
                cleanliness: tank.cleanliness,
            },
            inbox,
        });
    }

    let mut ticks = TickReport::default();
    for minute in 1..=config.minutes {
        clock.advance(TimeDelta::minutes(1));
        for player in &mut players {
            play_minute(&aquarium, player, minute).await?;
        }
        ticks.merge(&scheduler.run_pass().await);
    }

    let mut owners = Vec::with_capacity(players.len());
    for mut player in players {
        let summary = &mut player.summary;
        let view = aquarium.tank_view(&summary.owner, summary.tank_id).await?;
        summary.coins = aquarium.balance(&summary.owner).await?;
        summary.fish_alive = view.fish.len();
        summary.oxygen_level = view.tank.oxygen_level;
        summary.cleanliness = view.tank.cleanliness;
        owners.push(player.summary);
    }

    Ok(SimulationReport {
        seed: aquarium.threat_seed(),
        minutes: config.minutes,
        ticks,
        owners,
    })
}

async fn play_minute(
    aquarium: &SimAquarium,
    player: &mut Player,
    minute: u32,
) -> Result<(), ServiceError> {
    let summary = &mut player.summary;
    let (owner, tank_id, keeper) = (summary.owner.clone(), summary.tank_id, summary.keeper);
    let view = aquarium.tank_view(&owner, tank_id).await?;
    let coins = aquarium.balance(&owner).await?;

    for action in keeper.decide(minute, &view, coins) {
        let result = match action {
            KeeperAction::Tap => aquarium.tap_oxygen(&owner, tank_id).await.map(|_| ()),
            KeeperAction::Feed(fish) => aquarium.feed(&owner, tank_id, fish).await.map(|_| ()),
            KeeperAction::Clean => aquarium.clean(&owner, tank_id).await.map(|_| ()),
            KeeperAction::Sell(fish) => aquarium.sell_fish(&owner, tank_id, fish).await.map(|_| {
                summary.fish_sold += 1;
            }),
            KeeperAction::BuyEgg(species) => aquarium
                .buy_egg(&owner, tank_id, species)
                .await
                .map(|_| ()),
        };
        match result {
            Ok(()) => {}
            Err(ServiceError::InvalidState(reason)) => {
                log::debug!("{owner} could not {action:?}: {reason}");
            }
            Err(err) => return Err(err),
        }
    }

    aquarium.check_threat(&owner, tank_id).await?;
    while let Ok(notification) = player.inbox.try_recv() {
        if notification.event != ATTACK_EVENT {
            continue;
        }
        summary.attacks += 1;
        let outcome = if keeper.repels(minute) {
            AttackOutcome::Repelled
        } else {
            AttackOutcome::Failed
        };
        let report = aquarium.resolve_attack(&owner, tank_id, outcome).await?;
        if report.fish_safe {
            summary.repelled += usize::from(outcome == AttackOutcome::Repelled);
        } else {
            summary.fish_lost += 1;
        }
    }
    Ok(())
}
