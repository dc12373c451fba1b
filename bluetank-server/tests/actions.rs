#![allow(clippy::float_cmp)]

use bluetank_game::{
    ATTACK_EVENT, AttackOutcome, CleanlinessStatus, CooldownPolicy, FishId, GrowthStage, OwnerId,
    Species, TankId,
};
use bluetank_server::{
    Aquarium, ChannelNotifier, Clock, FishPatch, ManualClock, MemoryStore, ServerConfig,
    ServiceError, StateStore, TankPatch, TickScheduler,
};
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;

type TestAquarium = Aquarium<MemoryStore, ChannelNotifier>;

fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn setup(config: ServerConfig) -> (Arc<TestAquarium>, ManualClock) {
    let clock = ManualClock::new(t0());
    let aquarium = Aquarium::new(
        MemoryStore::new(),
        ChannelNotifier::new(),
        Arc::new(clock.clone()),
        config,
    );
    (Arc::new(aquarium), clock)
}

fn seeded() -> ServerConfig {
    ServerConfig {
        rng_seed: Some(2024),
        ..ServerConfig::default()
    }
}

async fn tank_with_egg(
    aquarium: &TestAquarium,
    owner: &str,
    species: Species,
) -> (OwnerId, TankId, FishId) {
    let owner = OwnerId::from(owner);
    let tank = aquarium.create_tank(&owner).await.unwrap();
    let fish = aquarium.buy_egg(&owner, tank.id, species).await.unwrap();
    (owner, tank.id, fish.id)
}

async fn make_adult(aquarium: &TestAquarium, tank: TankId, fish: FishId) {
    let patch = FishPatch {
        growth_stage: Some(GrowthStage::Adult),
        growth_progress: Some(0.0),
        ..FishPatch::default()
    };
    aquarium.store().update_fish(tank, fish, patch).await.unwrap();
}

async fn make_dangerous(aquarium: &TestAquarium, tank: TankId) {
    let patch = TankPatch {
        oxygen_level: Some(0.0),
        cleanliness: Some(0.0),
        ..TankPatch::default()
    };
    aquarium.store().update_tank(tank, patch).await.unwrap();
}

/// Check until the kingfisher strikes. The odds are at their 50% cap.
async fn wait_for_attack(aquarium: &TestAquarium, owner: &OwnerId, tank: TankId) -> u8 {
    for _ in 0..128 {
        let report = aquarium.check_threat(owner, tank).await.unwrap();
        if report.attack_incoming {
            return report.probability;
        }
    }
    panic!("kingfisher never attacked at capped odds");
}

#[tokio::test]
async fn silverfin_hatches_after_five_quiet_minutes() {
    let (aquarium, clock) = setup(seeded());
    let (owner, tank_id, fish_id) = tank_with_egg(&aquarium, "ana", Species::Silverfin).await;
    let scheduler = TickScheduler::new(Arc::clone(&aquarium));

    clock.advance(TimeDelta::minutes(5));
    let report = scheduler.run_pass().await;
    assert_eq!(report.processed, 1);
    assert_eq!(report.stage_advances, 1);

    let view = aquarium.tank_view(&owner, tank_id).await.unwrap();
    assert_eq!(view.tank.oxygen_level, 60.0);
    assert_eq!(view.tank.cleanliness, 80.0);
    assert_eq!(view.tank.last_environment_tick, clock.now());
    let fish = &view.fish[0].fish;
    assert_eq!(fish.id, fish_id);
    assert_eq!(fish.growth_stage, GrowthStage::Juvenile);
    assert_eq!(fish.growth_progress, 0.0);
    assert_eq!(fish.hunger, 70.0);
}

#[tokio::test]
async fn new_tank_grants_starting_coins_once() {
    let (aquarium, _) = setup(seeded());
    let owner = OwnerId::from("ben");
    let tank = aquarium.create_tank(&owner).await.unwrap();
    assert_eq!(tank.oxygen_level, 70.0);
    assert_eq!(tank.cleanliness, 100.0);
    assert_eq!(aquarium.balance(&owner).await.unwrap(), 100);

    let again = aquarium.create_tank(&owner).await.unwrap_err();
    assert!(matches!(again, ServiceError::InvalidState(_)));
    assert_eq!(aquarium.balance(&owner).await.unwrap(), 100);
}

#[tokio::test]
async fn water_change_always_restores_a_clean_tank() {
    let (aquarium, clock) = setup(seeded());
    let owner = OwnerId::from("cat");
    let tank = aquarium.create_tank(&owner).await.unwrap();

    for level in [0.0, 37.5, 100.0] {
        let patch = TankPatch {
            cleanliness: Some(level),
            ..TankPatch::default()
        };
        aquarium.store().update_tank(tank.id, patch).await.unwrap();
        clock.advance(TimeDelta::seconds(10));
        let report = aquarium.clean(&owner, tank.id).await.unwrap();
        assert_eq!(report.cleanliness, 100.0);
        assert_eq!(report.status, CleanlinessStatus::Clean);
    }
    let view = aquarium.tank_view(&owner, tank.id).await.unwrap();
    assert_eq!(view.tank.last_environment_tick, t0());
}

#[tokio::test]
async fn taps_add_oxygen_and_rapid_taps_count_as_spam() {
    let (aquarium, _) = setup(seeded());
    let owner = OwnerId::from("dev");
    let tank = aquarium.create_tank(&owner).await.unwrap();

    let first = aquarium.tap_oxygen(&owner, tank.id).await.unwrap();
    assert_eq!(first.oxygen_level, 80.0);
    assert!(!first.spam_detected);

    let mut last = first;
    for _ in 0..6 {
        last = aquarium.tap_oxygen(&owner, tank.id).await.unwrap();
    }
    assert_eq!(last.oxygen_level, 100.0);
    assert!(last.spam_detected);
    assert_eq!(last.kingfisher_risk, 10);
}

#[tokio::test]
async fn feeding_fills_hunger_and_overfeeding_costs_health() {
    let (aquarium, clock) = setup(seeded());
    let (owner, tank_id, fish_id) = tank_with_egg(&aquarium, "eli", Species::Bubbletail).await;

    let fed = aquarium.feed(&owner, tank_id, fish_id).await.unwrap();
    assert_eq!(fed.hunger, 100.0);
    assert_eq!(fed.health, 100.0);
    assert!(!fed.overfed);
    assert_eq!(fed.cleanliness, 95.0);

    clock.advance(TimeDelta::minutes(2));
    let again = aquarium.feed(&owner, tank_id, fish_id).await.unwrap();
    assert!(again.overfed);
    assert_eq!(again.health, 90.0);
    assert_eq!(again.cleanliness, 75.0);
}

#[tokio::test]
async fn enforced_cooldown_rejects_early_feeds() {
    let config = ServerConfig {
        feed_cooldown: CooldownPolicy::Enforced,
        ..seeded()
    };
    let (aquarium, clock) = setup(config);
    let (owner, tank_id, fish_id) = tank_with_egg(&aquarium, "fay", Species::Silverfin).await;

    aquarium.feed(&owner, tank_id, fish_id).await.unwrap();
    clock.advance(TimeDelta::minutes(10));
    let err = aquarium.feed(&owner, tank_id, fish_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));

    clock.advance(TimeDelta::minutes(25));
    assert!(aquarium.feed(&owner, tank_id, fish_id).await.is_ok());
}

#[tokio::test]
async fn other_owners_see_not_found() {
    let (aquarium, _) = setup(seeded());
    let (_, tank_id, fish_id) = tank_with_egg(&aquarium, "gia", Species::Silverfin).await;
    let intruder = OwnerId::from("hal");

    assert_eq!(
        aquarium.tank_view(&intruder, tank_id).await.unwrap_err(),
        ServiceError::NotFound("tank")
    );
    assert_eq!(
        aquarium.tap_oxygen(&intruder, tank_id).await.unwrap_err(),
        ServiceError::NotFound("tank")
    );
    assert_eq!(
        aquarium.feed(&intruder, tank_id, fish_id).await.unwrap_err(),
        ServiceError::NotFound("fish")
    );
    assert_eq!(
        aquarium.sell_fish(&intruder, tank_id, fish_id).await.unwrap_err(),
        ServiceError::NotFound("fish")
    );
    assert_eq!(
        aquarium
            .resolve_attack(&intruder, tank_id, AttackOutcome::Failed)
            .await
            .unwrap_err(),
        ServiceError::NotFound("tank")
    );
}

#[tokio::test]
async fn eggs_cost_coins_and_broke_owners_are_refused() {
    let (aquarium, _) = setup(seeded());
    let owner = OwnerId::from("ivo");
    let tank = aquarium.create_tank(&owner).await.unwrap();

    let egg = aquarium
        .buy_egg(&owner, tank.id, Species::Glowling)
        .await
        .unwrap();
    assert_eq!(egg.growth_stage, GrowthStage::Egg);
    assert_eq!(egg.hunger, 80.0);
    assert_eq!(aquarium.balance(&owner).await.unwrap(), 20);

    let err = aquarium
        .buy_egg(&owner, tank.id, Species::SpiritLotus)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
    let err = aquarium
        .buy_egg(&owner, tank.id, Species::Unrecognized)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
    assert_eq!(aquarium.balance(&owner).await.unwrap(), 20);
}

#[tokio::test]
async fn only_living_adults_can_be_sold() {
    let (aquarium, _) = setup(seeded());
    let (owner, tank_id, fish_id) = tank_with_egg(&aquarium, "jun", Species::Silverfin).await;

    let err = aquarium.sell_fish(&owner, tank_id, fish_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));

    make_adult(&aquarium, tank_id, fish_id).await;
    let sale = aquarium.sell_fish(&owner, tank_id, fish_id).await.unwrap();
    assert_eq!(sale.coins_earned, 10);
    assert_eq!(sale.balance, 90);

    let stored = aquarium.store().fish_record(fish_id).await.unwrap();
    assert!(!stored.is_alive());
    let err = aquarium.sell_fish(&owner, tank_id, fish_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
    let err = aquarium.feed(&owner, tank_id, fish_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn resolving_without_an_attack_is_rejected() {
    let (aquarium, _) = setup(seeded());
    let (owner, tank_id, _) = tank_with_egg(&aquarium, "kim", Species::Silverfin).await;
    let err = aquarium
        .resolve_attack(&owner, tank_id, AttackOutcome::Repelled)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn failed_defence_loses_an_adult_and_notifies_the_owner() {
    let (aquarium, _) = setup(seeded());
    let (owner, tank_id, fish_id) = tank_with_egg(&aquarium, "lea", Species::EmberCarp).await;
    let mut inbox = aquarium.notifier().connect(&owner);
    make_adult(&aquarium, tank_id, fish_id).await;
    make_dangerous(&aquarium, tank_id).await;

    let probability = wait_for_attack(&aquarium, &owner, tank_id).await;
    assert_eq!(probability, 50);
    assert!(aquarium.pending_attack(tank_id).is_some());

    let notification = inbox.recv().await.unwrap();
    assert_eq!(notification.event, ATTACK_EVENT);
    assert_eq!(notification.payload["tankId"], tank_id.0);
    assert_eq!(notification.payload["probability"], 50);
    assert_eq!(notification.payload["message"], "ATTACK! Tap Repel now!");

    let report = aquarium
        .resolve_attack(&owner, tank_id, AttackOutcome::Failed)
        .await
        .unwrap();
    assert!(!report.fish_safe);
    assert_eq!(report.stolen.map(|fish| fish.fish_id), Some(fish_id));
    assert!(!aquarium.store().fish_record(fish_id).await.unwrap().is_alive());
    assert!(aquarium.pending_attack(tank_id).is_none());

    let err = aquarium
        .resolve_attack(&owner, tank_id, AttackOutcome::Failed)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn repelled_attack_keeps_every_fish() {
    let (aquarium, _) = setup(seeded());
    let (owner, tank_id, fish_id) = tank_with_egg(&aquarium, "max", Species::Silverfin).await;
    make_adult(&aquarium, tank_id, fish_id).await;
    make_dangerous(&aquarium, tank_id).await;

    wait_for_attack(&aquarium, &owner, tank_id).await;
    let report = aquarium
        .resolve_attack(&owner, tank_id, AttackOutcome::Repelled)
        .await
        .unwrap();
    assert!(report.fish_safe);
    assert!(report.stolen.is_none());
    assert!(aquarium.store().fish_record(fish_id).await.unwrap().is_alive());
}

#[tokio::test]
async fn failed_defence_without_adults_takes_nothing() {
    let (aquarium, _) = setup(seeded());
    let (owner, tank_id, fish_id) = tank_with_egg(&aquarium, "ned", Species::Silverfin).await;
    make_dangerous(&aquarium, tank_id).await;

    wait_for_attack(&aquarium, &owner, tank_id).await;
    let report = aquarium
        .resolve_attack(&owner, tank_id, AttackOutcome::Failed)
        .await
        .unwrap();
    assert!(report.fish_safe);
    assert!(report.stolen.is_none());
    assert!(aquarium.store().fish_record(fish_id).await.unwrap().is_alive());
}

#[tokio::test]
async fn empty_tanks_are_never_attacked() {
    let (aquarium, _) = setup(seeded());
    let owner = OwnerId::from("ola");
    let tank = aquarium.create_tank(&owner).await.unwrap();
    make_dangerous(&aquarium, tank.id).await;

    for _ in 0..64 {
        let report = aquarium.check_threat(&owner, tank.id).await.unwrap();
        assert!(!report.attack_incoming);
        assert_eq!(report.probability, 50);
        assert!(report.warning_message.is_some());
    }
}

#[tokio::test]
async fn actions_succeed_without_a_live_session() {
    let (aquarium, _) = setup(seeded());
    let (owner, tank_id, fish_id) = tank_with_egg(&aquarium, "pia", Species::Silverfin).await;
    drop(aquarium.notifier().connect(&owner));
    make_adult(&aquarium, tank_id, fish_id).await;
    make_dangerous(&aquarium, tank_id).await;

    wait_for_attack(&aquarium, &owner, tank_id).await;
    assert!(
        aquarium
            .resolve_attack(&owner, tank_id, AttackOutcome::Repelled)
            .await
            .is_ok()
    );
    assert_eq!(aquarium.notifier().connected(), 0);
}

#[tokio::test]
async fn same_seed_gives_same_threat_rolls() {
    async fn rolls(seed: u64) -> Vec<bool> {
        let (aquarium, _) = setup(ServerConfig {
            rng_seed: Some(seed),
            ..ServerConfig::default()
        });
        let (owner, tank_id, _) = tank_with_egg(&aquarium, "quin", Species::Silverfin).await;
        make_dangerous(&aquarium, tank_id).await;
        let mut out = Vec::new();
        for _ in 0..32 {
            let report = aquarium.check_threat(&owner, tank_id).await.unwrap();
            out.push(report.attack_incoming);
        }
        out
    }

    assert_eq!(rolls(11).await, rolls(11).await);
}
