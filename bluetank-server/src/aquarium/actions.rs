//! Player actions. Each one reads fresh state, applies the same formulas the
//! tick uses, and writes back through the tank's consistency cycle.
use bluetank_game::kingfisher;
use bluetank_game::{
    ATTACK_EVENT, AttackOutcome, Fish, FishError, FishId, OwnerId, Species, Tank, TankId,
    ThreatEvent, ThreatPhase, cleanliness, egg_price, feeding, oxygen, sale_value,
};

use super::{
    Aquarium, AttackReport, CleanReport, FeedReport, FishView, OxygenReport, PendingAttack, Plan,
    SaleReport, StolenFish, TankView, ThreatReport,
};
use crate::error::ServiceError;
use crate::notifier::RealtimeNotifier;
use crate::store::{FishPatch, StateStore, TankPatch};

const REPELLED_MESSAGE: &str = "Kingfisher repelled! Your fish are safe.";
const EMPTY_HANDED_MESSAGE: &str = "The kingfisher found nothing to take.";

impl<S: StateStore, N: RealtimeNotifier> Aquarium<S, N> {
    /// Open the owner's tank and grant the starting coins.
    ///
    /// # Errors
    ///
    /// `InvalidState` when the owner already has a tank.
    pub async fn create_tank(&self, owner: &OwnerId) -> Result<Tank, ServiceError> {
        let tank = self
            .store
            .create_tank(owner, self.config.starting_coins, self.now())
            .await?;
        log::info!("{owner} opened {}", tank.id);
        Ok(tank)
    }

    /// # Errors
    ///
    /// `NotFound` for a missing or foreign tank.
    pub async fn tank_view(
        &self,
        owner: &OwnerId,
        tank_id: TankId,
    ) -> Result<TankView, ServiceError> {
        let (tank, fish) = self.load(tank_id, owner).await?;
        Ok(TankView {
            oxygen_status: tank.oxygen_status(),
            cleanliness_status: tank.cleanliness_status(),
            fish: fish.into_iter().map(FishView::from).collect(),
            tank,
        })
    }

    /// One aeration tap. Every accepted tap counts toward the owner's spam
    /// window, and spamming raises the kingfisher's interest. Rejected taps
    /// are not counted.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing or foreign tank.
    pub async fn tap_oxygen(
        &self,
        owner: &OwnerId,
        tank_id: TankId,
    ) -> Result<OxygenReport, ServiceError> {
        let (tank, ()) = self
            .mutate_tank(tank_id, owner, |tank, _| {
                let patch = TankPatch {
                    oxygen_level: Some(oxygen::add_oxygen(tank.oxygen_level)),
                    ..TankPatch::default()
                };
                Ok(Plan::write(patch, Vec::new(), ()))
            })
            .await?;

        let now = self.now();
        let spam_detected = {
            let mut spam = self.spam();
            spam.record_tap(owner, now);
            spam.is_spamming(owner, now)
        };
        if spam_detected {
            log::debug!("{owner} is tap-spamming {tank_id}");
        }

        Ok(OxygenReport {
            oxygen_level: tank.oxygen_level,
            status: tank.oxygen_status(),
            kingfisher_risk: oxygen::threat_contribution(tank.oxygen_level, spam_detected),
            spam_detected,
        })
    }

    /// # Errors
    ///
    /// `NotFound` for a missing or foreign fish; `InvalidState` for a
    /// retired fish or, under the enforced policy, a feed inside the cooldown.
    pub async fn feed(
        &self,
        owner: &OwnerId,
        tank_id: TankId,
        fish_id: FishId,
    ) -> Result<FeedReport, ServiceError> {
        let now = self.now();
        let record = self.owned_fish(owner, tank_id, fish_id).await?;
        if !record.is_alive() {
            return Err(FishError::Gone(fish_id).into());
        }
        let policy = self.config.feed_cooldown;

        let (tank, fed) = self
            .mutate_tank(tank_id, owner, |tank, fish| {
                let target = living(fish, fish_id)?;
                let fed = feeding::apply(target, now, policy)?;
                let tank_patch = TankPatch {
                    cleanliness: Some(cleanliness::apply_feed_dirt(tank.cleanliness, fed.overfed)),
                    ..TankPatch::default()
                };
                let fish_patch = FishPatch {
                    hunger: Some(fed.new_hunger),
                    health: Some(fed.new_health),
                    last_fed: Some(now),
                    ..FishPatch::default()
                };
                Ok(Plan::write(tank_patch, vec![(fish_id, fish_patch)], fed))
            })
            .await?;

        if fed.overfed {
            log::debug!("{fish_id} in {tank_id} was overfed");
        }
        Ok(FeedReport {
            fish_id,
            hunger: fed.new_hunger,
            health: fed.new_health,
            hunger_status: feeding::classify(fed.new_hunger),
            overfed: fed.overfed,
            cleanliness: tank.cleanliness,
            cleanliness_status: tank.cleanliness_status(),
        })
    }

    /// Full water change. Leaves the tick clock alone, so the next tick
    /// still charges dirt for the whole interval since the previous tick,
    /// including the part before the change. Waiting to clean until just
    /// before a tick therefore buys less than cleaning right after one.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing or foreign tank.
    pub async fn clean(
        &self,
        owner: &OwnerId,
        tank_id: TankId,
    ) -> Result<CleanReport, ServiceError> {
        let (tank, ()) = self
            .mutate_tank(tank_id, owner, |_, _| {
                let patch = TankPatch {
                    cleanliness: Some(cleanliness::reset_from_water_change()),
                    ..TankPatch::default()
                };
                Ok(Plan::write(patch, Vec::new(), ()))
            })
            .await?;
        Ok(CleanReport {
            cleanliness: tank.cleanliness,
            status: tank.cleanliness_status(),
        })
    }

    /// Evaluate the kingfisher for this tank. An attack is remembered until
    /// the player resolves it and is pushed to the owner's session.
    ///
    /// There is no server-side deadline on the response: deciding that the
    /// player ran out of time, and reporting `Failed`, is the caller's job.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing or foreign tank.
    pub async fn check_threat(
        &self,
        owner: &OwnerId,
        tank_id: TankId,
    ) -> Result<ThreatReport, ServiceError> {
        let now = self.now();
        let (tank, fish) = self.load(tank_id, owner).await?;
        let spamming = self.spam().is_spamming(owner, now);
        let assessment = {
            let mut rng = self.rng();
            kingfisher::assess(&tank, &fish, spamming, rng.attack())
        };

        let attack_incoming = assessment.phase.is_attacking();
        if attack_incoming {
            self.record_attack(
                tank_id,
                PendingAttack {
                    probability: assessment.probability,
                    since: now,
                },
            );
            log::info!(
                "kingfisher attacking {tank_id} at {}% odds",
                assessment.probability
            );
            let event = ThreatEvent::attack(tank_id, assessment.probability, now);
            match serde_json::to_value(&event) {
                Ok(payload) => self.notifier.notify(owner, ATTACK_EVENT, payload),
                Err(err) => log::debug!("could not encode {ATTACK_EVENT}: {err}"),
            }
        }

        Ok(ThreatReport {
            attack_incoming,
            probability: assessment.probability,
            phase: assessment.phase,
            warning_message: assessment.warning.map(|tier| tier.message().to_string()),
        })
    }

    /// Settle the pending attack on this tank. A failed defence costs one
    /// living adult, chosen at random.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing or foreign tank; `InvalidState` when no
    /// attack is pending.
    pub async fn resolve_attack(
        &self,
        owner: &OwnerId,
        tank_id: TankId,
        outcome: AttackOutcome,
    ) -> Result<AttackReport, ServiceError> {
        self.load(tank_id, owner).await?;
        let pending = self
            .take_attack(tank_id)
            .ok_or(FishError::NoAttackPending)?;

        let pick = self.rng().fork_victim();
        let settled = self
            .mutate_tank(tank_id, owner, |_, fish| {
                let (phase, victim) = kingfisher::resolve_attack(
                    ThreatPhase::Attacking,
                    outcome,
                    fish,
                    &mut pick.clone(),
                )?;
                Ok(match victim {
                    Some(victim) => Plan::write(
                        TankPatch::default(),
                        vec![(victim.id, FishPatch::retire())],
                        (phase, Some(StolenFish::from(victim))),
                    ),
                    None => Plan::read_only((phase, None)),
                })
            })
            .await;

        let (_, (phase, stolen)) = match settled {
            Ok(settled) => settled,
            Err(err) => {
                self.record_attack(tank_id, pending);
                return Err(err);
            }
        };
        let message = match stolen {
            Some(fish) => {
                log::info!("kingfisher took {} from {tank_id}", fish.fish_id);
                format!("The kingfisher stole your {}!", fish.species)
            }
            None if matches!(phase, ThreatPhase::Repelled) => REPELLED_MESSAGE.to_string(),
            None => EMPTY_HANDED_MESSAGE.to_string(),
        };
        Ok(AttackReport {
            outcome,
            fish_safe: stolen.is_none(),
            stolen,
            message,
        })
    }

    /// # Errors
    ///
    /// `NotFound` for a missing or foreign tank; `InvalidState` for a species
    /// that is not sold or an owner who cannot afford it.
    pub async fn buy_egg(
        &self,
        owner: &OwnerId,
        tank_id: TankId,
        species: Species,
    ) -> Result<Fish, ServiceError> {
        let price = egg_price(species)
            .ok_or_else(|| ServiceError::InvalidState(format!("{species} eggs are not sold")))?;
        self.store
            .get_tank(tank_id, owner)
            .await?
            .ok_or(ServiceError::NotFound("tank"))?;

        let cost = i64::from(price);
        self.store.adjust_balance(owner, -cost).await?;
        match self
            .store
            .create_fish(tank_id, species, species.rarity(), self.now())
            .await
        {
            Ok(fish) => {
                log::info!("{owner} bought a {species} egg for {price} coins");
                Ok(fish)
            }
            Err(err) => {
                if let Err(refund) = self.store.adjust_balance(owner, cost).await {
                    log::warn!("refund of {cost} coins to {owner} failed: {refund}");
                }
                Err(err.into())
            }
        }
    }

    /// Sell a living adult. The owner is paid first and the fish retired
    /// second; if retiring fails the payment is taken back, so a failed sale
    /// leaves both the fish and the balance as they were.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing or foreign fish; `InvalidState` for a fish
    /// that is retired or not yet adult.
    pub async fn sell_fish(
        &self,
        owner: &OwnerId,
        tank_id: TankId,
        fish_id: FishId,
    ) -> Result<SaleReport, ServiceError> {
        let record = self.owned_fish(owner, tank_id, fish_id).await?;
        let coins = sale_value(&record)?;
        let credit = i64::from(coins);

        let balance = self.store.adjust_balance(owner, credit).await?;
        let retired = self
            .mutate_tank(tank_id, owner, |_, fish| {
                sale_value(living(fish, fish_id)?)?;
                Ok(Plan::write(
                    TankPatch::default(),
                    vec![(fish_id, FishPatch::retire())],
                    (),
                ))
            })
            .await;
        if let Err(err) = retired {
            if let Err(reversal) = self.store.adjust_balance(owner, -credit).await {
                log::warn!("taking back {credit} coins from {owner} failed: {reversal}");
            }
            return Err(err);
        }
        log::info!("{owner} sold {fish_id} for {coins} coins");
        Ok(SaleReport {
            fish_id,
            coins_earned: coins,
            balance,
        })
    }

    /// # Errors
    ///
    /// `Internal` when the balance cannot be read.
    pub async fn balance(&self, owner: &OwnerId) -> Result<i64, ServiceError> {
        Ok(self.store.balance(owner).await?)
    }

    async fn owned_fish(
        &self,
        owner: &OwnerId,
        tank_id: TankId,
        fish_id: FishId,
    ) -> Result<Fish, ServiceError> {
        self.store
            .get_fish(fish_id, tank_id, owner)
            .await?
            .ok_or(ServiceError::NotFound("fish"))
    }
}

/// The fish with `id` among the living, or `Gone` if it was retired meanwhile.
fn living(fish: &[Fish], id: FishId) -> Result<&Fish, FishError> {
    fish.iter()
        .find(|fish| fish.id == id)
        .ok_or(FishError::Gone(id))
}
