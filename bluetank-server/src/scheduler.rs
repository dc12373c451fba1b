//! Periodic environment ticks across every tank.
//!
//! A pass lists all tanks and ticks them concurrently. Tanks are isolated:
//! one tank's failure is logged and counted, never fatal to the pass.
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{MissedTickBehavior, interval};

use crate::aquarium::{Aquarium, TickOutcome};
use crate::notifier::RealtimeNotifier;
use crate::store::StateStore;

/// Counts from one pass over every tank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    pub processed: usize,
    /// Tanks ticked too recently to be due.
    pub skipped: usize,
    pub failed: usize,
    pub stage_advances: usize,
    pub income: u64,
}

impl TickReport {
    pub fn merge(&mut self, other: &Self) {
        self.processed += other.processed;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.stage_advances += other.stage_advances;
        self.income += other.income;
    }
}

pub struct TickScheduler<S, N> {
    aquarium: Arc<Aquarium<S, N>>,
    period: Duration,
}

impl<S, N> TickScheduler<S, N>
where
    S: StateStore + 'static,
    N: RealtimeNotifier + 'static,
{
    pub fn new(aquarium: Arc<Aquarium<S, N>>) -> Self {
        let period = aquarium.config().tick_interval();
        Self { aquarium, period }
    }

    /// Tick every tank once, as of the aquarium clock's current time.
    pub async fn run_pass(&self) -> TickReport {
        let now = self.aquarium.now();
        let mut report = TickReport::default();

        let tanks = match self.aquarium.store().list_tanks().await {
            Ok(tanks) => tanks,
            Err(err) => {
                log::warn!("tick pass aborted, cannot list tanks: {err}");
                return report;
            }
        };

        let mut tasks = JoinSet::new();
        for tank in tanks {
            let aquarium = Arc::clone(&self.aquarium);
            tasks.spawn(async move {
                let outcome = aquarium.tick_tank(tank.id, &tank.owner, now).await;
                (tank.id, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(TickOutcome::NotDue))) => report.skipped += 1,
                Ok((
                    _,
                    Ok(TickOutcome::Advanced {
                        stage_advances,
                        income,
                        ..
                    }),
                )) => {
                    report.processed += 1;
                    report.stage_advances += stage_advances;
                    report.income += u64::from(income);
                }
                Ok((tank_id, Err(err))) => {
                    report.failed += 1;
                    log::warn!("tick failed for {tank_id}: {err}");
                }
                Err(join_err) => {
                    report.failed += 1;
                    log::warn!("tank tick task died: {join_err}");
                }
            }
        }

        self.aquarium.sweep(now);
        log::info!(
            "tick pass: {} processed, {} skipped, {} failed",
            report.processed,
            report.skipped,
            report.failed
        );
        report
    }

    /// Run passes every period until `shutdown` flips to `true`. The first
    /// pass runs immediately; missed periods are skipped, not replayed.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        log::info!("tick scheduler started, period {:?}", self.period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_pass().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        log::info!("tick scheduler stopped");
    }

    /// Spawn [`Self::run`] and hand back its handle plus the stop switch.
    pub fn spawn(self) -> (JoinHandle<()>, watch::Sender<bool>) {
        let (stop, shutdown) = watch::channel(false);
        let handle = tokio::spawn(self.run(shutdown));
        (handle, stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_sums_counts() {
        let mut total = TickReport {
            processed: 1,
            income: 2,
            ..TickReport::default()
        };
        total.merge(&TickReport {
            processed: 2,
            skipped: 1,
            failed: 1,
            stage_advances: 3,
            income: 5,
        });
        assert_eq!(
            total,
            TickReport {
                processed: 3,
                skipped: 1,
                failed: 1,
                stage_advances: 3,
                income: 7,
            }
        );
    }
}
