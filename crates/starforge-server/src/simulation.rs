//! Tick orchestration.
//!
//! One tick: advance every owned planet's economy, write the results, pay
//! bank income, advance the world clock, then tell clients. Planet
//! transitions are independent so they run on the rayon pool. Writes and
//! everything after them happen only once all transitions are in.

use std::sync::Arc;
use std::time::Duration;

use rayon::prelude::*;
use serde_json::json;
use starforge_logic::economy::{tick_planet_report, PlanetEconomy, ProductionReport};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

use crate::error::{StoreError, TickError};
use crate::hub::HubHandle;
use crate::ledger::{BankIncome, CreditLedger};
use crate::protocol::ServerMessage;
use crate::store::{RecordStore, TableExt};
use crate::tables::{Planet, WorldClock, WORLD_CLOCK_ID};

/// A planet written by a tick, with what the tick did to it.
#[derive(Debug, Clone)]
pub struct PlanetChange {
    pub planet: Planet,
    pub production: ProductionReport,
}

#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// World clock value after this tick.
    pub tick: u64,
    pub updated: Vec<PlanetChange>,
    /// Planets whose write failed; they keep last tick's state.
    pub failed: usize,
    /// Planets deleted or unowned while the tick ran.
    pub released: usize,
    pub income: BankIncome,
}

/// Run one tick against the store. Blocking.
///
/// Only failing to read the clock or the planet set aborts the tick. A planet
/// or user whose write fails is logged and skipped.
pub fn run_tick(store: &dyn RecordStore, ledger: &CreditLedger) -> Result<TickReport, TickError> {
    let clock = store
        .find::<WorldClock>(WORLD_CLOCK_ID)?
        .unwrap_or_default();
    let planets = store.filter::<Planet>(|p| p.owner.is_some())?;

    let transitions: Vec<(u64, PlanetEconomy, ProductionReport)> = planets
        .par_iter()
        .map(|planet| {
            let (economy, production) = tick_planet_report(&planet.economy());
            (planet.id, economy, production)
        })
        .collect();

    let mut report = TickReport {
        tick: clock.tick + 1,
        ..Default::default()
    };
    for (planet_id, economy, production) in transitions {
        match write_planet(store, planet_id, &economy) {
            Ok(Some(planet)) => report.updated.push(PlanetChange { planet, production }),
            Ok(None) => {
                log::debug!("Tick {}: planet {} released mid-tick", report.tick, planet_id);
                report.released += 1;
            }
            Err(e) => {
                log::warn!("Tick {}: planet {} not saved: {}", report.tick, planet_id, e);
                report.failed += 1;
            }
        }
    }

    match ledger.apply_bank_income() {
        Ok(income) => report.income = income,
        Err(e) => log::warn!("Tick {}: bank income skipped: {}", report.tick, e),
    }

    let next_clock = WorldClock {
        id: WORLD_CLOCK_ID,
        tick: report.tick,
    };
    if let Err(e) = store.save(&next_clock) {
        log::error!("Tick {}: world clock not advanced: {}", report.tick, e);
    }

    Ok(report)
}

/// Apply the tick-owned fields onto the planet as it is now, so owner and
/// improvement changes made during the tick survive. A planet that was
/// deleted or lost its owner is left alone.
fn write_planet(
    store: &dyn RecordStore,
    planet_id: u64,
    economy: &PlanetEconomy,
) -> Result<Option<Planet>, StoreError> {
    let Some(mut planet) = store.find::<Planet>(planet_id)? else {
        return Ok(None);
    };
    if planet.owner.is_none() {
        return Ok(None);
    }
    planet.apply_economy(economy);
    store.save(&planet)?;
    Ok(Some(planet))
}

/// Drives ticks on a timer and on demand, never two at once.
pub struct TickRunner {
    store: Arc<dyn RecordStore>,
    ledger: Arc<CreditLedger>,
    hub: HubHandle,
    running: Mutex<()>,
}

impl TickRunner {
    pub fn new(store: Arc<dyn RecordStore>, ledger: Arc<CreditLedger>, hub: HubHandle) -> Self {
        Self {
            store,
            ledger,
            hub,
            running: Mutex::new(()),
        }
    }

    /// Run a full tick and publish its results. Waits for any tick in progress.
    pub async fn tick_once(&self) -> Result<TickReport, TickError> {
        let _running = self.running.lock().await;

        let store = self.store.clone();
        let ledger = self.ledger.clone();
        let report = tokio::task::spawn_blocking(move || run_tick(store.as_ref(), &ledger))
            .await
            .map_err(|e| TickError::Worker {
                detail: e.to_string(),
            })??;

        log::info!(
            "Tick {}: {} planets updated, {} released, {} failed, {} credits of bank income",
            report.tick,
            report.updated.len(),
            report.released,
            report.failed,
            report.income.credits_paid
        );
        self.publish(&report).await;
        Ok(report)
    }

    async fn publish(&self, report: &TickReport) {
        if let Err(e) = self.hub.broadcast(&ServerMessage::Tick { tick: report.tick }).await {
            log::warn!("Tick {} not broadcast: {}", report.tick, e);
            return;
        }
        for change in &report.updated {
            let Some(owner) = change.planet.owner else {
                continue;
            };
            let update = ServerMessage::PlanetUpdate(json!({
                "planet": change.planet,
                "production": change.production,
            }));
            if self.hub.send_to_user(owner, &update).await.is_err() {
                return;
            }
        }
    }

    /// Tick every `period` until the task is dropped.
    pub async fn run(self: Arc<Self>, period: Duration) {
        let mut timer = tokio::time::interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        timer.tick().await;
        loop {
            timer.tick().await;
            if let Err(e) = self.tick_once().await {
                log::error!("Tick failed: {}", e);
            }
        }
    }
}
