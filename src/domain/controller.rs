//! Simulation controller: the Idle/Running lifecycle around [`Simulation`].
//!
//! The controller pulls one price per tick from a [`PricePort`] and hands it
//! to the simulation. Periodic ticking is delegated to a [`SchedulerPort`];
//! the controller itself only exposes synchronous `start`, `stop`, `tick`.
//!
//! Two locks are involved. The tick guard is held for the whole tick,
//! including the fetch, so ticks never overlap. The state lock is held only
//! while a fetched price is applied, so readers polling the accessors are not
//! blocked by a slow fetch and never see a half-applied tick.

use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::error::SmaTraderError;
use super::ledger::{PortfolioSnapshot, TradeRecord};
use super::signal::Signal;
use super::simulation::{
    is_tradeable_price, PricePoint, Simulation, SimulationConfig, TickOutcome,
};
use crate::ports::price_port::PricePort;
use crate::ports::scheduler_port::{ScheduledTask, SchedulerPort};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Shared {
    asset_id: String,
    prices: Arc<dyn PricePort>,
    tick_guard: Mutex<()>,
    state: Mutex<Simulation>,
}

impl Shared {
    fn tick(&self) -> Result<TickOutcome, SmaTraderError> {
        let _guard = lock(&self.tick_guard);

        let price = match self.fetch_valid_price() {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(asset = %self.asset_id, error = %e, "tick skipped");
                return Err(e);
            }
        };

        let outcome = lock(&self.state).apply_price(price, Utc::now());
        tracing::info!(
            asset = %self.asset_id,
            price = outcome.point.price,
            short_sma = outcome.point.short_sma,
            long_sma = outcome.point.long_sma,
            signal = %outcome.point.signal,
            "tick"
        );
        Ok(outcome)
    }

    fn fetch_valid_price(&self) -> Result<f64, SmaTraderError> {
        let price = self.prices.fetch_price(&self.asset_id)?;
        if !is_tradeable_price(price) {
            return Err(SmaTraderError::PriceFetch {
                asset: self.asset_id.clone(),
                reason: format!("invalid price {price}"),
            });
        }
        Ok(price)
    }
}

pub struct SimulationController {
    config: SimulationConfig,
    shared: Arc<Shared>,
    scheduler: Box<dyn SchedulerPort>,
    task: Option<Box<dyn ScheduledTask>>,
}

impl SimulationController {
    pub fn new(
        config: SimulationConfig,
        prices: Arc<dyn PricePort>,
        scheduler: Box<dyn SchedulerPort>,
    ) -> Result<Self, SmaTraderError> {
        let simulation = Simulation::new(&config)?;
        let shared = Arc::new(Shared {
            asset_id: config.asset_id.clone(),
            prices,
            tick_guard: Mutex::new(()),
            state: Mutex::new(simulation),
        });
        Ok(SimulationController {
            config,
            shared,
            scheduler,
            task: None,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn run_state(&self) -> RunState {
        if self.task.is_some() {
            RunState::Running
        } else {
            RunState::Idle
        }
    }

    /// Runs one tick immediately, then arms periodic ticking.
    ///
    /// A failed initial fetch is returned as `StartupFetch`, but only after
    /// the periodic task has been armed: later ticks retry on their own.
    pub fn start(&mut self) -> Result<(), SmaTraderError> {
        if self.task.is_some() {
            tracing::debug!(asset = %self.config.asset_id, "simulation already running");
            return Ok(());
        }

        tracing::info!(
            asset = %self.config.asset_id,
            interval_ms = self.config.polling_interval_ms,
            "starting simulation"
        );
        let first = self.shared.tick();

        let shared = Arc::clone(&self.shared);
        let task = self.scheduler.schedule(
            self.config.polling_interval(),
            Box::new(move || {
                // Failures are already logged inside the tick.
                let _ = shared.tick();
            }),
        );
        self.task = Some(task);

        first.map(|_| ()).map_err(SmaTraderError::into_startup)
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.cancel();
            tracing::info!(asset = %self.config.asset_id, "simulation stopped");
        }
    }

    /// A single synchronous tick, independent of the scheduler.
    pub fn tick(&self) -> Result<TickOutcome, SmaTraderError> {
        self.shared.tick()
    }

    pub fn reset(&mut self) {
        self.stop();
        let _guard = lock(&self.shared.tick_guard);
        lock(&self.shared.state).reset();
    }

    pub fn signal(&self) -> Signal {
        lock(&self.shared.state).signal()
    }

    pub fn history(&self) -> Vec<PricePoint> {
        lock(&self.shared.state).history().to_vec()
    }

    /// The last `n` history points, oldest first.
    pub fn recent_history(&self, n: usize) -> Vec<PricePoint> {
        let state = lock(&self.shared.state);
        let history = state.history();
        history[history.len().saturating_sub(n)..].to_vec()
    }

    pub fn trades(&self) -> Vec<TradeRecord> {
        lock(&self.shared.state).trades().to_vec()
    }

    pub fn portfolio(&self, current_price: Option<f64>) -> PortfolioSnapshot {
        lock(&self.shared.state).portfolio(current_price)
    }
}

impl Drop for SimulationController {
    fn drop(&mut self) {
        self.stop();
    }
}
