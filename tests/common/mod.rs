#![allow(dead_code)]

use smatrader::domain::controller::SimulationController;
use smatrader::domain::error::SmaTraderError;
use smatrader::domain::simulation::SimulationConfig;
use smatrader::ports::price_port::PricePort;
use smatrader::ports::scheduler_port::{ScheduledTask, SchedulerPort, TickTask};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Price source replaying a scripted sequence of prices and failures.
pub struct MockPricePort {
    script: Mutex<VecDeque<Result<f64, String>>>,
    calls: AtomicUsize,
}

impl MockPricePort {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn with_prices(prices: &[f64]) -> Arc<Self> {
        let port = Self::new();
        port.push_prices(prices);
        port
    }

    pub fn push_prices(&self, prices: &[f64]) {
        let mut script = self.script.lock().unwrap();
        script.extend(prices.iter().map(|&p| Ok(p)));
    }

    pub fn push_failure(&self, reason: &str) {
        self.script.lock().unwrap().push_back(Err(reason.to_string()));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PricePort for MockPricePort {
    fn fetch_price(&self, asset_id: &str) -> Result<f64, SmaTraderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(price)) => Ok(price),
            Some(Err(reason)) => Err(SmaTraderError::PriceFetch {
                asset: asset_id.to_string(),
                reason,
            }),
            None => Err(SmaTraderError::PriceFetch {
                asset: asset_id.to_string(),
                reason: "no scripted price".into(),
            }),
        }
    }
}

struct Slot {
    interval: Duration,
    task: TickTask,
    active: Arc<AtomicBool>,
}

/// Scheduler driven by the test: tasks run only when `fire` is called.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    slots: Arc<Mutex<Vec<Slot>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times a task was armed.
    pub fn armed(&self) -> usize {
        self.slots.lock().unwrap().len()
    }

    /// Number of armed tasks not yet cancelled.
    pub fn active(&self) -> usize {
        self.slots
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.active.load(Ordering::SeqCst))
            .count()
    }

    pub fn last_interval(&self) -> Option<Duration> {
        self.slots.lock().unwrap().last().map(|s| s.interval)
    }

    /// Runs every active task once, as if one interval elapsed.
    pub fn fire(&self) -> usize {
        let mut slots = self.slots.lock().unwrap();
        let mut fired = 0;
        for slot in slots.iter_mut() {
            if slot.active.load(Ordering::SeqCst) {
                (slot.task)();
                fired += 1;
            }
        }
        fired
    }

    pub fn fire_times(&self, n: usize) {
        for _ in 0..n {
            self.fire();
        }
    }
}

struct ManualTask {
    active: Arc<AtomicBool>,
}

impl ScheduledTask for ManualTask {
    fn cancel(self: Box<Self>) {
        self.active.store(false, Ordering::SeqCst);
    }
}

impl SchedulerPort for ManualScheduler {
    fn schedule(&self, interval: Duration, task: TickTask) -> Box<dyn ScheduledTask> {
        let active = Arc::new(AtomicBool::new(true));
        self.slots.lock().unwrap().push(Slot {
            interval,
            task,
            active: Arc::clone(&active),
        });
        Box::new(ManualTask { active })
    }
}

/// Windows small enough that a crossover needs only a handful of samples.
pub fn small_config() -> SimulationConfig {
    SimulationConfig {
        short_window: 2,
        long_window: 4,
        ..SimulationConfig::default()
    }
}

pub fn make_controller(
    config: SimulationConfig,
    prices: Arc<MockPricePort>,
    scheduler: &ManualScheduler,
) -> SimulationController {
    SimulationController::new(config, prices, Box::new(scheduler.clone())).unwrap()
}

/// Flat warm-up, a rise that crosses up on the fifth sample at 100, a
/// plateau, then a drop that crosses down at 120.
pub const CROSSOVER_PRICES: [f64; 9] = [90.0, 90.0, 90.0, 90.0, 100.0, 200.0, 200.0, 200.0, 120.0];
