//! Per-session simulation state and the single-sample update step.
//!
//! `Simulation` owns both rolling windows, the running signal, the price
//! history and the ledger. It has no notion of time or I/O; the controller
//! feeds it one price at a time.

use chrono::{DateTime, Utc};
use std::time::Duration;

use super::error::SmaTraderError;
use super::ledger::{PortfolioSnapshot, TradeLedger, TradeRecord};
use super::rolling_window::RollingWindow;
use super::signal::{next_signal, Signal};
use super::sma::average;

pub const DEFAULT_ASSET_ID: &str = "bitcoin";
pub const DEFAULT_SHORT_WINDOW: usize = 5;
pub const DEFAULT_LONG_WINDOW: usize = 20;
pub const DEFAULT_POLLING_INTERVAL_MS: u64 = 60_000;
pub const DEFAULT_INITIAL_BALANCE: f64 = 10_000.0;
pub const DEFAULT_BUY_FRACTION: f64 = 0.9;

/// Largest accepted window; bounds the up-front ring buffer allocation.
pub const MAX_WINDOW_SIZE: usize = 10_000;

/// Polling cadences offered by the demo.
pub const ACCEPTED_POLLING_INTERVALS_MS: [u64; 4] = [10_000, 30_000, 60_000, 300_000];

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub asset_id: String,
    pub short_window: usize,
    pub long_window: usize,
    pub polling_interval_ms: u64,
    pub initial_balance: f64,
    pub buy_fraction: f64,
}

impl SimulationConfig {
    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval_ms)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            asset_id: DEFAULT_ASSET_ID.to_string(),
            short_window: DEFAULT_SHORT_WINDOW,
            long_window: DEFAULT_LONG_WINDOW,
            polling_interval_ms: DEFAULT_POLLING_INTERVAL_MS,
            initial_balance: DEFAULT_INITIAL_BALANCE,
            buy_fraction: DEFAULT_BUY_FRACTION,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub short_sma: f64,
    pub long_sma: f64,
    pub signal: Signal,
}

/// What a successful tick appended.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub point: PricePoint,
    pub trade: Option<TradeRecord>,
}

#[derive(Debug, Clone)]
pub struct Simulation {
    short_window: RollingWindow<f64>,
    long_window: RollingWindow<f64>,
    signal: Signal,
    history: Vec<PricePoint>,
    ledger: TradeLedger,
}

impl Simulation {
    pub fn new(config: &SimulationConfig) -> Result<Self, SmaTraderError> {
        let short_window = window("short", config.short_window)?;
        let long_window = window("long", config.long_window)?;

        Ok(Simulation {
            short_window,
            long_window,
            signal: Signal::Hold,
            history: Vec::new(),
            ledger: TradeLedger::new(config.initial_balance, config.buy_fraction),
        })
    }

    pub fn apply_price(&mut self, price: f64, timestamp: DateTime<Utc>) -> TickOutcome {
        self.short_window.push(price);
        self.long_window.push(price);

        let short_sma = average(&self.short_window.snapshot());
        let long_sma = average(&self.long_window.snapshot());

        let previous = self.signal;
        let signal = next_signal(short_sma, long_sma, previous);

        let point = PricePoint {
            timestamp,
            price,
            short_sma,
            long_sma,
            signal,
        };
        self.history.push(point.clone());

        let trade = if signal != previous && signal.is_actionable() {
            self.ledger.execute_trade(signal, price, timestamp)
        } else {
            None
        };
        self.signal = signal;

        TickOutcome { point, trade }
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }

    pub fn history(&self) -> &[PricePoint] {
        &self.history
    }

    pub fn trades(&self) -> &[TradeRecord] {
        self.ledger.trades()
    }

    pub fn last_price(&self) -> Option<f64> {
        self.history.last().map(|p| p.price)
    }

    /// Values the position at `current_price`, falling back to the most
    /// recent sampled price.
    pub fn portfolio(&self, current_price: Option<f64>) -> PortfolioSnapshot {
        let price = current_price
            .filter(|p| *p > 0.0)
            .or_else(|| self.last_price());
        self.ledger.portfolio_snapshot(price)
    }

    pub fn reset(&mut self) {
        self.short_window.clear();
        self.long_window.clear();
        self.signal = Signal::Hold;
        self.history.clear();
        self.ledger.reset();
    }
}

/// Whether a sampled price can enter the windows and the ledger.
pub fn is_tradeable_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

fn window(name: &str, size: usize) -> Result<RollingWindow<f64>, SmaTraderError> {
    let invalid = || SmaTraderError::InvalidWindow {
        name: name.to_string(),
        size,
    };
    if size > MAX_WINDOW_SIZE {
        return Err(invalid());
    }
    RollingWindow::new(size).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ledger::TradeSide;
    use chrono::TimeZone;

    fn ts(i: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + i * 60, 0).unwrap()
    }

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            short_window: 2,
            long_window: 4,
            ..SimulationConfig::default()
        }
    }

    fn feed(sim: &mut Simulation, prices: &[f64]) -> Vec<TickOutcome> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| sim.apply_price(p, ts(i as i64)))
            .collect()
    }

    #[test]
    fn default_config_values() {
        let c = SimulationConfig::default();
        assert_eq!(c.asset_id, "bitcoin");
        assert_eq!(c.short_window, 5);
        assert_eq!(c.long_window, 20);
        assert_eq!(c.polling_interval(), Duration::from_secs(60));
        assert!((c.initial_balance - 10_000.0).abs() < f64::EPSILON);
        assert!((c.buy_fraction - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_window_rejected() {
        let config = SimulationConfig {
            long_window: 0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            Simulation::new(&config),
            Err(SmaTraderError::InvalidWindow { size: 0, .. })
        ));
    }

    #[test]
    fn oversized_window_rejected() {
        let config = SimulationConfig {
            long_window: MAX_WINDOW_SIZE + 1,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            Simulation::new(&config),
            Err(SmaTraderError::InvalidWindow { ref name, .. }) if name == "long"
        ));
    }

    #[test]
    fn tradeable_prices() {
        assert!(is_tradeable_price(0.01));
        assert!(!is_tradeable_price(0.0));
        assert!(!is_tradeable_price(-5.0));
        assert!(!is_tradeable_price(f64::NAN));
        assert!(!is_tradeable_price(f64::INFINITY));
    }

    #[test]
    fn flat_prices_hold() {
        let mut sim = Simulation::new(&small_config()).unwrap();
        let outcomes = feed(&mut sim, &[100.0; 6]);

        assert!(outcomes.iter().all(|o| o.point.signal == Signal::Hold));
        assert!(outcomes.iter().all(|o| o.trade.is_none()));
        assert_eq!(sim.history().len(), 6);
    }

    #[test]
    fn averages_track_windows() {
        let mut sim = Simulation::new(&small_config()).unwrap();
        let outcomes = feed(&mut sim, &[10.0, 20.0, 30.0, 40.0, 50.0]);

        let last = &outcomes[4].point;
        assert!((last.short_sma - 45.0).abs() < 1e-12);
        assert!((last.long_sma - 35.0).abs() < 1e-12);
    }

    #[test]
    fn crossover_buys_once_then_sells() {
        let mut sim = Simulation::new(&small_config()).unwrap();
        let outcomes = feed(
            &mut sim,
            &[90.0, 90.0, 90.0, 90.0, 100.0, 200.0, 200.0, 200.0, 120.0],
        );

        let trades: Vec<_> = outcomes.iter().filter_map(|o| o.trade.clone()).collect();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].side, TradeSide::Buy);
        assert_eq!(trades[0].timestamp, ts(4));
        assert_eq!(trades[1].side, TradeSide::Sell);
        assert_eq!(trades[1].timestamp, ts(8));
        assert_eq!(sim.signal(), Signal::Sell);
    }

    #[test]
    fn first_sell_without_position_records_nothing() {
        let mut sim = Simulation::new(&small_config()).unwrap();
        let outcomes = feed(&mut sim, &[100.0, 100.0, 100.0, 100.0, 80.0]);

        assert_eq!(outcomes[4].point.signal, Signal::Sell);
        assert!(outcomes[4].trade.is_none());
        assert!(sim.trades().is_empty());
    }

    #[test]
    fn portfolio_falls_back_to_last_price() {
        let mut sim = Simulation::new(&small_config()).unwrap();
        feed(&mut sim, &[90.0, 90.0, 90.0, 90.0, 100.0, 110.0]);

        let snap = sim.portfolio(None);
        assert!((snap.asset_value - 90.0 * 110.0).abs() < 1e-6);

        let snap = sim.portfolio(Some(50.0));
        assert!((snap.asset_value - 90.0 * 50.0).abs() < 1e-6);
    }

    #[test]
    fn portfolio_empty_history_has_no_asset_value() {
        let sim = Simulation::new(&small_config()).unwrap();
        let snap = sim.portfolio(None);
        assert_eq!(snap.asset_value, 0.0);
        assert!((snap.total_value - 10_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn reset_clears_everything() {
        let mut sim = Simulation::new(&small_config()).unwrap();
        feed(&mut sim, &[90.0, 90.0, 90.0, 90.0, 100.0]);
        sim.reset();

        assert!(sim.history().is_empty());
        assert!(sim.trades().is_empty());
        assert_eq!(sim.signal(), Signal::Hold);
        assert!((sim.portfolio(None).cash_balance - 10_000.0).abs() < f64::EPSILON);

        // Windows are empty again, so the first sample cannot cross.
        let outcome = sim.apply_price(500.0, ts(0));
        assert!((outcome.point.short_sma - 500.0).abs() < f64::EPSILON);
        assert!((outcome.point.long_sma - 500.0).abs() < f64::EPSILON);
        assert_eq!(outcome.point.signal, Signal::Hold);
    }
}
