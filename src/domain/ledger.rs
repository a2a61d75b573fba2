//! Paper-trading ledger: cash, held quantity, and the trade log.
//!
//! Sizing is all-in/all-out. A BUY spends a fixed fraction of the current
//! cash balance; a SELL liquidates the whole position. No fees, no slippage.

use chrono::{DateTime, Utc};
use std::fmt;

use super::signal::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "BUY"),
            TradeSide::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub timestamp: DateTime<Utc>,
    pub side: TradeSide,
    pub price: f64,
    pub quantity: f64,
    pub total_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioSnapshot {
    pub cash_balance: f64,
    pub asset_quantity: f64,
    pub asset_value: f64,
    pub total_value: f64,
}

#[derive(Debug, Clone)]
pub struct TradeLedger {
    initial_balance: f64,
    buy_fraction: f64,
    cash_balance: f64,
    asset_quantity: f64,
    trades: Vec<TradeRecord>,
}

impl TradeLedger {
    pub fn new(initial_balance: f64, buy_fraction: f64) -> Self {
        TradeLedger {
            initial_balance,
            buy_fraction,
            cash_balance: initial_balance,
            asset_quantity: 0.0,
            trades: Vec::new(),
        }
    }

    pub fn cash_balance(&self) -> f64 {
        self.cash_balance
    }

    pub fn asset_quantity(&self) -> f64 {
        self.asset_quantity
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    /// Executes the trade implied by `signal` at `price`.
    ///
    /// Returns the appended record, or `None` when the signal is HOLD or the
    /// ledger has nothing to spend (BUY) or nothing to sell (SELL).
    pub fn execute_trade(
        &mut self,
        signal: Signal,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> Option<TradeRecord> {
        let record = match signal {
            Signal::Buy if self.cash_balance > 0.0 => {
                let spend = self.cash_balance * self.buy_fraction;
                let quantity = spend / price;
                self.cash_balance -= spend;
                self.asset_quantity += quantity;
                TradeRecord {
                    timestamp,
                    side: TradeSide::Buy,
                    price,
                    quantity,
                    total_value: price * quantity,
                }
            }
            Signal::Sell if self.asset_quantity > 0.0 => {
                let quantity = self.asset_quantity;
                let sale_value = quantity * price;
                self.cash_balance += sale_value;
                self.asset_quantity = 0.0;
                TradeRecord {
                    timestamp,
                    side: TradeSide::Sell,
                    price,
                    quantity,
                    total_value: sale_value,
                }
            }
            _ => return None,
        };

        tracing::info!(
            side = %record.side,
            price = record.price,
            quantity = record.quantity,
            total_value = record.total_value,
            cash_balance = self.cash_balance,
            "trade executed"
        );
        self.trades.push(record.clone());
        Some(record)
    }

    pub fn portfolio_snapshot(&self, price: Option<f64>) -> PortfolioSnapshot {
        let asset_value = match price {
            Some(p) if p > 0.0 => self.asset_quantity * p,
            _ => 0.0,
        };
        PortfolioSnapshot {
            cash_balance: self.cash_balance,
            asset_quantity: self.asset_quantity,
            asset_value,
            total_value: self.cash_balance + asset_value,
        }
    }

    pub fn reset(&mut self) {
        self.cash_balance = self.initial_balance;
        self.asset_quantity = 0.0;
        self.trades.clear();
    }
}
