//! SMA crossover signal state machine.
//!
//! Edge-triggered: a new BUY or SELL is emitted only on the tick where the
//! short average crosses the long one. While the crossover direction matches
//! the active signal, or the averages are equal, the previous signal carries.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl Signal {
    /// BUY and SELL move the ledger; HOLD never does.
    pub fn is_actionable(self) -> bool {
        matches!(self, Signal::Buy | Signal::Sell)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}

pub fn next_signal(short_sma: f64, long_sma: f64, previous: Signal) -> Signal {
    // 0.0 is the empty-window sentinel from `sma::average`.
    if short_sma == 0.0 || long_sma == 0.0 {
        return Signal::Hold;
    }
    if short_sma > long_sma && previous != Signal::Buy {
        return Signal::Buy;
    }
    if short_sma < long_sma && previous != Signal::Sell {
        return Signal::Sell;
    }
    previous
}
