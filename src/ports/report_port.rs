//! Session report port trait.

use crate::domain::error::SmaTraderError;
use crate::domain::ledger::{PortfolioSnapshot, TradeRecord};
use crate::domain::simulation::PricePoint;
use std::path::Path;

/// Everything a report needs from a finished (or paused) session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub asset_id: String,
    pub history: Vec<PricePoint>,
    pub trades: Vec<TradeRecord>,
    pub portfolio: PortfolioSnapshot,
}

pub trait ReportPort {
    fn write(&self, report: &SessionReport, output_dir: &Path) -> Result<(), SmaTraderError>;
}
