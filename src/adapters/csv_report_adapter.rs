//! CSV session report adapter.
//!
//! Writes `history.csv` and `trades.csv` into the output directory, plus a
//! one-row `portfolio.csv` summary. Timestamps are RFC 3339 in UTC.

use crate::domain::error::SmaTraderError;
use crate::ports::report_port::{ReportPort, SessionReport};
use chrono::SecondsFormat;
use std::fs;
use std::path::Path;

pub const HISTORY_FILE: &str = "history.csv";
pub const TRADES_FILE: &str = "trades.csv";
pub const PORTFOLIO_FILE: &str = "portfolio.csv";

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    fn writer(path: &Path) -> Result<csv::Writer<fs::File>, SmaTraderError> {
        csv::Writer::from_path(path).map_err(|e| report_error(path, e))
    }

    fn write_history(report: &SessionReport, path: &Path) -> Result<(), SmaTraderError> {
        let mut wtr = Self::writer(path)?;
        wtr.write_record(["timestamp", "asset", "price", "short_sma", "long_sma", "signal"])
            .map_err(|e| report_error(path, e))?;
        for point in &report.history {
            wtr.write_record([
                point.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                report.asset_id.clone(),
                point.price.to_string(),
                point.short_sma.to_string(),
                point.long_sma.to_string(),
                point.signal.to_string(),
            ])
            .map_err(|e| report_error(path, e))?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_trades(report: &SessionReport, path: &Path) -> Result<(), SmaTraderError> {
        let mut wtr = Self::writer(path)?;
        wtr.write_record(["timestamp", "asset", "side", "price", "quantity", "total_value"])
            .map_err(|e| report_error(path, e))?;
        for trade in &report.trades {
            wtr.write_record([
                trade.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                report.asset_id.clone(),
                trade.side.to_string(),
                trade.price.to_string(),
                trade.quantity.to_string(),
                trade.total_value.to_string(),
            ])
            .map_err(|e| report_error(path, e))?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_portfolio(report: &SessionReport, path: &Path) -> Result<(), SmaTraderError> {
        let p = &report.portfolio;
        let mut wtr = Self::writer(path)?;
        wtr.write_record([
            "asset",
            "cash_balance",
            "asset_quantity",
            "asset_value",
            "total_value",
        ])
        .map_err(|e| report_error(path, e))?;
        wtr.write_record([
            report.asset_id.clone(),
            format!("{:.2}", p.cash_balance),
            p.asset_quantity.to_string(),
            format!("{:.2}", p.asset_value),
            format!("{:.2}", p.total_value),
        ])
        .map_err(|e| report_error(path, e))?;
        wtr.flush()?;
        Ok(())
    }
}

fn report_error(path: &Path, e: csv::Error) -> SmaTraderError {
    SmaTraderError::Report {
        reason: format!("failed to write {}: {}", path.display(), e),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, report: &SessionReport, output_dir: &Path) -> Result<(), SmaTraderError> {
        fs::create_dir_all(output_dir)?;
        Self::write_history(report, &output_dir.join(HISTORY_FILE))?;
        Self::write_trades(report, &output_dir.join(TRADES_FILE))?;
        Self::write_portfolio(report, &output_dir.join(PORTFOLIO_FILE))?;
        tracing::info!(dir = %output_dir.display(), "session report written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ledger::{PortfolioSnapshot, TradeRecord, TradeSide};
    use crate::domain::signal::Signal;
    use crate::domain::simulation::PricePoint;
    use chrono::{TimeZone, Utc};

    fn sample_report() -> SessionReport {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        SessionReport {
            asset_id: "bitcoin".into(),
            history: vec![
                PricePoint {
                    timestamp: ts,
                    price: 100.0,
                    short_sma: 100.0,
                    long_sma: 100.0,
                    signal: Signal::Hold,
                },
                PricePoint {
                    timestamp: ts + chrono::Duration::minutes(1),
                    price: 110.0,
                    short_sma: 105.0,
                    long_sma: 102.5,
                    signal: Signal::Buy,
                },
            ],
            trades: vec![TradeRecord {
                timestamp: ts + chrono::Duration::minutes(1),
                side: TradeSide::Buy,
                price: 110.0,
                quantity: 2.0,
                total_value: 220.0,
            }],
            portfolio: PortfolioSnapshot {
                cash_balance: 780.0,
                asset_quantity: 2.0,
                asset_value: 220.0,
                total_value: 1000.0,
            },
        }
    }

    #[test]
    fn writes_all_files() {
        let dir = tempfile::tempdir().unwrap();
        CsvReportAdapter::new()
            .write(&sample_report(), dir.path())
            .unwrap();

        let history = fs::read_to_string(dir.path().join(HISTORY_FILE)).unwrap();
        let lines: Vec<&str> = history.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "timestamp,asset,price,short_sma,long_sma,signal");
        assert_eq!(lines[1], "2024-05-01T09:30:00.000Z,bitcoin,100,100,100,HOLD");
        assert!(lines[2].ends_with(",BUY"));

        let trades = fs::read_to_string(dir.path().join(TRADES_FILE)).unwrap();
        let lines: Vec<&str> = trades.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "2024-05-01T09:31:00.000Z,bitcoin,BUY,110,2,220");

        let portfolio = fs::read_to_string(dir.path().join(PORTFOLIO_FILE)).unwrap();
        assert!(portfolio.contains("bitcoin,780.00,2,220.00,1000.00"));
    }

    #[test]
    fn creates_missing_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("runs").join("today");
        CsvReportAdapter::new()
            .write(&sample_report(), &nested)
            .unwrap();
        assert!(nested.join(TRADES_FILE).exists());
    }

    #[test]
    fn empty_session_writes_headers_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = sample_report();
        report.history.clear();
        report.trades.clear();
        CsvReportAdapter::new().write(&report, dir.path()).unwrap();

        let trades = fs::read_to_string(dir.path().join(TRADES_FILE)).unwrap();
        assert_eq!(trades.lines().count(), 1);
    }
}
