//! CSV replay price adapter.
//!
//! Loads a recorded price series so a session can be replayed offline. The
//! price column is located by header (`price` or `priceUsd`,
//! case-insensitive), falling back to the last column. An optional
//! `timestamp` or `time` column holds either RFC 3339 strings or Unix epoch
//! milliseconds. Empty cells load as `None`.

use crate::domain::error::SmaTraderError;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;

/// One row of a recorded price series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedPrice {
    pub timestamp: Option<DateTime<Utc>>,
    pub price: Option<f64>,
}

#[derive(Debug)]
pub struct CsvPriceAdapter {
    rows: Vec<RecordedPrice>,
}

impl CsvPriceAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SmaTraderError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::from_csv_str(&content).map_err(|e| match e {
            SmaTraderError::ReplayParse { reason } => SmaTraderError::ReplayParse {
                reason: format!("{}: {}", path.display(), reason),
            },
            other => other,
        })
    }

    pub fn from_csv_str(content: &str) -> Result<Self, SmaTraderError> {
        let mut rdr = csv::Reader::from_reader(content.as_bytes());

        let headers = rdr.headers().map_err(|e| SmaTraderError::ReplayParse {
            reason: format!("CSV header error: {}", e),
        })?;
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.contains(&h.trim().to_ascii_lowercase().as_str()))
        };
        let time_column = find(&["timestamp", "time"]);
        let price_column = find(&["price", "priceusd"])
            .or_else(|| headers.len().checked_sub(1))
            .ok_or_else(|| SmaTraderError::ReplayParse {
                reason: "CSV has no columns".into(),
            })?;

        let mut rows = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| SmaTraderError::ReplayParse {
                reason: format!("CSV parse error: {}", e),
            })?;

            let timestamp = match time_column {
                Some(column) if column != price_column => {
                    parse_timestamp(record.get(column).unwrap_or("").trim(), row + 1)?
                }
                _ => None,
            };

            let cell = record.get(price_column).unwrap_or("").trim();
            let price = if cell.is_empty() {
                None
            } else {
                Some(cell.parse::<f64>().map_err(|e| SmaTraderError::ReplayParse {
                    reason: format!("invalid price on row {}: {}", row + 1, e),
                })?)
            };

            rows.push(RecordedPrice { timestamp, price });
        }

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[RecordedPrice] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn parse_timestamp(cell: &str, row: usize) -> Result<Option<DateTime<Utc>>, SmaTraderError> {
    if cell.is_empty() {
        return Ok(None);
    }
    if let Ok(millis) = cell.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis)
            .map(Some)
            .ok_or_else(|| SmaTraderError::ReplayParse {
                reason: format!("timestamp out of range on row {}: {}", row, cell),
            });
    }
    DateTime::parse_from_rfc3339(cell)
        .map(|ts| Some(ts.with_timezone(&Utc)))
        .map_err(|e| SmaTraderError::ReplayParse {
            reason: format!("invalid timestamp on row {}: {}", row, e),
        })
}
