//! Price source port trait.

use crate::domain::error::SmaTraderError;

/// One spot price per call, or a signalled failure.
///
/// Retry, caching and transport live behind this trait; the simulation only
/// sees the final answer.
pub trait PricePort: Send + Sync {
    fn fetch_price(&self, asset_id: &str) -> Result<f64, SmaTraderError>;
}
