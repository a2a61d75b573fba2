//! CoinCap REST price adapter.
//!
//! Fetches the spot USD price of one asset from `GET {base_url}/assets/{id}`.
//! Transient failures (connect errors, timeouts, non-2xx statuses) are retried
//! with a fixed delay up to the configured attempt count. A 404 means the
//! asset id is unknown and is not retried.

use crate::domain::config_validation::ApiConfig;
use crate::domain::error::SmaTraderError;
use crate::ports::price_port::PricePort;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct AssetResponse {
    data: Option<AssetData>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetData {
    id: String,
    price_usd: Option<String>,
}

pub struct CoinCapAdapter {
    client: reqwest::blocking::Client,
    base_url: String,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl CoinCapAdapter {
    pub fn new(api: &ApiConfig) -> Result<Self, SmaTraderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("smatrader/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SmaTraderError::Io(std::io::Error::other(e)))?;

        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            retry_attempts: api.retry_attempts.max(1),
            retry_delay: Duration::from_millis(api.retry_delay_ms),
        })
    }

    fn asset_url(&self, asset_id: &str) -> String {
        format!("{}/assets/{}", self.base_url, asset_id)
    }

    /// Extracts `data.priceUsd` from an asset response body.
    fn parse_price(asset_id: &str, body: &str) -> Result<f64, String> {
        let resp: AssetResponse =
            serde_json::from_str(body).map_err(|e| format!("malformed response: {e}"))?;

        let data = match (resp.data, resp.error) {
            (Some(data), _) => data,
            (None, Some(err)) => return Err(err),
            (None, None) => return Err("response has no data".into()),
        };
        if data.id != asset_id {
            return Err(format!("response is for {} not {}", data.id, asset_id));
        }

        let raw = data
            .price_usd
            .ok_or_else(|| "response has no priceUsd".to_string())?;
        raw.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid priceUsd {raw:?}: {e}"))
    }

    fn fetch_once(&self, url: &str, asset_id: &str) -> Result<f64, Attempt> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| Attempt::Retry(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Attempt::Fatal(format!("unknown asset {asset_id}")));
        }
        if !status.is_success() {
            return Err(Attempt::Retry(format!("HTTP {status}")));
        }

        let body = resp.text().map_err(|e| Attempt::Retry(e.to_string()))?;
        Self::parse_price(asset_id, &body).map_err(Attempt::Fatal)
    }
}

enum Attempt {
    Retry(String),
    Fatal(String),
}

impl PricePort for CoinCapAdapter {
    fn fetch_price(&self, asset_id: &str) -> Result<f64, SmaTraderError> {
        let url = self.asset_url(asset_id);
        let mut last_reason = String::from("no attempts made");

        for attempt in 1..=self.retry_attempts {
            if attempt > 1 {
                std::thread::sleep(self.retry_delay);
            }
            match self.fetch_once(&url, asset_id) {
                Ok(price) => return Ok(price),
                Err(Attempt::Fatal(reason)) => {
                    return Err(SmaTraderError::PriceFetch {
                        asset: asset_id.to_string(),
                        reason,
                    });
                }
                Err(Attempt::Retry(reason)) => {
                    tracing::debug!(asset = asset_id, attempt, %reason, "price fetch attempt failed");
                    last_reason = reason;
                }
            }
        }

        Err(SmaTraderError::PriceFetch {
            asset: asset_id.to_string(),
            reason: format!(
                "{last_reason} (after {} attempts)",
                self.retry_attempts
            ),
        })
    }
}
