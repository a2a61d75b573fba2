//! Configuration validation and typed config construction.
//!
//! Validates the `[simulation]` and `[api]` sections before a run starts.
//! Missing keys fall back to defaults. Present values that do not parse, or
//! parse to something out of range (including NaN and infinities), are errors.

use crate::domain::error::SmaTraderError;
use crate::domain::simulation::{
    SimulationConfig, ACCEPTED_POLLING_INTERVALS_MS, DEFAULT_ASSET_ID, DEFAULT_BUY_FRACTION,
    DEFAULT_INITIAL_BALANCE, DEFAULT_LONG_WINDOW, DEFAULT_POLLING_INTERVAL_MS,
    DEFAULT_SHORT_WINDOW, MAX_WINDOW_SIZE,
};
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_API_BASE_URL: &str = "https://api.coincap.io/v2";
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2_000;

/// Settings for the HTTP price source.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

pub fn validate_simulation_config(config: &dyn ConfigPort) -> Result<(), SmaTraderError> {
    validate_asset_id(config)?;
    validate_windows(config)?;
    validate_polling_interval(config)?;
    validate_initial_balance(config)?;
    validate_buy_fraction(config)?;
    Ok(())
}

pub fn validate_api_config(config: &dyn ConfigPort) -> Result<(), SmaTraderError> {
    if let Some(url) = config.get_string("api", "base_url") {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(invalid("api", "base_url", "base_url must be an http(s) URL"));
        }
    }
    let attempts = read_int(config, "api", "retry_attempts", DEFAULT_RETRY_ATTEMPTS as i64)?;
    if attempts < 1 || attempts > i64::from(u32::MAX) {
        return Err(invalid(
            "api",
            "retry_attempts",
            &format!("retry_attempts must be between 1 and {}", u32::MAX),
        ));
    }
    let delay = read_int(config, "api", "retry_delay_ms", DEFAULT_RETRY_DELAY_MS as i64)?;
    if delay < 0 {
        return Err(invalid(
            "api",
            "retry_delay_ms",
            "retry_delay_ms must be non-negative",
        ));
    }
    Ok(())
}

/// Builds the simulation config. Call after `validate_simulation_config`.
pub fn build_simulation_config(config: &dyn ConfigPort) -> SimulationConfig {
    SimulationConfig {
        asset_id: config
            .get_string("simulation", "asset_id")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_ASSET_ID.to_string()),
        short_window: config.get_int("simulation", "short_window", DEFAULT_SHORT_WINDOW as i64)
            as usize,
        long_window: config.get_int("simulation", "long_window", DEFAULT_LONG_WINDOW as i64)
            as usize,
        polling_interval_ms: config.get_int(
            "simulation",
            "polling_interval_ms",
            DEFAULT_POLLING_INTERVAL_MS as i64,
        ) as u64,
        initial_balance: config.get_double(
            "simulation",
            "initial_balance",
            DEFAULT_INITIAL_BALANCE,
        ),
        buy_fraction: config.get_double("simulation", "buy_fraction", DEFAULT_BUY_FRACTION),
    }
}

/// Builds the API config. Call after `validate_api_config`.
pub fn build_api_config(config: &dyn ConfigPort) -> ApiConfig {
    ApiConfig {
        base_url: config
            .get_string("api", "base_url")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        retry_attempts: config.get_int("api", "retry_attempts", DEFAULT_RETRY_ATTEMPTS as i64)
            as u32,
        retry_delay_ms: config.get_int("api", "retry_delay_ms", DEFAULT_RETRY_DELAY_MS as i64)
            as u64,
    }
}

/// Checks a polling interval against the accepted demo cadences.
pub fn validate_interval_ms(interval_ms: u64) -> Result<(), SmaTraderError> {
    if ACCEPTED_POLLING_INTERVALS_MS.contains(&interval_ms) {
        Ok(())
    } else {
        Err(invalid(
            "simulation",
            "polling_interval_ms",
            &format!(
                "polling_interval_ms must be one of {:?}",
                ACCEPTED_POLLING_INTERVALS_MS
            ),
        ))
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> SmaTraderError {
    SmaTraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_asset_id(config: &dyn ConfigPort) -> Result<(), SmaTraderError> {
    match config.get_string("simulation", "asset_id") {
        Some(s) if s.trim().is_empty() => Err(invalid(
            "simulation",
            "asset_id",
            "asset_id must not be empty",
        )),
        _ => Ok(()),
    }
}

/// Integer value of a key, or `default` when absent. A present value that
/// does not parse is an error rather than a silent fallback.
fn read_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, SmaTraderError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| invalid(section, key, &format!("{key} must be an integer, got {raw:?}"))),
    }
}

fn read_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, SmaTraderError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| invalid(section, key, &format!("{key} must be a number, got {raw:?}"))),
    }
}

fn validate_window(
    config: &dyn ConfigPort,
    key: &str,
    default: usize,
) -> Result<i64, SmaTraderError> {
    let value = read_int(config, "simulation", key, default as i64)?;
    if value < 1 || value > MAX_WINDOW_SIZE as i64 {
        return Err(invalid(
            "simulation",
            key,
            &format!("{key} must be between 1 and {MAX_WINDOW_SIZE}"),
        ));
    }
    Ok(value)
}

fn validate_windows(config: &dyn ConfigPort) -> Result<(), SmaTraderError> {
    let short = validate_window(config, "short_window", DEFAULT_SHORT_WINDOW)?;
    let long = validate_window(config, "long_window", DEFAULT_LONG_WINDOW)?;
    if short >= long {
        return Err(invalid(
            "simulation",
            "short_window",
            "short_window must be smaller than long_window",
        ));
    }
    Ok(())
}

fn validate_polling_interval(config: &dyn ConfigPort) -> Result<(), SmaTraderError> {
    let value = read_int(
        config,
        "simulation",
        "polling_interval_ms",
        DEFAULT_POLLING_INTERVAL_MS as i64,
    )?;
    match u64::try_from(value) {
        Ok(ms) => validate_interval_ms(ms),
        Err(_) => Err(invalid(
            "simulation",
            "polling_interval_ms",
            "polling_interval_ms must be positive",
        )),
    }
}

fn validate_initial_balance(config: &dyn ConfigPort) -> Result<(), SmaTraderError> {
    let value = read_double(config, "simulation", "initial_balance", DEFAULT_INITIAL_BALANCE)?;
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(
            "simulation",
            "initial_balance",
            "initial_balance must be a positive finite number",
        ));
    }
    Ok(())
}

fn validate_buy_fraction(config: &dyn ConfigPort) -> Result<(), SmaTraderError> {
    let value = read_double(config, "simulation", "buy_fraction", DEFAULT_BUY_FRACTION)?;
    // NaN fails both comparisons.
    if !(value > 0.0 && value <= 1.0) {
        return Err(invalid(
            "simulation",
            "buy_fraction",
            "buy_fraction must be in (0, 1]",
        ));
    }
    Ok(())
}
