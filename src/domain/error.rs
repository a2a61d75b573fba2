//! Domain error types.

/// Top-level error type for smatrader.
#[derive(Debug, thiserror::Error)]
pub enum SmaTraderError {
    #[error("price fetch failed for {asset}: {reason}")]
    PriceFetch { asset: String, reason: String },

    #[error("initial price fetch failed for {asset}: {reason}")]
    StartupFetch { asset: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(
        "invalid {name} window size {size}: must be between 1 and {max}",
        max = crate::domain::simulation::MAX_WINDOW_SIZE
    )]
    InvalidWindow { name: String, size: usize },

    #[error("price replay error: {reason}")]
    ReplayParse { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SmaTraderError {
    /// Re-tags a tick-scoped fetch failure as one raised from `start()`.
    pub fn into_startup(self) -> Self {
        match self {
            SmaTraderError::PriceFetch { asset, reason } => {
                SmaTraderError::StartupFetch { asset, reason }
            }
            other => other,
        }
    }
}

impl From<&SmaTraderError> for std::process::ExitCode {
    fn from(err: &SmaTraderError) -> Self {
        let code: u8 = match err {
            SmaTraderError::Io(_)
            | SmaTraderError::ReplayParse { .. }
            | SmaTraderError::Report { .. } => 1,
            SmaTraderError::ConfigParse { .. }
            | SmaTraderError::ConfigInvalid { .. }
            | SmaTraderError::InvalidWindow { .. } => 2,
            SmaTraderError::PriceFetch { .. } | SmaTraderError::StartupFetch { .. } => 3,
        };
        std::process::ExitCode::from(code)
    }
}
