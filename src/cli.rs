//! CLI definition and dispatch.

use chrono::{DateTime, TimeDelta, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::adapters::coincap_adapter::CoinCapAdapter;
use crate::adapters::csv_price_adapter::CsvPriceAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::thread_scheduler::ThreadScheduler;
use crate::domain::config_validation::{
    build_api_config, build_simulation_config, validate_api_config, validate_interval_ms,
    validate_simulation_config,
};
use crate::domain::controller::SimulationController;
use crate::domain::error::SmaTraderError;
use crate::domain::simulation::{is_tradeable_price, Simulation, SimulationConfig};
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::{ReportPort, SessionReport};

/// How often the live view polls the controller for new points.
const VIEW_REFRESH: Duration = Duration::from_millis(500);

#[derive(Parser, Debug)]
#[command(name = "smatrader", about = "SMA crossover paper-trading simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Poll live prices and paper-trade the SMA crossover
    Run {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        asset: Option<String>,
        #[arg(long)]
        interval_ms: Option<u64>,
        /// Stop after this many successful price samples
        #[arg(long)]
        ticks: Option<usize>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replay recorded prices from a CSV file
    Replay {
        #[arg(short, long)]
        prices: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        asset: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Run {
            config,
            asset,
            interval_ms,
            ticks,
            output,
        } => run_live(
            config.as_ref(),
            asset.as_deref(),
            interval_ms,
            ticks,
            output.as_ref(),
        ),
        Command::Replay {
            prices,
            config,
            asset,
            output,
        } => run_replay(&prices, config.as_ref(), asset.as_deref(), output.as_ref()),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Loads the INI file, or an empty config when no path is given.
pub fn load_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, SmaTraderError> {
    match path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            FileConfigAdapter::from_file(path)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

/// Validates the config and applies command-line overrides.
pub fn resolve_simulation_config(
    adapter: &dyn ConfigPort,
    asset_override: Option<&str>,
    interval_override: Option<u64>,
) -> Result<SimulationConfig, SmaTraderError> {
    validate_simulation_config(adapter)?;
    let mut config = build_simulation_config(adapter);

    if let Some(asset) = asset_override {
        let asset = asset.trim();
        if asset.is_empty() {
            return Err(SmaTraderError::ConfigInvalid {
                section: "simulation".into(),
                key: "asset_id".into(),
                reason: "asset_id must not be empty".into(),
            });
        }
        config.asset_id = asset.to_string();
    }
    if let Some(ms) = interval_override {
        validate_interval_ms(ms)?;
        config.polling_interval_ms = ms;
    }
    Ok(config)
}

pub fn session_report(controller: &SimulationController) -> SessionReport {
    SessionReport {
        asset_id: controller.config().asset_id.clone(),
        history: controller.history(),
        trades: controller.trades(),
        portfolio: controller.portfolio(None),
    }
}

/// Applies the recorded rows in order, each stamped with its recorded time.
///
/// Rows without a timestamp are placed one polling interval after the
/// previous row, starting at the Unix epoch, so a replay is reproducible.
/// Rows without a usable price are skipped, as a live session would skip a
/// failed fetch.
pub fn replay_session(
    config: SimulationConfig,
    prices: &CsvPriceAdapter,
) -> Result<SessionReport, SmaTraderError> {
    let mut simulation = Simulation::new(&config)?;
    let step = TimeDelta::milliseconds(config.polling_interval_ms as i64);

    let mut previous: Option<DateTime<Utc>> = None;
    let mut skipped = 0usize;
    for (row, recorded) in prices.rows().iter().enumerate() {
        let timestamp = recorded
            .timestamp
            .unwrap_or_else(|| previous.map_or(DateTime::UNIX_EPOCH, |ts| ts + step));
        previous = Some(timestamp);

        match recorded.price {
            Some(price) if is_tradeable_price(price) => {
                simulation.apply_price(price, timestamp);
            }
            _ => {
                tracing::warn!(row = row + 1, "replay row has no usable price");
                skipped += 1;
            }
        }
    }
    if skipped > 0 {
        eprintln!("warning: {skipped} of {} rows skipped", prices.len());
    }

    Ok(SessionReport {
        asset_id: config.asset_id,
        history: simulation.history().to_vec(),
        trades: simulation.trades().to_vec(),
        portfolio: simulation.portfolio(None),
    })
}

pub fn print_summary(report: &SessionReport, initial_balance: f64) {
    eprintln!("\n=== Trade Log ({}) ===", report.asset_id);
    if report.trades.is_empty() {
        eprintln!("  no trades");
    }
    for trade in &report.trades {
        eprintln!(
            "  {}  {:<4} {:>14.6} @ ${:>12.2} = ${:>12.2}",
            trade.timestamp.format("%Y-%m-%d %H:%M:%S"),
            trade.side,
            trade.quantity,
            trade.price,
            trade.total_value,
        );
    }

    let p = &report.portfolio;
    let change = if initial_balance > 0.0 {
        (p.total_value - initial_balance) / initial_balance * 100.0
    } else {
        0.0
    };
    eprintln!("\n=== Portfolio ===");
    eprintln!("Samples:          {}", report.history.len());
    if let Some(last) = report.history.last() {
        eprintln!("Last Price:       ${:.2}", last.price);
        eprintln!("Signal:           {}", last.signal);
    }
    eprintln!("Cash Balance:     ${:.2}", p.cash_balance);
    eprintln!("Holdings:         {:.6}", p.asset_quantity);
    eprintln!("Asset Value:      ${:.2}", p.asset_value);
    eprintln!("Total Value:      ${:.2}", p.total_value);
    eprintln!("Change:           {:+.2}%", change);
}

fn write_report(report: &SessionReport, output: Option<&PathBuf>) -> Result<(), SmaTraderError> {
    if let Some(dir) = output {
        CsvReportAdapter::new().write(report, dir)?;
        eprintln!("\nReport written to: {}", dir.display());
    }
    Ok(())
}

fn run_live(
    config_path: Option<&PathBuf>,
    asset: Option<&str>,
    interval_ms: Option<u64>,
    ticks: Option<usize>,
    output: Option<&PathBuf>,
) -> Result<(), SmaTraderError> {
    let adapter = load_config(config_path)?;
    let config = resolve_simulation_config(&adapter, asset, interval_ms)?;
    validate_api_config(&adapter)?;
    let api = build_api_config(&adapter);

    eprintln!(
        "Simulating {} (SMA {}/{}, every {}s, source {})",
        config.asset_id,
        config.short_window,
        config.long_window,
        config.polling_interval_ms / 1000,
        api.base_url,
    );

    let initial_balance = config.initial_balance;
    let prices = Arc::new(CoinCapAdapter::new(&api)?);
    let mut controller =
        SimulationController::new(config, prices, Box::new(ThreadScheduler::new()))?;

    if let Err(e) = controller.start() {
        eprintln!("warning: {e}; retrying on the next interval");
    }

    let mut shown = 0usize;
    loop {
        let history = controller.history();
        for point in history.iter().skip(shown) {
            eprintln!(
                "{}  ${:>12.2}  short {:>12.2}  long {:>12.2}  {}",
                point.timestamp.format("%H:%M:%S"),
                point.price,
                point.short_sma,
                point.long_sma,
                point.signal,
            );
        }
        shown = history.len();

        if ticks.is_some_and(|n| shown >= n) {
            break;
        }
        thread::sleep(VIEW_REFRESH);
    }
    controller.stop();

    let report = session_report(&controller);
    print_summary(&report, initial_balance);
    write_report(&report, output)
}

fn run_replay(
    prices_path: &Path,
    config_path: Option<&PathBuf>,
    asset: Option<&str>,
    output: Option<&PathBuf>,
) -> Result<(), SmaTraderError> {
    let adapter = load_config(config_path)?;
    let config = resolve_simulation_config(&adapter, asset, None)?;
    let initial_balance = config.initial_balance;

    eprintln!("Replaying prices from {}", prices_path.display());
    let prices = CsvPriceAdapter::from_file(prices_path)?;
    eprintln!("  {} rows", prices.len());

    let report = replay_session(config, &prices)?;
    print_summary(&report, initial_balance);
    write_report(&report, output)
}

fn run_validate(config_path: &PathBuf) -> Result<(), SmaTraderError> {
    let adapter = load_config(Some(config_path))?;
    let config = resolve_simulation_config(&adapter, None, None)?;
    validate_api_config(&adapter)?;
    let api = build_api_config(&adapter);

    eprintln!("Config validated successfully");
    eprintln!("  asset_id:            {}", config.asset_id);
    eprintln!("  short_window:        {}", config.short_window);
    eprintln!("  long_window:         {}", config.long_window);
    eprintln!("  polling_interval_ms: {}", config.polling_interval_ms);
    eprintln!("  initial_balance:     {:.2}", config.initial_balance);
    eprintln!("  buy_fraction:        {}", config.buy_fraction);
    eprintln!("  api base_url:        {}", api.base_url);
    eprintln!(
        "  api retries:         {} x {}ms",
        api.retry_attempts, api.retry_delay_ms
    );
    Ok(())
}
