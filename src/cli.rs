//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::adapters::console_alert_adapter::ConsoleAlert;
use crate::adapters::csv_adapter::{CsvLedger, DEFAULT_LEDGER_FILE};
use crate::adapters::file_config_adapter::{FileConfigAdapter, ENV_PREFIX};
use crate::adapters::json_state_adapter::{JsonStateStore, DEFAULT_STATE_FILE};
use crate::domain::config_validation::{
    validate_strategy_config, validate_trader_config, DEFAULT_ASSET, DEFAULT_LOOKBACK_MINUTES,
    DEFAULT_POLL_INTERVAL_SECS,
};
use crate::domain::error::BotError;
use crate::domain::execution::{
    ExecutionParams, DEFAULT_FEE_RATE, DEFAULT_RSI_ENTRY, DEFAULT_STOP_LOSS_PCT,
};
use crate::domain::indicator::{
    IndicatorConfig, DEFAULT_BAND_WIDTH, DEFAULT_RSI_PERIOD, DEFAULT_SMA_PERIOD,
};
use crate::domain::position::{Phase, PositionState, DEFAULT_STARTING_CASH};
use crate::domain::trader::{self, CycleOutcome, Trader, TraderConfig};
use crate::ports::config_port::ConfigPort;
use crate::ports::state_port::{LoadedState, StatePort};

pub const DEFAULT_LOG_FILTER: &str = "bandtrader=info";

#[derive(Parser, Debug)]
#[command(name = "bandtrader", about = "Bollinger/RSI paper trader")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Poll prices and trade on every interval
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Stop after this many cycles
        #[arg(long)]
        cycles: Option<u64>,
    },
    /// Run exactly one cycle and exit
    Step {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the persisted position
    Status {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run { config, cycles } => run_trader(&config, cycles),
        Command::Step { config } => run_step(&config),
        Command::Status { config } => run_status(&config),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path)
        .map(|adapter| adapter.with_env_overrides(ENV_PREFIX))
        .map_err(|e| {
            let err = BotError::ConfigParse {
                file: path.display().to_string(),
                reason: e.to_string(),
            };
            eprintln!("error: {err}");
            ExitCode::from(&err)
        })
}

/// Build the trader settings from `[trader]`, `[indicators]` and `[strategy]`.
///
/// Values are validated first; absent keys take their defaults.
pub fn build_trader_config(adapter: &dyn ConfigPort) -> Result<TraderConfig, BotError> {
    validate_trader_config(adapter)?;
    validate_strategy_config(adapter)?;

    let asset = adapter
        .get_string("trader", "asset")
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| DEFAULT_ASSET.to_string());
    let poll_secs = adapter.get_int("trader", "poll_interval_secs", DEFAULT_POLL_INTERVAL_SECS);
    let lookback_minutes = adapter.get_int("trader", "lookback_minutes", DEFAULT_LOOKBACK_MINUTES);

    Ok(TraderConfig {
        asset,
        starting_cash: adapter.get_double("trader", "starting_cash", DEFAULT_STARTING_CASH),
        poll_interval: Duration::from_secs(poll_secs as u64),
        lookback: chrono::Duration::minutes(lookback_minutes),
        indicators: IndicatorConfig {
            sma_period: adapter.get_int("indicators", "sma_period", DEFAULT_SMA_PERIOD as i64)
                as usize,
            rsi_period: adapter.get_int("indicators", "rsi_period", DEFAULT_RSI_PERIOD as i64)
                as usize,
            band_width: adapter.get_double("indicators", "band_width", DEFAULT_BAND_WIDTH),
        },
        execution: ExecutionParams {
            rsi_entry: adapter.get_double("strategy", "rsi_entry", DEFAULT_RSI_ENTRY),
            stop_loss_pct: adapter.get_double("strategy", "stop_loss_pct", DEFAULT_STOP_LOSS_PCT),
            fee_rate: adapter.get_double("strategy", "fee_rate", DEFAULT_FEE_RATE),
        },
    })
}

pub fn state_file(adapter: &dyn ConfigPort) -> PathBuf {
    adapter
        .get_string("paths", "state_file")
        .unwrap_or_else(|| DEFAULT_STATE_FILE.to_string())
        .into()
}

pub fn ledger_file(adapter: &dyn ConfigPort) -> PathBuf {
    adapter
        .get_string("paths", "ledger_file")
        .unwrap_or_else(|| DEFAULT_LEDGER_FILE.to_string())
        .into()
}

/// `RUST_LOG` wins over `[logging] filter`.
pub fn log_filter(adapter: &dyn ConfigPort) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = adapter
            .get_string("logging", "filter")
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        EnvFilter::try_new(&directive).unwrap_or_else(|e| {
            eprintln!("warning: bad [logging] filter {directive:?}: {e}");
            EnvFilter::new(DEFAULT_LOG_FILTER)
        })
    })
}

fn init_logging(adapter: &dyn ConfigPort) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter(adapter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn prepare(config_path: &Path) -> Result<(FileConfigAdapter, TraderConfig), ExitCode> {
    let adapter = load_config(config_path)?;
    init_logging(&adapter);
    let trader_config = build_trader_config(&adapter).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    Ok((adapter, trader_config))
}

/// Wire the adapters and hand a started trader to `body`.
fn with_trader<F>(config_path: &Path, body: F) -> ExitCode
where
    F: FnOnce(&mut Trader<'_>) -> ExitCode,
{
    let (adapter, trader_config) = match prepare(config_path) {
        Ok(p) => p,
        Err(code) => return code,
    };

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqlitePriceStore;

        let prices = match SqlitePriceStore::from_config(&adapter) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        let store = JsonStateStore::new(
            state_file(&adapter),
            PositionState::new(trader_config.starting_cash),
        );
        let ledger = CsvLedger::new(ledger_file(&adapter));
        let alerts = match ConsoleAlert::spawn(adapter.get_bool("alert", "bell", true)) {
            Ok(a) => a,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        tracing::info!(
            asset = %trader_config.asset,
            state = %store.path().display(),
            ledger = %ledger.path().display(),
            "starting trader"
        );
        let mut trader = match Trader::start(trader_config, &prices, &store, &ledger, &alerts) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        body(&mut trader)
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (adapter, trader_config, body);
        eprintln!("error: sqlite feature is required for the price store");
        ExitCode::FAILURE
    }
}

fn run_trader(config_path: &Path, cycles: Option<u64>) -> ExitCode {
    with_trader(config_path, |trader| {
        let ran = trader::run_loop(trader, cycles);
        tracing::info!(cycles = ran, "trader stopped");
        ExitCode::SUCCESS
    })
}

fn run_step(config_path: &Path) -> ExitCode {
    with_trader(config_path, |trader| match trader.run_cycle() {
        Ok(CycleOutcome::Traded { event, .. }) => {
            println!(
                "{} @ {:.2} qty {:.6} pnl {:+.2}%",
                event.kind, event.price, event.quantity, event.realized_pnl_pct
            );
            ExitCode::SUCCESS
        }
        Ok(CycleOutcome::Hold(snapshot)) => {
            println!(
                "HOLD price {:.2} rsi {:.2} bands [{:.2}, {:.2}]",
                snapshot.current_price, snapshot.rsi, snapshot.lower_band, snapshot.upper_band
            );
            ExitCode::SUCCESS
        }
        Ok(CycleOutcome::NoSignal { have, need }) => {
            println!("NO SIGNAL: {have} of {need} prices");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    })
}

fn run_status(config_path: &Path) -> ExitCode {
    let (adapter, trader_config) = match prepare(config_path) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let store = JsonStateStore::new(
        state_file(&adapter),
        PositionState::new(trader_config.starting_cash),
    );

    let loaded = match store.load() {
        Ok(l) => l,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let source = match &loaded {
        LoadedState::Fresh(_) => "no saved state".to_string(),
        LoadedState::Restored(_) => store.path().display().to_string(),
        LoadedState::Recovered { error, .. } => format!("unreadable, reset ({error})"),
    };
    println!("{}", format_status(&trader_config.asset, &loaded.state(), &source));
    ExitCode::SUCCESS
}

pub fn format_status(asset: &str, state: &PositionState, source: &str) -> String {
    let position = match state.phase() {
        Phase::Flat => "FLAT".to_string(),
        Phase::Long => format!(
            "LONG {:.6} {} @ ${:.2}",
            state.asset_quantity, asset, state.entry_price
        ),
    };
    format!(
        "State: {source}\nPosition: {position}\nCash: ${:.2}",
        state.cash_balance
    )
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match build_trader_config(&adapter) {
        Ok(cfg) => {
            println!("Configuration is valid");
            println!("  Asset: {}", cfg.asset);
            println!("  Starting cash: {:.2}", cfg.starting_cash);
            println!(
                "  Poll interval: {}s, lookback: {}m",
                cfg.poll_interval.as_secs(),
                cfg.lookback.num_minutes()
            );
            println!(
                "  SMA {} / RSI {} / bands x{}",
                cfg.indicators.sma_period, cfg.indicators.rsi_period, cfg.indicators.band_width
            );
            println!(
                "  Entry RSI < {}, stop-loss {}%, fee {}",
                cfg.execution.rsi_entry, cfg.execution.stop_loss_pct, cfg.execution.fee_rate
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
