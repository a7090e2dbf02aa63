//! TrendSniper CLI: live signal loop, CSV backtest, and config commands.
//!
//! Commands:
//! - `run`: tick every configured instrument on an interval until Ctrl-C
//! - `backtest`: analyze a CSV file, print the last signals and a trade summary
//! - `config`: print the default TOML configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use trendsniper_core::backtest::{simulate_trades, BacktestSummary};
use trendsniper_core::lifecycle::{HistoryOrder, TradeEvent};
use trendsniper_core::signals::analyze;
use trendsniper_runner::source::load_csv_candles;
use trendsniper_runner::{
    CandleSource, CsvCandleSource, DemoCandleSource, Engine, EngineConfig, EventSink, FanoutSink,
    TracingSink,
};

#[derive(Parser)]
#[command(
    name = "trendsniper",
    about = "TrendSniper: ATR trend and sniper-entry signal engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceKind {
    /// Seeded random-walk candles.
    Demo,
    /// `{data_dir}/{instrument}_{timeframe}.csv` files.
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live tick loop.
    Run {
        /// Path to a TOML config file. Defaults to the built-in config.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Where candles come from.
        #[arg(long, value_enum, default_value_t = SourceKind::Demo)]
        source: SourceKind,

        /// Directory of CSV files (with `--source csv`).
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Demo generator seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Stop after this many ticks instead of waiting for Ctrl-C.
        #[arg(long)]
        ticks: Option<u64>,

        /// Also print every event to stdout as a JSON line.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Replay a CSV file through the indicators and the batch trade simulator.
    Backtest {
        /// CSV with `time,open,high,low,close[,volume]` columns.
        #[arg(default_value = "data.csv")]
        csv: PathBuf,

        /// TOML config supplying indicator parameters.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Take-profit distance in ATRs.
        #[arg(long, default_value_t = 1.0)]
        tp_multiplier: f64,

        /// Number of trailing signals to print.
        #[arg(long, default_value_t = 10)]
        last: usize,
    },
    /// Print the default configuration as TOML.
    Config,
}

/// Writes each event as one JSON line on stdout.
struct JsonLinesSink;

impl EventSink for JsonLinesSink {
    fn emit(&self, event: &TradeEvent) {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!(error = %e, "event not serializable"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trendsniper=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            source,
            data_dir,
            seed,
            ticks,
            json,
        } => run_live(config.as_deref(), source, data_dir, seed, ticks, json).await,
        Commands::Backtest {
            csv,
            config,
            tp_multiplier,
            last,
        } => run_backtest(&csv, config.as_deref(), tp_multiplier, last),
        Commands::Config => {
            print!("{}", EngineConfig::default().to_toml()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

async fn run_live(
    config_path: Option<&Path>,
    source_kind: SourceKind,
    data_dir: PathBuf,
    seed: u64,
    ticks: Option<u64>,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;

    let source: Arc<dyn CandleSource> = match source_kind {
        SourceKind::Demo => Arc::new(
            DemoCandleSource::new(seed, chrono::Utc::now()).with_backfill(config.candle_limit),
        ),
        SourceKind::Csv => Arc::new(CsvCandleSource::new(data_dir)),
    };

    let mut sink = FanoutSink::new().with(Arc::new(TracingSink));
    if json {
        sink = sink.with(Arc::new(JsonLinesSink));
    }

    let engine = Engine::new(config, source, Arc::new(sink)).context("building engine")?;

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            // No signal handler available: run until the tick limit.
            std::future::pending::<()>().await;
        }
    };
    let stats = engine.run(shutdown, ticks).await;
    info!(ticks = stats.ticks, events = stats.events, "run finished");

    let registry = engine.registry();
    let mut report = serde_json::Map::new();
    for id in registry.instruments() {
        let open = registry.open_positions(&id).await.unwrap_or_default();
        let history = registry
            .history(&id, HistoryOrder::OldestFirst)
            .await
            .unwrap_or_default();
        report.insert(
            id.to_string(),
            serde_json::json!({ "open": open, "history": history }),
        );
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_backtest(csv: &Path, config_path: Option<&Path>, tp_multiplier: f64, last: usize) -> Result<()> {
    let config = load_config(config_path)?;
    let candles =
        load_csv_candles(csv).with_context(|| format!("reading candles from {}", csv.display()))?;
    let analysis = analyze(&candles, &config.indicator).context("analyzing candles")?;

    println!("Last {last} signals:");
    let start = analysis.signals.len().saturating_sub(last);
    for signal in analysis.signals[start..].iter().flatten() {
        println!(
            "  {}  close {:>12.4}  trend {}  buy {:<5}  sell {:<5}  sniper_buy {:<5}  sniper_sell {:<5}",
            signal.timestamp.to_rfc3339(),
            signal.price,
            signal.trend,
            signal.buy_signal,
            signal.sell_signal,
            signal.sniper_buy,
            signal.sniper_sell,
        );
    }

    let trades = simulate_trades(&analysis.signals, &analysis.atr, tp_multiplier);
    let summary = BacktestSummary::from_trades(&trades);
    println!();
    println!("Candles:   {}", candles.len());
    println!("Flips:     {}", analysis.flips().count());
    println!("Trades:    {}", summary.trades);
    println!("Winners:   {}", summary.winners);
    println!("Losers:    {}", summary.losers);
    println!("Win rate:  {:.1}%", summary.win_rate * 100.0);
    println!("Total P/L: {:.4}", summary.total_pnl);
    Ok(())
}
