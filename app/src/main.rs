// In app/src/main.rs

use anyhow::{Context, Result};
use app_config::Settings;
use clap::{Parser, Subcommand};
use engine::RunReport;
use events::TracingSink;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing_subscriber::prelude::*;

mod bar_feed;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "A volatility-breakout scalping engine.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs the strategy over a CSV file of bars against the simulated broker.
    Run {
        /// CSV with a `timestamp,open,high,low,close[,volume]` header.
        #[arg(short, long)]
        bars: PathBuf,

        /// TOML settings file. Environment variables (`SCALPER_...`) override it.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the final report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Loads and validates the settings, then exits.
    ValidateConfig {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

impl Commands {
    fn config_path(&self) -> Option<&Path> {
        match self {
            Commands::Run { config, .. } | Commands::ValidateConfig { config } => config.as_deref(),
        }
    }
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Settings decide the log level, so load them before tracing is up and
    // report any failure afterwards.
    let settings = app_config::load_settings(cli.command.config_path());
    let debug = settings.as_ref().map(|s| s.strategy().debug_logging()).unwrap_or(false);
    init_tracing(debug);
    let settings = settings.context("Failed to load settings")?;
    tracing::info!("Settings loaded.");

    match cli.command {
        Commands::Run { bars, json, .. } => {
            handle_run(settings, &bars, json).await?;
        }
        Commands::ValidateConfig { .. } => {
            println!("Configuration is valid.");
            println!("{:#?}", settings);
        }
    }

    Ok(())
}

fn init_tracing(debug: bool) {
    let level = if debug { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(
        tracing_subscriber::filter::Targets::new()
            .with_target("config", tracing::Level::WARN)
            .with_default(level),
    );
    tracing_subscriber::registry().with(fmt_layer).init();
}

// --- "Run" Subcommand Logic ---

async fn handle_run(settings: Settings, bars_path: &Path, json: bool) -> Result<()> {
    // --- 1. Open the Bar Feed ---
    let (feed, feed_status) = bar_feed::into_feed(bar_feed::CsvBars::open(bars_path)?);
    tracing::info!(path = %bars_path.display(), "Streaming bars.");

    // --- 2. Wire the Engine ---
    let mut runner = engine::simulated_runner(&settings, feed, Box::new(TracingSink))?;

    // --- 3. Graceful Shutdown on Ctrl-C ---
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Ctrl-C received. Finishing the current event and stopping.");
            let _ = shutdown_tx.send(true);
        }
    });

    // --- 4. Run and Report ---
    let report = runner.run(shutdown_rx).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if let Some(err) = feed_status.take_error() {
        return Err(err.context(format!("bar feed {} ended early", bars_path.display())));
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("--- Run Report ---");
    println!("Bars processed:   {}", report.bars_processed);
    println!("Orders submitted: {}", report.orders_submitted);
    println!("Trades closed:    {}", report.trades.len());
    println!("Net PnL:          {:.2}", report.net_pnl);
    println!("Final cash:       {:.2}", report.final_cash);
    println!("Final equity:     {:.2}", report.final_equity);
    if !report.position.is_flat() {
        println!(
            "Open position:    {} @ {:.2}",
            report.position.size, report.position.entry_price
        );
    }
    if report.halted {
        println!("Run was halted before the feed was exhausted.");
    }
}
