use clap::Parser;
use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use chain_monitor::cli::Cli;
use chain_monitor::client::RpcClient;
use chain_monitor::config::MonitorConfig;
use chain_monitor::history::HistoryTracker;
use chain_monitor::monitor::{load_initial_state, spawn_fetch_loop, BlockScheduler};
use chain_monitor::tui::{self, Dashboard};

/// Log to a file; the dashboard owns stdout.
fn init_logging(config: &MonitorConfig) -> std::io::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;
    init_logging(&config)?;

    info!("Consumer RPC: {}", config.consumer_rpc_url);
    if let Some(provider) = &config.provider_rest_url {
        info!("Provider REST: {}", provider);
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let client = Arc::new(RpcClient::new(&config)?);

    println!("initializing...");
    let initial = runtime
        .block_on(load_initial_state(client.as_ref(), config.reconciliation_enabled()))
        .map_err(|e| {
            error!("Startup failed: {}", e);
            e
        })?;

    let history = HistoryTracker::new(
        initial.validators.iter().map(|v| v.address_hex.clone()),
        config.history_capacity,
    );
    let scheduler = BlockScheduler::new(config.scheduler.clone());
    let dashboard = Dashboard::new(initial.chain_id, initial.validators, history, scheduler.pacing());

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    {
        let _context = runtime.enter();
        let _fetcher = spawn_fetch_loop(client, scheduler, events_tx);
    }

    let result = tui::run(dashboard, events_rx, config.input_tick());

    // In-flight requests are abandoned on quit
    runtime.shutdown_background();
    if let Err(e) = &result {
        error!("Dashboard stopped: {}", e);
    }
    Ok(result?)
}
