use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use api::AppState;
use common::{Config, DataMode, MarketDataSource};
use engine::{BinanceClient, Orchestrator, Scanner};
use replay::ReplaySource;
use strategy::ScannerFileConfig;

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env().unwrap_or_else(|e| panic!("{e}"));
    let scanner_cfg = ScannerFileConfig::load(&cfg.scanner_config_path)
        .unwrap_or_else(|e| panic!("{e}"));
    info!(
        mode = %cfg.data_mode,
        instruments = scanner_cfg.instruments.len(),
        higher = %scanner_cfg.higher_timeframe,
        lower = %scanner_cfg.lower_timeframe,
        "Scanner starting"
    );

    // ── Market data (injected based on DATA_MODE) ─────────────────────────────
    let source: Arc<dyn MarketDataSource> = match cfg.data_mode {
        DataMode::Live => {
            info!(base_url = %cfg.binance_base_url, "Live mode, using BinanceClient");
            Arc::new(
                BinanceClient::new(&cfg.binance_base_url, cfg.http_timeout)
                    .unwrap_or_else(|e| panic!("{e}")),
            )
        }
        DataMode::Replay => {
            info!(dir = %cfg.replay_dir, "Replay mode, using ReplaySource");
            Arc::new(
                ReplaySource::load_dir(&cfg.replay_dir)
                    .unwrap_or_else(|e| panic!("Failed to load replay data: {e}")),
            )
        }
    };

    // ── Scanner ───────────────────────────────────────────────────────────────
    let refresh = scanner_cfg.refresh_interval();
    let orchestrator = Orchestrator::new(source, scanner_cfg);
    let (scanner, handle) = Scanner::new(orchestrator, refresh);

    // ── Dashboard ─────────────────────────────────────────────────────────────
    let api_state = AppState {
        scanner: handle,
        refresh_secs: refresh.as_secs(),
    };
    let port = cfg.dashboard_port;

    // ── Spawn all tasks ───────────────────────────────────────────────────────
    tokio::spawn(scanner.run());
    tokio::spawn(async move {
        if let Err(e) = api::serve(api_state, port).await {
            error!(error = %e, "Dashboard server stopped");
        }
    });

    info!("All subsystems started. Waiting for shutdown signal.");
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received. Exiting.");
}
