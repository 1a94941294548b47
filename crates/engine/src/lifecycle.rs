use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use common::ScanSnapshot;

use crate::orchestrator::Orchestrator;

/// Cloneable handle passed to the presentation layer.
#[derive(Clone)]
pub struct ScannerHandle {
    latest: Arc<RwLock<Option<Arc<ScanSnapshot>>>>,
    snapshot_tx: broadcast::Sender<Arc<ScanSnapshot>>,
    instruments: usize,
}

impl ScannerHandle {
    /// The most recent completed pass, if any.
    pub async fn latest(&self) -> Option<Arc<ScanSnapshot>> {
        self.latest.read().await.clone()
    }

    /// Subscribe to snapshots as passes complete.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<ScanSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Number of configured instruments.
    pub fn instruments(&self) -> usize {
        self.instruments
    }
}

/// Periodic driver: runs one scan pass per refresh interval.
pub struct Scanner {
    orchestrator: Orchestrator,
    refresh: Duration,
    latest: Arc<RwLock<Option<Arc<ScanSnapshot>>>>,
    snapshot_tx: broadcast::Sender<Arc<ScanSnapshot>>,
}

impl Scanner {
    pub fn new(orchestrator: Orchestrator, refresh: Duration) -> (Self, ScannerHandle) {
        let (snapshot_tx, _) = broadcast::channel(16);
        let latest = Arc::new(RwLock::new(None));

        let handle = ScannerHandle {
            latest: latest.clone(),
            snapshot_tx: snapshot_tx.clone(),
            instruments: orchestrator.config().instruments.len(),
        };

        let scanner = Scanner {
            orchestrator,
            refresh,
            latest,
            snapshot_tx,
        };

        (scanner, handle)
    }

    /// Run one pass and publish it, replacing the previous snapshot.
    pub async fn run_once(&self) -> Arc<ScanSnapshot> {
        let snapshot = Arc::new(self.orchestrator.run_pass().await);
        *self.latest.write().await = Some(snapshot.clone());
        // No subscribers is fine; the latest slot still holds the pass.
        let _ = self.snapshot_tx.send(snapshot.clone());
        snapshot
    }

    /// Run forever: one pass immediately, then one per refresh interval.
    /// Call from `tokio::spawn`.
    pub async fn run(self) {
        info!(
            refresh_secs = self.refresh.as_secs(),
            instruments = self.orchestrator.config().instruments.len(),
            "Scanner running"
        );

        let mut ticker = tokio::time::interval(self.refresh);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let snapshot = self.run_once().await;
            if snapshot.results.is_empty() {
                warn!("Scan pass produced no results");
            }
        }
    }
}
