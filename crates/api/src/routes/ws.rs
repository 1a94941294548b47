use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use common::ScanSnapshot;

use crate::AppState;

pub fn ws_router() -> Router<AppState> {
    Router::new().route("/ws/results", get(ws_results_handler))
}

/// WebSocket endpoint that pushes every completed scan pass to the dashboard.
async fn ws_results_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    // Subscribe before reading the latest so no pass slips between the two.
    let snapshot_rx = state.scanner.subscribe();
    let latest = state.scanner.latest().await;
    ws.on_upgrade(move |socket| handle_ws(socket, latest, snapshot_rx))
}

async fn handle_ws(
    mut socket: WebSocket,
    latest: Option<Arc<ScanSnapshot>>,
    mut snapshot_rx: broadcast::Receiver<Arc<ScanSnapshot>>,
) {
    // Send the current pass first so the client renders immediately
    if let Some(snapshot) = latest {
        if send_snapshot(&mut socket, &snapshot).await.is_err() {
            return;
        }
    }

    // Then stream new passes
    loop {
        match snapshot_rx.recv().await {
            Ok(snapshot) => {
                if send_snapshot(&mut socket, &snapshot).await.is_err() {
                    debug!("WebSocket client disconnected");
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(dropped = n, "WebSocket results client lagged");
            }
            Err(broadcast::error::RecvError::Closed) => {
                break;
            }
        }
    }
}

async fn send_snapshot(socket: &mut WebSocket, snapshot: &ScanSnapshot) -> Result<(), ()> {
    let text = serde_json::to_string(snapshot).map_err(|e| {
        warn!(error = %e, "Failed to serialize scan snapshot");
    })?;
    socket.send(Message::Text(text)).await.map_err(|_| ())
}
