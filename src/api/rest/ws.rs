use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use tokio::time::timeout;
use tokio_stream::wrappers::WatchStream;
use tracing::{info, warn};

use crate::models::live::DriverLocationsMessage;
use crate::state::AppState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Seed the connection with the current snapshot; a new viewer must not
    // wait for the next registry change.
    let initial =
        DriverLocationsMessage::new(&state.registry.live_snapshot(state.freshness_window));
    let (viewer_id, rx) = state.hub.connect(initial);
    state.metrics.connected_viewers.inc();

    info!(viewer_id = %viewer_id, "viewer connected");

    let send_timeout = state.ws_send_timeout;
    let send_task = tokio::spawn(async move {
        let mut snapshots = WatchStream::new(rx);

        while let Some(message) = snapshots.next().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize snapshot for ws");
                    continue;
                }
            };

            match timeout(send_timeout, sender.send(Message::Text(json.into()))).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => break,
                Err(_) => {
                    warn!("viewer send timed out, dropping connection");
                    break;
                }
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    state.hub.disconnect(&viewer_id);
    state.metrics.connected_viewers.dec();

    info!(viewer_id = %viewer_id, "viewer disconnected");
}
