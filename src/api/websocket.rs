use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::api::types::ErrorResponse;
use crate::domain::StatusSnapshot;

#[derive(Deserialize)]
pub struct WsParams {
    pub order_id: Option<Uuid>,
}

/// WebSocket handler — one connection watches one order via
/// `?order_id=<uuid>`.
pub async fn order_status_ws(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params.order_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, order_id: Option<Uuid>) {
    let (mut sender, mut receiver) = socket.split();

    let Some(order_id) = order_id else {
        let _ = send_error(&mut sender, "order_id query param required").await;
        let _ = sender.close().await;
        return;
    };

    // Register before reading any snapshot so no transition is missed; the
    // cached/store snapshot is only a catch-up message, live updates keep
    // flowing until the order is terminal.
    let mut subscription = state.fanout.register(order_id);

    let catch_up = match state.cache.get(order_id) {
        Some(snapshot) => Some(snapshot),
        None => match state.store.find_order(order_id).await {
            Ok(Some(order)) => Some(StatusSnapshot::from_order(&order)),
            Ok(None) => {
                let _ = send_error(&mut sender, "order not found").await;
                state.fanout.unregister(order_id, subscription.id);
                let _ = sender.close().await;
                return;
            }
            Err(e) => {
                // Live updates still work without the catch-up message
                warn!(%order_id, error = %e, "Could not load catch-up status");
                None
            }
        },
    };

    let mut terminal_delivered = false;
    if let Some(snapshot) = catch_up {
        terminal_delivered = snapshot.status.is_terminal();
        if send_snapshot(&mut sender, &snapshot).await.is_err() {
            state.fanout.unregister(order_id, subscription.id);
            return;
        }
    }

    info!(%order_id, subscriber = subscription.id, "Status subscription opened");

    while !terminal_delivered {
        tokio::select! {
            update = subscription.rx.recv() => {
                match update {
                    Some(snapshot) => {
                        let terminal = snapshot.status.is_terminal();
                        if send_snapshot(&mut sender, &snapshot).await.is_err() {
                            break;
                        }
                        if terminal {
                            terminal_delivered = true;
                        }
                    }
                    // Worker released the order's registrations
                    None => break,
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                        debug!(%order_id, "Client disconnected");
                        break;
                    }
                    // Ping/pong handled by axum
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.fanout.unregister(order_id, subscription.id);
    let _ = sender.close().await;
    info!(%order_id, "Status subscription closed");
}

async fn send_snapshot(
    sender: &mut (impl SinkExt<Message> + Unpin),
    snapshot: &StatusSnapshot,
) -> Result<(), ()> {
    let json = match serde_json::to_string(snapshot) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "Failed to serialize status snapshot");
            return Ok(());
        }
    };
    sender.send(Message::Text(json)).await.map_err(|_| ())
}

async fn send_error(
    sender: &mut (impl SinkExt<Message> + Unpin),
    message: &str,
) -> Result<(), ()> {
    let json = serde_json::to_string(&ErrorResponse::new(message)).unwrap_or_default();
    sender.send(Message::Text(json)).await.map_err(|_| ())
}
