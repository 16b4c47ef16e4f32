//! WebSocket transport: upgrade, per-connection pump, and teardown
//!
//! Each connection gets an unbounded outbound channel drained by a dedicated
//! forward task, so handlers and broadcasts never block on a slow socket.
//! The receive loop races inbound frames against the connection's
//! cancellation token; a kick cancels the token and the loop tears down the
//! same way a client-initiated close does.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use plaza_domain::Presence;
use plaza_protocol::ServerMessage;

use crate::connections::ConnectionId;
use crate::dispatch;
use crate::state::AppState;

/// Build the engine's router; also used directly by end-to-end tests.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let cancel = CancellationToken::new();

    let connection_id = ConnectionId::new();
    state
        .connections
        .register(connection_id, tx, cancel.clone())
        .await;
    tracing::info!(connection_id = %connection_id, "WebSocket connected");

    // Drain the outbound channel onto the socket until it closes
    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            match serde_json::to_string(&message) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::error!(%err, "Failed to serialize outbound message");
                }
            }
        }
        let _ = ws_sender.close().await;
    });

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(connection_id = %connection_id, "Connection cancelled");
                break;
            }
            frame = ws_receiver.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        dispatch::handle_frame(&state, connection_id, &text).await;
                    }
                    Some(Ok(Message::Ping(_))) => {
                        // Transport pong is automatic; echo an application-level
                        // heartbeat for clients that watch for it
                        state.connections.send_to(connection_id, ServerMessage::Pong).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        tracing::debug!(connection_id = %connection_id, %err, "WebSocket error");
                        break;
                    }
                }
            }
        }
    }

    // Teardown: drop registry state, tell the room, persist the departure
    if let Some(info) = state.connections.unregister(connection_id).await {
        if let (Some(room), Some(user_id), Some(username)) =
            (info.room, info.user_id, info.username)
        {
            state
                .connections
                .broadcast(
                    &room.name,
                    ServerMessage::UserDisconnected {
                        room: room.name.clone(),
                        username,
                    },
                    None,
                )
                .await;
            if let Err(err) = state
                .persist(state.gateway.set_presence(room.id, user_id, Presence::Leave))
                .await
            {
                tracing::warn!(%err, room = %room.name, "Failed to persist presence removal");
            }
        }
        drop(info.sender);
    }

    // Channel senders are gone; let the forward task flush and finish
    let _ = send_task.await;
    tracing::info!(connection_id = %connection_id, "WebSocket disconnected");
}
