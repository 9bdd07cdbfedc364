//! WebSocket attachment: `/ws/{code}/{player_id}`.
//!
//! The socket is outbound-only for game state. A freshly attached
//! connection receives an authoritative snapshot (player list, and the
//! topic/phase when a game is running) so late attachments render
//! correctly; after that it sees events in enqueue order. Inbound frames
//! are limited to heartbeats and advisory typing hints; anything else is
//! rejected without touching game state.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;

use super::AppState;
use crate::protocol::{ClientFrame, ErrorCode, Phase, PlayerId, ServerEvent};
use crate::room::Room;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path((code, player_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Response {
    let room = match state.registry.get(&code) {
        Ok(room) => room,
        Err(err) => return err.into_response(),
    };
    let player = player_id.parse::<PlayerId>().ok();
    ws.on_upgrade(move |socket| handle_socket(socket, room, player))
}

async fn handle_socket(socket: WebSocket, room: Arc<Room>, player: Option<PlayerId>) {
    let (conn_id, mut rx) = room.hub.attach(player);
    tracing::debug!(
        room_code = %room.code,
        player = player.map(|p| p.to_string()).unwrap_or_else(|| "observer".into()),
        "WebSocket attached"
    );

    // Initial snapshot, assembled under the lock and queued before any
    // subsequent broadcast can be.
    {
        let st = room.lock().await;
        room.hub.send_to_connection(
            conn_id,
            ServerEvent::PlayerList {
                players: st.public_players(),
            },
        );
        if st.phase != Phase::Lobby {
            room.hub.send_to_connection(
                conn_id,
                ServerEvent::Topic {
                    topic: st.topic.clone(),
                    round: st.round,
                },
            );
            room.hub
                .send_to_connection(conn_id, ServerEvent::Phase { phase: st.phase });
        }
    }

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Outbound: drain the hub channel into the socket. A terminal event
    // closes the connection after delivery.
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Ok(text) = serde_json::to_string(&*event) else {
                continue;
            };
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
            if matches!(*event, ServerEvent::RoomTerminated { .. }) {
                let _ = ws_tx.close().await;
                break;
            }
        }
    });

    // Inbound: heartbeats and advisory typing hints only.
    let recv_room = Arc::clone(&room);
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_rx.next().await {
            let text = match msg {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };
            match serde_json::from_str::<ClientFrame>(text.as_str()) {
                Ok(ClientFrame::Ping) => {
                    recv_room.hub.send_to_connection(conn_id, ServerEvent::Pong);
                }
                Ok(ClientFrame::Typing { state }) => {
                    // Advisory only; relayed as-is when the sender has an
                    // identity, never recorded in game state.
                    if let Some(player) = player {
                        recv_room
                            .hub
                            .broadcast(ServerEvent::Typing { player, state });
                    }
                }
                Err(err) => {
                    tracing::debug!(
                        room_code = %recv_room.code,
                        error = %err,
                        "Rejected client WebSocket frame"
                    );
                    recv_room.hub.send_to_connection(
                        conn_id,
                        ServerEvent::Error {
                            message: "unsupported frame; use the REST API for game actions"
                                .to_string(),
                            code: ErrorCode::InvalidArgument,
                        },
                    );
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    room.hub.detach(conn_id);
    tracing::debug!(room_code = %room.code, connection_id = conn_id, "WebSocket detached");
}
