//! Public API surface: REST verbs plus the WebSocket event stream.
//!
//! REST is the authoritative mutation path; the socket only ever carries
//! server events outward plus advisory heartbeats and typing hints inward.

pub mod payloads;
pub mod ws;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;

use crate::config::Config;
use crate::error::GameError;
use crate::game::GameSnapshot;
use crate::room::RoomRegistry;
use payloads::{
    CastVoteRequest, CreateRoomRequest, CreateRoomResponse, JoinRoomResponse, LeaveRoomRequest,
    LeaveRoomResponse, ListQuery, ListRoomsResponse, PostMessageRequest, RoomInfoResponse,
    StateQuery, SuccessResponse,
};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
    pub config: Arc<Config>,
}

/// Build the application router.
pub fn create_router(registry: Arc<RoomRegistry>, config: Arc<Config>) -> Router {
    let state = AppState { registry, config };
    Router::new()
        .route("/health", get(health))
        .route("/config", get(effective_config))
        .route("/api/rooms/create", post(create_room))
        .route("/api/rooms/list", get(list_rooms))
        .route("/api/rooms/{code}/info", get(room_info))
        .route("/api/rooms/{code}/join", post(join_room))
        .route("/api/rooms/{code}/leave", post(leave_room))
        .route("/api/rooms/{code}/message", post(post_message))
        .route("/api/rooms/{code}/vote", post(cast_vote))
        .route("/api/rooms/{code}/state", get(room_state))
        .route("/ws/{code}/{player_id}", get(ws::websocket_handler))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

/// Effective non-secret configuration.
async fn effective_config(State(state): State<AppState>) -> Json<Config> {
    Json(state.config.redacted())
}

async fn create_room(
    State(state): State<AppState>,
    Json(body): Json<CreateRoomRequest>,
) -> Result<Json<CreateRoomResponse>, GameError> {
    let room = state
        .registry
        .create(body.room_name, body.max_humans, body.total_players)?;
    Ok(Json(CreateRoomResponse {
        room_code: room.code.clone(),
        room_name: room.name.clone(),
        max_humans: room.max_humans,
        total_players: room.total_players,
    }))
}

async fn list_rooms(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<ListRoomsResponse> {
    let (rooms, total_pages) = state
        .registry
        .list_waiting(query.page.unwrap_or(1), query.per_page)
        .await;
    Json(ListRoomsResponse { rooms, total_pages })
}

async fn room_info(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Json<RoomInfoResponse> {
    let info = state.registry.info(&code).await;
    Json(RoomInfoResponse {
        exists: info.is_some(),
        info,
    })
}

async fn join_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<JoinRoomResponse>, GameError> {
    let result = state.registry.join(&code).await?;
    Ok(Json(JoinRoomResponse {
        success: true,
        player_id: result.player_id,
        can_start: result.can_start,
        current_humans: result.current_humans,
        max_humans: result.max_humans,
    }))
}

async fn leave_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(body): Json<LeaveRoomRequest>,
) -> Result<Json<LeaveRoomResponse>, GameError> {
    let action = state.registry.leave(&code, body.player_id).await?;
    Ok(Json(LeaveRoomResponse { action }))
}

async fn post_message(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(body): Json<PostMessageRequest>,
) -> Result<Json<SuccessResponse>, GameError> {
    state
        .registry
        .post_message(&code, body.player_id, body.text)
        .await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn cast_vote(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(body): Json<CastVoteRequest>,
) -> Result<Json<SuccessResponse>, GameError> {
    state
        .registry
        .cast_vote(&code, body.player_id, body.target_id)
        .await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// Authoritative read-only snapshot for polling clients, the fallback
/// path when the socket is unavailable.
async fn room_state(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(_query): Query<StateQuery>,
) -> Result<Json<GameSnapshot>, GameError> {
    Ok(Json(state.registry.snapshot(&code).await?))
}
