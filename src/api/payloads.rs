//! Request and response bodies for the REST surface.

use serde::{Deserialize, Serialize};

use crate::protocol::PlayerId;
use crate::room::{LeaveAction, RoomInfo, RoomSummary};

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub room_name: Option<String>,
    pub max_humans: u8,
    /// Defaults to `max_humans + game.num_ai_players` when omitted.
    pub total_players: Option<u8>,
}

#[derive(Debug, Serialize)]
pub struct CreateRoomResponse {
    pub room_code: String,
    pub room_name: String,
    pub max_humans: u8,
    pub total_players: u8,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ListRoomsResponse {
    pub rooms: Vec<RoomSummary>,
    pub total_pages: u32,
}

/// Unknown codes are reported with `exists=false`, not an HTTP error.
#[derive(Debug, Serialize)]
pub struct RoomInfoResponse {
    pub exists: bool,
    #[serde(flatten)]
    pub info: Option<RoomInfo>,
}

#[derive(Debug, Serialize)]
pub struct JoinRoomResponse {
    pub success: bool,
    pub player_id: PlayerId,
    pub can_start: bool,
    pub current_humans: Vec<PlayerId>,
    pub max_humans: u8,
}

#[derive(Debug, Deserialize)]
pub struct LeaveRoomRequest {
    pub player_id: PlayerId,
}

#[derive(Debug, Serialize)]
pub struct LeaveRoomResponse {
    pub action: LeaveAction,
}

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub player_id: PlayerId,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct CastVoteRequest {
    pub player_id: PlayerId,
    pub target_id: PlayerId,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct StateQuery {
    /// Accepted for parity with polling clients; the snapshot is the same
    /// for every player.
    #[allow(dead_code)]
    pub player_id: Option<String>,
}
