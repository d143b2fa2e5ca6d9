use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use super::types::{RoomResponse, RoomSummary};
use crate::relay::RelayError;
use crate::shared::{AppError, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IceServersResponse {
    pub ice_servers: Vec<IceServer>,
}

#[derive(Debug, Serialize)]
pub struct IceServer {
    pub urls: String,
}

/// HTTP handler for listing all rooms
///
/// GET /rooms
/// Returns array of live rooms with their member counts
#[instrument(name = "list_rooms", skip(state))]
pub async fn list_rooms(State(state): State<AppState>) -> Json<Vec<RoomSummary>> {
    let rooms = state.room_service.list_rooms().await;

    info!(room_count = rooms.len(), "Rooms listed successfully");

    Json(rooms)
}

/// HTTP handler for a single room's membership
///
/// GET /rooms/:room_id
#[instrument(name = "get_room", skip(state))]
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomResponse>, AppError> {
    let room = state
        .room_service
        .get_room(&room_id)
        .await
        .ok_or(RelayError::RoomNotFound)?;

    debug!(room_id = %room_id, user_count = room.users.len(), "Room found");

    Ok(Json(room))
}

/// GET /health
/// Reports liveness and the number of open sockets
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let connections = state.connection_manager.count_connections().await;
    Json(json!({ "status": "ok", "connections": connections }))
}

/// STUN/TURN servers clients should use for their peer connections
///
/// GET /api/ice-servers
pub async fn ice_servers(State(state): State<AppState>) -> Json<IceServersResponse> {
    Json(IceServersResponse {
        ice_servers: state
            .config
            .ice_servers
            .iter()
            .map(|urls| IceServer { urls: urls.clone() })
            .collect(),
    })
}
