use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{Participant, RoomModel};

/// Room id plus its current membership, as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomResponse {
    pub id: String,
    pub users: Vec<Participant>,
}

impl From<&RoomModel> for RoomResponse {
    fn from(room: &RoomModel) -> Self {
        Self {
            id: room.id.clone(),
            users: room.sorted_participants(),
        }
    }
}

/// Room listing entry for the HTTP API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: String,
    pub user_count: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&RoomModel> for RoomSummary {
    fn from(room: &RoomModel) -> Self {
        Self {
            id: room.id.clone(),
            user_count: room.participant_count(),
            created_at: room.created_at,
        }
    }
}
