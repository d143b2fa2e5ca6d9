use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_NAME: &str = "Anonymous";
pub const DEFAULT_INSTRUMENT: &str = "Unknown";

/// A connection's identity inside one room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String, // connection id
    pub name: String,
    pub instrument: String,
    /// Set only for the room creator. Informational, never checked.
    pub is_admin: bool,
    pub joined_at: DateTime<Utc>,
}

impl Participant {
    /// Builds a participant, falling back to the default name/instrument when
    /// the client sent nothing usable
    pub fn new(
        connection_id: &str,
        name: Option<String>,
        instrument: Option<String>,
        is_admin: bool,
    ) -> Self {
        Self {
            id: connection_id.to_string(),
            name: non_empty_or(name, DEFAULT_NAME),
            instrument: non_empty_or(instrument, DEFAULT_INSTRUMENT),
            is_admin,
            joined_at: Utc::now(),
        }
    }
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => default.to_string(),
    }
}

/// In-memory room aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomModel {
    pub id: String, // 8 char random token
    pub created_at: DateTime<Utc>,
    pub participants: HashMap<String, Participant>, // connection id -> participant
}

impl RoomModel {
    /// Creates a room whose only member is its admin
    pub fn new(room_id: String, host: Participant) -> Self {
        let mut participants = HashMap::new();
        participants.insert(host.id.clone(), host);

        Self {
            id: room_id,
            created_at: Utc::now(),
            participants,
        }
    }

    pub fn has_participant(&self, connection_id: &str) -> bool {
        self.participants.contains_key(connection_id)
    }

    pub fn get_participant(&self, connection_id: &str) -> Option<&Participant> {
        self.participants.get(connection_id)
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Connection ids of every member
    pub fn connection_ids(&self) -> Vec<String> {
        self.participants.keys().cloned().collect()
    }

    /// Members ordered by join time, ties broken by id
    pub fn sorted_participants(&self) -> Vec<Participant> {
        let mut users: Vec<Participant> = self.participants.values().cloned().collect();
        users.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then_with(|| a.id.cmp(&b.id)));
        users
    }
}
