use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{AsRefStr, EnumIter, EnumString};
use tracing::warn;

use crate::relay::ChatMessage;
use crate::room::{models::Participant, types::RoomResponse};

/// Event names used on the socket, in both directions
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, AsRefStr, EnumIter, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MessageType {
    // Client -> Server
    CreateRoom,
    JoinRoom,
    LeaveRoom,
    SendMessage,
    RequestUserList,

    // Both directions
    WebrtcSignal,
    PingRequest,
    PingResponse,
    RequestReconnect,
    TrackToggle,
    ConnectionQuality,

    // Server -> Client
    ConnectionEstablished,
    UserJoined,
    UserLeft,
    ChatMessage,
    Ack,
    Error,
}

/// Metadata for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketMessageMeta {
    #[serde(default = "chrono::Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Set by the client when it wants an ack, echoed back on the ack
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<u64>,
}

/// Base structure for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub payload: Value,
    pub meta: Option<WebSocketMessageMeta>,
}

/// An inbound frame before its event name has been checked
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    #[serde(rename = "type")]
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub meta: Option<WebSocketMessageMeta>,
}

impl IncomingMessage {
    pub fn request_id(&self) -> Option<u64> {
        self.meta.as_ref().and_then(|m| m.request_id)
    }
}

/// Client-to-Server message payloads
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateRoomPayload {
    pub name: Option<String>,
    pub instrument: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JoinRoomPayload {
    pub room_id: Option<String>,
    pub name: Option<String>,
    pub instrument: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoomIdPayload {
    pub room_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SendMessagePayload {
    pub text: Option<String>,
    #[serde(rename = "type")]
    pub message_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WebrtcSignalPayload {
    pub to: Option<String>,
    pub signal: Option<Value>,
    #[serde(rename = "type")]
    pub signal_type: Option<String>,
    pub room_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PingPayload {
    pub to: Option<String>,
    pub timestamp: Option<Value>,
    pub room_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestReconnectPayload {
    pub user_id: Option<String>,
    pub room_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TrackTogglePayload {
    #[serde(rename = "type")]
    pub track: Option<String>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectionQualityPayload {
    pub room_id: Option<String>,
    pub quality: Option<Value>,
}

/// Server-to-Client message payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionEstablishedPayload {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserJoinedPayload {
    pub user: Participant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLeftPayload {
    pub user_id: String,
    pub user_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalPayload {
    pub from: String,
    pub signal: Value,
    #[serde(rename = "type")]
    pub signal_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbePayload {
    pub from: String,
    pub timestamp: Value,
    pub room_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconnectPayload {
    /// The connection asking to be reconnected to
    pub user_id: String,
    pub room_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackStatePayload {
    pub user_id: String,
    #[serde(rename = "type")]
    pub track: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomAckPayload {
    pub success: bool,
    pub room: RoomResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
}

fn to_payload<T: Serialize>(payload: T) -> Value {
    serde_json::to_value(payload).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to serialize message payload");
        Value::Null
    })
}

/// Helper functions for creating messages
impl WebSocketMessage {
    pub fn new(message_type: MessageType, payload: Value) -> Self {
        Self {
            message_type,
            payload,
            meta: Some(WebSocketMessageMeta {
                timestamp: Utc::now(),
                request_id: None,
            }),
        }
    }

    /// Serialized frame, `None` if serialization failed (logged)
    pub fn to_json(&self) -> Option<String> {
        match serde_json::to_string(self) {
            Ok(json) => Some(json),
            Err(e) => {
                warn!(
                    message_type = self.message_type.as_ref(),
                    error = %e,
                    "Failed to serialize WebSocket message"
                );
                None
            }
        }
    }

    /// Create a CONNECTION_ESTABLISHED message
    pub fn connection_established(connection_id: String) -> Self {
        Self::new(
            MessageType::ConnectionEstablished,
            to_payload(ConnectionEstablishedPayload { id: connection_id }),
        )
    }

    /// Create a USER_JOINED message
    pub fn user_joined(user: Participant) -> Self {
        Self::new(MessageType::UserJoined, to_payload(UserJoinedPayload { user }))
    }

    /// Create a USER_LEFT message
    pub fn user_left(user_id: String, user_name: String) -> Self {
        Self::new(
            MessageType::UserLeft,
            to_payload(UserLeftPayload { user_id, user_name }),
        )
    }

    /// Create a CHAT_MESSAGE message
    pub fn chat_message(message: &ChatMessage) -> Self {
        Self::new(MessageType::ChatMessage, to_payload(message))
    }

    /// Create a WEBRTC_SIGNAL message
    pub fn webrtc_signal(from: String, signal: Value, signal_type: Option<String>) -> Self {
        Self::new(
            MessageType::WebrtcSignal,
            to_payload(SignalPayload {
                from,
                signal,
                signal_type,
            }),
        )
    }

    /// Create a PING_REQUEST or PING_RESPONSE message
    pub fn ping_frame(message_type: MessageType, from: String, timestamp: Value, room_id: String) -> Self {
        Self::new(
            message_type,
            to_payload(ProbePayload {
                from,
                timestamp,
                room_id,
            }),
        )
    }

    /// Create a REQUEST_RECONNECT message
    pub fn request_reconnect(from: String, room_id: String) -> Self {
        Self::new(
            MessageType::RequestReconnect,
            to_payload(ReconnectPayload {
                user_id: from,
                room_id,
            }),
        )
    }

    /// Create a TRACK_TOGGLE message
    pub fn track_toggle(user_id: String, track: String, enabled: bool) -> Self {
        Self::new(
            MessageType::TrackToggle,
            to_payload(TrackStatePayload {
                user_id,
                track,
                enabled,
            }),
        )
    }

    /// Create a CONNECTION_QUALITY message. Object qualities are flattened
    /// next to `userId`, anything else is sent under `quality`.
    pub fn connection_quality(user_id: String, quality: Value) -> Self {
        let mut payload = match quality {
            Value::Object(map) => map,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("quality".to_string(), other);
                map
            }
        };
        payload.insert("userId".to_string(), Value::String(user_id));
        Self::new(MessageType::ConnectionQuality, Value::Object(payload))
    }

    /// Create an ACK message answering `request_id`
    pub fn ack(request_id: u64, payload: Value) -> Self {
        let mut message = Self::new(MessageType::Ack, payload);
        if let Some(meta) = message.meta.as_mut() {
            meta.request_id = Some(request_id);
        }
        message
    }

    /// Create an ERROR message
    pub fn error(error: String) -> Self {
        Self::new(MessageType::Error, to_payload(ErrorPayload { error }))
    }
}

/// `{"success": true}`
pub fn success_payload() -> Value {
    serde_json::json!({ "success": true })
}

/// `{"success": true, "room": {...}}`
pub fn room_payload(room: RoomResponse) -> Value {
    to_payload(RoomAckPayload {
        success: true,
        room,
    })
}

/// `{"error": "..."}`
pub fn error_payload(error: impl ToString) -> Value {
    to_payload(ErrorPayload {
        error: error.to_string(),
    })
}
