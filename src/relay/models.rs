use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::room::models::Participant;

pub const DEFAULT_MESSAGE_TYPE: &str = "text";

/// A chat message, alive only while it is being broadcast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub user_id: String,
    /// Sender name at the time of sending
    pub user_name: String,
    pub text: String,
    #[serde(rename = "type")]
    pub message_type: String,
    /// Unix epoch milliseconds
    pub timestamp: i64,
}

impl ChatMessage {
    pub fn new(sender: &Participant, text: Option<String>, message_type: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: sender.id.clone(),
            user_name: sender.name.clone(),
            text: text.unwrap_or_default(),
            message_type: message_type
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_MESSAGE_TYPE.to_string()),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

/// What a point-to-point envelope carries
///
/// Only some kinds are checked for co-membership: a ping response answers a
/// request that was already validated on the way in.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalKind {
    /// WebRTC offer/answer/ICE candidate, tagged by the client's type string
    WebRtc { signal_type: Option<String> },
    PingRequest,
    PingResponse,
}

impl SignalKind {
    pub fn requires_co_membership(&self) -> bool {
        match self {
            SignalKind::WebRtc { .. } | SignalKind::PingRequest => true,
            SignalKind::PingResponse => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SignalKind::WebRtc { .. } => "webrtc_signal",
            SignalKind::PingRequest => "ping_request",
            SignalKind::PingResponse => "ping_response",
        }
    }
}

/// Point-to-point payload as received from a client. The sender is not part
/// of it: the router stamps the real connection id on delivery.
#[derive(Debug, Clone)]
pub struct SignalEnvelope {
    pub kind: SignalKind,
    pub to: Option<String>,
    /// SDP/ICE blob for WebRTC, the sender timestamp for pings
    pub payload: Option<Value>,
    pub room_id: Option<String>,
}

impl SignalEnvelope {
    pub fn webrtc(
        to: Option<String>,
        signal: Option<Value>,
        signal_type: Option<String>,
        room_id: Option<String>,
    ) -> Self {
        Self {
            kind: SignalKind::WebRtc { signal_type },
            to,
            payload: signal,
            room_id,
        }
    }

    pub fn ping_request(to: Option<String>, timestamp: Option<Value>, room_id: Option<String>) -> Self {
        Self {
            kind: SignalKind::PingRequest,
            to,
            payload: timestamp,
            room_id,
        }
    }

    pub fn ping_response(to: Option<String>, timestamp: Option<Value>, room_id: Option<String>) -> Self {
        Self {
            kind: SignalKind::PingResponse,
            to,
            payload: timestamp,
            room_id,
        }
    }
}

/// Absent, null and empty-string fields all count as missing
pub fn present_str(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

pub fn present_value(value: &Option<Value>) -> Option<&Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(v) => Some(v),
    }
}

/// A WebRTC signal body also needs content: `false`, `{}` and `[]` are missing
pub fn present_signal(value: &Option<Value>) -> Option<&Value> {
    present_value(value).filter(|v| match v {
        Value::Bool(b) => *b,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    })
}
