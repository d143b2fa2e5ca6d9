use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

use super::messages::{
    room_payload, success_payload, ConnectionQualityPayload, CreateRoomPayload, JoinRoomPayload,
    MessageType, PingPayload, RequestReconnectPayload, RoomIdPayload, SendMessagePayload,
    TrackTogglePayload, WebrtcSignalPayload,
};
use crate::relay::{BroadcastRelay, RelayError, SignalEnvelope, SignalRouter};
use crate::room::RoomService;

#[derive(Debug, Error, PartialEq)]
pub enum DispatchError {
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("Event not accepted from clients: {0}")]
    UnsupportedEvent(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error(transparent)]
    Relay(#[from] RelayError),
}

/// Routes each inbound event to the component that owns it and builds the
/// ack payload for the sender
pub struct EventDispatcher {
    room_service: Arc<RoomService>,
    broadcast: Arc<BroadcastRelay>,
    signal_router: Arc<SignalRouter>,
}

impl EventDispatcher {
    pub fn new(
        room_service: Arc<RoomService>,
        broadcast: Arc<BroadcastRelay>,
        signal_router: Arc<SignalRouter>,
    ) -> Self {
        Self {
            room_service,
            broadcast,
            signal_router,
        }
    }

    /// Handles one event from `connection_id`; `Ok` carries the ack payload
    #[instrument(skip(self, event, payload), fields(event = event.as_ref()))]
    pub async fn dispatch(
        &self,
        connection_id: &str,
        event: MessageType,
        payload: Value,
    ) -> Result<Value, DispatchError> {
        match event {
            MessageType::CreateRoom => {
                let p: CreateRoomPayload = parse_payload(payload)?;
                let room = self
                    .room_service
                    .create_room(connection_id, p.name, p.instrument)
                    .await?;
                Ok(room_payload(room))
            }
            MessageType::JoinRoom => {
                let p: JoinRoomPayload = parse_payload(payload)?;
                let room = self
                    .room_service
                    .join_room(connection_id, p.room_id, p.name, p.instrument)
                    .await?;
                Ok(room_payload(room))
            }
            MessageType::LeaveRoom => {
                let p: RoomIdPayload = parse_payload(payload)?;
                self.room_service.leave_room(connection_id, p.room_id).await?;
                Ok(success_payload())
            }
            MessageType::RequestUserList => {
                let p: RoomIdPayload = parse_payload(payload)?;
                let room = self.room_service.get_user_list(p.room_id).await?;
                Ok(room_payload(room))
            }
            MessageType::SendMessage => {
                let p: SendMessagePayload = parse_payload(payload)?;
                self.broadcast
                    .send_chat_message(connection_id, p.text, p.message_type)
                    .await?;
                Ok(success_payload())
            }
            MessageType::WebrtcSignal => {
                let p: WebrtcSignalPayload = parse_payload(payload)?;
                let envelope = SignalEnvelope::webrtc(p.to, p.signal, p.signal_type, p.room_id);
                self.signal_router.route_signal(connection_id, envelope).await?;
                Ok(success_payload())
            }
            MessageType::PingRequest => {
                let p: PingPayload = parse_payload(payload)?;
                let envelope = SignalEnvelope::ping_request(p.to, p.timestamp, p.room_id);
                self.signal_router.route_signal(connection_id, envelope).await?;
                Ok(success_payload())
            }
            MessageType::PingResponse => {
                let p: PingPayload = parse_payload(payload)?;
                let envelope = SignalEnvelope::ping_response(p.to, p.timestamp, p.room_id);
                self.signal_router.route_signal(connection_id, envelope).await?;
                Ok(success_payload())
            }
            MessageType::RequestReconnect => {
                let p: RequestReconnectPayload = parse_payload(payload)?;
                self.signal_router
                    .route_reconnect_request(connection_id, p.user_id, p.room_id)
                    .await?;
                Ok(success_payload())
            }
            MessageType::TrackToggle => {
                let p: TrackTogglePayload = parse_payload(payload)?;
                self.broadcast
                    .broadcast_track_toggle(connection_id, p.track, p.enabled)
                    .await?;
                Ok(success_payload())
            }
            MessageType::ConnectionQuality => {
                let p: ConnectionQualityPayload = parse_payload(payload)?;
                self.broadcast
                    .broadcast_connection_quality(connection_id, p.room_id, p.quality)
                    .await?;
                Ok(success_payload())
            }
            MessageType::ConnectionEstablished
            | MessageType::UserJoined
            | MessageType::UserLeft
            | MessageType::ChatMessage
            | MessageType::Ack
            | MessageType::Error => {
                debug!(event = event.as_ref(), "Outbound-only event sent by client");
                Err(DispatchError::UnsupportedEvent(event.as_ref().to_string()))
            }
        }
    }
}

/// A missing or null payload reads as `{}`
fn parse_payload<T: DeserializeOwned + Default>(payload: Value) -> Result<T, DispatchError> {
    if payload.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(payload).map_err(|e| DispatchError::InvalidPayload(e.to_string()))
}
