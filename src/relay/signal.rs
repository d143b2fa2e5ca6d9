use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::errors::RelayError;
use super::models::{present_signal, present_str, present_value, SignalEnvelope, SignalKind};
use crate::room::repository::RoomRepository;
use crate::websockets::{ConnectionManager, MessageType, WebSocketMessage};

/// Forwards point-to-point payloads between two connections
pub struct SignalRouter {
    repository: Arc<dyn RoomRepository>,
    connection_manager: Arc<dyn ConnectionManager>,
}

impl SignalRouter {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        connection_manager: Arc<dyn ConnectionManager>,
    ) -> Self {
        Self {
            repository,
            connection_manager,
        }
    }

    /// Delivers a WebRTC signal or latency ping to `envelope.to`.
    ///
    /// `from` is the sender's real connection id. Kinds that require it are
    /// only delivered when both ends are indexed to the declared room.
    #[instrument(skip(self, envelope), fields(kind = envelope.kind.name()))]
    pub async fn route_signal(
        &self,
        from: &str,
        envelope: SignalEnvelope,
    ) -> Result<(), RelayError> {
        let to = present_str(&envelope.to).ok_or(RelayError::MissingFields)?;
        let room_id = present_str(&envelope.room_id).ok_or(RelayError::MissingFields)?;
        let payload = match &envelope.kind {
            SignalKind::WebRtc { .. } => present_signal(&envelope.payload),
            _ => present_value(&envelope.payload),
        }
        .ok_or(RelayError::MissingFields)?
        .clone();

        if let SignalKind::WebRtc { signal_type } = &envelope.kind {
            if present_str(signal_type).is_none() {
                return Err(RelayError::MissingFields);
            }
        }

        if envelope.kind.requires_co_membership()
            && !self.repository.are_co_members(from, to, room_id).await
        {
            warn!(
                from = %from,
                to = %to,
                room_id = %room_id,
                "Rejected signal between connections not in the same room"
            );
            return Err(RelayError::NotCoMembers);
        }

        let message = match envelope.kind {
            SignalKind::WebRtc { signal_type } => {
                WebSocketMessage::webrtc_signal(from.to_string(), payload, signal_type)
            }
            SignalKind::PingRequest => WebSocketMessage::ping_frame(
                MessageType::PingRequest,
                from.to_string(),
                payload,
                room_id.to_string(),
            ),
            SignalKind::PingResponse => WebSocketMessage::ping_frame(
                MessageType::PingResponse,
                from.to_string(),
                payload,
                room_id.to_string(),
            ),
        };

        self.deliver(to, &message).await;
        debug!(from = %from, to = %to, "Signal delivered");
        Ok(())
    }

    /// Asks `target` to re-establish its peer connection with `from`.
    /// Not checked for co-membership.
    #[instrument(skip(self))]
    pub async fn route_reconnect_request(
        &self,
        from: &str,
        target: Option<String>,
        room_id: Option<String>,
    ) -> Result<(), RelayError> {
        let target = present_str(&target).ok_or(RelayError::MissingFields)?;
        let room_id = present_str(&room_id).ok_or(RelayError::MissingFields)?;

        let message = WebSocketMessage::request_reconnect(from.to_string(), room_id.to_string());
        self.deliver(target, &message).await;
        Ok(())
    }

    async fn deliver(&self, to: &str, message: &WebSocketMessage) {
        if let Some(json) = message.to_json() {
            self.connection_manager.send_to_connection(to, &json).await;
        }
    }
}
