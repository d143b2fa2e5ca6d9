use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::errors::RelayError;
use super::models::{present_str, present_value, ChatMessage};
use crate::room::repository::RoomRepository;
use crate::websockets::{ConnectionManager, WebSocketMessage};

/// Fans a message out to the members of a room
pub struct BroadcastRelay {
    repository: Arc<dyn RoomRepository>,
    connection_manager: Arc<dyn ConnectionManager>,
}

impl BroadcastRelay {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        connection_manager: Arc<dyn ConnectionManager>,
    ) -> Self {
        Self {
            repository,
            connection_manager,
        }
    }

    /// Sends `message` to every member of the room except `exclude`.
    /// Returns the number of recipients; a missing room yields zero.
    #[instrument(skip(self, message), fields(message_type = message.message_type.as_ref()))]
    pub async fn broadcast_to_room(
        &self,
        room_id: &str,
        message: &WebSocketMessage,
        exclude: Option<&str>,
    ) -> usize {
        let room = match self.repository.get_room(room_id).await {
            Some(room) => room,
            None => {
                debug!(room_id = %room_id, "Room gone, nothing to broadcast");
                return 0;
            }
        };

        let recipients: Vec<String> = room
            .connection_ids()
            .into_iter()
            .filter(|id| Some(id.as_str()) != exclude)
            .collect();

        self.send_to_members(room_id, &recipients, message).await
    }

    /// Sends `message` to an explicit recipient list, usually one captured
    /// while the room store was locked. Returns the number of recipients.
    pub async fn send_to_members(
        &self,
        room_id: &str,
        recipients: &[String],
        message: &WebSocketMessage,
    ) -> usize {
        if recipients.is_empty() {
            return 0;
        }

        let message_json = match message.to_json() {
            Some(json) => json,
            None => return 0,
        };

        self.connection_manager
            .send_to_connections(recipients, &message_json)
            .await;

        debug!(
            room_id = %room_id,
            recipients = recipients.len(),
            "Broadcast delivered"
        );
        recipients.len()
    }

    /// Broadcasts a chat message to the sender's room, sender included
    #[instrument(skip(self, text))]
    pub async fn send_chat_message(
        &self,
        connection_id: &str,
        text: Option<String>,
        message_type: Option<String>,
    ) -> Result<ChatMessage, RelayError> {
        let (room_id, sender) = self
            .repository
            .find_participant(connection_id)
            .await
            .ok_or(RelayError::NotInRoom)?;

        let message = ChatMessage::new(&sender, text, message_type);
        self.broadcast_to_room(&room_id, &WebSocketMessage::chat_message(&message), None)
            .await;

        info!(
            room_id = %room_id,
            message_id = %message.id,
            "Chat message relayed"
        );
        Ok(message)
    }

    /// Tells the sender's room that one of its media tracks was switched on or off
    #[instrument(skip(self))]
    pub async fn broadcast_track_toggle(
        &self,
        connection_id: &str,
        track: Option<String>,
        enabled: Option<bool>,
    ) -> Result<(), RelayError> {
        let track = present_str(&track).ok_or(RelayError::MissingFields)?.to_string();
        let enabled = enabled.ok_or(RelayError::MissingFields)?;

        let room_id = self
            .repository
            .room_of(connection_id)
            .await
            .ok_or(RelayError::NotInRoom)?;

        let message = WebSocketMessage::track_toggle(connection_id.to_string(), track, enabled);
        self.broadcast_to_room(&room_id, &message, None).await;
        Ok(())
    }

    /// Shares a participant's measured link quality with its room
    #[instrument(skip(self, quality))]
    pub async fn broadcast_connection_quality(
        &self,
        connection_id: &str,
        room_id: Option<String>,
        quality: Option<Value>,
    ) -> Result<(), RelayError> {
        let room_id = present_str(&room_id).ok_or(RelayError::MissingFields)?;
        let quality = present_value(&quality)
            .ok_or(RelayError::MissingFields)?
            .clone();

        if self.repository.room_of(connection_id).await.as_deref() != Some(room_id) {
            return Err(RelayError::NotInRoom);
        }

        let message = WebSocketMessage::connection_quality(connection_id.to_string(), quality);
        self.broadcast_to_room(room_id, &message, None).await;
        Ok(())
    }
}
