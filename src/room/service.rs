use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{
    models::Participant,
    repository::{Departure, DisconnectResult, JoinRoomResult, LeaveRoomResult, RoomRepository},
    types::{RoomResponse, RoomSummary},
};
use crate::relay::{present_str, BroadcastRelay, RelayError};
use crate::websockets::WebSocketMessage;

/// Membership manager: creates rooms, admits and removes members, and tells
/// the rest of the room about it
pub struct RoomService {
    repository: Arc<dyn RoomRepository>,
    broadcast: Arc<BroadcastRelay>,
}

impl RoomService {
    pub fn new(repository: Arc<dyn RoomRepository>, broadcast: Arc<BroadcastRelay>) -> Self {
        Self {
            repository,
            broadcast,
        }
    }

    /// Creates a new room with the caller as its only member and admin
    #[instrument(skip(self))]
    pub async fn create_room(
        &self,
        connection_id: &str,
        name: Option<String>,
        instrument: Option<String>,
    ) -> Result<RoomResponse, RelayError> {
        let host = Participant::new(connection_id, name, instrument, true);
        let result = self.repository.create_room(host).await?;

        if let Some(previous) = result.previous {
            self.announce_departure(previous).await;
        }

        info!(
            room_id = %result.room.id,
            connection_id = %connection_id,
            "Room created successfully"
        );
        Ok(RoomResponse::from(&result.room))
    }

    /// Adds the caller to an existing room and notifies the other members
    #[instrument(skip(self))]
    pub async fn join_room(
        &self,
        connection_id: &str,
        room_id: Option<String>,
        name: Option<String>,
        instrument: Option<String>,
    ) -> Result<RoomResponse, RelayError> {
        let room_id = present_str(&room_id).ok_or(RelayError::RoomNotFound)?;
        let participant = Participant::new(connection_id, name, instrument, false);

        match self.repository.try_join_room(room_id, participant).await {
            JoinRoomResult::Joined { room, previous } => {
                if let Some(previous) = previous {
                    self.announce_departure(previous).await;
                }

                // Everyone in the committed snapshot except the joiner
                if let Some(joined) = room.get_participant(connection_id) {
                    let recipients: Vec<String> = room
                        .connection_ids()
                        .into_iter()
                        .filter(|id| id != connection_id)
                        .collect();
                    let message = WebSocketMessage::user_joined(joined.clone());
                    self.broadcast
                        .send_to_members(room_id, &recipients, &message)
                        .await;
                }

                info!(
                    room_id = %room_id,
                    connection_id = %connection_id,
                    participant_count = room.participant_count(),
                    "Participant joined room"
                );
                Ok(RoomResponse::from(&room))
            }
            JoinRoomResult::AlreadyMember(room) => Ok(RoomResponse::from(&room)),
            JoinRoomResult::RoomNotFound => Err(RelayError::RoomNotFound),
        }
    }

    /// Removes the caller from a room, deleting the room once it is empty
    #[instrument(skip(self))]
    pub async fn leave_room(
        &self,
        connection_id: &str,
        room_id: Option<String>,
    ) -> Result<(), RelayError> {
        let room_id = present_str(&room_id).ok_or(RelayError::RoomNotFound)?;

        match self.repository.leave_room(room_id, connection_id).await {
            LeaveRoomResult::Left(departure) => {
                self.announce_departure(departure).await;
                Ok(())
            }
            LeaveRoomResult::RoomNotFound => Err(RelayError::RoomNotFound),
            LeaveRoomResult::NotMember => Err(RelayError::NotMember),
        }
    }

    /// Cleanup for a connection that went away. Safe to call more than once.
    #[instrument(skip(self))]
    pub async fn handle_disconnect(&self, connection_id: &str) {
        match self.repository.remove_connection(connection_id).await {
            DisconnectResult::NotIndexed => {
                debug!(connection_id = %connection_id, "Connection was not in a room");
            }
            DisconnectResult::Left(departure) => self.announce_departure(departure).await,
            DisconnectResult::StaleIndex { room_id } => {
                debug!(
                    connection_id = %connection_id,
                    room_id = %room_id,
                    "Room or membership already gone, index entry dropped"
                );
            }
        }
    }

    /// Current membership of a room
    #[instrument(skip(self))]
    pub async fn get_user_list(&self, room_id: Option<String>) -> Result<RoomResponse, RelayError> {
        let room_id = present_str(&room_id).ok_or(RelayError::RoomNotFound)?;
        self.get_room(room_id).await.ok_or(RelayError::RoomNotFound)
    }

    pub async fn get_room(&self, room_id: &str) -> Option<RoomResponse> {
        self.repository
            .get_room(room_id)
            .await
            .map(|room| RoomResponse::from(&room))
    }

    /// Lists all live rooms, oldest first
    #[instrument(skip(self))]
    pub async fn list_rooms(&self) -> Vec<RoomSummary> {
        let mut rooms: Vec<RoomSummary> = self
            .repository
            .list_rooms()
            .await
            .iter()
            .map(RoomSummary::from)
            .collect();
        rooms.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        debug!(room_count = rooms.len(), "Rooms listed");
        rooms
    }

    async fn announce_departure(&self, departure: Departure) {
        if departure.room_deleted {
            info!(room_id = %departure.room_id, "Room deleted after last participant left");
            return;
        }

        let message =
            WebSocketMessage::user_left(departure.participant.id, departure.participant.name);
        self.broadcast
            .send_to_members(&departure.room_id, &departure.remaining, &message)
            .await;
    }
}
