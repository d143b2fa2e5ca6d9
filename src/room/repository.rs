use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::generators::{RandomRoomIdGenerator, RoomIdGenerator};
use super::models::{Participant, RoomModel};
use crate::relay::RelayError;

/// How many fresh ids we try before giving up on a create
const MAX_ROOM_ID_ATTEMPTS: usize = 16;

/// A connection removed from a room
#[derive(Debug, Clone)]
pub struct Departure {
    pub room_id: String,
    pub participant: Participant,
    /// The room had no members left and was deleted
    pub room_deleted: bool,
    /// Members still in the room when the departure committed
    pub remaining: Vec<String>,
}

/// Result of creating a room
#[derive(Debug, Clone)]
pub struct CreateRoomResult {
    pub room: RoomModel,
    /// Room the creator was pulled out of, if it was already in one
    pub previous: Option<Departure>,
}

/// Result of attempting to join a room
#[derive(Debug, Clone)]
pub enum JoinRoomResult {
    /// Joined the room, returns updated room data
    Joined {
        room: RoomModel,
        previous: Option<Departure>,
    },
    /// Connection was already a member of this room, nothing changed
    AlreadyMember(RoomModel),
    /// Room does not exist
    RoomNotFound,
}

/// Result of attempting to leave a room
#[derive(Debug, Clone)]
pub enum LeaveRoomResult {
    Left(Departure),
    /// Room does not exist
    RoomNotFound,
    /// Connection is not in that room
    NotMember,
}

/// Result of cleaning up after a connection went away
#[derive(Debug, Clone)]
pub enum DisconnectResult {
    /// Connection was never in a room (or was already cleaned up)
    NotIndexed,
    Left(Departure),
    /// The index pointed at a room that did not hold the connection.
    /// The index entry has been dropped anyway.
    StaleIndex { room_id: String },
}

/// Room store and connection index
///
/// Every method is one critical section, so the room map and the
/// connection -> room index never disagree between calls.
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Creates a room with `host` as its only member and admin
    async fn create_room(&self, host: Participant) -> Result<CreateRoomResult, RelayError>;

    async fn get_room(&self, room_id: &str) -> Option<RoomModel>;

    async fn list_rooms(&self) -> Vec<RoomModel>;

    /// Atomically adds a participant to an existing room
    async fn try_join_room(&self, room_id: &str, participant: Participant) -> JoinRoomResult;

    /// Atomically removes a connection from a room, deleting the room if it empties
    async fn leave_room(&self, room_id: &str, connection_id: &str) -> LeaveRoomResult;

    /// Removes the connection from whatever room it is indexed to. Idempotent.
    async fn remove_connection(&self, connection_id: &str) -> DisconnectResult;

    /// Room the connection is currently indexed to
    async fn room_of(&self, connection_id: &str) -> Option<String>;

    /// Room id and participant record for a connection, if it is indexed and
    /// still present in that room
    async fn find_participant(&self, connection_id: &str) -> Option<(String, Participant)>;

    /// Both connections are indexed to `room_id`
    async fn are_co_members(&self, first: &str, second: &str, room_id: &str) -> bool;
}

#[derive(Debug, Default)]
struct RoomStore {
    rooms: HashMap<String, RoomModel>,
    index: HashMap<String, String>, // connection id -> room id
}

impl RoomStore {
    fn next_room_id(&self, generator: &dyn RoomIdGenerator) -> Option<String> {
        (0..MAX_ROOM_ID_ATTEMPTS)
            .map(|_| generator.generate())
            .find(|id| !id.is_empty() && !self.rooms.contains_key(id))
    }

    fn remove_member(&mut self, room_id: &str, connection_id: &str) -> LeaveRoomResult {
        let room = match self.rooms.get_mut(room_id) {
            Some(room) => room,
            None => return LeaveRoomResult::RoomNotFound,
        };

        let participant = match room.participants.remove(connection_id) {
            Some(participant) => participant,
            None => return LeaveRoomResult::NotMember,
        };

        if self.index.get(connection_id).map(String::as_str) == Some(room_id) {
            self.index.remove(connection_id);
        }

        let remaining = room.connection_ids();
        let room_deleted = remaining.is_empty();
        if room_deleted {
            self.rooms.remove(room_id);
        }

        LeaveRoomResult::Left(Departure {
            room_id: room_id.to_string(),
            participant,
            room_deleted,
            remaining,
        })
    }

    fn detach(&mut self, connection_id: &str) -> DisconnectResult {
        let room_id = match self.index.get(connection_id) {
            Some(room_id) => room_id.clone(),
            None => return DisconnectResult::NotIndexed,
        };

        let result = self.remove_member(&room_id, connection_id);
        self.index.remove(connection_id);

        match result {
            LeaveRoomResult::Left(departure) => DisconnectResult::Left(departure),
            LeaveRoomResult::RoomNotFound | LeaveRoomResult::NotMember => {
                DisconnectResult::StaleIndex { room_id }
            }
        }
    }

    fn detach_previous(&mut self, connection_id: &str) -> Option<Departure> {
        match self.detach(connection_id) {
            DisconnectResult::Left(departure) => Some(departure),
            DisconnectResult::StaleIndex { room_id } => {
                warn!(
                    connection_id = %connection_id,
                    room_id = %room_id,
                    "Dropped stale index entry"
                );
                None
            }
            DisconnectResult::NotIndexed => None,
        }
    }

    /// Index and room maps agree in both directions and no room is empty
    fn is_consistent(&self) -> bool {
        let index_matches_rooms = self.index.iter().all(|(connection_id, room_id)| {
            self.rooms
                .get(room_id)
                .is_some_and(|room| room.has_participant(connection_id))
        });

        let rooms_match_index = self.rooms.iter().all(|(room_id, room)| {
            !room.is_empty()
                && room.participants.iter().all(|(connection_id, p)| {
                    p.id == *connection_id
                        && self.index.get(connection_id).map(String::as_str) == Some(room_id)
                })
        });

        index_matches_rooms && rooms_match_index
    }
}

/// In-memory implementation of RoomRepository, one mutex over the whole store
pub struct InMemoryRoomRepository {
    store: Mutex<RoomStore>,
    id_generator: Arc<dyn RoomIdGenerator>,
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRoomRepository {
    /// Creates a new empty in-memory repository with random room ids
    pub fn new() -> Self {
        Self::with_id_generator(Arc::new(RandomRoomIdGenerator::new()))
    }

    pub fn with_id_generator(id_generator: Arc<dyn RoomIdGenerator>) -> Self {
        Self {
            store: Mutex::new(RoomStore::default()),
            id_generator,
        }
    }

    /// Checks the index/room invariant. Used by tests and debug builds.
    pub async fn is_consistent(&self) -> bool {
        self.store.lock().await.is_consistent()
    }

    /// Number of connections currently assigned to a room
    pub async fn indexed_connection_count(&self) -> usize {
        self.store.lock().await.index.len()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    #[instrument(skip(self, host), fields(connection_id = %host.id))]
    async fn create_room(&self, host: Participant) -> Result<CreateRoomResult, RelayError> {
        let mut store = self.store.lock().await;

        let room_id = store
            .next_room_id(self.id_generator.as_ref())
            .ok_or(RelayError::RoomIdExhausted)?;

        let previous = store.detach_previous(&host.id);

        let connection_id = host.id.clone();
        let room = RoomModel::new(room_id.clone(), host);
        store.rooms.insert(room_id.clone(), room.clone());
        store.index.insert(connection_id, room_id.clone());

        debug_assert!(store.is_consistent());
        debug!(room_id = %room_id, "Room created in memory");

        Ok(CreateRoomResult { room, previous })
    }

    #[instrument(skip(self))]
    async fn get_room(&self, room_id: &str) -> Option<RoomModel> {
        let store = self.store.lock().await;
        let room = store.rooms.get(room_id).cloned();

        if room.is_none() {
            debug!(room_id = %room_id, "Room not found in memory");
        }

        room
    }

    #[instrument(skip(self))]
    async fn list_rooms(&self) -> Vec<RoomModel> {
        let store = self.store.lock().await;
        store.rooms.values().cloned().collect()
    }

    #[instrument(skip(self, participant), fields(connection_id = %participant.id))]
    async fn try_join_room(&self, room_id: &str, participant: Participant) -> JoinRoomResult {
        let mut store = self.store.lock().await;

        if !store.rooms.contains_key(room_id) {
            debug!(room_id = %room_id, "Room not found");
            return JoinRoomResult::RoomNotFound;
        }

        // Joining the room you are already in changes nothing
        if store.index.get(&participant.id).map(String::as_str) == Some(room_id) {
            if let Some(room) = store.rooms.get(room_id) {
                if room.has_participant(&participant.id) {
                    debug!(room_id = %room_id, "Connection already in room");
                    return JoinRoomResult::AlreadyMember(room.clone());
                }
            }
        }

        let previous = store.detach_previous(&participant.id);

        let connection_id = participant.id.clone();
        let room = match store.rooms.get_mut(room_id) {
            Some(room) => room,
            None => return JoinRoomResult::RoomNotFound,
        };
        room.participants.insert(connection_id.clone(), participant);
        let updated_room = room.clone();
        store.index.insert(connection_id, room_id.to_string());

        debug_assert!(store.is_consistent());
        info!(
            room_id = %room_id,
            participant_count = updated_room.participant_count(),
            "Participant joined room (atomic)"
        );

        JoinRoomResult::Joined {
            room: updated_room,
            previous,
        }
    }

    #[instrument(skip(self))]
    async fn leave_room(&self, room_id: &str, connection_id: &str) -> LeaveRoomResult {
        let mut store = self.store.lock().await;
        let result = store.remove_member(room_id, connection_id);

        debug_assert!(store.is_consistent());
        if let LeaveRoomResult::Left(departure) = &result {
            info!(
                room_id = %room_id,
                room_deleted = departure.room_deleted,
                "Participant left room (atomic)"
            );
        }

        result
    }

    #[instrument(skip(self))]
    async fn remove_connection(&self, connection_id: &str) -> DisconnectResult {
        let mut store = self.store.lock().await;
        let result = store.detach(connection_id);

        debug_assert!(store.is_consistent());
        result
    }

    async fn room_of(&self, connection_id: &str) -> Option<String> {
        let store = self.store.lock().await;
        store.index.get(connection_id).cloned()
    }

    async fn find_participant(&self, connection_id: &str) -> Option<(String, Participant)> {
        let store = self.store.lock().await;
        let room_id = store.index.get(connection_id)?;
        let participant = store.rooms.get(room_id)?.get_participant(connection_id)?;
        Some((room_id.clone(), participant.clone()))
    }

    async fn are_co_members(&self, first: &str, second: &str, room_id: &str) -> bool {
        let store = self.store.lock().await;
        let in_room = |connection_id: &str| {
            store.index.get(connection_id).map(String::as_str) == Some(room_id)
        };
        in_room(first) && in_room(second)
    }
}
