use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const ROOM_ID_LENGTH: usize = 8;

const ROOM_ID_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Trait for generating room ids
///
/// Called while the room store is locked, so implementations must not block.
pub trait RoomIdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random lowercase alphanumeric tokens
pub struct RandomRoomIdGenerator;

impl RandomRoomIdGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RandomRoomIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomIdGenerator for RandomRoomIdGenerator {
    fn generate(&self) -> String {
        let mut rng = rand::rng();
        (0..ROOM_ID_LENGTH)
            .map(|_| char::from(ROOM_ID_CHARSET[rng.random_range(0..ROOM_ID_CHARSET.len())]))
            .collect()
    }
}

/// Hands out `ids` in order, then `<prefix><n>` once they run out.
/// Deterministic ids for tests and local debugging.
pub struct SequentialRoomIdGenerator {
    ids: Vec<String>,
    prefix: String,
    next: AtomicUsize,
}

impl SequentialRoomIdGenerator {
    pub fn new(ids: Vec<&str>) -> Self {
        Self {
            ids: ids.into_iter().map(|s| s.to_string()).collect(),
            prefix: "room-".to_string(),
            next: AtomicUsize::new(0),
        }
    }

    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            ids: Vec::new(),
            prefix: prefix.to_string(),
            next: AtomicUsize::new(0),
        }
    }
}

impl RoomIdGenerator for SequentialRoomIdGenerator {
    fn generate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        match self.ids.get(n) {
            Some(id) => id.clone(),
            None => format!("{}{}", self.prefix, n + 1),
        }
    }
}
