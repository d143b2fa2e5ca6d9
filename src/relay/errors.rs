use thiserror::Error;

/// Request-level failures of the relay core.
///
/// Every variant is recoverable and local to the event that produced it. The
/// `Display` text is what clients see in the `error` field of an ack.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("Room not found")]
    RoomNotFound,

    #[error("User is not in the room")]
    NotMember,

    #[error("User is not in any room")]
    NotInRoom,

    #[error("Missing required fields")]
    MissingFields,

    #[error("Users are not in the same room")]
    NotCoMembers,

    /// The id generator kept colliding with live rooms. Not expected in practice.
    #[error("Could not allocate a room id")]
    RoomIdExhausted,
}

impl RelayError {
    /// Whether this error is an internal fault rather than bad client input
    pub fn is_internal(&self) -> bool {
        matches!(self, RelayError::RoomIdExhausted)
    }
}
