// Library crate for the jam session signaling relay
// This file exposes the public API for integration tests

pub mod config;
pub mod relay;
pub mod room;
pub mod shared;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use config::RelayConfig;
pub use relay::{BroadcastRelay, ConnectionLifecycle, RelayError, SignalRouter};
pub use room::{
    models::{Participant, RoomModel},
    repository::{InMemoryRoomRepository, RoomRepository},
    RoomService,
};
pub use shared::{AppError, AppState};
pub use websockets::{
    ConnectionManager, DispatchError, EventDispatcher, InMemoryConnectionManager, MessageHandler,
    MessageType, WebSocketMessage, WebsocketReceiveHandler,
};
