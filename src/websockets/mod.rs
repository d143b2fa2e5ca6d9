// Public API
pub use connection_manager::{ConnectionManager, InMemoryConnectionManager};
pub use dispatcher::{DispatchError, EventDispatcher};
pub use handler::{websocket_handler, WebsocketReceiveHandler};
pub use messages::{MessageType, WebSocketMessage};
pub use socket::MessageHandler;

// Internal modules
mod connection_manager;
mod dispatcher;
mod handler;
pub mod messages;
mod socket;
