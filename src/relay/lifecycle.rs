use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::room::service::RoomService;
use crate::websockets::{ConnectionManager, WebSocketMessage};

/// Reacts to sockets opening and closing.
///
/// A connection starts unassigned, moves in and out of rooms through
/// create/join/leave, and is terminated on disconnect. Disconnect always runs
/// room cleanup, whatever state the connection was in.
pub struct ConnectionLifecycle {
    room_service: Arc<RoomService>,
    connection_manager: Arc<dyn ConnectionManager>,
}

impl ConnectionLifecycle {
    pub fn new(
        room_service: Arc<RoomService>,
        connection_manager: Arc<dyn ConnectionManager>,
    ) -> Self {
        Self {
            room_service,
            connection_manager,
        }
    }

    /// Assigns a fresh connection id, registers the outbound channel and
    /// greets the client with its id. Never assigns a room.
    pub async fn connect(&self, sender: mpsc::UnboundedSender<String>) -> String {
        let connection_id = Uuid::new_v4().to_string();

        self.connection_manager
            .add_connection(connection_id.clone(), sender)
            .await;

        if let Some(json) = WebSocketMessage::connection_established(connection_id.clone()).to_json()
        {
            self.connection_manager
                .send_to_connection(&connection_id, &json)
                .await;
        }

        info!(connection_id = %connection_id, "Client connected");
        connection_id
    }

    /// Drops the outbound channel and removes the connection from its room
    pub async fn disconnect(&self, connection_id: &str) {
        self.connection_manager
            .remove_connection(connection_id)
            .await;
        self.room_service.handle_disconnect(connection_id).await;

        info!(connection_id = %connection_id, "Client disconnected");
    }
}
