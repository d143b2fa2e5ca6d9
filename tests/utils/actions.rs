#![allow(dead_code)]

use serde_json::{json, Value};
use tokio::sync::mpsc;

use jamrelay::websockets::{MessageHandler, MessageType, WebSocketMessage};

use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

impl TestSetup {
    /// Send a raw text frame as `connection_id`
    pub async fn send_raw(&self, connection_id: &str, frame: String) {
        self.input_handler.handle_message(connection_id, frame).await;
    }

    /// Send an event without asking for an ack
    pub async fn send_event(&self, connection_id: &str, event: MessageType, payload: Value) {
        let event_name: &str = event.as_ref();
        let frame = json!({ "type": event_name, "payload": payload });
        self.send_raw(connection_id, frame.to_string()).await;
    }

    /// Send an event with a request id and return the ack addressed to the sender.
    /// Frames queued for the sender before the ack are discarded.
    pub async fn request(
        &self,
        connection_id: &str,
        event: MessageType,
        payload: Value,
        request_id: u64,
    ) -> Value {
        let event_name: &str = event.as_ref();
        let frame = json!({
            "type": event_name,
            "payload": payload,
            "meta": { "timestamp": chrono::Utc::now(), "requestId": request_id }
        });
        self.send_raw(connection_id, frame.to_string()).await;

        while let Some(raw) = self.mock_conn_manager.consume_message_for(connection_id).await {
            let message: WebSocketMessage = serde_json::from_str(&raw).unwrap();
            let answers_request = message
                .meta
                .as_ref()
                .and_then(|meta| meta.request_id)
                == Some(request_id);
            if message.message_type == MessageType::Ack && answers_request {
                return message.payload;
            }
        }
        panic!("{} received no ack for request {}", connection_id, request_id);
    }

    /// Clear all recorded messages
    pub async fn clear_messages(&self) {
        self.mock_conn_manager.clear_messages().await;
    }

    // ============================================================================
    // Convenience Action Methods
    // ============================================================================

    /// Open a real lifecycle connection; returns the assigned id
    pub async fn connect(&self) -> String {
        let (sender, _receiver) = mpsc::unbounded_channel();
        self.state.lifecycle.connect(sender).await
    }

    pub async fn disconnect(&self, connection_id: &str) {
        self.state.lifecycle.disconnect(connection_id).await;
    }

    pub async fn create_room(&self, connection_id: &str, name: &str, instrument: &str) -> Value {
        self.request(
            connection_id,
            MessageType::CreateRoom,
            json!({ "name": name, "instrument": instrument }),
            1,
        )
        .await
    }

    pub async fn join_room(
        &self,
        connection_id: &str,
        room_id: &str,
        name: &str,
        instrument: &str,
    ) -> Value {
        self.request(
            connection_id,
            MessageType::JoinRoom,
            json!({ "roomId": room_id, "name": name, "instrument": instrument }),
            2,
        )
        .await
    }

    pub async fn leave_room(&self, connection_id: &str, room_id: &str) -> Value {
        self.request(
            connection_id,
            MessageType::LeaveRoom,
            json!({ "roomId": room_id }),
            3,
        )
        .await
    }

    pub async fn send_chat(&self, connection_id: &str, text: &str) -> Value {
        self.request(
            connection_id,
            MessageType::SendMessage,
            json!({ "text": text }),
            4,
        )
        .await
    }

    pub async fn send_signal(&self, connection_id: &str, payload: Value) -> Value {
        self.request(connection_id, MessageType::WebrtcSignal, payload, 5)
            .await
    }

    /// Whether the room store and connection index agree
    pub async fn assert_consistent(&self) {
        assert!(
            self.repository.is_consistent().await,
            "room map and connection index disagree"
        );
    }
}
