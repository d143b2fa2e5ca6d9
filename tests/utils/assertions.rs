//! Test assertion helpers - fluent API for verifying test expectations
#![allow(dead_code)] // Test utilities may not all be used in every test

use serde_json::Value;

use jamrelay::websockets::{MessageType, WebSocketMessage};

use super::setup::TestSetup;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct MessageAssertion<'a> {
    setup: &'a TestSetup,
    connections: Vec<&'a str>,
}

impl<'a> MessageAssertion<'a> {
    /// Create an assertion for every connection in the setup
    pub fn for_all_connections(setup: &'a TestSetup) -> Self {
        let connections = setup.connections.iter().map(String::as_str).collect();
        Self { setup, connections }
    }

    /// Create an assertion for specific connections
    pub fn for_connections(setup: &'a TestSetup, connections: Vec<&'a str>) -> Self {
        Self { setup, connections }
    }

    pub fn for_connection(setup: &'a TestSetup, connection: &'a str) -> Self {
        Self::for_connections(setup, vec![connection])
    }

    /// Assert that every connection received a message of this type next
    /// (consumes it) and that all of them got the same payload
    pub async fn received_message_type(self, expected_type: MessageType) -> MessageContent {
        let mut messages = vec![];

        for connection in &self.connections {
            let message = self
                .setup
                .mock_conn_manager
                .consume_message_for(connection)
                .await;
            let raw = message
                .unwrap_or_else(|| panic!("{} should have received a message", connection));

            let msg: WebSocketMessage = serde_json::from_str(&raw).unwrap();
            assert_eq!(
                msg.message_type, expected_type,
                "{} received wrong message type",
                connection
            );
            messages.push(msg);
        }

        let first_payload = &messages[0].payload;
        for (i, msg) in messages.iter().enumerate().skip(1) {
            assert_eq!(
                &msg.payload, first_payload,
                "{} payload differs from {}",
                self.connections[i], self.connections[0]
            );
        }

        MessageContent {
            payload: messages[0].payload.clone(),
        }
    }

    /// Assert that connections have no pending messages
    pub async fn received_no_messages(self) {
        for connection in &self.connections {
            let messages = self
                .setup
                .mock_conn_manager
                .get_messages_for(connection)
                .await;
            assert!(
                messages.is_empty(),
                "{} should not have received any messages, got {:?}",
                connection,
                messages
            );
        }
    }

    /// Count how many pending messages of a type a connection has (non-consuming)
    pub async fn count_message_type(&self, connection: &str, msg_type: MessageType) -> usize {
        let messages = self
            .setup
            .mock_conn_manager
            .get_messages_for(connection)
            .await;
        messages
            .iter()
            .filter_map(|msg_str| serde_json::from_str::<WebSocketMessage>(msg_str).ok())
            .filter(|msg| msg.message_type == msg_type)
            .count()
    }
}

// ============================================================================
// Message Content Assertions
// ============================================================================

pub struct MessageContent {
    payload: Value,
}

impl MessageContent {
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Assert a top-level payload field
    pub fn with_field(self, key: &str, expected: impl Into<Value>) -> Self {
        assert_eq!(self.payload[key], expected.into(), "field {}", key);
        self
    }

    /// Assert the relayed sender id
    pub fn from_connection(self, expected: &str) -> Self {
        self.with_field("from", expected)
    }

    /// Assert a `user_joined` payload names this participant
    pub fn with_user(self, expected_id: &str, expected_name: &str) -> Self {
        assert_eq!(self.payload["user"]["id"], expected_id);
        assert_eq!(self.payload["user"]["name"], expected_name);
        self
    }
}
