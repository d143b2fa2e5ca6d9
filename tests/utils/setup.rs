use std::sync::Arc;

use jamrelay::{
    config::RelayConfig,
    room::{generators::SequentialRoomIdGenerator, repository::InMemoryRoomRepository},
    shared::AppState,
    websockets::WebsocketReceiveHandler,
};

use super::mocks::MockConnectionManager;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub state: AppState,
    pub repository: Arc<InMemoryRoomRepository>,
    pub mock_conn_manager: Arc<MockConnectionManager>,
    pub input_handler: WebsocketReceiveHandler,
    pub connections: Vec<String>,
}

pub struct TestSetupBuilder {
    connections: Vec<String>,
    room_ids: Vec<String>,
}

#[allow(dead_code)]
impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            connections: vec![],
            room_ids: vec![],
        }
    }

    /// Connections registered under these ids before the test starts
    pub fn with_connections(mut self, connections: Vec<&str>) -> Self {
        self.connections = connections.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_two_connections(self) -> Self {
        self.with_connections(vec!["alice", "bob"])
    }

    pub fn with_three_connections(self) -> Self {
        self.with_connections(vec!["alice", "bob", "carol"])
    }

    /// Room ids handed out in order; `r1`, `r2`, ... by default
    pub fn with_room_ids(mut self, room_ids: Vec<&str>) -> Self {
        self.room_ids = room_ids.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub async fn build(self) -> TestSetup {
        let generator = if self.room_ids.is_empty() {
            SequentialRoomIdGenerator::with_prefix("r")
        } else {
            SequentialRoomIdGenerator::new(self.room_ids.iter().map(String::as_str).collect())
        };
        let repository = Arc::new(InMemoryRoomRepository::with_id_generator(Arc::new(
            generator,
        )));
        let mock_conn_manager = Arc::new(MockConnectionManager::new());

        let state = AppState::with_components(
            RelayConfig::default(),
            repository.clone(),
            mock_conn_manager.clone(),
        );

        for connection in &self.connections {
            mock_conn_manager.add_connected(connection).await;
        }

        let input_handler = WebsocketReceiveHandler::new(
            state.dispatcher.clone(),
            state.connection_manager.clone(),
        );

        TestSetup {
            state,
            repository,
            mock_conn_manager,
            input_handler,
            connections: self.connections,
        }
    }
}
