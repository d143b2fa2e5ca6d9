use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::config::RelayConfig;
use crate::relay::{BroadcastRelay, ConnectionLifecycle, RelayError, SignalRouter};
use crate::room::{
    repository::{InMemoryRoomRepository, RoomRepository},
    RoomService,
};
use crate::websockets::{ConnectionManager, EventDispatcher, InMemoryConnectionManager};

/// Shared application state containing all dependencies
///
/// One instance per relay process; every handler gets it by handle.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub room_service: Arc<RoomService>,
    pub connection_manager: Arc<dyn ConnectionManager>,
    pub lifecycle: Arc<ConnectionLifecycle>,
    pub dispatcher: Arc<EventDispatcher>,
}

impl AppState {
    /// Wires the in-memory store and connection manager
    pub fn new(config: RelayConfig) -> Self {
        Self::with_components(
            config,
            Arc::new(InMemoryRoomRepository::new()),
            Arc::new(InMemoryConnectionManager::new()),
        )
    }

    pub fn with_components(
        config: RelayConfig,
        room_repository: Arc<dyn RoomRepository>,
        connection_manager: Arc<dyn ConnectionManager>,
    ) -> Self {
        let broadcast = Arc::new(BroadcastRelay::new(
            room_repository.clone(),
            connection_manager.clone(),
        ));
        let signal_router = Arc::new(SignalRouter::new(
            room_repository.clone(),
            connection_manager.clone(),
        ));
        let room_service = Arc::new(RoomService::new(room_repository, broadcast.clone()));
        let lifecycle = Arc::new(ConnectionLifecycle::new(
            room_service.clone(),
            connection_manager.clone(),
        ));
        let dispatcher = Arc::new(EventDispatcher::new(
            room_service.clone(),
            broadcast,
            signal_router,
        ));

        Self {
            config: Arc::new(config),
            room_service,
            connection_manager,
            lifecycle,
            dispatcher,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal,
}

impl From<RelayError> for AppError {
    fn from(error: RelayError) -> Self {
        match error {
            RelayError::RoomNotFound => AppError::NotFound(error.to_string()),
            e if e.is_internal() => AppError::Internal,
            e => AppError::BadRequest(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
