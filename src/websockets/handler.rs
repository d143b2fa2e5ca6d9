use async_trait::async_trait;
use axum::{
    extract::{ws::WebSocket, State, WebSocketUpgrade},
    response::Response,
};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::shared::AppState;
use crate::websockets::messages::{error_payload, IncomingMessage, MessageType, WebSocketMessage};

use super::connection_manager::ConnectionManager;
use super::dispatcher::{DispatchError, EventDispatcher};
use super::socket::{Connection, MessageHandler};

/// Message handler for receiving WebSocket messages from the client
pub struct WebsocketReceiveHandler {
    dispatcher: Arc<EventDispatcher>,
    connection_manager: Arc<dyn ConnectionManager>,
}

impl WebsocketReceiveHandler {
    pub fn new(
        dispatcher: Arc<EventDispatcher>,
        connection_manager: Arc<dyn ConnectionManager>,
    ) -> Self {
        Self {
            dispatcher,
            connection_manager,
        }
    }

    async fn reply(&self, connection_id: &str, message: WebSocketMessage) {
        if let Some(json) = message.to_json() {
            self.connection_manager
                .send_to_connection(connection_id, &json)
                .await;
        }
    }
}

#[async_trait]
impl MessageHandler for WebsocketReceiveHandler {
    async fn handle_message(&self, connection_id: &str, message: String) {
        debug!(connection_id = %connection_id, message = %message, "Received message");

        let incoming = match serde_json::from_str::<IncomingMessage>(&message) {
            Ok(incoming) => incoming,
            Err(e) => {
                warn!(
                    connection_id = %connection_id,
                    error = %e,
                    "Failed to parse WebSocket message"
                );
                self.reply(
                    connection_id,
                    WebSocketMessage::error(format!("Invalid message: {}", e)),
                )
                .await;
                return;
            }
        };

        let request_id = incoming.request_id();
        let result = match MessageType::from_str(&incoming.event) {
            Ok(event) => {
                self.dispatcher
                    .dispatch(connection_id, event, incoming.payload)
                    .await
            }
            Err(_) => Err(DispatchError::UnknownEvent(incoming.event.clone())),
        };

        if let Err(e) = &result {
            info!(
                connection_id = %connection_id,
                event = %incoming.event,
                error = %e,
                "Event rejected"
            );
        }

        let reply = match (request_id, result) {
            (Some(request_id), Ok(payload)) => Some(WebSocketMessage::ack(request_id, payload)),
            (Some(request_id), Err(e)) => {
                Some(WebSocketMessage::ack(request_id, error_payload(e)))
            }
            (None, Ok(_)) => None,
            (None, Err(e)) => Some(WebSocketMessage::error(e.to_string())),
        };

        if let Some(reply) = reply {
            self.reply(connection_id, reply).await;
        }
    }
}

/// WebSocket endpoint, GET /ws
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
) -> Response {
    debug!("WebSocket connection requested");
    ws.on_upgrade(move |socket| handle_websocket_connection(socket, app_state))
}

/// Handle the upgraded WebSocket connection
async fn handle_websocket_connection(socket: WebSocket, app_state: AppState) {
    // Create the outbound channel (relay -> client)
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();

    let connection_id = app_state.lifecycle.connect(outbound_sender).await;

    let message_handler = Arc::new(WebsocketReceiveHandler::new(
        app_state.dispatcher.clone(),
        app_state.connection_manager.clone(),
    ));

    let connection = Connection::new(
        connection_id.clone(),
        Box::new(socket),
        outbound_receiver,
        message_handler,
    );

    match connection.run().await {
        Ok(()) => {
            info!(connection_id = %connection_id, "WebSocket connection closed cleanly");
        }
        Err(e) => {
            warn!(
                connection_id = %connection_id,
                error = ?e,
                "WebSocket connection error"
            );
        }
    }

    app_state.lifecycle.disconnect(&connection_id).await;
}
