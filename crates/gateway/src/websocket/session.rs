//! Chat WebSocket session handling.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use parlor_messages::is_valid_room;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::GatewayError;
use crate::rooms::SessionId;
use crate::state::GatewayState;
use crate::websocket::events::{ClientEvent, ServerEvent};

#[derive(Debug, Deserialize)]
pub struct WebSocketQuery {
    /// Optional room to join during the handshake. A present-but-empty
    /// value rejects the upgrade.
    room: Option<String>,
}

/// Chat WebSocket connection handler
pub async fn chat_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<WebSocketQuery>,
) -> Result<Response, GatewayError> {
    if let Some(room) = &query.room {
        if !is_valid_room(room) {
            return Err(GatewayError::InvalidRoom);
        }
    }

    Ok(ws.on_upgrade(move |socket| handle_chat_socket(socket, state, query.room)))
}

async fn handle_chat_socket(
    socket: WebSocket,
    state: Arc<GatewayState>,
    handshake_room: Option<String>,
) {
    let session: SessionId = Uuid::new_v4();
    let (tx, mut rx) = mpsc::unbounded_channel();
    state.registry.register(session, tx.clone()).await;
    info!(%session, "chat session connected");

    if let Some(room) = handshake_room {
        match state.registry.join(session, &room).await {
            Ok(()) => {
                let _ = tx.send(ServerEvent::Joined { room });
            }
            Err(err) => {
                let _ = tx.send(error_event(&err));
            }
        }
    }

    let (mut sink, mut stream) = socket.split();

    // Outbound half: everything the registry or the event handlers queue for
    // this session goes out here.
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Ok(text) = serde_json::to_string(&event) else {
                continue;
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(message) = stream.next().await {
        let Ok(message) = message else {
            break;
        };
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => handle_client_event(event, &state, session, &tx).await,
                Err(err) => {
                    warn!(%session, error = %err, "ignoring unparseable client event");
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.registry.remove_session(session).await;
    send_task.abort();
    info!(%session, "chat session disconnected");
}

async fn handle_client_event(
    event: ClientEvent,
    state: &Arc<GatewayState>,
    session: SessionId,
    tx: &mpsc::UnboundedSender<ServerEvent>,
) {
    match event {
        ClientEvent::Ping => {
            let _ = tx.send(ServerEvent::Pong);
        }
        ClientEvent::Join { room } => match state.registry.join(session, &room).await {
            Ok(()) => {
                let _ = tx.send(ServerEvent::Joined { room });
            }
            Err(err) => {
                let _ = tx.send(error_event(&err));
            }
        },
        ClientEvent::Leave { room } => match state.registry.leave(session, &room).await {
            Ok(()) => {
                let _ = tx.send(ServerEvent::Left { room });
            }
            Err(err) => {
                let _ = tx.send(error_event(&err));
            }
        },
        ClientEvent::Message { room, message } => {
            if !is_valid_room(&room) {
                let _ = tx.send(error_event(&GatewayError::InvalidRoom));
                return;
            }
            // Fire-and-forget: a dropped publish is logged, never reported
            // back to the sender.
            if let Err(err) = state.bus.publish(&room, &message).await {
                warn!(%session, room = %room, error = %err, "dropping message publish");
            }
        }
    }
}

fn error_event(err: &GatewayError) -> ServerEvent {
    ServerEvent::Error {
        code: err.code().to_string(),
        message: err.to_string(),
    }
}
