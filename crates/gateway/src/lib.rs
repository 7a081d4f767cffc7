//! # Parlor Gateway Crate
//!
//! Terminates client WebSocket connections, keeps the per-instance room
//! membership, and translates client events into fan-out bus publishes and
//! back into delivery events.
//!
//! The gateway never writes to storage: a client message becomes a bus
//! publish and nothing else, so recipient latency never depends on storage
//! latency. Membership is purely in-memory and dies with the instance.

pub mod error;
pub mod rest;
pub mod rooms;
pub mod state;
pub mod websocket;

pub use error::{GatewayError, GatewayResult};
pub use rooms::{RoomRegistry, SessionId};
pub use state::GatewayState;
pub use websocket::events::{ClientEvent, ServerEvent};

use axum::{http::Method, routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Create the gateway router: the chat WebSocket endpoint plus health.
pub fn create_router(state: GatewayState) -> Router {
    let arc_state = Arc::new(state);
    Router::new()
        .route("/ws/chat", get(websocket::chat_websocket_handler))
        .route("/health", get(rest::health_check))
        .with_state(arc_state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(Any),
        )
}
