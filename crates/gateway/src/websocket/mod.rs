//! WebSocket endpoints for the gateway

pub mod events;
pub mod session;

pub use session::chat_websocket_handler;
