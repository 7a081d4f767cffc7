//! Error types for the gateway layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Gateway error types
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The client supplied a missing or empty room identifier. Rejected at
    /// the handshake or through the join acknowledgement, never retried.
    #[error("Invalid room: a non-empty room identifier is required")]
    InvalidRoom,

    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::InvalidRoom => StatusCode::BAD_REQUEST,
            GatewayError::WebSocketError(_) | GatewayError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code used in `error` acknowledgement events.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::InvalidRoom => "invalid_room",
            GatewayError::WebSocketError(_) => "websocket_error",
            GatewayError::InternalError(_) => "internal_error",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = json!({
            "error": self.code(),
            "message": self.to_string(),
        });

        (status, Json(error_response)).into_response()
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
