use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::error::BridgeError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
        /// Advertised in `WWW-Authenticate` so clients can discover the authorization server.
        resource_metadata: String,
    },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let mut challenge = None;
        let (status, error_message) = match self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ServerError::Unauthorized {
                message,
                resource_metadata,
            } => {
                challenge = HeaderValue::from_str(&format!(
                    "Bearer error=\"invalid_token\", resource_metadata=\"{}\"",
                    resource_metadata
                ))
                .ok();
                (StatusCode::UNAUTHORIZED, message)
            }
            ServerError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ServerError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            ServerError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        let mut response = (status, body).into_response();
        if let Some(value) = challenge {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, value);
        }
        response
    }
}

impl From<BridgeError> for ServerError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::NotConnected => ServerError::NotFound(err.to_string()),
            BridgeError::IdentityUnresolved => ServerError::Forbidden(err.to_string()),
            BridgeError::InvalidInput(msg) | BridgeError::Callback(msg) => {
                ServerError::BadRequest(msg)
            }
            BridgeError::Upstream { .. }
            | BridgeError::Transport(_)
            | BridgeError::RefreshFailed(_)
            | BridgeError::OAuth(_) => ServerError::Upstream(err.to_string()),
            other => ServerError::Internal(other.to_string()),
        }
    }
}
