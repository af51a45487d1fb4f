mod auth;
mod authorize;
mod callback;
mod disconnect;
mod metadata;

pub use auth::{require_user, AuthenticatedUser};
pub use authorize::authorize;
pub use callback::oauth_callback;
pub use disconnect::disconnect;
pub use metadata::{authorization_server_metadata, protected_resource_metadata};

use crate::server::models::HealthResponse;
use axum::Json;

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
