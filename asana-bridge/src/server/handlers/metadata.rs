use axum::{extract::State, http::HeaderMap, Json};
use serde_json::Value;

use crate::http::shared_client;
use crate::server::{error::ServerError, models::ProtectedResourceMetadata, AppState};

pub async fn protected_resource_metadata(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<ProtectedResourceMetadata> {
    Json(ProtectedResourceMetadata {
        resource: format!("{}/", state.origin(&headers)),
        authorization_servers: vec![state.config.stytch.domain.clone()],
        scopes_supported: vec![
            "openid".to_string(),
            "email".to_string(),
            "profile".to_string(),
        ],
    })
}

/// Relays the identity provider's authorization server metadata.
pub async fn authorization_server_metadata(
    State(state): State<AppState>,
) -> Result<Json<Value>, ServerError> {
    let url = format!(
        "{}/.well-known/oauth-authorization-server",
        state.config.stytch.domain
    );

    let response = shared_client()
        .get(&url)
        .send()
        .await
        .map_err(|e| ServerError::Upstream(format!("Failed to fetch metadata: {}", e)))?;

    if !response.status().is_success() {
        return Err(ServerError::Upstream(format!(
            "Authorization server metadata returned {}",
            response.status()
        )));
    }

    let metadata = response
        .json()
        .await
        .map_err(|e| ServerError::Upstream(format!("Invalid metadata: {}", e)))?;
    Ok(Json(metadata))
}
