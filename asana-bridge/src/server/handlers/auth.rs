use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::error::BridgeError;
use crate::server::{error::ServerError, services::VerifiedToken, AppState};

/// The caller behind a verified bearer token, resolved to a token store identity.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub token: VerifiedToken,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let unauthorized = |message: String| ServerError::Unauthorized {
            message,
            resource_metadata: state.resource_metadata_url(&parts.headers),
        };

        let token = bearer_token(&parts.headers)
            .ok_or_else(|| unauthorized("Missing bearer token".to_string()))?;

        let verified = state.verifier.verify(token).await.map_err(|e| match e {
            BridgeError::Unauthorized(message) => unauthorized(message),
            other => unauthorized(other.to_string()),
        })?;

        let user_id = state.resolver.resolve(&verified)?;

        Ok(Self {
            user_id,
            token: verified,
        })
    }
}

/// Authenticates `/mcp` requests and leaves the caller in the request
/// extensions, where tool handlers read it back.
pub async fn require_user(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let (mut parts, body) = request.into_parts();
    let user = AuthenticatedUser::from_request_parts(&mut parts, &state).await?;
    tracing::debug!(user_id = %user.user_id, "Authenticated MCP request");
    parts.extensions.insert(user);
    Ok(next.run(Request::from_parts(parts, body)).await)
}
