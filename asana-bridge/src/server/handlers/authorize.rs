use axum::{extract::State, Json};

use super::AuthenticatedUser;
use crate::server::{models::AuthorizeResponse, AppState};

/// Start connecting the caller's Asana account.
pub async fn authorize(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Json<AuthorizeResponse> {
    let span = tracing::info_span!("authorize", user_id = %user.user_id);
    let _enter = span.enter();

    let oauth_state = state.session_store.create_session(&user.user_id);
    let authorization_url = state.oauth_client.build_authorization_url(&oauth_state);

    tracing::info!("Initiated Asana authorization");

    Json(AuthorizeResponse { authorization_url })
}
