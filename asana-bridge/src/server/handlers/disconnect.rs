use axum::{extract::State, http::StatusCode};
use tracing::Instrument;

use super::AuthenticatedUser;
use crate::server::{error::ServerError, AppState};

/// Remove the caller's stored Asana credential.
pub async fn disconnect(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<StatusCode, ServerError> {
    let span = tracing::info_span!("disconnect", user_id = %user.user_id);

    state
        .asana
        .refresher()
        .disconnect(&user.user_id)
        .instrument(span)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
