use axum::{
    extract::{Query, State},
    response::Redirect,
};
use tracing::Instrument;

use crate::error::BridgeError;
use crate::server::{models::CallbackParams, AppState};

fn redirect_with_error(frontend_url: &str, message: &str) -> Redirect {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("error", message)
        .finish();
    Redirect::to(&format!("{}/?{}", frontend_url, query))
}

/// Asana redirects here after consent. The browser is always sent back to the
/// frontend, either with `asana_connected=true` or with an `error` message.
pub async fn oauth_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    let frontend_url = state.config.server.frontend_url.clone();

    match complete_authorization(&state, params).await {
        Ok(()) => Redirect::to(&format!("{}/?asana_connected=true", frontend_url)),
        Err(BridgeError::Callback(message)) => redirect_with_error(&frontend_url, &message),
        Err(other) => redirect_with_error(&frontend_url, &other.to_string()),
    }
}

/// Validates the callback and stores the exchanged credential under the
/// identity that minted `state`.
async fn complete_authorization(
    state: &AppState,
    params: CallbackParams,
) -> Result<(), BridgeError> {
    if let Some(error) = params.error {
        // Burn the pending authorization so the state cannot be replayed
        if let Some(oauth_state) = params.state.as_deref() {
            state.session_store.take_session(oauth_state);
        }
        tracing::warn!(error = %error, description = ?params.error_description, "Asana authorization denied");
        return Err(BridgeError::Callback(error));
    }

    let (Some(code), Some(oauth_state)) = (
        params.code.filter(|code| !code.is_empty()),
        params.state.filter(|state| !state.is_empty()),
    ) else {
        tracing::warn!("Callback without code or state");
        return Err(BridgeError::Callback(
            "Missing code or state parameter".to_string(),
        ));
    };

    let pending = state.session_store.take_session(&oauth_state).ok_or_else(|| {
        tracing::warn!("Callback with unknown or expired state");
        BridgeError::Callback("Invalid or expired authorization state".to_string())
    })?;

    let span = tracing::info_span!("oauth_callback", user_id = %pending.user_id);
    async {
        match state.asana.refresher().connect(&pending.user_id, &code).await {
            Ok(_) => {
                tracing::info!("Asana account connected");
                Ok(())
            }
            Err(err @ BridgeError::OAuth(_)) => {
                tracing::warn!(error = %err, "Authorization code exchange failed");
                Err(BridgeError::Callback(
                    "Failed to exchange authorization code".to_string(),
                ))
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to store Asana credential");
                Err(BridgeError::Callback(
                    "Failed to store Asana credentials".to_string(),
                ))
            }
        }
    }
    .instrument(span)
    .await
}
