use asana_api::AsanaApiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error(
        "Asana account not connected. Connect it through /asana/authorize to enable these features."
    )]
    NotConnected,

    #[error("Asana token refresh failed: {0}. Please reconnect your Asana account.")]
    RefreshFailed(String),

    #[error("Asana API error ({status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("Asana request failed: {0}")]
    Transport(String),

    #[error("Authorization callback failed: {0}")]
    Callback(String),

    #[error("No user identity found in the verified bearer token")]
    IdentityUnresolved,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("OAuth token request failed: {0}")]
    OAuth(String),

    #[error("Token storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<AsanaApiError> for BridgeError {
    fn from(err: AsanaApiError) -> Self {
        match err {
            AsanaApiError::Asana(status, body) => BridgeError::Upstream {
                status: status.as_u16(),
                body,
            },
            AsanaApiError::Internal(e) => BridgeError::Transport(e.to_string()),
        }
    }
}

impl From<config::ConfigError> for BridgeError {
    fn from(err: config::ConfigError) -> Self {
        BridgeError::Configuration(err.to_string())
    }
}

impl
    From<
        oauth2::RequestTokenError<
            reqwest::Error,
            oauth2::StandardErrorResponse<oauth2::basic::BasicErrorResponseType>,
        >,
    > for BridgeError
{
    fn from(
        err: oauth2::RequestTokenError<
            reqwest::Error,
            oauth2::StandardErrorResponse<oauth2::basic::BasicErrorResponseType>,
        >,
    ) -> Self {
        BridgeError::OAuth(err.to_string())
    }
}
