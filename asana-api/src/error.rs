use serde::{Deserialize, Serialize};
use tower_api_client::{Error as ApiError, StatusCode};

#[derive(Debug)]
pub enum AsanaApiError {
    /// Non-success response from Asana, with the raw response body.
    Asana(StatusCode, String),
    Internal(ApiError),
}

impl AsanaApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AsanaApiError::Asana(status, _) => Some(*status),
            AsanaApiError::Internal(_) => None,
        }
    }

    /// First human-readable message in an Asana error body, if it parses as one.
    pub fn message(&self) -> Option<String> {
        match self {
            AsanaApiError::Asana(_, body) => serde_json::from_str::<ErrorResponse>(body)
                .ok()
                .and_then(|response| response.errors.into_iter().next())
                .map(|error| error.message),
            AsanaApiError::Internal(_) => None,
        }
    }
}

impl From<ApiError> for AsanaApiError {
    fn from(value: ApiError) -> Self {
        match value {
            ApiError::ClientError(status, body) | ApiError::ServerError(status, body) => {
                AsanaApiError::Asana(status, body)
            }
            e => AsanaApiError::Internal(e),
        }
    }
}

impl std::fmt::Display for AsanaApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AsanaApiError::Internal(e) => write!(f, "Internal error: {}", e),
            AsanaApiError::Asana(status, body) => match self.message() {
                Some(message) => write!(f, "({}) {}", status, message),
                None => write!(f, "({}) {}", status, body),
            },
        }
    }
}

impl std::error::Error for AsanaApiError {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(default)]
    pub help: Option<String>,
}
