use serde::{Deserialize, Serialize};

// POST /asana/authorize
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorizeResponse {
    pub authorization_url: String,
}

// GET /asana/callback
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

// GET /.well-known/oauth-protected-resource
#[derive(Debug, Serialize, Deserialize)]
pub struct ProtectedResourceMetadata {
    pub resource: String,
    pub authorization_servers: Vec<String>,
    pub scopes_supported: Vec<String>,
}

// Health check
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
