use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::BridgeError;
use crate::http::shared_client;
use crate::server::config::{IdentityConfiguration, StytchConfiguration};

/// Claim names that may carry the subject, highest priority first.
pub const SUBJECT_CLAIMS: [&str; 4] = ["subject", "sub", "userId", "user_id"];

/// Introspection fields that describe the token rather than the user.
const TOKEN_FIELDS: [&str; 5] = ["active", "scope", "aud", "exp", "client_id"];

/// A bearer token the identity provider vouched for.
#[derive(Debug, Clone, Default)]
pub struct VerifiedToken {
    pub client_id: Option<String>,
    pub scopes: Vec<String>,
    pub expires_at: Option<i64>,
    pub claims: Map<String, Value>,
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Fails with `Unauthorized` for tokens the provider does not accept.
    async fn verify(&self, token: &str) -> Result<VerifiedToken, BridgeError>;
}

#[derive(Debug, Deserialize)]
struct IntrospectionResponse {
    #[serde(default)]
    active: bool,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    exp: Option<i64>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

/// Verifies tokens with Stytch's OAuth introspection endpoint.
pub struct StytchVerifier {
    introspection_url: String,
    project_id: String,
    project_secret: String,
}

impl StytchVerifier {
    pub fn new(config: &StytchConfiguration) -> Self {
        Self {
            introspection_url: format!("{}/v1/oauth2/introspect", config.domain),
            project_id: config.project_id.clone(),
            project_secret: config.project_secret.clone(),
        }
    }
}

#[async_trait]
impl TokenVerifier for StytchVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedToken, BridgeError> {
        let response = shared_client()
            .post(&self.introspection_url)
            .form(&[
                ("token", token),
                ("client_id", self.project_id.as_str()),
                ("client_secret", self.project_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| BridgeError::Unauthorized(format!("Token introspection failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "Token introspection rejected");
            return Err(BridgeError::Unauthorized(format!(
                "Token introspection returned {}",
                status
            )));
        }

        let introspection: IntrospectionResponse = response.json().await.map_err(|e| {
            BridgeError::Unauthorized(format!("Invalid introspection response: {}", e))
        })?;
        if !introspection.active {
            return Err(BridgeError::Unauthorized("Token is not active".to_string()));
        }

        let mut claims = introspection.rest;
        for field in TOKEN_FIELDS {
            claims.remove(field);
        }

        Ok(VerifiedToken {
            client_id: introspection.client_id,
            scopes: introspection
                .scope
                .map(|scope| scope.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            expires_at: introspection.exp,
            claims,
        })
    }
}

/// First non-empty string among [`SUBJECT_CLAIMS`].
pub fn extract_subject(claims: &Map<String, Value>) -> Option<String> {
    SUBJECT_CLAIMS.iter().find_map(|name| {
        claims
            .get(*name)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    })
}

/// Turns a verified token into the identity that keys the token store.
#[derive(Debug, Clone)]
pub struct SubjectResolver {
    allow_shared_fallback: bool,
    default_user_id: String,
}

impl SubjectResolver {
    pub fn new(config: &IdentityConfiguration) -> Self {
        Self {
            allow_shared_fallback: config.allow_shared_fallback,
            default_user_id: config.default_user_id.clone(),
        }
    }

    pub fn resolve(&self, token: &VerifiedToken) -> Result<String, BridgeError> {
        if let Some(subject) = extract_subject(&token.claims) {
            return Ok(subject);
        }

        if self.allow_shared_fallback {
            tracing::warn!(
                default_user_id = %self.default_user_id,
                "No subject claim in verified token, using shared identity"
            );
            return Ok(self.default_user_id.clone());
        }

        tracing::warn!(
            client_id = ?token.client_id,
            "No subject claim in verified token"
        );
        Err(BridgeError::IdentityUnresolved)
    }
}
