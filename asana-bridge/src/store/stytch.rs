use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::TokenStore;
use crate::common::CredentialRecord;
use crate::error::BridgeError;
use crate::http::shared_client;
use crate::locks::KeyedLocks;

/// Key under the user's `trusted_metadata` holding the Asana credential.
pub const METADATA_KEY: &str = "asanaTokens";

#[derive(Debug, Deserialize)]
struct UserResponse {
    #[serde(default)]
    trusted_metadata: Option<Map<String, Value>>,
}

/// Keeps each user's credential inside their Stytch user record.
///
/// Writes are read-modify-write on the whole `trusted_metadata` object, so they
/// are serialized per user to avoid dropping a concurrent update.
pub struct StytchMetadataStore {
    api_url: String,
    project_id: String,
    project_secret: String,
    locks: KeyedLocks,
}

impl StytchMetadataStore {
    pub fn new(
        api_url: impl Into<String>,
        project_id: impl Into<String>,
        project_secret: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            project_secret: project_secret.into(),
            locks: KeyedLocks::new(),
        }
    }

    fn user_url(&self, user_id: &str) -> String {
        format!("{}/v1/users/{}", self.api_url, user_id)
    }

    /// `Ok(None)` when the user does not exist.
    async fn metadata(&self, user_id: &str) -> Result<Option<Map<String, Value>>, BridgeError> {
        let response = shared_client()
            .get(self.user_url(user_id))
            .basic_auth(&self.project_id, Some(&self.project_secret))
            .send()
            .await
            .map_err(|e| BridgeError::Storage(format!("Stytch request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BridgeError::Storage(format!(
                "Stytch user lookup failed ({}): {}",
                status, body
            )));
        }

        let user: UserResponse = response
            .json()
            .await
            .map_err(|e| BridgeError::Storage(format!("Invalid Stytch user response: {}", e)))?;
        Ok(Some(user.trusted_metadata.unwrap_or_default()))
    }

    async fn write_metadata(
        &self,
        user_id: &str,
        metadata: Map<String, Value>,
    ) -> Result<(), BridgeError> {
        let response = shared_client()
            .put(self.user_url(user_id))
            .basic_auth(&self.project_id, Some(&self.project_secret))
            .json(&serde_json::json!({ "trusted_metadata": metadata }))
            .send()
            .await
            .map_err(|e| BridgeError::Storage(format!("Stytch request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BridgeError::Storage(format!(
                "Stytch metadata update failed ({}): {}",
                status, body
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl TokenStore for StytchMetadataStore {
    async fn get(&self, user_id: &str) -> Result<Option<CredentialRecord>, BridgeError> {
        let Some(mut metadata) = self.metadata(user_id).await? else {
            return Ok(None);
        };

        match metadata.remove(METADATA_KEY) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value).map(Some).map_err(|e| {
                BridgeError::Storage(format!("Malformed stored Asana credential: {}", e))
            }),
        }
    }

    async fn set(&self, user_id: &str, record: CredentialRecord) -> Result<(), BridgeError> {
        let _guard = self.locks.lock(user_id).await;
        let mut metadata = self
            .metadata(user_id)
            .await?
            .ok_or_else(|| BridgeError::Storage(format!("Unknown Stytch user {}", user_id)))?;

        metadata.insert(METADATA_KEY.to_string(), serde_json::to_value(&record)?);
        self.write_metadata(user_id, metadata).await
    }

    async fn delete(&self, user_id: &str) -> Result<(), BridgeError> {
        let _guard = self.locks.lock(user_id).await;
        let Some(mut metadata) = self.metadata(user_id).await? else {
            return Ok(());
        };
        if !metadata.contains_key(METADATA_KEY) {
            return Ok(());
        }

        // Stytch merges top-level metadata keys, so removal is an explicit null
        metadata.insert(METADATA_KEY.to_string(), Value::Null);
        self.write_metadata(user_id, metadata).await
    }
}
