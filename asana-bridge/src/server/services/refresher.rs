use chrono::{Duration, Utc};
use std::sync::Arc;

use super::OAuthClient;
use crate::common::{CredentialRecord, REFRESH_SKEW};
use crate::error::BridgeError;
use crate::locks::KeyedLocks;
use crate::store::TokenStore;

/// Hands out currently-valid Asana access tokens, refreshing them as needed.
///
/// Refreshes are single-flight per identity: concurrent callers for the same
/// user wait on one lock, and every caller after the first finds the already
/// refreshed record. Refresh and persist run on their own task so a caller
/// going away cannot leave them half applied.
#[derive(Clone)]
pub struct CredentialRefresher {
    store: Arc<dyn TokenStore>,
    oauth_client: Arc<OAuthClient>,
    locks: KeyedLocks,
    skew: Duration,
}

impl CredentialRefresher {
    pub fn new(store: Arc<dyn TokenStore>, oauth_client: Arc<OAuthClient>) -> Self {
        Self {
            store,
            oauth_client,
            locks: KeyedLocks::new(),
            skew: REFRESH_SKEW,
        }
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// A token for `user_id` that is valid for at least the refresh skew.
    pub async fn access_token(&self, user_id: &str) -> Result<String, BridgeError> {
        let record = self
            .store
            .get(user_id)
            .await?
            .ok_or(BridgeError::NotConnected)?;

        if !record.is_expiring(Utc::now(), self.skew) {
            return Ok(record.access_token);
        }

        tracing::debug!(user_id = %user_id, expires_at = %record.expires_at, "Asana token expiring");

        let refresher = self.clone();
        let user_id = user_id.to_string();
        tokio::spawn(async move { refresher.refresh_exclusive(&user_id).await })
            .await
            .map_err(|e| BridgeError::Internal(format!("Refresh task failed: {}", e)))?
    }

    async fn refresh_exclusive(&self, user_id: &str) -> Result<String, BridgeError> {
        let _guard = self.locks.lock(user_id).await;

        // Re-read: whoever held the lock before us may have refreshed already
        let record = self
            .store
            .get(user_id)
            .await?
            .ok_or(BridgeError::NotConnected)?;
        if !record.is_expiring(Utc::now(), self.skew) {
            return Ok(record.access_token);
        }

        let refresh_token = record
            .refresh_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| BridgeError::RefreshFailed("no refresh token stored".to_string()))?;

        let grant = self
            .oauth_client
            .refresh(&refresh_token)
            .await
            .map_err(|e| {
                tracing::warn!(user_id = %user_id, error = %e, "Asana token refresh failed");
                BridgeError::RefreshFailed(e.to_string())
            })?;

        let updated = grant.into_record(Utc::now(), Some(refresh_token));
        self.store.set(user_id, updated.clone()).await?;

        tracing::info!(user_id = %user_id, expires_at = %updated.expires_at, "Refreshed Asana token");
        Ok(updated.access_token)
    }

    /// Exchange an authorization code and store the result for `user_id`.
    ///
    /// Nothing is stored unless the exchange succeeds.
    pub async fn connect(&self, user_id: &str, code: &str) -> Result<CredentialRecord, BridgeError> {
        let refresher = self.clone();
        let user_id = user_id.to_string();
        let code = code.to_string();

        tokio::spawn(async move {
            let _guard = refresher.locks.lock(&user_id).await;
            let grant = refresher.oauth_client.exchange_code(&code).await?;
            let record = grant.into_record(Utc::now(), None);
            refresher.store.set(&user_id, record.clone()).await?;

            tracing::info!(user_id = %user_id, expires_at = %record.expires_at, "Stored Asana credential");
            Ok(record)
        })
        .await
        .map_err(|e| BridgeError::Internal(format!("Connect task failed: {}", e)))?
    }

    /// Forget the stored credential for `user_id`.
    pub async fn disconnect(&self, user_id: &str) -> Result<(), BridgeError> {
        let _guard = self.locks.lock(user_id).await;
        self.store.delete(user_id).await?;
        tracing::info!(user_id = %user_id, "Removed Asana credential");
        Ok(())
    }
}
