use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Tokens are treated as expired this long before their actual expiry.
pub const REFRESH_SKEW: Duration = Duration::seconds(60);

/// The stored Asana token pair for one user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(rename = "expiresAtIso")]
    pub expires_at: DateTime<Utc>,
    #[serde(rename = "receivedAtIso")]
    pub received_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Whether the access token is within `skew` of its expiry, or past it.
    pub fn is_expiring(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        now >= self.expires_at - skew
    }
}

/// Result of a successful grant at the provider's token endpoint.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: std::time::Duration,
}

impl TokenGrant {
    /// Builds the record to persist. The expiry is always computed from `now`,
    /// and a missing refresh token falls back to `previous_refresh_token`.
    pub fn into_record(
        self,
        now: DateTime<Utc>,
        previous_refresh_token: Option<String>,
    ) -> CredentialRecord {
        let expires_in = Duration::from_std(self.expires_in).unwrap_or(Duration::zero());
        let refresh_token = self
            .refresh_token
            .filter(|token| !token.is_empty())
            .or(previous_refresh_token);

        CredentialRecord {
            access_token: self.access_token,
            refresh_token,
            expires_at: now + expires_in,
            received_at: now,
        }
    }
}
