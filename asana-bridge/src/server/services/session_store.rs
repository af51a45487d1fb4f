use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

use super::OAuthClient;

/// An authorization started by an authenticated user and not yet completed.
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// Binds each outstanding `state` value to the identity that started the flow.
///
/// The browser only ever sees the random state; the identity it maps to never
/// leaves the server. A state is usable once and only until the TTL elapses.
pub struct SessionStore {
    sessions: Arc<DashMap<String, PendingAuthorization>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_seconds: u64) -> Self {
        let store = Self {
            sessions: Arc::new(DashMap::new()),
            ttl: Duration::from_secs(ttl_seconds),
        };

        // Spawn background cleanup task
        let sessions_clone = store.sessions.clone();
        let ttl_clone = store.ttl;
        tokio::spawn(async move {
            cleanup_expired_sessions(sessions_clone, ttl_clone).await;
        });

        tracing::info!(
            "Authorization store initialized with TTL of {} seconds",
            ttl_seconds
        );
        store
    }

    /// Mint a fresh state for `user_id`.
    pub fn create_session(&self, user_id: &str) -> String {
        let state = OAuthClient::generate_state_token();
        self.sessions.insert(
            state.clone(),
            PendingAuthorization {
                user_id: user_id.to_string(),
                created_at: Utc::now(),
            },
        );
        tracing::debug!(user_id = %user_id, "Created pending authorization");
        state
    }

    /// Consume a state. Unknown, already used and expired states all yield `None`.
    pub fn take_session(&self, state: &str) -> Option<PendingAuthorization> {
        let (_, pending) = self.sessions.remove(state)?;
        if is_expired(&pending, Utc::now(), self.ttl) {
            tracing::debug!(user_id = %pending.user_id, "Rejected expired authorization state");
            return None;
        }
        Some(pending)
    }

    /// Number of outstanding authorizations (for monitoring)
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

fn is_expired(pending: &PendingAuthorization, now: DateTime<Utc>, ttl: Duration) -> bool {
    let age = now
        .signed_duration_since(pending.created_at)
        .to_std()
        .unwrap_or(Duration::ZERO);
    age >= ttl
}

/// Background task that periodically drops expired authorizations
async fn cleanup_expired_sessions(
    sessions: Arc<DashMap<String, PendingAuthorization>>,
    ttl: Duration,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    loop {
        interval.tick().await;
        let now = Utc::now();
        let initial_count = sessions.len();

        sessions.retain(|_, pending| !is_expired(pending, now, ttl));

        let cleaned = initial_count.saturating_sub(sessions.len());
        if cleaned > 0 {
            tracing::info!(
                "Cleaned up {} expired authorizations, {} remaining",
                cleaned,
                sessions.len()
            );
        }
    }
}
