use async_trait::async_trait;
use dashmap::DashMap;

use super::TokenStore;
use crate::common::CredentialRecord;
use crate::error::BridgeError;

/// Non-persistent store, for local development and tests.
#[derive(Default)]
pub struct MemoryTokenStore {
    records: DashMap<String, CredentialRecord>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, user_id: &str) -> Result<Option<CredentialRecord>, BridgeError> {
        Ok(self.records.get(user_id).map(|r| r.clone()))
    }

    async fn set(&self, user_id: &str, record: CredentialRecord) -> Result<(), BridgeError> {
        self.records.insert(user_id.to_string(), record);
        Ok(())
    }

    async fn delete(&self, user_id: &str) -> Result<(), BridgeError> {
        self.records.remove(user_id);
        Ok(())
    }
}
