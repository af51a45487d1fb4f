//! Persistence of one [`CredentialRecord`] per user identity.

mod file;
mod memory;
mod stytch;

pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;
pub use stytch::StytchMetadataStore;

use crate::common::CredentialRecord;
use crate::error::BridgeError;
use async_trait::async_trait;

/// Backends differ only in where records live; the contract is the same:
///
/// - `get` returns `Ok(None)` when nothing is stored and an error for any other failure.
/// - `set` replaces the whole record for that identity.
/// - `delete` removes it, so a following `get` returns `Ok(None)`.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<CredentialRecord>, BridgeError>;

    async fn set(&self, user_id: &str, record: CredentialRecord) -> Result<(), BridgeError>;

    async fn delete(&self, user_id: &str) -> Result<(), BridgeError>;
}
