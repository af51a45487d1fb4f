// Types shared by every component
pub mod common;

mod error;
pub mod http;
pub mod locks;
pub mod store;

pub use common::{CredentialRecord, TokenGrant};
pub use error::BridgeError;

pub mod server;
