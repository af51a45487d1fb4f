mod models;

pub use models::{CredentialRecord, TokenGrant, REFRESH_SKEW};
