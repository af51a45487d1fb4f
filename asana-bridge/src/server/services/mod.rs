pub mod asana;
pub mod identity;
pub mod oauth_client;
pub mod refresher;
pub mod session_store;

pub use asana::AsanaService;
pub use identity::{StytchVerifier, SubjectResolver, TokenVerifier, VerifiedToken};
pub use oauth_client::OAuthClient;
pub use refresher::CredentialRefresher;
pub use session_store::SessionStore;
