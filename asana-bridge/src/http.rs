use std::sync::OnceLock;

static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Process-wide HTTP client for the token endpoint and the identity provider.
///
/// Built on first use and never torn down; it only holds connection pooling
/// configuration, no per-user state.
pub fn shared_client() -> &'static reqwest::Client {
    CLIENT.get_or_init(reqwest::Client::new)
}
