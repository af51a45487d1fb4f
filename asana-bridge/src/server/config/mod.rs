use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

use crate::error::BridgeError;

#[derive(Debug, Deserialize, Clone)]
pub struct Configuration {
    pub server: ServerConfiguration,
    pub asana: AsanaConfiguration,
    pub stytch: StytchConfiguration,

    #[serde(default)]
    pub storage: StorageConfiguration,

    #[serde(default)]
    pub identity: IdentityConfiguration,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfiguration {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Externally visible origin of this server, used in OAuth metadata.
    #[serde(default)]
    pub public_url: Option<String>,

    /// Where the browser lands after the Asana callback.
    pub frontend_url: String,

    #[serde(default = "default_authorization_ttl")]
    pub authorization_ttl_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AsanaConfiguration {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,

    #[serde(default = "default_asana_base_url")]
    pub base_url: String,

    #[serde(default = "default_asana_authorize_url")]
    pub authorize_url: String,

    #[serde(default = "default_asana_token_url")]
    pub token_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StytchConfiguration {
    pub project_id: String,
    pub project_secret: String,

    /// Project domain serving OAuth metadata and token introspection.
    pub domain: String,

    /// Backend API host for user management.
    #[serde(default = "default_stytch_api_url")]
    pub api_url: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Stytch,
    File,
    Memory,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfiguration {
    #[serde(default)]
    pub backend: StorageBackend,

    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfiguration {
    /// Map callers without a subject claim onto `default_user_id`.
    /// Every such caller then shares one Asana connection.
    #[serde(default)]
    pub allow_shared_fallback: bool,

    #[serde(default = "default_user_id")]
    pub default_user_id: String,
}

impl Default for IdentityConfiguration {
    fn default() -> Self {
        Self {
            allow_shared_fallback: false,
            default_user_id: default_user_id(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_authorization_ttl() -> u64 {
    600
}

fn default_asana_base_url() -> String {
    asana_api::BASE_URL.to_string()
}

fn default_asana_authorize_url() -> String {
    "https://app.asana.com/-/oauth_authorize".to_string()
}

fn default_asana_token_url() -> String {
    "https://app.asana.com/-/oauth_token".to_string()
}

fn default_stytch_api_url() -> String {
    "https://test.stytch.com".to_string()
}

fn default_user_id() -> String {
    "demo-user".to_string()
}

fn normalize_url(name: &str, value: &str) -> Result<String, BridgeError> {
    let trimmed = value.trim().trim_end_matches('/');
    Url::parse(trimmed)
        .map_err(|e| BridgeError::Configuration(format!("Invalid {}: {}", name, e)))?;
    Ok(trimmed.to_string())
}

impl Configuration {
    pub fn new() -> Result<Self, BridgeError> {
        let mut builder = config::Config::builder();

        if std::path::Path::new("config.toml").exists() {
            builder = builder.add_source(config::File::with_name("config"));
        }

        builder =
            builder.add_source(config::Environment::with_prefix("ASANA_BRIDGE").separator("__"));

        let configuration: Configuration = builder.build()?.try_deserialize()?;
        configuration.normalized()
    }

    /// Validates URLs and strips trailing slashes so they can be joined with paths.
    pub fn normalized(mut self) -> Result<Self, BridgeError> {
        self.server.frontend_url = normalize_url("server.frontend_url", &self.server.frontend_url)?;
        if let Some(public_url) = &self.server.public_url {
            self.server.public_url = Some(normalize_url("server.public_url", public_url)?);
        }

        self.asana.base_url = normalize_url("asana.base_url", &self.asana.base_url)?;
        self.asana.authorize_url = normalize_url("asana.authorize_url", &self.asana.authorize_url)?;
        self.asana.token_url = normalize_url("asana.token_url", &self.asana.token_url)?;
        Url::parse(&self.asana.redirect_uri).map_err(|e| {
            BridgeError::Configuration(format!("Invalid asana.redirect_uri: {}", e))
        })?;

        self.stytch.domain = normalize_url("stytch.domain", &self.stytch.domain)?;
        self.stytch.api_url = normalize_url("stytch.api_url", &self.stytch.api_url)?;

        if self.identity.default_user_id.trim().is_empty() {
            return Err(BridgeError::Configuration(
                "identity.default_user_id must not be empty".to_string(),
            ));
        }

        Ok(self)
    }

    pub fn token_file_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(crate::store::FileTokenStore::default_path)
    }
}
