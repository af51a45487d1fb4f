#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use asana_bridge::{
    server::{
        config::{
            AsanaConfiguration, Configuration, IdentityConfiguration, ServerConfiguration,
            StorageConfiguration, StytchConfiguration,
        },
        services::{
            AsanaService, CredentialRefresher, OAuthClient, SessionStore, SubjectResolver,
            TokenVerifier, VerifiedToken,
        },
        AppState,
    },
    store::TokenStore,
    BridgeError, CredentialRecord,
};

pub const TOKEN_PATH: &str = "/-/oauth_token";
pub const FRONTEND_URL: &str = "https://app.example.com";

pub fn asana_configuration(server_uri: &str) -> AsanaConfiguration {
    AsanaConfiguration {
        client_id: "client-123".to_string(),
        client_secret: "client-secret".to_string(),
        redirect_uri: "https://app.example.com/api/asana/callback".to_string(),
        base_url: server_uri.to_string(),
        authorize_url: format!("{}/-/oauth_authorize", server_uri),
        token_url: format!("{}{}", server_uri, TOKEN_PATH),
    }
}

pub fn configuration(server_uri: &str) -> Configuration {
    Configuration {
        server: ServerConfiguration {
            host: "127.0.0.1".to_string(),
            port: 3000,
            public_url: Some("https://mcp.example.com".to_string()),
            frontend_url: FRONTEND_URL.to_string(),
            authorization_ttl_seconds: 600,
        },
        asana: asana_configuration(server_uri),
        stytch: StytchConfiguration {
            project_id: "project-test".to_string(),
            project_secret: "secret-test".to_string(),
            domain: server_uri.to_string(),
            api_url: server_uri.to_string(),
        },
        storage: StorageConfiguration::default(),
        identity: IdentityConfiguration::default(),
    }
}

pub fn record(access_token: &str, refresh_token: &str, expires_in: Duration) -> CredentialRecord {
    let now = Utc::now();
    CredentialRecord {
        access_token: access_token.to_string(),
        refresh_token: Some(refresh_token.to_string()),
        expires_at: now + expires_in,
        received_at: now,
    }
}

pub fn refresher(server_uri: &str, store: Arc<dyn TokenStore>) -> CredentialRefresher {
    let oauth_client = OAuthClient::new(&asana_configuration(server_uri)).unwrap();
    CredentialRefresher::new(store, Arc::new(oauth_client))
}

pub fn asana_service(server_uri: &str, store: Arc<dyn TokenStore>) -> AsanaService {
    AsanaService::new(refresher(server_uri, store), server_uri)
}

/// Accepts a fixed set of bearer tokens, each mapped to its claims.
#[derive(Default)]
pub struct StaticVerifier {
    tokens: HashMap<String, Map<String, Value>>,
}

impl StaticVerifier {
    pub fn with_token(mut self, token: &str, claims: Value) -> Self {
        let claims = match claims {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.tokens.insert(token.to_string(), claims);
        self
    }
}

#[async_trait]
impl TokenVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedToken, BridgeError> {
        let claims = self
            .tokens
            .get(token)
            .cloned()
            .ok_or_else(|| BridgeError::Unauthorized("Token is not active".to_string()))?;
        Ok(VerifiedToken {
            client_id: Some("mcp-client".to_string()),
            scopes: vec!["openid".to_string()],
            expires_at: None,
            claims,
        })
    }
}

pub fn app_state(
    server_uri: &str,
    store: Arc<dyn TokenStore>,
    verifier: StaticVerifier,
) -> AppState {
    let configuration = configuration(server_uri);
    let oauth_client = Arc::new(OAuthClient::new(&configuration.asana).unwrap());
    let refresher = CredentialRefresher::new(store, oauth_client.clone());

    AppState {
        session_store: Arc::new(SessionStore::new(
            configuration.server.authorization_ttl_seconds,
        )),
        oauth_client,
        asana: AsanaService::new(refresher, server_uri),
        verifier: Arc::new(verifier),
        resolver: Arc::new(SubjectResolver::new(&configuration.identity)),
        config: Arc::new(configuration),
    }
}

pub fn token_response(access_token: &str, refresh_token: Option<&str>) -> Value {
    let mut body = json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": 3600,
        "data": { "id": 1, "name": "Ada" }
    });
    if let Some(refresh_token) = refresh_token {
        body["refresh_token"] = json!(refresh_token);
    }
    body
}

/// Mounts a token endpoint answering `grant_type` with `body`, expecting `calls` hits.
pub async fn mount_token_endpoint(server: &MockServer, grant_type: &str, body: Value, calls: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains(format!("grant_type={}", grant_type)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(calls)
        .mount(server)
        .await;
}
