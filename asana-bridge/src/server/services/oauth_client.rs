use oauth2::{
    basic::BasicClient, AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken,
    HttpRequest, HttpResponse, RedirectUrl, RefreshToken, TokenResponse, TokenUrl,
};
use rand::Rng;

use crate::common::TokenGrant;
use crate::error::BridgeError;
use crate::http::shared_client;
use crate::server::config::AsanaConfiguration;

// Async HTTP client for oauth2, backed by the shared connection pool
async fn http_client(request: HttpRequest) -> Result<HttpResponse, reqwest::Error> {
    let mut builder = shared_client()
        .request(request.method().clone(), request.uri().to_string())
        .body(request.body().clone());

    for (name, value) in request.headers() {
        builder = builder.header(name.as_str(), value.as_bytes());
    }

    let response = builder.send().await?;
    let status = response.status();
    let body = response.bytes().await?.to_vec();

    let mut http_response = HttpResponse::new(body);
    *http_response.status_mut() = status;

    Ok(http_response)
}

/// Talks to Asana's OAuth endpoints with this server's client credentials.
pub struct OAuthClient {
    client_id: String,
    client_secret: String,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    redirect_url: RedirectUrl,
}

impl OAuthClient {
    pub fn new(config: &AsanaConfiguration) -> Result<Self, BridgeError> {
        let auth_url = AuthUrl::new(config.authorize_url.clone())
            .map_err(|e| BridgeError::Configuration(format!("Invalid authorize URL: {}", e)))?;

        let token_url = TokenUrl::new(config.token_url.clone())
            .map_err(|e| BridgeError::Configuration(format!("Invalid token URL: {}", e)))?;

        let redirect_url = RedirectUrl::new(config.redirect_uri.clone())
            .map_err(|e| BridgeError::Configuration(format!("Invalid redirect URI: {}", e)))?;

        Ok(Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            auth_url,
            token_url,
            redirect_url,
        })
    }

    fn client(
        &self,
    ) -> BasicClient<
        oauth2::EndpointSet,
        oauth2::EndpointNotSet,
        oauth2::EndpointNotSet,
        oauth2::EndpointNotSet,
        oauth2::EndpointSet,
    > {
        BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_auth_uri(self.auth_url.clone())
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone())
            .set_auth_type(AuthType::RequestBody)
    }

    /// Asana consent URL carrying `state` back to the callback.
    pub fn build_authorization_url(&self, state: &str) -> String {
        let csrf_token = CsrfToken::new(state.to_string());
        let (auth_url, _) = self.client().authorize_url(|| csrf_token).url();
        auth_url.to_string()
    }

    /// Exchange an authorization code, sent with the registered redirect URI.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenGrant, BridgeError> {
        let token_result = self
            .client()
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&http_client)
            .await?;

        let grant = TokenGrant {
            access_token: token_result.access_token().secret().to_string(),
            refresh_token: token_result.refresh_token().map(|t| t.secret().to_string()),
            expires_in: token_result.expires_in().ok_or_else(|| {
                BridgeError::OAuth("No expiration time in response".to_string())
            })?,
        };

        tracing::debug!(expires_in = ?grant.expires_in, "Exchanged authorization code");
        Ok(grant)
    }

    /// Mint a new access token. The grant's refresh token is `None` when the
    /// provider did not rotate it.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, BridgeError> {
        let token_result = self
            .client()
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&http_client)
            .await?;

        let grant = TokenGrant {
            access_token: token_result.access_token().secret().to_string(),
            refresh_token: token_result.refresh_token().map(|t| t.secret().to_string()),
            expires_in: token_result.expires_in().ok_or_else(|| {
                BridgeError::OAuth("No expiration time in response".to_string())
            })?,
        };

        tracing::debug!(expires_in = ?grant.expires_in, "Refreshed access token");
        Ok(grant)
    }

    /// Random URL-safe token for the `state` parameter.
    pub fn generate_state_token() -> String {
        use base64::Engine;
        let mut rng = rand::rng();
        let random_bytes: Vec<u8> = (0..32).map(|_| rng.random()).collect();
        base64::prelude::BASE64_URL_SAFE_NO_PAD.encode(&random_bytes)
    }
}
