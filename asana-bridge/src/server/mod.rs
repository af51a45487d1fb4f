pub mod config;
pub mod error;
pub mod handlers;
pub mod mcp;
pub mod models;
pub mod services;
pub mod widget;

pub use config::Configuration;
pub use error::ServerError;

use axum::{
    http::HeaderMap,
    middleware,
    routing::{delete, get, post},
    Router,
};
use mcp::AsanaMcpServer;
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use services::{AsanaService, OAuthClient, SessionStore, SubjectResolver, TokenVerifier};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Configuration>,
    pub session_store: Arc<SessionStore>,
    pub oauth_client: Arc<OAuthClient>,
    pub asana: AsanaService,
    pub verifier: Arc<dyn TokenVerifier>,
    pub resolver: Arc<SubjectResolver>,
}

impl AppState {
    /// Origin this server is reached at, from config or the proxy headers.
    pub fn origin(&self, headers: &HeaderMap) -> String {
        if let Some(public_url) = &self.config.server.public_url {
            return public_url.clone();
        }

        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.split(',').next())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        let protocol = header("x-forwarded-proto").unwrap_or("http");
        let host = header("x-forwarded-host")
            .or_else(|| header("host"))
            .map(str::to_string)
            .unwrap_or_else(|| format!("localhost:{}", self.config.server.port));

        format!("{}://{}", protocol, host)
    }

    pub fn resource_metadata_url(&self, headers: &HeaderMap) -> String {
        format!(
            "{}/.well-known/oauth-protected-resource",
            self.origin(headers)
        )
    }
}

pub fn router(state: AppState) -> Router {
    let well_known = Router::new()
        .route(
            "/.well-known/oauth-protected-resource",
            get(handlers::protected_resource_metadata),
        )
        .route(
            "/.well-known/oauth-protected-resource/{*path}",
            get(handlers::protected_resource_metadata),
        )
        .route(
            "/.well-known/oauth-authorization-server",
            get(handlers::authorization_server_metadata),
        )
        .route(
            "/.well-known/oauth-authorization-server/{*path}",
            get(handlers::authorization_server_metadata),
        )
        .layer(CorsLayer::permissive());

    let handler = AsanaMcpServer::new(
        state.asana.clone(),
        state.config.server.frontend_url.clone(),
    );
    let mcp_service = StreamableHttpService::new(
        move || Ok(handler.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig {
            stateful_mode: false,
            sse_keep_alive: None,
            ..Default::default()
        },
    );
    let mcp_routes = Router::new()
        .nest_service("/mcp", mcp_service)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::require_user,
        ));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/asana/authorize", post(handlers::authorize))
        .route("/asana/callback", get(handlers::oauth_callback))
        .route("/asana/connection", delete(handlers::disconnect))
        .merge(mcp_routes)
        .merge(well_known)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
