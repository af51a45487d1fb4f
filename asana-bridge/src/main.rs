use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use asana_bridge::{
    server::{
        self,
        config::{Configuration, StorageBackend},
        services::{
            AsanaService, CredentialRefresher, OAuthClient, SessionStore, StytchVerifier,
            SubjectResolver,
        },
        AppState,
    },
    store::{FileTokenStore, MemoryTokenStore, StytchMetadataStore, TokenStore},
};

fn token_store(configuration: &Configuration) -> Arc<dyn TokenStore> {
    match configuration.storage.backend {
        StorageBackend::Stytch => Arc::new(StytchMetadataStore::new(
            &configuration.stytch.api_url,
            &configuration.stytch.project_id,
            &configuration.stytch.project_secret,
        )),
        StorageBackend::File => {
            let path = configuration.token_file_path();
            tracing::info!(path = %path.display(), "Using file token store");
            Arc::new(FileTokenStore::new(path))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory token store, credentials are lost on restart");
            Arc::new(MemoryTokenStore::new())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .init();

    // Load configuration
    let configuration = Configuration::new()?;
    tracing::info!(
        storage = ?configuration.storage.backend,
        shared_fallback = configuration.identity.allow_shared_fallback,
        "Configuration loaded successfully"
    );
    if configuration.identity.allow_shared_fallback {
        tracing::warn!(
            default_user_id = %configuration.identity.default_user_id,
            "Callers without a subject claim will share one Asana connection"
        );
    }

    // Initialize services
    let oauth_client = Arc::new(OAuthClient::new(&configuration.asana)?);
    let refresher = CredentialRefresher::new(token_store(&configuration), oauth_client.clone());
    let asana = AsanaService::new(refresher, &configuration.asana.base_url);

    let app_state = AppState {
        session_store: Arc::new(SessionStore::new(
            configuration.server.authorization_ttl_seconds,
        )),
        oauth_client,
        asana,
        verifier: Arc::new(StytchVerifier::new(&configuration.stytch)),
        resolver: Arc::new(SubjectResolver::new(&configuration.identity)),
        config: Arc::new(configuration.clone()),
    };

    let app = server::router(app_state);

    // Start server
    let addr = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
