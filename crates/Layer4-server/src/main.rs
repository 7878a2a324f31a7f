//! Lumina server - main entry point

use lumina_foundation::{AuthProvider, BackingStore, Storage};
use lumina_orchestrator::RequestOrchestrator;
use lumina_provider::{GeminiProvider, GenerativeProvider};
use lumina_server::{
    create_router, AppState, HttpAuthProvider, NullAuthProvider, RequestThrottle, ServerConfig,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();

    let storage = Arc::new(Storage::new(&config.database_path)?);
    let store: Arc<dyn BackingStore> = storage;

    let provider = GeminiProvider::new(config.gemini_api_key.clone());
    if !provider.is_available() {
        warn!("GEMINI_API_KEY is not set; upstream generation will fail");
    }
    let provider: Arc<dyn GenerativeProvider> = Arc::new(provider);

    let auth: Arc<dyn AuthProvider> = match &config.auth_base_url {
        Some(url) => Arc::new(HttpAuthProvider::new(url.clone())),
        None => {
            warn!("LUMINA_AUTH_URL is not set; bearer credentials will be rejected");
            Arc::new(NullAuthProvider)
        }
    };

    let orchestrator = RequestOrchestrator::new(config.app.clone(), store, provider, auth);

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        throttle: Arc::new(RequestThrottle::new()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "Starting Lumina server");

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    Ok(())
}
