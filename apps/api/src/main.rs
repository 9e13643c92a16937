use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderName;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use xplore_api::auth::HeaderIdentityProvider;
use xplore_api::config::Config;
use xplore_api::db::create_pool;
use xplore_api::llm_client::GeminiClient;
use xplore_api::routes::build_router;
use xplore_api::state::AppState;
use xplore_api::store::{InMemoryRoadmapStore, PgRoadmapStore, RoadmapStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{bin}={level},xplore_api={level}",
                bin = env!("CARGO_BIN_NAME"),
                level = &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Xplore API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize roadmap store
    let store: Arc<dyn RoadmapStore> = match &config.database_url {
        Some(url) => Arc::new(PgRoadmapStore::new(create_pool(url).await?)),
        None => {
            warn!("DATABASE_URL not set; saved roadmaps are kept in memory and lost on restart");
            Arc::new(InMemoryRoadmapStore::new())
        }
    };

    // Initialize LLM client
    let llm = GeminiClient::new(config.gemini.api_key.clone(), config.gemini.model.clone())?;
    info!("LLM client initialized (model: {})", llm.model());

    let identity_header = HeaderName::from_bytes(config.identity_header.as_bytes())
        .with_context(|| {
            format!(
                "IDENTITY_HEADER '{}' is not a valid header name",
                config.identity_header
            )
        })?;
    info!("Reading caller identity from header '{identity_header}'");

    let state = AppState {
        ai: Arc::new(llm),
        store,
        identity: Arc::new(HeaderIdentityProvider::new(identity_header)),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS to the deployed front-end origin

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
