// This is the entry point of the blog API server.
//
// **Architecture Overview:**
// - `core/` = Business logic (posts, moderation, auth, rate limits)
// - `infra/` = Implementations of core traits (SQLite, DashMap, OpenRouter, ImageKit)
// - `http/` = axum adapters (routes, middleware, error mapping)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Start background maintenance
// 4. Serve HTTP

mod config;
// Each layer's root file is named after the layer instead of mod.rs
#[path = "core/core_layer.rs"]
mod core;
#[path = "http/http_layer.rs"]
mod http;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::config::{AppConfig, MEMORY_DATABASE};
use crate::core::ai::{AiConfig, AiProvider, AiService};
use crate::core::auth::AuthService;
use crate::core::blog::BlogStore;
use crate::core::media::ImageHost;
use crate::core::rate_limit::CounterStore;
use crate::http::AppState;
use crate::infra::ai::OpenRouterClient;
use crate::infra::blog::{InMemoryBlogStore, SqliteBlogStore};
use crate::infra::media::{ImageKitClient, TracedImageHost};
use crate::infra::rate_limit::InMemoryCounterStore;
use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// How often expired rate limit windows are dropped.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = AppConfig::from_env()?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================

    let store: Arc<dyn BlogStore> = if config.database_url == MEMORY_DATABASE {
        tracing::warn!("Using the in-memory store, data is lost on restart");
        Arc::new(InMemoryBlogStore::new())
    } else {
        let store = SqliteBlogStore::new(&config.database_url)
            .await
            .with_context(|| format!("Failed to open database {}", config.database_url))?;
        Arc::new(store)
    };

    let counters: Arc<dyn CounterStore> = Arc::new(InMemoryCounterStore::new());

    let auth = AuthService::new(
        config.admin_email.clone(),
        config.admin_password.clone(),
        &config.jwt_secret,
        chrono::Duration::hours(config.token_ttl_hours),
    );

    let provider: Box<dyn AiProvider> =
        Box::new(OpenRouterClient::new(config.openrouter_api_key.clone()));
    let ai = AiService::new(
        provider,
        config.system_prompt.clone(),
        AiConfig::new(config.openrouter_model.clone()),
    );

    let images: Arc<dyn ImageHost> = Arc::new(TracedImageHost::new(ImageKitClient::new(
        config.imagekit_private_key.clone(),
        config.imagekit_url_endpoint.clone(),
    )));

    let state = AppState::new(store, counters, auth, ai, images);

    // Spawn cleanup task
    let sweep_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            sweep_state.limiter.sweep().await;
        }
    });

    let app = http::router(state)
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Allow-list from ALLOWED_ORIGINS, or any origin when none are configured.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
