//! Exoplanet Classifier API
//!
//! Serves a pre-trained exoplanet classifier over HTTP and keeps the labels
//! users confirm, so the model can be retrained on them later.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    EXOPLANET API                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────────┐  ┌─────────────────────┐ │
//! │  │  Router   │  │  Prediction   │  │  Classifier         │ │
//! │  │  (Axum)   │─▶│  (alignment,  │─▶│  (JSON artifact,    │ │
//! │  │           │  │   coercion)   │  │   loaded once)      │ │
//! │  └─────┬─────┘  └───────────────┘  └─────────────────────┘ │
//! │        ▼                                                    │
//! │  ┌─────────────┐                                           │
//! │  │   SQLite    │  feedback table (append-only)             │
//! │  └─────────────┘                                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod models;
mod classifier;
mod handlers;
mod prediction;
mod error;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging (JSON lines in production)
    let production = config.is_production();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "exoplanet_api=debug,tower_http=debug".into()))
        .with(production.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!production).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!("Exoplanet API starting ({})...", config.environment);

    // A missing or broken model keeps the server up; /predict reports it
    let model = match classifier::load_model(&config.model_path) {
        Ok(model) => Some(model),
        Err(e) => {
            tracing::error!("Error loading model from {}: {}", config.model_path, e);
            None
        }
    };

    let pool = db::create_pool(&config.database_url).await
        .with_context(|| format!("failed to open feedback database {}", config.database_url))?;

    db::run_migrations(&pool).await
        .context("failed to initialize feedback table")?;
    tracing::info!("Feedback database initialized at {}", config.database_url);

    let addr = config.bind_addr();
    let state = AppState {
        pool,
        model,
        config,
    };

    let app = create_router(state);

    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::SqlitePool,
    /// Loaded once at startup, read-only afterwards
    pub model: Option<Arc<dyn classifier::Classifier>>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/predict", post(handlers::predict::predict))
        .route("/feedback/stats", get(handlers::feedback::stats))
        .route("/feedback/export", get(handlers::feedback::export))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
