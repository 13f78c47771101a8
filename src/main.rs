mod access;
mod assignment;
mod config;
mod error;
mod extractors;
mod handlers;
mod middleware;
mod models;
mod openapi;
mod startup;
mod store;
mod triage;

use moka::future::Cache;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use handlers::MetricsState;

use store::Store;
use triage::{OracleStatus, TriageOracle};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Opaque session token → user id, with the configured TTL.
    pub sessions: Cache<String, Uuid>,
    pub oracle: Arc<dyn TriageOracle>,
    pub oracle_status: Arc<OracleStatus>,
    pub config: AppConfig,
    pub metrics: Arc<MetricsState>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing with conditional JSON/text output
    let use_json = std::env::var("LOG_FORMAT")
        .unwrap_or_else(|_| "text".to_string()) == "json";

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,wardflow_axum=debug,tower_http=debug".into());

    if use_json {
        // Structured JSON logging for production
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        // Human-readable for development
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Configuration error: {}", e);
        e
    })?;

    // Initialize metrics recorder
    let metrics_state = Arc::new(handlers::setup_metrics_recorder());
    tracing::info!("Metrics recorder initialized");

    // The durable engine is an external collaborator; the in-memory store
    // implements the same boundary.
    let store: Arc<dyn Store> = Arc::new(store::MemoryStore::new());

    // Session cache: opaque token to user id
    let sessions = Cache::builder()
        .time_to_live(config.session_ttl)
        .max_capacity(10_000)
        .build();

    // Triage oracle adapter plus its 5-minute availability cache
    let oracle: Arc<dyn TriageOracle> = Arc::new(triage::HttpTriageOracle::new(
        config.triage_api_url.clone(),
        config.triage_api_key.clone(),
    ));
    let oracle_status = Arc::new(OracleStatus::with_system_clock());

    if config.triage_api_url.is_none() {
        tracing::warn!("TRIAGE_API_URL not set; using rule-based triage fallback only");
    }

    // Create application state
    let state = Arc::new(AppState {
        store,
        sessions,
        oracle,
        oracle_status,
        config: config.clone(),
        metrics: metrics_state,
    });

    // Build router
    let app = startup::build_router(state);

    // Start server
    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
