mod api;
mod app;
mod auth;
mod config;
mod db;
mod domain;
mod engine;
mod error;
mod logging;
mod middleware;
mod routes;
mod store;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::auth::TokenVerifier;
use crate::config::StoreBackend;
use crate::engine::{BidAdmission, Evaluation};
use crate::store::{MemoryStore, PgStore, RecordStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = config::Settings::from_env()?;

    // Initialize logging
    logging::init_logging(&settings.env);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        store = ?settings.store_backend,
        "Starting tenderdesk backend"
    );

    // Create the record store
    let store: Arc<dyn RecordStore> = match settings.store_backend {
        StoreBackend::Postgres => {
            let pool = db::create_pool(&settings).await?;
            sqlx::migrate!().run(&pool).await?;
            Arc::new(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory record store; data will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };

    // Token verification for identity-service-issued JWTs
    let verifier = TokenVerifier::new(
        &settings.jwt_secret,
        &settings.jwt_issuer,
        &settings.jwt_audience,
    );

    // Shared HTTP client for the identity service proxy
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.identity_timeout_seconds))
        .build()?;

    // Engines
    let admission = BidAdmission::new(store.clone());
    let evaluation = Evaluation::new(store.clone(), settings.award_requires_lowest);

    // Create application state
    let state = app::AppState::new(
        store,
        admission,
        evaluation,
        verifier,
        settings.clone(),
        http_client,
    );

    // Build application
    let app = app::create_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
