//! Stand-in CRM for local runs and end-to-end tests.

use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use voice_crm_bot::config::MockCrmConfig;
use voice_crm_bot::db;
use voice_crm_bot::db::migrations::CRM_MIGRATIONS;
use voice_crm_bot::handlers;
use voice_crm_bot::state::CrmState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = MockCrmConfig::from_env();
    let conn = db::init_db(&config.database_url, CRM_MIGRATIONS)?;

    let state = Arc::new(CrmState {
        db: Arc::new(Mutex::new(conn)),
        idempotency_ttl: config.idempotency_ttl(),
    });
    let app = handlers::crm_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("mock CRM listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
