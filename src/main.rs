use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use voice_crm_bot::config::AppConfig;
use voice_crm_bot::db;
use voice_crm_bot::db::migrations::ANALYTICS_MIGRATIONS;
use voice_crm_bot::handlers;
use voice_crm_bot::services::crm::http::HttpCrmClient;
use voice_crm_bot::services::dispatcher::{CommandDispatcher, SystemClock};
use voice_crm_bot::services::nlu::Validator;
use voice_crm_bot::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    anyhow::ensure!(config.crm_max_attempts > 0, "CRM_MAX_ATTEMPTS must be at least 1");

    let conn = db::init_db(&config.database_url, ANALYTICS_MIGRATIONS)?;

    tracing::info!(
        crm = %config.crm_base_url,
        max_attempts = config.crm_max_attempts,
        budget_secs = config.crm_request_budget_secs,
        "using HTTP CRM adapter"
    );
    let crm = HttpCrmClient::new(config.crm_base_url.clone(), config.retry_policy());
    let dispatcher = CommandDispatcher::new(
        Arc::new(crm),
        Validator::new(config.visit_grace()),
        Arc::new(SystemClock),
    );

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        dispatcher,
    });

    let app = handlers::bot_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
