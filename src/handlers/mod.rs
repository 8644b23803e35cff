pub mod bot;
pub mod crm;
pub mod health;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::{AppState, CrmState};

/// Routes served by the bot process.
pub fn bot_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/bot/handle", post(bot::handle_transcript))
        .route("/bot/analytics", get(bot::get_analytics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Routes served by the mock CRM process.
pub fn crm_router(state: Arc<CrmState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/crm/leads", post(crm::create_lead).get(crm::list_leads))
        .route("/crm/leads/:lead_id/status", post(crm::update_lead_status))
        .route("/crm/visits", post(crm::schedule_visit).get(crm::list_visits))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
