use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::db::{self, queries};
use crate::errors::AppError;
use crate::models::{AnalyticsRecord, BotRequest, CommandResult};
use crate::services::analytics;
use crate::state::AppState;

const DEFAULT_ANALYTICS_LIMIT: i64 = 50;

// POST /bot/handle
pub async fn handle_transcript(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BotRequest>,
) -> Result<Json<CommandResult>, AppError> {
    let transcript = req.transcript.trim();
    if transcript.is_empty() {
        return Err(AppError::BadRequest("transcript must not be empty".to_string()));
    }

    let chars = transcript.chars().count();
    let max = state.config.max_transcript_chars;
    if chars > max {
        return Err(AppError::BadRequest(format!(
            "transcript is {chars} characters, the limit is {max}"
        )));
    }

    if let Some(metadata) = &req.metadata {
        tracing::debug!(keys = ?metadata.keys().collect::<Vec<_>>(), "transcript metadata");
    }

    let outcome = state.dispatcher.handle(transcript).await;
    analytics::record_outcome(&state, &outcome);

    Ok(Json(outcome.result))
}

// GET /bot/analytics
#[derive(Deserialize)]
pub struct AnalyticsQuery {
    pub limit: Option<i64>,
}

pub async fn get_analytics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<Vec<AnalyticsRecord>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_ANALYTICS_LIMIT).clamp(1, 500);
    let records = {
        let conn = db::lock(&state.db);
        queries::get_recent_analytics(&conn, limit)?
    };
    Ok(Json(records))
}
