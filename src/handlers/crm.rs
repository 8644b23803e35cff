//! Handlers of the mock CRM. Every write honours the `Idempotency-Key`
//! header: a repeated key on the same endpoint replays the first response
//! without touching the store again, as long as the record is younger than
//! the configured TTL and no later status update superseded it.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::db::{self, queries};
use crate::errors::CrmApiError;
use crate::models::crm::{
    CreateLeadRequest, CreateLeadResponse, ScheduleVisitRequest, ScheduleVisitResponse,
    UpdateStatusRequest, UpdateStatusResponse,
};
use crate::models::{LeadRecord, LeadStatus, VisitRecord};
use crate::services::crm::http::IDEMPOTENCY_HEADER;
use crate::state::CrmState;

const VISIT_SCHEDULED: &str = "SCHEDULED";

fn idempotency_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get(IDEMPOTENCY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn replay<T: DeserializeOwned>(
    conn: &Connection,
    key: Option<&str>,
    endpoint: &str,
    ttl: Duration,
) -> Result<Option<T>, CrmApiError> {
    let Some(key) = key else {
        return Ok(None);
    };
    let Some(stored) = queries::get_idempotent_response(conn, key, endpoint, ttl)? else {
        return Ok(None);
    };
    let response = serde_json::from_str(&stored).context("corrupt idempotency record")?;
    tracing::info!(key, endpoint, "replaying idempotent response");
    Ok(Some(response))
}

fn remember<T: Serialize>(
    conn: &Connection,
    key: Option<&str>,
    endpoint: &str,
    response: &T,
) -> Result<(), CrmApiError> {
    if let Some(key) = key {
        let body = serde_json::to_string(response).context("failed to encode response")?;
        queries::save_idempotent_response(conn, key, endpoint, &body)?;
    }
    Ok(())
}

// POST /crm/leads
pub async fn create_lead(
    State(state): State<Arc<CrmState>>,
    headers: HeaderMap,
    Json(req): Json<CreateLeadRequest>,
) -> Result<Json<CreateLeadResponse>, CrmApiError> {
    if req.name.trim().is_empty() {
        return Err(CrmApiError::Unprocessable("name must not be empty".to_string()));
    }
    if req.phone.trim().is_empty() {
        return Err(CrmApiError::Unprocessable("phone must not be empty".to_string()));
    }

    let key = idempotency_key(&headers);
    let endpoint = "/crm/leads";

    let conn = db::lock(&state.db);
    if let Some(previous) = replay(&conn, key.as_deref(), endpoint, state.idempotency_ttl)? {
        return Ok(Json(previous));
    }

    let lead = LeadRecord {
        lead_id: Uuid::new_v4().to_string(),
        name: req.name.trim().to_string(),
        phone: req.phone.trim().to_string(),
        city: req.city,
        source: req.source,
        status: LeadStatus::New.as_str().to_string(),
        created_at: Utc::now().to_rfc3339(),
    };
    queries::create_lead(&conn, &lead)?;

    let response = CreateLeadResponse {
        lead_id: lead.lead_id.clone(),
        status: lead.status.clone(),
    };
    remember(&conn, key.as_deref(), endpoint, &response)?;

    tracing::info!(lead_id = %lead.lead_id, "lead created");
    Ok(Json(response))
}

// GET /crm/leads
pub async fn list_leads(
    State(state): State<Arc<CrmState>>,
) -> Result<Json<Vec<LeadRecord>>, CrmApiError> {
    let leads = {
        let conn = db::lock(&state.db);
        queries::list_leads(&conn)?
    };
    Ok(Json(leads))
}

// POST /crm/visits
pub async fn schedule_visit(
    State(state): State<Arc<CrmState>>,
    headers: HeaderMap,
    Json(req): Json<ScheduleVisitRequest>,
) -> Result<Json<ScheduleVisitResponse>, CrmApiError> {
    let visit_time = DateTime::parse_from_rfc3339(req.visit_time.trim()).map_err(|_| {
        CrmApiError::Unprocessable(format!(
            "visit_time '{}' is not an ISO-8601 datetime with offset",
            req.visit_time
        ))
    })?;

    let key = idempotency_key(&headers);
    let endpoint = "/crm/visits";

    let conn = db::lock(&state.db);
    if let Some(previous) = replay(&conn, key.as_deref(), endpoint, state.idempotency_ttl)? {
        return Ok(Json(previous));
    }

    if queries::get_lead(&conn, &req.lead_id)?.is_none() {
        return Err(CrmApiError::NotFound(format!("Lead {} not found", req.lead_id)));
    }

    let visit = VisitRecord {
        visit_id: Uuid::new_v4().to_string(),
        lead_id: req.lead_id,
        visit_time: visit_time.to_rfc3339(),
        notes: req.notes,
        status: VISIT_SCHEDULED.to_string(),
    };
    queries::create_visit(&conn, &visit)?;

    let response = ScheduleVisitResponse {
        visit_id: visit.visit_id.clone(),
        status: visit.status.clone(),
    };
    remember(&conn, key.as_deref(), endpoint, &response)?;

    tracing::info!(visit_id = %visit.visit_id, lead_id = %visit.lead_id, "visit scheduled");
    Ok(Json(response))
}

// GET /crm/visits
pub async fn list_visits(
    State(state): State<Arc<CrmState>>,
) -> Result<Json<Vec<VisitRecord>>, CrmApiError> {
    let visits = {
        let conn = db::lock(&state.db);
        queries::list_visits(&conn)?
    };
    Ok(Json(visits))
}

// POST /crm/leads/:lead_id/status
pub async fn update_lead_status(
    State(state): State<Arc<CrmState>>,
    Path(lead_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<UpdateStatusResponse>, CrmApiError> {
    let Some(status) = LeadStatus::ALL
        .iter()
        .copied()
        .find(|s| s.as_str() == req.status)
    else {
        let allowed: Vec<&str> = LeadStatus::ALL.iter().map(|s| s.as_str()).collect();
        return Err(CrmApiError::Unprocessable(format!(
            "status must be one of: {}",
            allowed.join(", ")
        )));
    };

    let key = idempotency_key(&headers);
    let endpoint = format!("/crm/leads/{lead_id}/status");

    let conn = db::lock(&state.db);
    if let Some(previous) = replay(&conn, key.as_deref(), &endpoint, state.idempotency_ttl)? {
        return Ok(Json(previous));
    }

    if !queries::update_lead_status(&conn, &lead_id, status.as_str())? {
        return Err(CrmApiError::NotFound(format!("Lead {lead_id} not found")));
    }

    // Only the latest update on a lead may replay.
    queries::forget_idempotent_responses(&conn, &endpoint, key.as_deref())?;

    let response = UpdateStatusResponse {
        lead_id: lead_id.clone(),
        status: status.as_str().to_string(),
    };
    remember(&conn, key.as_deref(), &endpoint, &response)?;

    tracing::info!(lead_id = %lead_id, status = %status, notes = req.notes.is_some(), "lead status updated");
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_idempotency_key_ignores_blank_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(idempotency_key(&headers), None);

        headers.insert(IDEMPOTENCY_HEADER, HeaderValue::from_static("  "));
        assert_eq!(idempotency_key(&headers), None);

        headers.insert(IDEMPOTENCY_HEADER, HeaderValue::from_static("abc123"));
        assert_eq!(idempotency_key(&headers).as_deref(), Some("abc123"));
    }
}
