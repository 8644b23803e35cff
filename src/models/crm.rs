//! Records held by the mock CRM service and the wire payloads it exchanges
//! with [`crate::services::crm::http::HttpCrmClient`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadRecord {
    pub lead_id: String,
    pub name: String,
    pub phone: String,
    pub city: Option<String>,
    pub source: Option<String>,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitRecord {
    pub visit_id: String,
    pub lead_id: String,
    pub visit_time: String,
    pub notes: Option<String>,
    pub status: String,
}

// ── Wire payloads ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLeadRequest {
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLeadResponse {
    pub lead_id: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleVisitRequest {
    pub lead_id: String,
    pub visit_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleVisitResponse {
    pub visit_id: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusResponse {
    pub lead_id: String,
    pub status: String,
}

/// Body of every 4xx the CRM returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmRejection {
    pub detail: String,
}
