use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalyticsRecord {
    pub id: i64,
    pub intent: String,
    /// Recognized field names, never their values.
    pub entities: Vec<String>,
    pub success: bool,
    pub error_kind: Option<String>,
    pub lead_id: Option<String>,
    pub created_at: String,
}
