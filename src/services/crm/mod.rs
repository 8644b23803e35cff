pub mod http;
pub mod idempotency;

use std::time::Duration;

use async_trait::async_trait;

use crate::models::{ErrorKind, LeadFields, StatusUpdateFields, VisitFields};

pub use idempotency::IdempotencyToken;

/// Acknowledgement of a visit or status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrmAck {
    /// Visit id for visits, lead id for status updates.
    pub reference: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CrmError {
    /// The CRM understood the request and refused it (4xx). Never retried.
    #[error("CRM rejected the request (HTTP {status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("CRM unavailable after {attempts} attempt(s): {last_error}")]
    Unavailable { attempts: u32, last_error: String },

    #[error("CRM call exceeded its {0:?} budget")]
    Timeout(Duration),
}

impl CrmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CrmError::Rejected { .. } => ErrorKind::CrmRejected,
            CrmError::Unavailable { .. } => ErrorKind::CrmUnavailable,
            CrmError::Timeout(_) => ErrorKind::Timeout,
        }
    }
}

/// The three operations the interpreter needs from a CRM. Every call carries
/// an idempotency token so a repeated logical command is applied once.
#[async_trait]
pub trait CrmClient: Send + Sync {
    /// Returns the CRM-issued lead id.
    async fn create_lead(
        &self,
        lead: &LeadFields,
        token: &IdempotencyToken,
    ) -> Result<String, CrmError>;

    async fn schedule_visit(
        &self,
        visit: &VisitFields,
        token: &IdempotencyToken,
    ) -> Result<CrmAck, CrmError>;

    async fn update_status(
        &self,
        update: &StatusUpdateFields,
        token: &IdempotencyToken,
    ) -> Result<CrmAck, CrmError>;
}
