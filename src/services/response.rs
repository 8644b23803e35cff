//! Fixed message templates read back to the speaker.
//!
//! Messages never carry backend payloads; the details of a CRM failure stay in
//! the log.

use crate::models::{CommandResult, ErrorKind, LeadFields, StatusUpdateFields, VisitFields};
use crate::services::crm::CrmError;
use crate::services::nlu::ValidationError;

pub fn unrecognized() -> CommandResult {
    CommandResult::failed(
        ErrorKind::Unrecognized,
        "Sorry, I didn't catch a command. You can add a lead, schedule a visit, or update a lead's status."
            .to_string(),
    )
}

pub fn invalid(err: &ValidationError) -> CommandResult {
    let message = match err {
        ValidationError::Missing { field } => {
            format!("I couldn't find the {} in your request.", spoken_field(field))
        }
        ValidationError::Malformed { field, reason } => {
            format!("The {} doesn't look right: {reason}.", spoken_field(field))
        }
    };
    CommandResult::failed(ErrorKind::ValidationError, format!("{message} ({})", err.field()))
}

pub fn lead_created(lead: &LeadFields, lead_id: String) -> CommandResult {
    let message = format!("Lead {} created with id {lead_id}.", lead.name);
    CommandResult::ok(Some(lead_id), message)
}

pub fn visit_scheduled(visit: &VisitFields) -> CommandResult {
    CommandResult::ok(
        Some(visit.lead_id.clone()),
        format!(
            "Visit scheduled for lead {} on {}.",
            visit.lead_id,
            visit.scheduled_at.format("%Y-%m-%d at %H:%M (UTC%:z)")
        ),
    )
}

pub fn status_updated(update: &StatusUpdateFields) -> CommandResult {
    CommandResult::ok(
        Some(update.lead_id.clone()),
        format!("Lead {} is now {}.", update.lead_id, update.status),
    )
}

pub fn crm_failed(err: &CrmError) -> CommandResult {
    let message = match err {
        CrmError::Rejected { status: 404, .. } => {
            "The CRM couldn't find that lead. Please check the lead id."
        }
        CrmError::Rejected { status: 409, .. } => {
            "The CRM says this conflicts with an existing record."
        }
        CrmError::Rejected { .. } => "The CRM didn't accept those details.",
        CrmError::Unavailable { .. } => {
            "The CRM isn't reachable right now. Please try again in a moment."
        }
        CrmError::Timeout(_) => "The CRM took too long to answer. Please try again.",
    };
    CommandResult::failed(err.kind(), message.to_string())
}

fn spoken_field(field: &str) -> &str {
    match field {
        "leadId" => "lead id",
        "scheduledAt" => "visit time",
        "phone" => "phone number",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_field() {
        let result = invalid(&ValidationError::Malformed {
            field: "scheduledAt",
            reason: "a UTC offset is required",
        });
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::ValidationError));
        assert!(result.message.contains("scheduledAt"));
        assert!(result.message.contains("visit time"));
    }

    #[test]
    fn test_visit_message_keeps_speaker_offset() {
        let visit = VisitFields {
            lead_id: "L123".to_string(),
            scheduled_at: chrono::DateTime::parse_from_rfc3339("2025-10-10T14:00:00+05:30").unwrap(),
            notes: None,
        };
        let result = visit_scheduled(&visit);
        assert_eq!(result.lead_id.as_deref(), Some("L123"));
        assert_eq!(
            result.message,
            "Visit scheduled for lead L123 on 2025-10-10 at 14:00 (UTC+05:30)."
        );
    }

    #[test]
    fn test_crm_failure_hides_backend_detail() {
        let result = crm_failed(&CrmError::Rejected {
            status: 422,
            detail: "Traceback: pydantic error at line 12".to_string(),
        });
        assert_eq!(result.error_kind, Some(ErrorKind::CrmRejected));
        assert!(!result.message.contains("Traceback"));
    }

    #[test]
    fn test_crm_unavailable_and_timeout_kinds() {
        let unavailable = crm_failed(&CrmError::Unavailable {
            attempts: 3,
            last_error: "connection refused".to_string(),
        });
        assert_eq!(unavailable.error_kind, Some(ErrorKind::CrmUnavailable));
        assert!(!unavailable.message.contains("refused"));

        let timeout = crm_failed(&CrmError::Timeout(std::time::Duration::from_secs(10)));
        assert_eq!(timeout.error_kind, Some(ErrorKind::Timeout));
    }
}
