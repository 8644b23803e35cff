use chrono::{SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use crate::models::{Command, LeadFields, StatusUpdateFields, VisitFields};

/// Deterministic key for one logical CRM command.
///
/// ```text
/// hex(SHA-256(operation 0x1F field 0x1F field ...))
/// ```
///
/// Fields are normalized first, so "John  Doe" and "john doe" with the same
/// phone and source map to the same token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyToken(String);

impl IdempotencyToken {
    pub fn for_command(command: &Command) -> Self {
        match command {
            Command::CreateLead(lead) => Self::for_lead(lead),
            Command::ScheduleVisit(visit) => Self::for_visit(visit),
            Command::UpdateLeadStatus(update) => Self::for_status(update),
        }
    }

    pub fn for_lead(lead: &LeadFields) -> Self {
        let phone: String = lead.phone.chars().filter(|c| c.is_ascii_digit()).collect();
        let city = lead.city.as_deref().map(normalize_text).unwrap_or_default();
        Self::digest(
            "create_lead",
            &[&normalize_text(&lead.name), &phone, lead.source.as_str(), &city],
        )
    }

    pub fn for_visit(visit: &VisitFields) -> Self {
        let at = visit
            .scheduled_at
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        let notes = visit.notes.as_deref().map(normalize_text).unwrap_or_default();
        Self::digest("schedule_visit", &[visit.lead_id.trim(), &at, &notes])
    }

    pub fn for_status(update: &StatusUpdateFields) -> Self {
        let notes = update.notes.as_deref().map(normalize_text).unwrap_or_default();
        Self::digest(
            "update_status",
            &[update.lead_id.trim(), update.status.as_str(), &notes],
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn digest(operation: &str, parts: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(operation.as_bytes());
        for part in parts {
            hasher.update([0x1f]);
            hasher.update(part.as_bytes());
        }
        Self(hex::encode(hasher.finalize()))
    }
}

impl std::fmt::Display for IdempotencyToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn normalize_text(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LeadSource, LeadStatus};
    use chrono::DateTime;

    fn lead(name: &str, phone: &str) -> LeadFields {
        LeadFields {
            name: name.to_string(),
            city: Some("NY".to_string()),
            phone: phone.to_string(),
            source: LeadSource::LinkedIn,
        }
    }

    #[test]
    fn test_same_fields_same_token() {
        let a = IdempotencyToken::for_lead(&lead("John Doe", "1234567890"));
        let b = IdempotencyToken::for_lead(&lead("  john   DOE ", "1234567890"));
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_different_fields_different_token() {
        let base = IdempotencyToken::for_lead(&lead("John Doe", "1234567890"));
        assert_ne!(base, IdempotencyToken::for_lead(&lead("John Doe", "1234567891")));
        assert_ne!(base, IdempotencyToken::for_lead(&lead("Jane Doe", "1234567890")));

        let mut other_source = lead("John Doe", "1234567890");
        other_source.source = LeadSource::Referral;
        assert_ne!(base, IdempotencyToken::for_lead(&other_source));
    }

    #[test]
    fn test_visit_token_ignores_offset_spelling() {
        let visit = |ts: &str| VisitFields {
            lead_id: "L123".to_string(),
            scheduled_at: DateTime::parse_from_rfc3339(ts).unwrap(),
            notes: None,
        };
        assert_eq!(
            IdempotencyToken::for_visit(&visit("2025-10-10T14:00:00+05:30")),
            IdempotencyToken::for_visit(&visit("2025-10-10T08:30:00Z")),
        );
    }

    #[test]
    fn test_operations_do_not_collide() {
        let update = StatusUpdateFields {
            lead_id: "L1".to_string(),
            status: LeadStatus::Won,
            notes: None,
        };
        let token = IdempotencyToken::for_command(&Command::UpdateLeadStatus(update.clone()));
        assert_eq!(token, IdempotencyToken::for_status(&update));

        let mut lost = update;
        lost.status = LeadStatus::Lost;
        assert_ne!(token, IdempotencyToken::for_status(&lost));
    }
}
