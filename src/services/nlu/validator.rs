use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Utc};

use crate::models::{
    Command, Intent, LeadFields, LeadSource, LeadStatus, StatusUpdateFields, VisitFields,
};

use super::extractor::ExtractedFields;

/// Offset-bearing layouts accepted besides strict RFC 3339.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// First problem found with the extracted fields. Always names the field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is missing")]
    Missing { field: &'static str },

    #[error("{field} is invalid: {reason}")]
    Malformed {
        field: &'static str,
        reason: &'static str,
    },
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Missing { field } | ValidationError::Malformed { field, .. } => field,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Validator {
    /// How far in the past a visit may be scheduled. Zero rejects any past time.
    grace: Duration,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(Duration::zero())
    }
}

impl Validator {
    pub fn new(grace: Duration) -> Self {
        Self { grace }
    }

    /// Turns extracted fields into a typed command, failing on the first bad field.
    pub fn validate(
        &self,
        intent: Intent,
        fields: &ExtractedFields,
        now: DateTime<Utc>,
    ) -> Result<Command, ValidationError> {
        match intent {
            Intent::CreateLead => Ok(Command::CreateLead(LeadFields {
                name: validate_name(fields.name.as_deref())?,
                phone: validate_phone(fields.phone.as_deref())?,
                city: fields
                    .city
                    .as_deref()
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string),
                source: fields
                    .source
                    .as_deref()
                    .map(LeadSource::parse)
                    .unwrap_or(LeadSource::Other),
            })),
            Intent::ScheduleVisit => Ok(Command::ScheduleVisit(VisitFields {
                lead_id: validate_lead_id(fields.lead_id.as_deref())?,
                scheduled_at: self.validate_timestamp(fields.timestamp.as_deref(), now)?,
                notes: fields.notes.clone(),
            })),
            Intent::UpdateLeadStatus => Ok(Command::UpdateLeadStatus(StatusUpdateFields {
                lead_id: validate_lead_id(fields.lead_id.as_deref())?,
                status: validate_status(fields.status.as_deref())?,
                notes: fields.notes.clone(),
            })),
            // Never dispatched; kept total so callers cannot build a command from nothing.
            Intent::Unrecognized => Err(ValidationError::Missing { field: "intent" }),
        }
    }

    fn validate_timestamp(
        &self,
        raw: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<DateTime<FixedOffset>, ValidationError> {
        const FIELD: &str = "scheduledAt";

        let raw = raw
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or(ValidationError::Missing { field: FIELD })?;

        let scheduled_at = parse_with_offset(raw).ok_or_else(|| {
            let reason = if has_wall_clock_time(raw) {
                "a UTC offset is required"
            } else {
                "a time and a UTC offset are required"
            };
            ValidationError::Malformed {
                field: FIELD,
                reason,
            }
        })?;

        if scheduled_at.with_timezone(&Utc) < now - self.grace {
            return Err(ValidationError::Malformed {
                field: FIELD,
                reason: "the time is in the past",
            });
        }

        Ok(scheduled_at)
    }
}

fn validate_name(raw: Option<&str>) -> Result<String, ValidationError> {
    raw.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .ok_or(ValidationError::Missing { field: "name" })
}

fn validate_phone(raw: Option<&str>) -> Result<String, ValidationError> {
    let raw = raw.ok_or(ValidationError::Missing { field: "phone" })?;
    let digits: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();
    if digits.len() != 10 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::Malformed {
            field: "phone",
            reason: "a phone number needs exactly 10 digits",
        });
    }
    Ok(digits)
}

/// Shape check only; the CRM decides whether the lead exists.
fn validate_lead_id(raw: Option<&str>) -> Result<String, ValidationError> {
    let raw = raw
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(ValidationError::Missing { field: "leadId" })?;

    let mut chars = raw.chars();
    let well_formed = chars.next().is_some_and(|c| c.is_ascii_alphanumeric())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !well_formed {
        return Err(ValidationError::Malformed {
            field: "leadId",
            reason: "a lead identifier is letters, digits and dashes",
        });
    }
    Ok(raw.to_string())
}

fn validate_status(raw: Option<&str>) -> Result<LeadStatus, ValidationError> {
    let raw = raw.ok_or(ValidationError::Missing { field: "status" })?;
    LeadStatus::parse(raw).ok_or(ValidationError::Malformed {
        field: "status",
        reason: "unknown lead status",
    })
}

/// Accepts only timestamps carrying an explicit offset (`Z` counts).
fn parse_with_offset(raw: &str) -> Option<DateTime<FixedOffset>> {
    let compact = raw.replace(" +", "+").replace(" -", "-");
    let normalized = match compact.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{rest}+00:00"),
        None => compact,
    };

    DateTime::parse_from_rfc3339(&normalized).ok().or_else(|| {
        OFFSET_FORMATS
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(&normalized, fmt).ok())
    })
}

fn has_wall_clock_time(raw: &str) -> bool {
    NAIVE_FORMATS
        .iter()
        .any(|fmt| NaiveDateTime::parse_from_str(raw, fmt).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap()
    }

    fn visit(timestamp: &str) -> ExtractedFields {
        ExtractedFields {
            lead_id: Some("L123".to_string()),
            timestamp: Some(timestamp.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_lead_defaults_unknown_source_to_other() {
        let fields = ExtractedFields {
            name: Some("  Rohan Sharma ".to_string()),
            phone: Some("9876543210".to_string()),
            source: Some("Instagram".to_string()),
            ..Default::default()
        };
        let cmd = Validator::default()
            .validate(Intent::CreateLead, &fields, now())
            .unwrap();
        match cmd {
            Command::CreateLead(lead) => {
                assert_eq!(lead.name, "Rohan Sharma");
                assert_eq!(lead.source, LeadSource::Other);
                assert_eq!(lead.city, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_create_lead_fails_fast_on_name() {
        let fields = ExtractedFields {
            name: Some("   ".to_string()),
            phone: None,
            ..Default::default()
        };
        let err = Validator::default()
            .validate(Intent::CreateLead, &fields, now())
            .unwrap_err();
        assert_eq!(err.field(), "name");
    }

    #[test]
    fn test_phone_must_have_ten_digits() {
        let fields = ExtractedFields {
            name: Some("Ann".to_string()),
            phone: Some("12345".to_string()),
            ..Default::default()
        };
        let err = Validator::default()
            .validate(Intent::CreateLead, &fields, now())
            .unwrap_err();
        assert_eq!(err.field(), "phone");
        assert!(matches!(err, ValidationError::Malformed { .. }));
    }

    #[test]
    fn test_visit_keeps_original_offset() {
        let cmd = Validator::default()
            .validate(Intent::ScheduleVisit, &visit("2025-10-10T14:00:00+05:30"), now())
            .unwrap();
        match cmd {
            Command::ScheduleVisit(v) => {
                assert_eq!(v.lead_id, "L123");
                assert_eq!(v.scheduled_at.to_rfc3339(), "2025-10-10T14:00:00+05:30");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_visit_accepts_z_and_short_forms() {
        for ts in ["2025-10-10T14:00:00Z", "2025-10-10T14:00+05:30", "2025-10-10 14:00 +0530"] {
            assert!(
                Validator::default()
                    .validate(Intent::ScheduleVisit, &visit(ts), now())
                    .is_ok(),
                "{ts}"
            );
        }
    }

    #[test]
    fn test_timestamp_without_offset_is_rejected() {
        for ts in ["2025-10-10", "2025-10-10T14:00:00", "2025-10-10 14:00"] {
            let err = Validator::default()
                .validate(Intent::ScheduleVisit, &visit(ts), now())
                .unwrap_err();
            assert_eq!(err.field(), "scheduledAt", "{ts}");
        }
    }

    #[test]
    fn test_word_starting_with_z_is_not_utc() {
        let fields = crate::services::nlu::extract(
            "Schedule a visit for lead L123 at 2026-12-10 14:00 Zurich office",
        );
        let err = Validator::default()
            .validate(Intent::ScheduleVisit, &fields, now())
            .unwrap_err();
        assert_eq!(err.field(), "scheduledAt");
    }

    #[test]
    fn test_past_visit_rejected_without_grace() {
        let err = Validator::default()
            .validate(Intent::ScheduleVisit, &visit("2025-09-30T23:59:00Z"), now())
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::Malformed {
                field: "scheduledAt",
                reason: "the time is in the past"
            }
        );
    }

    #[test]
    fn test_past_visit_allowed_within_grace() {
        let validator = Validator::new(Duration::minutes(5));
        assert!(validator
            .validate(Intent::ScheduleVisit, &visit("2025-09-30T23:58:00Z"), now())
            .is_ok());
        assert!(validator
            .validate(Intent::ScheduleVisit, &visit("2025-09-30T23:50:00Z"), now())
            .is_err());
    }

    #[test]
    fn test_status_checked_against_enum() {
        let fields = ExtractedFields {
            lead_id: Some("L123".to_string()),
            status: Some("pending".to_string()),
            ..Default::default()
        };
        let err = Validator::default()
            .validate(Intent::UpdateLeadStatus, &fields, now())
            .unwrap_err();
        assert_eq!(err.field(), "status");
    }

    #[test]
    fn test_lead_id_shape() {
        let fields = ExtractedFields {
            lead_id: Some("L 12".to_string()),
            status: Some("WON".to_string()),
            ..Default::default()
        };
        let err = Validator::default()
            .validate(Intent::UpdateLeadStatus, &fields, now())
            .unwrap_err();
        assert_eq!(err.field(), "leadId");
    }
}
