use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LeadSource {
    LinkedIn,
    Referral,
    Website,
    Other,
}

impl LeadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadSource::LinkedIn => "LinkedIn",
            LeadSource::Referral => "Referral",
            LeadSource::Website => "Website",
            LeadSource::Other => "Other",
        }
    }

    /// Case-insensitive match against the closed vocabulary; anything else is `Other`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "linkedin" => LeadSource::LinkedIn,
            "referral" => LeadSource::Referral,
            "website" => LeadSource::Website,
            _ => LeadSource::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadStatus {
    New,
    Contacted,
    InProgress,
    FollowUp,
    Won,
    Lost,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 6] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::InProgress,
        LeadStatus::FollowUp,
        LeadStatus::Won,
        LeadStatus::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "NEW",
            LeadStatus::Contacted => "CONTACTED",
            LeadStatus::InProgress => "IN_PROGRESS",
            LeadStatus::FollowUp => "FOLLOW_UP",
            LeadStatus::Won => "WON",
            LeadStatus::Lost => "LOST",
        }
    }

    /// Accepts `won`, `WON`, `in progress`, `in-progress`, `follow_up`, ...
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();
        let normalized = match normalized.as_str() {
            "INPROGRESS" => "IN_PROGRESS",
            "FOLLOWUP" => "FOLLOW_UP",
            other => other,
        };
        Self::ALL.into_iter().find(|s| s.as_str() == normalized)
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeadFields {
    pub name: String,
    pub city: Option<String>,
    pub phone: String,
    pub source: LeadSource,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VisitFields {
    pub lead_id: String,
    pub scheduled_at: DateTime<FixedOffset>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateFields {
    pub lead_id: String,
    pub status: LeadStatus,
    pub notes: Option<String>,
}

/// A validated command, ready to hand to the CRM.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateLead(LeadFields),
    ScheduleVisit(VisitFields),
    UpdateLeadStatus(StatusUpdateFields),
}

impl Command {
    pub fn intent(&self) -> super::Intent {
        match self {
            Command::CreateLead(_) => super::Intent::CreateLead,
            Command::ScheduleVisit(_) => super::Intent::ScheduleVisit,
            Command::UpdateLeadStatus(_) => super::Intent::UpdateLeadStatus,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_parse_falls_back_to_other() {
        assert_eq!(LeadSource::parse("LINKEDIN"), LeadSource::LinkedIn);
        assert_eq!(LeadSource::parse("referral"), LeadSource::Referral);
        assert_eq!(LeadSource::parse("Instagram"), LeadSource::Other);
    }

    #[test]
    fn test_status_parse_spellings() {
        assert_eq!(LeadStatus::parse("won"), Some(LeadStatus::Won));
        assert_eq!(LeadStatus::parse("in progress"), Some(LeadStatus::InProgress));
        assert_eq!(LeadStatus::parse("Follow-Up"), Some(LeadStatus::FollowUp));
        assert_eq!(LeadStatus::parse("followup"), Some(LeadStatus::FollowUp));
        assert_eq!(LeadStatus::parse("pending"), None);
    }

    #[test]
    fn test_status_serializes_as_crm_keyword() {
        let json = serde_json::to_string(&LeadStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
    }
}
