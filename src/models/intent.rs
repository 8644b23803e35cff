use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Intent {
    CreateLead,
    ScheduleVisit,
    UpdateLeadStatus,
    Unrecognized,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::CreateLead => "CreateLead",
            Intent::ScheduleVisit => "ScheduleVisit",
            Intent::UpdateLeadStatus => "UpdateLeadStatus",
            Intent::Unrecognized => "Unrecognized",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
