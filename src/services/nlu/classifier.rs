use crate::models::Intent;

use super::extractor::ExtractedFields;

/// Priority-ordered rules; the first one that holds wins.
///
/// Commands scoped to an existing lead are checked before creation so a
/// name-like token in an update never turns it into a new lead.
pub fn classify(fields: &ExtractedFields) -> Intent {
    let has_lead = fields.lead_id.is_some();

    if has_lead && fields.status.is_some() {
        Intent::UpdateLeadStatus
    } else if has_lead && fields.timestamp.is_some() {
        Intent::ScheduleVisit
    } else if fields.name.is_some() && fields.phone.is_some() {
        Intent::CreateLead
    } else {
        Intent::Unrecognized
    }
}
