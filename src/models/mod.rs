pub mod analytics;
pub mod command;
pub mod crm;
pub mod intent;
pub mod lead;

pub use analytics::AnalyticsRecord;
pub use command::{BotRequest, CommandResult, ErrorKind};
pub use crm::{LeadRecord, VisitRecord};
pub use intent::Intent;
pub use lead::{Command, LeadFields, LeadSource, LeadStatus, StatusUpdateFields, VisitFields};
