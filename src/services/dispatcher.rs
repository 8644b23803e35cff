use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::{Command, CommandResult, Intent};
use crate::services::crm::{CrmClient, IdempotencyToken};
use crate::services::nlu::{self, Validator};
use crate::services::response;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Lifecycle of one request. `Completed` and `Failed` have no way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Classified,
    Validated,
    Dispatched,
    Completed,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Classified => "classified",
            Stage::Validated => "validated",
            Stage::Dispatched => "dispatched",
            Stage::Completed => "completed",
            Stage::Failed => "failed",
        }
    }

    pub fn can_transition_to(self, next: Stage) -> bool {
        matches!(
            (self, next),
            (Stage::Received, Stage::Classified)
                | (Stage::Classified, Stage::Validated)
                | (Stage::Validated, Stage::Dispatched)
                | (Stage::Dispatched, Stage::Completed)
                | (
                    Stage::Received | Stage::Classified | Stage::Validated | Stage::Dispatched,
                    Stage::Failed
                )
        )
    }
}

/// Per-request bookkeeping; never outlives one `handle` call.
struct Request {
    stage: Stage,
}

impl Request {
    fn new() -> Self {
        Self {
            stage: Stage::Received,
        }
    }

    fn advance(&mut self, next: Stage) {
        if !self.stage.can_transition_to(next) {
            tracing::error!(from = self.stage.as_str(), to = next.as_str(), "illegal request transition");
        }
        tracing::debug!(from = self.stage.as_str(), to = next.as_str(), "request stage");
        self.stage = next;
    }

    fn fail(&mut self, result: CommandResult) -> CommandResult {
        self.advance(Stage::Failed);
        result
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub intent: Intent,
    /// Names of the fields recognized in the transcript.
    pub fields: Vec<&'static str>,
    pub result: CommandResult,
}

/// Turns one transcript into at most one CRM call.
///
/// Holds only immutable collaborators, so a single instance can serve any
/// number of concurrent requests.
pub struct CommandDispatcher {
    crm: Arc<dyn CrmClient>,
    validator: Validator,
    clock: Arc<dyn Clock>,
}

impl CommandDispatcher {
    pub fn new(crm: Arc<dyn CrmClient>, validator: Validator, clock: Arc<dyn Clock>) -> Self {
        Self {
            crm,
            validator,
            clock,
        }
    }

    pub async fn handle(&self, transcript: &str) -> DispatchOutcome {
        let mut request = Request::new();

        let fields = nlu::extract(transcript);
        let intent = nlu::classify(&fields);
        tracing::info!(intent = %intent, fields = ?fields.present(), "classified transcript");

        if intent == Intent::Unrecognized {
            return DispatchOutcome {
                intent,
                fields: fields.present(),
                result: request.fail(response::unrecognized()),
            };
        }
        request.advance(Stage::Classified);

        let command = match self.validator.validate(intent, &fields, self.clock.now()) {
            Ok(command) => command,
            Err(e) => {
                tracing::info!(intent = %intent, field = e.field(), error = %e, "validation failed");
                return DispatchOutcome {
                    intent,
                    fields: fields.present(),
                    result: request.fail(response::invalid(&e)),
                };
            }
        };
        request.advance(Stage::Validated);

        let token = IdempotencyToken::for_command(&command);
        request.advance(Stage::Dispatched);
        let result = self.dispatch(&command, &token).await;

        let result = if result.success {
            request.advance(Stage::Completed);
            result
        } else {
            request.fail(result)
        };

        tracing::info!(
            intent = %intent,
            success = result.success,
            lead_id = result.lead_id.as_deref().unwrap_or(""),
            stage = request.stage.as_str(),
            "request finished"
        );

        DispatchOutcome {
            intent,
            fields: fields.present(),
            result,
        }
    }

    /// Exactly one adapter call; retries, if any, happen inside the adapter.
    async fn dispatch(&self, command: &Command, token: &IdempotencyToken) -> CommandResult {
        let outcome = match command {
            Command::CreateLead(lead) => self
                .crm
                .create_lead(lead, token)
                .await
                .map(|lead_id| response::lead_created(lead, lead_id)),
            Command::ScheduleVisit(visit) => self
                .crm
                .schedule_visit(visit, token)
                .await
                .map(|_| response::visit_scheduled(visit)),
            Command::UpdateLeadStatus(update) => self
                .crm
                .update_status(update, token)
                .await
                .map(|_| response::status_updated(update)),
        };

        outcome.unwrap_or_else(|e| {
            tracing::warn!(intent = %command.intent(), error = %e, "CRM call failed");
            response::crm_failed(&e)
        })
    }
}
