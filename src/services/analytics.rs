use std::sync::Arc;

use crate::db::{self, queries};
use crate::services::dispatcher::DispatchOutcome;
use crate::state::AppState;

/// Appends one analytics row. Failures are logged and never reach the caller.
pub fn record_outcome(state: &Arc<AppState>, outcome: &DispatchOutcome) {
    let inserted = {
        let conn = db::lock(&state.db);
        queries::insert_analytics(
            &conn,
            outcome.intent.as_str(),
            &outcome.fields,
            outcome.result.success,
            outcome.result.error_kind.as_ref().map(|k| k.as_str()),
            outcome.result.lead_id.as_deref(),
        )
    };

    if let Err(e) = inserted {
        tracing::error!(error = %e, intent = %outcome.intent, "failed to record analytics");
    }
}
