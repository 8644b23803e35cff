use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::dispatcher::CommandDispatcher;

pub struct AppState {
    pub config: AppConfig,
    pub dispatcher: CommandDispatcher,
    /// Analytics only; the interpreter itself keeps no state.
    pub db: Arc<Mutex<Connection>>,
}

pub struct CrmState {
    pub db: Arc<Mutex<Connection>>,
    pub idempotency_ttl: Duration,
}
