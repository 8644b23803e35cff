use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::services::crm::http::RetryPolicy;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub crm_base_url: String,
    pub crm_attempt_timeout_secs: u64,
    pub crm_max_attempts: u32,
    pub crm_backoff_base_ms: u64,
    pub crm_request_budget_secs: u64,
    pub visit_grace_secs: i64,
    pub max_transcript_chars: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: parse_var("PORT", 8000),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "voice_crm_bot.db".to_string()),
            crm_base_url: env::var("CRM_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8001".to_string()),
            crm_attempt_timeout_secs: parse_var("CRM_ATTEMPT_TIMEOUT_SECS", 5),
            crm_max_attempts: parse_var("CRM_MAX_ATTEMPTS", 3),
            crm_backoff_base_ms: parse_var("CRM_BACKOFF_BASE_MS", 200),
            crm_request_budget_secs: parse_var("CRM_REQUEST_BUDGET_SECS", 10),
            visit_grace_secs: parse_var("VISIT_GRACE_SECS", 0),
            max_transcript_chars: parse_var("MAX_TRANSCRIPT_CHARS", 1000),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.crm_max_attempts,
            base_delay: Duration::from_millis(self.crm_backoff_base_ms),
            attempt_timeout: Duration::from_secs(self.crm_attempt_timeout_secs),
            budget: Duration::from_secs(self.crm_request_budget_secs),
        }
    }

    pub fn visit_grace(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.visit_grace_secs.max(0))
    }
}

#[derive(Clone, Debug)]
pub struct MockCrmConfig {
    pub port: u16,
    pub database_url: String,
    /// How long a repeated `Idempotency-Key` replays the first response.
    pub idempotency_ttl_secs: u64,
}

impl MockCrmConfig {
    pub fn from_env() -> Self {
        Self {
            port: parse_var("MOCK_CRM_PORT", 8001),
            database_url: env::var("MOCK_CRM_DATABASE_URL")
                .unwrap_or_else(|_| ":memory:".to_string()),
            idempotency_ttl_secs: parse_var("MOCK_CRM_IDEMPOTENCY_TTL_SECS", 600),
        }
    }

    pub fn idempotency_ttl(&self) -> Duration {
        Duration::from_secs(self.idempotency_ttl_secs)
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
