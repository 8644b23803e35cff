use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{CrmAck, CrmClient, CrmError, IdempotencyToken};
use crate::models::crm::{
    CreateLeadRequest, CreateLeadResponse, CrmRejection, ScheduleVisitRequest,
    ScheduleVisitResponse, UpdateStatusRequest, UpdateStatusResponse,
};
use crate::models::{LeadFields, StatusUpdateFields, VisitFields};

pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total tries, including the first one.
    pub max_attempts: u32,
    /// Delay before the second try; doubles after every failure.
    pub base_delay: Duration,
    pub attempt_timeout: Duration,
    /// Upper bound for the whole call, retries and backoff included.
    pub budget: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            attempt_timeout: Duration::from_secs(5),
            budget: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    fn backoff(&self, failed_attempts: u32) -> Duration {
        let factor = 1u32 << failed_attempts.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor)
    }
}

/// Talks to the CRM's JSON-over-HTTP contract.
pub struct HttpCrmClient {
    base_url: String,
    policy: RetryPolicy,
    client: reqwest::Client,
}

impl HttpCrmClient {
    pub fn new(base_url: String, policy: RetryPolicy) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            policy,
            client: reqwest::Client::new(),
        }
    }

    async fn post<B, R>(&self, path: &str, body: &B, token: &IdempotencyToken) -> Result<R, CrmError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        match tokio::time::timeout(self.policy.budget, self.post_with_retry(&url, body, token)).await
        {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(url = %url, budget = ?self.policy.budget, "CRM call exceeded its budget");
                Err(CrmError::Timeout(self.policy.budget))
            }
        }
    }

    async fn post_with_retry<B, R>(
        &self,
        url: &str,
        body: &B,
        token: &IdempotencyToken,
    ) -> Result<R, CrmError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            let sent = self
                .client
                .post(url)
                .header(IDEMPOTENCY_HEADER, token.as_str())
                .timeout(self.policy.attempt_timeout)
                .json(body)
                .send()
                .await;

            match sent {
                Ok(resp) if resp.status().is_success() => {
                    return resp.json::<R>().await.map_err(|e| {
                        tracing::error!(error = %e, url = %url, "unreadable CRM response");
                        CrmError::Unavailable {
                            attempts: attempt,
                            last_error: format!("unreadable CRM response: {e}"),
                        }
                    });
                }
                Ok(resp) if resp.status().is_server_error() => {
                    last_error = format!("HTTP {}", resp.status());
                }
                Ok(resp) => {
                    let status = resp.status();
                    let detail = resp
                        .json::<CrmRejection>()
                        .await
                        .map(|r| r.detail)
                        .unwrap_or_else(|_| {
                            status.canonical_reason().unwrap_or("rejected").to_string()
                        });
                    tracing::warn!(url = %url, status = status.as_u16(), detail = %detail, "CRM rejected request");
                    return Err(CrmError::Rejected {
                        status: status.as_u16(),
                        detail,
                    });
                }
                Err(e) if e.is_builder() => {
                    tracing::error!(error = %e, url = %url, "could not build CRM request");
                    return Err(CrmError::Unavailable {
                        attempts: attempt,
                        last_error: e.to_string(),
                    });
                }
                Err(e) => {
                    last_error = e.to_string();
                }
            }

            tracing::warn!(attempt, max_attempts, url = %url, error = %last_error, "CRM call failed");
            if attempt < max_attempts {
                tokio::time::sleep(self.policy.backoff(attempt)).await;
            }
        }

        tracing::error!(attempts = max_attempts, url = %url, error = %last_error, "CRM retries exhausted");
        Err(CrmError::Unavailable {
            attempts: max_attempts,
            last_error,
        })
    }
}

#[async_trait]
impl CrmClient for HttpCrmClient {
    async fn create_lead(
        &self,
        lead: &LeadFields,
        token: &IdempotencyToken,
    ) -> Result<String, CrmError> {
        let body = CreateLeadRequest {
            name: lead.name.clone(),
            phone: lead.phone.clone(),
            city: lead.city.clone(),
            source: Some(lead.source.as_str().to_string()),
        };
        let resp: CreateLeadResponse = self.post("/crm/leads", &body, token).await?;
        Ok(resp.lead_id)
    }

    async fn schedule_visit(
        &self,
        visit: &VisitFields,
        token: &IdempotencyToken,
    ) -> Result<CrmAck, CrmError> {
        let body = ScheduleVisitRequest {
            lead_id: visit.lead_id.clone(),
            visit_time: visit.scheduled_at.to_rfc3339(),
            notes: visit.notes.clone(),
        };
        let resp: ScheduleVisitResponse = self.post("/crm/visits", &body, token).await?;
        Ok(CrmAck {
            reference: resp.visit_id,
            status: resp.status,
        })
    }

    async fn update_status(
        &self,
        update: &StatusUpdateFields,
        token: &IdempotencyToken,
    ) -> Result<CrmAck, CrmError> {
        let body = UpdateStatusRequest {
            status: update.status.as_str().to_string(),
            notes: update.notes.clone(),
        };
        let path = format!("/crm/leads/{}/status", update.lead_id);
        let resp: UpdateStatusResponse = self.post(&path, &body, token).await?;
        Ok(CrmAck {
            reference: resp.lead_id,
            status: resp.status,
        })
    }
}
