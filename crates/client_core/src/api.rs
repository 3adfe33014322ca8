//! HTTP access to the InboxPilot backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{CategorizedSnapshot, EmailId},
    error::ApiErrorBody,
    protocol::{
        ActionQueueResponse, ActionRequest, HealthResponse, OperationResponse, QueuedAction,
        RecategorizeRequest, RestoreRequest, ScanRequest, ScheduleRequest,
        SchedulerStatusResponse, StatsResponse,
    },
};
use tracing::debug;
use url::Url;

use crate::error::ClientError;

pub const EMAILS_PATH: &str = "/api/emails";
pub const SCAN_PATH: &str = "/api/emails/scan";
pub const RECATEGORIZE_PATH: &str = "/api/emails/recategorize";
pub const SCHEDULER_RUN_PATH: &str = "/api/scheduler/run";
pub const SCHEDULER_STATUS_PATH: &str = "/api/scheduler/status";
pub const ACTIONS_PATH: &str = "/api/actions";
pub const PURGE_SPAM_PATH: &str = "/api/actions/purge-spam";
pub const RESTORE_PATH: &str = "/api/actions/restore";
pub const ACTION_QUEUE_PATH: &str = "/api/actions/queue";
pub const STATS_PATH: &str = "/api/stats";
pub const HEALTH_PATH: &str = "/health";

/// Everything the client asks of the backend.
#[async_trait]
pub trait InboxApi: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<CategorizedSnapshot, ClientError>;
    async fn scan_inbox(&self, max_emails: u32) -> Result<OperationResponse, ClientError>;
    async fn recategorize(&self) -> Result<OperationResponse, ClientError>;
    async fn run_scheduler(&self, delay_secs: f64) -> Result<OperationResponse, ClientError>;
    async fn queue_action(
        &self,
        email_id: &EmailId,
        action: QueuedAction,
    ) -> Result<(), ClientError>;
    async fn purge_spam(&self) -> Result<(), ClientError>;
    async fn restore(&self, email_id: &EmailId) -> Result<(), ClientError>;
    async fn stats(&self) -> Result<StatsResponse, ClientError>;
    async fn action_queue(&self) -> Result<ActionQueueResponse, ClientError>;
    async fn scheduler_status(&self) -> Result<SchedulerStatusResponse, ClientError>;
    async fn health(&self) -> Result<HealthResponse, ClientError>;
}

pub struct HttpInboxApi {
    http: Client,
    base_url: Url,
}

impl HttpInboxApi {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ClientError::Transport {
                path: base_url.to_string(),
                source,
            })?;
        Self::with_client(http, base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, ClientError> {
        let invalid = |reason: String| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };
        let parsed = Url::parse(base_url.trim()).map_err(|e| invalid(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
        }
        if parsed.cannot_be_a_base() {
            return Err(invalid("url cannot be used as a base".to_string()));
        }
        Ok(Self {
            http,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let prefix = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{prefix}{path}"));
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self
            .http
            .get(self.endpoint(path))
            .send()
            .await
            .map_err(|source| transport(path, source))?;
        read_json(path, response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self
            .http
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(|source| transport(path, source))?;
        read_json(path, response).await
    }

    /// Fire-and-forget style POST: only transport and status matter.
    async fn post_ack(&self, path: &str, body: Option<&impl Serialize>) -> Result<(), ClientError> {
        let mut request = self.http.post(self.endpoint(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|source| transport(path, source))?;
        let status = response.status();
        checked_text(path, response).await?;
        debug!(path, status = status.as_u16(), "backend acknowledged action");
        Ok(())
    }
}

fn transport(path: &str, source: reqwest::Error) -> ClientError {
    ClientError::Transport {
        path: path.to_string(),
        source,
    }
}

/// Body text of a successful response; any other status becomes
/// `ClientError::Status` with whatever error payload could be parsed.
async fn checked_text(path: &str, response: Response) -> Result<String, ClientError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|source| transport(path, source))?;
    if !status.is_success() {
        return Err(ClientError::Status {
            path: path.to_string(),
            status: status.as_u16(),
            body: serde_json::from_str::<ApiErrorBody>(&text).ok(),
        });
    }
    Ok(text)
}

async fn read_json<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, ClientError> {
    let text = checked_text(path, response).await?;
    serde_json::from_str(&text).map_err(|source| ClientError::Decode {
        path: path.to_string(),
        source,
    })
}

#[async_trait]
impl InboxApi for HttpInboxApi {
    async fn fetch_snapshot(&self) -> Result<CategorizedSnapshot, ClientError> {
        self.get_json(EMAILS_PATH).await
    }

    async fn scan_inbox(&self, max_emails: u32) -> Result<OperationResponse, ClientError> {
        self.post_json(SCAN_PATH, &ScanRequest { max_emails }).await
    }

    async fn recategorize(&self) -> Result<OperationResponse, ClientError> {
        self.post_json(RECATEGORIZE_PATH, &RecategorizeRequest::default())
            .await
    }

    async fn run_scheduler(&self, delay_secs: f64) -> Result<OperationResponse, ClientError> {
        self.post_json(SCHEDULER_RUN_PATH, &ScheduleRequest { delay: delay_secs })
            .await
    }

    async fn queue_action(
        &self,
        email_id: &EmailId,
        action: QueuedAction,
    ) -> Result<(), ClientError> {
        let body = ActionRequest {
            email_id: email_id.clone(),
            action,
        };
        self.post_ack(ACTIONS_PATH, Some(&body)).await
    }

    async fn purge_spam(&self) -> Result<(), ClientError> {
        self.post_ack(PURGE_SPAM_PATH, None::<&()>).await
    }

    async fn restore(&self, email_id: &EmailId) -> Result<(), ClientError> {
        let body = RestoreRequest {
            email_id: email_id.clone(),
        };
        self.post_ack(RESTORE_PATH, Some(&body)).await
    }

    async fn stats(&self) -> Result<StatsResponse, ClientError> {
        self.get_json(STATS_PATH).await
    }

    async fn action_queue(&self) -> Result<ActionQueueResponse, ClientError> {
        self.get_json(ACTION_QUEUE_PATH).await
    }

    async fn scheduler_status(&self) -> Result<SchedulerStatusResponse, ClientError> {
        self.get_json(SCHEDULER_STATUS_PATH).await
    }

    async fn health(&self) -> Result<HealthResponse, ClientError> {
        self.get_json(HEALTH_PATH).await
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
