//! Scan / recategorize / schedule triggers and their user-facing outcomes.

use std::fmt;

use shared::{
    error::UNKNOWN_ERROR,
    protocol::OperationResponse,
};

use crate::{api::InboxApi, error::ClientError};

pub const DEFAULT_SCAN_MAX_EMAILS: u32 = 10;
pub const DEFAULT_SCHEDULER_DELAY_SECS: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Scan,
    Recategorize,
    Schedule,
}

impl OperationKind {
    pub const ALL: [OperationKind; 3] = [
        OperationKind::Scan,
        OperationKind::Recategorize,
        OperationKind::Schedule,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Scan => "scan",
            OperationKind::Recategorize => "recategorize",
            OperationKind::Schedule => "schedule",
        }
    }

    fn failure_prefix(self) -> &'static str {
        match self {
            OperationKind::Scan => "Scan failed",
            OperationKind::Recategorize => "Recategorization failed",
            OperationKind::Schedule => "Scheduling failed",
        }
    }

    fn error_prefix(self) -> &'static str {
        match self {
            OperationKind::Scan => "Error scanning inbox",
            OperationKind::Recategorize | OperationKind::Schedule => "Error",
        }
    }

    fn summary(self, response: &OperationResponse) -> String {
        let stats = &response.stats;
        match self {
            OperationKind::Scan => {
                format!("✅ Scanned {} emails!", stats.processed.unwrap_or(0))
            }
            OperationKind::Recategorize => {
                format!("✅ Recategorized {} emails!", stats.total.unwrap_or(0))
            }
            OperationKind::Schedule => format!(
                "✅ Scheduled {}/{} events!",
                stats.succeeded.unwrap_or(0),
                stats.total.unwrap_or(0)
            ),
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request parameters for the three operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperationParams {
    pub scan_max_emails: u32,
    pub scheduler_delay_secs: f64,
}

impl Default for OperationParams {
    fn default() -> Self {
        Self {
            scan_max_emails: DEFAULT_SCAN_MAX_EMAILS,
            scheduler_delay_secs: DEFAULT_SCHEDULER_DELAY_SECS,
        }
    }
}

pub async fn run_operation(
    api: &dyn InboxApi,
    kind: OperationKind,
    params: OperationParams,
) -> Result<OperationResponse, ClientError> {
    match kind {
        OperationKind::Scan => api.scan_inbox(params.scan_max_emails).await,
        OperationKind::Recategorize => api.recategorize().await,
        OperationKind::Schedule => api.run_scheduler(params.scheduler_delay_secs).await,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    /// Short summary; the caller refreshes the snapshot.
    Succeeded(String),
    /// Blocking acknowledgement; no refresh.
    Failed(String),
}

impl OperationOutcome {
    pub fn message(&self) -> &str {
        match self {
            OperationOutcome::Succeeded(message) | OperationOutcome::Failed(message) => message,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OperationOutcome::Succeeded(_))
    }
}

pub fn describe_outcome(
    kind: OperationKind,
    result: &Result<OperationResponse, ClientError>,
) -> OperationOutcome {
    match result {
        Ok(response) if response.success => OperationOutcome::Succeeded(kind.summary(response)),
        Ok(response) => OperationOutcome::Failed(format!(
            "❌ {}: {}",
            kind.failure_prefix(),
            response
                .message
                .as_deref()
                .filter(|message| !message.is_empty())
                .unwrap_or(UNKNOWN_ERROR)
        )),
        Err(err) => match err.status_reason() {
            Some(reason) => {
                OperationOutcome::Failed(format!("❌ {}: {reason}", kind.failure_prefix()))
            }
            None => OperationOutcome::Failed(format!("❌ {}: {err}", kind.error_prefix())),
        },
    }
}

/// Independent idle/busy flags, one per operation.
#[derive(Debug, Default)]
pub struct OperationTriggers {
    scan: bool,
    recategorize: bool,
    schedule: bool,
}

impl OperationTriggers {
    pub fn is_busy(&self, kind: OperationKind) -> bool {
        *self.flag(kind)
    }

    /// idle -> busy. Returns false (and changes nothing) when already busy.
    pub fn begin(&mut self, kind: OperationKind) -> bool {
        let flag = self.flag_mut(kind);
        if *flag {
            return false;
        }
        *flag = true;
        true
    }

    /// busy -> idle, whatever the outcome.
    pub fn settle(&mut self, kind: OperationKind) {
        *self.flag_mut(kind) = false;
    }

    fn flag(&self, kind: OperationKind) -> &bool {
        match kind {
            OperationKind::Scan => &self.scan,
            OperationKind::Recategorize => &self.recategorize,
            OperationKind::Schedule => &self.schedule,
        }
    }

    fn flag_mut(&mut self, kind: OperationKind) -> &mut bool {
        match kind {
            OperationKind::Scan => &mut self.scan,
            OperationKind::Recategorize => &mut self.recategorize,
            OperationKind::Schedule => &mut self.schedule,
        }
    }
}

#[cfg(test)]
#[path = "tests/operations_tests.rs"]
mod tests;
