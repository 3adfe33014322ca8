use std::{collections::VecDeque, sync::Mutex, time::Duration};

use async_trait::async_trait;
use shared::{
    domain::{CategorizedSnapshot, Category, EmailId, EmailRecord},
    protocol::{
        ActionQueueResponse, HealthResponse, OperationResponse, QueuedAction,
        SchedulerStatusResponse, StatsResponse,
    },
};
use tokio::sync::oneshot;

use crate::{api::InboxApi, error::ClientError};

pub(crate) fn email(id: &str, sender: &str, category: Category) -> EmailRecord {
    EmailRecord {
        id: EmailId::new(id),
        sender: sender.to_string(),
        subject: format!("subject {id}"),
        preview: format!("preview {id}"),
        timestamp: "Today 09:00".to_string(),
        category,
        read: None,
    }
}

pub(crate) fn snapshot(records: Vec<EmailRecord>, last_sync: &str) -> CategorizedSnapshot {
    let mut snapshot = CategorizedSnapshot {
        last_sync: last_sync.to_string(),
        ..CategorizedSnapshot::default()
    };
    for record in records {
        snapshot.list_mut(record.category).push(record);
    }
    snapshot
}

pub(crate) fn unavailable(path: &str) -> ClientError {
    ClientError::Status {
        path: path.to_string(),
        status: 503,
        body: None,
    }
}

type FetchGate = oneshot::Receiver<Result<CategorizedSnapshot, ClientError>>;

/// In-memory backend. Fetches answer with `snapshot` unless a gate was
/// queued, in which case the call waits for the test to resolve it.
pub(crate) struct ScriptedApi {
    snapshot: CategorizedSnapshot,
    calls: Mutex<Vec<String>>,
    fetch_gates: Mutex<VecDeque<FetchGate>>,
    operation_results: Mutex<VecDeque<Result<OperationResponse, ClientError>>>,
    operation_gate: Mutex<Option<oneshot::Receiver<()>>>,
    fail_forwards: bool,
    forward_delay: Option<Duration>,
}

impl ScriptedApi {
    pub(crate) fn new(snapshot: CategorizedSnapshot) -> Self {
        Self {
            snapshot,
            calls: Mutex::new(Vec::new()),
            fetch_gates: Mutex::new(VecDeque::new()),
            operation_results: Mutex::new(VecDeque::new()),
            operation_gate: Mutex::new(None),
            fail_forwards: false,
            forward_delay: None,
        }
    }

    pub(crate) fn failing_forwards(mut self) -> Self {
        self.fail_forwards = true;
        self
    }

    /// Forwards take `delay` before the backend sees them.
    pub(crate) fn with_forward_delay(mut self, delay: Duration) -> Self {
        self.forward_delay = Some(delay);
        self
    }

    pub(crate) fn gate_next_fetch(
        &self,
    ) -> oneshot::Sender<Result<CategorizedSnapshot, ClientError>> {
        let (tx, rx) = oneshot::channel();
        self.fetch_gates.lock().unwrap().push_back(rx);
        tx
    }

    pub(crate) fn push_operation_result(&self, result: Result<OperationResponse, ClientError>) {
        self.operation_results.lock().unwrap().push_back(result);
    }

    pub(crate) fn gate_next_operation(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.operation_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count_calls(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    /// Yields until at least `n` calls starting with `prefix` were made.
    pub(crate) async fn wait_for_calls(&self, prefix: &str, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.count_calls(prefix) < n {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("expected api calls were not made");
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    async fn operation(&self, call: String) -> Result<OperationResponse, ClientError> {
        self.record(call);
        let gate = self.operation_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.operation_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(OperationResponse {
                    success: true,
                    ..OperationResponse::default()
                })
            })
    }

    async fn forward(&self, call: String) -> Result<(), ClientError> {
        if let Some(delay) = self.forward_delay {
            tokio::time::sleep(delay).await;
        }
        self.record(call);
        if self.fail_forwards {
            return Err(unavailable("/api/actions"));
        }
        Ok(())
    }
}

#[async_trait]
impl InboxApi for ScriptedApi {
    async fn fetch_snapshot(&self) -> Result<CategorizedSnapshot, ClientError> {
        self.record("fetch".to_string());
        let gate = self.fetch_gates.lock().unwrap().pop_front();
        match gate {
            Some(gate) => gate.await.unwrap_or_else(|_| Err(unavailable("/api/emails"))),
            None => Ok(self.snapshot.clone()),
        }
    }

    async fn scan_inbox(&self, max_emails: u32) -> Result<OperationResponse, ClientError> {
        self.operation(format!("scan:{max_emails}")).await
    }

    async fn recategorize(&self) -> Result<OperationResponse, ClientError> {
        self.operation("recategorize".to_string()).await
    }

    async fn run_scheduler(&self, delay_secs: f64) -> Result<OperationResponse, ClientError> {
        self.operation(format!("schedule:{delay_secs}")).await
    }

    async fn queue_action(
        &self,
        email_id: &EmailId,
        action: QueuedAction,
    ) -> Result<(), ClientError> {
        self.forward(format!("queue:{email_id}:{}", action.kind()))
            .await
    }

    async fn purge_spam(&self) -> Result<(), ClientError> {
        self.forward("purge".to_string()).await
    }

    async fn restore(&self, email_id: &EmailId) -> Result<(), ClientError> {
        self.forward(format!("restore:{email_id}")).await
    }

    async fn stats(&self) -> Result<StatsResponse, ClientError> {
        Ok(StatsResponse {
            total_emails: self.snapshot.counts().total(),
            by_category: self.snapshot.counts(),
        })
    }

    async fn action_queue(&self) -> Result<ActionQueueResponse, ClientError> {
        Ok(ActionQueueResponse::default())
    }

    async fn scheduler_status(&self) -> Result<SchedulerStatusResponse, ClientError> {
        Ok(SchedulerStatusResponse {
            status: "ready".to_string(),
            message: String::new(),
        })
    }

    async fn health(&self) -> Result<HealthResponse, ClientError> {
        Ok(HealthResponse {
            status: "healthy".to_string(),
            service: "InboxPilot".to_string(),
        })
    }
}
