//! The client sync & action controller.
//!
//! All state lives in one owned [`Controller`] driven from a single task.
//! Network calls run as spawned tasks; fetches and operations report back
//! through the `Settled` channel. Action forwards are fire-and-forget but
//! tracked, so shutdown can give them time to reach the backend.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use shared::{
    domain::{
        CategorizedSnapshot, Category, CategoryCounts, EmailId, EmailRecord, PendingAction,
    },
    protocol::OperationResponse,
};
use tokio::{
    sync::{broadcast, mpsc},
    time::Instant,
};
use tracing::{debug, info, warn};

use crate::{
    api::InboxApi,
    detached::DetachedTasks,
    dispatcher::{self, DispatchError},
    error::ClientError,
    operations::{
        describe_outcome, run_operation, OperationKind, OperationOutcome, OperationParams,
        OperationTriggers,
    },
    refresher::{Connectivity, RefreshOutcome, RefreshTicket, SnapshotRefresher},
    store::SnapshotStore,
    toast::{ToastSlot, DEFAULT_TOAST_DURATION},
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerSettings {
    pub poll_interval: Duration,
    pub toast_duration: Duration,
    /// How long shutdown waits for action forwards still in flight.
    pub shutdown_grace: Duration,
    pub operations: OperationParams,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            toast_duration: DEFAULT_TOAST_DURATION,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            operations: OperationParams::default(),
        }
    }
}

/// Completion of a request the controller waits on.
#[derive(Debug)]
pub enum Settled {
    Refresh {
        ticket: RefreshTicket,
        result: Result<CategorizedSnapshot, ClientError>,
    },
    Operation {
        kind: OperationKind,
        result: Result<OperationResponse, ClientError>,
    },
}

/// What a front end needs to redraw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerUpdate {
    SnapshotReplaced {
        counts: CategoryCounts,
        last_sync: String,
    },
    ConnectivityChanged(Connectivity),
    ListChanged {
        category: Category,
        remaining: usize,
    },
    ToastShown(String),
    ToastCleared,
    BusyChanged {
        kind: OperationKind,
        busy: bool,
    },
    OperationSucceeded {
        kind: OperationKind,
        summary: String,
    },
    OperationFailed {
        kind: OperationKind,
        alert: String,
    },
    ActionRejected(String),
    Listing {
        category: Category,
        emails: Vec<EmailRecord>,
    },
}

pub struct Controller {
    api: Arc<dyn InboxApi>,
    settings: ControllerSettings,
    store: SnapshotStore,
    refresher: SnapshotRefresher,
    toast: ToastSlot,
    operations: OperationTriggers,
    forwards: DetachedTasks,
    settled_tx: mpsc::UnboundedSender<Settled>,
    updates: broadcast::Sender<ControllerUpdate>,
}

impl Controller {
    pub fn new(
        api: Arc<dyn InboxApi>,
        settings: ControllerSettings,
    ) -> (Self, mpsc::UnboundedReceiver<Settled>) {
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        let (updates, _) = broadcast::channel(256);
        let controller = Self {
            api,
            settings,
            store: SnapshotStore::new(),
            refresher: SnapshotRefresher::new(),
            toast: ToastSlot::new(settings.toast_duration),
            operations: OperationTriggers::default(),
            forwards: DetachedTasks::default(),
            settled_tx,
            updates,
        };
        (controller, settled_rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ControllerUpdate> {
        self.updates.subscribe()
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn connectivity(&self) -> Connectivity {
        self.refresher.connectivity()
    }

    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        self.refresher.last_synced_at()
    }

    pub fn notice(&self) -> Option<&str> {
        self.toast.current()
    }

    pub fn next_toast_deadline(&self) -> Option<Instant> {
        self.toast.next_deadline()
    }

    pub fn is_busy(&self, kind: OperationKind) -> bool {
        self.operations.is_busy(kind)
    }

    fn emit(&self, update: ControllerUpdate) {
        // No subscribers is fine: nobody is drawing.
        let _ = self.updates.send(update);
    }

    /// Poll timer fired. Returns the ticket when a fetch was issued.
    pub fn on_tick(&mut self) -> Option<RefreshTicket> {
        let ticket = self.refresher.begin_tick()?;
        self.spawn_fetch(ticket);
        Some(ticket)
    }

    /// Fetch immediately, regardless of the timer or outstanding fetches.
    pub fn refresh_now(&mut self) -> RefreshTicket {
        let ticket = self.refresher.begin_manual();
        self.spawn_fetch(ticket);
        ticket
    }

    fn spawn_fetch(&self, ticket: RefreshTicket) {
        let api = Arc::clone(&self.api);
        let settled_tx = self.settled_tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_snapshot().await;
            let _ = settled_tx.send(Settled::Refresh { ticket, result });
        });
    }

    /// Applies an action locally, shows its notice and forwards it once.
    /// The forward's result is never inspected.
    pub fn dispatch(&mut self, action: PendingAction, now: Instant) -> Result<(), DispatchError> {
        debug!(
            action = %action.kind(),
            email = action.target().map(EmailId::as_str).unwrap_or("-"),
            "applying action"
        );
        let applied = match dispatcher::apply(&mut self.store, action) {
            Ok(applied) => applied,
            Err(err) => {
                self.emit(ControllerUpdate::ActionRejected(err.to_string()));
                return Err(err);
            }
        };
        debug_assert!(self.store.is_subset_of_fetched());

        self.emit(ControllerUpdate::ListChanged {
            category: applied.category,
            remaining: self.store.list(applied.category).len(),
        });
        self.toast.show(applied.notice.clone(), now);
        self.emit(ControllerUpdate::ToastShown(applied.notice));

        let api = Arc::clone(&self.api);
        let forward = applied.forward;
        self.forwards.spawn(forward.label(), async move {
            forward.send(api.as_ref()).await
        });
        Ok(())
    }

    pub fn pending_forwards(&self) -> usize {
        self.forwards.pending()
    }

    pub fn reap_forwards(&mut self) {
        self.forwards.reap();
    }

    /// Waits, at most `shutdown_grace`, for forwards still in flight.
    /// Returns how many were abandoned.
    pub async fn finish_forwards(&mut self) -> usize {
        self.forwards.drain(self.settings.shutdown_grace).await
    }

    /// Starts a long-running operation unless that trigger is already busy.
    pub fn trigger(&mut self, kind: OperationKind) -> bool {
        if !self.operations.begin(kind) {
            return false;
        }
        self.emit(ControllerUpdate::BusyChanged { kind, busy: true });

        let api = Arc::clone(&self.api);
        let params = self.settings.operations;
        let settled_tx = self.settled_tx.clone();
        tokio::spawn(async move {
            let result = run_operation(api.as_ref(), kind, params).await;
            let _ = settled_tx.send(Settled::Operation { kind, result });
        });
        true
    }

    pub fn on_settled(&mut self, settled: Settled, now: DateTime<Utc>) {
        match settled {
            Settled::Refresh { ticket, result } => self.settle_refresh(ticket, result, now),
            Settled::Operation { kind, result } => self.settle_operation(kind, result),
        }
    }

    fn settle_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<CategorizedSnapshot, ClientError>,
        now: DateTime<Utc>,
    ) {
        let before = self.refresher.connectivity();
        let outcome = self.refresher.settle(&mut self.store, ticket, result, now);
        if outcome == RefreshOutcome::Applied {
            self.emit(ControllerUpdate::SnapshotReplaced {
                counts: self.store.counts(),
                last_sync: self.store.last_sync().unwrap_or_default().to_string(),
            });
        }
        let after = self.refresher.connectivity();
        if before != after {
            self.emit(ControllerUpdate::ConnectivityChanged(after));
        }
    }

    fn settle_operation(
        &mut self,
        kind: OperationKind,
        result: Result<OperationResponse, ClientError>,
    ) {
        self.operations.settle(kind);
        self.emit(ControllerUpdate::BusyChanged { kind, busy: false });

        match describe_outcome(kind, &result) {
            OperationOutcome::Succeeded(summary) => {
                info!(operation = %kind, "{summary}");
                self.emit(ControllerUpdate::OperationSucceeded { kind, summary });
                self.refresh_now();
            }
            OperationOutcome::Failed(alert) => {
                warn!(operation = %kind, "{alert}");
                self.emit(ControllerUpdate::OperationFailed { kind, alert });
            }
        }
    }

    pub fn expire_toast(&mut self, now: Instant) {
        if self.toast.expire(now) {
            self.emit(ControllerUpdate::ToastCleared);
        }
    }

    /// Publishes the displayed lists, one update per category.
    pub fn show(&self, category: Option<Category>) {
        let categories = match category {
            Some(category) => vec![category],
            None => Category::ALL.to_vec(),
        };
        for category in categories {
            self.emit(ControllerUpdate::Listing {
                category,
                emails: self.store.list(category).to_vec(),
            });
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
