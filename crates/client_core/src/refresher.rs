//! Snapshot refresh bookkeeping: sequence tokens, tick skipping and the
//! live/offline indicator.

use chrono::{DateTime, Utc};
use shared::domain::CategorizedSnapshot;
use tracing::{debug, info, warn};

use crate::{error::ClientError, store::SnapshotStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefreshTicket(u64);

impl RefreshTicket {
    pub fn sequence(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Live,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// The latest request failed; the previous snapshot stays on screen.
    Offline,
    /// A newer request was issued after this one; its result is dropped.
    Stale,
}

#[derive(Debug)]
pub struct SnapshotRefresher {
    last_issued: u64,
    in_flight: usize,
    connectivity: Connectivity,
    last_synced_at: Option<DateTime<Utc>>,
}

impl Default for SnapshotRefresher {
    fn default() -> Self {
        Self {
            last_issued: 0,
            in_flight: 0,
            connectivity: Connectivity::Live,
            last_synced_at: None,
        }
    }
}

impl SnapshotRefresher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        self.last_synced_at
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Timer path. Returns `None` while any fetch is still outstanding.
    pub fn begin_tick(&mut self) -> Option<RefreshTicket> {
        if self.in_flight > 0 {
            debug!(in_flight = self.in_flight, "skipping refresh tick");
            return None;
        }
        Some(self.issue())
    }

    /// Manual path: always issues a new request.
    pub fn begin_manual(&mut self) -> RefreshTicket {
        self.issue()
    }

    fn issue(&mut self) -> RefreshTicket {
        self.last_issued += 1;
        self.in_flight += 1;
        RefreshTicket(self.last_issued)
    }

    /// Applies a settled fetch. Only the most recently issued request may
    /// touch the store or the connectivity indicator.
    pub fn settle(
        &mut self,
        store: &mut SnapshotStore,
        ticket: RefreshTicket,
        result: Result<CategorizedSnapshot, ClientError>,
        now: DateTime<Utc>,
    ) -> RefreshOutcome {
        self.in_flight = self.in_flight.saturating_sub(1);

        if ticket.0 != self.last_issued {
            debug!(
                sequence = ticket.0,
                latest = self.last_issued,
                "discarding stale snapshot response"
            );
            return RefreshOutcome::Stale;
        }

        match result {
            Ok(snapshot) => {
                info!(
                    sequence = ticket.0,
                    total = snapshot.counts().total(),
                    "applied snapshot"
                );
                store.replace(snapshot);
                self.connectivity = Connectivity::Live;
                self.last_synced_at = Some(now);
                RefreshOutcome::Applied
            }
            Err(err) => {
                warn!(
                    sequence = ticket.0,
                    transport = err.is_transport(),
                    "snapshot fetch failed: {err}"
                );
                self.connectivity = Connectivity::Offline;
                RefreshOutcome::Offline
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/refresher_tests.rs"]
mod tests;
