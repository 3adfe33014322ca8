use std::{future::Future, time::Duration};

use tokio::{task::JoinSet, time};
use tracing::{debug, warn};

/// Requests whose outcome nobody waits on. A failure is logged and
/// otherwise dropped; the set only exists so shutdown can let them finish.
#[derive(Default)]
pub struct DetachedTasks {
    tasks: JoinSet<()>,
}

impl DetachedTasks {
    pub fn spawn<F, E>(&mut self, label: &'static str, request: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: std::fmt::Display + Send + 'static,
    {
        self.tasks.spawn(async move {
            match request.await {
                Ok(()) => debug!(request = label, "detached request completed"),
                Err(err) => warn!(request = label, "detached request failed: {err}"),
            }
        });
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Drops the bookkeeping of every request that already finished.
    pub fn reap(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            if let Err(err) = joined {
                warn!("detached request aborted: {err}");
            }
        }
    }

    /// Waits up to `limit` for the outstanding requests. Whatever is still
    /// running afterwards is left to the runtime; returns how many that was.
    pub async fn drain(&mut self, limit: Duration) -> usize {
        let tasks = &mut self.tasks;
        let finished = time::timeout(limit, async {
            while let Some(joined) = tasks.join_next().await {
                if let Err(err) = joined {
                    warn!("detached request aborted: {err}");
                }
            }
        })
        .await;

        if finished.is_ok() {
            return 0;
        }
        let abandoned = self.tasks.len();
        warn!(abandoned, "detached requests still running at shutdown");
        self.tasks.detach_all();
        abandoned
    }
}
