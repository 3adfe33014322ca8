//! Event loop that owns the [`Controller`]. The poll timer, settled
//! requests, toast deadlines and user commands funnel through one `select!`.

use chrono::Utc;
use shared::domain::{Category, PendingAction};
use tokio::{
    sync::mpsc,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info};

use crate::{
    controller::{Controller, Settled},
    operations::OperationKind,
};

#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    Act(PendingAction),
    Run(OperationKind),
    Refresh,
    Show(Option<Category>),
    Shutdown,
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

impl Controller {
    pub fn handle_command(&mut self, command: UserCommand, now: Instant) {
        match command {
            UserCommand::Act(action) => {
                // Rejections are already published as updates.
                let _ = self.dispatch(action, now);
            }
            UserCommand::Run(kind) => {
                if !self.trigger(kind) {
                    debug!(operation = %kind, "operation already running");
                }
            }
            UserCommand::Refresh => {
                self.refresh_now();
            }
            UserCommand::Show(category) => self.show(category),
            UserCommand::Shutdown => {}
        }
    }
}

/// Runs until `Shutdown` arrives or every command sender is dropped. The
/// initial fetch is issued before any command is read. On the way out,
/// action forwards still in flight get `shutdown_grace` to finish.
pub async fn drive(
    mut controller: Controller,
    mut settled_rx: mpsc::UnboundedReceiver<Settled>,
    mut commands: mpsc::Receiver<UserCommand>,
) -> Controller {
    let mut ticker = time::interval(controller.settings().poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await;
    controller.on_tick();

    loop {
        controller.reap_forwards();
        let toast_deadline = controller.next_toast_deadline();
        tokio::select! {
            _ = ticker.tick() => {
                controller.on_tick();
            }
            Some(settled) = settled_rx.recv() => {
                controller.on_settled(settled, Utc::now());
            }
            _ = sleep_until_deadline(toast_deadline) => {
                controller.expire_toast(Instant::now());
            }
            command = commands.recv() => match command {
                Some(UserCommand::Shutdown) | None => break,
                Some(command) => controller.handle_command(command, Instant::now()),
            },
        }
    }

    let abandoned = controller.finish_forwards().await;
    info!(abandoned, "controller loop stopped");
    controller
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
