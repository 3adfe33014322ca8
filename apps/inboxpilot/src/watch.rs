use std::sync::Arc;

use anyhow::{Context, Result};
use client_core::{drive, Controller, ControllerSettings, InboxApi, OperationKind, UserCommand};
use shared::domain::{Category, EmailId, PendingAction, UnknownCategory};
use thiserror::Error;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{broadcast::error::RecvError, mpsc},
};
use tracing::{debug, info};

use crate::render;

pub const HELP: &str = "commands: archive|delete|reply|restore <id>, purge, scan, recategorize, \
schedule, refresh, show [category], quit";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("'{0}' needs an email id")]
    MissingId(&'static str),
    #[error(transparent)]
    Category(#[from] UnknownCategory),
}

/// Parses one stdin line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<UserCommand>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();

    let with_id = |name: &'static str, build: fn(EmailId) -> PendingAction| {
        arg.map(|id| UserCommand::Act(build(EmailId::new(id))))
            .ok_or(CommandError::MissingId(name))
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "archive" => with_id("archive", PendingAction::Archive)?,
        "delete" => with_id("delete", PendingAction::Delete)?,
        "reply" => with_id("reply", PendingAction::Reply)?,
        "restore" => with_id("restore", PendingAction::Restore)?,
        "purge" => UserCommand::Act(PendingAction::PurgeAll),
        "scan" => UserCommand::Run(OperationKind::Scan),
        "recategorize" => UserCommand::Run(OperationKind::Recategorize),
        "schedule" => UserCommand::Run(OperationKind::Schedule),
        "refresh" => UserCommand::Refresh,
        "show" => UserCommand::Show(arg.map(str::parse::<Category>).transpose()?),
        "quit" | "exit" => UserCommand::Shutdown,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

pub async fn run(api: Arc<dyn InboxApi>, settings: ControllerSettings) -> Result<()> {
    let (controller, settled_rx) = Controller::new(api, settings);
    let mut updates = controller.subscribe();
    let (commands, command_rx) = mpsc::channel(32);

    let printer = tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(update) => println!("{}", render::update_line(&update)),
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "update printer lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });
    let controller_loop = tokio::spawn(drive(controller, settled_rx, command_rx));

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match parse_command(&line) {
            Ok(Some(UserCommand::Shutdown)) => break,
            Ok(Some(command)) => {
                if commands.send(command).await.is_err() {
                    break;
                }
            }
            Ok(None) => {}
            Err(err) => println!("{err}; {HELP}"),
        }
    }

    let _ = commands.send(UserCommand::Shutdown).await;
    let controller = controller_loop.await.context("controller loop panicked")?;
    info!(
        remaining = controller.store().counts().total(),
        "watch stopped"
    );
    drop(controller);
    let _ = printer.await;
    Ok(())
}

#[cfg(test)]
#[path = "tests/watch_tests.rs"]
mod tests;
