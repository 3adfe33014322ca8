use super::*;
use std::{sync::Arc, time::Duration};

use shared::domain::EmailId;
use tokio::sync::broadcast;

use crate::{
    controller::{ControllerSettings, ControllerUpdate},
    test_support::{email, snapshot, ScriptedApi},
};

async fn next_update(
    updates: &mut broadcast::Receiver<ControllerUpdate>,
    matches: impl Fn(&ControllerUpdate) -> bool,
) -> ControllerUpdate {
    loop {
        let update = updates.recv().await.expect("controller update");
        if matches(&update) {
            return update;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn loop_fetches_dispatches_and_expires_notice() {
    let api = Arc::new(ScriptedApi::new(snapshot(
        vec![
            email("u1", "Ops Team", Category::Urgent),
            email("s1", "Lottery", Category::Spam),
        ],
        "sync-1",
    )));
    let (controller, settled_rx) = Controller::new(api.clone(), ControllerSettings::default());
    let mut updates = controller.subscribe();
    let (commands, command_rx) = mpsc::channel(8);
    let loop_handle = tokio::spawn(drive(controller, settled_rx, command_rx));

    next_update(&mut updates, |u| {
        matches!(u, ControllerUpdate::SnapshotReplaced { .. })
    })
    .await;

    let started = Instant::now();
    commands
        .send(UserCommand::Act(PendingAction::Delete(EmailId::new("u1"))))
        .await
        .expect("loop running");
    let shown = next_update(&mut updates, |u| matches!(u, ControllerUpdate::ToastShown(_))).await;
    assert_eq!(
        shown,
        ControllerUpdate::ToastShown("Action Queued: delete email from Ops Team".into())
    );

    next_update(&mut updates, |u| *u == ControllerUpdate::ToastCleared).await;
    assert!(started.elapsed() >= Duration::from_millis(3000));
    assert!(started.elapsed() < Duration::from_secs(30));

    commands.send(UserCommand::Shutdown).await.expect("loop running");
    let controller = loop_handle.await.expect("loop task");

    assert!(controller.store().list(Category::Urgent).is_empty());
    assert!(controller.notice().is_none());
    assert_eq!(api.count_calls("queue:u1:delete"), 1);
}

#[tokio::test(start_paused = true)]
async fn timer_polls_every_interval() {
    let api = Arc::new(ScriptedApi::new(snapshot(vec![], "sync")));
    let settings = ControllerSettings {
        poll_interval: Duration::from_secs(30),
        ..ControllerSettings::default()
    };
    let (controller, settled_rx) = Controller::new(api.clone(), settings);
    let (commands, command_rx) = mpsc::channel(8);
    let loop_handle = tokio::spawn(drive(controller, settled_rx, command_rx));

    api.wait_for_calls("fetch", 1).await;
    tokio::time::sleep(Duration::from_secs(61)).await;
    api.wait_for_calls("fetch", 3).await;

    drop(commands);
    loop_handle.await.expect("loop task");
    assert_eq!(api.count_calls("fetch"), 3);
}

#[tokio::test]
async fn commands_run_operations_and_manual_refresh() {
    let api = Arc::new(ScriptedApi::new(snapshot(vec![], "sync")));
    let (controller, settled_rx) = Controller::new(api.clone(), ControllerSettings::default());
    let mut updates = controller.subscribe();
    let (commands, command_rx) = mpsc::channel(8);
    commands
        .send(UserCommand::Run(OperationKind::Scan))
        .await
        .expect("loop running");
    let loop_handle = tokio::spawn(drive(controller, settled_rx, command_rx));

    let succeeded = next_update(&mut updates, |u| {
        matches!(u, ControllerUpdate::OperationSucceeded { .. })
    })
    .await;
    assert_eq!(
        succeeded,
        ControllerUpdate::OperationSucceeded {
            kind: OperationKind::Scan,
            summary: "✅ Scanned 0 emails!".into(),
        }
    );
    api.wait_for_calls("fetch", 2).await;

    commands.send(UserCommand::Refresh).await.expect("loop running");
    api.wait_for_calls("fetch", 3).await;
    commands.send(UserCommand::Shutdown).await.expect("loop running");
    loop_handle.await.expect("loop task");

    // Initial fetch, the scan, its follow-up refresh and the manual one.
    assert_eq!(api.calls(), vec!["fetch", "scan:10", "fetch", "fetch"]);
}

#[tokio::test(start_paused = true)]
async fn shutdown_waits_for_forwards_in_flight() {
    let api = Arc::new(
        ScriptedApi::new(snapshot(
            vec![email("u1", "Ops Team", Category::Urgent)],
            "sync-1",
        ))
        .with_forward_delay(Duration::from_millis(200)),
    );
    let (controller, settled_rx) = Controller::new(api.clone(), ControllerSettings::default());
    let mut updates = controller.subscribe();
    let (commands, command_rx) = mpsc::channel(8);
    let loop_handle = tokio::spawn(drive(controller, settled_rx, command_rx));
    next_update(&mut updates, |u| {
        matches!(u, ControllerUpdate::SnapshotReplaced { .. })
    })
    .await;

    commands
        .send(UserCommand::Act(PendingAction::Archive(EmailId::new("u1"))))
        .await
        .expect("loop running");
    commands.send(UserCommand::Shutdown).await.expect("loop running");
    let controller = loop_handle.await.expect("loop task");

    assert_eq!(api.count_calls("queue:u1:archive"), 1);
    assert_eq!(controller.pending_forwards(), 0);
}

#[tokio::test(start_paused = true)]
async fn shutdown_gives_up_on_stuck_forwards() {
    let api = Arc::new(
        ScriptedApi::new(snapshot(vec![email("s1", "Lottery", Category::Spam)], "sync-1"))
            .with_forward_delay(Duration::from_secs(600)),
    );
    let settings = ControllerSettings {
        shutdown_grace: Duration::from_secs(2),
        ..ControllerSettings::default()
    };
    let (controller, settled_rx) = Controller::new(api.clone(), settings);
    let mut updates = controller.subscribe();
    let (commands, command_rx) = mpsc::channel(8);
    let loop_handle = tokio::spawn(drive(controller, settled_rx, command_rx));
    next_update(&mut updates, |u| {
        matches!(u, ControllerUpdate::SnapshotReplaced { .. })
    })
    .await;

    let started = Instant::now();
    commands
        .send(UserCommand::Act(PendingAction::PurgeAll))
        .await
        .expect("loop running");
    commands.send(UserCommand::Shutdown).await.expect("loop running");
    loop_handle.await.expect("loop task");

    assert!(started.elapsed() >= Duration::from_secs(2));
    assert!(started.elapsed() < Duration::from_secs(600));
    assert_eq!(api.count_calls("purge"), 0);
}
