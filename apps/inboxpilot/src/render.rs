//! Plain-text rendering for the terminal front end.

use std::fmt::Write as _;

use client_core::{Connectivity, ControllerUpdate};
use shared::{
    domain::{CategorizedSnapshot, Category, CategoryCounts, EmailRecord},
    protocol::{ActionQueueResponse, HealthResponse, SchedulerStatusResponse, StatsResponse},
};

pub fn counts_line(counts: &CategoryCounts) -> String {
    let buckets: Vec<String> = Category::ALL
        .into_iter()
        .map(|category| format!("{} {}", category.label(), counts.get(category)))
        .collect();
    format!("{} (total {})", buckets.join(" | "), counts.total())
}

pub fn email_line(email: &EmailRecord) -> String {
    let unread = if email.read == Some(false) { "* " } else { "" };
    format!(
        "  {unread}[{}] {}: {} ({})",
        email.id, email.sender, email.subject, email.timestamp
    )
}

pub fn listing(category: Category, emails: &[EmailRecord]) -> String {
    let mut out = format!("{} ({})\n", category.label(), emails.len());
    if emails.is_empty() {
        out.push_str("  (empty)\n");
    }
    for email in emails {
        out.push_str(&email_line(email));
        out.push('\n');
    }
    out
}

pub fn dashboard(snapshot: &CategorizedSnapshot, only: Option<Category>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Last sync: {}", snapshot.last_sync);
    let _ = writeln!(out, "{}", counts_line(&snapshot.counts()));
    let categories = match only {
        Some(category) => vec![category],
        None => Category::ALL.to_vec(),
    };
    for category in categories {
        out.push('\n');
        out.push_str(&listing(category, snapshot.list(category)));
    }
    out
}

pub fn update_line(update: &ControllerUpdate) -> String {
    match update {
        ControllerUpdate::SnapshotReplaced { counts, last_sync } => {
            format!("[sync] {last_sync}: {}", counts_line(counts))
        }
        ControllerUpdate::ConnectivityChanged(Connectivity::Live) => "[status] live".to_string(),
        ControllerUpdate::ConnectivityChanged(Connectivity::Offline) => {
            "[status] offline".to_string()
        }
        ControllerUpdate::ListChanged {
            category,
            remaining,
        } => format!("[list] {} now has {remaining}", category.label()),
        ControllerUpdate::ToastShown(message) => format!("[toast] {message}"),
        ControllerUpdate::ToastCleared => "[toast] cleared".to_string(),
        ControllerUpdate::BusyChanged { kind, busy: true } => format!("[{kind}] running..."),
        ControllerUpdate::BusyChanged { kind, busy: false } => format!("[{kind}] idle"),
        ControllerUpdate::OperationSucceeded { summary, .. } => summary.clone(),
        ControllerUpdate::OperationFailed { alert, .. } => alert.clone(),
        ControllerUpdate::ActionRejected(reason) => format!("[action] {reason}"),
        ControllerUpdate::Listing { category, emails } => {
            listing(*category, emails).trim_end().to_string()
        }
    }
}

pub fn stats(stats: &StatsResponse) -> String {
    format!(
        "Total emails: {}\n{}",
        stats.total_emails,
        counts_line(&stats.by_category)
    )
}

pub fn action_queue(queue: &ActionQueueResponse) -> String {
    if queue.actions.is_empty() {
        return "No queued actions".to_string();
    }
    let mut out = String::new();
    for entry in &queue.actions {
        let target = entry
            .email_id
            .as_ref()
            .map(|id| id.as_str())
            .unwrap_or("-");
        let _ = writeln!(
            out,
            "{} {} {} [{}]",
            entry.timestamp, entry.action, target, entry.status
        );
    }
    out.trim_end().to_string()
}

pub fn scheduler_status(status: &SchedulerStatusResponse) -> String {
    if status.message.is_empty() {
        return format!("Scheduler: {}", status.status);
    }
    format!("Scheduler: {} ({})", status.status, status.message)
}

pub fn health(health: &HealthResponse) -> String {
    format!("{}: {}", health.service, health.status)
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
