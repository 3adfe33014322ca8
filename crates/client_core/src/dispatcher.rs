//! Optimistic action dispatch: mutate the local lists first, then describe
//! the single request that forwards the intent to the backend.

use shared::{
    domain::{Category, EmailId, PendingAction},
    protocol::QueuedAction,
};
use thiserror::Error;

use crate::{api::InboxApi, error::ClientError, store::SnapshotStore};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("email {0} is not in the displayed snapshot")]
    UnknownEmail(EmailId),
    #[error("email {0} is not in spam and cannot be restored")]
    NotInSpam(EmailId),
}

/// The one request an applied action owes the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardRequest {
    Queue {
        email_id: EmailId,
        action: QueuedAction,
    },
    Restore {
        email_id: EmailId,
    },
    PurgeSpam,
}

impl ForwardRequest {
    pub fn label(&self) -> &'static str {
        match self {
            ForwardRequest::Queue { .. } => "queue_action",
            ForwardRequest::Restore { .. } => "restore",
            ForwardRequest::PurgeSpam => "purge_spam",
        }
    }

    pub async fn send(self, api: &dyn InboxApi) -> Result<(), ClientError> {
        match self {
            ForwardRequest::Queue { email_id, action } => {
                api.queue_action(&email_id, action).await
            }
            ForwardRequest::Restore { email_id } => api.restore(&email_id).await,
            ForwardRequest::PurgeSpam => api.purge_spam().await,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedAction {
    /// Bucket that changed locally.
    pub category: Category,
    pub notice: String,
    pub forward: ForwardRequest,
}

/// Applies the local half of an action. The caller shows `notice` and
/// sends `forward`; nothing here is ever rolled back.
pub fn apply(
    store: &mut SnapshotStore,
    action: PendingAction,
) -> Result<AppliedAction, DispatchError> {
    let (email_id, queued) = match action {
        PendingAction::PurgeAll => {
            let purged = store.clear(Category::Spam);
            return Ok(AppliedAction {
                category: Category::Spam,
                notice: format!("Purged {purged} spam emails"),
                forward: ForwardRequest::PurgeSpam,
            });
        }
        PendingAction::Restore(email_id) => {
            match store.find(&email_id) {
                Some((Category::Spam, _)) => {}
                Some(_) => return Err(DispatchError::NotInSpam(email_id)),
                None => return Err(DispatchError::UnknownEmail(email_id)),
            }
            (email_id, None)
        }
        PendingAction::Archive(email_id) => (email_id, Some(QueuedAction::Archive)),
        PendingAction::Delete(email_id) => (email_id, Some(QueuedAction::Delete)),
        PendingAction::Reply(email_id) => (email_id, Some(QueuedAction::Reply)),
    };

    let (category, removed) = store
        .remove(&email_id)
        .ok_or_else(|| DispatchError::UnknownEmail(email_id.clone()))?;

    let applied = match queued {
        Some(action) => AppliedAction {
            category,
            notice: format!(
                "Action Queued: {} email from {}",
                action.kind(),
                removed.sender
            ),
            forward: ForwardRequest::Queue { email_id, action },
        },
        None => AppliedAction {
            category,
            notice: format!("Restored email from {}", removed.sender),
            forward: ForwardRequest::Restore { email_id },
        },
    };
    Ok(applied)
}

#[cfg(test)]
#[path = "tests/dispatcher_tests.rs"]
mod tests;
