use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailId(pub String);

impl EmailId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EmailId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The five fixed triage buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Urgent,
    Decisions,
    Calendar,
    Info,
    Spam,
}

impl Category {
    /// Dashboard order.
    pub const ALL: [Category; 5] = [
        Category::Urgent,
        Category::Decisions,
        Category::Calendar,
        Category::Info,
        Category::Spam,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Urgent => "urgent",
            Category::Decisions => "decisions",
            Category::Calendar => "calendar",
            Category::Info => "info",
            Category::Spam => "spam",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Urgent => "Urgent",
            Category::Decisions => "Decisions",
            Category::Calendar => "Calendar",
            Category::Info => "Info",
            Category::Spam => "Spam",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category '{0}' (expected urgent, decisions, calendar, info or spam)")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecord {
    pub id: EmailId,
    pub sender: String,
    pub subject: String,
    pub preview: String,
    pub timestamp: String,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
}

/// One full categorized listing, as returned by a single fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizedSnapshot {
    #[serde(default)]
    pub urgent: Vec<EmailRecord>,
    #[serde(default)]
    pub decisions: Vec<EmailRecord>,
    #[serde(default)]
    pub calendar: Vec<EmailRecord>,
    #[serde(default)]
    pub info: Vec<EmailRecord>,
    #[serde(default)]
    pub spam: Vec<EmailRecord>,
    #[serde(default)]
    pub last_sync: String,
}

impl CategorizedSnapshot {
    pub fn list(&self, category: Category) -> &[EmailRecord] {
        match category {
            Category::Urgent => &self.urgent,
            Category::Decisions => &self.decisions,
            Category::Calendar => &self.calendar,
            Category::Info => &self.info,
            Category::Spam => &self.spam,
        }
    }

    pub fn list_mut(&mut self, category: Category) -> &mut Vec<EmailRecord> {
        match category {
            Category::Urgent => &mut self.urgent,
            Category::Decisions => &mut self.decisions,
            Category::Calendar => &mut self.calendar,
            Category::Info => &mut self.info,
            Category::Spam => &mut self.spam,
        }
    }

    /// Locates an email by id. Lists are searched in dashboard order.
    pub fn find(&self, id: &EmailId) -> Option<(Category, &EmailRecord)> {
        Category::ALL.into_iter().find_map(|category| {
            self.list(category)
                .iter()
                .find(|email| &email.id == id)
                .map(|email| (category, email))
        })
    }

    pub fn counts(&self) -> CategoryCounts {
        CategoryCounts {
            urgent: self.urgent.len(),
            decisions: self.decisions.len(),
            calendar: self.calendar.len(),
            info: self.info.len(),
            spam: self.spam.len(),
        }
    }
}

/// Per-bucket totals shown on the dashboard metric cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    #[serde(default)]
    pub urgent: usize,
    #[serde(default)]
    pub decisions: usize,
    #[serde(default)]
    pub calendar: usize,
    #[serde(default)]
    pub info: usize,
    #[serde(default)]
    pub spam: usize,
}

impl CategoryCounts {
    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::Urgent => self.urgent,
            Category::Decisions => self.decisions,
            Category::Calendar => self.calendar,
            Category::Info => self.info,
            Category::Spam => self.spam,
        }
    }

    pub fn total(&self) -> usize {
        self.urgent + self.decisions + self.calendar + self.info + self.spam
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Archive,
    Delete,
    Reply,
    Restore,
    PurgeAll,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Archive => "archive",
            ActionKind::Delete => "delete",
            ActionKind::Reply => "reply",
            ActionKind::Restore => "restore",
            ActionKind::PurgeAll => "purge-all",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user intent, applied locally first and forwarded exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    Archive(EmailId),
    Delete(EmailId),
    Reply(EmailId),
    Restore(EmailId),
    PurgeAll,
}

impl PendingAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            PendingAction::Archive(_) => ActionKind::Archive,
            PendingAction::Delete(_) => ActionKind::Delete,
            PendingAction::Reply(_) => ActionKind::Reply,
            PendingAction::Restore(_) => ActionKind::Restore,
            PendingAction::PurgeAll => ActionKind::PurgeAll,
        }
    }

    pub fn target(&self) -> Option<&EmailId> {
        match self {
            PendingAction::Archive(id)
            | PendingAction::Delete(id)
            | PendingAction::Reply(id)
            | PendingAction::Restore(id) => Some(id),
            PendingAction::PurgeAll => None,
        }
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
