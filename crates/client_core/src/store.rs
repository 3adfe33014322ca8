//! The single in-memory snapshot shared by the refresher and the dispatcher.
//!
//! Only two kinds of writes exist: a wholesale replace from a completed fetch,
//! and removal of individual records (or a whole bucket) by optimistic
//! actions. Both are crate-private so the write roles cannot leak to callers.

use shared::domain::{CategorizedSnapshot, Category, CategoryCounts, EmailId, EmailRecord};

#[derive(Debug, Default)]
pub struct SnapshotStore {
    fetched: Option<CategorizedSnapshot>,
    displayed: Option<CategorizedSnapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` until the first fetch succeeds.
    pub fn displayed(&self) -> Option<&CategorizedSnapshot> {
        self.displayed.as_ref()
    }

    pub fn list(&self, category: Category) -> &[EmailRecord] {
        self.displayed
            .as_ref()
            .map(|snapshot| snapshot.list(category))
            .unwrap_or(&[])
    }

    pub fn find(&self, id: &EmailId) -> Option<(Category, &EmailRecord)> {
        self.displayed.as_ref()?.find(id)
    }

    pub fn counts(&self) -> CategoryCounts {
        self.displayed
            .as_ref()
            .map(CategorizedSnapshot::counts)
            .unwrap_or_default()
    }

    pub fn last_sync(&self) -> Option<&str> {
        self.displayed
            .as_ref()
            .map(|snapshot| snapshot.last_sync.as_str())
    }

    /// Every displayed list is an ordered subset of the last fetched list.
    pub fn is_subset_of_fetched(&self) -> bool {
        match (&self.fetched, &self.displayed) {
            (None, None) => true,
            (Some(fetched), Some(displayed)) => Category::ALL.into_iter().all(|category| {
                let mut source = fetched.list(category).iter();
                displayed
                    .list(category)
                    .iter()
                    .all(|email| source.any(|candidate| candidate == email))
            }),
            _ => false,
        }
    }

    pub(crate) fn replace(&mut self, snapshot: CategorizedSnapshot) {
        self.displayed = Some(snapshot.clone());
        self.fetched = Some(snapshot);
    }

    pub(crate) fn remove(&mut self, id: &EmailId) -> Option<(Category, EmailRecord)> {
        let displayed = self.displayed.as_mut()?;
        let category = displayed.find(id)?.0;
        let list = displayed.list_mut(category);
        let index = list.iter().position(|email| &email.id == id)?;
        Some((category, list.remove(index)))
    }

    /// Empties one bucket and returns how many records it held.
    pub(crate) fn clear(&mut self, category: Category) -> usize {
        match self.displayed.as_mut() {
            Some(displayed) => {
                let list = displayed.list_mut(category);
                let count = list.len();
                list.clear();
                count
            }
            None => 0,
        }
    }
}
