use std::{collections::VecDeque, time::Duration};

use tokio::time::Instant;

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(3000);

/// Holds at most one notice. Every `show` arms its own clear deadline and
/// each deadline empties the slot when it passes, whichever notice is
/// visible at that moment.
#[derive(Debug)]
pub struct ToastSlot {
    duration: Duration,
    current: Option<String>,
    deadlines: VecDeque<Instant>,
}

impl ToastSlot {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            current: None,
            deadlines: VecDeque::new(),
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn show(&mut self, message: impl Into<String>, now: Instant) {
        self.current = Some(message.into());
        self.deadlines.push_back(now + self.duration);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.front().copied()
    }

    /// Fires every deadline at or before `now`. Returns true when a visible
    /// notice was cleared.
    pub fn expire(&mut self, now: Instant) -> bool {
        let mut fired = false;
        while self.deadlines.front().is_some_and(|deadline| *deadline <= now) {
            self.deadlines.pop_front();
            fired = true;
        }
        fired && self.current.take().is_some()
    }
}

impl Default for ToastSlot {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_DURATION)
    }
}
