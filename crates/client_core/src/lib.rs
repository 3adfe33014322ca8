//! Client-side sync and action controller for the InboxPilot dashboard.
//!
//! The backend does all classification; this crate keeps a categorized
//! snapshot of the inbox fresh, applies user actions optimistically and
//! forwards them, and drives the scan / recategorize / schedule operations.

pub mod api;
pub mod controller;
mod detached;
pub mod dispatcher;
pub mod error;
pub mod operations;
pub mod refresher;
pub mod runtime;
pub mod store;
pub mod toast;

pub use api::{HttpInboxApi, InboxApi};
pub use controller::{Controller, ControllerSettings, ControllerUpdate, Settled};
pub use error::ClientError;
pub use operations::{OperationKind, OperationOutcome, OperationParams};
pub use refresher::Connectivity;
pub use runtime::{drive, UserCommand};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
