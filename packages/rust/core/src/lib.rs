//! Provisioning orchestration for sitegen.
//!
//! This crate ties together the remote clients, the page lister, and the
//! preview/publish fan-out into the end-to-end `provision` workflow.

pub mod board;
pub mod progress;
pub mod provisioner;
pub mod runner;
pub mod template;

pub use board::PageBoard;
pub use progress::{ProgressReporter, SilentProgress};
pub use provisioner::{ProvisionOptions, ProvisionOutcome, Provisioner};
pub use runner::{PageActionTarget, admin_path, run_action};
