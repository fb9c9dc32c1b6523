//! Progress callbacks for provisioning.

use sitegen_shared::{PageStatus, StatusEvent};

/// Receives status updates while a site is provisioned.
///
/// Both methods are called synchronously from the worker that produced the
/// update, so implementations should return quickly.
pub trait ProgressReporter: Send + Sync {
    /// Phase messages and fan-out start notifications.
    fn status(&self, event: &StatusEvent);
    /// One page changed status.
    fn page_status(&self, page: &str, status: PageStatus);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn status(&self, _event: &StatusEvent) {}
    fn page_status(&self, _page: &str, _status: PageStatus) {}
}
