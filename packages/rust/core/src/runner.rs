//! Preview/publish fan-out over a fixed page list.
//!
//! One admin request per page, at most `concurrency` in flight. A failing
//! page is marked `error` but never cancels its siblings; the fan-out
//! resolves only after every page settled.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use sitegen_remote::AdminClient;
use sitegen_shared::{Action, PageDescriptor, PageStatus, Result, SitegenError, StatusEvent};
use tracing::{info, instrument, warn};

use crate::board::PageBoard;
use crate::progress::ProgressReporter;

/// Branch segment inserted after the site root in admin paths.
const CONTENT_BRANCH: &str = "main";

/// Something that can apply a page action (the admin API, or a test double).
#[async_trait]
pub trait PageActionTarget: Send + Sync {
    async fn trigger(&self, action: Action, target: &str) -> Result<()>;
}

#[async_trait]
impl PageActionTarget for AdminClient {
    async fn trigger(&self, action: Action, target: &str) -> Result<()> {
        AdminClient::trigger(self, action, target).await
    }
}

/// Map a content path to its admin path: `/org/site/x.html` → `/org/site/main/x`.
pub fn admin_path(site_root: &str, content_path: &str) -> String {
    let branched = match content_path.strip_prefix(site_root) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => {
            format!("{site_root}/{CONTENT_BRANCH}{rest}")
        }
        _ => content_path.to_string(),
    };
    match branched.strip_suffix(".html") {
        Some(stripped) => stripped.to_string(),
        None => branched,
    }
}

/// Apply `action` to every page and return the settled page list.
///
/// Pages are reset to `pending` first, then announced with a
/// [`StatusEvent::fanout`]. Each transition is reported through
/// `progress.page_status`. If any page failed the result is
/// [`SitegenError::Action`] carrying the first failure in page order.
#[instrument(skip_all, fields(action = %action, pages = pages.len(), concurrency = concurrency))]
pub async fn run_action(
    target: &dyn PageActionTarget,
    site_root: &str,
    pages: &[PageDescriptor],
    action: Action,
    concurrency: usize,
    progress: &dyn ProgressReporter,
) -> Result<Vec<PageDescriptor>> {
    if pages.is_empty() {
        return Err(SitegenError::validation(format!("no pages to {action}")));
    }

    let board = PageBoard::new(pages.iter().map(PageDescriptor::reset).collect());
    let initial = board.snapshot();
    progress.status(&StatusEvent::fanout(action, initial.to_vec()));

    // Owned items keep the stream's future `Send` for any lifetime.
    let work: Vec<(usize, PageDescriptor)> = initial.iter().cloned().enumerate().collect();
    let board = &board;
    let mut outcomes: Vec<(usize, Result<()>)> = stream::iter(work)
        .map(move |(index, page)| async move {
            let outcome =
                process_page(target, board, progress, site_root, action, index, &page).await;
            (index, outcome)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    outcomes.sort_by_key(|(index, _)| *index);
    let total = outcomes.len();
    let mut failures = outcomes.into_iter().filter_map(|(_, r)| r.err());
    let first = failures.next();
    let failed = first.as_ref().map_or(0, |_| 1 + failures.count());

    info!(total, failed, "fan-out settled");

    match first {
        Some(source) => Err(SitegenError::Action {
            action,
            failed,
            total,
            source: Box::new(source),
        }),
        None => Ok(board.snapshot().to_vec()),
    }
}

async fn process_page(
    target: &dyn PageActionTarget,
    board: &PageBoard,
    progress: &dyn ProgressReporter,
    site_root: &str,
    action: Action,
    index: usize,
    page: &PageDescriptor,
) -> Result<()> {
    mark(board, progress, index, &page.name, PageStatus::Processing)?;

    let path = admin_path(site_root, &page.path);
    match target.trigger(action, &path).await {
        Ok(()) => mark(board, progress, index, &page.name, PageStatus::Completed),
        Err(e) => {
            warn!(page = %page.name, %path, error = %e, "page action failed");
            mark(board, progress, index, &page.name, PageStatus::Error)?;
            Err(e)
        }
    }
}

fn mark(
    board: &PageBoard,
    progress: &dyn ProgressReporter,
    index: usize,
    name: &str,
    status: PageStatus,
) -> Result<()> {
    board.transition(index, status)?;
    progress.page_status(name, status);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::progress::SilentProgress;

    /// Fails for the configured paths, records every call.
    #[derive(Default)]
    struct FakeAdmin {
        failing: HashSet<String>,
        calls: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeAdmin {
        fn failing(paths: &[&str]) -> Self {
            Self {
                failing: paths.iter().map(|p| p.to_string()).collect(),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl PageActionTarget for FakeAdmin {
        async fn trigger(&self, action: Action, target: &str) -> Result<()> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(15)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.calls.lock().unwrap().push(target.to_string());
            if self.failing.contains(target) {
                return Err(SitegenError::http(format!("{action} {target}"), 500, "Internal Server Error"));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<StatusEvent>>,
        transitions: Mutex<Vec<(String, PageStatus)>>,
    }

    impl ProgressReporter for Recorder {
        fn status(&self, event: &StatusEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
        fn page_status(&self, page: &str, status: PageStatus) {
            self.transitions.lock().unwrap().push((page.to_string(), status));
        }
    }

    fn pages(n: usize) -> Vec<PageDescriptor> {
        (0..n)
            .map(|i| PageDescriptor::pending(format!("/p{i}"), format!("/o/s/p{i}.html")))
            .collect()
    }

    #[test]
    fn admin_path_inserts_branch_and_drops_extension() {
        assert_eq!(admin_path("/o/s", "/o/s/index.html"), "/o/s/main/index");
        assert_eq!(admin_path("/o/s", "/o/s/docs/a.html"), "/o/s/main/docs/a");
        assert_eq!(admin_path("/o/s", "/o/s/data.json"), "/o/s/main/data.json");
        assert_eq!(admin_path("/o/s", "/elsewhere/x.html"), "/elsewhere/x");
    }

    #[test]
    fn admin_path_respects_segment_boundary() {
        assert_eq!(admin_path("/o/s", "/o/site2/index.html"), "/o/site2/index");
    }

    #[tokio::test]
    async fn all_succeed() {
        let admin = FakeAdmin::default();
        let recorder = Recorder::default();

        let settled = run_action(&admin, "/o/s", &pages(3), Action::Preview, 8, &recorder)
            .await
            .unwrap();

        assert!(settled.iter().all(|p| p.status == PageStatus::Completed));
        assert_eq!(admin.calls.lock().unwrap().len(), 3);

        let events = recorder.events.lock().unwrap();
        assert_eq!(events[0].message, "Previewing 3 pages...");
        assert_eq!(events[0].action, Some(Action::Preview));
        assert_eq!(recorder.transitions.lock().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn one_failure_settles_everything_and_fails() {
        let admin = FakeAdmin::failing(&["/o/s/main/p1"]);
        let recorder = Recorder::default();

        let err = run_action(&admin, "/o/s", &pages(4), Action::Publish, 2, &recorder)
            .await
            .unwrap_err();

        match &err {
            SitegenError::Action { failed, total, .. } => {
                assert_eq!(*failed, 1);
                assert_eq!(*total, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("publish /o/s/main/p1"));
        assert_eq!(admin.calls.lock().unwrap().len(), 4);

        // Every page reached exactly one terminal state.
        let transitions = recorder.transitions.lock().unwrap();
        for i in 0..4 {
            let name = format!("/p{i}");
            let terminal: Vec<_> = transitions
                .iter()
                .filter(|(n, s)| *n == name && s.is_terminal())
                .map(|(_, s)| *s)
                .collect();
            let expected = if i == 1 { PageStatus::Error } else { PageStatus::Completed };
            assert_eq!(terminal, vec![expected]);
        }
    }

    #[tokio::test]
    async fn first_failure_in_page_order_surfaces() {
        let admin = FakeAdmin::failing(&["/o/s/main/p2", "/o/s/main/p0"]);
        let err = run_action(&admin, "/o/s", &pages(3), Action::Preview, 3, &SilentProgress)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed for 2 of 3 pages"));
        assert!(err.to_string().contains("/o/s/main/p0"));
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let admin = FakeAdmin::default();
        run_action(&admin, "/o/s", &pages(10), Action::Preview, 3, &SilentProgress)
            .await
            .unwrap();

        let max = admin.max_in_flight.load(Ordering::SeqCst);
        assert!(max <= 3, "max in flight was {max}");
        assert!(max >= 2, "expected overlapping requests, got {max}");
    }

    #[tokio::test]
    async fn pages_are_reset_before_running() {
        let admin = FakeAdmin::default();
        let mut done = pages(2);
        for page in &mut done {
            page.status = PageStatus::Completed;
        }
        let settled = run_action(&admin, "/o/s", &done, Action::Publish, 1, &SilentProgress)
            .await
            .unwrap();
        assert!(settled.iter().all(|p| p.status == PageStatus::Completed));
        assert_eq!(admin.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn empty_page_list_is_rejected() {
        let admin = FakeAdmin::default();
        let err = run_action(&admin, "/o/s", &[], Action::Preview, 4, &SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, SitegenError::Validation { .. }));
    }
}
