//! Background provisioning run and the UI-side view of its progress.

use std::time::{Duration, Instant};

use sitegen_core::{PageBoard, ProgressReporter, ProvisionOutcome};
use sitegen_shared::{Action, PageDescriptor, PageStatus, StatusEvent};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Messages from the provisioning task to the UI thread.
#[derive(Debug)]
pub(crate) enum RunEvent {
    Status(StatusEvent),
    Page { name: String, status: PageStatus },
    Finished(Result<Box<ProvisionOutcome>, String>),
}

/// Forwards progress callbacks over a channel. Send failures mean the UI
/// has gone away and are ignored.
pub(crate) struct ChannelProgress {
    tx: UnboundedSender<RunEvent>,
}

impl ChannelProgress {
    pub(crate) fn new(tx: UnboundedSender<RunEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressReporter for ChannelProgress {
    fn status(&self, event: &StatusEvent) {
        let _ = self.tx.send(RunEvent::Status(event.clone()));
    }

    fn page_status(&self, page: &str, status: PageStatus) {
        let _ = self.tx.send(RunEvent::Page {
            name: page.to_string(),
            status,
        });
    }
}

/// Everything the screens render about the current (or last) run.
#[derive(Default)]
pub(crate) struct RunState {
    pub message: String,
    pub started: Option<Instant>,
    pub finished: Option<Duration>,
    pub action: Option<Action>,
    pub board: Option<PageBoard>,
    pub outcome: Option<Box<ProvisionOutcome>>,
    pub error: Option<String>,
}

impl RunState {
    pub(crate) fn start() -> Self {
        Self {
            started: Some(Instant::now()),
            ..Self::default()
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.started.is_some() && self.finished.is_none()
    }

    /// Time since start, frozen once the run finished.
    pub(crate) fn elapsed(&self) -> Option<Duration> {
        self.finished
            .or_else(|| self.started.map(|start| start.elapsed()))
    }

    /// Current page snapshot, empty before the first fan-out.
    pub(crate) fn pages(&self) -> Vec<PageDescriptor> {
        self.board
            .as_ref()
            .map(|board| board.snapshot().to_vec())
            .unwrap_or_default()
    }

    pub(crate) fn apply(&mut self, event: RunEvent) {
        match event {
            RunEvent::Status(event) => {
                if let Some(pages) = event.pages {
                    self.board = Some(PageBoard::new(pages));
                    self.action = event.action;
                }
                self.message = event.message;
            }
            RunEvent::Page { name, status } => {
                if let Some(board) = &self.board {
                    if let Err(e) = board.transition_named(&name, status) {
                        debug!(page = %name, error = %e, "ignoring page update");
                    }
                }
            }
            RunEvent::Finished(result) => {
                self.finished = self.started.map(|start| start.elapsed());
                match result {
                    Ok(outcome) => {
                        self.message = format!(
                            "Site created in {:.1}s.",
                            outcome.elapsed.as_secs_f64()
                        );
                        self.outcome = Some(outcome);
                    }
                    Err(e) => {
                        self.message = "Provisioning failed.".to_string();
                        self.error = Some(e);
                    }
                }
            }
        }
    }

    /// One-line summary for the status bar.
    pub(crate) fn status_line(&self) -> Option<String> {
        let elapsed = self.elapsed()?;
        Some(format!("{} ({:.1}s)", self.message, elapsed.as_secs_f64()))
    }
}
