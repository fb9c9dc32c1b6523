//! Page status board: the live view of a fan-out.
//!
//! Every transition produces a new immutable snapshot that replaces the
//! previous one; readers holding an older snapshot never see it change.

use std::sync::{Arc, Mutex, PoisonError};

use sitegen_shared::{PageDescriptor, PageStatus, Result, SitegenError};

/// Snapshot-and-replace store for a fixed set of page descriptors.
#[derive(Debug)]
pub struct PageBoard {
    current: Mutex<Arc<[PageDescriptor]>>,
}

impl PageBoard {
    pub fn new(pages: Vec<PageDescriptor>) -> Self {
        Self {
            current: Mutex::new(pages.into()),
        }
    }

    /// The latest snapshot.
    pub fn snapshot(&self) -> Arc<[PageDescriptor]> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Advance the page at `index`, returning the new snapshot.
    pub fn transition(&self, index: usize, next: PageStatus) -> Result<Arc<[PageDescriptor]>> {
        let mut guard = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let page = guard.get(index).ok_or_else(|| {
            SitegenError::validation(format!("no page at index {index}"))
        })?;
        let updated = page.with_status(next)?;

        let mut pages = guard.to_vec();
        pages[index] = updated;
        let snapshot: Arc<[PageDescriptor]> = pages.into();
        *guard = snapshot.clone();
        Ok(snapshot)
    }

    /// Advance the page named `name`, returning the new snapshot.
    pub fn transition_named(&self, name: &str, next: PageStatus) -> Result<Arc<[PageDescriptor]>> {
        let index = self
            .snapshot()
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| SitegenError::validation(format!("unknown page {name}")))?;
        self.transition(index, next)
    }

    /// Count of pages in `status`.
    pub fn count(&self, status: PageStatus) -> usize {
        self.snapshot().iter().filter(|p| p.status == status).count()
    }
}
