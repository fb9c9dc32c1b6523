//! TUI screen definitions.
//!
//! Each screen corresponds to a tab in the TUI and encapsulates its
//! own state and rendering logic. Both render the shared [`RunState`].

mod create_site;
mod pages;

use std::fmt;

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;

use crate::run::RunState;

pub(crate) use create_site::{CreateSiteScreen, SiteForm};

/// Screen identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScreenId {
    CreateSite,
    Pages,
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateSite => write!(f, "Create Site"),
            Self::Pages => write!(f, "Pages"),
        }
    }
}

/// Per-screen state, dispatched by [`ScreenId`].
pub(crate) struct Screens {
    pub create: CreateSiteScreen,
    pub pages: pages::PagesScreen,
}

impl Screens {
    pub(crate) fn new(form: SiteForm) -> Self {
        Self {
            create: CreateSiteScreen::new(form),
            pages: pages::PagesScreen::new(),
        }
    }

    /// Whether the given screen has an active text input field.
    pub(crate) fn is_editing(&self, id: ScreenId) -> bool {
        match id {
            ScreenId::CreateSite => self.create.is_editing(),
            ScreenId::Pages => false,
        }
    }

    pub(crate) fn draw(&self, id: ScreenId, f: &mut Frame, area: Rect, run: &RunState) {
        match id {
            ScreenId::CreateSite => self.create.draw(f, area, run),
            ScreenId::Pages => self.pages.draw(f, area, run),
        }
    }

    pub(crate) fn handle_key(
        &mut self,
        id: ScreenId,
        code: KeyCode,
        modifiers: KeyModifiers,
        run: &RunState,
    ) {
        match id {
            ScreenId::CreateSite => self.create.handle_key(code, modifiers),
            ScreenId::Pages => self.pages.handle_key(code, run.pages().len()),
        }
    }
}
