//! "Pages" screen: live per-page status of the current fan-out.

use crossterm::event::KeyCode;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use sitegen_shared::PageStatus;

use crate::run::RunState;
use crate::widgets::status_badge;

pub(crate) struct PagesScreen {
    selected: usize,
}

impl PagesScreen {
    pub(crate) fn new() -> Self {
        Self { selected: 0 }
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, run: &RunState) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([Constraint::Length(1), Constraint::Min(1)])
            .split(area);

        let pages = run.pages();
        let count = |status| pages.iter().filter(|p| p.status == status).count();
        let action = run
            .action
            .map(|a| a.label().to_string())
            .unwrap_or_else(|| "No run yet".to_string());
        let summary = format!(
            "{action} · {} pending · {} processing · {} completed · {} error",
            count(PageStatus::Pending),
            count(PageStatus::Processing),
            count(PageStatus::Completed),
            count(PageStatus::Error),
        );
        f.render_widget(
            Paragraph::new(summary).style(Style::default().add_modifier(Modifier::BOLD)),
            chunks[0],
        );

        let items: Vec<ListItem> = pages
            .iter()
            .map(|page| {
                ListItem::new(Line::from(vec![
                    status_badge(page.status),
                    Span::raw(page.name.clone()),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(" Pages "))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        let mut state = ListState::default();
        if !pages.is_empty() {
            state.select(Some(self.selected.min(pages.len() - 1)));
        }
        f.render_stateful_widget(list, chunks[1], &mut state);
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode, len: usize) {
        match code {
            KeyCode::Down if len > 0 => self.selected = (self.selected + 1).min(len - 1),
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = len.saturating_sub(1),
            _ => {}
        }
    }
}
