//! Reusable TUI widgets.

use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use sitegen_shared::PageStatus;

/// Bottom status bar.
pub(crate) fn status_bar(msg: &str) -> Paragraph<'_> {
    Paragraph::new(format!(" {msg}")).style(Style::default().bg(Color::DarkGray).fg(Color::White))
}

/// Fixed-width, colored page status label.
pub(crate) fn status_badge(status: PageStatus) -> Span<'static> {
    let color = match status {
        PageStatus::Pending => Color::DarkGray,
        PageStatus::Processing => Color::Yellow,
        PageStatus::Completed => Color::Green,
        PageStatus::Error => Color::Red,
    };
    Span::styled(format!("{:<11}", status.to_string()), Style::default().fg(color))
}
