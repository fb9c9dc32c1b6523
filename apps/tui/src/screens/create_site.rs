//! "Create Site" screen: the new-site form and the run summary.

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use sitegen_shared::{AppConfig, Result, SiteRequest};

use crate::run::RunState;

/// Which input field is focused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Description,
    GithubOwner,
    GithubRepo,
    GithubUrl,
}

impl Field {
    const ORDER: [Self; 5] = [
        Self::Name,
        Self::Description,
        Self::GithubOwner,
        Self::GithubRepo,
        Self::GithubUrl,
    ];

    fn title(self) -> &'static str {
        match self {
            Self::Name => " Site name ",
            Self::Description => " Description ",
            Self::GithubOwner => " GitHub owner ",
            Self::GithubRepo => " GitHub repo ",
            Self::GithubUrl => " GitHub URL ",
        }
    }

    fn position(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }
}

/// Raw form values as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SiteForm {
    pub name: String,
    pub description: String,
    pub github_owner: String,
    pub github_repo: String,
    pub github_url: String,
}

impl SiteForm {
    /// Empty name and description, code binding prefilled from config.
    pub(crate) fn from_config(config: &AppConfig) -> Self {
        Self {
            github_owner: config.github.owner.clone(),
            github_repo: config.github.repo.clone(),
            github_url: config.github.url.clone(),
            ..Self::default()
        }
    }

    pub(crate) fn to_request(&self, config: &AppConfig) -> Result<SiteRequest> {
        SiteRequest::new(
            &self.name,
            &self.description,
            Some(&self.github_owner),
            Some(&self.github_repo),
            Some(&self.github_url),
            config,
        )
    }

    fn field(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Description => &self.description,
            Field::GithubOwner => &self.github_owner,
            Field::GithubRepo => &self.github_repo,
            Field::GithubUrl => &self.github_url,
        }
    }

    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Name => &mut self.name,
            Field::Description => &mut self.description,
            Field::GithubOwner => &mut self.github_owner,
            Field::GithubRepo => &mut self.github_repo,
            Field::GithubUrl => &mut self.github_url,
        }
    }
}

pub(crate) struct CreateSiteScreen {
    pub form: SiteForm,
    focused: Field,
    editing: bool,
}

impl CreateSiteScreen {
    pub(crate) fn new(form: SiteForm) -> Self {
        Self {
            form,
            focused: Field::Name,
            editing: false,
        }
    }

    pub(crate) fn is_editing(&self) -> bool {
        self.editing
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, run: &RunState) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .margin(1)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let mut rows: Vec<Constraint> = Field::ORDER.iter().map(|_| Constraint::Length(3)).collect();
        rows.push(Constraint::Length(2)); // Action hint
        rows.push(Constraint::Min(0));
        let form_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(rows)
            .split(columns[0]);

        for (i, field) in Field::ORDER.into_iter().enumerate() {
            let style = if self.focused == field && self.editing {
                Style::default().fg(Color::Yellow)
            } else if self.focused == field {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            };
            let block = Block::default()
                .borders(Borders::ALL)
                .title(field.title())
                .border_style(style);
            f.render_widget(Paragraph::new(self.form.field(field)).block(block), form_chunks[i]);
        }

        let hint = if self.editing {
            "Type to edit · Esc to stop editing · Tab to next field"
        } else {
            "Enter to edit · Tab to next field · Ctrl-S / F5 to create"
        };
        let hint_p = Paragraph::new(hint)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(hint_p, form_chunks[Field::ORDER.len()]);

        f.render_widget(result_panel(run), columns[1]);
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode, _modifiers: KeyModifiers) {
        if self.editing {
            match code {
                KeyCode::Esc | KeyCode::Enter => {
                    self.editing = false;
                }
                KeyCode::Tab => {
                    self.editing = false;
                    self.next_field();
                }
                KeyCode::Backspace => {
                    self.form.field_mut(self.focused).pop();
                }
                KeyCode::Char(c) => {
                    self.form.field_mut(self.focused).push(c);
                }
                _ => {}
            }
        } else {
            match code {
                KeyCode::Enter => self.editing = true,
                KeyCode::Tab | KeyCode::Down => self.next_field(),
                KeyCode::BackTab | KeyCode::Up => self.prev_field(),
                _ => {}
            }
        }
    }

    fn next_field(&mut self) {
        let next = (self.focused.position() + 1) % Field::ORDER.len();
        self.focused = Field::ORDER[next];
    }

    fn prev_field(&mut self) {
        let len = Field::ORDER.len();
        let prev = (self.focused.position() + len - 1) % len;
        self.focused = Field::ORDER[prev];
    }
}

/// Right-hand panel: prompt, live status, links on success or the error.
fn result_panel(run: &RunState) -> Paragraph<'static> {
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let (title, lines, border) = if let Some(outcome) = &run.outcome {
        let links = &outcome.links;
        let lines = vec![
            Line::from(run.message.clone()).style(bold.fg(Color::Green)),
            Line::from(""),
            Line::from("Next steps:").style(bold),
            Line::from(format!("  Edit nav:    {}", links.edit_nav)),
            Line::from(format!("  Edit footer: {}", links.edit_footer)),
            Line::from(format!("  Content:     {}", links.view_content)),
            Line::from(format!("  Visit site:  {}", links.visit_site)),
        ];
        (" Site created ", lines, Color::Green)
    } else if let Some(error) = &run.error {
        let lines = vec![
            Line::from(run.message.clone()).style(bold.fg(Color::Red)),
            Line::from(""),
            Line::from(error.clone()),
        ];
        (" Error ", lines, Color::Red)
    } else if run.is_running() {
        let pages = run.pages();
        let mut lines = vec![Line::from(run.message.clone())];
        if !pages.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from("See the Pages tab for per-page status."));
        }
        (" Status ", lines, Color::Cyan)
    } else {
        let lines = vec![Line::from(
            "Fill in the site name and description, then press Ctrl-S or F5.",
        )];
        (" Status ", lines, Color::Reset)
    };

    Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(border)),
        )
}
