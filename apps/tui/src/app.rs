//! Core TUI application state and event loop.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Tabs};
use sitegen_core::{ProvisionOptions, Provisioner};
use sitegen_remote::CachedToken;
use sitegen_shared::{AppConfig, SitegenError, load_config};
use tokio::runtime::{Handle, Runtime};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{error, info};

use crate::run::{ChannelProgress, RunEvent, RunState};
use crate::screens::{ScreenId, Screens, SiteForm};
use crate::widgets::status_bar;

/// Application state.
pub(crate) struct App {
    /// Currently active screen tab.
    pub active_tab: usize,
    /// Available screens.
    pub screens: Vec<ScreenId>,
    /// Whether the app should quit.
    pub should_quit: bool,
    /// Status message shown in bottom bar when no run is active.
    pub status: String,
    /// Whether help overlay is visible.
    pub show_help: bool,
    /// Per-screen state.
    pub screen_states: Screens,
    /// Loaded config, or the reason it could not be loaded.
    config: std::result::Result<AppConfig, String>,
    /// Current or last provisioning run.
    run: RunState,
    tx: UnboundedSender<RunEvent>,
    rx: UnboundedReceiver<RunEvent>,
}

impl App {
    pub(crate) fn new(config: std::result::Result<AppConfig, String>) -> Self {
        let screens = vec![ScreenId::CreateSite, ScreenId::Pages];
        let form = config
            .as_ref()
            .map(SiteForm::from_config)
            .unwrap_or_default();
        let status = match &config {
            Ok(_) => "Ready · press ? for help".to_string(),
            Err(e) => format!("Config error: {e}"),
        };
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            active_tab: 0,
            screens,
            should_quit: false,
            status,
            show_help: false,
            screen_states: Screens::new(form),
            config,
            run: RunState::default(),
            tx,
            rx,
        }
    }

    fn current_screen(&self) -> ScreenId {
        self.screens[self.active_tab]
    }

    fn is_editing(&self) -> bool {
        self.screen_states.is_editing(self.current_screen())
    }

    /// Apply every event the provisioning task has sent since the last frame.
    fn drain_events(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            self.run.apply(event);
        }
    }

    /// Validate the form and start provisioning in the background.
    fn submit(&mut self, runtime: &Handle) {
        if self.run.is_running() {
            self.status = "Provisioning already in progress.".to_string();
            return;
        }
        let config = match &self.config {
            Ok(config) => config,
            Err(e) => {
                self.status = format!("Config error: {e}");
                return;
            }
        };

        let request = match self.screen_states.create.form.to_request(config) {
            Ok(request) => request,
            Err(e) => {
                self.status = user_message(&e);
                return;
            }
        };
        let tokens = Arc::new(CachedToken::from_config(&config.auth));
        let provisioner = match Provisioner::from_config(config, tokens) {
            Ok(provisioner) => provisioner,
            Err(e) => {
                self.status = user_message(&e);
                return;
            }
        };

        info!(site = %request.site_name, "submitting site");
        self.run = RunState::start();
        self.status = format!("Creating {}", request.site_name);

        let tx = self.tx.clone();
        runtime.spawn(async move {
            let progress = ChannelProgress::new(tx.clone());
            let result = provisioner
                .provision(&request, ProvisionOptions::default(), &progress)
                .await
                .map(Box::new)
                .map_err(|e| {
                    error!(error = %e, "provisioning failed");
                    user_message(&e)
                });
            let _ = tx.send(RunEvent::Finished(result));
        });
    }

    fn status_line(&self) -> String {
        self.run
            .status_line()
            .unwrap_or_else(|| self.status.clone())
    }
}

/// Text shown to the user for a failure. Form validation shows its message
/// as-is, like the web form did.
fn user_message(e: &SitegenError) -> String {
    match e {
        SitegenError::Validation { message } => message.clone(),
        other => other.to_string(),
    }
}

/// Entry point: sets up terminal, runs event loop, restores terminal.
pub(crate) fn run() -> Result<()> {
    let runtime = Runtime::new()?;
    let config = load_config().map_err(|e| e.to_string());

    // Setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, runtime.handle(), config);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    runtime: &Handle,
    config: std::result::Result<AppConfig, String>,
) -> Result<()> {
    let mut app = App::new(config);

    loop {
        app.drain_events();
        terminal.draw(|f| draw(f, &app))?;

        // Poll with a short timeout so the elapsed timer keeps ticking
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                handle_key(&mut app, runtime, key.code, key.modifiers);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_key(app: &mut App, runtime: &Handle, code: KeyCode, modifiers: KeyModifiers) {
    // Global keybindings (always active)
    match code {
        KeyCode::Char('q') | KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('s') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.submit(runtime);
            return;
        }
        KeyCode::F(5) => {
            app.submit(runtime);
            return;
        }
        KeyCode::Char('q') if !app.is_editing() => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('?') if !app.is_editing() => {
            app.show_help = !app.show_help;
            return;
        }
        KeyCode::Esc if app.show_help => {
            app.show_help = false;
            return;
        }
        // Tab navigation with number keys
        KeyCode::Char(c @ '1'..='2') if !app.is_editing() => {
            let idx = (c as usize) - ('1' as usize);
            if idx < app.screens.len() {
                app.active_tab = idx;
                app.status = format!("{}", app.screens[idx]);
            }
            return;
        }
        KeyCode::Right if !app.is_editing() => {
            app.active_tab = (app.active_tab + 1) % app.screens.len();
            app.status = format!("{}", app.screens[app.active_tab]);
            return;
        }
        KeyCode::Left if !app.is_editing() => {
            app.active_tab = if app.active_tab == 0 {
                app.screens.len() - 1
            } else {
                app.active_tab - 1
            };
            app.status = format!("{}", app.screens[app.active_tab]);
            return;
        }
        _ => {}
    }

    // If help is showing, consume any key to dismiss
    if app.show_help {
        app.show_help = false;
        return;
    }

    // Delegate to current screen
    let id = app.current_screen();
    app.screen_states.handle_key(id, code, modifiers, &app.run);
}

fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(1),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    // Tab bar
    let tab_titles: Vec<Line> = app
        .screens
        .iter()
        .map(|s| Line::from(format!("{s}")))
        .collect();

    let tabs = Tabs::new(tab_titles)
        .block(Block::default().borders(Borders::ALL).title(" sitegen "))
        .select(app.active_tab)
        .style(Style::default().fg(Color::White))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .divider(" │ ");

    f.render_widget(tabs, chunks[0]);

    // Content area, delegated to the screen
    app.screen_states
        .draw(app.current_screen(), f, chunks[1], &app.run);

    // Status bar
    let line = app.status_line();
    f.render_widget(status_bar(&line), chunks[2]);

    // Help overlay
    if app.show_help {
        draw_help_overlay(f);
    }
}

fn draw_help_overlay(f: &mut Frame) {
    let area = centered_rect(60, 60, f.area());

    let help_text = vec![
        Line::from("Keybindings").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from(""),
        Line::from("  1-2 / ←→     Switch screen"),
        Line::from("  Ctrl-S / F5  Create the site"),
        Line::from("  ?            Toggle this help"),
        Line::from("  q / Ctrl-C   Quit"),
        Line::from(""),
        Line::from("Create Site:").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from("  Enter        Edit field / stop editing"),
        Line::from("  Tab / ↑↓     Next / previous field"),
        Line::from(""),
        Line::from("Pages:").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from("  ↑/↓          Navigate list"),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help · press any key to close ")
                .style(Style::default().bg(Color::DarkGray)),
        )
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));

    // Clear background
    f.render_widget(ratatui::widgets::Clear, area);
    f.render_widget(help, area);
}

/// Create a centered rectangle with percentage width and height.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
