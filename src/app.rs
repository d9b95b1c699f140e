use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use tokio::runtime::Handle;

use crate::model::config::AppConfig;
use crate::model::mode::Mode;
use crate::model::settings::SettingsContext;
use crate::model::theme::{ThemeCatalog, ThemeId};
use crate::msg::{Msg, SettingsCommand};
use crate::sync::apply::{commit_theme, prepare_apply};
use crate::sync::catalog::fetch_catalog;
use crate::sync::contents::ContentStore;
use crate::workflow::creator::PullRequestCreator;
use crate::workflow::indicator::LoadingIndicator;
use crate::workflow::pull_request::{FAILURE_NOTICE, PullRequestWorkflow, WorkflowState};

const MAX_NOTIFICATIONS: usize = 8;

/// Token as shown on screen: one bullet per character, capped.
fn mask(secret: &str) -> String {
    "•".repeat(secret.chars().count().min(24))
}

/// Rows of the panel, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    Repository,
    Username,
    Token,
    BaseUrl,
    BaseTheme,
    Theme,
    Apply,
    CreatePullRequest,
}

impl Row {
    pub const ALL: [Row; 8] = [
        Row::Repository,
        Row::Username,
        Row::Token,
        Row::BaseUrl,
        Row::BaseTheme,
        Row::Theme,
        Row::Apply,
        Row::CreatePullRequest,
    ];

    fn label(&self) -> &'static str {
        match self {
            Row::Repository => "GitHub repo name",
            Row::Username => "GitHub username",
            Row::Token => "GitHub token",
            Row::BaseUrl => "Base URL",
            Row::BaseTheme => "Base theme",
            Row::Theme => "Theme",
            Row::Apply => "Apply theme",
            Row::CreatePullRequest => "Update template",
        }
    }

    fn is_text(&self) -> bool {
        matches!(
            self,
            Row::Repository | Row::Username | Row::Token | Row::BaseUrl
        )
    }
}

/// Collaborators the panel talks to over the network.
pub struct Services {
    pub store: Arc<dyn ContentStore>,
    pub creator: Arc<dyn PullRequestCreator>,
    pub http: reqwest::Client,
}

pub struct App {
    pub mode: Mode,
    pub config: AppConfig,
    settings: SettingsContext,
    catalog: ThemeCatalog,
    workflow: PullRequestWorkflow,
    services: Services,
    runtime: Handle,
    selected: usize,
    edit_input: String,
    pub should_quit: bool,
    pub event_tx: mpsc::Sender<Msg>,
    pub notifications: VecDeque<String>,
}

impl App {
    pub fn new(
        config: AppConfig,
        settings: SettingsContext,
        services: Services,
        runtime: Handle,
        event_tx: mpsc::Sender<Msg>,
    ) -> Self {
        let indicator = LoadingIndicator::new(
            runtime.clone(),
            config.indicator_interval(),
            config.indicator.frames.clone(),
        );
        let workflow = PullRequestWorkflow::new(runtime.clone(), indicator);

        Self {
            mode: Mode::Normal,
            config,
            settings,
            catalog: ThemeCatalog::default(),
            workflow,
            services,
            runtime,
            selected: 0,
            edit_input: String::new(),
            should_quit: false,
            event_tx,
            notifications: VecDeque::new(),
        }
    }

    pub fn settings(&self) -> &SettingsContext {
        &self.settings
    }

    pub fn workflow(&self) -> &PullRequestWorkflow {
        &self.workflow
    }

    pub fn catalog(&self) -> &ThemeCatalog {
        &self.catalog
    }

    /// Fetch the theme list in the background; arrives as `Msg::CatalogLoaded`.
    pub fn request_catalog(&self) {
        let client = self.services.http.clone();
        let themes = self.config.themes.clone();
        let tx = self.event_tx.clone();
        self.runtime.spawn(async move {
            let result = fetch_catalog(&client, &themes).await;
            let _ = tx.send(Msg::CatalogLoaded(result));
        });
    }

    /// Stop everything this panel scheduled.
    pub fn shutdown(&mut self) {
        if self.workflow.is_loading() {
            tracing::info!("shutting down with a pull request in flight");
        }
        self.workflow.reset();
    }

    // ── MVU: Update ──────────────────────────────────────────────

    pub fn update(&mut self, msg: Msg) -> Result<()> {
        match msg {
            Msg::Key(key) => self.handle_key(key)?,
            Msg::Resize(_, _) | Msg::Tick => {}
            Msg::Settings(command) => self.handle_settings(command),
            Msg::CatalogLoaded(result) => match result {
                Ok(catalog) => self.catalog = catalog,
                Err(err) => {
                    tracing::warn!("{err}");
                    self.push_notification("Could not load the theme list.".to_string());
                }
            },
            Msg::ApplyTheme => self.handle_apply(),
            Msg::ApplyFinished(result) => match result {
                Ok(report) => {
                    tracing::debug!("apply committed version {}", report.version.0);
                    self.push_notification("Successfully applied theme".to_string());
                }
                Err(err) => self.push_notification(err.to_string()),
            },
            Msg::CreatePullRequest => self.handle_create_pull_request(),
            Msg::PullRequestFinished { attempt, result } => {
                let before = self.settings.settings().pull_request_history.len();
                let accepted = self
                    .workflow
                    .finish(attempt, result, self.settings.history_mut());
                if accepted && self.settings.settings().pull_request_history.len() != before {
                    self.persist_settings();
                }
            }
            Msg::Quit => self.should_quit = true,
        }
        Ok(())
    }

    fn handle_settings(&mut self, command: SettingsCommand) {
        match command {
            SettingsCommand::SetRepository(value) => self.settings.set_repository(value),
            SettingsCommand::SetAccount(value) => self.settings.set_account(value),
            SettingsCommand::SetToken(value) => self.settings.set_token(value),
            SettingsCommand::SetBaseUrl(value) => self.settings.set_base_url(value),
            SettingsCommand::SetBaseMode(mode) => self.settings.set_base_mode(mode),
            SettingsCommand::SelectTheme(id) => {
                let Some(theme) = self.catalog.get(&id).cloned() else {
                    self.push_notification(format!("Unknown theme: {}", id.0));
                    return;
                };
                self.settings.select_theme(theme);
            }
        }
        self.persist_settings();
    }

    fn persist_settings(&mut self) {
        if let Err(err) = self.settings.persist() {
            tracing::warn!("saving settings failed: {err}");
            self.push_notification("Settings could not be saved.".to_string());
        }
    }

    fn handle_apply(&mut self) {
        let prepared = match prepare_apply(self.settings.settings()) {
            Ok(prepared) => prepared,
            Err(err) => {
                self.push_notification(err.to_string());
                return;
            }
        };

        let store = Arc::clone(&self.services.store);
        let github = self.config.github.clone();
        let tx = self.event_tx.clone();
        self.runtime.spawn(async move {
            let result = commit_theme(store.as_ref(), &prepared, &github).await;
            let _ = tx.send(Msg::ApplyFinished(result));
        });
        self.push_notification("Applying theme...".to_string());
    }

    fn handle_create_pull_request(&mut self) {
        let tx = self.event_tx.clone();
        let started = self.workflow.start(
            Arc::clone(&self.services.creator),
            self.settings.settings().clone(),
            move |attempt, result| {
                let _ = tx.send(Msg::PullRequestFinished { attempt, result });
            },
        );

        if let Err(err) = started {
            self.push_notification(err.to_string());
        }
    }

    pub fn push_notification(&mut self, message: String) {
        self.notifications.push_back(message);
        while self.notifications.len() > MAX_NOTIFICATIONS {
            self.notifications.pop_front();
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return self.update(Msg::Quit);
        }

        match self.mode {
            Mode::Normal => self.handle_key_normal(key),
            Mode::Editing => self.handle_key_editing(key),
        }
    }

    fn handle_key_normal(&mut self, key: KeyEvent) -> Result<()> {
        let row = Row::ALL[self.selected];
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.update(Msg::Quit)?,
            KeyCode::Char('j') | KeyCode::Down => {
                self.selected = (self.selected + 1).min(Row::ALL.len() - 1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Char('h') | KeyCode::Left => self.cycle_option(row, -1)?,
            KeyCode::Char('l') | KeyCode::Right => self.cycle_option(row, 1)?,
            KeyCode::Char('a') => self.update(Msg::ApplyTheme)?,
            KeyCode::Char('p') => self.update(Msg::CreatePullRequest)?,
            KeyCode::Enter => match row {
                _ if row.is_text() => {
                    self.edit_input = self.field_value(row);
                    self.mode = Mode::Editing;
                }
                Row::BaseTheme | Row::Theme => self.cycle_option(row, 1)?,
                Row::Apply => self.update(Msg::ApplyTheme)?,
                Row::CreatePullRequest => self.update(Msg::CreatePullRequest)?,
                _ => {}
            },
            _ => {}
        }
        Ok(())
    }

    fn handle_key_editing(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.edit_input.clear();
                self.mode = Mode::Normal;
            }
            KeyCode::Enter => {
                let value = std::mem::take(&mut self.edit_input).trim().to_string();
                self.mode = Mode::Normal;
                let command = match Row::ALL[self.selected] {
                    Row::Repository => SettingsCommand::SetRepository(value),
                    Row::Username => SettingsCommand::SetAccount(value),
                    Row::Token => SettingsCommand::SetToken(value),
                    Row::BaseUrl => SettingsCommand::SetBaseUrl(value),
                    _ => return Ok(()),
                };
                self.update(Msg::Settings(command))?;
            }
            KeyCode::Backspace => {
                self.edit_input.pop();
            }
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                self.edit_input.push(ch);
            }
            _ => {}
        }
        Ok(())
    }

    fn cycle_option(&mut self, row: Row, step: isize) -> Result<()> {
        match row {
            Row::BaseTheme => {
                let mode = self.settings.settings().base_theme.toggled();
                self.update(Msg::Settings(SettingsCommand::SetBaseMode(mode)))?;
            }
            Row::Theme => {
                let current = self.settings.settings().theme.as_ref().map(|t| t.id());
                let next: Option<ThemeId> =
                    self.catalog.cycle(current.as_ref(), step).map(|t| t.id());
                match next {
                    Some(id) => self.update(Msg::Settings(SettingsCommand::SelectTheme(id)))?,
                    None => self.push_notification("The theme list is not loaded.".to_string()),
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn field_value(&self, row: Row) -> String {
        let settings = self.settings.settings();
        match row {
            Row::Repository => settings.github_repo.clone(),
            Row::Username => settings.github_user_name.clone(),
            Row::Token => settings.github_token.clone(),
            Row::BaseUrl => settings.garden_base_url.clone(),
            _ => String::new(),
        }
    }

    // ── MVU: View ────────────────────────────────────────────────

    pub fn view(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length((Row::ALL.len() + 2) as u16), // settings
                Constraint::Length(4),                           // progress
                Constraint::Min(3),                              // history
                Constraint::Length((MAX_NOTIFICATIONS / 2 + 2) as u16),
                Constraint::Length(1), // status bar
            ])
            .split(frame.area());

        self.render_settings(frame, chunks[0]);
        self.render_progress(frame, chunks[1]);
        self.render_history(frame, chunks[2]);
        self.render_notifications(frame, chunks[3]);
        self.render_status_bar(frame, chunks[4]);
    }

    fn render_settings(&self, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = Row::ALL
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let selected = index == self.selected;
                let label_style = if selected {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Cyan)
                };

                let value = if selected && self.mode == Mode::Editing {
                    let input = if *row == Row::Token {
                        mask(&self.edit_input)
                    } else {
                        self.edit_input.clone()
                    };
                    Span::styled(
                        format!("{input}▏"),
                        Style::default().fg(Color::Yellow),
                    )
                } else {
                    self.render_value(*row)
                };

                Line::from(vec![
                    Span::styled(format!(" {:<18}", row.label()), label_style),
                    Span::raw(" "),
                    value,
                ])
            })
            .collect();

        let block = Block::default().borders(Borders::ALL).title(" Settings ");
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_value(&self, row: Row) -> Span<'static> {
        let settings = self.settings.settings();
        let dim = Style::default().fg(Color::DarkGray);
        let text = |value: &str, placeholder: &'static str| {
            if value.is_empty() {
                Span::styled(placeholder, dim)
            } else {
                Span::styled(value.to_string(), Style::default().fg(Color::Gray))
            }
        };

        match row {
            Row::Repository => text(&settings.github_repo, "mydigitalgarden"),
            Row::Username => text(&settings.github_user_name, "myusername"),
            Row::Token if settings.github_token.is_empty() => Span::styled("Secret Token", dim),
            Row::Token => Span::styled(
                mask(&settings.github_token),
                Style::default().fg(Color::Gray),
            ),
            Row::BaseUrl => text(&settings.garden_base_url, "my-digital-garden.netlify.app"),
            Row::BaseTheme => Span::styled(
                format!("◂ {} ▸", settings.base_theme.label()),
                Style::default().fg(Color::Magenta),
            ),
            Row::Theme => match &settings.theme {
                Some(theme) => Span::styled(
                    format!("◂ {} ▸  [{}]", theme.name, theme.modes.join(", ")),
                    Style::default().fg(Color::Magenta),
                ),
                None if self.catalog.is_empty() => Span::styled("(loading theme list)", dim),
                None => Span::styled("◂ none selected ▸", dim),
            },
            Row::Apply => Span::styled("[ Apply ]  (a)", Style::default().fg(Color::Green)),
            Row::CreatePullRequest => {
                Span::styled("[ Create PR ]  (p)", Style::default().fg(Color::Green))
            }
        }
    }

    fn render_progress(&self, frame: &mut Frame, area: Rect) {
        let lines = match self.workflow.state() {
            WorkflowState::Idle => vec![
                Line::from(Span::styled(
                    "Creates a pull request with the latest template changes.",
                    Style::default().fg(Color::DarkGray),
                )),
                Line::from(Span::styled(
                    "Nothing goes live before you approve it.",
                    Style::default().fg(Color::DarkGray),
                )),
            ],
            WorkflowState::Loading => vec![
                Line::from("Creating PR. This should take less than 1 minute"),
                Line::from(Span::styled(
                    self.workflow.indicator().frame().to_string(),
                    Style::default().fg(Color::Yellow),
                )),
            ],
            WorkflowState::Success {
                pull_request: Some(url),
            } => vec![
                Line::from(Span::styled(
                    "🎉 Done! Approve your PR to make the changes go live.",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    url.clone(),
                    Style::default()
                        .fg(Color::Rgb(255, 102, 0))
                        .add_modifier(Modifier::UNDERLINED),
                )),
            ],
            WorkflowState::Success { pull_request: None } => vec![Line::from(Span::styled(
                "You already have the latest template 🎉 No need to create a PR.",
                Style::default().fg(Color::Green),
            ))],
            WorkflowState::Error => vec![Line::from(Span::styled(
                format!("❌ {FAILURE_NOTICE}"),
                Style::default().fg(Color::Red),
            ))],
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Template pull request ");
        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
            area,
        );
    }

    fn render_history(&self, frame: &mut Frame, area: Rect) {
        let history = &self.settings.settings().pull_request_history;
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Recent Pull Request History ");

        let lines: Vec<Line> = history
            .recent(self.config.general.history_display_limit)
            .iter()
            .rev()
            .map(|record| {
                Line::from(Span::styled(
                    format!(" {}", record.url),
                    Style::default()
                        .fg(Color::Rgb(255, 102, 0))
                        .add_modifier(Modifier::UNDERLINED),
                ))
            })
            .collect();

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_notifications(&self, frame: &mut Frame, area: Rect) {
        let visible = area.height.saturating_sub(2) as usize;
        let lines: Vec<Line> = self
            .notifications
            .iter()
            .rev()
            .take(visible)
            .rev()
            .map(|note| Line::from(Span::styled(note.clone(), Style::default().fg(Color::Gray))))
            .collect();

        let block = Block::default().borders(Borders::ALL).title(" Notices ");
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let mode_style = match self.mode {
            Mode::Normal => Style::default()
                .fg(Color::Black)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            Mode::Editing => Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        };

        let mode_span = Span::styled(format!(" {} ", self.mode.label()), mode_style);

        let settings = self.settings.settings();
        let repo = if settings.github_repo.is_empty() {
            "[no repo]".to_string()
        } else {
            format!("{}/{}", settings.github_user_name, settings.github_repo)
        };

        let hints = match self.mode {
            Mode::Normal => "j/k move  h/l change  enter edit  a apply  p PR  q quit",
            Mode::Editing => "enter save  esc cancel",
        };

        let info = Span::styled(
            format!(" {repo} | {} themes | {hints} ", self.catalog.len()),
            Style::default().fg(Color::Gray).bg(Color::DarkGray),
        );

        let bar = Line::from(vec![mode_span, info]);
        let status = Paragraph::new(bar).style(Style::default().bg(Color::DarkGray));
        frame.render_widget(status, area);
    }
}
