// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cirrus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cirrus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Terminal UI.
//!
//! The interactive shell (ratatui + crossterm): one resource list at a time,
//! cycled with Tab, refreshed in the background while the event loop keeps
//! rendering.

use std::{
    error::Error,
    io,
    sync::Arc,
    time::{Duration, Instant},
};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tracing::info;

use crate::api::ApiClient;
use crate::lister::{Lister, ListerConfig};

mod list;
mod theme;


use list::{render_list, visible_rows, ColumnLayout};
use theme::TuiTheme;

const TOAST_TTL: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Everything the UI needs from the outside world; passed in instead of read
/// from globals so tests can assemble their own.
pub struct AppContext {
    pub client: Arc<dyn ApiClient>,
    pub catalog: Vec<ListerConfig>,
    pub initial_resource: usize,
    pub refresh_interval: Duration,
}

/// Runs the interactive terminal UI until the user quits.
pub fn run(context: AppContext) -> Result<(), Box<dyn Error>> {
    if context.catalog.is_empty() {
        return Err("resource catalog is empty".into());
    }
    let theme = TuiTheme::from_env()?;
    let mut terminal = TerminalSession::new()?;
    let mut app = App::new(context, theme);

    while !app.should_quit {
        app.tick();
        terminal.draw(|frame| draw(frame, &mut app))?;

        if event::poll(POLL_INTERVAL)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.handle_key(key);
                }
                _ => {}
            }
        }
    }

    app.lister.close();
    Ok(())
}

struct Toast {
    message: String,
    expires_at: Instant,
}

struct App {
    client: Arc<dyn ApiClient>,
    catalog: Vec<ListerConfig>,
    active: usize,
    lister: Lister,
    layout: ColumnLayout,
    refresh_interval: Duration,
    /// In-progress filter text while the filter prompt is open.
    filter_input: Option<String>,
    toast: Option<Toast>,
    theme: TuiTheme,
    /// Entry rows visible in the last drawn frame, for page navigation.
    last_rows: usize,
    should_quit: bool,
}

impl App {
    fn new(context: AppContext, theme: TuiTheme) -> Self {
        let AppContext {
            client,
            catalog,
            initial_resource,
            refresh_interval,
        } = context;
        let active = initial_resource.min(catalog.len().saturating_sub(1));
        let mut lister = Lister::new(catalog[active].clone(), Arc::clone(&client));
        lister.refresh();

        Self {
            client,
            catalog,
            active,
            lister,
            layout: ColumnLayout::default(),
            refresh_interval,
            filter_input: None,
            toast: None,
            theme,
            last_rows: 1,
            should_quit: false,
        }
    }

    /// Drains fetch events and schedules the next automatic refresh. Runs
    /// once per render loop iteration.
    fn tick(&mut self) {
        if let Some(message) = self.lister.pump() {
            self.set_toast(format!("Fetch failed: {message}"));
        }
        self.lister
            .maybe_auto_refresh(self.refresh_interval, self.filter_input.is_some());
    }

    fn set_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast {
            message: message.into(),
            expires_at: Instant::now() + TOAST_TTL,
        });
    }

    fn toast_message(&mut self) -> Option<&str> {
        if let Some(toast) = &self.toast {
            if toast.expires_at <= Instant::now() {
                self.toast = None;
            }
        }
        self.toast.as_ref().map(|toast| toast.message.as_str())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.filter_input.is_some() {
            self.handle_filter_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('/') => {
                let current = self.lister.filter().unwrap_or("").to_owned();
                self.filter_input = Some(current);
            }
            KeyCode::Esc => self.lister.set_filter(None),
            KeyCode::Char('r') => {
                if !self.lister.refresh() {
                    self.set_toast("Refresh already in progress");
                }
            }
            KeyCode::Tab | KeyCode::Char(']') => self.cycle_resource(1),
            KeyCode::BackTab | KeyCode::Char('[') => self.cycle_resource(-1),
            KeyCode::Up | KeyCode::Char('k') => self.lister.select_delta(-1, self.last_rows),
            KeyCode::Down | KeyCode::Char('j') => self.lister.select_delta(1, self.last_rows),
            KeyCode::PageUp => self.lister.select_page(-1, self.last_rows),
            KeyCode::PageDown => self.lister.select_page(1, self.last_rows),
            KeyCode::Home => self.lister.select_home(),
            KeyCode::End => self.lister.select_end(self.last_rows),
            _ => {}
        }
    }

    /// Filter prompt keys. Each change applies immediately so the list
    /// narrows as the user types.
    fn handle_filter_key(&mut self, key: KeyEvent) {
        let Some(input) = self.filter_input.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.filter_input = None;
                self.lister.set_filter(None);
            }
            KeyCode::Enter => {
                self.filter_input = None;
            }
            KeyCode::Backspace => {
                input.pop();
                let filter = input.clone();
                self.apply_filter(filter);
            }
            KeyCode::Char(ch) => {
                input.push(ch);
                let filter = input.clone();
                self.apply_filter(filter);
            }
            _ => {}
        }
    }

    fn apply_filter(&mut self, filter: String) {
        if filter.is_empty() {
            self.lister.set_filter(None);
        } else {
            self.lister.set_filter(Some(filter));
        }
    }

    /// Switches to another catalog entry; the old lister's worker is asked
    /// to stop and its channel dropped.
    fn cycle_resource(&mut self, delta: isize) {
        if self.catalog.len() < 2 {
            return;
        }
        let len = self.catalog.len() as isize;
        let next = (self.active as isize + delta).rem_euclid(len) as usize;
        self.activate(next);
    }

    fn activate(&mut self, index: usize) {
        if index == self.active {
            return;
        }
        self.lister.close();
        self.active = index;
        self.filter_input = None;
        self.layout = ColumnLayout::default();
        self.lister = Lister::new(self.catalog[index].clone(), Arc::clone(&self.client));
        self.lister.refresh();
        info!(resource = self.lister.config().resource_key(), "switched resource");
    }
}

fn draw(frame: &mut Frame<'_>, app: &mut App) {
    let area = frame.size();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);
    let title_area = layout[0];
    let list_area = layout[1];
    let footer_area = layout[2];

    app.last_rows = visible_rows(list_area).max(1);

    frame.render_widget(title_line(app), title_area);
    render_list(frame, list_area, &app.lister, &mut app.layout, &app.theme);

    let toast = app.toast_message().map(str::to_owned);
    let footer = if let Some(input) = &app.filter_input {
        filter_footer_line(input, app.lister.filtered_len(), &app.theme)
    } else {
        footer_help_line(toast.as_deref(), &app.theme)
    };
    frame.render_widget(footer, footer_area);
}

fn title_line(app: &App) -> Line<'static> {
    let config = app.lister.config();
    let shown = app.lister.filtered_len();
    let total = app.lister.entries().len();
    let counts = if shown == total {
        format!("{total}")
    } else {
        format!("{shown}/{total}")
    };

    let mut spans = vec![
        Span::styled(
            format!(" {} ", config.title()),
            app.theme.header_style(),
        ),
        Span::styled(format!("({counts})"), app.theme.footer_label_style()),
    ];
    if let Some(filter) = app.lister.filter() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("filter:{filter}"),
            app.theme.footer_key_style(),
        ));
    }
    if app.lister.is_updating() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled("updating...", app.theme.footer_label_style()));
    }
    Line::from(spans)
}

fn footer_help_line(toast: Option<&str>, theme: &TuiTheme) -> Line<'static> {
    let mut spans = Vec::<Span<'static>>::new();
    push_footer_entry(&mut spans, "Filter", "/", theme);
    push_footer_entry(&mut spans, "Refresh", "r", theme);
    push_footer_entry(&mut spans, "Resource", "tab/[]", theme);
    push_footer_entry(&mut spans, "Move", "j/k", theme);
    push_footer_entry(&mut spans, "Quit", "q", theme);

    if let Some(message) = toast {
        let message = message.trim();
        if !message.is_empty() {
            spans.push(Span::styled(" | ".to_owned(), theme.footer_label_style()));
            spans.push(Span::styled(message.to_owned(), theme.error_style()));
        }
    }

    Line::from(spans)
}

fn filter_footer_line(input: &str, matches: usize, theme: &TuiTheme) -> Line<'static> {
    let mut spans = vec![
        Span::styled("/".to_owned(), theme.footer_key_style()),
        Span::raw(input.to_owned()),
        Span::raw("   "),
        Span::styled(format!("{matches} match(es)"), theme.footer_label_style()),
    ];
    push_footer_entry(&mut spans, "Accept", "Enter", theme);
    push_footer_entry(&mut spans, "Clear", "Esc", theme);
    Line::from(spans)
}

fn push_footer_entry(
    spans: &mut Vec<Span<'static>>,
    label: &str,
    value: &str,
    theme: &TuiTheme,
) {
    if !spans.is_empty() {
        spans.push(Span::styled(" | ".to_owned(), theme.footer_label_style()));
    }
    spans.push(Span::styled(
        format!("{label}:"),
        theme.footer_label_style(),
    ));
    spans.push(Span::styled(value.to_owned(), theme.footer_key_style()));
}

struct TerminalSession {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self, Box<dyn Error>> {
        enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).map_err(|err| {
            teardown_terminal();
            err
        })?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).map_err(|err| {
            teardown_terminal();
            err
        })?;
        terminal.clear().map_err(|err| {
            teardown_terminal();
            err
        })?;

        Ok(Self { terminal })
    }

    fn draw(&mut self, draw_fn: impl FnOnce(&mut Frame<'_>)) -> io::Result<()> {
        self.terminal.draw(draw_fn)?;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
        teardown_terminal();
    }
}

fn teardown_terminal() {
    let _ = disable_raw_mode();
    let mut stdout = io::stdout();
    let _ = execute!(stdout, LeaveAlternateScreen);
}
