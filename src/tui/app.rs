//! Main application logic for the terminal user interface.
//!
//! This module contains the `App` struct which manages the TUI state,
//! handles user input, renders the interface, and runs the periodic
//! reminder scan inside the event loop.

use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use chrono::Utc;
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};

use crate::fields::{format_filter, format_priority, format_sort_key, format_theme, Filter, SortKey};
use crate::reminder::{reminder_scan, DesktopNotifier, SCAN_INTERVAL};
use crate::store::{format_due_relative, TaskStore};
use crate::tui::{
    colors::{palette, Palette},
    enums::AppState,
    input::InputField,
    task_form::{TaskForm, DUE_FIELD, PRIORITY_FIELD, TEXT_FIELD},
    utils::centered_rect,
};

/// Main application state for the terminal user interface.
///
/// Owns the task store for the session. Every mutation goes through the
/// store's operations and is followed by a snapshot write; the reminder
/// scan runs on a fixed cadence from the event loop and dies with it.
pub struct App {
    state: AppState,
    store: TaskStore,
    db_path: std::path::PathBuf,
    table_state: TableState,
    visible: Vec<u64>,
    filter: Filter,
    sort: SortKey,
    form: TaskForm,
    edit_id: Option<u64>,
    error: Option<String>,
    status_message: String,
    confirm_delete: Option<u64>,
    notifier: DesktopNotifier,
    last_scan: Instant,
}

impl App {
    /// Create a new App instance, loading the store from the specified path.
    pub fn new(db_path: &Path) -> io::Result<Self> {
        let store = TaskStore::load(db_path);
        let mut app = App {
            state: AppState::TaskList,
            store,
            db_path: db_path.to_path_buf(),
            table_state: TableState::default(),
            visible: Vec::new(),
            filter: Filter::All,
            sort: SortKey::Created,
            form: TaskForm::new(),
            edit_id: None,
            error: None,
            status_message: String::new(),
            confirm_delete: None,
            notifier: DesktopNotifier,
            last_scan: Instant::now(),
        };
        app.update_visible();
        Ok(app)
    }

    /// Recompute the display projection, preserving the selection when the
    /// selected task is still visible.
    fn update_visible(&mut self) {
        let old_selected_id = self
            .table_state
            .selected()
            .and_then(|idx| self.visible.get(idx))
            .copied();

        self.visible = self
            .store
            .project(self.filter, self.sort)
            .iter()
            .map(|t| t.id)
            .collect();

        if let Some(old_id) = old_selected_id {
            if let Some(new_idx) = self.visible.iter().position(|&id| id == old_id) {
                self.table_state.select(Some(new_idx));
                return;
            }
        }
        self.table_state
            .select(if self.visible.is_empty() { None } else { Some(0) });
    }

    /// Save the store to disk, downgrading failures to a status note. The
    /// in-memory state stays authoritative for the rest of the session.
    fn save_store(&mut self) {
        if let Err(e) = self.store.save(&self.db_path) {
            self.status_message = format!("Save failed (changes kept in memory): {e}");
        }
    }

    /// ID of the task currently under the cursor.
    fn selected_id(&self) -> Option<u64> {
        self.table_state
            .selected()
            .and_then(|idx| self.visible.get(idx))
            .copied()
    }

    /// Run the periodic due scan when its interval has elapsed. Fires
    /// notifications, flags tasks as notified and persists any change.
    fn tick_reminders(&mut self) {
        if self.last_scan.elapsed() < SCAN_INTERVAL {
            return;
        }
        self.last_scan = Instant::now();
        let changed = reminder_scan(&mut self.store.tasks, Utc::now(), &self.notifier);
        if changed > 0 {
            self.save_store();
            self.update_visible();
            self.status_message = format!("{} task(s) came due", changed);
        }
    }

    /// Handle keyboard input when in the task list view.
    ///
    /// Returns true if the application should quit.
    fn handle_task_list_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> io::Result<bool> {
        match key {
            KeyCode::Char('q') if modifiers.contains(KeyModifiers::CONTROL) => return Ok(true),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return Ok(true),
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),

            KeyCode::Up => {
                if let Some(selected) = self.table_state.selected() {
                    if selected > 0 {
                        self.table_state.select(Some(selected - 1));
                    }
                } else if !self.visible.is_empty() {
                    self.table_state.select(Some(0));
                }
            }
            KeyCode::Down => {
                if let Some(selected) = self.table_state.selected() {
                    if selected + 1 < self.visible.len() {
                        self.table_state.select(Some(selected + 1));
                    }
                } else if !self.visible.is_empty() {
                    self.table_state.select(Some(0));
                }
            }

            KeyCode::Char('a') => {
                self.form = TaskForm::new();
                self.edit_id = None;
                self.state = AppState::AddTask;
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(id) = self.selected_id() {
                    if let Some(task) = self.store.get(id) {
                        self.form = TaskForm::from_task(task);
                        self.edit_id = Some(id);
                        self.state = AppState::EditTask;
                    }
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_id() {
                    self.confirm_delete = Some(id);
                    self.state = AppState::ConfirmDelete;
                }
            }
            KeyCode::Char('c') | KeyCode::Char(' ') => {
                if let Some(id) = self.selected_id() {
                    if self.store.toggle_complete(id) {
                        self.error = None;
                        self.save_store();
                        self.update_visible();
                        self.status_message = "Task toggled".to_string();
                    }
                }
            }
            KeyCode::Char('f') => {
                self.filter = self.filter.next();
                self.update_visible();
                self.status_message = format!("Filter: {}", format_filter(self.filter));
            }
            KeyCode::Char('s') => {
                self.sort = self.sort.next();
                self.update_visible();
                self.status_message = format!("Sort: {}", format_sort_key(self.sort));
            }
            KeyCode::Char('t') => {
                self.store.theme = self.store.theme.toggled();
                self.save_store();
                self.status_message = format!("Theme: {}", format_theme(self.store.theme));
            }
            KeyCode::Char('x') => {
                self.error = None;
            }
            KeyCode::Char('h') => {
                self.state = AppState::Help;
            }
            _ => {}
        }
        Ok(false)
    }

    /// Handle keyboard input when in the add or edit form.
    ///
    /// Returns true if the application should quit.
    fn handle_form_input(&mut self, key: KeyCode, _modifiers: KeyModifiers, is_edit: bool) -> io::Result<bool> {
        match key {
            KeyCode::Esc => {
                // Cancel: discard pending form state without mutating the task.
                self.state = AppState::TaskList;
                self.edit_id = None;
            }
            KeyCode::Tab | KeyCode::Down => self.form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.form.prev_field(),
            KeyCode::Left => self.form.handle_left_right(false),
            KeyCode::Right => self.form.handle_left_right(true),
            KeyCode::Backspace => self.form.handle_backspace(),
            KeyCode::Delete => self.form.handle_delete(),
            KeyCode::Enter => {
                let now = Utc::now();
                let text = self.form.text.value.clone();
                let priority = self.form.selected_priority();
                let due = self.form.due_input().map(|s| s.to_string());

                let result = if is_edit {
                    match self.edit_id {
                        Some(id) => self
                            .store
                            .commit_edit(id, &text, priority, due.as_deref(), now)
                            .map(|_| ()),
                        None => Ok(()),
                    }
                } else {
                    self.store.add(&text, priority, due.as_deref(), now).map(|_| ())
                };

                match result {
                    Ok(()) => {
                        self.error = None;
                        self.save_store();
                        self.update_visible();
                        self.state = AppState::TaskList;
                        self.edit_id = None;
                        self.form = TaskForm::new();
                        self.status_message =
                            if is_edit { "Task updated" } else { "Task created" }.to_string();
                    }
                    Err(e) => {
                        // One active message at a time; a new failure replaces it.
                        self.error = Some(e.to_string());
                    }
                }
            }
            KeyCode::Char(c) => self.form.handle_char(c),
            _ => {}
        }
        Ok(false)
    }

    /// Handle keyboard input in the delete confirmation dialog.
    fn handle_confirm_input(&mut self, key: KeyCode, _modifiers: KeyModifiers) -> io::Result<bool> {
        match key {
            KeyCode::Char('y') | KeyCode::Enter => {
                if let Some(id) = self.confirm_delete.take() {
                    // Logical removal is immediate; there is no deferred
                    // presentation state to reconcile.
                    if self.store.delete(id) {
                        self.error = None;
                        self.save_store();
                        self.update_visible();
                        self.status_message = format!("Deleted task {}", id);
                    }
                }
                self.state = AppState::TaskList;
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.confirm_delete = None;
                self.state = AppState::TaskList;
            }
            _ => {}
        }
        Ok(false)
    }

    /// Handle keyboard input when viewing the help screen.
    fn handle_help_input(&mut self, key: KeyCode, _modifiers: KeyModifiers) -> io::Result<bool> {
        match key {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('h') => {
                self.state = AppState::TaskList;
            }
            _ => {}
        }
        Ok(false)
    }

    /// Poll for and handle keyboard events based on current application state.
    ///
    /// Returns true if the application should quit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                self.status_message.clear();

                let should_quit = match self.state {
                    AppState::TaskList => self.handle_task_list_input(key.code, key.modifiers)?,
                    AppState::AddTask => self.handle_form_input(key.code, key.modifiers, false)?,
                    AppState::EditTask => self.handle_form_input(key.code, key.modifiers, true)?,
                    AppState::ConfirmDelete => self.handle_confirm_input(key.code, key.modifiers)?,
                    AppState::Help => self.handle_help_input(key.code, key.modifiers)?,
                };
                if should_quit {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Render the main task list view with header and table.
    fn render_task_list(&mut self, f: &mut Frame, area: Rect) {
        let pal = palette(self.store.theme);
        let now = Utc::now();

        let has_error = self.error.is_some();
        let constraints: Vec<Constraint> = if has_error {
            vec![Constraint::Length(3), Constraint::Length(1), Constraint::Min(0)]
        } else {
            vec![Constraint::Length(3), Constraint::Min(0)]
        };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let context_display = format!(
            "Filter: {}  Sort: {}  Theme: {}",
            format_filter(self.filter),
            format_sort_key(self.sort),
            format_theme(self.store.theme)
        );
        let header_text = vec![Line::from(vec![
            Span::styled("TICKLER", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                context_display,
                Style::default().fg(pal.accent).add_modifier(Modifier::ITALIC),
            ),
        ])];
        let header_block = Paragraph::new(header_text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header_block, chunks[0]);

        if let Some(msg) = &self.error {
            let line = Paragraph::new(format!("{}  (x to dismiss)", msg))
                .style(Style::default().fg(pal.error).add_modifier(Modifier::BOLD));
            f.render_widget(line, chunks[1]);
        }

        let header_cells = ["ID", "", "Pri", "Due", "Text"]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD)));
        let header = Row::new(header_cells).style(
            Style::default()
                .bg(pal.selection_bg)
                .fg(pal.selection_fg),
        );

        let rows: Vec<Row> = self
            .visible
            .iter()
            .filter_map(|&id| self.store.get(id))
            .map(|t| {
                let overdue = !t.is_completed && t.due_at.is_some_and(|d| d <= now);
                let row_style = if t.is_completed {
                    Style::default().fg(pal.done).add_modifier(Modifier::CROSSED_OUT)
                } else if overdue {
                    Style::default().fg(pal.overdue)
                } else {
                    Style::default().fg(pal.text)
                };
                let pri_color = match t.priority.rank() {
                    0 => pal.high,
                    1 => pal.medium,
                    _ => pal.low,
                };
                Row::new(vec![
                    Cell::from(t.id.to_string()),
                    Cell::from(if t.is_completed { "x" } else { " " }),
                    Cell::from(format_priority(t.priority)).style(Style::default().fg(pri_color)),
                    Cell::from(format_due_relative(t.due_at, now)),
                    Cell::from(t.text.clone()),
                ])
                .style(row_style)
            })
            .collect();

        let widths = [
            Constraint::Length(5),
            Constraint::Length(2),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Min(10),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL))
            .row_highlight_style(
                Style::default()
                    .bg(pal.selection_bg)
                    .fg(pal.selection_fg)
                    .add_modifier(Modifier::BOLD),
            );

        let table_area = if has_error { chunks[2] } else { chunks[1] };
        f.render_stateful_widget(table, table_area, &mut self.table_state);
    }

    /// Render one labelled form line, highlighting the active field.
    fn form_line<'a>(label: &'a str, field: &'a InputField, active: bool, pal: &Palette) -> Line<'a> {
        let style = if active {
            Style::default().fg(pal.accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(pal.text)
        };
        let cursor = if active { "_" } else { "" };
        Line::from(vec![
            Span::styled(format!("{:<10}", label), style),
            Span::styled(format!("{}{}", field.value, cursor), style),
        ])
    }

    /// Render the add/edit task form as a centered popup.
    fn render_task_form(&mut self, f: &mut Frame, area: Rect, is_edit: bool) {
        let pal = palette(self.store.theme);
        let popup = centered_rect(64, 48, area);
        f.render_widget(Clear, popup);

        let title = if is_edit { "Edit Task" } else { "Add Task" };

        let pri_active = self.form.current_field == PRIORITY_FIELD;
        let pri_style = if pri_active {
            Style::default().fg(pal.accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(pal.text)
        };
        let pri_line = Line::from(vec![
            Span::styled(format!("{:<10}", "Priority"), pri_style),
            Span::styled(
                format!("< {} >", format_priority(self.form.selected_priority())),
                pri_style,
            ),
        ]);

        let mut lines = vec![
            Self::form_line("Text", &self.form.text, self.form.current_field == TEXT_FIELD, &pal),
            pri_line,
            Self::form_line("Due", &self.form.due, self.form.current_field == DUE_FIELD, &pal),
            Line::from(""),
            Line::from(Span::styled(
                "Due accepts: 2025-07-01T09:00, tomorrow 09:00, in 2h",
                Style::default().fg(pal.dim),
            )),
            Line::from(Span::styled(
                "Tab/Up/Down fields | Left/Right cycle | Enter save | Esc cancel",
                Style::default().fg(pal.dim),
            )),
        ];
        if let Some(msg) = &self.error {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                msg.clone(),
                Style::default().fg(pal.error).add_modifier(Modifier::BOLD),
            )));
        }

        let form = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: false });
        f.render_widget(form, popup);
    }

    /// Render the delete confirmation popup over the task list.
    fn render_confirm(&mut self, f: &mut Frame, area: Rect) {
        let pal = palette(self.store.theme);
        let popup = centered_rect(40, 20, area);
        f.render_widget(Clear, popup);

        let text = match self.confirm_delete {
            Some(id) => format!("Delete task #{}? (y/n)", id),
            None => "Delete task? (y/n)".to_string(),
        };
        let dialog = Paragraph::new(text)
            .style(Style::default().fg(pal.error).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Confirm"));
        f.render_widget(dialog, popup);
    }

    /// Render the help screen.
    fn render_help(&mut self, f: &mut Frame, area: Rect) {
        let pal = palette(self.store.theme);
        let lines = vec![
            Line::from("Task list"),
            Line::from("  Up/Down      move selection"),
            Line::from("  a            add task"),
            Line::from("  e / Enter    edit task"),
            Line::from("  c / Space    toggle complete"),
            Line::from("  d            delete task (asks to confirm)"),
            Line::from("  f            cycle filter (all / active / completed)"),
            Line::from("  s            cycle sort (created / due / priority)"),
            Line::from("  t            toggle light/dark theme"),
            Line::from("  x            dismiss error message"),
            Line::from("  q / Esc      quit"),
            Line::from(""),
            Line::from("Reminders"),
            Line::from("  Tasks with an elapsed due time raise one desktop"),
            Line::from("  notification; the scan runs every 30 seconds while"),
            Line::from("  the UI is open. Editing a task re-arms its reminder."),
        ];
        let help = Paragraph::new(lines)
            .style(Style::default().fg(pal.text))
            .block(Block::default().borders(Borders::ALL).title("Help"));
        f.render_widget(help, area);
    }

    /// Render the one-line status bar.
    fn render_status_bar(&mut self, f: &mut Frame, area: Rect) {
        let pal = palette(self.store.theme);
        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            match self.state {
                AppState::TaskList => {
                    format!("Tasks: {} | Press 'h' for help", self.visible.len())
                }
                AppState::AddTask => "Add New Task".to_string(),
                AppState::EditTask => "Edit Task".to_string(),
                AppState::ConfirmDelete => "Confirm Delete".to_string(),
                AppState::Help => "Help".to_string(),
            }
        };

        let status = Paragraph::new(status_text)
            .style(Style::default().bg(pal.selection_bg).fg(pal.selection_fg))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    /// Main render function that dispatches to appropriate view renderers.
    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)].as_ref())
            .split(f.area());

        match self.state {
            AppState::TaskList => self.render_task_list(f, chunks[0]),
            AppState::AddTask => {
                self.render_task_list(f, chunks[0]);
                self.render_task_form(f, chunks[0], false);
            }
            AppState::EditTask => {
                self.render_task_list(f, chunks[0]);
                self.render_task_form(f, chunks[0], true);
            }
            AppState::ConfirmDelete => {
                self.render_task_list(f, chunks[0]);
                self.render_confirm(f, chunks[0]);
            }
            AppState::Help => self.render_help(f, chunks[0]),
        }

        self.render_status_bar(f, chunks[1]);
    }

    /// Main event loop for the TUI application.
    ///
    /// Handles the reminder tick, rendering and input processing until the
    /// user exits. Leaving the loop tears the periodic scan down with it.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            self.tick_reminders();

            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}
