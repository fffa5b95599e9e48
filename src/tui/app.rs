//! Main application logic for the terminal user interface.
//!
//! `App` owns the view state (query, selection, open prompt, pending
//! confirmation) and borrows the task store for the lifetime of the session.
//! Every key press is applied to the store to completion before the next
//! frame is drawn.

use std::io;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState,
        Wrap,
    },
    Frame, Terminal,
};
use tracing::debug;

use crate::config::Config;
use crate::display::{checkbox, format_due_relative, format_progress, format_tags};
use crate::fields::{Category, CategoryFilter, Priority, SortKey, ViewMode};
use crate::storage::KeyValueStore;
use crate::store::TaskStore;
use crate::task::Task;
use crate::tui::{
    colors::Palette,
    enums::{AppState, ConfirmAction, InputMode},
    input::InputField,
    task_form::{
        TaskForm, CATEGORY_ORDER, DESCRIPTION_ORDER, DUE_ORDER, PRIORITY_ORDER, TAGS_ORDER,
        TEXT_ORDER,
    },
    utils::centered_rect,
};
use crate::view::{available_tags, project, ViewQuery};

fn mode_label(mode: ViewMode) -> &'static str {
    match mode {
        ViewMode::Manual => "manual",
        ViewMode::Sorted(SortKey::Text) => "text",
        ViewMode::Sorted(SortKey::Category) => "category",
        ViewMode::Sorted(SortKey::Completion) => "completion",
        ViewMode::Sorted(SortKey::DueDate) => "due date",
    }
}

fn category_label(filter: CategoryFilter) -> &'static str {
    match filter {
        CategoryFilter::All => "all",
        CategoryFilter::Only(c) => c.as_str(),
    }
}

/// Main application state for the terminal user interface.
pub struct App<'a, S: KeyValueStore> {
    store: &'a mut TaskStore<S>,
    config: &'a Config,
    state: AppState,
    query: ViewQuery,
    visible: Vec<u64>,
    task_list_state: TableState,
    detail_task: Option<u64>,
    subtask_state: ListState,
    task_form: TaskForm,
    editing_task: Option<u64>,
    input_mode: InputMode,
    prompt: InputField,
    status_message: String,
    confirm_action: Option<ConfirmAction>,
}

impl<'a, S: KeyValueStore> App<'a, S> {
    pub fn new(store: &'a mut TaskStore<S>, config: &'a Config) -> Self {
        let mut app = App {
            store,
            config,
            state: AppState::TaskList,
            query: ViewQuery::default(),
            visible: Vec::new(),
            task_list_state: TableState::default(),
            detail_task: None,
            subtask_state: ListState::default(),
            task_form: TaskForm::new(config),
            editing_task: None,
            input_mode: InputMode::None,
            prompt: InputField::new(),
            status_message: String::new(),
            confirm_action: None,
        };
        app.refresh_visible();
        app
    }

    /// Recompute the visible rows, keeping the selected task selected when it
    /// is still visible.
    fn refresh_visible(&mut self) {
        let keep = self.selected_task_id();
        self.visible = project(self.store.tasks(), &self.query)
            .iter()
            .map(|t| t.id)
            .collect();
        match keep.and_then(|id| self.visible.iter().position(|&v| v == id)) {
            Some(idx) => self.task_list_state.select(Some(idx)),
            None if self.visible.is_empty() => self.task_list_state.select(None),
            None => {
                let idx = self
                    .task_list_state
                    .selected()
                    .unwrap_or(0)
                    .min(self.visible.len() - 1);
                self.task_list_state.select(Some(idx));
            }
        }
    }

    fn selected_task_id(&self) -> Option<u64> {
        self.task_list_state
            .selected()
            .and_then(|i| self.visible.get(i).copied())
    }

    fn selected_task(&self) -> Option<&Task> {
        self.selected_task_id()
            .and_then(|id| self.store.tasks().get(id))
    }

    fn select_id(&mut self, id: u64) {
        if let Some(idx) = self.visible.iter().position(|&v| v == id) {
            self.task_list_state.select(Some(idx));
        }
    }

    fn current_detail(&self) -> Option<&Task> {
        self.detail_task.and_then(|id| self.store.tasks().get(id))
    }

    fn selected_subtask_id(&self) -> Option<u64> {
        let task = self.current_detail()?;
        let idx = self.subtask_state.selected()?;
        task.subtasks.get(idx).map(|s| s.id)
    }

    fn set_status_message(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    fn clear_status_message(&mut self) {
        self.status_message.clear();
    }

    fn select_prev(&mut self) {
        match self.task_list_state.selected() {
            Some(i) if i > 0 => self.task_list_state.select(Some(i - 1)),
            None if !self.visible.is_empty() => self.task_list_state.select(Some(0)),
            _ => {}
        }
    }

    fn select_next(&mut self) {
        match self.task_list_state.selected() {
            Some(i) if i + 1 < self.visible.len() => self.task_list_state.select(Some(i + 1)),
            None if !self.visible.is_empty() => self.task_list_state.select(Some(0)),
            _ => {}
        }
    }

    fn move_selected(&mut self, delta: isize) {
        if !self.query.mode.allows_reorder() {
            self.set_status_message(format!(
                "Sorted by {}; press 's' until the order is manual to move tasks",
                mode_label(self.query.mode)
            ));
            return;
        }
        let Some(id) = self.selected_task_id() else {
            return;
        };
        if self.store.move_by(id, delta) {
            self.refresh_visible();
        }
    }

    fn open_prompt(&mut self, mode: InputMode, initial: &str) {
        self.input_mode = mode;
        self.prompt = InputField::with_value(initial);
        self.prompt.active = true;
    }

    fn handle_task_list_input(&mut self, key: KeyEvent) -> bool {
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Char('q') => return true,
            KeyCode::Esc => {
                if self.query.search.is_empty() {
                    return true;
                }
                self.query.search.clear();
                self.refresh_visible();
                self.set_status_message("Search cleared");
            }
            KeyCode::Up if shift => self.move_selected(-1),
            KeyCode::Down if shift => self.move_selected(1),
            KeyCode::Char('K') => self.move_selected(-1),
            KeyCode::Char('J') => self.move_selected(1),
            KeyCode::Up | KeyCode::Char('k') => self.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Home if !self.visible.is_empty() => self.task_list_state.select(Some(0)),
            KeyCode::End if !self.visible.is_empty() => {
                self.task_list_state.select(Some(self.visible.len() - 1))
            }
            KeyCode::Char('a') => {
                self.task_form = TaskForm::new(self.config);
                self.editing_task = None;
                self.state = AppState::AddTask;
            }
            KeyCode::Char('e') => {
                if let Some(task) = self.selected_task() {
                    let form = TaskForm::from_task(task);
                    let id = task.id;
                    self.task_form = form;
                    self.editing_task = Some(id);
                    self.state = AppState::EditTask;
                }
            }
            KeyCode::Char(' ') | KeyCode::Char('c') => {
                if let Some(id) = self.selected_task_id() {
                    self.store.toggle_done(id);
                    self.refresh_visible();
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_task_id() {
                    self.confirm_action = Some(ConfirmAction::DeleteTask(id));
                    self.state = AppState::Confirm;
                }
            }
            KeyCode::Char('o') => {
                if let Some(id) = self.selected_task_id() {
                    self.store.toggle_subtask_visibility(id);
                }
            }
            KeyCode::Enter => {
                if let Some(id) = self.selected_task_id() {
                    self.detail_task = Some(id);
                    let has_subtasks = self
                        .store
                        .tasks()
                        .get(id)
                        .is_some_and(|t| !t.subtasks.is_empty());
                    self.subtask_state.select(has_subtasks.then_some(0));
                    self.state = AppState::TaskDetail;
                }
            }
            KeyCode::Char('s') => {
                self.query.mode = self.query.mode.cycle();
                self.refresh_visible();
                self.set_status_message(format!("Order: {}", mode_label(self.query.mode)));
            }
            KeyCode::Char('f') => {
                self.query.category = self.query.category.cycle();
                self.refresh_visible();
                self.set_status_message(format!(
                    "Category: {}",
                    category_label(self.query.category)
                ));
            }
            KeyCode::Char('/') => {
                let current = self.query.search.clone();
                self.open_prompt(InputMode::Search, &current);
            }
            KeyCode::Char('#') => self.open_prompt(InputMode::TagFilter, ""),
            KeyCode::Char('x') => {
                self.query.clear_tags();
                self.refresh_visible();
                self.set_status_message("Tag filters cleared");
            }
            KeyCode::Char('t') => {
                let dark = self.store.toggle_dark_mode();
                self.set_status_message(if dark { "Dark theme" } else { "Light theme" });
            }
            KeyCode::Char('h') | KeyCode::F(1) => self.state = AppState::Help,
            _ => {}
        }
        false
    }

    fn handle_detail_input(&mut self, key: KeyEvent) -> bool {
        let Some(task_id) = self.detail_task.filter(|id| self.store.tasks().get(*id).is_some())
        else {
            self.state = AppState::TaskList;
            self.refresh_visible();
            return false;
        };
        let count = self.current_detail().map_or(0, |t| t.subtasks.len());

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Esc | KeyCode::Char('q') => {
                self.state = AppState::TaskList;
                self.refresh_visible();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(i) = self.subtask_state.selected() {
                    self.subtask_state.select(Some(i.saturating_sub(1)));
                }
            }
            KeyCode::Down | KeyCode::Char('j') => match self.subtask_state.selected() {
                Some(i) if i + 1 < count => self.subtask_state.select(Some(i + 1)),
                None if count > 0 => self.subtask_state.select(Some(0)),
                _ => {}
            },
            KeyCode::Char('n') => self.open_prompt(InputMode::NewSubtask, ""),
            KeyCode::Char(' ') => {
                if let Some(sub) = self.selected_subtask_id() {
                    self.store.toggle_subtask(task_id, sub);
                }
            }
            KeyCode::Char('e') => {
                let selected = self
                    .current_detail()
                    .zip(self.selected_subtask_id())
                    .and_then(|(t, sub)| t.subtask(sub))
                    .map(|s| (s.id, s.text.clone()));
                if let Some((sub, text)) = selected {
                    self.open_prompt(InputMode::EditSubtask(sub), &text);
                }
            }
            KeyCode::Char('d') => {
                if let Some(subtask) = self.selected_subtask_id() {
                    self.confirm_action = Some(ConfirmAction::DeleteSubtask {
                        task: task_id,
                        subtask,
                    });
                    self.state = AppState::Confirm;
                }
            }
            KeyCode::Char('o') => {
                self.store.toggle_subtask_visibility(task_id);
            }
            KeyCode::Char('c') => {
                self.store.toggle_done(task_id);
            }
            _ => {}
        }
        false
    }

    fn handle_prompt_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                if self.input_mode == InputMode::Search {
                    self.query.search.clear();
                    self.refresh_visible();
                }
                self.input_mode = InputMode::None;
                self.prompt.clear();
                return;
            }
            KeyCode::Enter => {
                self.submit_prompt();
                return;
            }
            KeyCode::Backspace => self.prompt.handle_backspace(),
            KeyCode::Delete => self.prompt.handle_delete(),
            KeyCode::Left => self.prompt.move_cursor_left(),
            KeyCode::Right => self.prompt.move_cursor_right(),
            KeyCode::Home => self.prompt.move_home(),
            KeyCode::End => self.prompt.move_end(),
            KeyCode::Char(c) => self.prompt.handle_char(c),
            _ => return,
        }
        if self.input_mode == InputMode::Search {
            self.query.search = self.prompt.value.clone();
            self.refresh_visible();
        }
    }

    fn submit_prompt(&mut self) {
        let text = self.prompt.value.trim().to_string();
        match self.input_mode {
            InputMode::None => {}
            InputMode::Search => {
                self.set_status_message(if text.is_empty() {
                    "Search cleared".to_string()
                } else {
                    format!("Search '{}': {} task(s)", text, self.visible.len())
                });
            }
            InputMode::TagFilter => {
                if !text.is_empty() {
                    self.query.toggle_tag(&text);
                    self.refresh_visible();
                }
                self.set_status_message(if self.query.tags.is_empty() {
                    "No tag filters".to_string()
                } else {
                    format!("Tags: {}", self.query.tags.join(", "))
                });
            }
            InputMode::NewSubtask => {
                if text.is_empty() {
                    self.set_status_message("Subtask text cannot be empty");
                    return;
                }
                if let Some(task_id) = self.detail_task {
                    if self.store.add_subtask(task_id, &text).is_some() {
                        let last = self.current_detail().map_or(0, |t| t.subtasks.len());
                        self.subtask_state.select(last.checked_sub(1));
                    }
                }
            }
            InputMode::EditSubtask(sub) => {
                if text.is_empty() {
                    self.set_status_message("Subtask text cannot be empty");
                    return;
                }
                if let Some(task_id) = self.detail_task {
                    self.store.edit_subtask(task_id, sub, &text);
                }
            }
        }
        self.input_mode = InputMode::None;
        self.prompt.clear();
    }

    fn handle_form_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.state = AppState::TaskList;
                self.set_status_message("Cancelled");
            }
            KeyCode::Tab | KeyCode::Down => self.task_form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.task_form.prev_field(),
            KeyCode::Left => self.task_form.handle_left_right(false),
            KeyCode::Right => self.task_form.handle_left_right(true),
            KeyCode::Backspace => self.task_form.handle_backspace(),
            KeyCode::Delete => self.task_form.handle_delete(),
            KeyCode::Enter => self.submit_form(),
            KeyCode::Char(c) => self.task_form.handle_char(c),
            _ => {}
        }
    }

    fn submit_form(&mut self) {
        let draft = match self.task_form.to_new_task() {
            Ok(draft) => draft,
            Err(e) => {
                self.set_status_message(e.to_string());
                return;
            }
        };
        match self.editing_task {
            None => {
                let Some(id) = self.store.add(&draft) else {
                    self.set_status_message("Task text is required");
                    return;
                };
                debug!(id, "task added from form");
                self.refresh_visible();
                self.select_id(id);
                self.set_status_message("Task added");
            }
            Some(id) => {
                let changed = self.store.update(id, &draft);
                self.refresh_visible();
                self.set_status_message(if changed { "Task updated" } else { "No changes" });
            }
        }
        self.state = AppState::TaskList;
    }

    fn handle_confirm_input(&mut self, key: KeyEvent) {
        let Some(action) = self.confirm_action else {
            self.state = AppState::TaskList;
            return;
        };
        let back = match action {
            ConfirmAction::DeleteTask(_) => AppState::TaskList,
            ConfirmAction::DeleteSubtask { .. } => AppState::TaskDetail,
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                match action {
                    ConfirmAction::DeleteTask(id) => {
                        self.store.delete(id);
                        self.refresh_visible();
                        self.set_status_message("Task deleted");
                    }
                    ConfirmAction::DeleteSubtask { task, subtask } => {
                        self.store.delete_subtask(task, subtask);
                        let count = self.current_detail().map_or(0, |t| t.subtasks.len());
                        let sel = self.subtask_state.selected().map(|i| i.min(count.saturating_sub(1)));
                        self.subtask_state.select(if count == 0 { None } else { sel });
                        self.set_status_message("Subtask deleted");
                    }
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.set_status_message("Cancelled");
            }
            _ => return,
        }
        self.confirm_action = None;
        self.state = back;
    }

    /// Apply one key press. Returns true when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        self.clear_status_message();
        if self.input_mode != InputMode::None {
            self.handle_prompt_input(key);
            return false;
        }
        match self.state {
            AppState::TaskList => return self.handle_task_list_input(key),
            AppState::TaskDetail => return self.handle_detail_input(key),
            AppState::AddTask | AppState::EditTask => self.handle_form_input(key),
            AppState::Help => self.state = AppState::TaskList,
            AppState::Confirm => self.handle_confirm_input(key),
        }
        false
    }

    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.handle_key(key));
                }
            }
        }
        Ok(false)
    }

    fn view_summary(&self) -> String {
        let mut parts = vec![
            format!("Order: {}", mode_label(self.query.mode)),
            format!("Category: {}", category_label(self.query.category)),
        ];
        if !self.query.tags.is_empty() {
            parts.push(format!("Tags: {}", self.query.tags.join(", ")));
        }
        if !self.query.search.is_empty() {
            parts.push(format!("Search: '{}'", self.query.search));
        }
        parts.join("  |  ")
    }

    fn render_task_list(&mut self, f: &mut Frame, area: Rect, p: &Palette) {
        let today = Local::now().date_naive();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let header = Paragraph::new(Line::from(vec![
            Span::styled(
                "TO-DO",
                Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                self.view_summary(),
                Style::default().add_modifier(Modifier::ITALIC),
            ),
        ]))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
        f.render_widget(header, chunks[0]);

        let total = self.store.tasks().len();
        if self.visible.is_empty() {
            let msg = if total == 0 {
                "No tasks yet. Press 'a' to add one."
            } else {
                "No tasks match the current filters."
            };
            let empty = Paragraph::new(msg)
                .style(Style::default().fg(p.muted))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("Tasks"));
            f.render_widget(empty, chunks[1]);
            return;
        }

        let tasks = self.store.tasks();
        let rows: Vec<Row> = self
            .visible
            .iter()
            .filter_map(|&id| tasks.get(id))
            .map(|task| task_row(task, today, p))
            .collect();

        let header = Row::new(["", "Pri", "Category", "Due", "Task", "Subtasks"].map(|h| {
            Cell::from(h).style(Style::default().add_modifier(Modifier::BOLD))
        }))
        .style(Style::default().fg(p.status_fg).bg(p.status_bg))
        .height(1);

        let widths = [
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Length(9),
            Constraint::Length(10),
            Constraint::Min(20),
            Constraint::Length(9),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(format!(
                "Tasks ({}/{}) - Press 'h' for help",
                self.visible.len(),
                total
            )))
            .row_highlight_style(Style::default().bg(p.highlight_bg).fg(p.highlight_fg))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, chunks[1], &mut self.task_list_state);
    }

    fn render_task_detail(&mut self, f: &mut Frame, area: Rect, p: &Palette) {
        let Some(task) = self.current_detail().cloned() else {
            return;
        };
        let today = Local::now().date_naive();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(10), Constraint::Min(3)])
            .split(area);

        let label = Style::default().fg(p.accent).add_modifier(Modifier::BOLD);
        let due = match task.due_date {
            Some(d) => format!("{d} ({})", format_due_relative(Some(d), today)),
            None => "-".into(),
        };
        let due_style = if task.is_overdue(today) {
            Style::default().fg(p.overdue)
        } else {
            Style::default()
        };
        let info = vec![
            Line::from(vec![Span::styled("Task:        ", label), Span::raw(task.text.clone())]),
            Line::from(vec![
                Span::styled("Status:      ", label),
                Span::raw(if task.done { "done" } else { "open" }),
            ]),
            Line::from(vec![
                Span::styled("Category:    ", label),
                Span::styled(task.category.as_str(), Style::default().fg(p.category(task.category))),
            ]),
            Line::from(vec![
                Span::styled("Priority:    ", label),
                Span::styled(task.priority.as_str(), Style::default().fg(p.priority(task.priority))),
            ]),
            Line::from(vec![Span::styled("Due:         ", label), Span::styled(due, due_style)]),
            Line::from(vec![
                Span::styled("Tags:        ", label),
                Span::raw(if task.tags.is_empty() { "-".into() } else { task.tags.join(", ") }),
            ]),
            Line::from(vec![
                Span::styled("Description: ", label),
                Span::raw(task.description.clone().unwrap_or_else(|| "-".into())),
            ]),
        ];
        let info = Paragraph::new(info)
            .block(Block::default().borders(Borders::ALL).title("Task Details"))
            .wrap(Wrap { trim: true });
        f.render_widget(info, chunks[0]);

        let items: Vec<ListItem> = task
            .subtasks
            .iter()
            .map(|s| {
                let style = if s.done {
                    Style::default().fg(p.muted).add_modifier(Modifier::CROSSED_OUT)
                } else {
                    Style::default()
                };
                ListItem::new(format!("{} {}", checkbox(s.done), s.text)).style(style)
            })
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(format!(
                "Subtasks ({}) - n new, Space toggle, e edit, d delete, Esc back",
                format_progress(&task)
            )))
            .highlight_style(Style::default().bg(p.highlight_bg).fg(p.highlight_fg))
            .highlight_symbol(">> ");
        f.render_stateful_widget(list, chunks[1], &mut self.subtask_state);
    }

    fn render_task_form(&mut self, f: &mut Frame, area: Rect, p: &Palette) {
        let is_edit = self.state == AppState::EditTask;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(1),
            ])
            .split(area);

        let form = &self.task_form;
        let border = |order: usize| {
            if form.current_field == order {
                Style::default().fg(p.accent)
            } else {
                Style::default()
            }
        };

        let inputs = [
            (TEXT_ORDER, "Text *", &form.text),
            (DESCRIPTION_ORDER, "Description", &form.description),
            (TAGS_ORDER, "Tags (comma separated)", &form.tags),
            (DUE_ORDER, "Due (YYYY-MM-DD, today, tomorrow, in 3d, friday)", &form.due),
        ];
        for (order, title, field) in inputs {
            let widget = Paragraph::new(field.value.as_str()).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(border(order)),
            );
            f.render_widget(widget, chunks[order]);
            if form.current_field == order {
                let x = chunks[order].x + 1 + field.cursor as u16;
                f.set_cursor_position((x.min(chunks[order].right().saturating_sub(2)), chunks[order].y + 1));
            }
        }

        let category = selector_line(
            Category::ALL.iter().map(|c| c.as_str()),
            form.category,
            p,
        );
        f.render_widget(
            Paragraph::new(category).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Category")
                    .border_style(border(CATEGORY_ORDER)),
            ),
            chunks[CATEGORY_ORDER],
        );
        let priority = selector_line(
            Priority::ALL.iter().map(|pr| pr.as_str()),
            form.priority,
            p,
        );
        f.render_widget(
            Paragraph::new(priority).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Priority")
                    .border_style(border(PRIORITY_ORDER)),
            ),
            chunks[PRIORITY_ORDER],
        );

        let instructions = Paragraph::new(
            "Tab/Up/Down move between fields  Left/Right change selectors  Enter save  Esc cancel",
        )
        .style(Style::default().fg(p.muted))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(if is_edit { "Edit Task" } else { "New Task" }),
        );
        f.render_widget(instructions, chunks[6]);
    }

    fn render_help(&self, f: &mut Frame, area: Rect, p: &Palette) {
        let heading = Style::default().fg(p.accent).add_modifier(Modifier::BOLD);
        let help_text = vec![
            Line::from(Span::styled("Task List", heading)),
            Line::from("  Up/Down, k/j        Select task"),
            Line::from("  a                   Add task"),
            Line::from("  e                   Edit task"),
            Line::from("  Space / c           Toggle done"),
            Line::from("  d                   Delete task"),
            Line::from("  Shift+Up/Down, K/J  Move task (manual order only)"),
            Line::from("  o                   Show/hide subtasks"),
            Line::from("  Enter               Task details and subtasks"),
            Line::from("  s                   Cycle order: manual, text, category, completion, due date"),
            Line::from("  f                   Cycle category filter"),
            Line::from("  /                   Search task text"),
            Line::from("  #                   Toggle a tag filter"),
            Line::from("  x                   Clear tag filters"),
            Line::from("  t                   Toggle dark/light theme"),
            Line::from("  q / Esc             Quit"),
            Line::from(""),
            Line::from(Span::styled("Task Details", heading)),
            Line::from("  n                   New subtask"),
            Line::from("  Space               Toggle subtask"),
            Line::from("  e                   Edit subtask"),
            Line::from("  d                   Delete subtask"),
            Line::from("  c / o               Toggle done / subtask visibility"),
            Line::from("  Esc / q             Back to list"),
            Line::from(""),
            Line::from(Span::styled("Due Date Formats", heading)),
            Line::from("  YYYY-MM-DD, today, tomorrow, in 3d, in 2w, friday, next monday"),
        ];
        let paragraph = Paragraph::new(help_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Help - Press any key to return"),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
    }

    fn confirm_text(&self, action: ConfirmAction) -> String {
        let tasks = self.store.tasks();
        match action {
            ConfirmAction::DeleteTask(id) => match tasks.get(id) {
                Some(t) if !t.subtasks.is_empty() => format!(
                    "Delete '{}' and its {} subtask(s)?",
                    t.text,
                    t.subtasks.len()
                ),
                Some(t) => format!("Delete '{}'?", t.text),
                None => "Delete task?".into(),
            },
            ConfirmAction::DeleteSubtask { task, subtask } => tasks
                .get(task)
                .and_then(|t| t.subtask(subtask))
                .map_or_else(|| "Delete subtask?".into(), |s| format!("Delete subtask '{}'?", s.text)),
        }
    }

    fn render_confirm(&self, f: &mut Frame, area: Rect, p: &Palette) {
        let Some(action) = self.confirm_action else {
            return;
        };
        let area = centered_rect(50, 20, area);
        f.render_widget(Clear, area);
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                self.confirm_text(action),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];
        let paragraph = Paragraph::new(text)
            .block(
                Block::default()
                    .title("Confirm")
                    .borders(Borders::ALL)
                    .style(Style::default().bg(p.danger).fg(p.fg)),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect, p: &Palette) {
        let style = Style::default().bg(p.status_bg).fg(p.status_fg);
        let label = match self.input_mode {
            InputMode::None => None,
            InputMode::Search => Some("Search: ".to_string()),
            InputMode::TagFilter => {
                let tags = available_tags(self.store.tasks());
                Some(if tags.is_empty() {
                    "Tag (none in use): ".to_string()
                } else {
                    format!("Tag [{}]: ", tags.join(" "))
                })
            }
            InputMode::NewSubtask => Some("New subtask: ".to_string()),
            InputMode::EditSubtask(_) => Some("Edit subtask: ".to_string()),
        };

        if let Some(label) = label {
            let width = label.chars().count() as u16;
            let line = Line::from(vec![
                Span::styled(label, style.add_modifier(Modifier::BOLD)),
                Span::raw(self.prompt.value.clone()),
            ]);
            f.render_widget(Paragraph::new(line).style(style), area);
            if !self.status_message.is_empty() {
                let hint = Paragraph::new(self.status_message.as_str())
                    .style(style)
                    .alignment(Alignment::Right);
                f.render_widget(hint, area);
            }
            let x = (area.x + width + self.prompt.cursor as u16).min(area.right().saturating_sub(1));
            f.set_cursor_position((x, area.y));
            return;
        }

        let text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            match self.state {
                AppState::TaskList => format!(
                    "Tasks: {} | Theme: {} | Press 'h' for help",
                    self.visible.len(),
                    if self.store.dark_mode() { "dark" } else { "light" }
                ),
                AppState::TaskDetail => "Task Details".to_string(),
                AppState::AddTask => "Add New Task".to_string(),
                AppState::EditTask => "Edit Task".to_string(),
                AppState::Help => "Help".to_string(),
                AppState::Confirm => "Confirm Action".to_string(),
            }
        };
        f.render_widget(Paragraph::new(text).style(style), area);
    }

    fn render(&mut self, f: &mut Frame) {
        let p = Palette::for_mode(self.store.dark_mode());
        f.render_widget(
            Block::default().style(Style::default().bg(p.bg).fg(p.fg)),
            f.area(),
        );
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        match self.state {
            AppState::TaskList => self.render_task_list(f, chunks[0], &p),
            AppState::TaskDetail => self.render_task_detail(f, chunks[0], &p),
            AppState::AddTask | AppState::EditTask => self.render_task_form(f, chunks[0], &p),
            AppState::Help => self.render_help(f, chunks[0], &p),
            AppState::Confirm => {
                match self.confirm_action {
                    Some(ConfirmAction::DeleteSubtask { .. }) => {
                        self.render_task_detail(f, chunks[0], &p)
                    }
                    _ => self.render_task_list(f, chunks[0], &p),
                }
                self.render_confirm(f, chunks[0], &p);
            }
        }

        self.render_status_bar(f, chunks[1], &p);
    }

    /// Main event loop: draw, then apply one key, until the user quits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

fn task_row(task: &Task, today: NaiveDate, p: &Palette) -> Row<'static> {
    let text_style = if task.done {
        Style::default().fg(p.muted).add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default().fg(p.fg)
    };
    let mut lines = vec![Line::styled(
        format!("{}{}", task.text, format_tags(&task.tags)),
        text_style,
    )];
    if task.show_subtasks {
        for s in &task.subtasks {
            let style = if s.done {
                Style::default().fg(p.muted)
            } else {
                Style::default().fg(p.fg)
            };
            lines.push(Line::styled(format!("  {} {}", checkbox(s.done), s.text), style));
        }
    }
    let height = lines.len() as u16;

    let due_style = if task.is_overdue(today) {
        Style::default().fg(p.overdue).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let expander = if task.subtasks.is_empty() {
        " "
    } else if task.show_subtasks {
        "▾"
    } else {
        "▸"
    };

    Row::new(vec![
        Cell::from(checkbox(task.done)),
        Cell::from(task.priority.as_str()).style(Style::default().fg(p.priority(task.priority))),
        Cell::from(task.category.as_str()).style(Style::default().fg(p.category(task.category))),
        Cell::from(format_due_relative(task.due_date, today)).style(due_style),
        Cell::from(Text::from(lines)),
        Cell::from(format!("{expander} {}", format_progress(task))),
    ])
    .height(height)
}

fn selector_line<'s>(
    options: impl Iterator<Item = &'s str>,
    selected: usize,
    p: &Palette,
) -> Line<'s> {
    let mut spans = vec![Span::raw("< ")];
    for (i, option) in options.enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        let style = if i == selected {
            Style::default()
                .fg(p.highlight_fg)
                .bg(p.highlight_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(p.muted)
        };
        spans.push(Span::styled(option, style));
    }
    spans.push(Span::raw(" >"));
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::task::NewTask;

    fn press(app: &mut App<'_, MemoryStore>, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App<'_, MemoryStore>, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn seeded(texts: &[&str]) -> TaskStore<MemoryStore> {
        let mut store = TaskStore::load(MemoryStore::new());
        for text in texts {
            store.add(&NewTask::new(*text));
        }
        store
    }

    fn order(store: &TaskStore<MemoryStore>) -> Vec<String> {
        store.tasks().iter().map(|t| t.text.clone()).collect()
    }

    #[test]
    fn test_add_task_through_form() {
        let mut store = seeded(&[]);
        let config = Config::default();
        let mut app = App::new(&mut store, &config);
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.state, AppState::AddTask);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::AddTask);
        assert!(!app.status_message.is_empty());

        type_text(&mut app, "Buy milk");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "shop");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::TaskList);
        assert_eq!(app.visible.len(), 1);
        let task = &app.store.tasks().tasks()[0];
        assert_eq!(task.text, "Buy milk");
        assert_eq!(task.tags, vec!["shop"]);
    }

    #[test]
    fn test_edit_task_through_form() {
        let mut store = seeded(&["old"]);
        let config = Config::default();
        let mut app = App::new(&mut store, &config);
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.state, AppState::EditTask);
        type_text(&mut app, "er");
        for _ in 0..4 {
            press(&mut app, KeyCode::Tab);
        }
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);
        let task = &app.store.tasks().tasks()[0];
        assert_eq!(task.text, "older");
        assert_eq!(task.category, Category::School);
    }

    #[test]
    fn test_move_only_in_manual_mode() {
        let mut store = seeded(&["b", "a"]);
        let config = Config::default();
        let mut app = App::new(&mut store, &config);

        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.query.mode, ViewMode::Sorted(SortKey::Text));
        press(&mut app, KeyCode::Char('J'));
        assert!(app.status_message.contains("manual"));
        assert_eq!(order(&*app.store), vec!["b", "a"]);

        for _ in 0..4 {
            press(&mut app, KeyCode::Char('s'));
        }
        assert_eq!(app.query.mode, ViewMode::Manual);
        press(&mut app, KeyCode::Char('J'));
        assert_eq!(order(&*app.store), vec!["a", "b"]);
        assert_eq!(app.task_list_state.selected(), Some(1));

        app.handle_key(KeyEvent::new(KeyCode::Up, KeyModifiers::SHIFT));
        assert_eq!(order(&*app.store), vec!["b", "a"]);
    }

    #[test]
    fn test_toggle_and_delete_with_confirm() {
        let mut store = seeded(&["only"]);
        let config = Config::default();
        let mut app = App::new(&mut store, &config);
        press(&mut app, KeyCode::Char(' '));
        assert!(app.store.tasks().tasks()[0].done);

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.state, AppState::Confirm);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.state, AppState::TaskList);
        assert_eq!(app.store.tasks().len(), 1);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.store.tasks().is_empty());
        assert!(app.visible.is_empty());
        assert_eq!(app.task_list_state.selected(), None);
    }

    #[test]
    fn test_subtasks_in_detail_view() {
        let mut store = seeded(&["parent"]);
        let config = Config::default();
        let mut app = App::new(&mut store, &config);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::TaskDetail);

        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input_mode, InputMode::NewSubtask);
        assert!(app.current_detail().unwrap().subtasks.is_empty());

        type_text(&mut app, "child");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input_mode, InputMode::None);
        assert_eq!(app.subtask_state.selected(), Some(0));

        press(&mut app, KeyCode::Char(' '));
        assert!(app.current_detail().unwrap().subtasks[0].done);

        press(&mut app, KeyCode::Char('e'));
        type_text(&mut app, "!");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.current_detail().unwrap().subtasks[0].text, "child!");

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.state, AppState::TaskDetail);
        assert!(app.current_detail().unwrap().subtasks.is_empty());

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state, AppState::TaskList);
    }

    #[test]
    fn test_search_and_tag_filters() {
        let mut store = seeded(&["Buy milk", "Call mom"]);
        let id = store.tasks().tasks()[1].id;
        store.update(
            id,
            &NewTask {
                text: "Call mom".into(),
                tags: vec!["phone".into()],
                ..NewTask::default()
            },
        );
        let config = Config::default();
        let mut app = App::new(&mut store, &config);

        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "MILK");
        assert_eq!(app.visible.len(), 1);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.visible.len(), 2);
        assert!(app.query.search.is_empty());

        press(&mut app, KeyCode::Char('#'));
        type_text(&mut app, "Phone");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.query.tags, vec!["phone"]);
        assert_eq!(app.visible, vec![id]);

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.visible.len(), 2);

        press(&mut app, KeyCode::Char('f'));
        assert_eq!(app.query.category, CategoryFilter::Only(Category::Work));
    }

    #[test]
    fn test_theme_toggle_and_quit() {
        let mut store = seeded(&[]);
        let config = Config::default();
        let mut app = App::new(&mut store, &config);
        assert!(app.store.dark_mode());
        press(&mut app, KeyCode::Char('t'));
        assert!(!app.store.dark_mode());
        assert!(press(&mut app, KeyCode::Char('q')));
    }
}
