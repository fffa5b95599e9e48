//! Command handlers behind the `todo` subcommands.
//!
//! Each handler runs one store operation, checks the input the store would
//! silently ignore (blank text, unknown ids) and reports the outcome on stdout.

use clap::{Subcommand, ValueEnum};
use clap_complete::{generate, Shell};

use chrono::{Local, NaiveDate};

use crate::config::Config;
use crate::display::*;
use crate::error::{Result, TodoError};
use crate::fields::{Category, Priority, SortOrder};
use crate::parse::{parse_due_input, split_and_normalise_tags};
use crate::storage::FileStore;
use crate::store::TaskStore;
use crate::task::{NewTask, Task};
use crate::tui::run::run_tui;
use crate::view::{project, tag_counts, ViewQuery};

pub type Store = TaskStore<FileStore>;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive terminal UI.
    Ui,

    /// Add a new task.
    Add {
        /// What needs doing.
        text: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Category (default from config, else work).
        #[arg(long, value_enum)]
        category: Option<Category>,
        /// Priority (default from config, else medium).
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Comma-separated tags. May be repeated.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", "in Nd", "in Nw" or a weekday.
        #[arg(long)]
        due: Option<String>,
    },

    /// List tasks with optional filters.
    List {
        /// Case-insensitive text search.
        #[arg(long)]
        search: Option<String>,
        /// Only show one category.
        #[arg(long, value_enum)]
        category: Option<Category>,
        /// Require a tag. May be repeated. Accepts comma-separated.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Sort key; `none` keeps the manual order.
        #[arg(long, value_enum, default_value_t = SortOrder::None)]
        sort: SortOrder,
        /// Show subtasks of every task, not only expanded ones.
        #[arg(long)]
        subtasks: bool,
    },

    /// Show a single task.
    View {
        id: u64,
    },

    /// Update fields on a task.
    Edit {
        id: u64,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long, value_enum)]
        category: Option<Category>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        /// Remove the due date.
        #[arg(long)]
        clear_due: bool,
        /// Add tags. May be repeated and comma-separated.
        #[arg(long = "add-tag")]
        add_tags: Vec<String>,
        /// Remove tags. May be repeated and comma-separated.
        #[arg(long = "rm-tag")]
        rm_tags: Vec<String>,
    },

    /// Toggle a task between open and done.
    Done {
        id: u64,
    },

    /// Delete a task and its subtasks.
    Delete {
        id: u64,
    },

    /// Delete every completed task.
    ClearCompleted,

    /// Move a task to another position (1-based, as shown by `list`).
    Move {
        from: usize,
        to: usize,
    },

    /// Show or hide a task's subtasks in listings.
    Expand {
        id: u64,
    },

    /// Manage subtasks.
    Subtask {
        #[command(subcommand)]
        action: SubtaskAction,
    },

    /// List distinct tags and counts.
    Tags,

    /// Show the theme, set it, or toggle it when no value is given.
    Theme {
        #[arg(value_enum)]
        theme: Option<Theme>,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum SubtaskAction {
    /// Add a subtask to a task.
    Add { task: u64, text: String },
    /// Toggle a subtask between open and done.
    Done { task: u64, subtask: u64 },
    /// Delete a subtask.
    Delete { task: u64, subtask: u64 },
    /// Replace a subtask's text.
    Edit {
        task: u64,
        subtask: u64,
        text: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Theme {
    Dark,
    Light,
}

fn theme_name(dark: bool) -> &'static str {
    if dark {
        "dark"
    } else {
        "light"
    }
}

fn require_task(store: &Store, id: u64) -> Result<&Task> {
    store
        .tasks()
        .get(id)
        .ok_or_else(|| TodoError::NotFound(format!("task {id}")))
}

fn require_subtask(store: &Store, task_id: u64, subtask_id: u64) -> Result<()> {
    let task = require_task(store, task_id)?;
    task.subtask(subtask_id)
        .map(|_| ())
        .ok_or_else(|| TodoError::NotFound(format!("subtask {subtask_id} of task {task_id}")))
}

fn require_text(text: &str, what: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(TodoError::InvalidInput(format!("{what} cannot be empty")));
    }
    Ok(())
}

fn parse_due(s: &str) -> Result<NaiveDate> {
    parse_due_input(s).ok_or_else(|| {
        TodoError::InvalidInput(format!(
            "could not parse due date '{s}'; use YYYY-MM-DD, today, tomorrow, in Nd or in Nw"
        ))
    })
}

/// Launch the terminal user interface.
pub fn cmd_ui(store: &mut Store, config: &Config) -> Result<()> {
    run_tui(store, config)?;
    store.flush()
}

/// Add a new task.
#[allow(clippy::too_many_arguments)]
pub fn cmd_add(
    store: &mut Store,
    config: &Config,
    text: String,
    desc: Option<String>,
    category: Option<Category>,
    priority: Option<Priority>,
    tags: Vec<String>,
    due: Option<String>,
) -> Result<()> {
    require_text(&text, "task text")?;
    let due_date = due.as_deref().map(parse_due).transpose()?;
    let draft = NewTask {
        text,
        description: desc.unwrap_or_default(),
        category: category.unwrap_or(config.default_category),
        priority: priority.unwrap_or(config.default_priority),
        tags: split_and_normalise_tags(&tags),
        due_date,
    };
    let id = store
        .add(&draft)
        .ok_or_else(|| TodoError::InvalidInput("task text cannot be empty".into()))?;
    store.flush()?;
    println!("Added task {id}.");
    Ok(())
}

/// List tasks matching the filters.
pub fn cmd_list(
    store: &Store,
    search: Option<String>,
    category: Option<Category>,
    tags: Vec<String>,
    sort: SortOrder,
    subtasks: bool,
) -> Result<()> {
    let query = ViewQuery {
        search: search.unwrap_or_default(),
        category: category.into(),
        tags: split_and_normalise_tags(&tags),
        mode: sort.into(),
    };
    let rows = project(store.tasks(), &query);
    if rows.is_empty() {
        println!("No tasks.");
        return Ok(());
    }
    print_table(store.tasks(), &rows, subtasks);
    Ok(())
}

/// Print every field of one task.
pub fn cmd_view(store: &Store, id: u64) -> Result<()> {
    let task = require_task(store, id)?;
    let today = Local::now().date_naive();
    println!("ID:           {}", task.id);
    println!("Text:         {}", task.text);
    println!("Done:         {}", if task.done { "yes" } else { "no" });
    println!("Category:     {}", task.category.as_str());
    println!("Priority:     {}", task.priority.as_str());
    println!(
        "Due:          {}",
        match task.due_date {
            Some(d) => format!("{d} ({})", format_due_relative(Some(d), today)),
            None => "-".into(),
        }
    );
    println!(
        "Tags:         {}",
        if task.tags.is_empty() { "-".into() } else { task.tags.join(",") }
    );
    println!("Description:\n{}\n", task.description.as_deref().unwrap_or("-"));
    println!("Subtasks ({}):", format_progress(task));
    if task.subtasks.is_empty() {
        println!("  -");
    }
    for s in &task.subtasks {
        println!("  {} {} (#{})", checkbox(s.done), s.text, s.id);
    }
    Ok(())
}

/// Update an existing task's fields.
#[allow(clippy::too_many_arguments)]
pub fn cmd_edit(
    store: &mut Store,
    id: u64,
    text: Option<String>,
    desc: Option<String>,
    category: Option<Category>,
    priority: Option<Priority>,
    due: Option<String>,
    clear_due: bool,
    add_tags: Vec<String>,
    rm_tags: Vec<String>,
) -> Result<()> {
    let task = require_task(store, id)?;
    if let Some(t) = &text {
        require_text(t, "task text")?;
    }
    let due_date = due.as_deref().map(parse_due).transpose()?;

    let mut tags = task.tags.clone();
    tags.extend(split_and_normalise_tags(&add_tags));
    let removed = split_and_normalise_tags(&rm_tags);
    tags.retain(|t| !removed.contains(t));

    let draft = NewTask {
        text: text.unwrap_or_else(|| task.text.clone()),
        description: desc.unwrap_or_else(|| task.description.clone().unwrap_or_default()),
        category: category.unwrap_or(task.category),
        priority: priority.unwrap_or(task.priority),
        tags,
        due_date: if clear_due { None } else { due_date.or(task.due_date) },
    };
    let changed = store.update(id, &draft);
    store.flush()?;

    if changed {
        println!("Updated task {id}.");
    } else {
        println!("No changes.");
    }
    Ok(())
}

/// Toggle a task's done flag.
pub fn cmd_done(store: &mut Store, id: u64) -> Result<()> {
    require_task(store, id)?;
    store.toggle_done(id);
    store.flush()?;
    let done = store.tasks().get(id).is_some_and(|t| t.done);
    println!("Task {id} {}.", if done { "marked done" } else { "reopened" });
    Ok(())
}

/// Delete a task.
pub fn cmd_delete(store: &mut Store, id: u64) -> Result<()> {
    let subtasks = require_task(store, id)?.subtasks.len();
    store.delete(id);
    store.flush()?;
    if subtasks > 0 {
        println!("Deleted task {id} and {subtasks} subtask(s).");
    } else {
        println!("Deleted task {id}.");
    }
    Ok(())
}

/// Delete all completed tasks.
pub fn cmd_clear_completed(store: &mut Store) -> Result<()> {
    let count = store.tasks().iter().filter(|t| t.done).count();
    store.clear_completed();
    store.flush()?;
    println!("Removed {count} completed task(s).");
    Ok(())
}

/// Move the task at position `from` to position `to`, both 1-based.
pub fn cmd_move(store: &mut Store, from: usize, to: usize) -> Result<()> {
    let len = store.tasks().len();
    for pos in [from, to] {
        if pos == 0 || pos > len {
            return Err(TodoError::InvalidInput(format!(
                "position {pos} is out of range (1-{len})"
            )));
        }
    }
    if store.reorder(from - 1, Some(to - 1)) {
        store.flush()?;
        println!("Moved task from position {from} to {to}.");
    } else {
        println!("Nothing to move.");
    }
    Ok(())
}

/// Toggle whether a task's subtasks are shown.
pub fn cmd_expand(store: &mut Store, id: u64) -> Result<()> {
    require_task(store, id)?;
    store.toggle_subtask_visibility(id);
    store.flush()?;
    let shown = store.tasks().get(id).is_some_and(|t| t.show_subtasks);
    println!(
        "Subtasks of task {id} are now {}.",
        if shown { "shown" } else { "hidden" }
    );
    Ok(())
}

/// Handle subtask management commands.
pub fn cmd_subtask(store: &mut Store, action: SubtaskAction) -> Result<()> {
    match action {
        SubtaskAction::Add { task, text } => {
            require_task(store, task)?;
            require_text(&text, "subtask text")?;
            let id = store
                .add_subtask(task, text.trim())
                .ok_or_else(|| TodoError::NotFound(format!("task {task}")))?;
            store.flush()?;
            println!("Added subtask {id} to task {task}.");
        }
        SubtaskAction::Done { task, subtask } => {
            require_subtask(store, task, subtask)?;
            store.toggle_subtask(task, subtask);
            store.flush()?;
            let done = store
                .tasks()
                .get(task)
                .and_then(|t| t.subtask(subtask))
                .is_some_and(|s| s.done);
            println!(
                "Subtask {subtask} {}.",
                if done { "marked done" } else { "reopened" }
            );
        }
        SubtaskAction::Delete { task, subtask } => {
            require_subtask(store, task, subtask)?;
            store.delete_subtask(task, subtask);
            store.flush()?;
            println!("Deleted subtask {subtask}.");
        }
        SubtaskAction::Edit {
            task,
            subtask,
            text,
        } => {
            require_subtask(store, task, subtask)?;
            require_text(&text, "subtask text")?;
            store.edit_subtask(task, subtask, text.trim());
            store.flush()?;
            println!("Updated subtask {subtask}.");
        }
    }
    Ok(())
}

/// List all distinct tags with their usage counts.
pub fn cmd_tags(store: &Store) -> Result<()> {
    let counts = tag_counts(store.tasks());
    if counts.is_empty() {
        println!("No tags.");
        return Ok(());
    }
    println!("{:<16} Count", "Tag");
    for (tag, c) in counts {
        println!("{:<16} {}", truncate(&tag, 16), c);
    }
    Ok(())
}

/// Show, set or toggle the colour theme.
pub fn cmd_theme(store: &mut Store, theme: Option<Theme>) -> Result<()> {
    match theme {
        Some(t) => store.set_dark_mode(t == Theme::Dark),
        None => {
            store.toggle_dark_mode();
        }
    }
    store.flush()?;
    println!("Theme: {}", theme_name(store.dark_mode()));
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &std::path::Path) -> Store {
        TaskStore::load(FileStore::new(dir))
    }

    #[test]
    fn test_add_uses_config_defaults() {
        let dir = tempdir().unwrap();
        let mut store = store_in(dir.path());
        let config = Config {
            default_category: Category::School,
            default_priority: Priority::High,
            ..Config::default()
        };
        cmd_add(
            &mut store,
            &config,
            "Essay".into(),
            None,
            None,
            None,
            vec!["Uni, writing".into()],
            Some("2026-11-01".into()),
        )
        .unwrap();
        let task = &store.tasks().tasks()[0];
        assert_eq!(task.category, Category::School);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.tags, vec!["uni", "writing"]);
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2026, 11, 1));
    }

    #[test]
    fn test_add_rejects_blank_text_and_bad_due() {
        let dir = tempdir().unwrap();
        let mut store = store_in(dir.path());
        let config = Config::default();
        let blank = cmd_add(&mut store, &config, "  ".into(), None, None, None, vec![], None);
        assert!(matches!(blank, Err(TodoError::InvalidInput(_))));
        let bad_due = cmd_add(
            &mut store,
            &config,
            "x".into(),
            None,
            None,
            None,
            vec![],
            Some("someday".into()),
        );
        assert!(matches!(bad_due, Err(TodoError::InvalidInput(_))));
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn test_unknown_ids_are_reported() {
        let dir = tempdir().unwrap();
        let mut store = store_in(dir.path());
        assert!(matches!(cmd_done(&mut store, 42), Err(TodoError::NotFound(_))));
        assert!(matches!(cmd_delete(&mut store, 42), Err(TodoError::NotFound(_))));
        let sub = cmd_subtask(
            &mut store,
            SubtaskAction::Done {
                task: 42,
                subtask: 1,
            },
        );
        assert!(matches!(sub, Err(TodoError::NotFound(_))));
    }

    #[test]
    fn test_edit_and_move_persist() {
        let dir = tempdir().unwrap();
        let mut store = store_in(dir.path());
        let a = store.add(&NewTask::new("a")).unwrap();
        let b = store.add(&NewTask::new("b")).unwrap();

        cmd_edit(
            &mut store,
            a,
            None,
            Some("details".into()),
            Some(Category::Personal),
            None,
            None,
            false,
            vec!["x,y".into()],
            vec![],
        )
        .unwrap();
        cmd_move(&mut store, 2, 1).unwrap();
        assert!(matches!(cmd_move(&mut store, 0, 1), Err(TodoError::InvalidInput(_))));
        assert!(matches!(cmd_move(&mut store, 1, 3), Err(TodoError::InvalidInput(_))));

        let reloaded = store_in(dir.path());
        let order: Vec<u64> = reloaded.tasks().iter().map(|t| t.id).collect();
        assert_eq!(order, vec![b, a]);
        let task = reloaded.tasks().get(a).unwrap();
        assert_eq!(task.text, "a");
        assert_eq!(task.description.as_deref(), Some("details"));
        assert_eq!(task.category, Category::Personal);
        assert_eq!(task.tags, vec!["x", "y"]);
    }

    #[test]
    fn test_subtask_commands() {
        let dir = tempdir().unwrap();
        let mut store = store_in(dir.path());
        let t = store.add(&NewTask::new("parent")).unwrap();
        let empty = cmd_subtask(
            &mut store,
            SubtaskAction::Add {
                task: t,
                text: " ".into(),
            },
        );
        assert!(matches!(empty, Err(TodoError::InvalidInput(_))));

        cmd_subtask(
            &mut store,
            SubtaskAction::Add {
                task: t,
                text: "child".into(),
            },
        )
        .unwrap();
        let sub = store.tasks().get(t).unwrap().subtasks[0].id;
        cmd_subtask(&mut store, SubtaskAction::Done { task: t, subtask: sub }).unwrap();
        assert!(store.tasks().get(t).unwrap().subtasks[0].done);
        cmd_subtask(&mut store, SubtaskAction::Delete { task: t, subtask: sub }).unwrap();
        assert!(store_in(dir.path()).tasks().get(t).unwrap().subtasks.is_empty());
    }

    #[test]
    fn test_theme_set_and_toggle() {
        let dir = tempdir().unwrap();
        let mut store = store_in(dir.path());
        cmd_theme(&mut store, Some(Theme::Light)).unwrap();
        assert!(!store_in(dir.path()).dark_mode());
        cmd_theme(&mut store, None).unwrap();
        assert!(store_in(dir.path()).dark_mode());
    }

    #[test]
    fn test_clear_completed() {
        let dir = tempdir().unwrap();
        let mut store = store_in(dir.path());
        let a = store.add(&NewTask::new("a")).unwrap();
        store.add(&NewTask::new("b")).unwrap();
        cmd_done(&mut store, a).unwrap();
        cmd_clear_completed(&mut store).unwrap();
        assert_eq!(store_in(dir.path()).tasks().len(), 1);
    }
}
