//! # todo - to-do list CLI and TUI
//!
//! A small local task manager: tasks with a category, a priority, tags, an
//! optional due date and a checklist of subtasks, kept in a manual order that
//! can be rearranged by hand.
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the terminal UI
//! todo ui
//!
//! # Add a task via CLI
//! todo add "Buy milk" --category personal --tag shopping --due tomorrow
//!
//! # List tasks, sorted by due date
//! todo list --sort due-date
//!
//! # Break a task down
//! todo subtask add 1760000000000 "Check the fridge first"
//! ```
//!
//! Data is stored as JSON in the platform data directory (`~/.local/share/todo`
//! on Linux), one file per key: `todos.json` and `darkMode.json`. Settings are
//! read from `<config dir>/todo/config.toml`.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod cmd;
pub mod config;
pub mod display;
pub mod error;
pub mod fields;
pub mod parse;
pub mod storage;
pub mod store;
pub mod task;
pub mod view;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod task_form;
    pub mod utils;
}

use cli::Cli;
use cmd::*;
use config::Config;
use error::Result;
use storage::FileStore;
use store::TaskStore;

const LOG_FILE: &str = "todo.log";

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Completions need neither config nor data.
    if let Commands::Completions { shell } = cli.command {
        cmd_completions(shell);
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref())?;
    let data_dir = config.resolve_data_dir(cli.data_dir.as_deref());
    let log_to_file = matches!(cli.command, Commands::Ui);
    install_tracing(&config, log_to_file.then_some(data_dir.as_path()));

    let mut store = TaskStore::load(FileStore::new(&data_dir));

    match cli.command {
        Commands::Ui => cmd_ui(&mut store, &config),
        Commands::Add {
            text,
            desc,
            category,
            priority,
            tags,
            due,
        } => cmd_add(&mut store, &config, text, desc, category, priority, tags, due),
        Commands::List {
            search,
            category,
            tags,
            sort,
            subtasks,
        } => cmd_list(&store, search, category, tags, sort, subtasks),
        Commands::View { id } => cmd_view(&store, id),
        Commands::Edit {
            id,
            text,
            desc,
            category,
            priority,
            due,
            clear_due,
            add_tags,
            rm_tags,
        } => cmd_edit(
            &mut store, id, text, desc, category, priority, due, clear_due, add_tags, rm_tags,
        ),
        Commands::Done { id } => cmd_done(&mut store, id),
        Commands::Delete { id } => cmd_delete(&mut store, id),
        Commands::ClearCompleted => cmd_clear_completed(&mut store),
        Commands::Move { from, to } => cmd_move(&mut store, from, to),
        Commands::Expand { id } => cmd_expand(&mut store, id),
        Commands::Subtask { action } => cmd_subtask(&mut store, action),
        Commands::Tags => cmd_tags(&store),
        Commands::Theme { theme } => cmd_theme(&mut store, theme),
        Commands::Completions { .. } => unreachable!("completions handled above"),
    }
}

/// `RUST_LOG` wins over the configured filter; the default is `warn`.
fn log_filter(config: &Config) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = config.log_filter.as_deref().unwrap_or("warn");
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("warn"))
    })
}

/// Log to stderr, or to `<log_dir>/todo.log` while the TUI owns the terminal.
fn install_tracing(config: &Config, log_dir: Option<&Path>) {
    let filter = log_filter(config);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact();

    let file = log_dir.and_then(|dir| {
        std::fs::create_dir_all(dir).ok()?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(LOG_FILE))
            .ok()
    });
    let _ = match file {
        Some(file) => builder.with_ansi(false).with_writer(Mutex::new(file)).try_init(),
        None => builder.with_writer(std::io::stderr).try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Category, SortOrder};

    #[test]
    fn parse_add_command() {
        let cli = Cli::parse_from([
            "todo",
            "--data-dir",
            "/tmp/todo",
            "add",
            "Buy milk",
            "--category",
            "personal",
            "--tag",
            "shop,food",
            "--due",
            "tomorrow",
        ]);
        assert_eq!(cli.data_dir.as_deref(), Some(Path::new("/tmp/todo")));
        match cli.command {
            Commands::Add {
                text,
                category,
                tags,
                due,
                ..
            } => {
                assert_eq!(text, "Buy milk");
                assert_eq!(category, Some(Category::Personal));
                assert_eq!(tags, vec!["shop,food"]);
                assert_eq!(due.as_deref(), Some("tomorrow"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_list_sort() {
        let cli = Cli::parse_from(["todo", "list", "--sort", "due-date", "--tag", "a"]);
        match cli.command {
            Commands::List { sort, tags, .. } => {
                assert_eq!(sort, SortOrder::DueDate);
                assert_eq!(tags, vec!["a"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_subtask_edit() {
        let cli = Cli::parse_from(["todo", "subtask", "edit", "1", "2", "new text"]);
        match cli.command {
            Commands::Subtask {
                action: SubtaskAction::Edit { task, subtask, text },
            } => {
                assert_eq!((task, subtask), (1, 2));
                assert_eq!(text, "new text");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn edit_rejects_due_with_clear_due() {
        let result = Cli::try_parse_from(["todo", "edit", "1", "--due", "today", "--clear-due"]);
        assert!(result.is_err());
    }

    #[test]
    fn theme_argument_is_optional() {
        let cli = Cli::parse_from(["todo", "theme"]);
        assert!(matches!(cli.command, Commands::Theme { theme: None }));
        let cli = Cli::parse_from(["todo", "theme", "light"]);
        assert!(matches!(cli.command, Commands::Theme { theme: Some(Theme::Light) }));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
