use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// File-backed to-do list with a terminal UI.
/// Data lives in the platform data directory unless --data-dir or the config
/// file says otherwise.
#[derive(Parser, Debug)]
#[command(name = "todo", version, about = "To-do list with categories, tags and subtasks")]
pub struct Cli {
    /// Directory holding the stored tasks.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Path to a config file (default: <config dir>/todo/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
