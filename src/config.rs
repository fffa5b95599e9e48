//! User configuration loaded from `<config dir>/todo/config.toml`.
//!
//! Every key is optional:
//!
//! ```toml
//! data_dir = "/home/me/notes/todo"
//! default_category = "personal"
//! default_priority = "high"
//! log_filter = "todo_list=debug"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, TodoError};
use crate::fields::{Category, Priority};

const APP_DIR: &str = "todo";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding the stored tasks and theme preference.
    pub data_dir: Option<PathBuf>,
    /// Category preselected for new tasks.
    pub default_category: Category,
    /// Priority preselected for new tasks.
    pub default_priority: Priority,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

impl Config {
    /// Location of the config file in the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from `explicit` if given, otherwise from the default location.
    ///
    /// A missing default file yields the defaults; a missing explicit file is
    /// an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            TodoError::Io(io::Error::new(
                e.kind(),
                format!("failed to read {}: {e}", path.display()),
            ))
        })?;
        Self::from_toml(&contents, path)
    }

    fn from_toml(contents: &str, path: &Path) -> Result<Self> {
        toml::from_str(contents).map_err(|source| TodoError::Config {
            path: path.display().to_string(),
            source,
        })
    }

    /// Data directory: `override_dir`, then the configured one, then the
    /// platform data directory, then `~/.todo`.
    pub fn resolve_data_dir(&self, override_dir: Option<&Path>) -> PathBuf {
        if let Some(dir) = override_dir {
            return dir.to_path_buf();
        }
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        if let Some(dir) = dirs::data_dir() {
            return dir.join(APP_DIR);
        }
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".todo")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::from_toml("", Path::new("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.default_category, Category::Work);
        assert_eq!(config.default_priority, Priority::Medium);
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
            data_dir = "/tmp/todo-data"
            default_category = "school"
            default_priority = "high"
            log_filter = "debug"
        "#;
        let config = Config::from_toml(toml, Path::new("config.toml")).unwrap();
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/todo-data")));
        assert_eq!(config.default_category, Category::School);
        assert_eq!(config.default_priority, Priority::High);
        assert_eq!(config.log_filter.as_deref(), Some("debug"));
    }

    #[test]
    fn test_bad_config_reports_path() {
        let err = Config::from_toml("default_priority = \"urgent\"", Path::new("/x/config.toml"))
            .unwrap_err();
        assert!(matches!(err, TodoError::Config { .. }));
        assert!(err.to_string().contains("/x/config.toml"));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "default_category = \"personal\"\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.default_category, Category::Personal);
    }

    #[test]
    fn test_data_dir_precedence() {
        let config = Config {
            data_dir: Some(PathBuf::from("/configured")),
            ..Config::default()
        };
        assert_eq!(
            config.resolve_data_dir(Some(Path::new("/override"))),
            PathBuf::from("/override")
        );
        assert_eq!(config.resolve_data_dir(None), PathBuf::from("/configured"));
    }
}
