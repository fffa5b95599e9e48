//! Key-value persistence used by the task store.
//!
//! The store only needs two operations: read a string by key and write a
//! string by key. `FileStore` keeps each key in its own JSON file inside a data
//! directory; `MemoryStore` backs the tests.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Key holding the serialized task collection.
pub const TODOS_KEY: &str = "todos";
/// Key holding the dark-mode preference.
pub const DARK_MODE_KEY: &str = "darkMode";
/// Key a corrupt collection blob is copied to before it gets overwritten.
pub const CORRUPT_TODOS_KEY: &str = "todos.corrupt";

/// Synchronous string storage addressed by key.
pub trait KeyValueStore {
    /// Read the value for `key`, `Ok(None)` when it was never written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Copy the stored value of `from` to `to` byte for byte, without
    /// decoding it. Returns `false` when `from` holds nothing.
    fn copy(&mut self, from: &str, to: &str) -> Result<bool>;
}

/// Stores every key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Atomic-ish write via temp file + rename.
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        f.write_all(value.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    fn copy(&mut self, from: &str, to: &str) -> Result<bool> {
        match fs::copy(self.path_for(from), self.path_for(to)) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store. Writes can be made to fail to exercise error handling.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
    fail_writes: bool,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with one value.
    pub fn with_value(key: &str, value: &str) -> Self {
        let mut store = Self::default();
        store.values.insert(key.to_string(), value.to_string());
        store
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::Other, "write rejected").into());
        }
        self.values.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }

    fn copy(&mut self, from: &str, to: &str) -> Result<bool> {
        let Some(value) = self.values.get(from).cloned() else {
            return Ok(false);
        };
        self.set(to, &value)?;
        Ok(true)
    }
}
