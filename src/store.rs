//! The task store: single owner of the task collection and the theme flag.
//!
//! The store is loaded once from a [`KeyValueStore`] and writes the whole
//! collection back after every change. Mutations go through
//! [`TaskStore::apply`], which swaps in the next [`TaskList`] produced by one of
//! its operations; a `None` from the operation leaves everything untouched and
//! skips the write.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::storage::{KeyValueStore, CORRUPT_TODOS_KEY, DARK_MODE_KEY, TODOS_KEY};
use crate::task::{NewTask, TaskList};

/// Theme used when no preference has been saved yet.
pub const DEFAULT_DARK_MODE: bool = true;

pub struct TaskStore<S: KeyValueStore> {
    storage: S,
    tasks: TaskList,
    dark_mode: bool,
    last_id: u64,
    tasks_dirty: bool,
    dark_mode_dirty: bool,
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Load state from `storage`.
    ///
    /// A missing collection starts empty. An unreadable or unparseable one
    /// also starts empty; the raw contents are first copied to
    /// [`CORRUPT_TODOS_KEY`] so the next save does not destroy it.
    pub fn load(mut storage: S) -> Self {
        let tasks = match storage.get(TODOS_KEY) {
            Ok(None) => TaskList::default(),
            Ok(Some(raw)) => match serde_json::from_str::<TaskList>(&raw) {
                Ok(tasks) => tasks,
                Err(e) => {
                    warn!(error = %e, "stored tasks are corrupt, starting fresh");
                    preserve_corrupt(&mut storage);
                    TaskList::default()
                }
            },
            Err(e) => {
                warn!(error = %e, "could not read stored tasks, starting fresh");
                preserve_corrupt(&mut storage);
                TaskList::default()
            }
        };

        let dark_mode = match storage.get(DARK_MODE_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<bool>(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "stored theme preference is invalid");
                DEFAULT_DARK_MODE
            }),
            Ok(None) => DEFAULT_DARK_MODE,
            Err(e) => {
                warn!(error = %e, "could not read theme preference");
                DEFAULT_DARK_MODE
            }
        };

        let last_id = tasks.max_id();
        info!(tasks = tasks.len(), dark_mode, "loaded task store");
        Self {
            storage,
            tasks,
            dark_mode,
            last_id,
            tasks_dirty: false,
            dark_mode_dirty: false,
        }
    }

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Whether some change has not reached storage yet.
    pub fn has_unsaved_changes(&self) -> bool {
        self.tasks_dirty || self.dark_mode_dirty
    }

    /// Issue a fresh id: the current time in milliseconds, bumped past the
    /// last id handed out so ids never repeat. `None` once `u64::MAX` is taken.
    fn next_id(&mut self) -> Option<u64> {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let Some(after_last) = self.last_id.checked_add(1) else {
            warn!("task ids exhausted");
            return None;
        };
        self.last_id = now.max(after_last);
        Some(self.last_id)
    }

    /// Replace the collection with the result of `op`, then persist it.
    ///
    /// Returns whether anything changed. A failed write is logged and retried
    /// on the next change; use [`TaskStore::flush`] to observe it.
    pub fn apply(&mut self, name: &str, op: impl FnOnce(&TaskList) -> Option<TaskList>) -> bool {
        let Some(next) = op(&self.tasks) else {
            debug!(op = name, "no change");
            return false;
        };
        self.tasks = next;
        self.tasks_dirty = true;
        debug!(op = name, tasks = self.tasks.len(), "applied");
        if let Err(e) = self.write_tasks() {
            warn!(op = name, error = %e, "failed to save tasks, will retry on next change");
        }
        true
    }

    fn write_tasks(&mut self) -> Result<()> {
        let data = serde_json::to_string_pretty(&self.tasks)?;
        self.storage.set(TODOS_KEY, &data)?;
        self.tasks_dirty = false;
        Ok(())
    }

    fn write_dark_mode(&mut self) -> Result<()> {
        let data = serde_json::to_string(&self.dark_mode)?;
        self.storage.set(DARK_MODE_KEY, &data)?;
        self.dark_mode_dirty = false;
        Ok(())
    }

    /// Write any state that previous attempts failed to save.
    pub fn flush(&mut self) -> Result<()> {
        if self.tasks_dirty {
            self.write_tasks()?;
        }
        if self.dark_mode_dirty {
            self.write_dark_mode()?;
        }
        Ok(())
    }

    /// Add a task and return its id; `None` when the text is blank.
    pub fn add(&mut self, draft: &NewTask) -> Option<u64> {
        if draft.text.trim().is_empty() {
            return None;
        }
        let id = self.next_id()?;
        self.apply("add", |tasks| tasks.add(id, draft)).then_some(id)
    }

    /// Replace all editable fields of a task with one write.
    pub fn update(&mut self, id: u64, draft: &NewTask) -> bool {
        self.apply("update", |tasks| tasks.update(id, draft))
    }

    pub fn edit(&mut self, id: u64, text: &str, description: &str) -> bool {
        self.apply("edit", |tasks| tasks.edit(id, text, description))
    }

    pub fn toggle_done(&mut self, id: u64) -> bool {
        self.apply("toggle_done", |tasks| tasks.toggle_done(id))
    }

    pub fn delete(&mut self, id: u64) -> bool {
        self.apply("delete", |tasks| tasks.delete(id))
    }

    pub fn reorder(&mut self, source: usize, destination: Option<usize>) -> bool {
        self.apply("reorder", |tasks| tasks.reorder(source, destination))
    }

    pub fn move_by(&mut self, id: u64, delta: isize) -> bool {
        self.apply("move_by", |tasks| tasks.move_by(id, delta))
    }

    pub fn toggle_subtask_visibility(&mut self, id: u64) -> bool {
        self.apply("toggle_subtask_visibility", |tasks| tasks.toggle_subtask_visibility(id))
    }

    /// Add a subtask and return its id; `None` when the task does not exist.
    pub fn add_subtask(&mut self, task_id: u64, text: &str) -> Option<u64> {
        self.tasks.get(task_id)?;
        let id = self.next_id()?;
        self.apply("add_subtask", |tasks| tasks.add_subtask(task_id, id, text))
            .then_some(id)
    }

    pub fn toggle_subtask(&mut self, task_id: u64, subtask_id: u64) -> bool {
        self.apply("toggle_subtask", |tasks| tasks.toggle_subtask(task_id, subtask_id))
    }

    pub fn delete_subtask(&mut self, task_id: u64, subtask_id: u64) -> bool {
        self.apply("delete_subtask", |tasks| tasks.delete_subtask(task_id, subtask_id))
    }

    pub fn edit_subtask(&mut self, task_id: u64, subtask_id: u64, text: &str) -> bool {
        self.apply("edit_subtask", |tasks| tasks.edit_subtask(task_id, subtask_id, text))
    }

    pub fn clear_completed(&mut self) -> bool {
        self.apply("clear_completed", TaskList::clear_completed)
    }

    /// Set the theme and save it right away.
    pub fn set_dark_mode(&mut self, dark: bool) {
        self.dark_mode = dark;
        self.dark_mode_dirty = true;
        if let Err(e) = self.write_dark_mode() {
            warn!(error = %e, "failed to save theme preference");
        }
    }

    /// Flip the theme; returns the new value.
    pub fn toggle_dark_mode(&mut self) -> bool {
        self.set_dark_mode(!self.dark_mode);
        self.dark_mode
    }
}

fn preserve_corrupt<S: KeyValueStore>(storage: &mut S) {
    match storage.copy(TODOS_KEY, CORRUPT_TODOS_KEY) {
        Ok(true) => info!(key = CORRUPT_TODOS_KEY, "kept a copy of the unreadable tasks"),
        Ok(false) => {}
        Err(e) => warn!(error = %e, "could not preserve corrupt tasks"),
    }
}
