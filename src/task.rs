//! Task data structures and the operations that transform a task list.
//!
//! Every mutating operation on [`TaskList`] borrows the current list and
//! returns the next one, or `None` when the request is a no-op (unknown id,
//! empty required text, nothing to change). The caller decides what to do with
//! the new value; see [`crate::store::TaskStore::apply`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fields::{Category, Priority};
use crate::parse::normalise_tags;

/// A checklist item owned by exactly one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: u64,
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

/// A top-level to-do item.
///
/// Field names are serialized in camelCase (`dueDate`, `showSubtasks`), which
/// is the format of the saved collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub done: bool,
    pub category: Category,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub show_subtasks: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Task {
    /// Due before `today` and still open.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.done && self.due_date.is_some_and(|d| d < today)
    }

    /// `(done, total)` over this task's subtasks.
    pub fn subtask_progress(&self) -> (usize, usize) {
        let done = self.subtasks.iter().filter(|s| s.done).count();
        (done, self.subtasks.len())
    }

    pub fn subtask(&self, id: u64) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.id == id)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Field values for a task about to be created.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub text: String,
    pub description: String,
    pub category: Category,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// `s` unchanged, or `None` when it is only whitespace.
fn non_blank(s: &str) -> Option<String> {
    (!s.trim().is_empty()).then(|| s.to_string())
}

fn trimmed_description(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// The ordered task collection. Its order is the manual (drag) order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Index of a task in the base order.
    pub fn position(&self, id: u64) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    /// Largest task or subtask id in the list, 0 when empty.
    pub fn max_id(&self) -> u64 {
        self.tasks
            .iter()
            .flat_map(|t| std::iter::once(t.id).chain(t.subtasks.iter().map(|s| s.id)))
            .max()
            .unwrap_or(0)
    }

    /// Replace the task `id` with the result of `f`. `f` returning `None` or an
    /// identical task means nothing changed.
    fn map_task(&self, id: u64, f: impl FnOnce(&Task) -> Option<Task>) -> Option<TaskList> {
        let idx = self.position(id)?;
        let updated = f(&self.tasks[idx])?;
        if updated == self.tasks[idx] {
            return None;
        }
        let mut next = self.clone();
        next.tasks[idx] = updated;
        Some(next)
    }

    fn map_subtask(
        &self,
        task_id: u64,
        subtask_id: u64,
        f: impl FnOnce(&Subtask) -> Subtask,
    ) -> Option<TaskList> {
        self.map_task(task_id, |task| {
            let idx = task.subtasks.iter().position(|s| s.id == subtask_id)?;
            let mut task = task.clone();
            task.subtasks[idx] = f(&task.subtasks[idx]);
            Some(task)
        })
    }

    /// Append a new task under `id`. No-op when the text is blank.
    pub fn add(&self, id: u64, draft: &NewTask) -> Option<TaskList> {
        let text = non_blank(&draft.text)?;
        let task = Task {
            id,
            text,
            description: trimmed_description(&draft.description),
            done: false,
            category: draft.category,
            priority: draft.priority,
            due_date: draft.due_date,
            subtasks: Vec::new(),
            show_subtasks: false,
            tags: normalise_tags(&draft.tags),
        };
        let mut next = self.clone();
        next.tasks.push(task);
        Some(next)
    }

    /// Replace text and description. No-op for an unknown id or blank text.
    pub fn edit(&self, id: u64, text: &str, description: &str) -> Option<TaskList> {
        let text = non_blank(text)?;
        self.map_task(id, |task| {
            Some(Task {
                text,
                description: trimmed_description(description),
                ..task.clone()
            })
        })
    }

    /// Apply every editable field of `draft` to task `id` in one step.
    /// No-op for an unknown id, blank text or a draft matching the task.
    pub fn update(&self, id: u64, draft: &NewTask) -> Option<TaskList> {
        non_blank(&draft.text)?;
        self.position(id)?;
        let steps: [&dyn Fn(&TaskList) -> Option<TaskList>; 5] = [
            &|l| l.edit(id, &draft.text, &draft.description),
            &|l| l.set_category(id, draft.category),
            &|l| l.set_priority(id, draft.priority),
            &|l| l.set_due_date(id, draft.due_date),
            &|l| l.set_tags(id, &draft.tags),
        ];
        let mut next: Option<TaskList> = None;
        for step in steps {
            if let Some(list) = step(next.as_ref().unwrap_or(self)) {
                next = Some(list);
            }
        }
        next
    }

    pub fn toggle_done(&self, id: u64) -> Option<TaskList> {
        self.map_task(id, |task| {
            Some(Task {
                done: !task.done,
                ..task.clone()
            })
        })
    }

    pub fn toggle_subtask_visibility(&self, id: u64) -> Option<TaskList> {
        self.map_task(id, |task| {
            Some(Task {
                show_subtasks: !task.show_subtasks,
                ..task.clone()
            })
        })
    }

    /// Remove a task together with its subtasks.
    pub fn delete(&self, id: u64) -> Option<TaskList> {
        let idx = self.position(id)?;
        let mut next = self.clone();
        next.tasks.remove(idx);
        Some(next)
    }

    /// Move the task at `source` to `destination` in the base order.
    ///
    /// `None` is a cancelled drag. Out-of-range indices and same-slot moves do
    /// nothing.
    pub fn reorder(&self, source: usize, destination: Option<usize>) -> Option<TaskList> {
        let destination = destination?;
        if source >= self.tasks.len() || destination >= self.tasks.len() || source == destination {
            return None;
        }
        let mut next = self.clone();
        let moved = next.tasks.remove(source);
        next.tasks.insert(destination, moved);
        Some(next)
    }

    /// Move a task `delta` slots up (negative) or down (positive), clamped to
    /// the ends of the list.
    pub fn move_by(&self, id: u64, delta: isize) -> Option<TaskList> {
        let source = self.position(id)?;
        let last = self.tasks.len().saturating_sub(1);
        let destination = source.saturating_add_signed(delta).min(last);
        self.reorder(source, Some(destination))
    }

    /// Append a subtask. Empty text is accepted here; front ends decide
    /// whether to allow it.
    pub fn add_subtask(&self, task_id: u64, subtask_id: u64, text: &str) -> Option<TaskList> {
        self.map_task(task_id, |task| {
            let mut task = task.clone();
            task.subtasks.push(Subtask {
                id: subtask_id,
                text: text.to_string(),
                done: false,
            });
            Some(task)
        })
    }

    pub fn toggle_subtask(&self, task_id: u64, subtask_id: u64) -> Option<TaskList> {
        self.map_subtask(task_id, subtask_id, |s| Subtask {
            done: !s.done,
            ..s.clone()
        })
    }

    pub fn delete_subtask(&self, task_id: u64, subtask_id: u64) -> Option<TaskList> {
        self.map_task(task_id, |task| {
            let idx = task.subtasks.iter().position(|s| s.id == subtask_id)?;
            let mut task = task.clone();
            task.subtasks.remove(idx);
            Some(task)
        })
    }

    /// Replace subtask text as given, without an emptiness check.
    pub fn edit_subtask(&self, task_id: u64, subtask_id: u64, text: &str) -> Option<TaskList> {
        self.map_subtask(task_id, subtask_id, |s| Subtask {
            text: text.to_string(),
            ..s.clone()
        })
    }

    pub fn set_tags<S: AsRef<str>>(&self, id: u64, tags: &[S]) -> Option<TaskList> {
        let tags = normalise_tags(tags);
        self.map_task(id, |task| {
            Some(Task {
                tags,
                ..task.clone()
            })
        })
    }

    pub fn set_due_date(&self, id: u64, due_date: Option<NaiveDate>) -> Option<TaskList> {
        self.map_task(id, |task| {
            Some(Task {
                due_date,
                ..task.clone()
            })
        })
    }

    pub fn set_category(&self, id: u64, category: Category) -> Option<TaskList> {
        self.map_task(id, |task| {
            Some(Task {
                category,
                ..task.clone()
            })
        })
    }

    pub fn set_priority(&self, id: u64, priority: Priority) -> Option<TaskList> {
        self.map_task(id, |task| {
            Some(Task {
                priority,
                ..task.clone()
            })
        })
    }

    /// Drop every completed task. No-op when none are done.
    pub fn clear_completed(&self) -> Option<TaskList> {
        if !self.tasks.iter().any(|t| t.done) {
            return None;
        }
        Some(TaskList {
            tasks: self.tasks.iter().filter(|t| !t.done).cloned().collect(),
        })
    }
}

impl<'a> IntoIterator for &'a TaskList {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}
