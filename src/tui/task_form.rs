//! Task form handling for the terminal user interface.
//!
//! The same form backs both "add" and "edit". Text fields are `InputField`s;
//! category and priority are selectors cycled with Left/Right.

use chrono::NaiveDate;

use crate::config::Config;
use crate::error::{Result, TodoError};
use crate::fields::{Category, Priority};
use crate::parse::{parse_due_input, split_and_normalise_tags};
use crate::task::{NewTask, Task};
use crate::tui::input::InputField;

/// Field order used for Tab navigation and layout.
pub const TEXT_ORDER: usize = 0;
pub const DESCRIPTION_ORDER: usize = 1;
pub const TAGS_ORDER: usize = 2;
pub const DUE_ORDER: usize = 3;
pub const CATEGORY_ORDER: usize = 4;
pub const PRIORITY_ORDER: usize = 5;
const FIELD_COUNT: usize = 6;

/// Task form for creating or editing a task.
#[derive(Debug, Clone)]
pub struct TaskForm {
    pub text: InputField,
    pub description: InputField,
    pub tags: InputField,
    pub due: InputField,
    pub category: usize,
    pub priority: usize,
    pub current_field: usize,
}

impl TaskForm {
    /// Empty form with the configured default category and priority.
    pub fn new(config: &Config) -> Self {
        let mut form = Self {
            text: InputField::new(),
            description: InputField::new(),
            tags: InputField::new(),
            due: InputField::new(),
            category: index_of(&Category::ALL, config.default_category),
            priority: index_of(&Priority::ALL, config.default_priority),
            current_field: TEXT_ORDER,
        };
        form.update_active_field();
        form
    }

    /// Form populated from an existing task.
    pub fn from_task(task: &Task) -> Self {
        let mut form = Self {
            text: InputField::with_value(&task.text),
            description: InputField::with_value(task.description.as_deref().unwrap_or_default()),
            tags: InputField::with_value(&task.tags.join(", ")),
            due: InputField::with_value(&task.due_date.map(|d| d.to_string()).unwrap_or_default()),
            category: index_of(&Category::ALL, task.category),
            priority: index_of(&Priority::ALL, task.priority),
            current_field: TEXT_ORDER,
        };
        form.update_active_field();
        form
    }

    pub fn selected_category(&self) -> Category {
        Category::ALL[self.category % Category::ALL.len()]
    }

    pub fn selected_priority(&self) -> Priority {
        Priority::ALL[self.priority % Priority::ALL.len()]
    }

    fn current_input(&mut self) -> Option<&mut InputField> {
        match self.current_field {
            TEXT_ORDER => Some(&mut self.text),
            DESCRIPTION_ORDER => Some(&mut self.description),
            TAGS_ORDER => Some(&mut self.tags),
            DUE_ORDER => Some(&mut self.due),
            _ => None,
        }
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % FIELD_COUNT;
        self.update_active_field();
    }

    pub fn prev_field(&mut self) {
        self.current_field = (self.current_field + FIELD_COUNT - 1) % FIELD_COUNT;
        self.update_active_field();
    }

    fn update_active_field(&mut self) {
        for field in [
            &mut self.text,
            &mut self.description,
            &mut self.tags,
            &mut self.due,
        ] {
            field.active = false;
        }
        if let Some(field) = self.current_input() {
            field.active = true;
        }
    }

    pub fn handle_char(&mut self, c: char) {
        if let Some(field) = self.current_input() {
            field.handle_char(c);
        }
    }

    pub fn handle_backspace(&mut self) {
        if let Some(field) = self.current_input() {
            field.handle_backspace();
        }
    }

    pub fn handle_delete(&mut self) {
        if let Some(field) = self.current_input() {
            field.handle_delete();
        }
    }

    /// Left/Right move the cursor in text fields and cycle selectors.
    pub fn handle_left_right(&mut self, right: bool) {
        match self.current_field {
            CATEGORY_ORDER => self.category = cycle(self.category, Category::ALL.len(), right),
            PRIORITY_ORDER => self.priority = cycle(self.priority, Priority::ALL.len(), right),
            _ => {
                if let Some(field) = self.current_input() {
                    if right {
                        field.move_cursor_right();
                    } else {
                        field.move_cursor_left();
                    }
                }
            }
        }
    }

    fn parsed_due(&self) -> Result<Option<NaiveDate>> {
        let raw = self.due.value.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        parse_due_input(raw)
            .map(Some)
            .ok_or_else(|| TodoError::InvalidInput(format!("Invalid due date: {raw}")))
    }

    /// Validate the form and build the task to create.
    pub fn to_new_task(&self) -> Result<NewTask> {
        if self.text.value.trim().is_empty() {
            return Err(TodoError::InvalidInput("Task text is required".into()));
        }
        Ok(NewTask {
            text: self.text.value.clone(),
            description: self.description.value.clone(),
            category: self.selected_category(),
            priority: self.selected_priority(),
            tags: self.tag_list(),
            due_date: self.parsed_due()?,
        })
    }

    pub fn tag_list(&self) -> Vec<String> {
        split_and_normalise_tags(&[self.tags.value.as_str()])
    }
}

fn index_of<T: PartialEq>(all: &[T], value: T) -> usize {
    all.iter().position(|v| *v == value).unwrap_or(0)
}

fn cycle(idx: usize, len: usize, forward: bool) -> usize {
    if forward {
        (idx + 1) % len
    } else {
        (idx + len - 1) % len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskList;

    fn type_str(form: &mut TaskForm, s: &str) {
        for c in s.chars() {
            form.handle_char(c);
        }
    }

    #[test]
    fn test_new_form_uses_config_defaults() {
        let config = Config {
            default_category: Category::Personal,
            default_priority: Priority::Low,
            ..Config::default()
        };
        let form = TaskForm::new(&config);
        assert_eq!(form.selected_category(), Category::Personal);
        assert_eq!(form.selected_priority(), Priority::Low);
        assert!(form.text.active);
    }

    #[test]
    fn test_fill_and_submit() {
        let mut form = TaskForm::new(&Config::default());
        type_str(&mut form, "Buy milk");
        form.next_field();
        type_str(&mut form, "2 litres");
        form.next_field();
        type_str(&mut form, "Shop, food shop");
        form.next_field();
        type_str(&mut form, "2026-10-20");
        form.next_field();
        form.handle_left_right(true);
        form.next_field();
        form.handle_left_right(false);

        let draft = form.to_new_task().unwrap();
        assert_eq!(draft.text, "Buy milk");
        assert_eq!(draft.description, "2 litres");
        assert_eq!(draft.tags, vec!["shop", "food"]);
        assert_eq!(draft.due_date, NaiveDate::from_ymd_opt(2026, 10, 20));
        assert_eq!(draft.category, Category::School);
        assert_eq!(draft.priority, Priority::Low);
    }

    #[test]
    fn test_validation_errors() {
        let mut form = TaskForm::new(&Config::default());
        assert!(form.to_new_task().is_err());
        type_str(&mut form, "x");
        form.current_field = DUE_ORDER;
        type_str(&mut form, "whenever");
        assert!(form.to_new_task().is_err());
    }

    #[test]
    fn test_from_task_round_trips_fields() {
        let draft = NewTask {
            text: "Essay".into(),
            description: "draft".into(),
            category: Category::School,
            priority: Priority::High,
            tags: vec!["uni".into(), "writing".into()],
            due_date: NaiveDate::from_ymd_opt(2026, 11, 2),
        };
        let list = TaskList::default().add(7, &draft).unwrap();
        let form = TaskForm::from_task(list.get(7).unwrap());
        let again = form.to_new_task().unwrap();
        assert_eq!(again.text, "Essay");
        assert_eq!(again.description, "draft");
        assert_eq!(again.category, Category::School);
        assert_eq!(again.priority, Priority::High);
        assert_eq!(again.tags, vec!["uni", "writing"]);
        assert_eq!(again.due_date, draft.due_date);
    }

    #[test]
    fn test_field_navigation_wraps() {
        let mut form = TaskForm::new(&Config::default());
        form.prev_field();
        assert_eq!(form.current_field, PRIORITY_ORDER);
        assert!(!form.text.active);
        form.next_field();
        assert_eq!(form.current_field, TEXT_ORDER);
        assert!(form.text.active);
    }
}
