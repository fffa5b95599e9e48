//! Enumerations for TUI state management.

/// Screen currently shown by the terminal user interface.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppState {
    TaskList,
    TaskDetail,
    AddTask,
    EditTask,
    Help,
    Confirm,
}

/// Which single-line prompt, if any, is capturing keystrokes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InputMode {
    None,
    Search,
    TagFilter,
    NewSubtask,
    EditSubtask(u64),
}

/// Destructive action waiting for a y/n answer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConfirmAction {
    DeleteTask(u64),
    DeleteSubtask { task: u64, subtask: u64 },
}
