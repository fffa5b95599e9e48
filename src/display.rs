//! Plain-text rendering helpers shared by the CLI commands.

use chrono::{Local, NaiveDate};

use crate::task::{Task, TaskList};

pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let days = (d - today).num_days();
            if days == 0 {
                "today".into()
            } else if days == 1 {
                "tomorrow".into()
            } else if days > 1 {
                format!("in {days}d")
            } else {
                format!("{}d late", -days)
            }
        }
    }
}

/// `2/5` style counter, or `-` without subtasks.
pub fn format_progress(task: &Task) -> String {
    match task.subtask_progress() {
        (_, 0) => "-".into(),
        (done, total) => format!("{done}/{total}"),
    }
}

pub fn checkbox(done: bool) -> &'static str {
    if done {
        "[x]"
    } else {
        "[ ]"
    }
}

pub fn format_tags(tags: &[String]) -> String {
    if tags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", tags.join(","))
    }
}

pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// Print `rows` as a table. `#` is the 1-based position in `all`, which is
/// what `move` expects; subtasks are listed under tasks whose `showSubtasks`
/// flag is set, or under every task when `all_subtasks` is true.
pub fn print_table(all: &TaskList, rows: &[&Task], all_subtasks: bool) {
    println!(
        "{:<4} {:<15} {:<4} {:<9} {:<7} {:<10} {:<6} {}",
        "#", "ID", "Done", "Category", "Pri", "Due", "Subs", "Text [tags]"
    );
    let today = Local::now().date_naive();
    for t in rows {
        let pos = all.position(t.id).map_or(0, |p| p + 1);
        let due = format_due_relative(t.due_date, today);
        let due = if t.is_overdue(today) { format!("{due}!") } else { due };
        println!(
            "{:<4} {:<15} {:<4} {:<9} {:<7} {:<10} {:<6} {}{}",
            pos,
            t.id,
            checkbox(t.done),
            t.category.as_str(),
            t.priority.as_str(),
            due,
            format_progress(t),
            t.text,
            format_tags(&t.tags)
        );
        if all_subtasks || t.show_subtasks {
            for s in &t.subtasks {
                println!("{:<4} {:<15} {:<4}   {}", "", s.id, checkbox(s.done), s.text);
            }
        }
    }
}
