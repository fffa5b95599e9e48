//! Read-only projections of the task list for display.
//!
//! Nothing here mutates or persists; a `ViewQuery` describes what the user is
//! looking at and `project` derives the visible tasks from the base list.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::fields::{CategoryFilter, SortKey, ViewMode};
use crate::parse::normalise_tag;
use crate::task::{Task, TaskList};

/// Search, filters and ordering for one list view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    pub search: String,
    pub category: CategoryFilter,
    /// Selected tags; a task must carry all of them.
    pub tags: Vec<String>,
    pub mode: ViewMode,
}

impl ViewQuery {
    /// Select `tag` if it is not selected, deselect it otherwise.
    pub fn toggle_tag(&mut self, tag: &str) {
        let tag = normalise_tag(tag);
        if tag.is_empty() {
            return;
        }
        if let Some(idx) = self.tags.iter().position(|t| *t == tag) {
            self.tags.remove(idx);
        } else {
            self.tags.push(tag);
        }
    }

    pub fn clear_tags(&mut self) {
        self.tags.clear();
    }

    /// Whether `task` passes search, category and tag filters.
    pub fn matches(&self, task: &Task) -> bool {
        let search = self.search.to_lowercase();
        task.text.to_lowercase().contains(&search)
            && self.category.matches(task.category)
            && self.tags.iter().all(|tag| task.has_tag(tag))
    }
}

/// Filter and order `tasks` for display.
///
/// In `ViewMode::Manual` the base order is kept, which is the only order in
/// which indices line up with the stored collection.
pub fn project<'a>(tasks: &'a TaskList, query: &ViewQuery) -> Vec<&'a Task> {
    let mut visible: Vec<&Task> = tasks.iter().filter(|t| query.matches(t)).collect();
    if let ViewMode::Sorted(key) = query.mode {
        visible.sort_by(|a, b| compare(a, b, key));
    }
    visible
}

fn compare(a: &Task, b: &Task, key: SortKey) -> Ordering {
    match key {
        SortKey::Text => a
            .text
            .to_lowercase()
            .cmp(&b.text.to_lowercase())
            .then_with(|| a.text.cmp(&b.text)),
        SortKey::Category => a.category.as_str().cmp(b.category.as_str()),
        SortKey::Completion => a.done.cmp(&b.done),
        SortKey::DueDate => match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

/// Every tag used in the list, sorted and de-duplicated.
pub fn available_tags(tasks: &TaskList) -> Vec<String> {
    tasks
        .iter()
        .flat_map(|t| t.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Number of tasks carrying each tag.
pub fn tag_counts(tasks: &TaskList) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for tag in tasks.iter().flat_map(|t| t.tags.iter()) {
        *counts.entry(tag.clone()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Category;
    use crate::task::NewTask;
    use chrono::NaiveDate;

    fn build(rows: &[(&str, Category, &str, Option<(i32, u32, u32)>)]) -> TaskList {
        let mut list = TaskList::default();
        for (i, (text, category, tags, due)) in rows.iter().enumerate() {
            let draft = NewTask {
                text: text.to_string(),
                category: *category,
                tags: vec![tags.to_string()],
                due_date: due.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
                ..NewTask::default()
            };
            list = list.add(i as u64 + 1, &draft).unwrap();
        }
        list
    }

    fn texts(view: &[&Task]) -> Vec<String> {
        view.iter().map(|t| t.text.clone()).collect()
    }

    fn sorted(list: &TaskList, key: SortKey) -> Vec<String> {
        let query = ViewQuery {
            mode: ViewMode::Sorted(key),
            ..ViewQuery::default()
        };
        texts(&project(list, &query))
    }

    #[test]
    fn test_sort_by_text_then_back_to_manual() {
        let list = build(&[("B", Category::Work, "", None), ("A", Category::Work, "", None)]);
        assert_eq!(sorted(&list, SortKey::Text), vec!["A", "B"]);
        let manual = project(&list, &ViewQuery::default());
        assert_eq!(texts(&manual), vec!["B", "A"]);
    }

    #[test]
    fn test_sort_by_text_ignores_case() {
        let list = build(&[
            ("banana", Category::Work, "", None),
            ("Apple", Category::Work, "", None),
            ("cherry", Category::Work, "", None),
        ]);
        assert_eq!(sorted(&list, SortKey::Text), vec!["Apple", "banana", "cherry"]);
    }

    #[test]
    fn test_search_is_case_insensitive_on_text_only() {
        let list = build(&[
            ("Call Mom", Category::Personal, "phone", None),
            ("Email boss", Category::Work, "", None),
        ]);
        let query = ViewQuery {
            search: "MOM".into(),
            ..ViewQuery::default()
        };
        assert_eq!(texts(&project(&list, &query)), vec!["Call Mom"]);

        let by_tag_text = ViewQuery {
            search: "phone".into(),
            ..ViewQuery::default()
        };
        assert!(project(&list, &by_tag_text).is_empty());
    }

    #[test]
    fn test_category_filter() {
        let list = build(&[
            ("a", Category::Work, "", None),
            ("b", Category::School, "", None),
            ("c", Category::Work, "", None),
        ]);
        let query = ViewQuery {
            category: CategoryFilter::Only(Category::Work),
            ..ViewQuery::default()
        };
        assert_eq!(texts(&project(&list, &query)), vec!["a", "c"]);
    }

    #[test]
    fn test_tag_filter_requires_all_selected() {
        let list = build(&[
            ("ab", Category::Work, "a,b", None),
            ("a", Category::Work, "a", None),
            ("abc", Category::Work, "c,b,a", None),
            ("none", Category::Work, "", None),
        ]);
        let mut query = ViewQuery::default();
        query.toggle_tag("a");
        query.toggle_tag("B");
        assert_eq!(texts(&project(&list, &query)), vec!["ab", "abc"]);

        query.toggle_tag("b");
        assert_eq!(texts(&project(&list, &query)), vec!["ab", "a", "abc"]);
        query.clear_tags();
        assert_eq!(project(&list, &query).len(), 4);
    }

    #[test]
    fn test_sort_by_due_date_puts_undated_last_and_is_stable() {
        let list = build(&[
            ("none1", Category::Work, "", None),
            ("late", Category::Work, "", Some((2026, 12, 1))),
            ("none2", Category::Work, "", None),
            ("early", Category::Work, "", Some((2026, 1, 1))),
            ("none3", Category::Work, "", None),
        ]);
        assert_eq!(
            sorted(&list, SortKey::DueDate),
            vec!["early", "late", "none1", "none2", "none3"]
        );
    }

    #[test]
    fn test_sort_by_completion_and_category() {
        let list = build(&[
            ("p", Category::Personal, "", None),
            ("w", Category::Work, "", None),
            ("s", Category::School, "", None),
        ]);
        assert_eq!(sorted(&list, SortKey::Category), vec!["p", "s", "w"]);

        let list = list.toggle_done(1).unwrap();
        assert_eq!(sorted(&list, SortKey::Completion), vec!["w", "s", "p"]);
    }

    #[test]
    fn test_available_tags_and_counts() {
        let list = build(&[
            ("x", Category::Work, "home,zeta", None),
            ("y", Category::Work, "alpha,home", None),
        ]);
        assert_eq!(available_tags(&list), vec!["alpha", "home", "zeta"]);
        let counts = tag_counts(&list);
        assert_eq!(counts.get("home"), Some(&2));
        assert_eq!(counts.get("alpha"), Some(&1));
    }
}
