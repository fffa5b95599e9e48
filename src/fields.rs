//! Enumerations and field types for tasks and list views.
//!
//! `Category` and `Priority` are stored verbatim in the saved collection, so
//! their serde names are part of the on-disk format.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which area of life a task belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Work,
    School,
    Personal,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Work, Category::School, Category::Personal];

    /// The stored string value, also used for category sorting.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Work => "work",
            Category::School => "school",
            Category::Personal => "personal",
        }
    }
}

/// Task importance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

/// Keys a list view can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Text,
    Category,
    Completion,
    DueDate,
}

/// Sort choice as typed on the command line; `none` keeps manual order.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    None,
    Text,
    Category,
    Completion,
    DueDate,
}

/// How the list is ordered.
///
/// Manual reordering only makes sense when the displayed order is the stored
/// order, so it is a mode of its own rather than a flag next to the sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Manual,
    Sorted(SortKey),
}

impl ViewMode {
    /// Whether tasks can be moved by hand in this mode.
    pub fn allows_reorder(self) -> bool {
        matches!(self, ViewMode::Manual)
    }

    /// Next mode in the cycle used by the terminal UI.
    pub fn cycle(self) -> Self {
        match self {
            ViewMode::Manual => ViewMode::Sorted(SortKey::Text),
            ViewMode::Sorted(SortKey::Text) => ViewMode::Sorted(SortKey::Category),
            ViewMode::Sorted(SortKey::Category) => ViewMode::Sorted(SortKey::Completion),
            ViewMode::Sorted(SortKey::Completion) => ViewMode::Sorted(SortKey::DueDate),
            ViewMode::Sorted(SortKey::DueDate) => ViewMode::Manual,
        }
    }
}

impl From<SortOrder> for ViewMode {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::None => ViewMode::Manual,
            SortOrder::Text => ViewMode::Sorted(SortKey::Text),
            SortOrder::Category => ViewMode::Sorted(SortKey::Category),
            SortOrder::Completion => ViewMode::Sorted(SortKey::Completion),
            SortOrder::DueDate => ViewMode::Sorted(SortKey::DueDate),
        }
    }
}

/// Category restriction applied to a list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => c == category,
        }
    }

    /// All -> Work -> School -> Personal -> All.
    pub fn cycle(self) -> Self {
        match self {
            CategoryFilter::All => CategoryFilter::Only(Category::Work),
            CategoryFilter::Only(Category::Work) => CategoryFilter::Only(Category::School),
            CategoryFilter::Only(Category::School) => CategoryFilter::Only(Category::Personal),
            CategoryFilter::Only(Category::Personal) => CategoryFilter::All,
        }
    }
}

impl From<Option<Category>> for CategoryFilter {
    fn from(category: Option<Category>) -> Self {
        category.map_or(CategoryFilter::All, CategoryFilter::Only)
    }
}
