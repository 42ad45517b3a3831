use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::model::Task;

// ============================================================================
// Filter and Sort Keys
// ============================================================================

/// Completion-state filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
    Overdue,
}

impl StatusFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Completed => "completed",
            StatusFilter::Pending => "pending",
            StatusFilter::Overdue => "overdue",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All Tasks",
            StatusFilter::Completed => "Completed",
            StatusFilter::Pending => "Pending",
            StatusFilter::Overdue => "Overdue",
        }
    }

    /// UI cycle order: All → Pending → Completed → Overdue → All.
    pub fn next(self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Pending,
            StatusFilter::Pending => StatusFilter::Completed,
            StatusFilter::Completed => StatusFilter::Overdue,
            StatusFilter::Overdue => StatusFilter::All,
        }
    }

    fn matches(self, task: &Task, today: NaiveDate) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Completed => task.completed,
            StatusFilter::Pending => !task.completed,
            StatusFilter::Overdue => is_overdue(task, today),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "completed" => Ok(StatusFilter::Completed),
            "pending" => Ok(StatusFilter::Pending),
            "overdue" => Ok(StatusFilter::Overdue),
            other => Err(format!("Unknown status filter '{}'", other)),
        }
    }
}

/// Ordering applied to the visible task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Earliest due date first.
    #[default]
    DueDate,
    /// High before medium before low.
    Priority,
    /// Lexicographic ascending.
    Title,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::DueDate => "dueDate",
            SortKey::Priority => "priority",
            SortKey::Title => "title",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::DueDate => "Due Date",
            SortKey::Priority => "Priority",
            SortKey::Title => "Title",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SortKey::DueDate => SortKey::Priority,
            SortKey::Priority => SortKey::Title,
            SortKey::Title => SortKey::DueDate,
        }
    }

    /// Record field the service should order a fetch by.
    pub fn record_field(self) -> &'static str {
        match self {
            SortKey::DueDate => "due_date",
            SortKey::Priority => "priority",
            SortKey::Title => "title",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "dueDate" | "due_date" => Ok(SortKey::DueDate),
            "priority" => Ok(SortKey::Priority),
            "title" => Ok(SortKey::Title),
            other => Err(format!("Unknown sort key '{}'", other)),
        }
    }
}

/// Category filter: everything, or tasks whose category name matches exactly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Named(String),
}

impl CategoryFilter {
    fn matches(&self, task: &Task) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Named(name) => task.category == *name,
        }
    }
}

// ============================================================================
// View Query
// ============================================================================

/// All user-controlled inputs to the visible task list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewQuery {
    pub search: String,
    pub status: StatusFilter,
    pub category: CategoryFilter,
    pub tag: String,
    pub sort: SortKey,
}

impl ViewQuery {
    pub fn with_sort(sort: SortKey) -> Self {
        Self {
            sort,
            ..Self::default()
        }
    }

    /// Whether a category or tag filter narrows the list.
    pub fn has_narrowing_filters(&self) -> bool {
        self.category != CategoryFilter::All || !self.tag.is_empty()
    }

    /// Reset the category and tag filters; search, status and sort are kept.
    pub fn clear_filters(&mut self) {
        self.category = CategoryFilter::All;
        self.tag.clear();
    }
}

/// Overdue means: not completed, and due strictly before `today`.
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    !task.completed && task.due_date < today
}

fn matches_search(task: &Task, needle: &str) -> bool {
    needle.is_empty()
        || task.title.to_lowercase().contains(needle)
        || task.description.to_lowercase().contains(needle)
        || task.tags.iter().any(|t| t.to_lowercase().contains(needle))
}

fn matches_tag(task: &Task, needle: &str) -> bool {
    needle.is_empty() || task.tags.iter().any(|t| t.to_lowercase().contains(needle))
}

/// Filter and order `tasks` for display.
///
/// The result borrows from the input and keeps input order among equal sort
/// keys (`sort_by` is stable).
pub fn visible_tasks<'a>(tasks: &'a [Task], query: &ViewQuery, today: NaiveDate) -> Vec<&'a Task> {
    let search = query.search.to_lowercase();
    let tag = query.tag.to_lowercase();

    let mut visible: Vec<&Task> = tasks
        .iter()
        .filter(|task| {
            matches_search(task, &search)
                && query.category.matches(task)
                && matches_tag(task, &tag)
                && query.status.matches(task, today)
        })
        .collect();

    match query.sort {
        SortKey::DueDate => visible.sort_by(|a, b| a.due_date.cmp(&b.due_date)),
        SortKey::Priority => visible.sort_by(|a, b| b.priority.rank().cmp(&a.priority.rank())),
        SortKey::Title => visible.sort_by(|a, b| a.title.cmp(&b.title)),
    }

    visible
}

// ============================================================================
// Display Helpers
// ============================================================================

/// Relative label for a due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueLabel {
    Today,
    Tomorrow,
    Overdue,
    On(NaiveDate),
}

impl fmt::Display for DueLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DueLabel::Today => f.write_str("Today"),
            DueLabel::Tomorrow => f.write_str("Tomorrow"),
            DueLabel::Overdue => f.write_str("Overdue"),
            DueLabel::On(date) => write!(f, "{}", date.format("%b %d")),
        }
    }
}

pub fn due_label(due: NaiveDate, today: NaiveDate) -> DueLabel {
    if due == today {
        DueLabel::Today
    } else if today.checked_add_days(Days::new(1)) == Some(due) {
        DueLabel::Tomorrow
    } else if due < today {
        DueLabel::Overdue
    } else {
        DueLabel::On(due)
    }
}

/// Every distinct tag across `tasks`, sorted.
pub fn all_tags(tasks: &[Task]) -> Vec<String> {
    tasks
        .iter()
        .flat_map(|t| t.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
