use chrono::NaiveDate;

use super::filter::is_overdue;
use crate::model::{Category, Task};

/// Headline counts over the full, unfiltered task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
}

impl TaskStats {
    pub fn compute(tasks: &[Task], today: NaiveDate) -> Self {
        tasks.iter().fold(Self::default(), |mut stats, task| {
            stats.total += 1;
            if task.completed {
                stats.completed += 1;
            } else {
                stats.pending += 1;
            }
            if is_overdue(task, today) {
                stats.overdue += 1;
            }
            stats
        })
    }
}

/// Number of tasks referencing each category, in category order.
pub fn category_counts<'a>(tasks: &[Task], categories: &'a [Category]) -> Vec<(&'a Category, usize)> {
    categories
        .iter()
        .map(|cat| {
            let count = tasks.iter().filter(|t| t.category == cat.name).count();
            (cat, count)
        })
        .collect()
}
