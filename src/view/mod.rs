//! Derived views over store state.
//!
//! Everything here is a pure function of its inputs. "Today" is passed in
//! explicitly so callers (and tests) control the overdue boundary.

pub(crate) mod filter;
mod stats;

pub use filter::{
    all_tags, due_label, is_overdue, visible_tasks, CategoryFilter, DueLabel, SortKey,
    StatusFilter, ViewQuery,
};
pub use stats::{category_counts, TaskStats};
