//! Task and category operations against a record service.
//!
//! Controllers validate input, talk to the service and hand back the
//! confirmed records. They never touch the [`Store`](crate::store::Store)
//! themselves: the UI loop applies what a controller returns, so a failed
//! call leaves local state exactly as it was.

mod categories;
mod tasks;

pub use categories::{CategoryController, CategoryDraft, CategoryRename};
pub use tasks::{TaskController, TaskDraft};

use thiserror::Error;

use crate::model::Task;
use crate::service::ServiceError;

// ============================================================================
// Notices
// ============================================================================

pub const TASK_CREATED: &str = "Task created successfully!";
pub const TASK_UPDATED: &str = "Task updated successfully!";
pub const TASK_DELETED: &str = "Task deleted successfully!";
pub const TASK_COMPLETED: &str = "Task completed!";
pub const TASK_REOPENED: &str = "Task marked as incomplete";
pub const CATEGORY_CREATED: &str = "Category created successfully!";
pub const CATEGORY_UPDATED: &str = "Category updated successfully!";
pub const CATEGORY_DELETED: &str = "Category deleted successfully!";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ControllerError {
    /// Rejected locally; the service was never called
    #[error("{0}")]
    Validation(&'static str),

    #[error(transparent)]
    Remote(#[from] ServiceError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Cannot delete the last category")]
    LastCategory,

    /// A multi-record cascade stopped part-way. `completed` holds the task
    /// records the service already accepted.
    #[error("Updated {} task(s) before failing: {source}", completed.len())]
    Reassign {
        completed: Vec<Task>,
        #[source]
        source: ServiceError,
    },
}

impl ControllerError {
    /// Tasks the service accepted before the failure, if any.
    pub fn into_completed(self) -> Vec<Task> {
        match self {
            ControllerError::Reassign { completed, .. } => completed,
            _ => Vec::new(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ControllerError>;
