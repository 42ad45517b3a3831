use std::fmt;

/// Kinds of service operation that can be in flight.
///
/// Busy state is tracked per kind, not per record: while a `CreateTask` is
/// outstanding, a second create is refused even for a different draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    LoadTasks,
    CreateTask,
    UpdateTask,
    DeleteTask,
    ToggleTask,
    ClearCompleted,
    LoadCategories,
    CreateCategory,
    UpdateCategory,
    DeleteCategory,
}

impl OpKind {
    /// Short progress text for the status bar.
    pub fn progress_label(self) -> &'static str {
        match self {
            OpKind::LoadTasks => "Loading tasks...",
            OpKind::CreateTask => "Creating task...",
            OpKind::UpdateTask => "Updating task...",
            OpKind::DeleteTask => "Deleting task...",
            OpKind::ToggleTask => "Saving...",
            OpKind::ClearCompleted => "Clearing completed tasks...",
            OpKind::LoadCategories => "Loading categories...",
            OpKind::CreateCategory => "Creating category...",
            OpKind::UpdateCategory => "Updating category...",
            OpKind::DeleteCategory => "Deleting category...",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpKind::LoadTasks => "load_tasks",
            OpKind::CreateTask => "create_task",
            OpKind::UpdateTask => "update_task",
            OpKind::DeleteTask => "delete_task",
            OpKind::ToggleTask => "toggle_task",
            OpKind::ClearCompleted => "clear_completed",
            OpKind::LoadCategories => "load_categories",
            OpKind::CreateCategory => "create_category",
            OpKind::UpdateCategory => "update_category",
            OpKind::DeleteCategory => "delete_category",
        };
        f.write_str(name)
    }
}

/// Set of operation kinds currently in flight, in the order they started.
#[derive(Debug, Default)]
pub struct PendingOps {
    in_flight: Vec<OpKind>,
}

impl PendingOps {
    /// Mark `kind` as in flight. Returns false if it already was, in which
    /// case the caller must not start another one.
    pub fn begin(&mut self, kind: OpKind) -> bool {
        if self.is_busy(kind) {
            return false;
        }
        self.in_flight.push(kind);
        true
    }

    pub fn finish(&mut self, kind: OpKind) {
        self.in_flight.retain(|k| *k != kind);
    }

    pub fn is_busy(&self, kind: OpKind) -> bool {
        self.in_flight.contains(&kind)
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// The most recently started kind still in flight.
    pub fn current(&self) -> Option<OpKind> {
        self.in_flight.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_refuses_duplicate_kind() {
        let mut ops = PendingOps::default();
        assert!(ops.begin(OpKind::CreateTask));
        assert!(!ops.begin(OpKind::CreateTask));
        assert!(ops.begin(OpKind::DeleteTask));
        assert!(ops.is_busy(OpKind::CreateTask));
    }

    #[test]
    fn test_finish_releases_kind() {
        let mut ops = PendingOps::default();
        ops.begin(OpKind::ToggleTask);
        ops.finish(OpKind::ToggleTask);
        assert!(!ops.is_busy(OpKind::ToggleTask));
        assert!(ops.is_idle());
        assert!(ops.begin(OpKind::ToggleTask));
    }

    #[test]
    fn test_current_is_latest_started() {
        let mut ops = PendingOps::default();
        ops.begin(OpKind::LoadTasks);
        ops.begin(OpKind::DeleteTask);
        ops.begin(OpKind::CreateTask);
        assert_eq!(ops.current(), Some(OpKind::CreateTask));

        ops.finish(OpKind::CreateTask);
        assert_eq!(ops.current(), Some(OpKind::DeleteTask));
        ops.finish(OpKind::LoadTasks);
        assert_eq!(ops.current(), Some(OpKind::DeleteTask));
    }

    #[test]
    fn test_finish_unknown_is_harmless() {
        let mut ops = PendingOps::default();
        ops.finish(OpKind::LoadTasks);
        assert!(ops.is_idle());
        assert_eq!(ops.current(), None);
    }
}
