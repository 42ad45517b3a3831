//! Authoritative in-memory store for tasks and categories.
//!
//! The store is the only owner of the collections. Every mutation bumps the
//! revision and publishes a [`Snapshot`] through a `watch` channel; views
//! subscribe instead of keeping their own copies.
//!
//! Mutations are applied only after the record service confirmed them, so the
//! store never holds state the service rejected.

mod pending;

pub use pending::{OpKind, PendingOps};

use std::sync::Arc;
use tokio::sync::watch;

use crate::model::{default_categories, Category, Task};

/// Immutable view of the store at one revision.
///
/// Collections are `Arc`-wrapped so cloning a snapshot is O(1).
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub tasks: Arc<Vec<Task>>,
    pub categories: Arc<Vec<Category>>,
    pub revision: u64,
}

impl Snapshot {
    /// Resolve a task's category name to its record, falling back to the
    /// first category for names that no longer exist.
    pub fn category_for(&self, name: &str) -> Option<&Category> {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .or_else(|| self.categories.first())
    }
}

pub struct Store {
    tasks: Arc<Vec<Task>>,
    categories: Arc<Vec<Category>>,
    revision: u64,
    tx: watch::Sender<Snapshot>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Empty task list; the local default categories stand in until a remote
    /// list is loaded.
    pub fn new() -> Self {
        let tasks = Arc::new(Vec::new());
        let categories = Arc::new(default_categories());
        let (tx, _rx) = watch::channel(Snapshot {
            tasks: Arc::clone(&tasks),
            categories: Arc::clone(&categories),
            revision: 0,
        });
        Self {
            tasks,
            categories,
            revision: 0,
            tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tasks: Arc::clone(&self.tasks),
            categories: Arc::clone(&self.categories),
            revision: self.revision,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    fn publish(&mut self) {
        self.revision += 1;
        // send_replace succeeds with or without receivers.
        self.tx.send_replace(self.snapshot());
    }

    // ========================================================================
    // Task Mutations
    // ========================================================================

    pub fn load_tasks(&mut self, tasks: Vec<Task>) {
        tracing::debug!(count = tasks.len(), "Loaded tasks into store");
        self.tasks = Arc::new(tasks);
        self.publish();
    }

    pub fn insert_task(&mut self, task: Task) {
        Arc::make_mut(&mut self.tasks).push(task);
        self.publish();
    }

    /// Replace the task with the same id. Returns false (and publishes
    /// nothing) when no such task exists.
    pub fn replace_task(&mut self, task: Task) -> bool {
        let Some(idx) = self.tasks.iter().position(|t| t.id == task.id) else {
            return false;
        };
        Arc::make_mut(&mut self.tasks)[idx] = task;
        self.publish();
        true
    }

    /// Replace several tasks in one revision; unknown ids are skipped.
    pub fn replace_tasks(&mut self, updated: Vec<Task>) -> usize {
        if updated.is_empty() {
            return 0;
        }
        let tasks = Arc::make_mut(&mut self.tasks);
        let mut replaced = 0;
        for task in updated {
            if let Some(slot) = tasks.iter_mut().find(|t| t.id == task.id) {
                *slot = task;
                replaced += 1;
            }
        }
        if replaced > 0 {
            self.publish();
        }
        replaced
    }

    /// Remove a task by id; absent ids are a no-op.
    pub fn remove_task(&mut self, id: &str) -> Option<Task> {
        let idx = self.tasks.iter().position(|t| t.id == id)?;
        let removed = Arc::make_mut(&mut self.tasks).remove(idx);
        self.publish();
        Some(removed)
    }

    pub fn remove_tasks(&mut self, ids: &[String]) -> usize {
        let before = self.tasks.len();
        Arc::make_mut(&mut self.tasks).retain(|t| !ids.contains(&t.id));
        let removed = before - self.tasks.len();
        if removed > 0 {
            self.publish();
        }
        removed
    }

    // ========================================================================
    // Category Mutations
    // ========================================================================

    pub fn load_categories(&mut self, categories: Vec<Category>) {
        tracing::debug!(count = categories.len(), "Loaded categories into store");
        self.categories = Arc::new(categories);
        self.publish();
    }

    pub fn insert_category(&mut self, category: Category) {
        Arc::make_mut(&mut self.categories).push(category);
        self.publish();
    }

    pub fn replace_category(&mut self, category: Category) -> bool {
        let Some(idx) = self.categories.iter().position(|c| c.id == category.id) else {
            return false;
        };
        Arc::make_mut(&mut self.categories)[idx] = category;
        self.publish();
        true
    }

    pub fn remove_category(&mut self, id: &str) -> Option<Category> {
        let idx = self.categories.iter().position(|c| c.id == id)?;
        let removed = Arc::make_mut(&mut self.categories).remove(idx);
        self.publish();
        Some(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::filter::tests::task;

    #[test]
    fn test_new_store_has_fallback_categories() {
        let store = Store::new();
        assert!(store.tasks().is_empty());
        assert_eq!(store.categories().len(), 6);
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_mutations_bump_revision_and_notify() {
        let mut store = Store::new();
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        store.insert_task(task("1", "A"));
        assert!(rx.has_changed().unwrap());
        let snap = rx.borrow_and_update().clone();
        assert_eq!(snap.revision, 1);
        assert_eq!(snap.tasks.len(), 1);
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_mutations() {
        let mut store = Store::new();
        store.insert_task(task("1", "A"));
        let snap = store.snapshot();
        store.insert_task(task("2", "B"));
        assert_eq!(snap.tasks.len(), 1);
        assert_eq!(store.tasks().len(), 2);
    }

    #[test]
    fn test_replace_unknown_task_is_noop() {
        let mut store = Store::new();
        store.insert_task(task("1", "A"));
        let rev = store.revision();
        assert!(!store.replace_task(task("9", "Z")));
        assert_eq!(store.revision(), rev);
        assert_eq!(store.task("1").unwrap().title, "A");
    }

    #[test]
    fn test_replace_tasks_single_revision() {
        let mut store = Store::new();
        store.load_tasks(vec![task("1", "A"), task("2", "B"), task("3", "C")]);
        let rev = store.revision();
        let replaced = store.replace_tasks(vec![task("1", "A2"), task("3", "C2"), task("8", "X")]);
        assert_eq!(replaced, 2);
        assert_eq!(store.revision(), rev + 1);
        assert_eq!(store.task("3").unwrap().title, "C2");
    }

    #[test]
    fn test_remove_task_absent_is_noop() {
        let mut store = Store::new();
        store.insert_task(task("1", "A"));
        assert!(store.remove_task("2").is_none());
        assert_eq!(store.remove_task("1").unwrap().id, "1");
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn test_remove_tasks_bulk() {
        let mut store = Store::new();
        store.load_tasks(vec![task("1", "A"), task("2", "B"), task("3", "C")]);
        let removed = store.remove_tasks(&["1".to_string(), "3".to_string()]);
        assert_eq!(removed, 2);
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn test_category_for_falls_back_to_first() {
        let snapshot = Store::new().snapshot();
        assert_eq!(snapshot.category_for("Work").unwrap().name, "Work");
        assert_eq!(snapshot.category_for("Gone").unwrap().name, "General");
    }

    #[test]
    fn test_category_mutations() {
        let mut store = Store::new();
        let mut work = store.categories()[1].clone();
        work.name = "Job".to_string();
        assert!(store.replace_category(work));
        assert!(store.category("default-2").is_some_and(|c| c.name == "Job"));
        assert!(store.remove_category("default-2").is_some());
        assert_eq!(store.categories().len(), 5);
    }
}
