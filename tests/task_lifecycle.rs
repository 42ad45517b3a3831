//! Integration tests for the task lifecycle: create, edit, toggle, filter,
//! recategorize, delete.
//!
//! Each test opens its own in-memory SQLite service and drives it through
//! the controllers, applying results to a store the way the UI does.

use chrono::{Days, NaiveDate};
use pretty_assertions::assert_eq;
use std::sync::Arc;

use taskflow::controller::{
    CategoryController, CategoryDraft, ControllerError, TaskController, TaskDraft,
};
use taskflow::model::{Category, CategoryColor, CategoryIcon, Priority};
use taskflow::service::{RecordService, SqliteService};
use taskflow::store::Store;
use taskflow::view::{visible_tasks, StatusFilter, TaskStats, ViewQuery};

struct Harness {
    tasks: TaskController,
    categories: CategoryController,
    store: Store,
}

async fn harness() -> Harness {
    let service: Arc<dyn RecordService> = Arc::new(SqliteService::open(":memory:").await.unwrap());
    Harness {
        tasks: TaskController::new(Arc::clone(&service), 100),
        categories: CategoryController::new(service, 100),
        store: Store::new(),
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

fn draft(title: &str, category: &str) -> TaskDraft {
    let mut draft = TaskDraft::new(today());
    draft.title = title.to_string();
    draft.category = category.to_string();
    draft
}

impl Harness {
    async fn add(&mut self, title: &str, category: &str) -> String {
        let task = self.tasks.create(&draft(title, category)).await.unwrap();
        let id = task.id.clone();
        self.store.insert_task(task);
        id
    }

    async fn seed_categories(&mut self) -> Vec<Category> {
        let categories = self.categories.load_or_seed().await.unwrap();
        self.store.load_categories(categories.clone());
        categories
    }

    fn category(&self, name: &str) -> Category {
        self.store
            .categories()
            .iter()
            .find(|c| c.name == name)
            .unwrap()
            .clone()
    }
}

#[tokio::test]
async fn test_created_tasks_survive_reload() {
    let mut h = harness().await;
    h.add("Write report", "Work").await;
    h.add("Buy milk", "Personal").await;

    let reloaded = h.tasks.load().await.unwrap();
    let mut titles: Vec<&str> = reloaded.iter().map(|t| t.title.as_str()).collect();
    titles.sort();
    assert_eq!(titles, vec!["Buy milk", "Write report"]);
}

#[tokio::test]
async fn test_empty_title_never_reaches_service() {
    let h = harness().await;
    let err = h.tasks.create(&draft("   ", "General")).await.unwrap_err();
    assert!(matches!(err, ControllerError::Validation(_)));
    assert!(h.tasks.load().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_edit_preserves_identity_and_completion() {
    let mut h = harness().await;
    let id = h.add("Draft", "General").await;
    let toggled = h.tasks.toggle(h.store.task(&id).unwrap()).await.unwrap();
    h.store.replace_task(toggled);

    let existing = h.store.task(&id).unwrap().clone();
    let mut edit = TaskDraft::from_task(&existing);
    edit.title = "Final".to_string();
    edit.priority = Priority::High;
    edit.tags = "q3, review".to_string();
    let updated = h.tasks.update(&existing, &edit).await.unwrap();

    assert_eq!(updated.id, id);
    assert_eq!(updated.created_at, existing.created_at);
    assert!(updated.completed);

    let fetched = h.tasks.get(&id).await.unwrap().unwrap();
    assert_eq!(fetched.title, "Final");
    assert_eq!(fetched.priority, Priority::High);
    assert_eq!(fetched.tags, vec!["q3".to_string(), "review".to_string()]);
    assert!(fetched.completed);
}

#[tokio::test]
async fn test_toggle_twice_restores_state() {
    let mut h = harness().await;
    let id = h.add("Flip", "General").await;
    let original = h.store.task(&id).unwrap().clone();

    let once = h.tasks.toggle(&original).await.unwrap();
    let twice = h.tasks.toggle(&once).await.unwrap();
    assert_eq!(twice.completed, original.completed);
    assert!(!h.tasks.get(&id).await.unwrap().unwrap().completed);
}

#[tokio::test]
async fn test_overdue_filter_and_stats_after_load() {
    let mut h = harness().await;
    let yesterday = today().checked_sub_days(Days::new(1)).unwrap();

    let mut late = draft("Late", "General");
    late.due_date = yesterday;
    h.tasks.create(&late).await.unwrap();

    let mut late_done = draft("Late but done", "General");
    late_done.due_date = yesterday;
    let done = h.tasks.create(&late_done).await.unwrap();
    h.tasks.toggle(&done).await.unwrap();

    h.add("On time", "General").await;

    h.store.load_tasks(h.tasks.load().await.unwrap());
    let query = ViewQuery {
        status: StatusFilter::Overdue,
        ..ViewQuery::default()
    };
    let overdue: Vec<&str> = visible_tasks(h.store.tasks(), &query, today())
        .iter()
        .map(|t| t.title.as_str())
        .collect();
    assert_eq!(overdue, vec!["Late"]);

    let stats = TaskStats::compute(h.store.tasks(), today());
    assert_eq!((stats.total, stats.completed, stats.pending, stats.overdue), (3, 1, 2, 1));
}

#[tokio::test]
async fn test_clear_completed_removes_only_completed() {
    let mut h = harness().await;
    let keep = h.add("Keep", "General").await;
    let drop = h.add("Drop", "General").await;
    let toggled = h.tasks.toggle(h.store.task(&drop).unwrap()).await.unwrap();
    h.store.replace_task(toggled);

    let removed = h.tasks.delete_completed(h.store.tasks()).await.unwrap();
    assert_eq!(removed, vec![drop.clone()]);
    h.store.remove_tasks(&removed);

    let remaining: Vec<String> = h.tasks.load().await.unwrap().into_iter().map(|t| t.id).collect();
    assert_eq!(remaining, vec![keep]);
    assert!(h.store.task(&drop).is_none());
}

#[tokio::test]
async fn test_categories_seed_once() {
    let mut h = harness().await;
    let first = h.seed_categories().await;
    let second = h.categories.load_or_seed().await.unwrap();

    assert_eq!(first.len(), 6);
    assert_eq!(second.len(), 6);
    // Seeded categories carry service-assigned ids, not the local fallback ones.
    assert!(first.iter().all(|c| c.id.parse::<i64>().is_ok()));
    assert!(first.iter().any(|c| c.name == "General"));
}

#[tokio::test]
async fn test_rename_category_moves_its_tasks() {
    let mut h = harness().await;
    h.seed_categories().await;
    let a = h.add("A", "Work").await;
    let b = h.add("B", "Personal").await;

    let work = h.category("Work");
    let rename = CategoryDraft {
        name: "Job".to_string(),
        icon: CategoryIcon::Briefcase,
        color: CategoryColor::Indigo,
    };
    let outcome = h
        .categories
        .update(&work, &rename, h.store.tasks())
        .await
        .unwrap();
    assert_eq!(outcome.retagged.len(), 1);
    h.store.replace_tasks(outcome.retagged);
    h.store.replace_category(outcome.category);

    assert_eq!(h.store.task(&a).unwrap().category, "Job");
    assert_eq!(h.store.task(&b).unwrap().category, "Personal");
    assert_eq!(h.tasks.get(&a).await.unwrap().unwrap().category, "Job");
    assert_eq!(h.store.category(&work.id).unwrap().color, CategoryColor::Indigo);
}

#[tokio::test]
async fn test_delete_category_reassigns_to_general() {
    let mut h = harness().await;
    h.seed_categories().await;
    let a = h.add("A", "Design").await;
    let b = h.add("B", "Design").await;
    let before = h.store.task(&a).unwrap().clone();

    let design = h.category("Design");
    let categories = h.store.categories().to_vec();
    let reassigned = h
        .categories
        .delete(&design, &categories, h.store.tasks())
        .await
        .unwrap();
    assert_eq!(reassigned.len(), 2);
    h.store.replace_tasks(reassigned);
    h.store.remove_category(&design.id);

    for id in [&a, &b] {
        assert_eq!(h.tasks.get(id).await.unwrap().unwrap().category, "General");
    }
    let after = h.store.task(&a).unwrap();
    assert_eq!(after.title, before.title);
    assert_eq!(after.due_date, before.due_date);
    assert_eq!(after.priority, before.priority);

    let remaining = h.categories.load_or_seed().await.unwrap();
    assert_eq!(remaining.len(), 5);
    assert!(remaining.iter().all(|c| c.name != "Design"));
}

#[tokio::test]
async fn test_last_category_cannot_be_deleted() {
    let h = harness().await;
    let only = h
        .categories
        .create(&CategoryDraft {
            name: "Solo".to_string(),
            ..CategoryDraft::default()
        })
        .await
        .unwrap();

    let err = h
        .categories
        .delete(&only, std::slice::from_ref(&only), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, ControllerError::LastCategory));
}

#[tokio::test]
async fn test_store_subscribers_see_each_mutation() {
    let mut h = harness().await;
    let mut rx = h.store.subscribe();
    let _ = rx.borrow_and_update();

    h.add("Watched", "General").await;
    assert!(rx.has_changed().unwrap());
    let snapshot = rx.borrow_and_update().clone();
    assert_eq!(snapshot.tasks.len(), 1);
    assert_eq!(snapshot.revision, h.store.revision());
}
