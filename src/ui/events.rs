//! Application event handling.
//!
//! Applies the results of background operations to the store and reports
//! them in the status bar. Every event releases its pending-op flag first.

use crate::app::{App, AppEvent, Mode};
use crate::controller::{
    CATEGORY_CREATED, CATEGORY_DELETED, CATEGORY_UPDATED, TASK_COMPLETED, TASK_CREATED,
    TASK_DELETED, TASK_REOPENED, TASK_UPDATED,
};
use crate::view::CategoryFilter;

pub(super) fn handle_app_event(app: &mut App, event: AppEvent) {
    app.pending.finish(event.op());
    app.status_message = None;

    match event {
        AppEvent::TasksLoaded(Ok(tasks)) => {
            app.store.load_tasks(tasks);
        }
        AppEvent::TasksLoaded(Err(e)) => {
            tracing::error!(error = %e, "Failed to load tasks");
            app.set_error(format!("Failed to load tasks: {}", e));
        }

        AppEvent::CategoriesLoaded(Ok(categories)) => {
            if categories.is_empty() {
                tracing::warn!("Service returned no categories, keeping local defaults");
            } else {
                app.store.load_categories(categories);
            }
        }
        AppEvent::CategoriesLoaded(Err(e)) => {
            tracing::error!(error = %e, "Failed to load categories");
            app.set_error(format!("Failed to load categories: {}", e));
        }

        AppEvent::TaskCreated(Ok(task)) => {
            app.store.insert_task(task);
            close_task_form(app);
            app.set_status(TASK_CREATED);
        }
        AppEvent::TaskUpdated(Ok(task)) => {
            if !app.store.replace_task(task) {
                tracing::debug!("Updated task no longer in store");
            }
            close_task_form(app);
            app.set_status(TASK_UPDATED);
        }
        AppEvent::TaskCreated(Err(e)) | AppEvent::TaskUpdated(Err(e)) => {
            tracing::error!(error = %e, "Failed to save task");
            // Keep the form open so the input is not lost.
            if let Mode::TaskForm(form) = &mut app.mode {
                form.error = Some(e.clone().into());
            }
            app.set_error(e);
        }

        AppEvent::TaskToggled(Ok(task)) => {
            let completed = task.completed;
            app.store.replace_task(task);
            app.set_status(if completed { TASK_COMPLETED } else { TASK_REOPENED });
        }
        AppEvent::TaskToggled(Err(e)) => {
            tracing::error!(error = %e, "Failed to toggle task");
            app.set_error(e);
        }

        AppEvent::TaskDeleted { id, result: Ok(_) } => {
            app.store.remove_task(&id);
            app.set_status(TASK_DELETED);
        }
        AppEvent::TaskDeleted { id, result: Err(e) } => {
            tracing::error!(task_id = %id, error = %e, "Failed to delete task");
            app.set_error(e);
        }

        AppEvent::CompletedCleared(Ok(ids)) => {
            let removed = app.store.remove_tasks(&ids);
            let kept = app.store.tasks().iter().filter(|t| t.completed).count();
            if kept == 0 {
                app.set_status(format!("Cleared {} completed task(s)", removed));
            } else {
                tracing::warn!(removed, kept, "Some completed tasks were not deleted");
                app.set_error(format!(
                    "Cleared {} completed task(s), {} could not be deleted",
                    removed, kept
                ));
            }
        }
        AppEvent::CompletedCleared(Err(e)) => {
            tracing::error!(error = %e, "Failed to clear completed tasks");
            app.set_error(e);
        }

        AppEvent::CategoryCreated(Ok(category)) => {
            app.store.insert_category(category);
            close_category_form(app);
            app.set_status(CATEGORY_CREATED);
        }
        AppEvent::CategoryCreated(Err(e)) => {
            tracing::error!(error = %e, "Failed to create category");
            set_category_form_error(app, &e);
            app.set_error(e);
        }

        AppEvent::CategoryUpdated(Ok(outcome)) => {
            let old_name = app
                .store
                .category(&outcome.category.id)
                .map(|c| c.name.clone());
            app.store.replace_tasks(outcome.retagged);
            let new_name = outcome.category.name.clone();
            app.store.replace_category(outcome.category);
            if let Some(old) = old_name {
                follow_rename(app, &old, &new_name);
            }
            close_category_form(app);
            app.set_status(CATEGORY_UPDATED);
        }
        AppEvent::CategoryUpdated(Err(failure)) => {
            tracing::error!(
                error = %failure.message,
                moved = failure.completed.len(),
                "Failed to update category"
            );
            app.store.replace_tasks(failure.completed);
            set_category_form_error(app, &failure.message);
            app.set_error(failure.message);
        }

        AppEvent::CategoryDeleted { id, result: Ok(reassigned) } => {
            app.store.replace_tasks(reassigned);
            if let Some(removed) = app.store.remove_category(&id) {
                if app.query.category == CategoryFilter::Named(removed.name) {
                    app.query.category = CategoryFilter::All;
                }
            }
            app.set_status(CATEGORY_DELETED);
        }
        AppEvent::CategoryDeleted { id, result: Err(failure) } => {
            tracing::error!(
                category_id = %id,
                error = %failure.message,
                reassigned = failure.completed.len(),
                "Failed to delete category"
            );
            app.store.replace_tasks(failure.completed);
            app.set_error(failure.message);
        }

        AppEvent::TaskPanicked { op, error } => {
            tracing::error!(op = %op, error = %error, "Background task panicked");
            app.set_error(format!("Internal error in {} task", op));
        }
    }
    if app.status_message.is_none() {
        if let Some(op) = app.pending.current() {
            app.set_status(op.progress_label());
        }
    }
    app.needs_redraw = true;
}

fn close_task_form(app: &mut App) {
    if matches!(app.mode, Mode::TaskForm(_)) {
        app.mode = Mode::Browse;
    }
}

fn close_category_form(app: &mut App) {
    if let Mode::Categories(panel) = &mut app.mode {
        panel.form = None;
    }
}

fn set_category_form_error(app: &mut App, message: &str) {
    if let Mode::Categories(panel) = &mut app.mode {
        if let Some(form) = &mut panel.form {
            form.error = Some(message.to_string().into());
        }
    }
}

/// Keep an active category filter pointing at a renamed category.
fn follow_rename(app: &mut App, old: &str, new: &str) {
    if let CategoryFilter::Named(current) = &app.query.category {
        if current == old {
            app.query.category = CategoryFilter::Named(new.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{NoticeLevel, OpFailure, TaskForm};
    use crate::config::Config;
    use crate::controller::CategoryRename;
    use crate::service::SqliteService;
    use crate::store::OpKind;
    use crate::view::filter::tests::{task, today};
    use std::sync::Arc;

    async fn test_app() -> App {
        let service = SqliteService::open(":memory:").await.unwrap();
        App::new(Arc::new(service), &Config::default())
    }

    fn notice(app: &App) -> (&str, NoticeLevel) {
        let (msg, level, _) = app.status_message.as_ref().unwrap();
        (msg.as_ref(), *level)
    }

    #[tokio::test]
    async fn test_created_task_lands_in_store_and_closes_form() {
        let mut app = test_app().await;
        app.pending.begin(OpKind::CreateTask);
        app.mode = Mode::TaskForm(TaskForm::create(today()));

        handle_app_event(&mut app, AppEvent::TaskCreated(Ok(task("1", "New"))));

        assert_eq!(app.store.tasks().len(), 1);
        assert!(matches!(app.mode, Mode::Browse));
        assert!(!app.pending.is_busy(OpKind::CreateTask));
        assert_eq!(notice(&app), (TASK_CREATED, NoticeLevel::Info));
    }

    #[tokio::test]
    async fn test_failed_save_keeps_form_and_store() {
        let mut app = test_app().await;
        app.mode = Mode::TaskForm(TaskForm::create(today()));

        handle_app_event(&mut app, AppEvent::TaskCreated(Err("offline".to_string())));

        assert!(app.store.tasks().is_empty());
        let Mode::TaskForm(form) = &app.mode else {
            panic!("form closed");
        };
        assert_eq!(form.error.as_deref(), Some("offline"));
        assert_eq!(notice(&app).1, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_toggle_notices() {
        let mut app = test_app().await;
        app.store.load_tasks(vec![task("1", "A")]);

        let mut done = task("1", "A");
        done.completed = true;
        handle_app_event(&mut app, AppEvent::TaskToggled(Ok(done)));
        assert_eq!(notice(&app).0, TASK_COMPLETED);
        assert!(app.store.task("1").unwrap().completed);

        handle_app_event(&mut app, AppEvent::TaskToggled(Ok(task("1", "A"))));
        assert_eq!(notice(&app).0, TASK_REOPENED);
    }

    #[tokio::test]
    async fn test_load_failure_leaves_store_unchanged() {
        let mut app = test_app().await;
        app.store.load_tasks(vec![task("1", "A")]);
        let rev = app.store.revision();

        handle_app_event(&mut app, AppEvent::TasksLoaded(Err("timeout".to_string())));
        assert_eq!(app.store.revision(), rev);
        assert_eq!(notice(&app).1, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_empty_category_load_keeps_fallback() {
        let mut app = test_app().await;
        handle_app_event(&mut app, AppEvent::CategoriesLoaded(Ok(Vec::new())));
        assert_eq!(app.store.categories().len(), 6);
    }

    #[tokio::test]
    async fn test_category_delete_applies_reassignment_and_resets_filter() {
        let mut app = test_app().await;
        let mut t = task("1", "A");
        t.category = "Work".to_string();
        app.store.load_tasks(vec![t.clone()]);
        app.query.category = CategoryFilter::Named("Work".to_string());

        let mut moved = t;
        moved.category = "General".to_string();
        handle_app_event(
            &mut app,
            AppEvent::CategoryDeleted {
                id: "default-2".to_string(),
                result: Ok(vec![moved]),
            },
        );

        assert_eq!(app.store.task("1").unwrap().category, "General");
        assert!(app.store.category("default-2").is_none());
        assert_eq!(app.query.category, CategoryFilter::All);
        assert_eq!(notice(&app).0, CATEGORY_DELETED);
    }

    #[tokio::test]
    async fn test_partial_category_delete_mirrors_completed_moves() {
        let mut app = test_app().await;
        let mut a = task("1", "A");
        a.category = "Work".to_string();
        let mut b = task("2", "B");
        b.category = "Work".to_string();
        app.store.load_tasks(vec![a.clone(), b]);

        let mut moved = a;
        moved.category = "General".to_string();
        handle_app_event(
            &mut app,
            AppEvent::CategoryDeleted {
                id: "default-2".to_string(),
                result: Err(OpFailure {
                    message: "network down".to_string(),
                    completed: vec![moved],
                }),
            },
        );

        assert_eq!(app.store.task("1").unwrap().category, "General");
        assert_eq!(app.store.task("2").unwrap().category, "Work");
        assert!(app.store.category("default-2").is_some());
    }

    #[tokio::test]
    async fn test_rename_updates_filter() {
        let mut app = test_app().await;
        app.query.category = CategoryFilter::Named("Work".to_string());
        let mut renamed = app.store.category("default-2").unwrap().clone();
        renamed.name = "Job".to_string();

        handle_app_event(
            &mut app,
            AppEvent::CategoryUpdated(Ok(CategoryRename {
                category: renamed,
                retagged: Vec::new(),
            })),
        );
        assert_eq!(app.query.category, CategoryFilter::Named("Job".to_string()));
        assert_eq!(app.store.category("default-2").unwrap().name, "Job");
    }

    #[tokio::test]
    async fn test_partial_clear_keeps_refused_tasks() {
        let mut app = test_app().await;
        let mut a = task("1", "A");
        a.completed = true;
        let mut b = task("2", "B");
        b.completed = true;
        app.store.load_tasks(vec![a, b, task("3", "C")]);
        app.pending.begin(OpKind::ClearCompleted);

        handle_app_event(&mut app, AppEvent::CompletedCleared(Ok(vec!["1".to_string()])));

        assert!(app.store.task("1").is_none());
        assert!(app.store.task("2").is_some());
        assert_eq!(app.store.tasks().len(), 2);
        assert_eq!(
            notice(&app),
            ("Cleared 1 completed task(s), 1 could not be deleted", NoticeLevel::Error)
        );
    }

    #[tokio::test]
    async fn test_progress_label_survives_other_completion() {
        let mut app = test_app().await;
        app.pending.begin(OpKind::LoadTasks);
        app.pending.begin(OpKind::DeleteTask);

        handle_app_event(&mut app, AppEvent::TasksLoaded(Ok(vec![task("1", "A")])));

        assert!(app.pending.is_busy(OpKind::DeleteTask));
        assert_eq!(notice(&app), ("Deleting task...", NoticeLevel::Info));
    }

    #[tokio::test]
    async fn test_panic_releases_pending_flag() {
        let mut app = test_app().await;
        app.pending.begin(OpKind::DeleteTask);
        handle_app_event(
            &mut app,
            AppEvent::TaskPanicked {
                op: OpKind::DeleteTask,
                error: "boom".to_string(),
            },
        );
        assert!(app.pending.is_idle());
    }
}
