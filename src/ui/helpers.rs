//! Background operation helpers shared by input handlers.
//!
//! Every service call runs in its own tokio task guarded by a pending-op
//! flag. The task reports exactly one [`AppEvent`] back, even when it panics,
//! so the flag is always released.

use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;

use crate::app::{App, AppEvent, ConfirmAction, OpFailure};
use crate::controller::{CategoryDraft, TaskDraft};
use crate::model::{Category, Task};
use crate::store::OpKind;

/// Execute a future and catch any panic that occurs.
///
/// Returns the panic payload as a message so it can be reported as an
/// `AppEvent::TaskPanicked` instead of silently killing the task.
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

/// Spawn `work` under the `kind` busy flag.
///
/// Returns false (and spawns nothing) if an operation of the same kind is
/// already running.
pub(super) fn spawn_op<F>(app: &mut App, kind: OpKind, event_tx: &mpsc::Sender<AppEvent>, work: F) -> bool
where
    F: Future<Output = AppEvent> + Send + 'static,
{
    if !app.pending.begin(kind) {
        tracing::debug!(op = %kind, "Operation already in flight, ignoring");
        return false;
    }
    app.set_status(kind.progress_label());

    let tx = event_tx.clone();
    tokio::spawn(async move {
        let event = match catch_task_panic(work).await {
            Ok(event) => event,
            Err(error) => AppEvent::TaskPanicked { op: kind, error },
        };
        if let Err(e) = tx.send(event).await {
            tracing::warn!(error = %e, op = %kind, "Channel send failed (receiver dropped)");
        }
    });
    true
}

// ============================================================================
// Operations
// ============================================================================

pub(super) fn load_tasks(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let ctl = app.tasks.clone();
    spawn_op(app, OpKind::LoadTasks, event_tx, async move {
        AppEvent::TasksLoaded(ctl.load().await.map_err(|e| e.to_string()))
    });
}

pub(super) fn load_categories(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let ctl = app.categories.clone();
    spawn_op(app, OpKind::LoadCategories, event_tx, async move {
        AppEvent::CategoriesLoaded(ctl.load_or_seed().await.map_err(|e| e.to_string()))
    });
}

/// Submit a task form. `editing` is the task being edited, if any.
pub(super) fn save_task(
    app: &mut App,
    editing: Option<Task>,
    draft: TaskDraft,
    event_tx: &mpsc::Sender<AppEvent>,
) -> bool {
    let ctl = app.tasks.clone();
    match editing {
        None => spawn_op(app, OpKind::CreateTask, event_tx, async move {
            AppEvent::TaskCreated(ctl.create(&draft).await.map_err(|e| e.to_string()))
        }),
        Some(existing) => spawn_op(app, OpKind::UpdateTask, event_tx, async move {
            AppEvent::TaskUpdated(ctl.update(&existing, &draft).await.map_err(|e| e.to_string()))
        }),
    }
}

pub(super) fn toggle_task(app: &mut App, task: Task, event_tx: &mpsc::Sender<AppEvent>) {
    let ctl = app.tasks.clone();
    spawn_op(app, OpKind::ToggleTask, event_tx, async move {
        AppEvent::TaskToggled(ctl.toggle(&task).await.map_err(|e| e.to_string()))
    });
}

pub(super) fn save_category(
    app: &mut App,
    editing: Option<Category>,
    draft: CategoryDraft,
    event_tx: &mpsc::Sender<AppEvent>,
) -> bool {
    let ctl = app.categories.clone();
    match editing {
        None => spawn_op(app, OpKind::CreateCategory, event_tx, async move {
            AppEvent::CategoryCreated(ctl.create(&draft).await.map_err(|e| e.to_string()))
        }),
        Some(existing) => {
            let tasks = app.snapshot.tasks.clone();
            spawn_op(app, OpKind::UpdateCategory, event_tx, async move {
                AppEvent::CategoryUpdated(
                    ctl.update(&existing, &draft, &tasks)
                        .await
                        .map_err(OpFailure::from),
                )
            })
        }
    }
}

/// Run a confirmed (or unconfirmed, when confirmations are off) deletion.
///
/// Returns false when a deletion of the same kind is still running; the
/// user is told and nothing is started.
pub(super) fn run_confirmed(app: &mut App, action: ConfirmAction, event_tx: &mpsc::Sender<AppEvent>) -> bool {
    let started = match action {
        ConfirmAction::DeleteTask { id, title } => {
            tracing::debug!(task_id = %id, title = %title, "Deleting task");
            let ctl = app.tasks.clone();
            spawn_op(app, OpKind::DeleteTask, event_tx, async move {
                let result = ctl.delete(&id).await.map_err(|e| e.to_string());
                AppEvent::TaskDeleted { id, result }
            })
        }
        ConfirmAction::DeleteCompleted { .. } => {
            let ctl = app.tasks.clone();
            let tasks = app.snapshot.tasks.clone();
            spawn_op(app, OpKind::ClearCompleted, event_tx, async move {
                AppEvent::CompletedCleared(ctl.delete_completed(&tasks).await.map_err(|e| e.to_string()))
            })
        }
        ConfirmAction::DeleteCategory { id, .. } => {
            let Some(category) = app.snapshot.categories.iter().find(|c| c.id == id).cloned() else {
                app.set_error("Category no longer exists");
                return false;
            };
            let ctl = app.categories.clone();
            let categories = app.snapshot.categories.clone();
            let tasks = app.snapshot.tasks.clone();
            spawn_op(app, OpKind::DeleteCategory, event_tx, async move {
                let result = ctl
                    .delete(&category, &categories, &tasks)
                    .await
                    .map_err(OpFailure::from);
                AppEvent::CategoryDeleted { id, result }
            })
        }
    };
    if !started {
        app.set_status("Still deleting, try again in a moment");
    }
    started
}
