use chrono::{NaiveDate, Utc};
use serde_json::Value;
use std::sync::Arc;

use super::{ControllerError, Result};
use crate::model::{parse_tags, Priority, Task, GENERAL_CATEGORY};
use crate::service::codec::{task_from_record, task_to_fields};
use crate::service::{Collection, FetchQuery, Fields, RecordService, ServiceError};
use crate::view::SortKey;

/// Editable task fields as entered in the form.
///
/// Tags are kept as the raw comma-separated input and parsed on submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: NaiveDate,
    pub category: String,
    pub tags: String,
}

impl TaskDraft {
    /// Blank draft: medium priority, due today, in "General".
    pub fn new(today: NaiveDate) -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            priority: Priority::Medium,
            due_date: today,
            category: GENERAL_CATEGORY.to_string(),
            tags: String::new(),
        }
    }

    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            due_date: task.due_date,
            category: task.category.clone(),
            tags: task.tags.join(", "),
        }
    }

    /// Trimmed title, or a validation error when it is empty.
    pub fn validated_title(&self) -> Result<&str> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ControllerError::Validation("Task title is required"));
        }
        Ok(title)
    }
}

/// Task operations against a record service.
#[derive(Clone)]
pub struct TaskController {
    service: Arc<dyn RecordService>,
    page_size: u32,
}

impl TaskController {
    pub fn new(service: Arc<dyn RecordService>, page_size: u32) -> Self {
        Self { service, page_size }
    }

    /// Fetch up to one page of tasks ordered by due date.
    ///
    /// Records that cannot be decoded are skipped with a warning.
    pub async fn load(&self) -> Result<Vec<Task>> {
        let query = FetchQuery::ordered_by(SortKey::DueDate.record_field(), self.page_size);
        let records = self.service.fetch_records(Collection::Tasks, &query).await?;

        let tasks: Vec<Task> = records
            .iter()
            .filter_map(|record| match task_from_record(record) {
                Ok(task) => Some(task),
                Err(e) => {
                    tracing::warn!(record_id = %record.id, error = %e, "Skipping undecodable task record");
                    None
                }
            })
            .collect();

        tracing::info!(count = tasks.len(), "Tasks loaded");
        Ok(tasks)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Task>> {
        let record = self.service.get_record(Collection::Tasks, id).await?;
        Ok(record.as_ref().map(task_from_record).transpose()?)
    }

    /// Create a task from a draft. The service assigns the id.
    pub async fn create(&self, draft: &TaskDraft) -> Result<Task> {
        let title = draft.validated_title()?;
        let now = Utc::now();
        let mut task = Task {
            id: String::new(),
            title: title.to_string(),
            description: draft.description.trim().to_string(),
            completed: false,
            priority: draft.priority,
            due_date: draft.due_date,
            category: draft.category.clone(),
            tags: parse_tags(&draft.tags),
            created_at: now,
            updated_at: now,
        };

        let record = self
            .service
            .create_record(Collection::Tasks, task_to_fields(&task))
            .await?;
        task.id = record.id;

        tracing::info!(task_id = %task.id, "Task created");
        Ok(task)
    }

    /// Overwrite a task's editable fields.
    ///
    /// `id`, `created_at` and `completed` are carried over from `existing`.
    pub async fn update(&self, existing: &Task, draft: &TaskDraft) -> Result<Task> {
        let title = draft.validated_title()?;
        let task = Task {
            id: existing.id.clone(),
            title: title.to_string(),
            description: draft.description.trim().to_string(),
            completed: existing.completed,
            priority: draft.priority,
            due_date: draft.due_date,
            category: draft.category.clone(),
            tags: parse_tags(&draft.tags),
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };

        self.write(&task, task_to_fields(&task)).await?;
        tracing::info!(task_id = %task.id, "Task updated");
        Ok(task)
    }

    /// Flip the completed flag.
    pub async fn toggle(&self, existing: &Task) -> Result<Task> {
        let mut task = existing.clone();
        task.completed = !task.completed;
        task.updated_at = Utc::now();

        let mut fields = Fields::new();
        fields.insert(
            "completed".into(),
            Value::from(if task.completed { "completed" } else { "" }),
        );
        fields.insert("updated_at".into(), Value::from(task.updated_at.to_rfc3339()));

        self.write(&task, fields).await?;
        tracing::info!(task_id = %task.id, completed = task.completed, "Task toggled");
        Ok(task)
    }

    /// Delete one task. Returns whether the service still had it.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let deleted = self
            .service
            .delete_records(Collection::Tasks, &[id.to_string()])
            .await?;
        if deleted.is_empty() {
            tracing::debug!(task_id = %id, "Task already absent");
        } else {
            tracing::info!(task_id = %id, "Task deleted");
        }
        Ok(!deleted.is_empty())
    }

    /// Delete every completed task in one call.
    ///
    /// Returns only the ids the service confirmed; tasks it refused stay.
    pub async fn delete_completed(&self, tasks: &[Task]) -> Result<Vec<String>> {
        let ids: Vec<String> = tasks
            .iter()
            .filter(|t| t.completed)
            .map(|t| t.id.clone())
            .collect();
        if ids.is_empty() {
            return Ok(ids);
        }

        let deleted = self.service.delete_records(Collection::Tasks, &ids).await?;
        tracing::info!(
            requested = ids.len(),
            deleted = deleted.len(),
            "Completed tasks cleared"
        );
        Ok(deleted)
    }

    async fn write(&self, task: &Task, fields: Fields) -> Result<()> {
        match self
            .service
            .update_record(Collection::Tasks, &task.id, fields)
            .await
        {
            Ok(_) => Ok(()),
            Err(ServiceError::NotFound { id, .. }) => Err(ControllerError::NotFound(format!("Task {}", id))),
            Err(e) => Err(e.into()),
        }
    }
}

/// Point `task` at another category name and persist only that change.
pub(super) async fn move_to_category(
    service: &dyn RecordService,
    task: &Task,
    category: &str,
) -> std::result::Result<Task, ServiceError> {
    let mut moved = task.clone();
    moved.category = category.to_string();
    moved.updated_at = Utc::now();

    let mut fields = Fields::new();
    fields.insert("category".into(), Value::from(category));
    fields.insert("updated_at".into(), Value::from(moved.updated_at.to_rfc3339()));
    service
        .update_record(Collection::Tasks, &task.id, fields)
        .await?;
    Ok(moved)
}
