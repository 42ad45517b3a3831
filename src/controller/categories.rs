use std::sync::Arc;

use super::tasks::move_to_category;
use super::{ControllerError, Result};
use crate::model::{default_categories, Category, CategoryColor, CategoryIcon, Task, GENERAL_CATEGORY};
use crate::service::codec::{category_from_record, category_to_fields};
use crate::service::{Collection, FetchQuery, RecordService, ServiceError};
use crate::util::strip_control_chars;

/// Editable category fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CategoryDraft {
    pub name: String,
    pub icon: CategoryIcon,
    pub color: CategoryColor,
}

impl CategoryDraft {
    pub fn from_category(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            icon: category.icon,
            color: category.color,
        }
    }

    /// Name with control characters removed and whitespace trimmed.
    pub fn validated_name(&self) -> Result<String> {
        let name = strip_control_chars(&self.name).trim().to_string();
        if name.is_empty() {
            return Err(ControllerError::Validation("Category name is required"));
        }
        Ok(name)
    }
}

/// Outcome of a category update.
#[derive(Debug, Clone)]
pub struct CategoryRename {
    pub category: Category,
    /// Tasks moved from the old name to the new one.
    pub retagged: Vec<Task>,
}

/// Category operations against a record service.
#[derive(Clone)]
pub struct CategoryController {
    service: Arc<dyn RecordService>,
    page_size: u32,
}

impl CategoryController {
    pub fn new(service: Arc<dyn RecordService>, page_size: u32) -> Self {
        Self { service, page_size }
    }

    async fn fetch(&self) -> std::result::Result<Vec<Category>, ServiceError> {
        let records = self
            .service
            .fetch_records(Collection::Categories, &FetchQuery::ordered_by("Name", self.page_size))
            .await?;
        Ok(records
            .iter()
            .map(category_from_record)
            .filter(|c| !c.name.is_empty())
            .collect())
    }

    /// Fetch categories, seeding the defaults when the service has none.
    ///
    /// A seed that fails is logged and skipped. The returned list may still
    /// be empty, in which case callers keep their local fallback.
    pub async fn load_or_seed(&self) -> Result<Vec<Category>> {
        let categories = self.fetch().await?;
        if !categories.is_empty() {
            tracing::info!(count = categories.len(), "Categories loaded");
            return Ok(categories);
        }

        tracing::info!("No categories found, seeding defaults");
        for default in default_categories() {
            let fields = category_to_fields(&default.name, default.icon, default.color);
            if let Err(e) = self
                .service
                .create_record(Collection::Categories, fields)
                .await
            {
                tracing::warn!(name = %default.name, error = %e, "Failed to seed category");
            }
        }

        Ok(self.fetch().await?)
    }

    pub async fn create(&self, draft: &CategoryDraft) -> Result<Category> {
        let name = draft.validated_name()?;
        let record = self
            .service
            .create_record(
                Collection::Categories,
                category_to_fields(&name, draft.icon, draft.color),
            )
            .await?;

        tracing::info!(category_id = %record.id, name = %name, "Category created");
        Ok(Category {
            id: record.id,
            name,
            icon: draft.icon,
            color: draft.color,
        })
    }

    /// Update a category. On rename every task in `tasks` that references the
    /// old name is moved to the new one first.
    ///
    /// If a task move or the category write fails, the error carries the
    /// tasks already moved.
    pub async fn update(
        &self,
        existing: &Category,
        draft: &CategoryDraft,
        tasks: &[Task],
    ) -> Result<CategoryRename> {
        let name = draft.validated_name()?;

        let retagged = if name != existing.name {
            self.move_tasks(tasks, &existing.name, &name).await?
        } else {
            Vec::new()
        };

        let category = Category {
            id: existing.id.clone(),
            name,
            icon: draft.icon,
            color: draft.color,
        };
        let written = self
            .service
            .update_record(
                Collection::Categories,
                &category.id,
                category_to_fields(&category.name, category.icon, category.color),
            )
            .await;
        if let Err(source) = written {
            return Err(partial(retagged, source));
        }

        tracing::info!(
            category_id = %category.id,
            moved = retagged.len(),
            "Category updated"
        );
        Ok(CategoryRename { category, retagged })
    }

    /// Delete a category, reassigning its tasks to "General" first.
    ///
    /// Refuses to delete the last remaining category. Returns the reassigned
    /// tasks.
    pub async fn delete(
        &self,
        category: &Category,
        categories: &[Category],
        tasks: &[Task],
    ) -> Result<Vec<Task>> {
        if categories.len() <= 1 {
            return Err(ControllerError::LastCategory);
        }

        let reassigned = if category.name == GENERAL_CATEGORY {
            Vec::new()
        } else {
            self.move_tasks(tasks, &category.name, GENERAL_CATEGORY)
                .await?
        };

        let deleted = self
            .service
            .delete_records(Collection::Categories, &[category.id.clone()])
            .await;
        match deleted {
            Ok(ids) if ids.is_empty() => {
                tracing::debug!(category_id = %category.id, "Category absent on service")
            }
            Ok(_) => {
                tracing::info!(
                    category_id = %category.id,
                    reassigned = reassigned.len(),
                    "Category deleted"
                )
            }
            Err(source) => return Err(partial(reassigned, source)),
        }
        Ok(reassigned)
    }

    /// Move every task named `from` to `to`, stopping at the first failure.
    async fn move_tasks(&self, tasks: &[Task], from: &str, to: &str) -> Result<Vec<Task>> {
        let mut moved = Vec::new();
        for task in tasks.iter().filter(|t| t.category == from) {
            match move_to_category(self.service.as_ref(), task, to).await {
                Ok(task) => moved.push(task),
                Err(source) => {
                    tracing::warn!(task_id = %task.id, error = %source, "Task reassignment failed");
                    return Err(partial(moved, source));
                }
            }
        }
        Ok(moved)
    }
}

fn partial(completed: Vec<Task>, source: ServiceError) -> ControllerError {
    if completed.is_empty() {
        ControllerError::Remote(source)
    } else {
        ControllerError::Reassign { completed, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::testing::FailingService;
    use crate::controller::{TaskController, TaskDraft};
    use crate::model::Priority;
    use crate::service::SqliteService;
    use crate::view::filter::tests::today;
    use pretty_assertions::assert_eq;

    async fn setup() -> (TaskController, CategoryController) {
        let service: Arc<dyn RecordService> = Arc::new(SqliteService::open(":memory:").await.unwrap());
        (
            TaskController::new(service.clone(), 100),
            CategoryController::new(service, 100),
        )
    }

    fn task_in(category: &str, title: &str) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            description: "keep me".to_string(),
            priority: Priority::High,
            due_date: today(),
            category: category.to_string(),
            tags: "x".to_string(),
        }
    }

    fn draft(name: &str) -> CategoryDraft {
        CategoryDraft {
            name: name.to_string(),
            icon: CategoryIcon::Star,
            color: CategoryColor::Red,
        }
    }

    #[tokio::test]
    async fn test_load_seeds_defaults_once() {
        let (_, ctl) = setup().await;
        let first = ctl.load_or_seed().await.unwrap();
        assert_eq!(first.len(), 6);
        // Ordered by name
        assert_eq!(first[0].name, "Design");
        assert!(first.iter().all(|c| !c.is_local_default()));

        let second = ctl.load_or_seed().await.unwrap();
        assert_eq!(second.len(), 6);
    }

    #[tokio::test]
    async fn test_load_respects_page_size() {
        let service: Arc<dyn RecordService> = Arc::new(SqliteService::open(":memory:").await.unwrap());
        let ctl = CategoryController::new(service, 3);
        let page = ctl.load_or_seed().await.unwrap();
        let names: Vec<&str> = page.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Design", "Development", "Documentation"]);
    }

    #[tokio::test]
    async fn test_load_failure_is_remote_error() {
        let ctl = CategoryController::new(Arc::new(FailingService::default()), 100);
        assert!(matches!(
            ctl.load_or_seed().await,
            Err(ControllerError::Remote(_))
        ));
    }

    #[tokio::test]
    async fn test_create_strips_control_chars() {
        let (_, ctl) = setup().await;
        let cat = ctl.create(&draft(" Hob\u{7}bies ")).await.unwrap();
        assert_eq!(cat.name, "Hobbies");
        assert_eq!(cat.icon, CategoryIcon::Star);
        assert!(ctl.fetch().await.unwrap().iter().any(|c| c.name == "Hobbies"));
    }

    #[tokio::test]
    async fn test_empty_name_rejected_before_service() {
        let service = Arc::new(FailingService::default());
        let ctl = CategoryController::new(service.clone(), 100);
        let err = ctl.create(&draft(" \t ")).await.unwrap_err();
        assert!(matches!(err, ControllerError::Validation("Category name is required")));
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn test_delete_reassigns_tasks_to_general() {
        let (tasks_ctl, ctl) = setup().await;
        let categories = ctl.load_or_seed().await.unwrap();
        let work = categories.iter().find(|c| c.name == "Work").unwrap().clone();

        let a = tasks_ctl.create(&task_in("Work", "A")).await.unwrap();
        let b = tasks_ctl.create(&task_in("Work", "B")).await.unwrap();
        let c = tasks_ctl.create(&task_in("Personal", "C")).await.unwrap();
        let all = vec![a.clone(), b.clone(), c.clone()];

        let reassigned = ctl.delete(&work, &categories, &all).await.unwrap();
        assert_eq!(reassigned.len(), 2);
        for (before, after) in [(&a, &reassigned[0]), (&b, &reassigned[1])] {
            assert_eq!(after.category, "General");
            assert_eq!(after.title, before.title);
            assert_eq!(after.description, before.description);
            assert_eq!(after.priority, before.priority);
            assert_eq!(after.tags, before.tags);
        }

        let stored = tasks_ctl.load().await.unwrap();
        assert_eq!(stored.iter().filter(|t| t.category == "General").count(), 2);
        assert_eq!(tasks_ctl.get(&c.id).await.unwrap().unwrap().category, "Personal");
        assert!(!ctl.fetch().await.unwrap().iter().any(|c| c.name == "Work"));
    }

    #[tokio::test]
    async fn test_delete_last_category_refused() {
        let (_, ctl) = setup().await;
        let only = ctl.create(&draft("Only")).await.unwrap();
        let err = ctl.delete(&only, &[only.clone()], &[]).await.unwrap_err();
        assert!(matches!(err, ControllerError::LastCategory));
        assert_eq!(ctl.fetch().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_general_skips_reassignment() {
        let (tasks_ctl, ctl) = setup().await;
        let categories = ctl.load_or_seed().await.unwrap();
        let general = categories.iter().find(|c| c.name == "General").unwrap().clone();
        let t = tasks_ctl.create(&task_in("General", "Stay")).await.unwrap();

        let reassigned = ctl.delete(&general, &categories, &[t]).await.unwrap();
        assert!(reassigned.is_empty());
    }

    #[tokio::test]
    async fn test_rename_moves_tasks() {
        let (tasks_ctl, ctl) = setup().await;
        let categories = ctl.load_or_seed().await.unwrap();
        let design = categories.iter().find(|c| c.name == "Design").unwrap().clone();
        let t = tasks_ctl.create(&task_in("Design", "Mockups")).await.unwrap();

        let mut edit = CategoryDraft::from_category(&design);
        edit.name = "UX".to_string();
        let outcome = ctl.update(&design, &edit, &[t.clone()]).await.unwrap();

        assert_eq!(outcome.category.id, design.id);
        assert_eq!(outcome.category.name, "UX");
        assert_eq!(outcome.retagged.len(), 1);
        assert_eq!(tasks_ctl.get(&t.id).await.unwrap().unwrap().category, "UX");
    }

    #[tokio::test]
    async fn test_update_without_rename_touches_no_tasks() {
        let (tasks_ctl, ctl) = setup().await;
        let categories = ctl.load_or_seed().await.unwrap();
        let work = categories.iter().find(|c| c.name == "Work").unwrap().clone();
        let t = tasks_ctl.create(&task_in("Work", "Report")).await.unwrap();

        let mut edit = CategoryDraft::from_category(&work);
        edit.color = CategoryColor::Teal;
        let outcome = ctl.update(&work, &edit, &[t]).await.unwrap();
        assert!(outcome.retagged.is_empty());
        assert_eq!(outcome.category.color, CategoryColor::Teal);
    }

    #[tokio::test]
    async fn test_category_write_failure_reports_moved_tasks() {
        let (tasks_ctl, ctl) = setup().await;
        let t = tasks_ctl.create(&task_in("Work", "Report")).await.unwrap();
        // Not a service record, so the category write fails after the move.
        let local = default_categories()
            .into_iter()
            .find(|c| c.name == "Work")
            .unwrap();

        let err = ctl.update(&local, &draft("Job"), &[t.clone()]).await.unwrap_err();
        let moved = err.into_completed();
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].category, "Job");
    }
}
