//! Application state for the TUI.
//!
//! `App` owns the [`Store`], the controllers and all view state (filters,
//! selection, open forms). Background operations report back through
//! [`AppEvent`]s which the UI loop applies to the store.

use chrono::{Local, NaiveDate};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use crate::config::Config;
use crate::controller::{CategoryController, CategoryDraft, CategoryRename, TaskController, TaskDraft};
use crate::model::{Category, CategoryColor, CategoryIcon, Task};
use crate::service::RecordService;
use crate::store::{OpKind, PendingOps, Snapshot, Store};
use crate::theme::Palette;
use crate::view::{visible_tasks, CategoryFilter, TaskStats, ViewQuery};

/// How long a status notice stays visible.
pub const STATUS_TTL: Duration = Duration::from_secs(3);

// ============================================================================
// Forms
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Title,
    Description,
    Priority,
    DueDate,
    Category,
    Tags,
}

impl TaskField {
    pub const ALL: [TaskField; 6] = [
        TaskField::Title,
        TaskField::Description,
        TaskField::Priority,
        TaskField::DueDate,
        TaskField::Category,
        TaskField::Tags,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TaskField::Title => "Title",
            TaskField::Description => "Description",
            TaskField::Priority => "Priority",
            TaskField::DueDate => "Due date",
            TaskField::Category => "Category",
            TaskField::Tags => "Tags",
        }
    }

    /// Fields edited by typing (the rest cycle with ←/→).
    pub fn is_text(self) -> bool {
        matches!(
            self,
            TaskField::Title | TaskField::Description | TaskField::DueDate | TaskField::Tags
        )
    }

    fn step(self, delta: isize) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0) as isize;
        let len = Self::ALL.len() as isize;
        Self::ALL[(idx + delta).rem_euclid(len) as usize]
    }
}

/// Add/edit task dialog.
#[derive(Debug, Clone)]
pub struct TaskForm {
    /// Id of the task being edited; `None` when creating.
    pub editing: Option<String>,
    pub draft: TaskDraft,
    /// Due date as typed; parsed on submit.
    pub due_input: String,
    pub field: TaskField,
    pub error: Option<Cow<'static, str>>,
}

impl TaskForm {
    pub fn create(today: NaiveDate) -> Self {
        let draft = TaskDraft::new(today);
        Self {
            editing: None,
            due_input: draft.due_date.format("%Y-%m-%d").to_string(),
            draft,
            field: TaskField::Title,
            error: None,
        }
    }

    pub fn edit(task: &Task) -> Self {
        let draft = TaskDraft::from_task(task);
        Self {
            editing: Some(task.id.clone()),
            due_input: draft.due_date.format("%Y-%m-%d").to_string(),
            draft,
            field: TaskField::Title,
            error: None,
        }
    }

    pub fn next_field(&mut self) {
        self.field = self.field.step(1);
    }

    pub fn prev_field(&mut self) {
        self.field = self.field.step(-1);
    }

    /// Text buffer behind the focused field, if it is a text field.
    pub fn text_mut(&mut self) -> Option<&mut String> {
        match self.field {
            TaskField::Title => Some(&mut self.draft.title),
            TaskField::Description => Some(&mut self.draft.description),
            TaskField::DueDate => Some(&mut self.due_input),
            TaskField::Tags => Some(&mut self.draft.tags),
            TaskField::Priority | TaskField::Category => None,
        }
    }

    /// Cycle the focused choice field. Category names come from `categories`.
    pub fn cycle(&mut self, forward: bool, categories: &[Category]) {
        match self.field {
            TaskField::Priority => {
                self.draft.priority = if forward {
                    self.draft.priority.next()
                } else {
                    self.draft.priority.prev()
                };
            }
            TaskField::Category if !categories.is_empty() => {
                let len = categories.len() as isize;
                let idx = categories
                    .iter()
                    .position(|c| c.name == self.draft.category)
                    .map(|i| i as isize)
                    .unwrap_or(-1);
                let next = if forward { idx + 1 } else { idx - 1 };
                self.draft.category = categories[next.rem_euclid(len) as usize].name.clone();
            }
            _ => {}
        }
    }

    /// Parse the typed due date into the draft.
    pub fn finalize(&mut self) -> Result<(), &'static str> {
        let due = NaiveDate::parse_from_str(self.due_input.trim(), "%Y-%m-%d")
            .map_err(|_| "Due date must be YYYY-MM-DD")?;
        self.draft.due_date = due;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryField {
    Name,
    Icon,
    Color,
}

impl CategoryField {
    pub fn next(self) -> Self {
        match self {
            CategoryField::Name => CategoryField::Icon,
            CategoryField::Icon => CategoryField::Color,
            CategoryField::Color => CategoryField::Name,
        }
    }
}

/// Add/edit category dialog.
#[derive(Debug, Clone)]
pub struct CategoryForm {
    pub editing: Option<String>,
    pub draft: CategoryDraft,
    pub field: CategoryField,
    pub error: Option<Cow<'static, str>>,
}

impl CategoryForm {
    pub fn create() -> Self {
        Self {
            editing: None,
            draft: CategoryDraft {
                name: String::new(),
                icon: CategoryIcon::Folder,
                color: CategoryColor::Blue,
            },
            field: CategoryField::Name,
            error: None,
        }
    }

    pub fn edit(category: &Category) -> Self {
        Self {
            editing: Some(category.id.clone()),
            draft: CategoryDraft::from_category(category),
            field: CategoryField::Name,
            error: None,
        }
    }

    pub fn cycle(&mut self, delta: isize) {
        match self.field {
            CategoryField::Icon => self.draft.icon = self.draft.icon.step(delta),
            CategoryField::Color => self.draft.color = self.draft.color.step(delta),
            CategoryField::Name => {}
        }
    }
}

/// Category manager panel.
#[derive(Debug, Clone, Default)]
pub struct CategoryPanel {
    pub selected: usize,
    pub form: Option<CategoryForm>,
}

// ============================================================================
// Confirmation Dialog
// ============================================================================

/// Pending confirmation for destructive operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteTask { id: String, title: String },
    DeleteCompleted { count: usize },
    /// `affected` tasks will move to "General".
    DeleteCategory { id: String, name: String, affected: usize },
}

// ============================================================================
// Modes and Events
// ============================================================================

/// What currently receives keyboard input.
#[derive(Debug, Clone)]
pub enum Mode {
    Browse,
    /// Typing into the search box.
    Search,
    /// Typing into the tag filter.
    TagFilter,
    TaskForm(TaskForm),
    Categories(CategoryPanel),
    Confirm(ConfirmAction),
    Help,
}

/// Severity of a status notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A failed operation and any records the service accepted before failing.
#[derive(Debug, Clone, Default)]
pub struct OpFailure {
    pub message: String,
    pub completed: Vec<Task>,
}

impl From<crate::controller::ControllerError> for OpFailure {
    fn from(err: crate::controller::ControllerError) -> Self {
        let message = err.to_string();
        Self {
            message,
            completed: err.into_completed(),
        }
    }
}

/// Results of background operations.
#[derive(Debug)]
pub enum AppEvent {
    TasksLoaded(Result<Vec<Task>, String>),
    CategoriesLoaded(Result<Vec<Category>, String>),
    TaskCreated(Result<Task, String>),
    TaskUpdated(Result<Task, String>),
    TaskToggled(Result<Task, String>),
    TaskDeleted { id: String, result: Result<bool, String> },
    CompletedCleared(Result<Vec<String>, String>),
    CategoryCreated(Result<Category, String>),
    CategoryUpdated(Result<CategoryRename, OpFailure>),
    CategoryDeleted { id: String, result: Result<Vec<Task>, OpFailure> },
    TaskPanicked { op: OpKind, error: String },
}

impl AppEvent {
    /// Operation kind this event completes.
    pub fn op(&self) -> OpKind {
        match self {
            AppEvent::TasksLoaded(_) => OpKind::LoadTasks,
            AppEvent::CategoriesLoaded(_) => OpKind::LoadCategories,
            AppEvent::TaskCreated(_) => OpKind::CreateTask,
            AppEvent::TaskUpdated(_) => OpKind::UpdateTask,
            AppEvent::TaskToggled(_) => OpKind::ToggleTask,
            AppEvent::TaskDeleted { .. } => OpKind::DeleteTask,
            AppEvent::CompletedCleared(_) => OpKind::ClearCompleted,
            AppEvent::CategoryCreated(_) => OpKind::CreateCategory,
            AppEvent::CategoryUpdated(_) => OpKind::UpdateCategory,
            AppEvent::CategoryDeleted { .. } => OpKind::DeleteCategory,
            AppEvent::TaskPanicked { op, .. } => *op,
        }
    }
}

// ============================================================================
// App
// ============================================================================

pub struct App {
    pub store: Store,
    /// Latest published store state; the UI renders from this.
    pub snapshot: Snapshot,
    pub snapshot_rx: watch::Receiver<Snapshot>,

    pub tasks: TaskController,
    pub categories: CategoryController,
    pub pending: PendingOps,

    pub query: ViewQuery,
    /// Index into the visible (filtered, sorted) task list.
    pub selected: usize,
    pub mode: Mode,
    pub confirm_deletes: bool,
    pub today: NaiveDate,

    pub status_message: Option<(Cow<'static, str>, NoticeLevel, Instant)>,
    pub needs_redraw: bool,
    pub palette: Palette,
}

impl App {
    pub fn new(service: Arc<dyn RecordService>, config: &Config) -> Self {
        let store = Store::new();
        let snapshot_rx = store.subscribe();
        let snapshot = store.snapshot();
        Self {
            store,
            snapshot,
            snapshot_rx,
            tasks: TaskController::new(Arc::clone(&service), config.page_size),
            categories: CategoryController::new(service, config.page_size),
            pending: PendingOps::default(),
            query: ViewQuery::with_sort(config.default_sort),
            selected: 0,
            mode: Mode::Browse,
            confirm_deletes: config.confirm_deletes,
            today: Local::now().date_naive(),
            status_message: None,
            needs_redraw: true,
            palette: Palette::default(),
        }
    }

    /// Pull the latest snapshot from the store subscription.
    ///
    /// Returns true when a newer revision was picked up.
    pub fn sync_snapshot(&mut self) -> bool {
        let latest = self.snapshot_rx.borrow_and_update().clone();
        if latest.revision == self.snapshot.revision {
            return false;
        }
        self.snapshot = latest;
        self.clamp_selection();
        self.needs_redraw = true;
        true
    }

    // ========================================================================
    // Derived Views
    // ========================================================================

    pub fn visible_tasks(&self) -> Vec<&Task> {
        visible_tasks(&self.snapshot.tasks, &self.query, self.today)
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.visible_tasks().get(self.selected).copied()
    }

    pub fn stats(&self) -> TaskStats {
        TaskStats::compute(&self.snapshot.tasks, self.today)
    }

    /// Category record for a task's category name (first category if unknown).
    pub fn category_for(&self, name: &str) -> Option<&Category> {
        self.snapshot.category_for(name)
    }

    pub fn clamp_selection(&mut self) {
        let len = self.visible_tasks().len();
        self.selected = self.selected.min(len.saturating_sub(1));
        if let Mode::Categories(panel) = &mut self.mode {
            panel.selected = panel
                .selected
                .min(self.snapshot.categories.len().saturating_sub(1));
        }
    }

    pub fn select_next(&mut self) {
        let len = self.visible_tasks().len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Step the category filter through All → each category → All.
    pub fn cycle_category_filter(&mut self) {
        let names: Vec<&str> = self
            .snapshot
            .categories
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        self.query.category = match &self.query.category {
            CategoryFilter::All => names
                .first()
                .map(|n| CategoryFilter::Named(n.to_string()))
                .unwrap_or(CategoryFilter::All),
            CategoryFilter::Named(current) => names
                .iter()
                .position(|n| n == current)
                .and_then(|i| names.get(i + 1))
                .map(|n| CategoryFilter::Named(n.to_string()))
                .unwrap_or(CategoryFilter::All),
        };
        self.selected = 0;
    }

    /// Start the confirmation for deleting the selected task, or return the
    /// action directly when confirmations are off.
    pub fn request_delete_task(&mut self) -> Option<ConfirmAction> {
        let task = self.selected_task()?;
        let action = ConfirmAction::DeleteTask {
            id: task.id.clone(),
            title: task.title.clone(),
        };
        self.confirm_or_run(action)
    }

    pub fn request_delete_completed(&mut self) -> Option<ConfirmAction> {
        let count = self.snapshot.tasks.iter().filter(|t| t.completed).count();
        if count == 0 {
            self.set_status("No completed tasks to clear");
            return None;
        }
        self.confirm_or_run(ConfirmAction::DeleteCompleted { count })
    }

    /// Category deletion always asks. Returns false when refused outright.
    pub fn request_delete_category(&mut self, index: usize) -> bool {
        if self.snapshot.categories.len() <= 1 {
            self.set_error("Cannot delete the last category");
            return false;
        }
        let Some(category) = self.snapshot.categories.get(index) else {
            return false;
        };
        let affected = self
            .snapshot
            .tasks
            .iter()
            .filter(|t| t.category == category.name)
            .count();
        let action = ConfirmAction::DeleteCategory {
            id: category.id.clone(),
            name: category.name.clone(),
            affected,
        };
        self.mode = Mode::Confirm(action);
        true
    }

    fn confirm_or_run(&mut self, action: ConfirmAction) -> Option<ConfirmAction> {
        if self.confirm_deletes {
            self.mode = Mode::Confirm(action);
            None
        } else {
            Some(action)
        }
    }

    // ========================================================================
    // Status Notices
    // ========================================================================

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), NoticeLevel::Info, Instant::now()));
    }

    pub fn set_error(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), NoticeLevel::Error, Instant::now()));
    }

    /// Clear status message if expired. Returns true if one was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, _, time)) = &self.status_message {
            if time.elapsed() >= STATUS_TTL {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    /// Roll `today` over at midnight. Returns true when it changed.
    pub fn refresh_today(&mut self) -> bool {
        let now = Local::now().date_naive();
        if now == self.today {
            return false;
        }
        self.today = now;
        true
    }

    pub fn is_busy(&self, kind: OpKind) -> bool {
        self.pending.is_busy(kind)
    }
}

// ============================================================================
// Tests
// ============================================================================
