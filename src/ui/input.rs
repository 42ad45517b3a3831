//! Keyboard input handling.
//!
//! Dispatch is by [`Mode`]: overlays (confirm, help, forms) capture every
//! key while open. Modal state is taken out of `app.mode` while it is being
//! edited and put back unless the handler closed it.

use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use crate::app::{
    App, AppEvent, CategoryField, CategoryForm, CategoryPanel, ConfirmAction, Mode, TaskForm,
};
use crate::store::OpKind;
use crate::util::MAX_FILTER_LENGTH;

use super::helpers;
use super::Action;

/// Main input dispatch function.
pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    match std::mem::replace(&mut app.mode, Mode::Browse) {
        Mode::Browse => return handle_browse_input(app, code, event_tx),
        Mode::Search => handle_filter_input(app, code, true),
        Mode::TagFilter => handle_filter_input(app, code, false),
        Mode::Help => {
            if !matches!(code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?')) {
                app.mode = Mode::Help;
            }
        }
        Mode::Confirm(action) => match code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                let back_to_categories = matches!(action, ConfirmAction::DeleteCategory { .. });
                helpers::run_confirmed(app, action, event_tx);
                if back_to_categories {
                    app.mode = Mode::Categories(CategoryPanel::default());
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                if matches!(action, ConfirmAction::DeleteCategory { .. }) {
                    app.mode = Mode::Categories(CategoryPanel::default());
                }
                app.set_status("Cancelled");
            }
            _ => app.mode = Mode::Confirm(action),
        },
        Mode::TaskForm(form) => handle_task_form_input(app, form, code, event_tx),
        Mode::Categories(panel) => handle_categories_input(app, panel, code, event_tx),
    }
    Action::Continue
}

fn handle_browse_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) -> Action {
    match code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Esc => {
            if app.query.has_narrowing_filters() || !app.query.search.is_empty() {
                app.query.search.clear();
                app.query.clear_filters();
                app.selected = 0;
                app.set_status("Filters cleared");
            }
        }
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev(),
        KeyCode::Char('g') | KeyCode::Home => app.selected = 0,
        KeyCode::Char('G') | KeyCode::End => {
            app.selected = app.visible_tasks().len().saturating_sub(1);
        }

        KeyCode::Char('n') => app.mode = Mode::TaskForm(TaskForm::create(app.today)),
        KeyCode::Char('e') | KeyCode::Enter => {
            if let Some(form) = app.selected_task().map(TaskForm::edit) {
                app.mode = Mode::TaskForm(form);
            }
        }
        KeyCode::Char(' ') => {
            if app.is_busy(OpKind::ToggleTask) {
                return Action::Continue;
            }
            if let Some(task) = app.selected_task().cloned() {
                helpers::toggle_task(app, task, event_tx);
            }
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            if let Some(action) = app.request_delete_task() {
                helpers::run_confirmed(app, action, event_tx);
            }
        }
        KeyCode::Char('D') => {
            if let Some(action) = app.request_delete_completed() {
                helpers::run_confirmed(app, action, event_tx);
            }
        }

        KeyCode::Char('/') => app.mode = Mode::Search,
        KeyCode::Char('t') => app.mode = Mode::TagFilter,
        KeyCode::Char('s') => {
            app.query.status = app.query.status.next();
            app.selected = 0;
        }
        KeyCode::Char('c') => app.cycle_category_filter(),
        KeyCode::Char('o') => {
            app.query.sort = app.query.sort.next();
            app.set_status(format!("Sort: {}", app.query.sort.label()));
        }
        KeyCode::Char('x') => {
            app.query.clear_filters();
            app.selected = 0;
        }

        KeyCode::Char('C') => app.mode = Mode::Categories(CategoryPanel::default()),
        KeyCode::Char('r') => {
            helpers::load_tasks(app, event_tx);
            helpers::load_categories(app, event_tx);
        }
        KeyCode::Char('?') => app.mode = Mode::Help,
        _ => {}
    }
    Action::Continue
}

/// Typing into the search box (`search = true`) or the tag filter.
fn handle_filter_input(app: &mut App, code: KeyCode, search: bool) {
    let mode = if search { Mode::Search } else { Mode::TagFilter };
    let buffer = if search {
        &mut app.query.search
    } else {
        &mut app.query.tag
    };
    match code {
        KeyCode::Esc => {
            buffer.clear();
            app.selected = 0;
            return;
        }
        KeyCode::Enter => return,
        KeyCode::Backspace => {
            buffer.pop();
        }
        KeyCode::Char(c) if !c.is_control() => {
            if buffer.len() < MAX_FILTER_LENGTH {
                buffer.push(c);
            }
        }
        _ => {}
    }
    app.selected = 0;
    app.mode = mode;
}

fn handle_task_form_input(
    app: &mut App,
    mut form: TaskForm,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    match code {
        KeyCode::Esc => return,
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.prev_field(),
        KeyCode::Left if !form.field.is_text() => form.cycle(false, &app.snapshot.categories),
        KeyCode::Right if !form.field.is_text() => form.cycle(true, &app.snapshot.categories),
        KeyCode::Enter => {
            submit_task_form(app, form, event_tx);
            return;
        }
        KeyCode::Backspace => {
            if let Some(text) = form.text_mut() {
                text.pop();
            }
        }
        KeyCode::Char(c) if !c.is_control() => {
            if let Some(text) = form.text_mut() {
                text.push(c);
            } else if c == ' ' {
                form.cycle(true, &app.snapshot.categories);
            }
        }
        _ => {}
    }
    app.mode = Mode::TaskForm(form);
}

fn submit_task_form(app: &mut App, mut form: TaskForm, event_tx: &mpsc::Sender<AppEvent>) {
    if let Err(msg) = form.finalize() {
        form.error = Some(msg.into());
        app.mode = Mode::TaskForm(form);
        return;
    }
    let draft = form.draft.clone();
    if let Err(e) = draft.validated_title() {
        form.error = Some(e.to_string().into());
        app.mode = Mode::TaskForm(form);
        return;
    }

    let editing = match &form.editing {
        Some(id) => match app.store.task(id) {
            Some(task) => Some(task.clone()),
            None => {
                app.set_error("Task no longer exists");
                return;
            }
        },
        None => None,
    };
    form.error = None;
    // The form stays open until the service answers.
    app.mode = Mode::TaskForm(form);
    if !helpers::save_task(app, editing, draft, event_tx) {
        app.set_status("Still saving the previous change...");
    }
}

fn handle_categories_input(
    app: &mut App,
    mut panel: CategoryPanel,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    if let Some(form) = panel.form.take() {
        panel.form = handle_category_form_input(app, form, code, event_tx);
        app.mode = Mode::Categories(panel);
        return;
    }

    let count = app.snapshot.categories.len();
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('C') => return,
        KeyCode::Char('j') | KeyCode::Down => {
            panel.selected = (panel.selected + 1).min(count.saturating_sub(1));
        }
        KeyCode::Char('k') | KeyCode::Up => panel.selected = panel.selected.saturating_sub(1),
        KeyCode::Char('n') => panel.form = Some(CategoryForm::create()),
        KeyCode::Char('e') | KeyCode::Enter => {
            if let Some(category) = app.snapshot.categories.get(panel.selected) {
                panel.form = Some(CategoryForm::edit(category));
            }
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            if app.is_busy(OpKind::DeleteCategory) {
                app.set_status(OpKind::DeleteCategory.progress_label());
            } else if app.request_delete_category(panel.selected) {
                // Confirm mode is now active.
                return;
            }
        }
        _ => {}
    }
    app.mode = Mode::Categories(panel);
}

/// Returns the form if it should stay open.
fn handle_category_form_input(
    app: &mut App,
    mut form: CategoryForm,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Option<CategoryForm> {
    match code {
        KeyCode::Esc => return None,
        KeyCode::Tab | KeyCode::Down => form.field = form.field.next(),
        KeyCode::Left => form.cycle(-1),
        KeyCode::Right => form.cycle(1),
        KeyCode::Backspace if form.field == CategoryField::Name => {
            form.draft.name.pop();
        }
        KeyCode::Char(c) if form.field == CategoryField::Name && !c.is_control() => {
            form.draft.name.push(c);
        }
        KeyCode::Enter => {
            if let Err(e) = form.draft.validated_name() {
                form.error = Some(e.to_string().into());
                return Some(form);
            }
            let editing = match &form.editing {
                Some(id) => match app.snapshot.categories.iter().find(|c| &c.id == id) {
                    Some(category) => Some(category.clone()),
                    None => {
                        app.set_error("Category no longer exists");
                        return None;
                    }
                },
                None => None,
            };
            form.error = None;
            if !helpers::save_category(app, editing, form.draft.clone(), event_tx) {
                app.set_status("Still saving the previous change...");
            }
        }
        _ => {}
    }
    Some(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::service::SqliteService;
    use crate::view::filter::tests::task;
    use crate::view::StatusFilter;
    use std::sync::Arc;

    async fn test_app() -> (App, mpsc::Sender<AppEvent>, mpsc::Receiver<AppEvent>) {
        let service = SqliteService::open(":memory:").await.unwrap();
        let app = App::new(Arc::new(service), &Config::default());
        let (tx, rx) = mpsc::channel(8);
        (app, tx, rx)
    }

    fn press(app: &mut App, tx: &mpsc::Sender<AppEvent>, code: KeyCode) -> Action {
        handle_input(app, code, KeyModifiers::NONE, tx)
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let (mut app, tx, _rx) = test_app().await;
        assert!(matches!(press(&mut app, &tx, KeyCode::Char('q')), Action::Quit));
        assert!(matches!(
            handle_input(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL, &tx),
            Action::Quit
        ));
    }

    #[tokio::test]
    async fn test_search_typing_updates_query() {
        let (mut app, tx, _rx) = test_app().await;
        press(&mut app, &tx, KeyCode::Char('/'));
        for c in "api".chars() {
            press(&mut app, &tx, KeyCode::Char(c));
        }
        press(&mut app, &tx, KeyCode::Backspace);
        assert_eq!(app.query.search, "ap");
        assert!(matches!(app.mode, Mode::Search));

        press(&mut app, &tx, KeyCode::Enter);
        assert!(matches!(app.mode, Mode::Browse));
        assert_eq!(app.query.search, "ap");

        press(&mut app, &tx, KeyCode::Esc);
        assert!(app.query.search.is_empty());
    }

    #[tokio::test]
    async fn test_status_cycle_key() {
        let (mut app, tx, _rx) = test_app().await;
        press(&mut app, &tx, KeyCode::Char('s'));
        assert_eq!(app.query.status, StatusFilter::Pending);
    }

    #[tokio::test]
    async fn test_empty_title_submit_stays_local() {
        let (mut app, tx, mut rx) = test_app().await;
        press(&mut app, &tx, KeyCode::Char('n'));
        press(&mut app, &tx, KeyCode::Enter);

        let Mode::TaskForm(form) = &app.mode else {
            panic!("form closed");
        };
        assert_eq!(form.error.as_deref(), Some("Task title is required"));
        assert!(app.pending.is_idle());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_create_task_round_trip() {
        let (mut app, tx, mut rx) = test_app().await;
        press(&mut app, &tx, KeyCode::Char('n'));
        for c in "Plan sprint".chars() {
            press(&mut app, &tx, KeyCode::Char(c));
        }
        press(&mut app, &tx, KeyCode::Enter);
        assert!(app.pending.is_busy(OpKind::CreateTask));

        let event = rx.recv().await.unwrap();
        super::super::events::handle_app_event(&mut app, event);
        assert!(app.pending.is_idle());
        assert!(matches!(app.mode, Mode::Browse));
        assert_eq!(app.store.tasks()[0].title, "Plan sprint");
    }

    #[tokio::test]
    async fn test_toggle_ignored_while_busy() {
        let (mut app, tx, mut rx) = test_app().await;
        app.store.load_tasks(vec![task("1", "A")]);
        app.sync_snapshot();
        app.pending.begin(OpKind::ToggleTask);

        press(&mut app, &tx, KeyCode::Char(' '));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_confirm_cancel_returns_to_browse() {
        let (mut app, tx, _rx) = test_app().await;
        app.store.load_tasks(vec![task("1", "A")]);
        app.sync_snapshot();

        press(&mut app, &tx, KeyCode::Char('d'));
        assert!(matches!(app.mode, Mode::Confirm(_)));
        press(&mut app, &tx, KeyCode::Char('x'));
        assert!(matches!(app.mode, Mode::Confirm(_)));
        press(&mut app, &tx, KeyCode::Esc);
        assert!(matches!(app.mode, Mode::Browse));
        assert!(app.pending.is_idle());
    }

    #[tokio::test]
    async fn test_category_form_validation() {
        let (mut app, tx, _rx) = test_app().await;
        press(&mut app, &tx, KeyCode::Char('C'));
        press(&mut app, &tx, KeyCode::Char('n'));
        press(&mut app, &tx, KeyCode::Enter);

        let Mode::Categories(panel) = &app.mode else {
            panic!("panel closed");
        };
        let form = panel.form.as_ref().unwrap();
        assert_eq!(form.error.as_deref(), Some("Category name is required"));
    }

    #[tokio::test]
    async fn test_category_form_cycles_color() {
        let (mut app, tx, _rx) = test_app().await;
        press(&mut app, &tx, KeyCode::Char('C'));
        press(&mut app, &tx, KeyCode::Char('n'));
        press(&mut app, &tx, KeyCode::Tab);
        press(&mut app, &tx, KeyCode::Tab);
        press(&mut app, &tx, KeyCode::Right);

        let Mode::Categories(panel) = &app.mode else {
            panic!("panel closed");
        };
        let form = panel.form.as_ref().unwrap();
        assert_eq!(form.field, CategoryField::Color);
        assert_eq!(form.draft.color, crate::model::CategoryColor::Green);
    }
}
