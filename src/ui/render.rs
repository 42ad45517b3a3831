//! Render dispatch for the TUI.
//!
//! Draws the browse layout, then whichever overlay the current [`Mode`]
//! calls for on top of it.

use crate::app::{App, ConfirmAction, Mode};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::{categories, forms, header, help, status, tasks};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 12;

pub(super) fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    // Guard against zero-width/height to prevent panics
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    render_browse(f, app, area);

    match &app.mode {
        Mode::TaskForm(form) => forms::render_task_form(f, app, form),
        Mode::Categories(panel) => categories::render(f, app, panel),
        Mode::Confirm(action) => render_confirm_overlay(f, app, action),
        Mode::Help => help::render(f, app),
        Mode::Browse | Mode::Search | Mode::TagFilter => {}
    }
}

/// Header, task list with detail pane, status bar.
fn render_browse(f: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(header::HEIGHT),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    header::render(f, app, rows[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(rows[1]);

    tasks::render_list(f, app, columns[0]);
    tasks::render_detail(f, app, columns[1]);
    status::render(f, app, rows[2]);
}

fn render_confirm_overlay(f: &mut Frame, app: &App, confirm: &ConfirmAction) {
    let text = match confirm {
        ConfirmAction::DeleteTask { title, .. } => format!(
            "Delete \"{}\"?\n\nThis cannot be undone.\n\n(y) Confirm  (n/Esc) Cancel",
            crate::util::single_line(title)
        ),
        ConfirmAction::DeleteCompleted { count } => format!(
            "Delete {} completed task(s)?\n\nThis cannot be undone.\n\n(y) Confirm  (n/Esc) Cancel",
            count
        ),
        ConfirmAction::DeleteCategory { name, affected, .. } if *affected > 0 => format!(
            "Delete category \"{}\"?\n\n{} task(s) will move to General.\n\n(y) Confirm  (n/Esc) Cancel",
            name, affected
        ),
        ConfirmAction::DeleteCategory { name, .. } => format!(
            "Delete category \"{}\"?\n\nNo tasks use it.\n\n(y) Confirm  (n/Esc) Cancel",
            name
        ),
    };

    let Some(overlay) = centered(54, 8, f.area()) else {
        return;
    };
    f.render_widget(Clear, overlay);

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.palette.panel_border_focused)
                .title(" Confirm "),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, overlay);
}

/// A `width` x `height` rectangle centered in `area`, shrunk to leave a
/// two-cell margin. `None` when what is left is too small to draw into.
pub(super) fn centered(width: u16, height: u16, area: Rect) -> Option<Rect> {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    if width < 20 || height < 5 {
        return None;
    }
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Some(Rect::new(x, y, width, height))
}
