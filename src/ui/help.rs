//! Help overlay: keybinding table grouped by context.

use crate::app::App;
use ratatui::{
    layout::Constraint,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Row, Table},
    Frame,
};

use super::render::centered;

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Tasks",
        &[
            ("j / k", "Move down / up"),
            ("g / G", "First / last task"),
            ("n", "New task"),
            ("e, Enter", "Edit task"),
            ("Space", "Toggle completed"),
            ("d", "Delete task"),
            ("D", "Delete all completed"),
            ("r", "Reload from service"),
        ],
    ),
    (
        "Filters",
        &[
            ("/", "Search title and description"),
            ("t", "Filter by tag"),
            ("s", "Cycle status filter"),
            ("c", "Cycle category filter"),
            ("o", "Cycle sort order"),
            ("x", "Clear filters"),
            ("Esc", "Clear search and filters"),
        ],
    ),
    (
        "Forms",
        &[
            ("Tab / ↑↓", "Next / previous field"),
            ("← / →", "Change priority, category, icon, color"),
            ("Enter", "Save"),
            ("Esc", "Cancel"),
        ],
    ),
    (
        "General",
        &[
            ("C", "Manage categories"),
            ("?", "Toggle help"),
            ("q, Ctrl+C", "Quit"),
        ],
    ),
];

/// Render the help overlay on top of the current view.
pub fn render(f: &mut Frame, app: &App) {
    let Some(overlay) = centered(64, 34, f.area()) else {
        return;
    };
    f.render_widget(Clear, overlay);

    let mut rows: Vec<Row> = Vec::new();
    for (label, bindings) in SECTIONS {
        rows.push(
            Row::new(vec![
                Line::from(Span::styled(
                    format!("-- {} --", label),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
            ])
            .style(app.palette.header),
        );
        for (key, description) in *bindings {
            rows.push(Row::new(vec![format!("  {}", key), description.to_string()]));
        }
        rows.push(Row::new(vec![String::new(), String::new()]));
    }
    rows.pop();

    let widths = [Constraint::Length(14), Constraint::Min(20)];
    let table = Table::new(rows, widths).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(app.palette.panel_border_focused)
            .title(" Keybindings (? to close) "),
    );

    f.render_widget(table, overlay);
}
