use crate::app::{App, CategoryPanel};
use crate::theme::{category_color, icon_glyph};
use crate::util::truncate_to_width;
use crate::view::category_counts;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::forms;
use super::render::centered;

/// Render the category manager overlay.
pub fn render(f: &mut Frame, app: &App, panel: &CategoryPanel) {
    let Some(area) = centered(56, 20, f.area()) else {
        return;
    };
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.palette.panel_border_focused)
        .title(" Categories ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);

    let name_width = (inner.width as usize).saturating_sub(14);
    let items: Vec<ListItem> = category_counts(&app.snapshot.tasks, &app.snapshot.categories)
        .into_iter()
        .enumerate()
        .map(|(i, (category, count))| {
            let style = if i == panel.selected {
                app.palette.task_selected
            } else {
                app.palette.task_normal
            };
            let name = truncate_to_width(&category.name, name_width);
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!(" {} ", icon_glyph(category.icon)),
                    Style::default().fg(category_color(category.color)),
                ),
                Span::styled(format!("{:<w$}", name, w = name_width), style),
                Span::styled(format!(" {:>4}", count), app.palette.filter_inactive),
            ]))
        })
        .collect();

    let mut state = ListState::default().with_selected(Some(panel.selected));
    f.render_stateful_widget(List::new(items), rows[0], &mut state);

    f.render_widget(
        Paragraph::new(Span::styled(
            "n new  e edit  d delete  Esc close",
            app.palette.filter_inactive,
        )),
        rows[1],
    );

    if let Some(form) = &panel.form {
        if let Some(form_area) = centered(50, 9, area) {
            forms::render_category_form(f, app, form, form_area);
        }
    }
}
