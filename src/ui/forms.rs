//! Task and category dialogs.

use crate::app::{App, CategoryField, CategoryForm, TaskField, TaskForm};
use crate::theme::{category_color, icon_glyph, priority_style};
use crate::util::truncate_to_width;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use std::borrow::Cow;

use super::render::centered;

const LABEL_WIDTH: usize = 13;

pub fn render_task_form(f: &mut Frame, app: &App, form: &TaskForm) {
    let Some(area) = centered(64, 14, f.area()) else {
        return;
    };
    f.render_widget(Clear, area);

    let value_width = (area.width as usize).saturating_sub(LABEL_WIDTH + 4);
    let mut lines = Vec::with_capacity(TaskField::ALL.len() + 4);
    for field in TaskField::ALL {
        let focused = field == form.field;
        let (value, style): (Cow<'_, str>, Style) = match field {
            TaskField::Title => (form.draft.title.as_str().into(), Style::default()),
            TaskField::Description => (form.draft.description.as_str().into(), Style::default()),
            TaskField::Priority => (
                format!("< {} >", form.draft.priority.label()).into(),
                priority_style(form.draft.priority),
            ),
            TaskField::DueDate => (form.due_input.as_str().into(), Style::default()),
            TaskField::Category => {
                let style = app
                    .category_for(&form.draft.category)
                    .map(|c| Style::default().fg(category_color(c.color)))
                    .unwrap_or_default();
                (format!("< {} >", form.draft.category).into(), style)
            }
            TaskField::Tags => (form.draft.tags.as_str().into(), app.palette.task_tag),
        };
        lines.push(form_line(app, field.label(), &value, style, focused, field.is_text(), value_width));
    }

    lines.push(Line::from(""));
    lines.push(error_line(app, form.error.as_deref()));
    lines.push(Line::from(Span::styled(
        "Tab/↑↓ field  ←/→ change  Enter save  Esc cancel",
        app.palette.filter_inactive,
    )));

    let title = if form.editing.is_some() { " Edit Task " } else { " New Task " };
    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(app.palette.panel_border_focused)
            .title(title),
    );
    f.render_widget(paragraph, area);
}

/// Drawn inside the category panel's area.
pub fn render_category_form(f: &mut Frame, app: &App, form: &CategoryForm, area: Rect) {
    f.render_widget(Clear, area);
    let value_width = (area.width as usize).saturating_sub(LABEL_WIDTH + 4);
    let swatch = Style::default().fg(category_color(form.draft.color));

    let lines = vec![
        form_line(
            app,
            "Name",
            &form.draft.name,
            Style::default(),
            form.field == CategoryField::Name,
            true,
            value_width,
        ),
        form_line(
            app,
            "Icon",
            &format!("< {} {} >", icon_glyph(form.draft.icon), form.draft.icon),
            swatch,
            form.field == CategoryField::Icon,
            false,
            value_width,
        ),
        form_line(
            app,
            "Color",
            &format!("< {} >", form.draft.color.name()),
            swatch,
            form.field == CategoryField::Color,
            false,
            value_width,
        ),
        Line::from(""),
        error_line(app, form.error.as_deref()),
        Line::from(Span::styled(
            "Tab field  ←/→ change  Enter save  Esc back",
            app.palette.filter_inactive,
        )),
    ];

    let title = if form.editing.is_some() { " Edit Category " } else { " New Category " };
    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(app.palette.panel_border_focused)
            .title(title),
    );
    f.render_widget(paragraph, area);
}

fn form_line(
    app: &App,
    label: &str,
    value: &str,
    style: Style,
    focused: bool,
    text: bool,
    width: usize,
) -> Line<'static> {
    let label_style = if focused {
        app.palette.form_label_focused
    } else {
        app.palette.form_label
    };
    let marker = if focused { "> " } else { "  " };
    // Long text shows its tail so the cursor stays visible.
    let shown = if text && focused {
        tail_to_width(value, width.saturating_sub(1)).to_string() + "_"
    } else {
        truncate_to_width(value, width).into_owned()
    };
    Line::from(vec![
        Span::styled(format!("{}{:<w$}", marker, label, w = LABEL_WIDTH - 2), label_style),
        Span::styled(shown, style),
    ])
}

fn error_line(app: &App, error: Option<&str>) -> Line<'static> {
    match error {
        Some(message) => Line::from(Span::styled(message.to_string(), app.palette.form_error)),
        None => Line::from(""),
    }
}

/// Longest suffix of `s` that fits in `width` columns.
fn tail_to_width(s: &str, width: usize) -> &str {
    let mut used = 0;
    for (idx, c) in s.char_indices().rev() {
        used += unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used > width {
            return &s[idx + c.len_utf8()..];
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_to_width() {
        assert_eq!(tail_to_width("hello", 10), "hello");
        assert_eq!(tail_to_width("hello", 3), "llo");
        assert_eq!(tail_to_width("日本語", 4), "本語");
        assert_eq!(tail_to_width("abc", 0), "");
    }
}
