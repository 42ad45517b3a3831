use crate::app::App;
use crate::model::{Priority, Task};
use crate::theme::{category_color, due_style, icon_glyph, priority_style};
use crate::util::{display_width, single_line, strip_control_chars, truncate_to_width};
use crate::view::due_label;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

/// Width reserved right of the title: checkbox, priority, due label, icon.
const ROW_CHROME: usize = 24;

/// Render the filtered, sorted task list.
pub fn render_list(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }
    let palette = &app.palette;
    let visible = app.visible_tasks();

    let items: Vec<ListItem> = if visible.is_empty() {
        let hint = if app.snapshot.tasks.is_empty() {
            "No tasks yet. Press n to add one."
        } else {
            "No tasks match the current filters (x clears them)"
        };
        vec![ListItem::new(Span::styled(hint, palette.filter_inactive))]
    } else {
        let title_width = (area.width as usize).saturating_sub(ROW_CHROME + 2).max(8);
        visible
            .iter()
            .enumerate()
            .map(|(i, task)| task_row(app, task, i == app.selected, title_width))
            .collect()
    };

    let title = format!(" Tasks ({}/{}) ", visible.len(), app.snapshot.tasks.len());
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(palette.panel_border_focused)
                .title(title),
        )
        .highlight_style(Style::default());

    let selected = (!visible.is_empty()).then_some(app.selected);
    let mut state = ListState::default().with_selected(selected);
    f.render_stateful_widget(list, area, &mut state);
}

fn task_row<'a>(app: &App, task: &'a Task, selected: bool, title_width: usize) -> ListItem<'a> {
    let palette = &app.palette;
    let title_style = if selected {
        palette.task_selected
    } else if task.completed {
        palette.task_completed
    } else {
        palette.task_normal
    };

    let checkbox = if task.completed { "[x] " } else { "[ ] " };
    let title = clean_title(task);
    let title = truncate_to_width(&title, title_width).into_owned();
    let pad = title_width.saturating_sub(display_width(&title));
    let label = due_label(task.due_date, app.today);

    let mut spans = vec![
        Span::styled(checkbox, title_style),
        Span::styled(format!("{} ", priority_marker(task)), priority_style(task.priority)),
        Span::styled(title, title_style),
        Span::raw(" ".repeat(pad)),
        Span::styled(format!(" {:<8}", label.to_string()), due_style(&label, task.completed)),
    ];
    if let Some(category) = app.category_for(&task.category) {
        spans.push(Span::styled(
            format!(" {}", icon_glyph(category.icon)),
            Style::default().fg(category_color(category.color)),
        ));
    }
    ListItem::new(Line::from(spans))
}

fn clean_title(task: &Task) -> String {
    single_line(&strip_control_chars(&task.title)).into_owned()
}

fn priority_marker(task: &Task) -> &'static str {
    match task.priority {
        Priority::High => "!!",
        Priority::Medium => "! ",
        Priority::Low => "  ",
    }
}

/// Render the detail pane for the selected task.
pub fn render_detail(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }
    let palette = &app.palette;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.panel_border)
        .title(" Details ");

    let Some(task) = app.selected_task() else {
        f.render_widget(Paragraph::new("").block(block), area);
        return;
    };

    let label = due_label(task.due_date, app.today);
    let category_spans = match app.category_for(&task.category) {
        Some(category) if category.name == task.category => vec![
            Span::styled(
                format!("{} ", icon_glyph(category.icon)),
                Style::default().fg(category_color(category.color)),
            ),
            Span::raw(category.name.clone()),
        ],
        // Category was renamed or deleted elsewhere.
        _ => vec![Span::styled(task.category.clone(), palette.filter_inactive)],
    };

    let mut lines = vec![
        Line::from(Span::styled(clean_title(task), palette.header)),
        Line::from(""),
        field_line(app, "Status", Span::raw(if task.completed { "Completed" } else { "Pending" })),
        field_line(
            app,
            "Priority",
            Span::styled(task.priority.label(), priority_style(task.priority)),
        ),
        field_line(
            app,
            "Due",
            Span::styled(
                format!("{} ({})", task.due_date.format("%Y-%m-%d"), label),
                due_style(&label, task.completed),
            ),
        ),
        Line::from(
            [vec![Span::styled(format!("{:<10}", "Category"), palette.form_label)], category_spans].concat(),
        ),
    ];
    if !task.tags.is_empty() {
        lines.push(field_line(
            app,
            "Tags",
            Span::styled(
                task.tags.iter().map(|t| format!("#{}", t)).collect::<Vec<_>>().join(" "),
                palette.task_tag,
            ),
        ));
    }
    lines.push(field_line(
        app,
        "Updated",
        Span::raw(task.updated_at.format("%Y-%m-%d %H:%M").to_string()),
    ));
    if !task.description.trim().is_empty() {
        lines.push(Line::from(""));
        for line in strip_control_chars(&task.description).lines() {
            lines.push(Line::from(line.to_string()));
        }
    }

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn field_line<'a>(app: &App, label: &str, value: Span<'a>) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{:<10}", label), app.palette.form_label),
        value,
    ])
}
