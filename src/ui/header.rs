use crate::app::{App, Mode};
use crate::util::truncate_to_width;
use crate::view::{CategoryFilter, StatusFilter};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Two content lines plus borders.
pub(super) const HEIGHT: u16 = 4;

/// Render the stats line and the active filters.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }
    let palette = &app.palette;
    let stats = app.stats();

    let mut stats_line = vec![
        Span::styled("Total ", palette.filter_inactive),
        Span::styled(stats.total.to_string(), palette.header),
        Span::styled("  Done ", palette.filter_inactive),
        Span::styled(stats.completed.to_string(), palette.header),
        Span::styled("  Pending ", palette.filter_inactive),
        Span::styled(stats.pending.to_string(), palette.header),
    ];
    if stats.overdue > 0 {
        stats_line.push(Span::styled("  Overdue ", palette.filter_inactive));
        stats_line.push(Span::styled(stats.overdue.to_string(), palette.status_error));
    }
    if let Some(op) = app.pending.current() {
        stats_line.push(Span::styled(format!("  {}", op.progress_label()), palette.filter_active));
    }

    let max_value = (area.width as usize).saturating_sub(60).max(8);
    let query = &app.query;

    let search_value = match app.mode {
        Mode::Search => format!("{}_", query.search),
        _ if query.search.is_empty() => "-".to_string(),
        _ => query.search.clone(),
    };
    let tag_value = match app.mode {
        Mode::TagFilter => format!("{}_", query.tag),
        _ if query.tag.is_empty() => "-".to_string(),
        _ => query.tag.clone(),
    };
    let category_value = match &query.category {
        CategoryFilter::All => "All",
        CategoryFilter::Named(name) => name.as_str(),
    };

    let search_active = matches!(app.mode, Mode::Search) || !query.search.is_empty();
    let tag_active = matches!(app.mode, Mode::TagFilter) || !query.tag.is_empty();
    let filters_line = [
        filter_span("Search ", &search_value, search_active, max_value, app),
        filter_span("  Status ", query.status.label(), query.status != StatusFilter::All, max_value, app),
        filter_span("  Category ", category_value, query.category != CategoryFilter::All, max_value, app),
        filter_span("  Tag ", &tag_value, tag_active, max_value, app),
        filter_span("  Sort ", query.sort.label(), false, max_value, app),
    ];

    let paragraph = Paragraph::new(vec![
        Line::from(stats_line),
        Line::from(filters_line.into_iter().flatten().collect::<Vec<_>>()),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(palette.panel_border)
            .title(Span::styled(" Taskflow ", palette.header)),
    );
    f.render_widget(paragraph, area);
}

fn filter_span(
    label: &'static str,
    value: &str,
    active: bool,
    max_value: usize,
    app: &App,
) -> [Span<'static>; 2] {
    let style: Style = if active {
        app.palette.filter_active
    } else {
        app.palette.filter_inactive
    };
    [
        Span::styled(label, app.palette.form_label),
        Span::styled(truncate_to_width(value, max_value).into_owned(), style),
    ]
}
