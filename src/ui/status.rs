use crate::app::{App, Mode, NoticeLevel};
use crate::view::all_tags;
use ratatui::{layout::Rect, widgets::Paragraph, Frame};
use std::borrow::Cow;

/// Render the status bar: the current notice, or key hints for the mode.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let (text, level): (Cow<'_, str>, NoticeLevel) = match &app.status_message {
        Some((msg, level, _)) => (Cow::Borrowed(msg.as_ref()), *level),
        None if matches!(app.mode, Mode::TagFilter) => (tag_hints(app), NoticeLevel::Info),
        None => (Cow::Borrowed(hints(&app.mode)), NoticeLevel::Info),
    };

    let paragraph = Paragraph::new(text).style(app.palette.notice(level));
    f.render_widget(paragraph, area);
}

/// Known tags as a typing aid for the tag filter.
fn tag_hints(app: &App) -> Cow<'static, str> {
    let tags = all_tags(&app.snapshot.tasks);
    if tags.is_empty() {
        Cow::Borrowed("No tags yet | ESC clear")
    } else {
        Cow::Owned(format!("Tags: {} | ENTER keep | ESC clear", tags.join(", ")))
    }
}

fn hints(mode: &Mode) -> &'static str {
    match mode {
        Mode::Browse => {
            "[n]ew [e]dit [space]done [d]elete [/]search [t]ag [s]tatus [c]ategory [o]rder [C]ategories [?]help [q]uit"
        }
        Mode::Search | Mode::TagFilter => "Type to filter | ENTER keep | ESC clear",
        Mode::TaskForm(_) => "Tab next field | ENTER save | ESC cancel",
        Mode::Categories(_) => "[n]ew [e]dit [d]elete | ESC close",
        Mode::Confirm(_) => "(y) confirm | (n) cancel",
        Mode::Help => "ESC or ? to close",
    }
}
