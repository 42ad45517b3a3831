//! Color roles for the TUI.
//!
//! `Palette` maps semantic UI roles to ratatui `Style` values. Category and
//! priority colors are resolved here so widgets never hardcode them.

use ratatui::style::{Color, Modifier, Style};

use crate::app::NoticeLevel;
use crate::model::{CategoryColor, CategoryIcon, Priority};
use crate::view::DueLabel;

#[derive(Debug, Clone)]
pub struct Palette {
    // -- Task list --
    pub task_normal: Style,
    pub task_selected: Style,
    pub task_completed: Style,
    pub task_tag: Style,

    // -- Chrome --
    pub header: Style,
    pub filter_active: Style,
    pub filter_inactive: Style,
    pub status_bar: Style,
    pub status_error: Style,
    pub panel_border: Style,
    pub panel_border_focused: Style,
    pub form_label: Style,
    pub form_label_focused: Style,
    pub form_error: Style,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            task_normal: Style::default(),
            task_selected: Style::default().bg(Color::DarkGray).fg(Color::White),
            task_completed: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::CROSSED_OUT),
            task_tag: Style::default().fg(Color::Cyan),

            header: Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            filter_active: Style::default().fg(Color::Yellow),
            filter_inactive: Style::default().fg(Color::DarkGray),
            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
            status_error: Style::default().bg(Color::Red).fg(Color::White),
            panel_border: Style::default(),
            panel_border_focused: Style::default().fg(Color::Cyan),
            form_label: Style::default().fg(Color::Gray),
            form_label_focused: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            form_error: Style::default().fg(Color::Red),
        }
    }
}

impl Palette {
    pub fn notice(&self, level: NoticeLevel) -> Style {
        match level {
            NoticeLevel::Info => self.status_bar,
            NoticeLevel::Error => self.status_error,
        }
    }
}

/// Terminal color for a category color name.
pub fn category_color(color: CategoryColor) -> Color {
    match color {
        CategoryColor::Gray => Color::Gray,
        CategoryColor::Blue => Color::Blue,
        CategoryColor::Green => Color::Green,
        CategoryColor::Purple => Color::Magenta,
        CategoryColor::Indigo => Color::Indexed(61),
        CategoryColor::Yellow => Color::Yellow,
        CategoryColor::Red => Color::Red,
        CategoryColor::Pink => Color::LightMagenta,
        CategoryColor::Orange => Color::Indexed(208),
        CategoryColor::Teal => Color::Indexed(30),
    }
}

/// Single-width glyph shown before a category name.
pub fn icon_glyph(icon: CategoryIcon) -> &'static str {
    match icon {
        CategoryIcon::Folder => "▤",
        CategoryIcon::Briefcase => "▣",
        CategoryIcon::User => "☺",
        CategoryIcon::Palette => "◐",
        CategoryIcon::Code => "λ",
        CategoryIcon::FileText => "≡",
        CategoryIcon::Home => "⌂",
        CategoryIcon::Heart => "♥",
        CategoryIcon::Star => "★",
        CategoryIcon::Target => "◎",
        CategoryIcon::Zap => "ϟ",
        CategoryIcon::Coffee => "◒",
        CategoryIcon::Book => "❐",
        CategoryIcon::Camera => "◙",
        CategoryIcon::Music => "♪",
        CategoryIcon::ShoppingCart => "⊞",
    }
}

pub fn priority_style(priority: Priority) -> Style {
    match priority {
        Priority::High => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        Priority::Medium => Style::default().fg(Color::Yellow),
        Priority::Low => Style::default().fg(Color::Green),
    }
}

pub fn due_style(label: &DueLabel, completed: bool) -> Style {
    if completed {
        return Style::default().fg(Color::DarkGray);
    }
    match label {
        DueLabel::Overdue => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        DueLabel::Today => Style::default().fg(Color::Yellow),
        DueLabel::Tomorrow => Style::default().fg(Color::LightBlue),
        DueLabel::On(_) => Style::default().fg(Color::Gray),
    }
}
