use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of the category that absorbs tasks from deleted categories.
pub const GENERAL_CATEGORY: &str = "General";

/// Symbolic icon names a category may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CategoryIcon {
    #[default]
    Folder,
    Briefcase,
    User,
    Palette,
    Code,
    FileText,
    Home,
    Heart,
    Star,
    Target,
    Zap,
    Coffee,
    Book,
    Camera,
    Music,
    ShoppingCart,
}

impl CategoryIcon {
    pub const ALL: [CategoryIcon; 16] = [
        CategoryIcon::Folder,
        CategoryIcon::Briefcase,
        CategoryIcon::User,
        CategoryIcon::Palette,
        CategoryIcon::Code,
        CategoryIcon::FileText,
        CategoryIcon::Home,
        CategoryIcon::Heart,
        CategoryIcon::Star,
        CategoryIcon::Target,
        CategoryIcon::Zap,
        CategoryIcon::Coffee,
        CategoryIcon::Book,
        CategoryIcon::Camera,
        CategoryIcon::Music,
        CategoryIcon::ShoppingCart,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CategoryIcon::Folder => "Folder",
            CategoryIcon::Briefcase => "Briefcase",
            CategoryIcon::User => "User",
            CategoryIcon::Palette => "Palette",
            CategoryIcon::Code => "Code",
            CategoryIcon::FileText => "FileText",
            CategoryIcon::Home => "Home",
            CategoryIcon::Heart => "Heart",
            CategoryIcon::Star => "Star",
            CategoryIcon::Target => "Target",
            CategoryIcon::Zap => "Zap",
            CategoryIcon::Coffee => "Coffee",
            CategoryIcon::Book => "Book",
            CategoryIcon::Camera => "Camera",
            CategoryIcon::Music => "Music",
            CategoryIcon::ShoppingCart => "ShoppingCart",
        }
    }

    /// Step through [`CategoryIcon::ALL`], wrapping at both ends.
    pub fn step(self, delta: isize) -> Self {
        step_in(&Self::ALL, self, delta)
    }
}

impl fmt::Display for CategoryIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryIcon {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|icon| icon.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown icon '{}'", wanted))
    }
}

/// Style tokens a category may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryColor {
    #[default]
    Gray,
    Blue,
    Green,
    Purple,
    Indigo,
    Yellow,
    Red,
    Pink,
    Orange,
    Teal,
}

impl CategoryColor {
    pub const ALL: [CategoryColor; 10] = [
        CategoryColor::Gray,
        CategoryColor::Blue,
        CategoryColor::Green,
        CategoryColor::Purple,
        CategoryColor::Indigo,
        CategoryColor::Yellow,
        CategoryColor::Red,
        CategoryColor::Pink,
        CategoryColor::Orange,
        CategoryColor::Teal,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CategoryColor::Gray => "gray",
            CategoryColor::Blue => "blue",
            CategoryColor::Green => "green",
            CategoryColor::Purple => "purple",
            CategoryColor::Indigo => "indigo",
            CategoryColor::Yellow => "yellow",
            CategoryColor::Red => "red",
            CategoryColor::Pink => "pink",
            CategoryColor::Orange => "orange",
            CategoryColor::Teal => "teal",
        }
    }

    /// Style token as stored by the record service, e.g. `bg-blue-100 text-blue-600`.
    pub fn token(self) -> String {
        format!("bg-{0}-100 text-{0}-600", self.name())
    }

    /// Parse either a bare color name (`blue`) or a full style token.
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        Self::ALL.iter().copied().find(|color| {
            color.name().eq_ignore_ascii_case(token)
                || token
                    .split_whitespace()
                    .any(|part| part == format!("bg-{}-100", color.name()))
        })
    }

    pub fn step(self, delta: isize) -> Self {
        step_in(&Self::ALL, self, delta)
    }
}

impl fmt::Display for CategoryColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn step_in<T: Copy + PartialEq>(all: &[T], current: T, delta: isize) -> T {
    let len = all.len() as isize;
    let idx = all.iter().position(|v| *v == current).unwrap_or(0) as isize;
    all[(idx + delta).rem_euclid(len) as usize]
}

/// A user-defined label grouping tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub icon: CategoryIcon,
    pub color: CategoryColor,
}

impl Category {
    /// Local fallback categories carry `default-N` ids and have no remote record.
    #[cfg(test)]
    pub(crate) fn is_local_default(&self) -> bool {
        self.id.starts_with("default-")
    }
}

/// The six categories seeded into an empty service.
pub fn default_categories() -> Vec<Category> {
    [
        (GENERAL_CATEGORY, CategoryIcon::Folder, CategoryColor::Gray),
        ("Work", CategoryIcon::Briefcase, CategoryColor::Blue),
        ("Personal", CategoryIcon::User, CategoryColor::Green),
        ("Design", CategoryIcon::Palette, CategoryColor::Purple),
        ("Development", CategoryIcon::Code, CategoryColor::Indigo),
        ("Documentation", CategoryIcon::FileText, CategoryColor::Yellow),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (name, icon, color))| Category {
        id: format!("default-{}", i + 1),
        name: name.to_string(),
        icon,
        color,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_categories_start_with_general() {
        let defaults = default_categories();
        assert_eq!(defaults.len(), 6);
        assert_eq!(defaults[0].name, GENERAL_CATEGORY);
        assert!(defaults.iter().all(Category::is_local_default));
    }

    #[test]
    fn test_color_token_round_trip() {
        for color in CategoryColor::ALL {
            assert_eq!(CategoryColor::from_token(&color.token()), Some(color));
        }
        assert_eq!(
            CategoryColor::from_token("bg-teal-100 text-teal-600"),
            Some(CategoryColor::Teal)
        );
        assert_eq!(CategoryColor::from_token("Blue"), Some(CategoryColor::Blue));
        assert_eq!(CategoryColor::from_token("bg-black-100"), None);
    }

    #[test]
    fn test_icon_parse_ignores_case() {
        assert_eq!("shoppingcart".parse(), Ok(CategoryIcon::ShoppingCart));
        assert!("Rocket".parse::<CategoryIcon>().is_err());
    }

    #[test]
    fn test_step_wraps() {
        assert_eq!(CategoryIcon::Folder.step(-1), CategoryIcon::ShoppingCart);
        assert_eq!(CategoryIcon::ShoppingCart.step(1), CategoryIcon::Folder);
        assert_eq!(CategoryColor::Teal.step(1), CategoryColor::Gray);
        assert_eq!(CategoryColor::Gray.step(2), CategoryColor::Green);
    }
}
