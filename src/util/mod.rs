//! Text helpers for terminal rendering and input cleanup.

mod text;

pub use text::{display_width, single_line, strip_control_chars, truncate_to_width};

/// Maximum length of the search and tag filter inputs.
pub const MAX_FILTER_LENGTH: usize = 256;
