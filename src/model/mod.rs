//! Domain types shared by the store, the controllers and the UI.

mod category;
mod task;

pub use category::{default_categories, Category, CategoryColor, CategoryIcon, GENERAL_CATEGORY};
pub use task::{parse_tags, Priority, Task};
