//! Terminal user interface.
//!
//! - `loop_runner` owns the terminal and multiplexes input, background
//!   events, store updates and the periodic tick
//! - `input` and `events` mutate [`App`](crate::app::App) state
//! - `render` and the widget modules draw it

mod categories;
mod events;
mod forms;
mod header;
mod help;
mod helpers;
mod input;
mod loop_runner;
mod render;
mod status;
mod tasks;

pub use loop_runner::{run, Action};
