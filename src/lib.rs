//! Terminal task manager.
//!
//! Tasks and categories live behind a [`service::RecordService`] (local
//! SQLite or a hosted HTTP record service). Controllers validate and talk to
//! the service, the [`store::Store`] holds the loaded collections, and the
//! [`view`] functions derive what the TUI shows.

pub mod app;
pub mod config;
pub mod controller;
pub mod model;
pub mod service;
pub mod store;
pub mod theme;
pub mod ui;
pub mod util;
pub mod view;
