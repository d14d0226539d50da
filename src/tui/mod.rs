//! Terminal User Interface module
//!
//! This module contains the ratatui-based front end that draws the view tree
//! and turns key presses into view events.

pub mod app;
pub mod event;
pub mod theme;
pub mod ui;

pub use app::App;
