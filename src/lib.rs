//! storyloom - terminal client for a creative-writing assistant
//!
//! This library provides the CLI and TUI front ends for the storyloom server:
//! projects, characters, worldview, scenarios and the manuscript, plus
//! AI generation with a streamed character endpoint.

pub mod api;
pub mod cli;
pub mod controllers;
pub mod core;
pub mod error;
pub mod tui;
pub mod view;

pub use error::{LoomError, Result};
