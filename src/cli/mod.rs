//! CLI module for loom
//!
//! This module contains all CLI command definitions and handlers using clap.

pub mod commands;
pub mod config;
pub mod generate;
pub mod projects;

pub use commands::{Cli, Commands};
