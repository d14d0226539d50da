//! Core functionality for storyloom
//!
//! This module contains shared logic including:
//! - Application configuration
//! - Field length limits
//! - The publish/subscribe emitter
//! - Records mirrored from the server
//! - The in-memory project password store
//! - The client-side state holder

pub mod config;
pub mod emitter;
pub mod limits;
pub mod models;
pub mod session;
pub mod state;

pub use config::{AiModel, Config};
pub use emitter::EventEmitter;
pub use session::SessionStore;
pub use state::{ProjectState, StateChange};
