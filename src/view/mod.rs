//! View layer
//!
//! This module provides:
//! - A small element tree the renderers build and the terminal draws
//! - Listener bookkeeping with bubbling dispatch
//! - Live and form-level validation
//! - Drag-and-drop reordering helpers
//! - Renderers and modal builders that turn snapshots into trees
//! - Toast notifications

pub mod dnd;
pub mod intent;
pub mod listeners;
pub mod node;
pub mod render;
pub mod toast;
pub mod validation;

pub use intent::{Intent, Modal, Tab};
pub use listeners::{EventKind, ListenerTracker, UiEvent};
pub use node::{Node, Tag};
pub use toast::{ToastKind, ToastQueue};
