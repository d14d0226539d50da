//! Renderers: snapshot in, view tree out
//!
//! Every renderer rebuilds one container through
//! [`ListenerTracker::replace_contents`], so the handlers of the previous
//! render are torn down before new ones are attached.

pub mod cards;
pub mod characters;
pub mod manuscript;
pub mod modals;
pub mod project_list;
pub mod scenario;
pub mod workspace;
pub mod worldview;

use std::rc::Rc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::view::intent::{Intent, Modal};
use crate::view::listeners::{EventContext, EventKind, ListenerTracker};
use crate::view::node::Node;
use crate::view::validation::{FieldValidator, ValidationOutcome, ValidatorFn};

pub use cards::preview;
pub use characters::render_characters;
pub use manuscript::render_manuscript;
pub use modals::render_modal;
pub use project_list::render_project_list;
pub use scenario::render_scenario;
pub use workspace::render_workspace;
pub use worldview::render_worldview;

/// Where debounced validation results go
#[derive(Clone)]
pub struct LiveValidation {
    tx: mpsc::Sender<ValidationOutcome>,
    delay: Duration,
}

impl LiveValidation {
    pub fn new(tx: mpsc::Sender<ValidationOutcome>, delay: Duration) -> Self {
        Self { tx, delay }
    }
}

/// Shared state of one render pass
pub struct RenderCtx<'a> {
    pub tracker: &'a mut ListenerTracker,
    pub live: &'a LiveValidation,
}

impl<'a> RenderCtx<'a> {
    pub fn new(tracker: &'a mut ListenerTracker, live: &'a LiveValidation) -> Self {
        Self { tracker, live }
    }

    /// Rebuild `container`'s children, replacing its listeners
    pub fn replace<F>(&mut self, container: &mut Node, build: F)
    where
        F: FnOnce(&mut RenderCtx<'_>) -> Vec<Node>,
    {
        let live = self.live;
        self.tracker.replace_contents(container, |tracker| {
            let mut ctx = RenderCtx { tracker, live };
            build(&mut ctx)
        });
    }

    pub fn on<F>(&mut self, mut node: Node, kind: EventKind, handler: F) -> Node
    where
        F: Fn(&mut EventContext<'_>) + 'static,
    {
        self.tracker.add(&mut node, kind, Rc::new(handler));
        node
    }

    /// Emit `intent` when `node` is clicked
    pub fn emit_on_click(&mut self, node: Node, intent: Intent) -> Node {
        self.on(node, EventKind::Click, move |ctx| ctx.emit(intent.clone()))
    }

    /// Like [`Self::emit_on_click`], keeping the click from reaching ancestors
    pub fn emit_on_click_only(&mut self, node: Node, intent: Intent) -> Node {
        self.on(node, EventKind::Click, move |ctx| {
            ctx.emit(intent.clone());
            ctx.stop_propagation();
        })
    }

    /// Button asking for confirmation before emitting `action`
    pub fn confirm_button(&mut self, id: String, label: &str, message: String, action: Intent) -> Node {
        self.emit_on_click_only(
            Node::button(id, label).with_class("danger"),
            Intent::OpenModal(Modal::Confirm {
                message,
                action: Box::new(action),
            }),
        )
    }

    /// Attach live validation to an editable node
    pub fn validated(&mut self, mut field: Node, validator: ValidatorFn) -> Node {
        if let Some(id) = field.id.clone() {
            let live = FieldValidator::new(id, validator, self.live.delay, self.live.tx.clone());
            live.attach(self.tracker, &mut field);
        }
        field
    }
}

/// Placeholder shown in an empty list
pub(crate) fn empty_note(text: &str) -> Node {
    Node::paragraph(text).with_class("empty")
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Tracker plus a live-validation sink whose receiver is kept alive
    pub struct Harness {
        pub tracker: ListenerTracker,
        pub live: LiveValidation,
        pub rx: mpsc::Receiver<ValidationOutcome>,
    }

    impl Harness {
        pub fn new() -> Self {
            let (tx, rx) = mpsc::channel(16);
            Self {
                tracker: ListenerTracker::new(),
                live: LiveValidation::new(tx, Duration::from_millis(300)),
                rx,
            }
        }

        pub fn ctx(&mut self) -> RenderCtx<'_> {
            RenderCtx::new(&mut self.tracker, &self.live)
        }
    }

    /// Ids of every node in the tree
    pub fn ids(root: &Node) -> Vec<String> {
        std::iter::once(root)
            .chain(root.descendants())
            .filter_map(|n| n.id.clone())
            .collect()
    }
}
