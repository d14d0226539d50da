//! Keyed registry of view-tree event handlers
//!
//! Handlers are stored by element key, then event kind. The key of an
//! element is its `id`; without one, its full class attribute; without
//! either, a synthetic `{tag}_{millis}` key written into the node's
//! `data-listener-key` attribute so later lookups resolve to the same bucket.
//!
//! Class-derived keys are not unique: every node sharing a class attribute
//! (and lacking an id) shares one bucket, so removing one removes them all.
//! Renderers give interactive nodes ids to stay clear of this.

use std::collections::HashMap;
use std::rc::Rc;

use chrono::Utc;

use crate::view::intent::Intent;
use crate::view::node::Node;

/// Attribute holding a synthetic listener key
pub const LISTENER_KEY_ATTR: &str = "data-listener-key";

/// Event kinds routed through the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Input,
    Change,
    Blur,
    Drop,
}

/// An event aimed at a node
#[derive(Debug, Clone, PartialEq)]
pub struct UiEvent {
    pub kind: EventKind,
    pub target_id: String,
    /// Field value for input/change/blur; dragged item id for drop
    pub value: String,
}

impl UiEvent {
    pub fn new(kind: EventKind, target_id: impl Into<String>) -> Self {
        Self {
            kind,
            target_id: target_id.into(),
            value: String::new(),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn click(target_id: impl Into<String>) -> Self {
        Self::new(EventKind::Click, target_id)
    }
}

/// What a handler sees while an event bubbles
pub struct EventContext<'a> {
    pub event: &'a UiEvent,
    pub root: &'a Node,
    /// The node whose handler is running
    pub current: &'a Node,
    intents: Vec<Intent>,
    stopped: bool,
}

impl<'a> EventContext<'a> {
    pub fn emit(&mut self, intent: Intent) {
        self.intents.push(intent);
    }

    /// Keep the event from reaching ancestors of the current node
    pub fn stop_propagation(&mut self) {
        self.stopped = true;
    }

    /// Current value of a field anywhere in the tree
    pub fn field(&self, id: &str) -> String {
        self.root.value_of(id).to_string()
    }

    pub fn target(&self) -> Option<&'a Node> {
        self.root.find_by_id(&self.event.target_id)
    }
}

pub type Handler = Rc<dyn Fn(&mut EventContext<'_>)>;

/// Listener key of a node, if it has one
pub fn element_key(node: &Node) -> Option<String> {
    node.id
        .clone()
        .or_else(|| node.class_attr())
        .or_else(|| node.attr(LISTENER_KEY_ATTR).map(str::to_string))
}

/// Registry of every handler attached to the view tree
#[derive(Default)]
pub struct ListenerTracker {
    listeners: HashMap<String, HashMap<EventKind, Vec<Handler>>>,
}

impl ListenerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_key(&self, node: &mut Node) -> String {
        if let Some(key) = element_key(node) {
            return key;
        }
        let base = format!("{}_{}", node.tag.as_str(), Utc::now().timestamp_millis());
        let mut key = base.clone();
        let mut n = 1;
        while self.listeners.contains_key(&key) {
            key = format!("{}_{}", base, n);
            n += 1;
        }
        node.attrs.insert(LISTENER_KEY_ATTR.to_string(), key.clone());
        key
    }

    /// Attach `handler` for `kind` events on `node`
    ///
    /// Registering the same handler twice for the same element and kind
    /// keeps a single entry.
    pub fn add(&mut self, node: &mut Node, kind: EventKind, handler: Handler) {
        let key = self.ensure_key(node);
        let bucket = self.listeners.entry(key).or_default().entry(kind).or_default();
        if !bucket.iter().any(|h| Rc::ptr_eq(h, &handler)) {
            bucket.push(handler);
        }
    }

    /// Detach one handler
    pub fn remove(&mut self, node: &Node, kind: EventKind, handler: &Handler) {
        let Some(key) = element_key(node) else {
            return;
        };
        if let Some(kinds) = self.listeners.get_mut(&key) {
            if let Some(bucket) = kinds.get_mut(&kind) {
                bucket.retain(|h| !Rc::ptr_eq(h, handler));
                if bucket.is_empty() {
                    kinds.remove(&kind);
                }
            }
            if kinds.is_empty() {
                self.listeners.remove(&key);
            }
        }
    }

    /// Detach every handler of one element
    pub fn remove_element(&mut self, node: &Node) {
        if let Some(key) = element_key(node) {
            self.listeners.remove(&key);
        }
    }

    /// Detach every handler registered on descendants of `container`
    pub fn remove_within(&mut self, container: &Node) {
        for node in container.descendants() {
            if let Some(key) = element_key(node) {
                self.listeners.remove(&key);
            }
        }
    }

    pub fn remove_all(&mut self) {
        self.listeners.clear();
    }

    /// Tear down listeners under `container`, then rebuild its children
    ///
    /// `build` runs after the teardown, so handlers it registers for
    /// re-used ids survive.
    pub fn replace_contents<F>(&mut self, container: &mut Node, build: F)
    where
        F: FnOnce(&mut Self) -> Vec<Node>,
    {
        self.remove_within(container);
        container.children = build(self);
    }

    /// Number of handlers attached to `node`
    pub fn count_for(&self, node: &Node) -> usize {
        element_key(node)
            .and_then(|key| self.listeners.get(&key))
            .map_or(0, |kinds| kinds.values().map(Vec::len).sum())
    }

    /// Total handlers registered
    pub fn len(&self) -> usize {
        self.listeners
            .values()
            .flat_map(|kinds| kinds.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to its target, then to each ancestor
    ///
    /// Stops after the node on which a handler called `stop_propagation`.
    /// Nothing fires when the target is disabled; disabled ancestors are
    /// skipped.
    pub fn dispatch(&self, root: &Node, event: &UiEvent) -> Vec<Intent> {
        let Some(path) = root.path_to(&event.target_id) else {
            tracing::debug!("Dropping {:?} for unknown node {}", event.kind, event.target_id);
            return Vec::new();
        };
        let Some(chain) = root.chain(&path) else {
            return Vec::new();
        };
        if chain.last().map_or(true, |target| target.disabled) {
            return Vec::new();
        }

        let mut ctx = EventContext {
            event,
            root,
            current: root,
            intents: Vec::new(),
            stopped: false,
        };

        for node in chain.into_iter().rev() {
            if node.disabled {
                continue;
            }
            let handlers: Vec<Handler> = element_key(node)
                .and_then(|key| self.listeners.get(&key))
                .and_then(|kinds| kinds.get(&event.kind))
                .cloned()
                .unwrap_or_default();

            ctx.current = node;
            for handler in handlers {
                handler(&mut ctx);
            }
            if ctx.stopped {
                break;
            }
        }

        ctx.intents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::intent::Tab;
    use crate::view::node::Tag;

    fn emit_tab(tab: Tab) -> Handler {
        Rc::new(move |ctx: &mut EventContext<'_>| ctx.emit(Intent::SwitchTab(tab)))
    }

    #[test]
    fn test_duplicate_registration_keeps_one() {
        let mut tracker = ListenerTracker::new();
        let mut button = Node::button("save", "Save");
        let handler = emit_tab(Tab::Worldview);

        tracker.add(&mut button, EventKind::Click, Rc::clone(&handler));
        tracker.add(&mut button, EventKind::Click, Rc::clone(&handler));

        assert_eq!(tracker.count_for(&button), 1);
        let root = Node::div().with_child(button);
        assert_eq!(
            tracker.dispatch(&root, &UiEvent::click("save")),
            vec![Intent::SwitchTab(Tab::Worldview)]
        );
    }

    #[test]
    fn test_remove_within_covers_descendants() {
        let mut tracker = ListenerTracker::new();
        let mut a = Node::button("a", "A");
        let mut b = Node::button("b", "B");
        tracker.add(&mut a, EventKind::Click, emit_tab(Tab::Scenario));
        tracker.add(&mut b, EventKind::Click, emit_tab(Tab::Scenario));
        let mut outside = Node::button("outside", "Out");
        tracker.add(&mut outside, EventKind::Click, emit_tab(Tab::Scenario));

        let container = Node::div()
            .with_id("box")
            .with_child(Node::div().with_child(a))
            .with_child(b);
        tracker.remove_within(&container);

        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.count_for(&outside), 1);
    }

    #[test]
    fn test_remove_within_empty_container_is_noop() {
        let mut tracker = ListenerTracker::new();
        tracker.remove_within(&Node::div().with_id("empty"));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_synthetic_key_is_written_to_node() {
        let mut tracker = ListenerTracker::new();
        let mut plain = Node::new(Tag::Card);
        tracker.add(&mut plain, EventKind::Click, emit_tab(Tab::Manuscript));

        let key = plain.attr(LISTENER_KEY_ATTR).unwrap().to_string();
        assert!(key.starts_with("card_"));
        assert_eq!(tracker.count_for(&plain), 1);

        tracker.remove_element(&plain);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_nodes_sharing_a_class_share_a_bucket() {
        let mut tracker = ListenerTracker::new();
        let mut first = Node::div().with_class("chip");
        let mut second = Node::div().with_class("chip");
        tracker.add(&mut first, EventKind::Click, emit_tab(Tab::Characters));
        tracker.add(&mut second, EventKind::Click, emit_tab(Tab::Worldview));

        assert_eq!(tracker.count_for(&first), 2);
        tracker.remove_element(&second);
        assert_eq!(tracker.count_for(&first), 0);
    }

    #[test]
    fn test_events_bubble_until_stopped() {
        let mut tracker = ListenerTracker::new();
        let mut edit = Node::button("edit", "Edit");
        let mut card = Node::new(Tag::Card).with_id("card");
        let mut list = Node::new(Tag::List).with_id("list");

        tracker.add(
            &mut edit,
            EventKind::Click,
            Rc::new(|ctx: &mut EventContext<'_>| {
                ctx.emit(Intent::SwitchTab(Tab::Worldview));
                ctx.stop_propagation();
            }),
        );
        tracker.add(&mut card, EventKind::Click, emit_tab(Tab::Scenario));
        tracker.add(&mut list, EventKind::Click, emit_tab(Tab::Manuscript));

        let root = list.with_child(card.with_child(edit));

        assert_eq!(
            tracker.dispatch(&root, &UiEvent::click("edit")),
            vec![Intent::SwitchTab(Tab::Worldview)]
        );
        assert_eq!(
            tracker.dispatch(&root, &UiEvent::click("card")),
            vec![Intent::SwitchTab(Tab::Scenario), Intent::SwitchTab(Tab::Manuscript)]
        );
    }

    #[test]
    fn test_disabled_target_does_not_fire() {
        let mut tracker = ListenerTracker::new();
        let mut button = Node::button("go", "Go").with_disabled(true);
        tracker.add(&mut button, EventKind::Click, emit_tab(Tab::Scenario));
        let root = Node::div().with_child(button);
        assert!(tracker.dispatch(&root, &UiEvent::click("go")).is_empty());
    }

    #[test]
    fn test_replace_contents_keeps_rebuilt_handlers() {
        let mut tracker = ListenerTracker::new();
        let mut container = Node::div().with_id("list");
        let build = |tracker: &mut ListenerTracker| {
            let mut item = Node::button("item-1", "One");
            tracker.add(&mut item, EventKind::Click, emit_tab(Tab::Scenario));
            vec![item]
        };

        tracker.replace_contents(&mut container, build);
        tracker.replace_contents(&mut container, build);

        assert_eq!(tracker.len(), 1);
        assert_eq!(container.children.len(), 1);
    }

    #[test]
    fn test_remove_single_handler() {
        let mut tracker = ListenerTracker::new();
        let mut field = Node::input("name", "Name", "");
        let keep = emit_tab(Tab::Characters);
        let drop = emit_tab(Tab::Worldview);
        tracker.add(&mut field, EventKind::Input, Rc::clone(&keep));
        tracker.add(&mut field, EventKind::Input, Rc::clone(&drop));

        tracker.remove(&field, EventKind::Input, &drop);
        assert_eq!(tracker.count_for(&field), 1);
    }
}
