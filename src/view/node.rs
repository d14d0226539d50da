//! In-memory view tree
//!
//! Renderers build [`Node`] trees; the terminal front end draws them and
//! routes key presses back as events. Nodes are addressed by `id`.

use std::collections::BTreeMap;

/// Element kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Div,
    Section,
    Form,
    List,
    Heading,
    Text,
    Button,
    Input,
    TextArea,
    Card,
}

impl Tag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Div => "div",
            Tag::Section => "section",
            Tag::Form => "form",
            Tag::List => "list",
            Tag::Heading => "heading",
            Tag::Text => "text",
            Tag::Button => "button",
            Tag::Input => "input",
            Tag::TextArea => "textarea",
            Tag::Card => "card",
        }
    }

    /// Whether the element takes keyboard focus
    pub fn is_focusable(&self) -> bool {
        matches!(self, Tag::Button | Tag::Input | Tag::TextArea | Tag::Card)
    }

    /// Whether the element accepts typed text
    pub fn is_editable(&self) -> bool {
        matches!(self, Tag::Input | Tag::TextArea)
    }
}

/// A view element
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub tag: Tag,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: BTreeMap<String, String>,
    /// Label or body text
    pub text: String,
    /// Current value of editable elements
    pub value: String,
    pub disabled: bool,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            id: None,
            classes: Vec::new(),
            attrs: BTreeMap::new(),
            text: String::new(),
            value: String::new(),
            disabled: false,
            children: Vec::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Builders
    // ─────────────────────────────────────────────────────────────────────

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.insert(name.to_string(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    // Shorthands used by renderers

    pub fn div() -> Self {
        Self::new(Tag::Div)
    }

    pub fn heading(text: impl Into<String>) -> Self {
        Self::new(Tag::Heading).with_text(text)
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(Tag::Text).with_text(text)
    }

    pub fn button(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(Tag::Button).with_id(id).with_text(label)
    }

    pub fn input(id: impl Into<String>, label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(Tag::Input).with_id(id).with_text(label).with_value(value)
    }

    pub fn textarea(
        id: impl Into<String>,
        label: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::new(Tag::TextArea)
            .with_id(id)
            .with_text(label)
            .with_value(value)
    }

    /// Wrap a field in a `form-group` so validation messages land after it
    pub fn form_group(field: Node) -> Self {
        Self::div().with_class("form-group").with_child(field)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    /// Full class attribute, as written in markup
    pub fn class_attr(&self) -> Option<String> {
        if self.classes.is_empty() {
            None
        } else {
            Some(self.classes.join(" "))
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn is_id(&self, id: &str) -> bool {
        self.id.as_deref() == Some(id)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Node> {
        if self.is_id(id) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_by_id(id))
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Node> {
        if self.is_id(id) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_by_id_mut(id))
    }

    /// Child indices leading from this node to the node with `id`
    pub fn path_to(&self, id: &str) -> Option<Vec<usize>> {
        if self.is_id(id) {
            return Some(Vec::new());
        }
        self.children.iter().enumerate().find_map(|(i, child)| {
            child.path_to(id).map(|mut rest| {
                rest.insert(0, i);
                rest
            })
        })
    }

    /// Nodes from this one down to the one at `path`, inclusive
    pub fn chain(&self, path: &[usize]) -> Option<Vec<&Node>> {
        let mut chain = vec![self];
        let mut node = self;
        for &i in path {
            node = node.children.get(i)?;
            chain.push(node);
        }
        Some(chain)
    }

    pub fn at_path_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let mut node = self;
        for &i in path {
            node = node.children.get_mut(i)?;
        }
        Some(node)
    }

    /// Every node below this one, in document order
    pub fn descendants(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        for child in &self.children {
            out.push(child);
            out.extend(child.descendants());
        }
        out
    }

    pub fn descendants_mut(&mut self, visit: &mut dyn FnMut(&mut Node)) {
        for child in &mut self.children {
            visit(child);
            child.descendants_mut(visit);
        }
    }

    /// Ids of focusable, enabled nodes in document order
    pub fn focusable_ids(&self) -> Vec<String> {
        std::iter::once(self)
            .chain(self.descendants())
            .filter(|n| n.tag.is_focusable() && !n.disabled)
            .filter_map(|n| n.id.clone())
            .collect()
    }

    /// Nodes carrying `class`, in document order
    pub fn find_by_class(&self, class: &str) -> Vec<&Node> {
        std::iter::once(self)
            .chain(self.descendants())
            .filter(|n| n.has_class(class))
            .collect()
    }

    /// Closest ancestor-or-self of the node with `id` matching `pred`
    pub fn closest(&self, id: &str, pred: impl Fn(&Node) -> bool) -> Option<&Node> {
        let path = self.path_to(id)?;
        let chain = self.chain(&path)?;
        chain.into_iter().rev().find(|n| pred(n))
    }

    /// Value of an editable node, empty when absent
    pub fn value_of(&self, id: &str) -> &str {
        self.find_by_id(id).map(|n| n.value.as_str()).unwrap_or("")
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mutation
    // ─────────────────────────────────────────────────────────────────────

    /// Insert `node` as the next sibling of the node with `anchor_id`
    pub fn insert_after(&mut self, anchor_id: &str, node: Node) -> bool {
        if let Some(pos) = self.children.iter().position(|c| c.is_id(anchor_id)) {
            self.children.insert(pos + 1, node);
            return true;
        }
        self.children
            .iter_mut()
            .any(|c| c.insert_after(anchor_id, node.clone()))
    }

    /// Detach the node with `id` and return it
    pub fn remove_by_id(&mut self, id: &str) -> Option<Node> {
        if let Some(pos) = self.children.iter().position(|c| c.is_id(id)) {
            return Some(self.children.remove(pos));
        }
        self.children.iter_mut().find_map(|c| c.remove_by_id(id))
    }

    /// Parent of the node with `id`
    pub fn parent_of(&self, id: &str) -> Option<&Node> {
        if self.children.iter().any(|c| c.is_id(id)) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.parent_of(id))
    }

    pub fn parent_of_mut(&mut self, id: &str) -> Option<&mut Node> {
        if self.children.iter().any(|c| c.is_id(id)) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.parent_of_mut(id))
    }

    /// Swap the node with `id` with its previous (`-1`) or next (`+1`) sibling
    pub fn shift_sibling(&mut self, id: &str, delta: isize) -> bool {
        let Some(parent) = self.parent_of_mut(id) else {
            return false;
        };
        let Some(pos) = parent.children.iter().position(|c| c.is_id(id)) else {
            return false;
        };
        let target = pos as isize + delta;
        if target < 0 || target as usize >= parent.children.len() {
            return false;
        }
        parent.children.swap(pos, target as usize);
        true
    }

    pub fn set_disabled(&mut self, id: &str, disabled: bool) {
        if let Some(node) = self.find_by_id_mut(id) {
            node.disabled = disabled;
        }
    }
}
