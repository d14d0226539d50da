//! Drag-and-drop reordering over the view tree
//!
//! Sortable lists carry the `card-list` class and a `data-kind`; their items
//! carry `data-item-id` and the `data-group-id` they were rendered in. The
//! front end moves item nodes around, then dispatches a `drop` event on the
//! list that received the item. The list's drop handler reads the new order
//! back from its children and turns it into an intent.

use crate::view::intent::Intent;
use crate::view::listeners::EventContext;
use crate::view::node::Node;

pub const SORTABLE_CLASS: &str = "card-list";
pub const KIND_ATTR: &str = "data-kind";
pub const ITEM_ID_ATTR: &str = "data-item-id";
pub const GROUP_ID_ATTR: &str = "data-group-id";

/// What a sortable list holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropKind {
    Characters,
    Worldview,
    Manuscript,
}

impl DropKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropKind::Characters => "character",
            DropKind::Worldview => "worldview",
            DropKind::Manuscript => "manuscript",
        }
    }

    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "character" => Some(DropKind::Characters),
            "worldview" => Some(DropKind::Worldview),
            "manuscript" => Some(DropKind::Manuscript),
            _ => None,
        }
    }

    /// Whether items may move between lists of this kind
    pub fn crosses_groups(&self) -> bool {
        !matches!(self, DropKind::Manuscript)
    }
}

/// Item ids of `container`'s children, in their current order
pub fn order_from_container(container: &Node, attr: &str) -> Vec<String> {
    container
        .children
        .iter()
        .filter_map(|n| n.attr(attr))
        .map(str::to_string)
        .collect()
}

/// Intent for a drop on `ctx.current`, the list that received the item
pub fn drop_intent(ctx: &EventContext<'_>, kind: DropKind) -> Option<Intent> {
    let list = ctx.current;
    let ids = order_from_container(list, ITEM_ID_ATTR);

    if kind == DropKind::Manuscript {
        return Some(Intent::ReorderBlocks { block_ids: ids });
    }

    let group_id = list.attr(GROUP_ID_ATTR)?.to_string();
    let dragged = ctx.event.value.as_str();
    let source = list
        .children
        .iter()
        .find(|n| n.attr(ITEM_ID_ATTR) == Some(dragged))
        .and_then(|n| n.attr(GROUP_ID_ATTR))
        .map(str::to_string);

    let intent = match (kind, source) {
        (DropKind::Characters, Some(source)) if source != group_id => Intent::MoveCard {
            card_id: dragged.to_string(),
            source_group_id: source,
            target_group_id: group_id,
            card_ids: ids,
        },
        (DropKind::Characters, _) => Intent::ReorderCards {
            group_id,
            card_ids: ids,
        },
        (DropKind::Worldview, Some(source)) if source != group_id => Intent::MoveWorldviewCard {
            card_id: dragged.to_string(),
            source_group_id: source,
            target_group_id: group_id,
            card_ids: ids,
        },
        (DropKind::Worldview, _) => Intent::ReorderWorldviewCards {
            group_id,
            card_ids: ids,
        },
        (DropKind::Manuscript, _) => return None,
    };
    Some(intent)
}

/// Sortable list enclosing the node with `item_id`
pub fn list_of<'a>(root: &'a Node, item_id: &str) -> Option<&'a Node> {
    root.parent_of(item_id)
        .filter(|parent| parent.has_class(SORTABLE_CLASS))
}

/// Move an item one step up (`-1`) or down (`+1`) within its list
///
/// Returns the list id to dispatch the drop on.
pub fn shift_item(root: &mut Node, item_id: &str, delta: isize) -> Option<String> {
    let list_id = list_of(root, item_id)?.id.clone()?;
    if root.shift_sibling(item_id, delta) {
        Some(list_id)
    } else {
        None
    }
}

/// Move an item to the end of the previous (`-1`) or next (`+1`) list of the same kind
///
/// Returns the receiving list id.
pub fn move_item_across(root: &mut Node, item_id: &str, delta: isize) -> Option<String> {
    let source = list_of(root, item_id)?;
    let kind = DropKind::from_attr(source.attr(KIND_ATTR)?)?;
    if !kind.crosses_groups() {
        return None;
    }
    let source_id = source.id.clone()?;

    let lists: Vec<String> = root
        .find_by_class(SORTABLE_CLASS)
        .into_iter()
        .filter(|n| n.attr(KIND_ATTR) == Some(kind.as_str()))
        .filter_map(|n| n.id.clone())
        .collect();
    let pos = lists.iter().position(|id| *id == source_id)? as isize;
    let target_id = lists.get(usize::try_from(pos + delta).ok()?)?.clone();

    let item = root.remove_by_id(item_id)?;
    match root.find_by_id_mut(&target_id) {
        Some(target) => {
            target.children.push(item);
            Some(target_id)
        }
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::listeners::{EventKind, ListenerTracker, UiEvent};
    use crate::view::node::Tag;
    use std::rc::Rc;

    fn item(id: &str, group: &str) -> Node {
        Node::new(Tag::Card)
            .with_id(format!("card-{}", id))
            .with_attr(ITEM_ID_ATTR, id)
            .with_attr(GROUP_ID_ATTR, group)
    }

    fn list(group: &str, kind: DropKind, items: Vec<Node>) -> Node {
        Node::new(Tag::List)
            .with_id(format!("list-{}", group))
            .with_class(SORTABLE_CLASS)
            .with_attr(KIND_ATTR, kind.as_str())
            .with_attr(GROUP_ID_ATTR, group)
            .with_children(items)
    }

    fn board(tracker: &mut ListenerTracker, kind: DropKind) -> Node {
        let mut first = list("g1", kind, vec![item("a", "g1"), item("b", "g1")]);
        let mut second = list("g2", kind, vec![item("c", "g2")]);
        for l in [&mut first, &mut second] {
            tracker.add(
                l,
                EventKind::Drop,
                Rc::new(move |ctx: &mut EventContext<'_>| {
                    if let Some(intent) = drop_intent(ctx, kind) {
                        ctx.emit(intent);
                    }
                }),
            );
        }
        Node::div().with_id("root").with_children([first, second])
    }

    #[test]
    fn test_order_from_container() {
        let l = list("g1", DropKind::Characters, vec![item("b", "g1"), item("a", "g1")]);
        assert_eq!(order_from_container(&l, ITEM_ID_ATTR), vec!["b", "a"]);
    }

    #[test]
    fn test_reorder_within_group() {
        let mut tracker = ListenerTracker::new();
        let mut root = board(&mut tracker, DropKind::Characters);

        let list_id = shift_item(&mut root, "card-b", -1).unwrap();
        let intents = tracker.dispatch(
            &root,
            &UiEvent::new(EventKind::Drop, list_id).with_value("b"),
        );

        assert_eq!(
            intents,
            vec![Intent::ReorderCards {
                group_id: "g1".into(),
                card_ids: vec!["b".into(), "a".into()],
            }]
        );
    }

    #[test]
    fn test_move_between_groups() {
        let mut tracker = ListenerTracker::new();
        let mut root = board(&mut tracker, DropKind::Worldview);

        let target = move_item_across(&mut root, "card-a", 1).unwrap();
        assert_eq!(target, "list-g2");
        let intents = tracker.dispatch(
            &root,
            &UiEvent::new(EventKind::Drop, target).with_value("a"),
        );

        assert_eq!(
            intents,
            vec![Intent::MoveWorldviewCard {
                card_id: "a".into(),
                source_group_id: "g1".into(),
                target_group_id: "g2".into(),
                card_ids: vec!["c".into(), "a".into()],
            }]
        );
    }

    #[test]
    fn test_no_list_beyond_the_edges() {
        let mut tracker = ListenerTracker::new();
        let mut root = board(&mut tracker, DropKind::Characters);
        assert!(move_item_across(&mut root, "card-a", -1).is_none());
        assert!(shift_item(&mut root, "card-c", 1).is_none());
        // Nothing was detached by the failed moves
        assert!(root.find_by_id("card-a").is_some());
    }

    #[test]
    fn test_manuscript_blocks_stay_in_their_list() {
        let mut tracker = ListenerTracker::new();
        let mut root = board(&mut tracker, DropKind::Manuscript);
        assert!(move_item_across(&mut root, "card-a", 1).is_none());
    }
}
