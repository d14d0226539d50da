//! Card components

use crate::core::models::{Card, WorldviewCard};
use crate::view::dnd::{GROUP_ID_ATTR, ITEM_ID_ATTR};
use crate::view::intent::{Intent, Modal};
use crate::view::node::{Node, Tag};
use crate::view::render::RenderCtx;

/// Characters shown in a card preview before the ellipsis
pub const PREVIEW_CHARS: usize = 80;

/// First [`PREVIEW_CHARS`] characters of `text`, with an ellipsis when cut
pub fn preview(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{}…", cut)
}

/// Character card: click opens the detail view, the edit button the edit form
pub fn character_card(ctx: &mut RenderCtx<'_>, card: &Card, group_id: &str) -> Node {
    let edit = ctx.emit_on_click_only(
        Node::button(format!("card-edit-{}", card.id), "Edit"),
        Intent::OpenModal(Modal::EditCard {
            group_id: group_id.to_string(),
            card_id: Some(card.id.clone()),
        }),
    );
    let delete = ctx.confirm_button(
        format!("card-delete-{}", card.id),
        "Delete",
        format!("Delete the character \"{}\"?", card.name),
        Intent::DeleteCard {
            group_id: group_id.to_string(),
            card_id: card.id.clone(),
        },
    );

    let mut node = Node::new(Tag::Card)
        .with_id(format!("card-{}", card.id))
        .with_class("character-card")
        .with_attr(ITEM_ID_ATTR, card.id.as_str())
        .with_attr(GROUP_ID_ATTR, group_id)
        .with_text(card.name.as_str())
        .with_child(Node::paragraph(preview(card.description.as_deref().unwrap_or(""))));

    if !card.personality.is_empty() {
        node = node.with_child(
            Node::paragraph(card.personality.join(" · ")).with_class("tags"),
        );
    }

    let node = node.with_children([edit, delete]);
    ctx.emit_on_click(
        node,
        Intent::OpenModal(Modal::CardDetail {
            card_id: card.id.clone(),
        }),
    )
}

/// Worldview card: same interaction model as character cards
pub fn worldview_card(ctx: &mut RenderCtx<'_>, card: &WorldviewCard, group_id: &str) -> Node {
    let edit = ctx.emit_on_click_only(
        Node::button(format!("wv-card-edit-{}", card.id), "Edit"),
        Intent::OpenModal(Modal::EditWorldviewCard {
            group_id: group_id.to_string(),
            card_id: Some(card.id.clone()),
        }),
    );
    let delete = ctx.confirm_button(
        format!("wv-card-delete-{}", card.id),
        "Delete",
        format!("Delete the setting card \"{}\"?", card.title),
        Intent::DeleteWorldviewCard {
            card_id: card.id.clone(),
        },
    );

    let node = Node::new(Tag::Card)
        .with_id(format!("wv-card-{}", card.id))
        .with_class("worldview-card")
        .with_attr(ITEM_ID_ATTR, card.id.as_str())
        .with_attr(GROUP_ID_ATTR, group_id)
        .with_text(card.title.as_str())
        .with_child(Node::paragraph(preview(&card.content)))
        .with_children([edit, delete]);

    ctx.emit_on_click(
        node,
        Intent::OpenModal(Modal::WorldviewCardDetail {
            card_id: card.id.clone(),
        }),
    )
}
