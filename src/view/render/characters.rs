//! Characters tab: card groups, then the relationships between characters

use crate::core::models::{Group, Project, Relationship, UNCATEGORIZED_GROUP};
use crate::view::dnd::{drop_intent, DropKind, GROUP_ID_ATTR, KIND_ATTR, SORTABLE_CLASS};
use crate::view::intent::{Intent, Modal};
use crate::view::listeners::EventKind;
use crate::view::node::{Node, Tag};
use crate::view::render::cards::{character_card, preview};
use crate::view::render::{empty_note, RenderCtx};

pub fn render_characters(ctx: &mut RenderCtx<'_>, container: &mut Node, project: &Project) {
    ctx.replace(container, |ctx| {
        let toolbar = Node::div().with_class("toolbar").with_children([
            ctx.emit_on_click(
                Node::button("btn-new-group", "New group"),
                Intent::OpenModal(Modal::CreateGroup),
            ),
            ctx.emit_on_click(
                Node::button("btn-generate-character", "Generate character"),
                Intent::OpenModal(Modal::GenerateCharacter),
            ),
        ]);

        let mut children = vec![Node::heading("Characters"), toolbar];
        if project.groups.is_empty() {
            children.push(empty_note("No groups yet."));
        }
        children.extend(project.groups.iter().map(|group| group_section(ctx, group)));
        children.push(relationship_section(ctx, project));
        children
    });
}

fn relationship_section(ctx: &mut RenderCtx<'_>, project: &Project) -> Node {
    let mut section = Node::new(Tag::Section)
        .with_id("relationships")
        .with_text(format!("Relationships ({})", project.relationships.len()));

    // A relationship needs two characters
    if project.all_cards().nth(1).is_some() {
        section = section.with_child(ctx.emit_on_click(
            Node::button("btn-new-relationship", "New relationship"),
            Intent::OpenModal(Modal::EditRelationship {
                relationship_id: None,
            }),
        ));
    }
    if project.relationships.is_empty() {
        return section.with_child(empty_note("No relationships yet."));
    }

    let rows: Vec<Node> = project
        .relationships
        .iter()
        .map(|rel| relationship_row(ctx, project, rel))
        .collect();
    section.with_child(Node::new(Tag::List).with_id("relationship-list").with_children(rows))
}

fn relationship_row(ctx: &mut RenderCtx<'_>, project: &Project, rel: &Relationship) -> Node {
    let source = project.character_name(&rel.source_character_id);
    let target = project.character_name(&rel.target_character_id);
    let edit = Intent::OpenModal(Modal::EditRelationship {
        relationship_id: Some(rel.id.clone()),
    });

    let mut row = Node::new(Tag::Card)
        .with_id(format!("rel-{}", rel.id))
        .with_class("relationship")
        .with_text(format!("{} → {}: {}", source, target, rel.kind));
    if let Some(description) = rel.description.as_deref().filter(|d| !d.trim().is_empty()) {
        row = row.with_child(Node::paragraph(preview(description)));
    }
    let delete = ctx.confirm_button(
        format!("rel-delete-{}", rel.id),
        "Delete",
        format!("Delete how {} sees {}?", source, target),
        Intent::DeleteRelationship {
            relationship_id: rel.id.clone(),
        },
    );
    ctx.emit_on_click(row.with_child(delete), edit)
}

fn group_section(ctx: &mut RenderCtx<'_>, group: &Group) -> Node {
    let mut header = Node::div().with_class("group-header").with_child(
        ctx.emit_on_click(
            Node::button(format!("group-add-card-{}", group.id), "Add card"),
            Intent::OpenModal(Modal::EditCard {
                group_id: group.id.clone(),
                card_id: None,
            }),
        ),
    );
    if group.name != UNCATEGORIZED_GROUP {
        header = header.with_child(ctx.confirm_button(
            format!("group-delete-{}", group.id),
            "Delete group",
            format!(
                "Delete the group \"{}\"? Its cards move to {}.",
                group.name, UNCATEGORIZED_GROUP
            ),
            Intent::DeleteGroup {
                group_id: group.id.clone(),
            },
        ));
    }

    let mut cards: Vec<&_> = group.cards.iter().collect();
    cards.sort_by_key(|c| c.ordering.unwrap_or(i64::MAX));
    let items: Vec<Node> = cards
        .into_iter()
        .map(|card| character_card(ctx, card, &group.id))
        .collect();

    let list = Node::new(Tag::List)
        .with_id(format!("card-list-{}", group.id))
        .with_class(SORTABLE_CLASS)
        .with_attr(KIND_ATTR, DropKind::Characters.as_str())
        .with_attr(GROUP_ID_ATTR, group.id.as_str())
        .with_children(items);
    let list = ctx.on(list, EventKind::Drop, |ev| {
        if let Some(intent) = drop_intent(ev, DropKind::Characters) {
            ev.emit(intent);
        }
    });

    Node::new(Tag::Section)
        .with_id(format!("group-{}", group.id))
        .with_text(format!("{} ({})", group.name, group.cards.len()))
        .with_children([header, list])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Card;
    use crate::view::listeners::UiEvent;
    use crate::view::render::testing::{ids, Harness};

    fn project() -> Project {
        let card = |id: &str, ordering| Card {
            id: id.into(),
            name: id.to_uppercase(),
            ordering: Some(ordering),
            ..Default::default()
        };
        Project {
            id: "p1".into(),
            name: "Saga".into(),
            groups: vec![
                Group {
                    id: "g1".into(),
                    name: "Heroes".into(),
                    cards: vec![card("b", 1), card("a", 0)],
                },
                Group {
                    id: "g0".into(),
                    name: UNCATEGORIZED_GROUP.into(),
                    cards: vec![],
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_cards_render_in_server_order() {
        let mut harness = Harness::new();
        let mut container = Node::div().with_id("tab-characters");
        render_characters(&mut harness.ctx(), &mut container, &project());

        let list = container.find_by_id("card-list-g1").unwrap();
        let order: Vec<_> = list.children.iter().filter_map(|n| n.id.as_deref()).collect();
        assert_eq!(order, vec!["card-a", "card-b"]);
    }

    #[test]
    fn test_uncategorized_group_has_no_delete_button() {
        let mut harness = Harness::new();
        let mut container = Node::div().with_id("tab-characters");
        render_characters(&mut harness.ctx(), &mut container, &project());

        let all = ids(&container);
        assert!(all.contains(&"group-delete-g1".to_string()));
        assert!(!all.contains(&"group-delete-g0".to_string()));
    }

    #[test]
    fn test_relationships_list_names_and_open_editor() {
        let mut harness = Harness::new();
        let mut project = project();
        project.relationships = vec![Relationship {
            id: "rel-1".into(),
            source_character_id: "a".into(),
            target_character_id: "b".into(),
            kind: "rival".into(),
            description: Some("Both want the crown.".into()),
        }];
        let mut container = Node::div().with_id("tab-characters");
        render_characters(&mut harness.ctx(), &mut container, &project);

        let row = container.find_by_id("rel-rel-1").unwrap();
        assert_eq!(row.text, "A → B: rival");
        assert_eq!(
            harness.tracker.dispatch(&container, &UiEvent::click("rel-rel-1")),
            vec![Intent::OpenModal(Modal::EditRelationship {
                relationship_id: Some("rel-1".into())
            })]
        );

        // The delete button confirms first and does not open the editor
        let intents = harness
            .tracker
            .dispatch(&container, &UiEvent::click("rel-delete-rel-1"));
        match intents.as_slice() {
            [Intent::OpenModal(Modal::Confirm { action, .. })] => assert_eq!(
                **action,
                Intent::DeleteRelationship {
                    relationship_id: "rel-1".into()
                }
            ),
            other => panic!("unexpected intents: {:?}", other),
        }
    }

    #[test]
    fn test_new_relationship_needs_two_characters() {
        let mut harness = Harness::new();
        let mut project = project();
        project.groups[0].cards.truncate(1);
        let mut container = Node::div().with_id("tab-characters");
        render_characters(&mut harness.ctx(), &mut container, &project);

        assert!(!ids(&container).contains(&"btn-new-relationship".to_string()));
        assert!(container.find_by_id("relationships").is_some());
    }

    #[test]
    fn test_rerender_does_not_accumulate_listeners() {
        let mut harness = Harness::new();
        let mut container = Node::div().with_id("tab-characters");
        render_characters(&mut harness.ctx(), &mut container, &project());
        let first = harness.tracker.len();
        render_characters(&mut harness.ctx(), &mut container, &project());
        assert_eq!(harness.tracker.len(), first);

        let intents = harness
            .tracker
            .dispatch(&container, &UiEvent::click("btn-new-group"));
        assert_eq!(intents, vec![Intent::OpenModal(Modal::CreateGroup)]);
    }
}
