//! Worldview tab: main settings form, rules, setting-card groups

use crate::core::limits::{GENRE_MAX, LOGLINE_MAX, RULE_MAX};
use crate::core::models::{Project, Worldview, WorldviewGroup};
use crate::view::dnd::{drop_intent, DropKind, GROUP_ID_ATTR, KIND_ATTR, SORTABLE_CLASS};
use crate::view::intent::{Intent, Modal};
use crate::view::listeners::{EventContext, EventKind};
use crate::view::node::{Node, Tag};
use crate::view::render::cards::worldview_card;
use crate::view::render::{empty_note, RenderCtx};
use crate::view::validation::{all_of, max_length, required};


const RULES_LIST: &str = "wv-rules";

fn rule_field(index: usize, value: &str) -> Node {
    Node::input(format!("wv-rule-{}", index), format!("Rule {}", index + 1), value)
        .with_class("rule")
}

/// Collect the worldview as currently typed into the form
pub fn read_form(ctx: &EventContext<'_>) -> Worldview {
    let rules = ctx
        .root
        .find_by_id(RULES_LIST)
        .map(|list| {
            list.children
                .iter()
                .filter(|n| n.has_class("rule"))
                .map(|n| n.value.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect()
        })
        .unwrap_or_default();

    Worldview {
        logline: ctx.field("wv-logline").trim().to_string(),
        genre: ctx.field("wv-genre").trim().to_string(),
        rules,
    }
}

/// Append an empty rule input to the rules list
pub fn add_rule_field(root: &mut Node) -> Option<String> {
    let list = root.find_by_id_mut(RULES_LIST)?;
    let index = list.children.iter().filter(|n| n.has_class("rule")).count();
    let field = rule_field(index, "");
    let id = field.id.clone();
    list.children.push(field);
    id
}

pub fn render_worldview(ctx: &mut RenderCtx<'_>, container: &mut Node, project: &Project) {
    ctx.replace(container, |ctx| {
        let worldview = &project.worldview;

        let logline = ctx.validated(
            Node::textarea("wv-logline", "Logline", worldview.logline.as_str()),
            all_of(vec![required(), max_length(LOGLINE_MAX)]),
        );
        let genre = ctx.validated(
            Node::input("wv-genre", "Genre", worldview.genre.as_str()),
            max_length(GENRE_MAX),
        );

        let mut rules: Vec<Node> = worldview
            .rules
            .iter()
            .enumerate()
            .map(|(i, rule)| rule_field(i, rule))
            .collect();
        if rules.is_empty() {
            rules.push(rule_field(0, ""));
        }
        let rules = Node::new(Tag::List)
            .with_id(RULES_LIST)
            .with_text("Rules")
            .with_children(rules);

        let actions = Node::div().with_class("toolbar").with_children([
            ctx.emit_on_click(Node::button("btn-add-rule", "Add rule"), Intent::AddRuleField),
            ctx.on(
                Node::button("btn-save-worldview", "Save worldview"),
                EventKind::Click,
                |ev| {
                    let worldview = read_form(ev);
                    ev.emit(Intent::SaveWorldview(worldview));
                },
            ),
            ctx.emit_on_click(
                Node::button("btn-generate-worldview", "Generate with AI"),
                Intent::OpenModal(Modal::GenerateWorldview),
            ),
        ]);

        let form = Node::new(Tag::Form)
            .with_id("worldview-form")
            .with_children([Node::form_group(logline), Node::form_group(genre), rules, actions]);

        let mut groups = Node::new(Tag::Section)
            .with_id("wv-groups")
            .with_text("Setting cards")
            .with_child(ctx.emit_on_click(
                Node::button("btn-new-wv-group", "New group"),
                Intent::OpenModal(Modal::CreateWorldviewGroup),
            ));
        if project.worldview_groups.is_empty() {
            groups = groups.with_child(empty_note("No setting groups yet."));
        }
        for group in &project.worldview_groups {
            groups = groups.with_child(group_section(ctx, group));
        }

        vec![Node::heading("Worldview"), form, groups]
    });
}

fn group_section(ctx: &mut RenderCtx<'_>, group: &WorldviewGroup) -> Node {
    let header = Node::div().with_class("group-header").with_children([
        ctx.emit_on_click(
            Node::button(format!("wv-group-add-card-{}", group.id), "Add card"),
            Intent::OpenModal(Modal::EditWorldviewCard {
                group_id: group.id.clone(),
                card_id: None,
            }),
        ),
        ctx.confirm_button(
            format!("wv-group-delete-{}", group.id),
            "Delete group",
            format!("Delete the setting group \"{}\" and its cards?", group.name),
            Intent::DeleteWorldviewGroup {
                group_id: group.id.clone(),
            },
        ),
    ]);

    let mut cards: Vec<&_> = group.worldview_cards.iter().collect();
    cards.sort_by_key(|c| c.ordering);
    let items: Vec<Node> = cards
        .into_iter()
        .map(|card| worldview_card(ctx, card, &group.id))
        .collect();

    let list = Node::new(Tag::List)
        .with_id(format!("wv-card-list-{}", group.id))
        .with_class(SORTABLE_CLASS)
        .with_attr(KIND_ATTR, DropKind::Worldview.as_str())
        .with_attr(GROUP_ID_ATTR, group.id.as_str())
        .with_children(items);
    let list = ctx.on(list, EventKind::Drop, |ev| {
        if let Some(intent) = drop_intent(ev, DropKind::Worldview) {
            ev.emit(intent);
        }
    });

    Node::new(Tag::Section)
        .with_id(format!("wv-group-{}", group.id))
        .with_text(group.name.as_str())
        .with_children([header, list])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::listeners::UiEvent;
    use crate::view::render::testing::Harness;

    fn project() -> Project {
        Project {
            id: "p1".into(),
            name: "Saga".into(),
            worldview: Worldview {
                logline: "Drifting islands".into(),
                genre: "fantasy".into(),
                rules: vec!["Iron sinks islands".into()],
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_save_reads_current_form_values() {
        let mut harness = Harness::new();
        let mut root = Node::div().with_id("tab-worldview");
        render_worldview(&mut harness.ctx(), &mut root, &project());

        let new_rule = add_rule_field(&mut root).unwrap();
        root.find_by_id_mut(&new_rule).unwrap().value = "Storms are alive".into();
        root.find_by_id_mut("wv-genre").unwrap().value = " myth ".into();

        let intents = harness
            .tracker
            .dispatch(&root, &UiEvent::click("btn-save-worldview"));

        assert_eq!(
            intents,
            vec![Intent::SaveWorldview(Worldview {
                logline: "Drifting islands".into(),
                genre: "myth".into(),
                rules: vec!["Iron sinks islands".into(), "Storms are alive".into()],
            })]
        );
    }

    #[test]
    fn test_blank_rules_are_dropped() {
        let mut harness = Harness::new();
        let mut root = Node::div().with_id("tab-worldview");
        let mut p = project();
        p.worldview.rules.clear();
        render_worldview(&mut harness.ctx(), &mut root, &p);

        let intents = harness
            .tracker
            .dispatch(&root, &UiEvent::click("btn-save-worldview"));
        match intents.as_slice() {
            [Intent::SaveWorldview(w)] => assert!(w.rules.is_empty()),
            other => panic!("unexpected intents: {:?}", other),
        }
    }
}
