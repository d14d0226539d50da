//! Modal dialogs
//!
//! Every modal has a `modal-cancel` button and, unless it is read-only, a
//! `modal-submit` button whose handler reads the `f-*` fields and emits the
//! matching intent. The modal stays open until the app closes it.

use crate::api::characters::WorldviewLevel;
use crate::api::scenarios::DEFAULT_PLOT_POINT_COUNT;
use crate::core::limits::{
    DESCRIPTION_MAX, MAX_TAGS, NAME_MAX, PLOT_POINTS_MAX, PROMPT_MAX, TAG_MAX, TENDENCY_MAX,
    TENDENCY_MIN,
};
use crate::core::models::{join_tags, split_tags, CardDraft, Project};
use crate::core::state::ProjectState;
use crate::view::intent::{Intent, Modal};
use crate::view::listeners::{EventContext, EventKind};
use crate::view::node::{Node, Tag};
use crate::view::render::{empty_note, RenderCtx};
use crate::view::validation::{
    all_of, int_range, max_length, required, tag_list, ValidationResult, ValidatorFn,
};

pub const MODAL_ID: &str = "modal";
pub const SUBMIT_ID: &str = "modal-submit";
pub const CANCEL_ID: &str = "modal-cancel";
/// Area the character generator streams into
pub const GENERATION_OUTPUT: &str = "gen-output";


fn title_of(modal: &Modal) -> &'static str {
    match modal {
        Modal::CreateProject => "New project",
        Modal::UnlockProject { .. } => "Unlock project",
        Modal::RenameProject { .. } => "Rename project",
        Modal::CreateGroup => "New group",
        Modal::CardDetail { .. } => "Character",
        Modal::EditCard { card_id: None, .. } => "New character",
        Modal::EditCard { .. } => "Edit character",
        Modal::GenerateCharacter => "Generate character",
        Modal::AiEditCard { .. } => "Edit with AI",
        Modal::EditRelationship { relationship_id: None } => "New relationship",
        Modal::EditRelationship { .. } => "Edit relationship",
        Modal::CreateWorldviewGroup => "New setting group",
        Modal::WorldviewCardDetail { .. } => "Setting card",
        Modal::EditWorldviewCard { card_id: None, .. } => "New setting card",
        Modal::EditWorldviewCard { .. } => "Edit setting card",
        Modal::AiEditWorldviewCard { .. } => "Edit with AI",
        Modal::GenerateWorldview => "Generate worldview",
        Modal::GenerateDraft => "Generate scenario draft",
        Modal::EditPlotPoint { plot_point_id: None } => "New plot point",
        Modal::EditPlotPoint { .. } => "Edit plot point",
        Modal::AiEditPlotPoint { .. } => "Edit plot point with AI",
        Modal::Confirm { .. } => "Confirm",
    }
}

fn yes_no() -> ValidatorFn {
    std::sync::Arc::new(|value: &str| match value.trim().to_lowercase().as_str() {
        "y" | "yes" | "n" | "no" | "" => ValidationResult::valid(),
        _ => ValidationResult::invalid("Answer yes or no."),
    })
}

fn worldview_level() -> ValidatorFn {
    std::sync::Arc::new(|value: &str| match WorldviewLevel::from_str(value.trim()) {
        Some(_) => ValidationResult::valid(),
        None => ValidationResult::invalid("One of: none, low, medium, high."),
    })
}

/// Accepts the name of a character in the project (case-insensitive)
fn known_character(names: Vec<String>) -> ValidatorFn {
    std::sync::Arc::new(move |value: &str| {
        let value = value.trim();
        if value.is_empty() || names.iter().any(|n| n.eq_ignore_ascii_case(value)) {
            ValidationResult::valid()
        } else {
            ValidationResult::invalid("No character with that name.")
        }
    })
}

/// Card id for a typed character name or id; unknown input passes through
fn resolve_character(cast: &[(String, String)], typed: &str) -> String {
    let typed = typed.trim();
    cast.iter()
        .find(|(name, id)| name.eq_ignore_ascii_case(typed) || id == typed)
        .map(|(_, id)| id.clone())
        .unwrap_or_else(|| typed.to_string())
}

fn is_yes(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "y" | "yes")
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim().to_string();
    (!value.is_empty()).then_some(value)
}

/// Rebuild the modal container for `modal`
pub fn render_modal(ctx: &mut RenderCtx<'_>, container: &mut Node, modal: &Modal, state: &ProjectState) {
    ctx.replace(container, |ctx| {
        let mut body = vec![Node::heading(title_of(modal))];
        body.extend(modal_body(ctx, modal, state));
        body.push(ctx.emit_on_click(Node::button(CANCEL_ID, "Cancel"), Intent::CloseModal));
        vec![Node::new(Tag::Section)
            .with_id(MODAL_ID)
            .with_class("modal")
            .with_children(body)]
    });
}

fn submit<F>(ctx: &mut RenderCtx<'_>, label: &str, build: F) -> Node
where
    F: Fn(&EventContext<'_>) -> Option<Intent> + 'static,
{
    submit_with_id(ctx, SUBMIT_ID, label, build)
}

fn submit_with_id<F>(ctx: &mut RenderCtx<'_>, id: &str, label: &str, build: F) -> Node
where
    F: Fn(&EventContext<'_>) -> Option<Intent> + 'static,
{
    ctx.on(Node::button(id, label).with_class("primary"), EventKind::Click, move |ev| {
        if let Some(intent) = build(ev) {
            ev.emit(intent);
        }
    })
}

fn name_field(ctx: &mut RenderCtx<'_>, label: &str, value: &str) -> Node {
    Node::form_group(ctx.validated(
        Node::input("f-name", label, value),
        all_of(vec![required(), max_length(NAME_MAX)]),
    ))
}

fn prompt_field(ctx: &mut RenderCtx<'_>, label: &str) -> Node {
    Node::form_group(ctx.validated(
        Node::textarea("f-prompt", label, ""),
        all_of(vec![required(), max_length(PROMPT_MAX)]),
    ))
}

fn tags_field(ctx: &mut RenderCtx<'_>, id: &str, label: &str, value: &[String]) -> Node {
    Node::form_group(ctx.validated(
        Node::input(id, label, join_tags(value)),
        tag_list(MAX_TAGS, TAG_MAX),
    ))
}

fn missing(what: &str) -> Vec<Node> {
    vec![empty_note(&format!("This {} no longer exists.", what))]
}

fn modal_body(ctx: &mut RenderCtx<'_>, modal: &Modal, state: &ProjectState) -> Vec<Node> {
    match modal {
        // ── Projects ─────────────────────────────────────────────────────────
        Modal::CreateProject => vec![
            name_field(ctx, "Name", ""),
            Node::form_group(Node::input("f-password", "Password (optional)", "")),
            submit(ctx, "Create", |ev| {
                Some(Intent::CreateProject {
                    name: ev.field("f-name").trim().to_string(),
                    password: non_empty(ev.field("f-password")),
                })
            }),
        ],

        Modal::UnlockProject { project_id, name } => {
            let project_id = project_id.clone();
            vec![
                Node::paragraph(format!("\"{}\" is password protected.", name)),
                Node::form_group(ctx.validated(
                    Node::input("f-password", "Password", ""),
                    required(),
                )),
                submit(ctx, "Unlock", move |ev| {
                    Some(Intent::UnlockProject {
                        project_id: project_id.clone(),
                        password: ev.field("f-password"),
                    })
                }),
            ]
        }

        Modal::RenameProject { project_id, name } => {
            let project_id = project_id.clone();
            vec![
                name_field(ctx, "Name", name),
                submit(ctx, "Rename", move |ev| {
                    Some(Intent::RenameProject {
                        project_id: project_id.clone(),
                        name: ev.field("f-name").trim().to_string(),
                    })
                }),
            ]
        }

        // ── Characters ───────────────────────────────────────────────────────
        Modal::CreateGroup => vec![
            name_field(ctx, "Group name", ""),
            submit(ctx, "Create", |ev| {
                Some(Intent::CreateGroup {
                    name: ev.field("f-name").trim().to_string(),
                })
            }),
        ],

        Modal::CardDetail { card_id } => {
            let Some((group, card)) = state.current().and_then(|p| p.find_card(card_id)) else {
                return missing("character");
            };
            let mut nodes = vec![Node::paragraph(card.name.as_str()).with_class("title")];
            let rows = [
                ("Description", card.description.clone().unwrap_or_default()),
                ("Goal", join_tags(&card.goal)),
                ("Personality", join_tags(&card.personality)),
                ("Abilities", join_tags(&card.abilities)),
                ("Quotes", card.quote.join(" / ")),
                ("Introduction", card.introduction_story.clone().unwrap_or_default()),
            ];
            nodes.extend(
                rows.into_iter()
                    .filter(|(_, v)| !v.trim().is_empty())
                    .map(|(label, v)| Node::paragraph(format!("{}: {}", label, v))),
            );
            nodes.push(ctx.emit_on_click(
                Node::button("modal-edit", "Edit"),
                Intent::OpenModal(Modal::EditCard {
                    group_id: group.id.clone(),
                    card_id: Some(card.id.clone()),
                }),
            ));
            nodes.push(ctx.emit_on_click(
                Node::button("modal-ai", "Edit with AI"),
                Intent::OpenModal(Modal::AiEditCard {
                    card_id: card.id.clone(),
                }),
            ));

            if let Some(project) = state.current() {
                let links: Vec<Node> = project
                    .relationships
                    .iter()
                    .filter(|r| r.source_character_id == card.id)
                    .map(|r| {
                        Node::paragraph(format!(
                            "→ {}: {}",
                            project.character_name(&r.target_character_id),
                            r.kind
                        ))
                    })
                    .collect();
                if !links.is_empty() {
                    nodes.push(Node::paragraph("Relationships").with_class("title"));
                    nodes.extend(links);
                }
            }

            let story = card.introduction_story.clone().unwrap_or_default();
            if !story.trim().is_empty() {
                let card_id = card.id.clone();
                nodes.push(Node::form_group(Node::textarea(
                    "f-highlighted",
                    "Names in the introduction",
                    "",
                )));
                nodes.push(submit_with_id(ctx, "modal-highlight", "Highlight names", move |_| {
                    Some(Intent::HighlightNames {
                        card_id: card_id.clone(),
                        text: story.clone(),
                    })
                }));
            }
            nodes
        }

        Modal::EditCard { group_id, card_id } => {
            let draft = match card_id {
                Some(id) => match state.current().and_then(|p| p.find_card(id)) {
                    Some((_, card)) => CardDraft::from(card),
                    None => return missing("character"),
                },
                None => CardDraft::default(),
            };
            let fields = vec![
                name_field(ctx, "Name", &draft.name),
                Node::form_group(Node::textarea("f-description", "Description", draft.description.as_str())),
                tags_field(ctx, "f-goal", "Goals (comma separated)", &draft.goal),
                tags_field(ctx, "f-personality", "Personality (comma separated)", &draft.personality),
                tags_field(ctx, "f-abilities", "Abilities (comma separated)", &draft.abilities),
                Node::form_group(Node::textarea("f-quote", "Quotes (one per line)", draft.quote.join("\n"))),
                Node::form_group(Node::textarea(
                    "f-story",
                    "Introduction",
                    draft.introduction_story.as_str(),
                )),
            ];

            let group_id = group_id.clone();
            let card_id = card_id.clone();
            let mut nodes = fields;
            nodes.push(submit(ctx, "Save", move |ev| {
                let quote = ev
                    .field("f-quote")
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect();
                Some(Intent::SaveCard {
                    group_id: group_id.clone(),
                    card_id: card_id.clone(),
                    draft: CardDraft {
                        name: ev.field("f-name").trim().to_string(),
                        description: ev.field("f-description").trim().to_string(),
                        goal: split_tags(&ev.field("f-goal")),
                        personality: split_tags(&ev.field("f-personality")),
                        abilities: split_tags(&ev.field("f-abilities")),
                        quote,
                        introduction_story: ev.field("f-story").trim().to_string(),
                    },
                })
            }));
            nodes
        }

        Modal::GenerateCharacter => vec![
            Node::form_group(ctx.validated(
                Node::textarea("f-keywords", "Keywords", ""),
                all_of(vec![required(), max_length(PROMPT_MAX)]),
            )),
            Node::new(Tag::Text)
                .with_id(GENERATION_OUTPUT)
                .with_class("generation"),
            submit(ctx, "Generate", |ev| {
                Some(Intent::GenerateCharacter {
                    keywords: ev.field("f-keywords").trim().to_string(),
                })
            }),
        ],

        Modal::AiEditCard { card_id } => {
            let Some((_, card)) = state.current().and_then(|p| p.find_card(card_id)) else {
                return missing("character");
            };
            let card_id = card.id.clone();
            vec![
                Node::paragraph(format!("Editing {}", card.name)),
                prompt_field(ctx, "What should change?"),
                Node::form_group(ctx.validated(
                    Node::input("f-level", "Worldview influence", WorldviewLevel::Medium.as_str()),
                    worldview_level(),
                )),
                Node::form_group(ctx.validated(
                    Node::input("f-related", "Also edit related characters? (y/n)", "no"),
                    yes_no(),
                )),
                submit(ctx, "Propose edits", move |ev| {
                    Some(Intent::AiEditCard {
                        card_id: card_id.clone(),
                        prompt: ev.field("f-prompt").trim().to_string(),
                        worldview_level: WorldviewLevel::from_str(ev.field("f-level").trim())
                            .unwrap_or(WorldviewLevel::Medium),
                        edit_related: is_yes(&ev.field("f-related")),
                    })
                }),
            ]
        }

        Modal::EditRelationship { relationship_id } => {
            let Some(project) = state.current() else {
                return missing("project");
            };
            relationship_form(ctx, project, relationship_id.as_deref())
        }

        // ── Worldview ────────────────────────────────────────────────────────
        Modal::CreateWorldviewGroup => vec![
            name_field(ctx, "Group name", ""),
            submit(ctx, "Create", |ev| {
                Some(Intent::CreateWorldviewGroup {
                    name: ev.field("f-name").trim().to_string(),
                })
            }),
        ],

        Modal::WorldviewCardDetail { card_id } => {
            let Some((group, card)) = state
                .current()
                .and_then(|p| p.find_worldview_card(card_id))
            else {
                return missing("setting card");
            };
            vec![
                Node::paragraph(card.title.as_str()).with_class("title"),
                Node::paragraph(card.content.as_str()),
                ctx.emit_on_click(
                    Node::button("modal-edit", "Edit"),
                    Intent::OpenModal(Modal::EditWorldviewCard {
                        group_id: group.id.clone(),
                        card_id: Some(card.id.clone()),
                    }),
                ),
                ctx.emit_on_click(
                    Node::button("modal-ai", "Edit with AI"),
                    Intent::OpenModal(Modal::AiEditWorldviewCard {
                        card_id: card.id.clone(),
                    }),
                ),
            ]
        }

        Modal::EditWorldviewCard { group_id, card_id } => {
            let (title, content) = match card_id {
                Some(id) => match state.current().and_then(|p| p.find_worldview_card(id)) {
                    Some((_, card)) => (card.title.clone(), card.content.clone()),
                    None => return missing("setting card"),
                },
                None => Default::default(),
            };
            let group_id = group_id.clone();
            let card_id = card_id.clone();
            vec![
                Node::form_group(ctx.validated(
                    Node::input("f-title", "Title", title),
                    all_of(vec![required(), max_length(NAME_MAX)]),
                )),
                Node::form_group(Node::textarea("f-content", "Content", content)),
                submit(ctx, "Save", move |ev| {
                    Some(Intent::SaveWorldviewCard {
                        group_id: group_id.clone(),
                        card_id: card_id.clone(),
                        title: ev.field("f-title").trim().to_string(),
                        content: ev.field("f-content").trim().to_string(),
                    })
                }),
            ]
        }

        Modal::AiEditWorldviewCard { card_id } => {
            let Some((_, card)) = state
                .current()
                .and_then(|p| p.find_worldview_card(card_id))
            else {
                return missing("setting card");
            };
            let card_id = card.id.clone();
            vec![
                Node::paragraph(format!("Editing {}", card.title)),
                prompt_field(ctx, "What should change?"),
                submit(ctx, "Propose edits", move |ev| {
                    Some(Intent::AiEditWorldviewCard {
                        card_id: card_id.clone(),
                        prompt: ev.field("f-prompt").trim().to_string(),
                    })
                }),
            ]
        }

        Modal::GenerateWorldview => {
            let has_existing = state
                .current()
                .map(|p| !p.worldview.logline.trim().is_empty())
                .unwrap_or(false);
            let mut nodes = vec![
                Node::form_group(ctx.validated(
                    Node::textarea("f-keywords", "Keywords", ""),
                    all_of(vec![required(), max_length(PROMPT_MAX)]),
                )),
                submit(ctx, "Generate new", |ev| {
                    Some(Intent::GenerateWorldview {
                        keywords: ev.field("f-keywords").trim().to_string(),
                        edit_existing: false,
                    })
                }),
            ];
            if has_existing {
                nodes.push(submit_with_id(ctx, "modal-submit-edit", "Refine existing", |ev| {
                    Some(Intent::GenerateWorldview {
                        keywords: ev.field("f-keywords").trim().to_string(),
                        edit_existing: true,
                    })
                }));
            }
            nodes
        }

        // ── Scenario ─────────────────────────────────────────────────────────
        Modal::GenerateDraft => {
            let Some(scenario) = state.scenario() else {
                return missing("scenario");
            };
            let scenario_id = scenario.id.clone();
            let cast = state
                .current()
                .map(|p| p.all_cards().count())
                .unwrap_or_default();
            vec![
                Node::paragraph(format!(
                    "The draft replaces the current plot points and uses all {} characters.",
                    cast
                )),
                Node::form_group(ctx.validated(
                    Node::input("f-count", "Plot points", DEFAULT_PLOT_POINT_COUNT.to_string()),
                    int_range(1, PLOT_POINTS_MAX),
                )),
                submit(ctx, "Generate", move |ev| {
                    Some(Intent::GenerateDraft {
                        scenario_id: scenario_id.clone(),
                        plot_point_count: ev.field("f-count").trim().to_string(),
                    })
                }),
            ]
        }

        Modal::EditPlotPoint { plot_point_id } => {
            let Some(scenario) = state.scenario() else {
                return missing("scenario");
            };
            let (title, content) = match plot_point_id {
                Some(id) => match scenario.plot_point(id) {
                    Some(p) => (p.title.clone(), p.content.clone().unwrap_or_default()),
                    None => return missing("plot point"),
                },
                None => Default::default(),
            };
            let scenario_id = scenario.id.clone();
            let plot_point_id = plot_point_id.clone();
            vec![
                Node::form_group(ctx.validated(
                    Node::input("f-title", "Title", title),
                    all_of(vec![required(), max_length(NAME_MAX)]),
                )),
                Node::form_group(Node::textarea("f-content", "Content", content)),
                submit(ctx, "Save", move |ev| {
                    Some(Intent::SavePlotPoint {
                        scenario_id: scenario_id.clone(),
                        plot_point_id: plot_point_id.clone(),
                        title: ev.field("f-title").trim().to_string(),
                        content: ev.field("f-content").trim().to_string(),
                    })
                }),
            ]
        }

        Modal::AiEditPlotPoint { plot_point_id } => {
            let Some(point) = state.scenario().and_then(|s| s.plot_point(plot_point_id)) else {
                return missing("plot point");
            };
            let plot_point_id = point.id.clone();
            vec![
                Node::paragraph(format!("Editing {}", point.title)),
                prompt_field(ctx, "What should change?"),
                submit(ctx, "Rewrite", move |ev| {
                    Some(Intent::AiEditPlotPoint {
                        plot_point_id: plot_point_id.clone(),
                        prompt: ev.field("f-prompt").trim().to_string(),
                    })
                }),
            ]
        }

        Modal::Confirm { message, action } => {
            let action = (**action).clone();
            vec![
                Node::paragraph(message.as_str()),
                submit(ctx, "Confirm", move |_| Some(action.clone())),
            ]
        }
    }
}

/// Ends of the link (fixed once created), AI suggestion inputs, then the
/// type and description that are saved
fn relationship_form(
    ctx: &mut RenderCtx<'_>,
    project: &Project,
    relationship_id: Option<&str>,
) -> Vec<Node> {
    let cast: Vec<(String, String)> = project
        .all_cards()
        .map(|c| (c.name.clone(), c.id.clone()))
        .collect();

    let existing = match relationship_id {
        Some(id) => match project.relationship(id) {
            Some(rel) => Some(rel),
            None => return missing("relationship"),
        },
        None => None,
    };

    let mut nodes = Vec::new();
    match existing {
        Some(rel) => nodes.push(Node::paragraph(format!(
            "How {} sees {}",
            project.character_name(&rel.source_character_id),
            project.character_name(&rel.target_character_id)
        ))),
        None => {
            let names: Vec<String> = cast.iter().map(|(name, _)| name.clone()).collect();
            nodes.push(
                Node::paragraph(format!("Characters: {}", names.join(", "))).with_class("tags"),
            );
            nodes.push(Node::form_group(ctx.validated(
                Node::input("f-source", "Character", ""),
                all_of(vec![required(), known_character(names.clone())]),
            )));
            nodes.push(Node::form_group(ctx.validated(
                Node::input("f-target", "Sees", ""),
                all_of(vec![required(), known_character(names)]),
            )));
        }
    }

    // Read the ends from the form, or from the relationship being edited
    let fixed = existing.map(|r| (r.source_character_id.clone(), r.target_character_id.clone()));
    let ends = move |ev: &EventContext<'_>| match &fixed {
        Some(pair) => pair.clone(),
        None => (
            resolve_character(&cast, &ev.field("f-source")),
            resolve_character(&cast, &ev.field("f-target")),
        ),
    };
    let ends = std::rc::Rc::new(ends);

    nodes.push(Node::form_group(ctx.validated(
        Node::input("f-tendency", "Tendency for AI (-2 hostile to 2 friendly)", "0"),
        int_range(TENDENCY_MIN, TENDENCY_MAX),
    )));
    nodes.push(Node::form_group(ctx.validated(
        Node::input("f-keyword", "Keyword for AI (optional)", ""),
        max_length(PROMPT_MAX),
    )));
    let suggest_ends = std::rc::Rc::clone(&ends);
    nodes.push(submit_with_id(ctx, "modal-suggest", "Suggest with AI", move |ev| {
        let (source, target) = suggest_ends(ev);
        Some(Intent::SuggestRelationship {
            source_character_id: source,
            target_character_id: target,
            tendency: ev.field("f-tendency").trim().to_string(),
            keyword: ev.field("f-keyword").trim().to_string(),
        })
    }));

    let (kind, description) = existing
        .map(|r| (r.kind.clone(), r.description.clone().unwrap_or_default()))
        .unwrap_or_default();
    nodes.push(Node::form_group(ctx.validated(
        Node::input("f-type", "Type", kind),
        all_of(vec![required(), max_length(NAME_MAX)]),
    )));
    nodes.push(Node::form_group(ctx.validated(
        Node::textarea("f-description", "Description", description),
        max_length(DESCRIPTION_MAX),
    )));

    let relationship_id = relationship_id.map(str::to_string);
    nodes.push(submit(ctx, "Save", move |ev| {
        let (source, target) = ends(ev);
        Some(Intent::SaveRelationship {
            relationship_id: relationship_id.clone(),
            source_character_id: source,
            target_character_id: target,
            kind: ev.field("f-type").trim().to_string(),
            description: ev.field("f-description").trim().to_string(),
        })
    }));
    nodes
}
