//! Manuscript tab: block list, editor with live counts, context panel

use crate::core::models::{count_chars, count_words, ManuscriptBlock, Project, Scenario};
use crate::view::dnd::{drop_intent, DropKind, ITEM_ID_ATTR, KIND_ATTR, SORTABLE_CLASS};
use crate::view::intent::{Intent, Modal};
use crate::view::listeners::EventKind;
use crate::view::node::{Node, Tag};
use crate::view::render::cards::preview;
use crate::view::render::{empty_note, RenderCtx};
use crate::view::validation::{all_of, max_length, required};

pub const CONTENT_FIELD: &str = "ms-content";
pub const COUNTS_NODE: &str = "ms-counts";

/// What the manuscript tab shows
pub struct ManuscriptView<'a> {
    pub blocks: &'a [ManuscriptBlock],
    pub selected: Option<&'a str>,
    pub project: &'a Project,
    pub scenario: Option<&'a Scenario>,
}

fn counts_label(chars: usize, words: usize) -> String {
    format!("{} chars · {} words", chars, words)
}

/// Recompute the editor's counts from the content field
pub fn refresh_counts(root: &mut Node) {
    let text = root.value_of(CONTENT_FIELD).to_string();
    if let Some(counts) = root.find_by_id_mut(COUNTS_NODE) {
        counts.text = counts_label(count_chars(&text), count_words(&text));
    }
}

pub fn render_manuscript(ctx: &mut RenderCtx<'_>, container: &mut Node, view: &ManuscriptView<'_>) {
    ctx.replace(container, |ctx| {
        let blocks = view.blocks;

        let import_intent = if blocks.is_empty() {
            Intent::ImportManuscript
        } else {
            Intent::OpenModal(Modal::Confirm {
                message: "Re-import from the plot? Existing blocks are replaced.".into(),
                action: Box::new(Intent::ImportManuscript),
            })
        };
        let mut toolbar = Node::div().with_class("toolbar").with_child(ctx.emit_on_click(
            Node::button("btn-import-manuscript", "Import from plot"),
            import_intent,
        ));
        if !blocks.is_empty() {
            toolbar = toolbar.with_child(ctx.confirm_button(
                "btn-clear-manuscript".into(),
                "Clear all",
                "Delete every manuscript block?".into(),
                Intent::ClearManuscript,
            ));
        }

        let total_chars: usize = blocks.iter().map(ManuscriptBlock::chars).sum();
        let total_words: usize = blocks.iter().map(ManuscriptBlock::words).sum();
        let summary = Node::paragraph(format!(
            "{} blocks · {}",
            blocks.len(),
            counts_label(total_chars, total_words)
        ))
        .with_id("ms-summary");

        let mut list = Node::new(Tag::List)
            .with_id("manuscript-blocks")
            .with_class(SORTABLE_CLASS)
            .with_attr(KIND_ATTR, DropKind::Manuscript.as_str());
        if blocks.is_empty() {
            list = list.with_child(empty_note("No blocks. Import them from the scenario plot."));
        }
        for block in blocks {
            let item = Node::new(Tag::Card)
                .with_id(format!("block-{}", block.id))
                .with_attr(ITEM_ID_ATTR, block.id.as_str())
                .with_text(block.title.as_str())
                .with_child(Node::paragraph(preview(block.text())));
            let item = if view.selected == Some(block.id.as_str()) {
                item.with_class("selected")
            } else {
                item
            };
            list = list.with_child(ctx.emit_on_click(
                item,
                Intent::SelectBlock {
                    block_id: block.id.clone(),
                },
            ));
        }
        let list = ctx.on(list, EventKind::Drop, |ev| {
            if let Some(intent) = drop_intent(ev, DropKind::Manuscript) {
                ev.emit(intent);
            }
        });

        let selected = view
            .selected
            .and_then(|id| blocks.iter().find(|b| b.id == id));

        vec![
            Node::heading("Manuscript"),
            toolbar,
            summary,
            list,
            editor(ctx, selected),
            context_panel(view.project, view.scenario, selected),
        ]
    });
}

fn editor(ctx: &mut RenderCtx<'_>, block: Option<&ManuscriptBlock>) -> Node {
    let section = Node::new(Tag::Section)
        .with_id("manuscript-editor")
        .with_text("Editor");
    let Some(block) = block else {
        return section.with_child(empty_note("Select a block to edit it."));
    };

    let title = ctx.validated(
        Node::input("ms-title", "Title", block.title.as_str()),
        all_of(vec![required(), max_length(200)]),
    );
    let content = Node::textarea(CONTENT_FIELD, "Text", block.text());
    let counts = Node::paragraph(counts_label(block.chars(), block.words())).with_id(COUNTS_NODE);

    let block_id = block.id.clone();
    let save = ctx.on(
        Node::button("btn-save-block", "Save block"),
        EventKind::Click,
        move |ev| {
            ev.emit(Intent::SaveBlock {
                block_id: block_id.clone(),
                title: ev.field("ms-title").trim().to_string(),
                content: ev.field(CONTENT_FIELD),
            });
        },
    );

    section.with_children([Node::form_group(title), Node::form_group(content), counts, save])
}

/// Plot point and cast the selected block was written from
fn context_panel(project: &Project, scenario: Option<&Scenario>, block: Option<&ManuscriptBlock>) -> Node {
    let mut panel = Node::new(Tag::Section)
        .with_id("manuscript-context")
        .with_text("Context");

    let plot = block.and_then(|b| {
        scenario.and_then(|s| s.plot_points.iter().find(|p| p.title == b.title))
    });
    match plot {
        Some(point) => {
            panel = panel
                .with_child(Node::paragraph(format!("Plot point: {}", point.title)))
                .with_child(Node::paragraph(point.content.as_deref().unwrap_or("")));
        }
        None => panel = panel.with_child(empty_note("No matching plot point.")),
    }

    let names: Vec<&str> = project.all_cards().map(|c| c.name.as_str()).collect();
    if !names.is_empty() {
        panel = panel.with_child(
            Node::paragraph(format!("Cast: {}", names.join(", "))).with_class("cast"),
        );
    }
    panel
}
