//! Scenario tab: scenario form and ordered plot points

use crate::api::scenarios::ScenarioUpdate;
use crate::core::limits::{THEMES_MAX, TITLE_MAX};
use crate::core::models::{join_tags, split_tags, PlotPoint, Scenario};
use crate::view::intent::{Intent, Modal};
use crate::view::listeners::EventKind;
use crate::view::node::{Node, Tag};
use crate::view::render::cards::preview;
use crate::view::render::{empty_note, RenderCtx};
use crate::view::validation::{all_of, max_length, required, tag_list};

pub fn render_scenario(ctx: &mut RenderCtx<'_>, container: &mut Node, scenario: Option<&Scenario>) {
    ctx.replace(container, |ctx| {
        let Some(scenario) = scenario else {
            return vec![
                Node::heading("Scenario"),
                empty_note("This project has no scenario yet."),
            ];
        };

        let title = ctx.validated(
            Node::input("sc-title", "Title", scenario.title.as_str()),
            all_of(vec![required(), max_length(TITLE_MAX)]),
        );
        let themes = ctx.validated(
            Node::input("sc-themes", "Themes (comma separated)", join_tags(&scenario.themes)),
            tag_list(THEMES_MAX, 30),
        );
        let summary = Node::textarea(
            "sc-summary",
            "Summary",
            scenario.summary.as_deref().unwrap_or(""),
        );
        let synopsis = Node::textarea(
            "sc-synopsis",
            "Synopsis",
            scenario.synopsis.as_deref().unwrap_or(""),
        );

        let scenario_id = scenario.id.clone();
        let save = ctx.on(
            Node::button("btn-save-scenario", "Save scenario"),
            EventKind::Click,
            move |ev| {
                let update = ScenarioUpdate {
                    title: ev.field("sc-title").trim().to_string(),
                    summary: ev.field("sc-summary"),
                    synopsis: ev.field("sc-synopsis"),
                    themes: split_tags(&ev.field("sc-themes")),
                };
                ev.emit(Intent::SaveScenario {
                    scenario_id: scenario_id.clone(),
                    update,
                });
            },
        );

        let form = Node::new(Tag::Form).with_id("scenario-form").with_children([
            Node::form_group(title),
            Node::form_group(themes),
            Node::form_group(summary),
            Node::form_group(synopsis),
            save,
        ]);

        let toolbar = Node::div().with_class("toolbar").with_children([
            ctx.emit_on_click(
                Node::button("btn-generate-draft", "Generate draft"),
                Intent::OpenModal(Modal::GenerateDraft),
            ),
            ctx.emit_on_click(
                Node::button("btn-add-plot-point", "Add plot point"),
                Intent::OpenModal(Modal::EditPlotPoint {
                    plot_point_id: None,
                }),
            ),
        ]);

        let points = scenario.ordered_plot_points();
        let mut list = Node::new(Tag::List).with_id("plot-points").with_text("Plot");
        if points.is_empty() {
            list = list.with_child(empty_note("No plot points yet."));
        }
        for (n, point) in points.into_iter().enumerate() {
            list = list.with_child(plot_point_card(ctx, n + 1, point));
        }

        vec![Node::heading("Scenario"), form, toolbar, list]
    });
}

fn plot_point_card(ctx: &mut RenderCtx<'_>, number: usize, point: &PlotPoint) -> Node {
    let id = &point.id;
    let buttons = [
        ctx.emit_on_click_only(
            Node::button(format!("plot-edit-{}", id), "Edit"),
            Intent::OpenModal(Modal::EditPlotPoint {
                plot_point_id: Some(id.clone()),
            }),
        ),
        ctx.emit_on_click_only(
            Node::button(format!("plot-ai-{}", id), "AI edit"),
            Intent::OpenModal(Modal::AiEditPlotPoint {
                plot_point_id: id.clone(),
            }),
        ),
        ctx.emit_on_click_only(
            Node::button(format!("plot-scene-{}", id), "Write scene"),
            Intent::GenerateScene {
                plot_point_id: id.clone(),
            },
        ),
        ctx.confirm_button(
            format!("plot-delete-{}", id),
            "Delete",
            format!("Delete plot point \"{}\"?", point.title),
            Intent::DeletePlotPoint {
                plot_point_id: id.clone(),
            },
        ),
    ];

    let mut card = Node::new(Tag::Card)
        .with_id(format!("plot-{}", id))
        .with_class("plot-point")
        .with_text(format!("{}. {}", number, point.title))
        .with_child(Node::paragraph(preview(point.content.as_deref().unwrap_or(""))));
    if point.has_scene_draft() {
        card = card.with_child(Node::paragraph("Scene drafted").with_class("badge"));
    }
    let card = card.with_children(buttons);

    ctx.emit_on_click(
        card,
        Intent::OpenModal(Modal::EditPlotPoint {
            plot_point_id: Some(id.clone()),
        }),
    )
}
