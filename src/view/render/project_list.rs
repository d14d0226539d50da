//! Project list screen

use crate::core::models::ProjectSummary;
use crate::view::intent::{Intent, Modal};
use crate::view::node::{Node, Tag};
use crate::view::render::{empty_note, RenderCtx};

pub fn render_project_list(ctx: &mut RenderCtx<'_>, container: &mut Node, projects: &[ProjectSummary]) {
    ctx.replace(container, |ctx| {
        let toolbar = Node::div().with_class("toolbar").with_child(ctx.emit_on_click(
            Node::button("btn-new-project", "New project"),
            Intent::OpenModal(Modal::CreateProject),
        ));

        let mut list = Node::new(Tag::List).with_id("project-list");
        if projects.is_empty() {
            list = list.with_child(empty_note("No projects yet. Create one to start writing."));
        }
        for project in projects {
            list = list.with_child(project_card(ctx, project));
        }

        vec![Node::heading("Projects"), toolbar, list]
    });
}

fn project_card(ctx: &mut RenderCtx<'_>, project: &ProjectSummary) -> Node {
    let label = if project.is_password_protected {
        format!("🔒 {}", project.name)
    } else {
        project.name.clone()
    };

    let rename = ctx.emit_on_click_only(
        Node::button(format!("project-rename-{}", project.id), "Rename"),
        Intent::OpenModal(Modal::RenameProject {
            project_id: project.id.clone(),
            name: project.name.clone(),
        }),
    );
    let delete = ctx.confirm_button(
        format!("project-delete-{}", project.id),
        "Delete",
        format!("Delete \"{}\" and everything in it?", project.name),
        Intent::DeleteProject {
            project_id: project.id.clone(),
        },
    );

    let card = Node::new(Tag::Card)
        .with_id(format!("project-{}", project.id))
        .with_class("project-card")
        .with_text(label)
        .with_children([rename, delete]);

    ctx.emit_on_click(
        card,
        Intent::OpenProject {
            project_id: project.id.clone(),
            protected: project.is_password_protected,
        },
    )
}
