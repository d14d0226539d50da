//! Workspace frame: navigation bar plus the container of the active tab

use crate::core::config::AiModel;
use crate::view::intent::{Intent, Tab};
use crate::view::node::{Node, Tag};
use crate::view::render::RenderCtx;

pub const NAV_ID: &str = "workspace-nav";

/// Id of the button switching to `tab`
pub fn tab_button_id(tab: Tab) -> String {
    format!("tab-btn-{}", tab.title().to_lowercase())
}

/// Rebuild the frame; the tab renderer fills the returned container id afterwards
pub fn render_workspace(
    ctx: &mut RenderCtx<'_>,
    container: &mut Node,
    project_name: &str,
    active: Tab,
    model: AiModel,
) -> &'static str {
    ctx.replace(container, |ctx| {
        let mut nav = Node::div().with_id(NAV_ID).with_class("nav").with_child(
            ctx.emit_on_click(Node::button("btn-back", "← Projects"), Intent::BackToProjects),
        );
        for tab in Tab::all() {
            let mut button = Node::button(tab_button_id(tab), tab.title());
            if tab == active {
                button = button.with_class("active");
            }
            nav = nav.with_child(ctx.emit_on_click(button, Intent::SwitchTab(tab)));
        }
        nav = nav
            .with_child(ctx.emit_on_click(
                Node::button("btn-model", format!("Model: {}", model.display_name())),
                Intent::CycleModel,
            ))
            .with_child(ctx.emit_on_click(Node::button("btn-refresh", "Refresh"), Intent::Refresh));

        vec![
            Node::heading(project_name),
            nav,
            Node::new(Tag::Section).with_id(active.container_id()),
        ]
    });
    active.container_id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::listeners::UiEvent;
    use crate::view::render::testing::{ids, Harness};

    #[test]
    fn test_frame_marks_active_tab_and_leaves_container_empty() {
        let mut h = Harness::new();
        let mut root = Node::div().with_id("screen");
        let container_id =
            render_workspace(&mut h.ctx(), &mut root, "Saga", Tab::Scenario, AiModel::Pro);

        assert_eq!(container_id, "tab-scenario");
        assert!(root.find_by_id(container_id).unwrap().children.is_empty());
        assert!(root.find_by_id("tab-btn-scenario").unwrap().has_class("active"));
        assert!(!root.find_by_id("tab-btn-characters").unwrap().has_class("active"));
        assert_eq!(root.find_by_id("btn-model").unwrap().text, "Model: Gemini 2.5 Pro");
        assert!(ids(&root).contains(&"btn-refresh".to_string()));
    }

    #[test]
    fn test_nav_buttons_emit_navigation() {
        let mut h = Harness::new();
        let mut root = Node::div().with_id("screen");
        render_workspace(&mut h.ctx(), &mut root, "Saga", Tab::Characters, AiModel::default());

        assert_eq!(
            h.tracker.dispatch(&root, &UiEvent::click("tab-btn-manuscript")),
            vec![Intent::SwitchTab(Tab::Manuscript)]
        );
        assert_eq!(
            h.tracker.dispatch(&root, &UiEvent::click("btn-back")),
            vec![Intent::BackToProjects]
        );
    }
}
