//! Main UI renderer
//!
//! Draws the view tree held by [`App`]: the screen container fills the
//! content area, the modal layer is drawn as a centered popup on top.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::tui::app::{App, Screen, MODAL_LAYER_ID, SCREEN_ID};
use crate::tui::theme::Theme;
use crate::view::node::{Node, Tag};
use crate::view::validation::{INVALID_ATTR, MESSAGE_CLASS};

/// Spinner frames shown while requests are in flight
const SPINNER: &[&str] = &["\u{25d0}", "\u{25d3}", "\u{25d1}", "\u{25d2}"];

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Status bar
        ])
        .split(frame.area());

    render_header(frame, chunks[0], app);
    render_content(frame, chunks[1], app);
    render_status_bar(frame, chunks[2], app);

    if app.modal.is_some() {
        render_modal_popup(frame, app);
    }
    if !app.toasts.is_empty() {
        render_toasts(frame, chunks[1], app);
    }
    if app.error_popup.is_some() {
        render_error_popup(frame, app);
    }
    // Render help overlay on top if active
    if app.show_help {
        render_help_overlay(frame, app);
    }
}

/// Render the header
fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let location = match (app.current_screen, app.state.current()) {
        (Screen::Workspace, Some(project)) => format!("{} │ {}", project.name, app.tab.title()),
        _ => "Projects".to_string(),
    };
    let title = format!(
        " loom │ {} │ {} ",
        location,
        app.model.display_name()
    );

    let header = Paragraph::new(title)
        .style(Theme::header())
        .block(Block::default().borders(Borders::BOTTOM));

    frame.render_widget(header, area);
}

/// Render the current screen's subtree
fn render_content(frame: &mut Frame, area: Rect, app: &App) {
    let Some(screen) = app.root.find_by_id(SCREEN_ID) else {
        return;
    };
    let focus = if app.modal.is_none() {
        app.focus.as_deref()
    } else {
        None
    };
    let block = Block::default().borders(Borders::NONE);
    let inner = block.inner(area);
    let drawn = draw_tree(screen, focus);
    let offset = scroll_offset(drawn.focus_line, inner.height);

    let paragraph = Paragraph::new(drawn.lines)
        .block(block)
        .scroll((offset, 0));
    frame.render_widget(paragraph, area);
}

/// Render the status bar
fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let status_text = if app.pending > 0 {
        let spinner = SPINNER[(app.tick_counter as usize) % SPINNER.len()];
        format!(" {} Working… │ ? for help ", spinner)
    } else if app.editing() {
        " Type to edit │ Enter next field │ Tab move │ Esc back │ Ctrl+C quit ".to_string()
    } else {
        match app.current_screen {
            Screen::ProjectList => " j/k move │ Enter open │ n new project │ ? for help ".to_string(),
            Screen::Workspace => {
                " j/k move │ Enter select │ 1-4 tabs │ J/K drag │ ? for help ".to_string()
            }
        }
    };

    let status = Paragraph::new(status_text)
        .style(Theme::status_bar())
        .block(Block::default().borders(Borders::TOP));

    frame.render_widget(status, area);
}

/// Centered rectangle taking the given share of `area`
fn centered(area: Rect, width_pct: u16, height_pct: u16, min_w: u16, min_h: u16) -> Rect {
    let width = (area.width * width_pct / 100).max(min_w).min(area.width);
    let height = (area.height * height_pct / 100).max(min_h).min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn render_modal_popup(frame: &mut Frame, app: &App) {
    let Some(layer) = app.root.find_by_id(MODAL_LAYER_ID) else {
        return;
    };
    let popup_area = centered(frame.area(), 70, 75, 50, 12);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Theme::SECONDARY));
    let inner = block.inner(popup_area);
    let drawn = draw_tree(layer, app.focus.as_deref());
    let offset = scroll_offset(drawn.focus_line, inner.height);

    let popup = Paragraph::new(drawn.lines)
        .block(block)
        .scroll((offset, 0));
    frame.render_widget(popup, popup_area);
}

/// Toasts stack in the bottom-right corner of the content area
fn render_toasts(frame: &mut Frame, area: Rect, app: &App) {
    let lines: Vec<Line> = app
        .toasts
        .iter()
        .map(|toast| Line::from(Span::styled(format!(" {} ", toast.message), Theme::toast(toast.kind))))
        .collect();

    let width = lines
        .iter()
        .map(|l| l.width() as u16)
        .max()
        .unwrap_or(0)
        .saturating_add(2)
        .min(area.width);
    let height = (lines.len() as u16).saturating_add(2).min(area.height);
    let toast_area = Rect::new(
        area.x + area.width.saturating_sub(width),
        area.y + area.height.saturating_sub(height),
        width,
        height,
    );

    frame.render_widget(Clear, toast_area);
    let toasts = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    frame.render_widget(toasts, toast_area);
}

fn render_error_popup(frame: &mut Frame, app: &App) {
    let Some(popup) = &app.error_popup else {
        return;
    };
    let popup_area = centered(frame.area(), 60, 40, 40, 8);
    frame.render_widget(Clear, popup_area);

    let mut text: Vec<Line> = popup
        .message
        .split('\n')
        .map(|l| Line::from(l.to_string()))
        .collect();
    text.push(Line::from(""));
    text.push(Line::from(Span::styled(
        "Press Enter or Esc to dismiss",
        Theme::muted(),
    )));

    let error = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(format!(" {} ", popup.title))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Theme::ERROR)),
        )
        .style(Style::default().bg(Color::Black));
    frame.render_widget(error, popup_area);
}

/// Render the help overlay
fn render_help_overlay(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Calculate centered popup area (60% width, 70% height)
    let popup_width = (area.width * 60 / 100).min(64);
    let popup_height = (area.height * 70 / 100).min(22);
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let (title, help_lines) = get_help_content(app.current_screen, app.modal.is_some());

    let text: Vec<Line> = help_lines
        .into_iter()
        .map(|(key, desc)| {
            Line::from(vec![
                Span::styled(format!("  {:14}", key), Style::default().fg(Color::Cyan)),
                Span::raw(desc),
            ])
        })
        .collect();

    let help = Paragraph::new(text)
        .block(
            Block::default()
                .title(format!(" {} ", title))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .style(Style::default().bg(Color::Black));

    frame.render_widget(help, popup_area);
}

/// Get help content for the current screen
fn get_help_content(
    screen: Screen,
    in_modal: bool,
) -> (&'static str, Vec<(&'static str, &'static str)>) {
    if in_modal {
        return (
            "Help - Dialog",
            vec![
                ("Tab / ↓", "Next field"),
                ("Shift+Tab / ↑", "Previous field"),
                ("Enter", "Confirm field / press button"),
                ("Esc", "Close dialog"),
                ("Ctrl+C", "Quit"),
            ],
        );
    }

    match screen {
        Screen::ProjectList => (
            "Help - Projects",
            vec![
                ("j / ↓", "Move down"),
                ("k / ↑", "Move up"),
                ("Enter", "Open project"),
                ("n", "New project"),
                ("r", "Refresh list"),
                ("m", "Switch AI model"),
                ("q", "Quit application"),
                ("?", "Show this help"),
            ],
        ),
        Screen::Workspace => (
            "Help - Workspace",
            vec![
                ("j / k", "Move focus"),
                ("Enter / Space", "Press button / open card"),
                ("1-4", "Characters, Worldview, Scenario, Manuscript"),
                ("J / K", "Drag card down / up"),
                ("H / L", "Drag card to previous / next group"),
                ("r", "Reload project"),
                ("m", "Switch AI model"),
                ("Esc / q", "Back to projects"),
                ("?", "Show this help"),
            ],
        ),
    }
}

/// First line to draw so the focused line stays on screen
fn scroll_offset(focus_line: Option<usize>, height: u16) -> u16 {
    let Some(line) = focus_line else {
        return 0;
    };
    let visible = height.saturating_sub(2) as usize;
    line.saturating_sub(visible) as u16
}

// ─────────────────────────────────────────────────────────────────────────────
// View tree drawing
// ─────────────────────────────────────────────────────────────────────────────

/// Lines of a drawn subtree plus where the focused node landed
pub struct Drawn {
    pub lines: Vec<Line<'static>>,
    pub focus_line: Option<usize>,
}

/// Flatten `root` into styled lines
pub fn draw_tree(root: &Node, focus: Option<&str>) -> Drawn {
    let mut painter = Painter {
        focus,
        lines: Vec::new(),
        focus_line: None,
    };
    painter.node(root, 0);
    Drawn {
        lines: painter.lines,
        focus_line: painter.focus_line,
    }
}

struct Painter<'f> {
    focus: Option<&'f str>,
    lines: Vec<Line<'static>>,
    focus_line: Option<usize>,
}

impl Painter<'_> {
    fn is_focused(&self, node: &Node) -> bool {
        matches!((self.focus, node.id.as_deref()), (Some(f), Some(id)) if f == id)
    }

    fn mark_focus(&mut self, node: &Node) {
        if self.is_focused(node) {
            self.focus_line = Some(self.lines.len());
        }
    }

    fn style_for(&self, node: &Node, base: Style) -> Style {
        if self.is_focused(node) {
            Theme::focused()
        } else if node.disabled {
            Theme::disabled()
        } else if node.has_class("danger") {
            Theme::danger()
        } else if node.has_class("active") || node.has_class("selected") {
            Theme::selected()
        } else {
            base
        }
    }

    fn push(&mut self, depth: usize, spans: Vec<Span<'static>>) {
        let mut all = vec![Span::raw("  ".repeat(depth))];
        all.extend(spans);
        self.lines.push(Line::from(all));
    }

    fn node(&mut self, node: &Node, depth: usize) {
        match node.tag {
            Tag::Heading => {
                if !self.lines.is_empty() {
                    self.lines.push(Line::from(""));
                }
                self.push(depth, vec![Span::styled(node.text.clone(), Theme::heading())]);
            }
            Tag::Text => {
                let style = if node.has_class(MESSAGE_CLASS) {
                    Theme::invalid()
                } else if node.has_class("empty") || node.has_class("tags") {
                    Theme::muted()
                } else {
                    Theme::normal()
                };
                let prefix = if node.has_class(MESSAGE_CLASS) { "⚠ " } else { "" };
                for (i, line) in node.text.split('\n').enumerate() {
                    let lead = if i == 0 { prefix } else { "" };
                    self.push(depth, vec![Span::styled(format!("{}{}", lead, line), style)]);
                }
            }
            Tag::Button => self.button_row(&[node], depth),
            Tag::Input => {
                self.mark_focus(node);
                let label_style = if node.attr(INVALID_ATTR).is_some() {
                    Theme::invalid()
                } else {
                    Theme::muted()
                };
                let cursor = if self.is_focused(node) { "▏" } else { "" };
                self.push(
                    depth,
                    vec![
                        Span::styled(format!("{}: ", node.text), label_style),
                        Span::styled(format!("{}{}", node.value, cursor), self.style_for(node, Theme::normal())),
                    ],
                );
            }
            Tag::TextArea => {
                self.mark_focus(node);
                let label_style = if node.attr(INVALID_ATTR).is_some() {
                    Theme::invalid()
                } else {
                    Theme::muted()
                };
                let focused = self.is_focused(node);
                self.push(depth, vec![Span::styled(format!("{}:", node.text), label_style)]);
                let bar_style = self.style_for(node, Theme::muted());
                let value_lines: Vec<&str> = node.value.split('\n').collect();
                let last = value_lines.len() - 1;
                for (i, line) in value_lines.iter().enumerate() {
                    let cursor = if focused && i == last { "▏" } else { "" };
                    self.push(
                        depth,
                        vec![
                            Span::styled("│ ", bar_style),
                            Span::raw(format!("{}{}", line, cursor)),
                        ],
                    );
                }
            }
            Tag::Card => {
                self.mark_focus(node);
                let style = self.style_for(node, Theme::normal().add_modifier(Modifier::BOLD));
                self.push(depth, vec![Span::styled(format!("▸ {}", node.text), style)]);
                self.children(node, depth + 1);
            }
            Tag::Div | Tag::Section | Tag::Form | Tag::List => {
                if !node.text.is_empty() {
                    self.push(depth, vec![Span::styled(node.text.clone(), Theme::heading())]);
                }
                let indent = usize::from(matches!(node.tag, Tag::List));
                self.children(node, depth + indent);
            }
        }
    }

    /// Draw children, putting runs of buttons on one line
    fn children(&mut self, node: &Node, depth: usize) {
        let mut run: Vec<&Node> = Vec::new();
        for child in &node.children {
            if child.tag == Tag::Button {
                run.push(child);
                continue;
            }
            if !run.is_empty() {
                self.button_row(&run, depth);
                run.clear();
            }
            self.node(child, depth);
        }
        if !run.is_empty() {
            self.button_row(&run, depth);
        }
    }

    fn button_row(&mut self, buttons: &[&Node], depth: usize) {
        let mut spans = Vec::new();
        for (i, button) in buttons.iter().enumerate() {
            self.mark_focus(button);
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(
                format!("[ {} ]", button.text),
                self.style_for(button, Theme::button()),
            ));
        }
        self.push(depth, spans);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::MockTransport;
    use crate::api::ApiClient;
    use crate::core::config::Config;
    use crate::core::session::SessionStore;
    use crate::tui::app::ErrorPopup;
    use ratatui::backend::TestBackend;
    use std::sync::Arc;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_buttons_share_a_row() {
        let root = Node::div()
            .with_child(Node::heading("Projects"))
            .with_child(
                Node::div()
                    .with_child(Node::button("a", "New"))
                    .with_child(Node::button("b", "Refresh")),
            )
            .with_child(Node::paragraph("No projects yet.").with_class("empty"));

        let drawn = draw_tree(&root, Some("b"));
        let texts: Vec<String> = drawn.lines.iter().map(text_of).collect();
        assert_eq!(texts, vec!["Projects", "[ New ] [ Refresh ]", "No projects yet."]);
        assert_eq!(drawn.focus_line, Some(1));
    }

    #[test]
    fn test_fields_and_cards() {
        let root = Node::div()
            .with_child(Node::input("name", "Name", "Aria"))
            .with_child(Node::textarea("bio", "Bio", "line one\nline two"))
            .with_child(
                Node::new(Tag::List).with_child(
                    Node::new(Tag::Card)
                        .with_id("card-1")
                        .with_text("Aria")
                        .with_child(Node::paragraph("A pilot.")),
                ),
            );

        let drawn = draw_tree(&root, Some("card-1"));
        let texts: Vec<String> = drawn.lines.iter().map(text_of).collect();
        assert_eq!(
            texts,
            vec![
                "Name: Aria",
                "Bio:",
                "│ line one",
                "│ line two",
                "  ▸ Aria",
                "    A pilot.",
            ]
        );
        assert_eq!(drawn.focus_line, Some(4));
    }

    #[test]
    fn test_validation_message_is_flagged() {
        let root = Node::div().with_child(
            Node::paragraph("This field is required.").with_class(MESSAGE_CLASS),
        );
        let drawn = draw_tree(&root, None);
        assert_eq!(text_of(&drawn.lines[0]), "⚠ This field is required.");
        assert_eq!(drawn.lines[0].spans[1].style, Theme::invalid());
    }

    #[test]
    fn test_scroll_keeps_focus_visible() {
        assert_eq!(scroll_offset(None, 10), 0);
        assert_eq!(scroll_offset(Some(3), 10), 0);
        assert_eq!(scroll_offset(Some(20), 10), 12);
    }

    #[test]
    fn test_frame_shows_header_and_error() {
        let client = ApiClient::with_transport(Arc::new(MockTransport::new()), SessionStore::new());
        let mut app = App::new(
            Config::default(),
            std::env::temp_dir().join("loom-ui-tests.toml"),
            client,
        );
        app.error_popup = Some(ErrorPopup {
            title: "Request failed".into(),
            message: "Server exploded".into(),
        });

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| render(frame, &app)).unwrap();

        let buffer = terminal.backend().buffer();
        let screen: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(screen.contains("loom │ Projects"));
        assert!(screen.contains("Server exploded"));
    }
}
