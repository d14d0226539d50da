//! TUI theme and styles

use ratatui::style::{Color, Modifier, Style};

use crate::view::toast::ToastKind;

/// Application color theme
pub struct Theme;

impl Theme {
    /// Primary accent color
    pub const PRIMARY: Color = Color::Cyan;

    /// Secondary accent color
    pub const SECONDARY: Color = Color::Yellow;

    /// Success color
    pub const SUCCESS: Color = Color::Green;

    /// Error color
    pub const ERROR: Color = Color::Red;

    /// Muted text color
    pub const MUTED: Color = Color::DarkGray;

    /// Header style
    pub fn header() -> Style {
        Style::default().fg(Self::PRIMARY)
    }

    /// Status bar style
    pub fn status_bar() -> Style {
        Style::default().bg(Color::DarkGray)
    }

    /// Focused element
    pub fn focused() -> Style {
        Style::default().bg(Self::PRIMARY).fg(Color::Black)
    }

    /// Section and group headings
    pub fn heading() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn button() -> Style {
        Style::default().fg(Self::SECONDARY)
    }

    /// Destructive actions
    pub fn danger() -> Style {
        Style::default().fg(Self::ERROR)
    }

    /// Disabled element (request in flight)
    pub fn disabled() -> Style {
        Style::default()
            .fg(Self::MUTED)
            .add_modifier(Modifier::CROSSED_OUT)
    }

    /// Inline validation message
    pub fn invalid() -> Style {
        Style::default()
            .fg(Self::ERROR)
            .add_modifier(Modifier::ITALIC)
    }

    /// Currently selected list entry (the open manuscript block)
    pub fn selected() -> Style {
        Style::default()
            .fg(Self::SUCCESS)
            .add_modifier(Modifier::BOLD)
    }

    /// Normal text style
    pub fn normal() -> Style {
        Style::default()
    }

    /// Muted text style
    pub fn muted() -> Style {
        Style::default().fg(Self::MUTED)
    }

    pub fn toast(kind: ToastKind) -> Style {
        let color = match kind {
            ToastKind::Success => Self::SUCCESS,
            ToastKind::Info => Self::PRIMARY,
            ToastKind::Error => Self::ERROR,
        };
        Style::default().fg(color)
    }
}
