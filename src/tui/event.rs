//! Event handling for TUI

use std::time::Duration;

use crossterm::event::{
    self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
};
use tokio::sync::mpsc;
use tokio::time::interval;

/// Application events
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Keyboard event
    Key(KeyEvent),
    /// Bracketed paste into the focused field
    Paste(String),
    /// Terminal resize
    Resize(u16, u16),
    /// Tick event for periodic updates
    Tick,
}

/// Event handler for the TUI
pub struct EventHandler {
    rx: mpsc::Receiver<AppEvent>,
    /// Handle to the event task for cleanup
    _task: tokio::task::JoinHandle<()>,
}

impl EventHandler {
    /// Create a new event handler
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel(100);

        let task = tokio::spawn(async move {
            let mut tick_interval = interval(tick_rate);

            loop {
                tokio::select! {
                    _ = tick_interval.tick() => {
                        if tx.send(AppEvent::Tick).await.is_err() {
                            break;
                        }
                    }
                    result = tokio::task::spawn_blocking(|| {
                        event::poll(Duration::from_millis(50)).unwrap_or(false)
                    }) => {
                        // Only read if poll() returned true (event is ready)
                        if result.unwrap_or(false) {
                            if let Ok(evt) = event::read() {
                                if let Some(event) = translate(evt) {
                                    if tx.send(event).await.is_err() {
                                        break;
                                    }
                                }
                            }
                        }
                    }
                }
            }
        });

        Self { rx, _task: task }
    }

    /// Get the next event
    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}

fn translate(evt: CrosstermEvent) -> Option<AppEvent> {
    match evt {
        // Windows reports releases too
        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
        CrosstermEvent::Paste(text) => Some(AppEvent::Paste(text)),
        CrosstermEvent::Resize(w, h) => Some(AppEvent::Resize(w, h)),
        _ => None,
    }
}

/// Ctrl+C quits from anywhere, even while typing
pub fn is_force_quit_key(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// Helper to check for quit key outside text fields
pub fn is_quit_key(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('q') && key.modifiers == KeyModifiers::NONE
}

/// Helper to check for back/escape key
pub fn is_back_key(key: &KeyEvent) -> bool {
    key.code == KeyCode::Esc
}

/// Plain character typed into a field (no Ctrl/Alt chords)
pub fn typed_char(key: &KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Some(c)
        }
        _ => None,
    }
}

/// Drag gesture for the focused item: `(delta, across_groups)`
///
/// `K`/`J` or Shift+↑/↓ move within the list; `H`/`L` or Shift+←/→ move
/// to the previous/next group.
pub fn drag_gesture(key: &KeyEvent) -> Option<(isize, bool)> {
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    match key.code {
        KeyCode::Char('K') => Some((-1, false)),
        KeyCode::Char('J') => Some((1, false)),
        KeyCode::Char('H') => Some((-1, true)),
        KeyCode::Char('L') => Some((1, true)),
        KeyCode::Up if shift => Some((-1, false)),
        KeyCode::Down if shift => Some((1, false)),
        KeyCode::Left if shift => Some((-1, true)),
        KeyCode::Right if shift => Some((1, true)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_typed_char_ignores_chords() {
        assert_eq!(typed_char(&key(KeyCode::Char('a'), KeyModifiers::NONE)), Some('a'));
        assert_eq!(typed_char(&key(KeyCode::Char('A'), KeyModifiers::SHIFT)), Some('A'));
        assert_eq!(typed_char(&key(KeyCode::Char('s'), KeyModifiers::CONTROL)), None);
    }

    #[test]
    fn test_drag_gestures() {
        assert_eq!(drag_gesture(&key(KeyCode::Char('J'), KeyModifiers::SHIFT)), Some((1, false)));
        assert_eq!(drag_gesture(&key(KeyCode::Left, KeyModifiers::SHIFT)), Some((-1, true)));
        assert_eq!(drag_gesture(&key(KeyCode::Left, KeyModifiers::NONE)), None);
        assert_eq!(drag_gesture(&key(KeyCode::Char('j'), KeyModifiers::NONE)), None);
    }

    #[test]
    fn test_quit_keys() {
        assert!(is_force_quit_key(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(is_quit_key(&key(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(!is_quit_key(&key(KeyCode::Char('q'), KeyModifiers::CONTROL)));
    }
}
