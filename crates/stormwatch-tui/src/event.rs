//! Event handling for the stormwatch TUI.
//!
//! Maps keyboard and mouse input to application events.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

/// Application-level events that can trigger state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// Request application quit
    Quit,
    /// Force quit (Ctrl+C)
    ForceQuit,
    /// Clear the list and refetch right away
    Refresh,
    /// Repaint the screen without refetching (Ctrl+L)
    Redraw,
    /// Show help overlay
    ShowHelp,
    /// Hide help overlay
    HideHelp,
    /// Move focus up one alert
    NavigateUp,
    /// Move focus down one alert
    NavigateDown,
    /// Page up
    PageUp,
    /// Page down
    PageDown,
    /// Go to the newest alert
    GoToTop,
    /// Go to the oldest alert
    GoToBottom,
    /// Scroll the detail pane up
    DetailScrollUp,
    /// Scroll the detail pane down
    DetailScrollDown,
    /// No action needed
    None,
}

/// Input handler for converting terminal events to app events.
#[derive(Debug, Default)]
pub struct InputHandler {
    /// Whether the help overlay is showing
    help_visible: bool,
}

impl InputHandler {
    /// Create a new input handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the help overlay is showing.
    pub fn is_help_visible(&self) -> bool {
        self.help_visible
    }

    /// Handle a key event and return the corresponding app event.
    pub fn handle_key(&mut self, key: KeyEvent) -> AppEvent {
        // Ctrl+C always force quits
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return AppEvent::ForceQuit;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('l') {
            return AppEvent::Redraw;
        }

        // Any key closes the help overlay
        if self.help_visible {
            self.help_visible = false;
            return match key.code {
                KeyCode::Char('q') | KeyCode::Char('Q') => AppEvent::Quit,
                _ => AppEvent::HideHelp,
            };
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => AppEvent::Quit,

            KeyCode::Char('r') | KeyCode::Char('R') => AppEvent::Refresh,

            KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Char('H') => {
                self.help_visible = true;
                AppEvent::ShowHelp
            }

            // List navigation
            KeyCode::Up | KeyCode::Char('k') => AppEvent::NavigateUp,
            KeyCode::Down | KeyCode::Char('j') => AppEvent::NavigateDown,
            KeyCode::PageUp => AppEvent::PageUp,
            KeyCode::PageDown => AppEvent::PageDown,
            KeyCode::Home | KeyCode::Char('g') => AppEvent::GoToTop,
            KeyCode::End | KeyCode::Char('G') => AppEvent::GoToBottom,

            // Detail pane
            KeyCode::Char('K') => AppEvent::DetailScrollUp,
            KeyCode::Char('J') => AppEvent::DetailScrollDown,

            _ => AppEvent::None,
        }
    }

    /// Handle a mouse event. The wheel scrolls the alert list.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> AppEvent {
        match mouse.kind {
            MouseEventKind::ScrollUp => AppEvent::NavigateUp,
            MouseEventKind::ScrollDown => AppEvent::NavigateDown,
            _ => AppEvent::None,
        }
    }
}
