//! Input state and key handling for the TUI.
//!
//! Terminal keys are first mapped to a [`KeyAction`], then applied to the
//! composer or the [`App`]. Command parsing happens on [`KeyAction::Submit`].
//!
//! Plain messages are handed to [`App::submit`] without clearing the buffer:
//! the session clears the composer itself once the message is accepted, so
//! blank input and sends while offline keep what was typed.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use parlor_app::{App, AppAction};
use parlor_core::Room;

use crate::commands::{self, Command};

/// What a key press asks the client to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Insert a character at the cursor.
    Insert(char),
    /// Send the line or run the `/` command in it.
    Submit,
    /// Delete the character before the cursor.
    DeleteBack,
    /// Delete the character under the cursor.
    DeleteForward,
    /// Move the cursor one character left.
    CursorLeft,
    /// Move the cursor one character right.
    CursorRight,
    /// Move the cursor to the start of the line.
    CursorStart,
    /// Move the cursor to the end of the line.
    CursorEnd,
    /// Select the next room in the sidebar.
    NextRoom,
    /// Select the previous room in the sidebar.
    PreviousRoom,
    /// Leave the client.
    Quit,
}

impl KeyAction {
    /// Map a terminal key press. Keys with no binding give `None`.
    ///
    /// Raw mode swallows the interrupt signal, so `Ctrl-C` and `Ctrl-D` quit;
    /// other control chords are ignored rather than typed.
    pub fn from_key(key: KeyEvent) -> Option<Self> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c' | 'd') => Some(Self::Quit),
                _ => None,
            };
        }

        let action = match key.code {
            KeyCode::Char(c) => Self::Insert(c),
            KeyCode::Enter => Self::Submit,
            KeyCode::Backspace => Self::DeleteBack,
            KeyCode::Delete => Self::DeleteForward,
            KeyCode::Left => Self::CursorLeft,
            KeyCode::Right => Self::CursorRight,
            KeyCode::Home => Self::CursorStart,
            KeyCode::End => Self::CursorEnd,
            KeyCode::Tab | KeyCode::Down => Self::NextRoom,
            KeyCode::BackTab | KeyCode::Up => Self::PreviousRoom,
            KeyCode::Esc => Self::Quit,
            _ => return None,
        };
        Some(action)
    }
}

/// Composer input line.
///
/// The cursor counts characters, not bytes.
#[derive(Debug, Default)]
pub struct InputState {
    buffer: String,
    cursor: usize,
}

impl InputState {
    /// Create a new empty input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text in the input buffer.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Empty the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    /// Apply a key action.
    ///
    /// Returns actions to process: a render for editing keys, the App's
    /// actions for commands and room switching.
    pub fn apply(&mut self, action: KeyAction, app: &mut App) -> Vec<AppAction> {
        match action {
            KeyAction::Insert(c) => {
                let at = self.byte_index(self.cursor);
                self.buffer.insert(at, c);
                self.cursor += 1;
                vec![AppAction::Render]
            },
            KeyAction::DeleteBack => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_index(self.cursor);
                    self.buffer.remove(at);
                }
                vec![AppAction::Render]
            },
            KeyAction::DeleteForward => {
                if self.cursor < self.char_len() {
                    let at = self.byte_index(self.cursor);
                    self.buffer.remove(at);
                }
                vec![AppAction::Render]
            },
            KeyAction::CursorLeft => {
                self.cursor = self.cursor.saturating_sub(1);
                vec![AppAction::Render]
            },
            KeyAction::CursorRight => {
                if self.cursor < self.char_len() {
                    self.cursor += 1;
                }
                vec![AppAction::Render]
            },
            KeyAction::CursorStart => {
                self.cursor = 0;
                vec![AppAction::Render]
            },
            KeyAction::CursorEnd => {
                self.cursor = self.char_len();
                vec![AppAction::Render]
            },
            KeyAction::Submit => self.submit(app),
            KeyAction::NextRoom => app.next_room(),
            KeyAction::PreviousRoom => app.previous_room(),
            KeyAction::Quit => app.quit(),
        }
    }

    /// Parse the line and call the App API.
    fn submit(&mut self, app: &mut App) -> Vec<AppAction> {
        let command = commands::parse(&self.buffer);
        if !matches!(command, Command::Message { .. }) {
            self.clear();
        }

        match command {
            Command::Message { content } => app.submit(&content),
            Command::Direct { peer } => match Room::parse_target(&peer) {
                Ok(room) => app.select_room(room),
                Err(e) => {
                    app.set_status(e.to_string());
                    vec![AppAction::Render]
                },
            },
            Command::General => app.select_room(Room::General),
            Command::Who => {
                app.set_status(who(app));
                vec![AppAction::Render]
            },
            Command::Quit => app.quit(),
            Command::Unknown { input } => {
                app.set_status(format!("Unknown command: {input}"));
                vec![AppAction::Render]
            },
            Command::InvalidArgs { error, .. } => {
                app.set_status(error);
                vec![AppAction::Render]
            },
        }
    }

    fn char_len(&self) -> usize {
        self.buffer.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.buffer.char_indices().nth(char_index).map_or(self.buffer.len(), |(i, _)| i)
    }
}

/// Status line listing who is online.
fn who(app: &App) -> String {
    let Some(session) = app.session() else {
        return "Not connected".to_string();
    };

    let roster = session.roster();
    if roster.is_empty() {
        return "Nobody online".to_string();
    }

    let names: Vec<String> = roster
        .entries()
        .iter()
        .map(|entry| {
            let you = if entry.id == *session.self_id() { ", you" } else { "" };
            format!("{} {}{you}", entry.display_name, entry.id.marker())
        })
        .collect();
    format!("Online: {}", names.join(", "))
}
