//! Terminal-side view state.
//!
//! [`ViewState`] is the render collaborator the session writes into: it keeps
//! the conversation lines, the room list and the composer. The UI module
//! draws it; nothing here reads session state.

use std::collections::VecDeque;

use parlor_core::{RoomListEntry, View};

use crate::input::InputState;

/// Most lines kept in the conversation pane.
const MAX_LINES: usize = 1000;

/// One line of the conversation pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    /// Display-ready text.
    pub text: String,
    /// Sent by the local participant.
    pub is_self: bool,
    /// Part of a direct conversation.
    pub is_private: bool,
}

/// Everything the terminal shows besides [`parlor_app::App`] state.
#[derive(Debug, Default)]
pub struct ViewState {
    lines: VecDeque<ChatLine>,
    rooms: Vec<RoomListEntry>,
    /// Composer input line.
    pub input: InputState,
}

impl ViewState {
    /// Create an empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Conversation lines, oldest first.
    pub fn lines(&self) -> &VecDeque<ChatLine> {
        &self.lines
    }

    /// Room list as last rendered.
    pub fn rooms(&self) -> &[RoomListEntry] {
        &self.rooms
    }
}

impl View for ViewState {
    fn render_message(&mut self, text: &str, is_self: bool, is_private: bool) {
        if self.lines.len() >= MAX_LINES {
            self.lines.pop_front();
        }
        self.lines.push_back(ChatLine { text: text.to_owned(), is_self, is_private });
    }

    fn render_room_list(&mut self, rooms: &[RoomListEntry]) {
        self.rooms = rooms.to_vec();
    }

    fn clear_conversation(&mut self) {
        self.lines.clear();
    }

    fn clear_composer(&mut self) {
        self.input.clear();
    }
}
