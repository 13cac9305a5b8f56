//! Render collaborator contract.

use crate::Room;

/// One row of the room list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomListEntry {
    /// Room this row selects.
    pub room: Room,
    /// Text shown for the row.
    pub label: String,
    /// True for the current room.
    pub active: bool,
}

/// Write-only sink for chat output.
///
/// Implementations must not call back into the session.
pub trait View {
    /// Append a message to the conversation.
    fn render_message(&mut self, text: &str, is_self: bool, is_private: bool);

    /// Replace the room list. General comes first, self is never listed.
    fn render_room_list(&mut self, rooms: &[RoomListEntry]);

    /// Remove every message from the conversation.
    fn clear_conversation(&mut self);

    /// Empty the composer input.
    fn clear_composer(&mut self);
}
