//! Effects produced by the session.
//!
//! Session operations never perform I/O. They return [`Effect`]s that the
//! caller executes: [`Outbound`] requests go to the transport, [`ViewCommand`]s
//! go to a [`crate::View`].

use crate::{ParticipantId, Room, RoomKey, RoomListEntry, View};

/// Something the session wants done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Hand a request to the transport.
    Send(Outbound),
    /// Update the render collaborator.
    View(ViewCommand),
}

/// Outbound transport request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Post to the general room.
    Broadcast {
        /// Trimmed message text.
        text: String,
    },
    /// Send to a single peer.
    Direct {
        /// Trimmed message text.
        text: String,
        /// Recipient.
        receiver: ParticipantId,
    },
    /// Announce entry into a pairwise room.
    JoinRoom {
        /// Canonical key shared by both members.
        room_key: RoomKey,
    },
}

/// A routed inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Room the message belongs to.
    pub room: Room,
    /// Display-ready text.
    pub text: String,
    /// Author, when the transport supplied one.
    pub sender_id: Option<ParticipantId>,
    /// True if the local participant wrote it.
    pub is_self: bool,
}

impl InboundMessage {
    /// True for messages in a direct room.
    pub fn is_private(&self) -> bool {
        self.room.is_direct()
    }
}

/// Instruction for the render collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    /// Append a message to the conversation.
    ShowMessage(InboundMessage),
    /// Replace the room list.
    RenderRoomList(Vec<RoomListEntry>),
    /// Empty the conversation pane.
    ClearConversation,
    /// Empty the input line.
    ClearComposer,
}

impl ViewCommand {
    /// Execute the command against `view`.
    pub fn apply<V: View + ?Sized>(self, view: &mut V) {
        match self {
            Self::ShowMessage(message) => {
                let is_private = message.is_private();
                view.render_message(&message.text, message.is_self, is_private);
            },
            Self::RenderRoomList(rooms) => view.render_room_list(&rooms),
            Self::ClearConversation => view.clear_conversation(),
            Self::ClearComposer => view.clear_composer(),
        }
    }
}
