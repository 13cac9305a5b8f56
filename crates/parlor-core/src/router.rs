//! Inbound message routing.
//!
//! Messages for a room other than the current one are dropped. There is no
//! backlog and no unread counter.

use tracing::debug;

use crate::{Effect, InboundMessage, ParticipantId, Room, Session, ViewCommand};

impl Session {
    /// Route a general-room message.
    ///
    /// Authorship is decided by `sender` when present, otherwise by looking for
    /// the `(<self id>)` marker in the text.
    pub fn route_broadcast(&self, text: String, sender: Option<ParticipantId>) -> Vec<Effect> {
        if self.current_room() != &Room::General {
            debug!(room = %self.current_room(), "drop broadcast outside general");
            return Vec::new();
        }

        let is_self = match &sender {
            Some(sender) => sender == self.self_id(),
            None => text.contains(&self.self_id().marker()),
        };

        let message = InboundMessage { room: Room::General, text, sender_id: sender, is_self };
        vec![Effect::View(ViewCommand::ShowMessage(message))]
    }

    /// Route a direct message between `from` and `to`.
    ///
    /// Shown only while viewing the room with the other party. Copies of our
    /// own messages come back with `from == self`.
    pub fn route_direct(
        &self,
        message: String,
        from: ParticipantId,
        to: ParticipantId,
    ) -> Vec<Effect> {
        let is_self = &from == self.self_id();
        let other_party = if is_self { to } else { from.clone() };
        let room = Room::Direct(other_party);

        if self.current_room() != &room {
            debug!(%room, current = %self.current_room(), "drop direct outside its room");
            return Vec::new();
        }

        let message = InboundMessage { room, text: message, sender_id: Some(from), is_self };
        vec![Effect::View(ViewCommand::ShowMessage(message))]
    }
}
