//! Session state machine.
//!
//! ```text
//!            select_room(Direct(p))
//! ┌──────────────────┐ ──────────────> ┌────────────────────────┐
//! │ Viewing(General) │                 │ Viewing(Direct(p))     │
//! └──────────────────┘ <────────────── └────────────────────────┘
//!            select_room(General)         select_room(Direct(q))
//! ```
//!
//! There is no terminal state. Roster updates and inbound messages never
//! change the current room.

use tracing::debug;

use crate::{Effect, Outbound, ParticipantId, Room, RoomKey, RoomListEntry, Roster, ViewCommand};

/// Label of the general room in room lists.
pub const GENERAL_LABEL: &str = "General";

/// Chat session of one local participant.
#[derive(Debug, Clone)]
pub struct Session {
    self_id: ParticipantId,
    current_room: Room,
    roster: Roster,
}

impl Session {
    /// Fresh session viewing the general room with an empty roster.
    pub fn new(self_id: impl Into<ParticipantId>) -> Self {
        Self { self_id: self_id.into(), current_room: Room::General, roster: Roster::new() }
    }

    /// Local participant id.
    pub fn self_id(&self) -> &ParticipantId {
        &self.self_id
    }

    /// Room currently shown.
    pub fn current_room(&self) -> &Room {
        &self.current_room
    }

    /// Latest roster.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Switch to `target`.
    ///
    /// Any target is accepted, including peers missing from the roster.
    /// Entering a direct room announces its canonical key. Selecting the
    /// current room again does nothing.
    pub fn select_room(&mut self, target: Room) -> Vec<Effect> {
        if target == self.current_room {
            return Vec::new();
        }

        debug!(from = %self.current_room, to = %target, "select room");
        self.current_room = target;

        let mut effects = Vec::with_capacity(3);
        if let Room::Direct(peer) = &self.current_room {
            effects.push(Effect::Send(Outbound::JoinRoom {
                room_key: RoomKey::pairwise(&self.self_id, peer),
            }));
        }
        effects.push(Effect::View(ViewCommand::ClearConversation));
        effects.push(Effect::View(ViewCommand::RenderRoomList(self.room_list())));
        effects
    }

    /// Replace the roster. The current room is left alone, even if its peer
    /// is gone.
    pub fn apply_roster(&mut self, roster: Roster) -> Vec<Effect> {
        debug!(entries = roster.len(), "apply roster");
        self.roster = roster;
        vec![Effect::View(ViewCommand::RenderRoomList(self.room_list()))]
    }

    /// Rows for the room list: General first, then every peer in roster order.
    pub fn room_list(&self) -> Vec<RoomListEntry> {
        let general = RoomListEntry {
            room: Room::General,
            label: GENERAL_LABEL.to_owned(),
            active: self.current_room == Room::General,
        };

        let peers = self.roster.peers(&self.self_id).map(|entry| {
            let room = Room::Direct(entry.id.clone());
            let active = room == self.current_room;
            RoomListEntry { room, label: entry.display_name.clone(), active }
        });

        std::iter::once(general).chain(peers).collect()
    }

    /// Human-readable name of `room`, using roster display names when known.
    pub fn room_label(&self, room: &Room) -> String {
        match room {
            Room::General => GENERAL_LABEL.to_owned(),
            Room::Direct(peer) => match self.roster.get(peer) {
                Some(entry) => entry.display_name.clone(),
                None => peer.to_string(),
            },
        }
    }

    /// Tag `text` for the current room.
    ///
    /// Whitespace is trimmed. Blank input produces no effects at all.
    pub fn compose_outbound(&self, text: &str) -> Vec<Effect> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        let outbound = match &self.current_room {
            Room::General => Outbound::Broadcast { text: text.to_owned() },
            Room::Direct(peer) => {
                Outbound::Direct { text: text.to_owned(), receiver: peer.clone() }
            },
        };

        vec![Effect::Send(outbound), Effect::View(ViewCommand::ClearComposer)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new("10.0.0.1")
    }

    fn direct(id: &str) -> Room {
        Room::Direct(ParticipantId::from(id))
    }

    #[test]
    fn starts_in_general_with_empty_roster() {
        let session = session();

        assert_eq!(session.current_room(), &Room::General);
        assert!(session.roster().is_empty());
    }

    #[test]
    fn select_direct_emits_join_clear_and_rebuild() {
        let mut session = session();
        let effects = session.select_room(direct("10.0.0.2"));

        assert_eq!(session.current_room(), &direct("10.0.0.2"));
        assert!(matches!(effects.as_slice(), [
            Effect::Send(Outbound::JoinRoom { room_key }),
            Effect::View(ViewCommand::ClearConversation),
            Effect::View(ViewCommand::RenderRoomList(_)),
        ] if room_key.as_str() == "10.0.0.1_10.0.0.2"));
    }

    #[test]
    fn select_general_does_not_join() {
        let mut session = session();
        let _ = session.select_room(direct("10.0.0.2"));
        let effects = session.select_room(Room::General);

        assert!(matches!(effects.as_slice(), [
            Effect::View(ViewCommand::ClearConversation),
            Effect::View(ViewCommand::RenderRoomList(_)),
        ]));
    }

    #[test]
    fn reselecting_current_room_is_noop() {
        let mut session = session();
        let _ = session.select_room(direct("10.0.0.2"));

        assert!(session.select_room(direct("10.0.0.2")).is_empty());
        assert!(Session::new("x").select_room(Room::General).is_empty());
    }

    #[test]
    fn select_unknown_peer_is_allowed() {
        let mut session = session();
        let effects = session.select_room(direct("10.9.9.9"));

        assert_eq!(session.current_room(), &direct("10.9.9.9"));
        assert_eq!(effects.len(), 3);
    }

    #[test]
    fn room_list_marks_active_peer() {
        let mut session = session();
        let _ = session.apply_roster(Roster::from_pairs([
            ("10.0.0.2", "Alice"),
            ("10.0.0.1", "Me"),
            ("10.0.0.3", "Bob"),
        ]));
        let _ = session.select_room(direct("10.0.0.3"));

        let list = session.room_list();
        let rows: Vec<_> = list.iter().map(|e| (e.label.as_str(), e.active)).collect();
        assert_eq!(rows, [("General", false), ("Alice", false), ("Bob", true)]);
    }

    #[test]
    fn apply_roster_keeps_stale_direct_room() {
        let mut session = session();
        let _ = session.apply_roster(Roster::from_pairs([("10.0.0.2", "Alice")]));
        let _ = session.select_room(direct("10.0.0.2"));

        let effects = session.apply_roster(Roster::new());

        assert_eq!(session.current_room(), &direct("10.0.0.2"));
        assert_eq!(effects, vec![Effect::View(ViewCommand::RenderRoomList(vec![
            RoomListEntry { room: Room::General, label: "General".into(), active: false }
        ]))]);
    }

    #[test]
    fn compose_tags_current_room() {
        let mut session = session();
        assert_eq!(session.compose_outbound("  hi  ")[0], Effect::Send(Outbound::Broadcast {
            text: "hi".into()
        }));

        let _ = session.select_room(direct("10.0.0.2"));
        assert_eq!(session.compose_outbound("psst"), vec![
            Effect::Send(Outbound::Direct { text: "psst".into(), receiver: "10.0.0.2".into() }),
            Effect::View(ViewCommand::ClearComposer),
        ]);
    }

    #[test]
    fn compose_blank_is_noop() {
        let session = session();

        assert!(session.compose_outbound("").is_empty());
        assert!(session.compose_outbound(" \t\n ").is_empty());
    }

    #[test]
    fn room_label_falls_back_to_id() {
        let mut session = session();
        let _ = session.apply_roster(Roster::from_pairs([("10.0.0.2", "Alice")]));

        assert_eq!(session.room_label(&Room::General), "General");
        assert_eq!(session.room_label(&direct("10.0.0.2")), "Alice");
        assert_eq!(session.room_label(&direct("10.0.0.7")), "10.0.0.7");
    }
}
