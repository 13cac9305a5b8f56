//! Fuzz target for client session state
//!
//! Drives a `Session` through arbitrary interleavings of room selection,
//! roster snapshots, inbound traffic and composition.
//!
//! # Invariants
//!
//! - Every room list starts with General, and only rows for the current room
//!   are marked active
//! - The local participant never appears as a peer row
//! - Shown messages always belong to the current room
//! - Blank composition produces no effects
//! - Non-blank composition targets the current room with trimmed text

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use parlor_core::{
    Effect, Outbound, ParticipantId, Room, RoomListEntry, Roster, Session, ViewCommand,
};

const PEERS: [&str; 4] = ["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.4"];
const SELF_ID: &str = "10.0.0.1";

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    SelectGeneral,
    SelectPeer(u8),
    Roster(Vec<(u8, String)>),
    Broadcast { text: String, sender: Option<u8> },
    Direct { text: String, from: u8, to: u8 },
    Compose(String),
}

fn peer(idx: u8) -> ParticipantId {
    ParticipantId::from(PEERS[usize::from(idx) % PEERS.len()])
}

fn check_room_list(session: &Session, rooms: &[RoomListEntry]) {
    let general = rooms.first().unwrap();
    assert_eq!(general.room, Room::General);
    assert_eq!(general.active, session.current_room() == &Room::General);
    let current = session.current_room();
    assert!(rooms.iter().filter(|entry| entry.active).all(|entry| &entry.room == current));
    assert!(rooms.iter().all(|entry| entry.room.peer() != Some(session.self_id())));
}

fn check_effects(session: &Session, effects: &[Effect]) {
    for effect in effects {
        match effect {
            Effect::View(ViewCommand::RenderRoomList(rooms)) => check_room_list(session, rooms),
            Effect::View(ViewCommand::ShowMessage(message)) => {
                assert_eq!(&message.room, session.current_room());
            },
            _ => {},
        }
    }
}

fuzz_target!(|ops: Vec<Op>| {
    let mut session = Session::new(SELF_ID);

    for op in ops {
        let effects = match op {
            Op::SelectGeneral => session.select_room(Room::General),
            Op::SelectPeer(idx) => session.select_room(Room::Direct(peer(idx))),
            Op::Roster(entries) => {
                let pairs = entries.into_iter().map(|(idx, name)| (peer(idx), name));
                session.apply_roster(Roster::from_pairs(pairs))
            },
            Op::Broadcast { text, sender } => session.route_broadcast(text, sender.map(peer)),
            Op::Direct { text, from, to } => session.route_direct(text, peer(from), peer(to)),
            Op::Compose(text) => {
                let effects = session.compose_outbound(&text);
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    assert!(effects.is_empty());
                } else {
                    let expected = match session.current_room() {
                        Room::General => Outbound::Broadcast { text: trimmed.to_owned() },
                        Room::Direct(receiver) => Outbound::Direct {
                            text: trimmed.to_owned(),
                            receiver: receiver.clone(),
                        },
                    };
                    assert_eq!(effects.first(), Some(&Effect::Send(expected)));
                }
                effects
            },
        };

        check_effects(&session, &effects);
        check_room_list(&session, &session.room_list());
    }
});
