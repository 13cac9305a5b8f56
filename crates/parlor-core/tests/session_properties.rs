//! Property-based tests for the session state machine.
//!
//! Effects are applied to a recording view so assertions can be made on what
//! a user would actually see.

use parlor_core::{
    Effect, Outbound, ParticipantId, Room, RoomListEntry, Roster, Session, View, ViewCommand,
};
use proptest::prelude::*;

const SELF_ID: &str = "10.0.0.1";

/// View that records every call.
#[derive(Debug, Default)]
struct RecordingView {
    messages: Vec<(String, bool, bool)>,
    room_list: Vec<RoomListEntry>,
    conversation_clears: usize,
    composer_clears: usize,
}

impl View for RecordingView {
    fn render_message(&mut self, text: &str, is_self: bool, is_private: bool) {
        self.messages.push((text.to_owned(), is_self, is_private));
    }

    fn render_room_list(&mut self, rooms: &[RoomListEntry]) {
        self.room_list = rooms.to_vec();
    }

    fn clear_conversation(&mut self) {
        self.messages.clear();
        self.conversation_clears += 1;
    }

    fn clear_composer(&mut self) {
        self.composer_clears += 1;
    }
}

fn apply(view: &mut RecordingView, effects: Vec<Effect>) -> Vec<Outbound> {
    let mut sent = Vec::new();
    for effect in effects {
        match effect {
            Effect::Send(outbound) => sent.push(outbound),
            Effect::View(command) => command.apply(view),
        }
    }
    sent
}

fn peer_id() -> impl Strategy<Value = ParticipantId> {
    (1u8..8).prop_map(|n| ParticipantId::new(format!("10.0.0.{n}")))
}

fn room() -> impl Strategy<Value = Room> {
    prop_oneof![Just(Room::General), peer_id().prop_map(Room::Direct)]
}

fn roster() -> impl Strategy<Value = Roster> {
    prop::collection::vec((peer_id(), "[A-Za-z]{1,8}"), 0..6).prop_map(Roster::from_pairs)
}

#[derive(Debug, Clone)]
enum Op {
    Select(Room),
    Roster(Roster),
    Broadcast(String, Option<ParticipantId>),
    Direct(String, ParticipantId, ParticipantId),
    Compose(String),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        room().prop_map(Op::Select),
        roster().prop_map(Op::Roster),
        (".{0,20}", proptest::option::of(peer_id())).prop_map(|(t, s)| Op::Broadcast(t, s)),
        (".{0,20}", peer_id(), peer_id()).prop_map(|(t, f, to)| Op::Direct(t, f, to)),
        ".{0,20}".prop_map(Op::Compose),
    ]
}

fn run(session: &mut Session, op: Op) -> Vec<Effect> {
    match op {
        Op::Select(room) => session.select_room(room),
        Op::Roster(roster) => session.apply_roster(roster),
        Op::Broadcast(text, sender) => session.route_broadcast(text, sender),
        Op::Direct(text, from, to) => session.route_direct(text, from, to),
        Op::Compose(text) => session.compose_outbound(&text),
    }
}

proptest! {
    #[test]
    fn select_room_is_idempotent(history in prop::collection::vec(op(), 0..20), target in room()) {
        let mut session = Session::new(SELF_ID);
        for op in history {
            let _ = run(&mut session, op);
        }

        let _ = session.select_room(target.clone());
        let room_after_once = session.current_room().clone();
        let list_after_once = session.room_list();

        let second = session.select_room(target);

        prop_assert!(second.is_empty());
        prop_assert_eq!(session.current_room(), &room_after_once);
        prop_assert_eq!(session.room_list(), list_after_once);
    }

    #[test]
    fn unrelated_direct_never_renders(
        peer in peer_id(),
        from in peer_id(),
        to in peer_id(),
        text in ".{0,20}",
    ) {
        prop_assume!(from != peer && to != peer);

        let mut session = Session::new(SELF_ID);
        let _ = session.select_room(Room::Direct(peer));

        prop_assert!(session.route_direct(text, from, to).is_empty());
    }

    #[test]
    fn roster_is_replaced_not_merged(
        first in roster(),
        second in roster(),
        target in room(),
    ) {
        let mut session = Session::new(SELF_ID);
        let _ = session.select_room(target.clone());
        let _ = session.apply_roster(first);
        let _ = session.apply_roster(second.clone());

        prop_assert_eq!(session.roster(), &second);
        prop_assert_eq!(session.current_room(), &target);

        let _ = session.apply_roster(Roster::new());
        prop_assert!(session.roster().is_empty());
        prop_assert_eq!(session.current_room(), &target);
        prop_assert_eq!(session.room_list().len(), 1);
    }

    #[test]
    fn blank_text_never_sends(spaces in "[ \t\r\n]{0,10}", target in room()) {
        let mut session = Session::new(SELF_ID);
        let _ = session.select_room(target);

        prop_assert!(session.compose_outbound(&spaces).is_empty());
    }

    #[test]
    fn room_list_shape_holds(ops in prop::collection::vec(op(), 0..30)) {
        let mut session = Session::new(SELF_ID);
        for op in ops {
            let _ = run(&mut session, op);
        }

        let list = session.room_list();
        prop_assert_eq!(&list[0].room, &Room::General);
        prop_assert!(list.iter().all(|e| e.room != Room::Direct(SELF_ID.into())));
        prop_assert!(list.iter().filter(|e| e.active).count() <= 1);
        prop_assert!(list.iter().filter(|e| e.active).all(|e| &e.room == session.current_room()));
    }

    #[test]
    fn rendered_messages_belong_to_current_room(ops in prop::collection::vec(op(), 0..30)) {
        let mut session = Session::new(SELF_ID);
        for op in ops {
            for effect in run(&mut session, op) {
                if let Effect::View(ViewCommand::ShowMessage(message)) = effect {
                    prop_assert_eq!(&message.room, session.current_room());
                }
            }
        }
    }
}

#[test]
fn scenario_own_broadcast_by_marker() {
    let session = Session::new(SELF_ID);
    let mut view = RecordingView::default();

    let sent = apply(&mut view, session.route_broadcast("hi there (10.0.0.1)".into(), None));

    assert!(sent.is_empty());
    assert_eq!(view.messages, [("hi there (10.0.0.1)".to_owned(), true, false)]);
}

#[test]
fn scenario_direct_from_peer_in_direct_room() {
    let mut session = Session::new(SELF_ID);
    let mut view = RecordingView::default();

    let sent = apply(&mut view, session.select_room(Room::parse_target("10.0.0.2").unwrap()));
    assert_eq!(sent.len(), 1);
    assert!(matches!(&sent[0], Outbound::JoinRoom { room_key } if room_key.as_str() == "10.0.0.1_10.0.0.2"));

    let _ = apply(&mut view, session.route_direct("hey".into(), "10.0.0.2".into(), SELF_ID.into()));

    assert_eq!(view.messages, [("hey".to_owned(), false, true)]);
}

#[test]
fn scenario_direct_while_in_general_is_dropped() {
    let session = Session::new(SELF_ID);
    let mut view = RecordingView::default();

    let _ = apply(&mut view, session.route_direct("hey".into(), "10.0.0.2".into(), SELF_ID.into()));

    assert!(view.messages.is_empty());
}

#[test]
fn scenario_roster_excludes_self() {
    let mut session = Session::new(SELF_ID);
    let mut view = RecordingView::default();

    let roster = Roster::from_pairs([("10.0.0.2", "Alice"), ("10.0.0.1", "Me")]);
    let _ = apply(&mut view, session.apply_roster(roster));

    let labels: Vec<_> = view.room_list.iter().map(|e| e.label.as_str()).collect();
    assert_eq!(labels, ["General", "Alice"]);
    assert!(view.room_list[0].active);
}

#[test]
fn switching_rooms_clears_conversation() {
    let mut session = Session::new(SELF_ID);
    let mut view = RecordingView::default();

    let _ = apply(&mut view, session.route_broadcast("first".into(), None));
    let _ = apply(&mut view, session.select_room(Room::parse_target("10.0.0.2").unwrap()));

    assert!(view.messages.is_empty());
    assert_eq!(view.conversation_clears, 1);
}

#[test]
fn compose_clears_composer_once() {
    let session = Session::new(SELF_ID);
    let mut view = RecordingView::default();

    let sent = apply(&mut view, session.compose_outbound("hello"));

    assert_eq!(sent, [Outbound::Broadcast { text: "hello".into() }]);
    assert_eq!(view.composer_clears, 1);
}
