//! Property-based tests for App state machine.
//!
//! Invariants must hold under arbitrary interleavings of protocol events and
//! user intents.

use parlor_app::{App, AppAction, AppEvent, ConnectionState};
use parlor_core::{Outbound, ParticipantId, Room, Roster, ViewCommand};
use proptest::prelude::*;

fn participant() -> impl Strategy<Value = ParticipantId> {
    (1u8..5).prop_map(|n| ParticipantId::new(format!("10.0.0.{n}")))
}

#[derive(Debug, Clone)]
enum Input {
    Event(AppEvent),
    Select(Room),
    Submit(String),
    Next,
    Previous,
}

fn event_strategy() -> impl Strategy<Value = AppEvent> {
    prop_oneof![
        1 => Just(AppEvent::Tick),
        1 => (1u16..200, 1u16..100).prop_map(|(c, r)| AppEvent::Resize(c, r)),
        1 => Just(AppEvent::Connecting),
        2 => participant().prop_map(|participant_id| AppEvent::Welcome {
            display_name: format!("User ({participant_id})"),
            participant_id,
        }),
        1 => Just(AppEvent::Disconnected),
        2 => (".{0,12}", proptest::option::of(participant()))
            .prop_map(|(text, sender)| AppEvent::BroadcastReceived { text, sender }),
        2 => (".{0,12}", participant(), participant())
            .prop_map(|(message, from, to)| AppEvent::DirectReceived { message, from, to }),
        2 => prop::collection::vec((participant(), "[a-z]{1,6}"), 0..5)
            .prop_map(|pairs| AppEvent::RosterReceived { roster: Roster::from_pairs(pairs) }),
    ]
}

fn input_strategy() -> impl Strategy<Value = Input> {
    prop_oneof![
        4 => event_strategy().prop_map(Input::Event),
        1 => prop_oneof![Just(Room::General), participant().prop_map(Room::Direct)]
            .prop_map(Input::Select),
        1 => ".{0,12}".prop_map(Input::Submit),
        1 => Just(Input::Next),
        1 => Just(Input::Previous),
    ]
}

fn apply(app: &mut App, input: Input) -> Vec<AppAction> {
    match input {
        Input::Event(event) => app.handle(event),
        Input::Select(room) => app.select_room(room),
        Input::Submit(text) => app.submit(&text),
        Input::Next => app.next_room(),
        Input::Previous => app.previous_room(),
    }
}

proptest! {
    #[test]
    fn prop_session_exists_only_when_connected(
        inputs in prop::collection::vec(input_strategy(), 0..60)
    ) {
        let mut app = App::new("localhost:4433".into());

        for input in inputs {
            let _ = apply(&mut app, input);

            match app.connection_state() {
                ConnectionState::Connected { participant_id } => {
                    let session = app.session();
                    prop_assert!(session.is_some());
                    prop_assert_eq!(session.map(|s| s.self_id()), Some(participant_id));
                },
                ConnectionState::Disconnected => prop_assert!(app.session().is_none()),
                ConnectionState::Connecting => {},
            }
        }
    }

    #[test]
    fn prop_sends_only_while_connected(
        inputs in prop::collection::vec(input_strategy(), 0..60)
    ) {
        let mut app = App::new("localhost:4433".into());

        for input in inputs {
            let connected_before = app.session().is_some();
            let actions = apply(&mut app, input);

            if actions.iter().any(|a| matches!(a, AppAction::Send(_))) {
                prop_assert!(connected_before);
            }
        }
    }

    #[test]
    fn prop_shown_messages_match_current_room(
        inputs in prop::collection::vec(input_strategy(), 0..60)
    ) {
        let mut app = App::new("localhost:4433".into());

        for input in inputs {
            for action in apply(&mut app, input) {
                if let AppAction::View(ViewCommand::ShowMessage(message)) = action {
                    prop_assert_eq!(Some(&message.room), app.current_room());
                }
            }
        }
    }

    #[test]
    fn prop_direct_sends_target_current_peer(
        inputs in prop::collection::vec(input_strategy(), 0..60)
    ) {
        let mut app = App::new("localhost:4433".into());

        for input in inputs {
            for action in apply(&mut app, input) {
                if let AppAction::Send(Outbound::Direct { receiver, .. }) = action {
                    prop_assert_eq!(app.current_room(), Some(&Room::Direct(receiver)));
                }
            }
        }
    }
}
