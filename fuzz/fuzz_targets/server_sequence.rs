//! Fuzz target for the server driver
//!
//! Feeds a `ServerDriver` arbitrary connection lifecycles and frames, both
//! well-formed payloads and raw bytes.
//!
//! # Invariants
//!
//! - The driver never panics and never reports an internal error for client
//!   input on a known session
//! - Frames are only ever addressed to live sessions
//! - Every outgoing frame decodes as a server-to-client payload
//! - The roster holds exactly the participants with a live authenticated
//!   session

#![no_main]

use std::{
    collections::BTreeSet,
    net::{IpAddr, Ipv4Addr, SocketAddr},
};

use arbitrary::Arbitrary;
use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use parlor_proto::{
    Frame, FrameHeader, Opcode, Payload,
    payloads::{
        chat::{JoinRoom, SendBroadcast, SendDirect},
        session::{Goodbye, Hello},
    },
};
use parlor_server::{DriverConfig, ServerAction, ServerDriver, ServerEvent, SystemEnv};

#[derive(Debug, Clone, Arbitrary)]
struct Scenario {
    id_with_port: bool,
    steps: Vec<Step>,
}

#[derive(Debug, Clone, Arbitrary)]
enum Step {
    Connect { session: u8, host: u8, port: u16 },
    Close { session: u8 },
    Hello { session: u8, name: Option<String> },
    Goodbye { session: u8 },
    Broadcast { session: u8, text: String },
    Direct { session: u8, host: u8, text: String },
    JoinRoom { session: u8, key: String },
    Raw { session: u8, opcode: u16, payload: Vec<u8> },
}

fn host(idx: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(10, 0, 0, idx % 4))
}

fn frame(payload: &Payload) -> Frame {
    payload.to_frame().unwrap()
}

fn received(session: u8, frame: Frame) -> ServerEvent {
    ServerEvent::FrameReceived { session_id: u64::from(session), frame }
}

fn raw_frame(opcode: u16, payload: Vec<u8>) -> Option<Frame> {
    let opcode = Opcode::from_u16(opcode)?;
    Some(Frame::new(FrameHeader::new(opcode), Bytes::from(payload)))
}

fuzz_target!(|scenario: Scenario| {
    let config = DriverConfig { id_with_port: scenario.id_with_port, ..DriverConfig::default() };
    let mut driver = ServerDriver::new(SystemEnv::new(), config);
    let mut live: BTreeSet<u64> = BTreeSet::new();

    for step in scenario.steps {
        let event = match step {
            Step::Connect { session, host: h, port } => ServerEvent::ConnectionAccepted {
                session_id: u64::from(session),
                addr: SocketAddr::new(host(h), port),
            },
            Step::Close { session } => ServerEvent::ConnectionClosed {
                session_id: u64::from(session),
                reason: "fuzz".into(),
            },
            Step::Hello { session, name } => {
                received(session, frame(&Payload::Hello(Hello { version: 1, display_name: name })))
            },
            Step::Goodbye { session } => {
                received(session, frame(&Payload::Goodbye(Goodbye { reason: None })))
            },
            Step::Broadcast { session, text } => {
                received(session, frame(&Payload::SendBroadcast(SendBroadcast { text })))
            },
            Step::Direct { session, host: h, text } => received(
                session,
                frame(&Payload::SendDirect(SendDirect { message: text, receiver: host(h).to_string() })),
            ),
            Step::JoinRoom { session, key } => {
                received(session, frame(&Payload::JoinRoom(JoinRoom { room: key })))
            },
            Step::Raw { session, opcode, payload } => match raw_frame(opcode, payload) {
                Some(frame) => received(session, frame),
                None => continue,
            },
        };

        let known = match &event {
            ServerEvent::ConnectionAccepted { session_id, .. }
            | ServerEvent::FrameReceived { session_id, .. }
            | ServerEvent::ConnectionClosed { session_id, .. } => live.contains(session_id),
        };

        let result = driver.process_event(event.clone());
        let Ok(actions) = result else {
            // Unknown sessions and duplicate accepts are the only driver errors.
            assert!(!known || matches!(event, ServerEvent::ConnectionAccepted { .. }));
            continue;
        };

        match &event {
            ServerEvent::ConnectionAccepted { session_id, .. } => {
                live.insert(*session_id);
            },
            ServerEvent::ConnectionClosed { session_id, .. } => {
                live.remove(session_id);
            },
            ServerEvent::FrameReceived { .. } => {},
        }

        for action in &actions {
            if let ServerAction::SendToSession { session_id, frame } = action {
                assert!(live.contains(session_id));
                let payload = Payload::from_frame(frame).unwrap();
                assert!(!payload.opcode().is_client_request());
            }
        }

        let roster: BTreeSet<_> = driver.registry().roster().iter().map(|e| e.id.clone()).collect();
        let online: BTreeSet<_> = live
            .iter()
            .filter_map(|session_id| driver.registry().participant(*session_id).cloned())
            .collect();
        assert_eq!(roster, online);
    }
});
