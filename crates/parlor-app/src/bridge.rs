//! Protocol-to-Application translation layer.
//!
//! # Responsibilities
//!
//! - Converts session [`Outbound`] requests into protocol frames.
//! - Accumulates outgoing [`Frame`]s to be sent by the driver in the next I/O
//!   cycle.
//! - Interprets frames from the server and converts them into
//!   [`crate::AppEvent`]s.

use parlor_core::{Outbound, ParticipantId, Roster};
use parlor_proto::{
    Frame, PROTOCOL_VERSION, Payload,
    payloads::{
        chat::{JoinRoom, SendBroadcast, SendDirect},
        session::Hello,
    },
};

use crate::AppEvent;

/// Bridge between App and the wire protocol.
#[derive(Debug, Default)]
pub struct Bridge {
    outgoing: Vec<Frame>,
    next_request_id: u32,
}

impl Bridge {
    /// Create a new Bridge with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the handshake frame.
    pub fn hello(&mut self, display_name: Option<String>) -> Vec<AppEvent> {
        self.queue(Payload::Hello(Hello { version: PROTOCOL_VERSION, display_name }))
    }

    /// Translate an outbound request into a queued frame.
    ///
    /// Returns an error event if the frame cannot be built.
    pub fn process_outbound(&mut self, outbound: Outbound) -> Vec<AppEvent> {
        let payload = match outbound {
            Outbound::Broadcast { text } => Payload::SendBroadcast(SendBroadcast { text }),
            Outbound::Direct { text, receiver } => {
                Payload::SendDirect(SendDirect { message: text, receiver: receiver.into() })
            },
            Outbound::JoinRoom { room_key } => {
                Payload::JoinRoom(JoinRoom { room: room_key.as_str().to_owned() })
            },
        };
        self.queue(payload)
    }

    /// Handle a frame from the server.
    pub fn handle_frame(&mut self, frame: &Frame) -> Vec<AppEvent> {
        let payload = match Payload::from_frame(frame) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed frame");
                return vec![AppEvent::Error { message: format!("malformed frame: {e}") }];
            },
        };

        let opcode = payload.opcode();
        match payload {
            Payload::Welcome(welcome) => vec![AppEvent::Welcome {
                participant_id: ParticipantId::from(welcome.participant_id),
                display_name: welcome.display_name,
            }],
            Payload::Broadcast(broadcast) => vec![AppEvent::BroadcastReceived {
                text: broadcast.text,
                sender: broadcast.sender.map(ParticipantId::from),
            }],
            Payload::Direct(direct) => vec![AppEvent::DirectReceived {
                message: direct.message,
                from: ParticipantId::from(direct.from),
                to: ParticipantId::from(direct.to),
            }],
            Payload::Roster(roster) => {
                vec![AppEvent::RosterReceived { roster: Roster::from_pairs(roster.entries) }]
            },
            Payload::Goodbye(goodbye) => {
                tracing::info!(reason = ?goodbye.reason, "server said goodbye");
                vec![AppEvent::Disconnected]
            },
            Payload::Error(error) => vec![AppEvent::Error {
                message: format!("server error {:#06x}: {}", error.code, error.message),
            }],
            Payload::Hello(_)
            | Payload::SendBroadcast(_)
            | Payload::SendDirect(_)
            | Payload::JoinRoom(_) => {
                tracing::warn!(?opcode, "unexpected client opcode from server");
                vec![]
            },
        }
    }

    /// Take pending outgoing frames.
    pub fn take_outgoing(&mut self) -> Vec<Frame> {
        std::mem::take(&mut self.outgoing)
    }

    fn queue(&mut self, payload: Payload) -> Vec<AppEvent> {
        match payload.to_frame() {
            Ok(mut frame) => {
                self.next_request_id = self.next_request_id.wrapping_add(1);
                frame.header.set_request_id(self.next_request_id);
                self.outgoing.push(frame);
                vec![]
            },
            Err(e) => vec![AppEvent::Error { message: e.to_string() }],
        }
    }
}

#[cfg(test)]
mod tests {
    use parlor_core::RoomKey;
    use parlor_proto::{
        FrameHeader, Opcode,
        payloads::{ErrorPayload, chat::Broadcast, session::Welcome},
    };

    use super::*;

    #[test]
    fn outbound_broadcast_becomes_send_broadcast() {
        let mut bridge = Bridge::new();
        let events = bridge.process_outbound(Outbound::Broadcast { text: "hi".into() });
        assert!(events.is_empty());

        let frames = bridge.take_outgoing();
        assert_eq!(frames.len(), 1);
        assert_eq!(
            Payload::from_frame(&frames[0]).unwrap(),
            Payload::SendBroadcast(SendBroadcast { text: "hi".into() })
        );
        assert!(bridge.take_outgoing().is_empty());
    }

    #[test]
    fn outbound_join_carries_room_key() {
        let mut bridge = Bridge::new();
        let room_key = RoomKey::pairwise(&"10.0.0.2".into(), &"10.0.0.1".into());
        let _ = bridge.process_outbound(Outbound::JoinRoom { room_key });

        let frames = bridge.take_outgoing();
        assert_eq!(
            Payload::from_frame(&frames[0]).unwrap(),
            Payload::JoinRoom(JoinRoom { room: "10.0.0.1_10.0.0.2".into() })
        );
    }

    #[test]
    fn request_ids_increase() {
        let mut bridge = Bridge::new();
        let _ = bridge.hello(None);
        let _ = bridge.process_outbound(Outbound::Broadcast { text: "a".into() });

        let ids: Vec<_> = bridge.take_outgoing().iter().map(|f| f.header.request_id()).collect();
        assert_eq!(ids, [1, 2]);
    }

    #[test]
    fn welcome_frame_becomes_event() {
        let mut bridge = Bridge::new();
        let frame = Payload::Welcome(Welcome {
            participant_id: "10.0.0.1".into(),
            display_name: "Me".into(),
        })
        .to_frame()
        .unwrap();

        assert_eq!(bridge.handle_frame(&frame), vec![AppEvent::Welcome {
            participant_id: "10.0.0.1".into(),
            display_name: "Me".into()
        }]);
    }

    #[test]
    fn broadcast_sender_is_carried() {
        let mut bridge = Bridge::new();
        let frame = Payload::Broadcast(Broadcast {
            text: "(10.0.0.2) says: yo".into(),
            sender: Some("10.0.0.2".into()),
        })
        .to_frame()
        .unwrap();

        assert!(matches!(
            bridge.handle_frame(&frame).as_slice(),
            [AppEvent::BroadcastReceived { sender: Some(sender), .. }] if sender.as_str() == "10.0.0.2"
        ));
    }

    #[test]
    fn server_error_becomes_error_event() {
        let mut bridge = Bridge::new();
        let frame = Payload::Error(ErrorPayload::invalid_room("x")).to_frame().unwrap();

        assert!(matches!(bridge.handle_frame(&frame).as_slice(), [AppEvent::Error { .. }]));
    }

    #[test]
    fn malformed_frame_becomes_error_event() {
        let mut bridge = Bridge::new();
        let frame = Frame::new(FrameHeader::new(Opcode::Direct), vec![0xFF, 0x00]);

        assert!(matches!(bridge.handle_frame(&frame).as_slice(), [AppEvent::Error { .. }]));
    }

    #[test]
    fn client_opcode_from_server_is_ignored() {
        let mut bridge = Bridge::new();
        let frame =
            Payload::SendBroadcast(SendBroadcast { text: "x".into() }).to_frame().unwrap();

        assert!(bridge.handle_frame(&frame).is_empty());
    }
}
