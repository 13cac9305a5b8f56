//! Property-based tests for frame and payload encoding
//!
//! Generates arbitrary frames and chat payloads and checks that the wire
//! format is lossless and that decoding never panics on garbage.

use bytes::Bytes;
use parlor_proto::{
    Frame, FrameHeader, Opcode, Payload, ProtocolError,
    payloads::{
        ErrorPayload,
        chat::{Broadcast, Direct, JoinRoom, Roster, SendBroadcast, SendDirect},
        session::{Goodbye, Hello, Welcome},
    },
};
use proptest::prelude::*;

fn arbitrary_opcode() -> impl Strategy<Value = Opcode> {
    prop::sample::select(Opcode::ALL.to_vec())
}

fn arbitrary_frame() -> impl Strategy<Value = Frame> {
    (arbitrary_opcode(), any::<u32>(), prop::collection::vec(any::<u8>(), 0..1024)).prop_map(
        |(opcode, request_id, payload)| {
            let mut header = FrameHeader::new(opcode);
            header.set_request_id(request_id);
            Frame::new(header, Bytes::from(payload))
        },
    )
}

fn participant_id() -> impl Strategy<Value = String> {
    "[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}"
}

fn arbitrary_payload() -> impl Strategy<Value = Payload> {
    prop_oneof![
        (any::<u8>(), proptest::option::of(".{0,16}"))
            .prop_map(|(version, display_name)| Payload::Hello(Hello { version, display_name })),
        (participant_id(), ".{0,16}").prop_map(|(participant_id, display_name)| {
            Payload::Welcome(Welcome { participant_id, display_name })
        }),
        proptest::option::of(".{0,16}").prop_map(|reason| Payload::Goodbye(Goodbye { reason })),
        (".{0,64}", proptest::option::of(participant_id()))
            .prop_map(|(text, sender)| Payload::Broadcast(Broadcast { text, sender })),
        (".{0,64}", participant_id(), participant_id())
            .prop_map(|(message, from, to)| Payload::Direct(Direct { message, from, to })),
        prop::collection::vec((participant_id(), ".{0,16}"), 0..8)
            .prop_map(|entries| Payload::Roster(Roster { entries })),
        ".{0,64}".prop_map(|text| Payload::SendBroadcast(SendBroadcast { text })),
        (".{0,64}", participant_id()).prop_map(|(message, receiver)| {
            Payload::SendDirect(SendDirect { message, receiver })
        }),
        (participant_id(), participant_id())
            .prop_map(|(a, b)| Payload::JoinRoom(JoinRoom { room: format!("{a}_{b}") })),
        (any::<u16>(), ".{0,32}")
            .prop_map(|(code, message)| Payload::Error(ErrorPayload { code, message })),
    ]
}

proptest! {
    #[test]
    fn frame_wire_format_is_lossless(frame in arbitrary_frame()) {
        let mut buf = Vec::new();
        frame.encode(&mut buf).unwrap();

        prop_assert_eq!(buf.len(), FrameHeader::SIZE + frame.payload.len());

        let decoded = Frame::decode(&buf).unwrap();
        prop_assert_eq!(decoded.header.request_id(), frame.header.request_id());
        prop_assert_eq!(decoded, frame);
    }

    #[test]
    fn payload_survives_framing(payload in arbitrary_payload()) {
        let frame = payload.to_frame().unwrap();

        let mut buf = Vec::new();
        frame.encode(&mut buf).unwrap();
        let decoded = Payload::from_frame(&Frame::decode(&buf).unwrap()).unwrap();

        prop_assert_eq!(decoded, payload);
    }

    #[test]
    fn decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        if let Ok(frame) = Frame::decode(&bytes) {
            let _ = Payload::from_frame(&frame);
        }
    }

    #[test]
    fn truncation_is_always_detected(frame in arbitrary_frame(), cut in 1usize..64) {
        prop_assume!(!frame.payload.is_empty());

        let mut buf = Vec::new();
        frame.encode(&mut buf).unwrap();
        let cut = cut.min(frame.payload.len());
        buf.truncate(buf.len() - cut);

        let is_truncated = matches!(Frame::decode(&buf), Err(ProtocolError::FrameTruncated { .. }));
        prop_assert!(is_truncated);
    }
}
