//! Fuzz target for Payload::from_frame
//!
//! Every opcode is tried against the same bytes so malformed CBOR and type
//! confusion both get exercised. Decoding must never panic.

#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use parlor_proto::{Frame, FrameHeader, Opcode, Payload};

fuzz_target!(|data: &[u8]| {
    for opcode in Opcode::ALL {
        let frame = Frame::new(FrameHeader::new(opcode), Bytes::copy_from_slice(data));

        if let Ok(payload) = Payload::from_frame(&frame) {
            assert_eq!(payload.opcode(), opcode);
        }
    }
});
