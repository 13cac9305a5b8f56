//! Fuzz target for Frame::decode
//!
//! Arbitrary bytes must decode to a frame or a structured error, never a
//! panic. Frames that do decode re-encode to exactly the bytes they were read
//! from.

#![no_main]

use libfuzzer_sys::fuzz_target;
use parlor_proto::{Frame, FrameHeader};

fuzz_target!(|data: &[u8]| {
    let Ok(frame) = Frame::decode(data) else {
        return;
    };

    let mut encoded = Vec::new();
    frame.encode(&mut encoded).unwrap();
    assert_eq!(encoded.len(), frame.encoded_len());
    assert_eq!(encoded[FrameHeader::SIZE..], data[FrameHeader::SIZE..encoded.len()]);
});
