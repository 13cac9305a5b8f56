//! Fuzz target for frame header boundary conditions
//!
//! # Strategy
//!
//! - Magic bytes: valid, off-by-one, all-zeros, random
//! - Version: valid, zero, random
//! - Payload size: zero, small, at-max, just-over-max, u32::MAX
//! - Buffer: complete or truncated by a few bytes
//!
//! # Invariants
//!
//! - Bad magic MUST return `ProtocolError::InvalidMagic`
//! - Unknown version MUST return `ProtocolError::UnsupportedVersion`
//! - `payload_size > MAX_PAYLOAD_SIZE` MUST return
//!   `ProtocolError::PayloadTooLarge`
//! - A short payload MUST return `ProtocolError::FrameTruncated`
//! - Accepted frames have `encoded_len == 16 + payload_size`

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use parlor_proto::{Frame, FrameHeader, ProtocolError};

#[derive(Debug, Clone, Arbitrary)]
struct BoundaryFrame {
    magic: MagicBytes,
    version: VersionByte,
    opcode: u16,
    request_id: u32,
    payload_size: PayloadSize,
    truncate_by: u8,
}

#[derive(Debug, Clone, Arbitrary)]
enum MagicBytes {
    Valid,
    OffByOne(u8),
    AllZeros,
    Random([u8; 4]),
}

#[derive(Debug, Clone, Arbitrary)]
enum VersionByte {
    Valid,
    Zero,
    Random(u8),
}

#[derive(Debug, Clone, Arbitrary)]
enum PayloadSize {
    Zero,
    Small(u8),
    AtMax,
    JustOverMax,
    MaxU32,
}

fuzz_target!(|boundary: BoundaryFrame| {
    let payload_size = match boundary.payload_size {
        PayloadSize::Zero => 0,
        PayloadSize::Small(s) => u32::from(s),
        PayloadSize::AtMax => FrameHeader::MAX_PAYLOAD_SIZE,
        PayloadSize::JustOverMax => FrameHeader::MAX_PAYLOAD_SIZE + 1,
        PayloadSize::MaxU32 => u32::MAX,
    };

    let body_len = payload_size.min(FrameHeader::MAX_PAYLOAD_SIZE) as usize;
    let mut buffer = vec![0u8; FrameHeader::SIZE + body_len];

    let magic = match boundary.magic {
        MagicBytes::Valid => FrameHeader::MAGIC.to_be_bytes(),
        MagicBytes::OffByOne(idx) => {
            let mut bytes = FrameHeader::MAGIC.to_be_bytes();
            let idx = usize::from(idx % 4);
            bytes[idx] = bytes[idx].wrapping_add(1);
            bytes
        },
        MagicBytes::AllZeros => [0; 4],
        MagicBytes::Random(bytes) => bytes,
    };
    buffer[0..4].copy_from_slice(&magic);

    let version = match boundary.version {
        VersionByte::Valid => FrameHeader::VERSION,
        VersionByte::Zero => 0,
        VersionByte::Random(v) => v,
    };
    buffer[4] = version;
    buffer[6..8].copy_from_slice(&boundary.opcode.to_be_bytes());
    buffer[8..12].copy_from_slice(&boundary.request_id.to_be_bytes());
    buffer[12..16].copy_from_slice(&payload_size.to_be_bytes());

    let truncate = usize::from(boundary.truncate_by).min(body_len);
    buffer.truncate(buffer.len() - truncate);

    let result = Frame::decode(&buffer);

    if u32::from_be_bytes(magic) != FrameHeader::MAGIC {
        assert!(matches!(result, Err(ProtocolError::InvalidMagic)));
    } else if version != FrameHeader::VERSION {
        assert!(matches!(result, Err(ProtocolError::UnsupportedVersion(v)) if v == version));
    } else if payload_size > FrameHeader::MAX_PAYLOAD_SIZE {
        assert!(matches!(result, Err(ProtocolError::PayloadTooLarge { .. })));
    } else if truncate > 0 {
        assert!(matches!(result, Err(ProtocolError::FrameTruncated { .. })));
    } else {
        let frame = result.unwrap();
        assert_eq!(frame.encoded_len(), FrameHeader::SIZE + payload_size as usize);
        assert_eq!(frame.header.request_id(), boundary.request_id);
    }
});
