//! Parlor wire protocol
//!
//! Every message on the wire is a [`Frame`]: a fixed 16-byte binary header
//! ([`FrameHeader`]) followed by a CBOR-encoded payload. The header carries the
//! [`Opcode`] that identifies the payload type, so payloads are encoded without
//! a variant tag.
//!
//! # Components
//!
//! - [`FrameHeader`]: Zero-copy header (magic, version, opcode, sizes)
//! - [`Frame`]: Header plus raw payload bytes
//! - [`Payload`]: Typed view of a frame's payload
//! - [`Opcode`]: Operation codes

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
mod frame;
mod header;
mod opcode;
pub mod payloads;

pub use errors::{ProtocolError, Result};
pub use frame::Frame;
pub use header::FrameHeader;
pub use opcode::Opcode;
pub use payloads::Payload;

/// ALPN protocol identifier negotiated over QUIC.
pub const ALPN_PROTOCOL: &[u8] = b"parlor";

/// Protocol version spoken by this crate, sent in the client `Hello`.
pub const PROTOCOL_VERSION: u8 = 1;
