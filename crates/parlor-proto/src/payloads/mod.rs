//! CBOR-encoded protocol messages.
//!
//! Frame headers are raw binary, payloads are CBOR. The opcode in the header
//! identifies the payload type, so only the inner struct is serialized.
//!
//! # Invariants
//!
//! Each payload variant maps to exactly one opcode (enforced by match
//! exhaustiveness).

pub mod chat;
pub mod session;

use bytes::BufMut;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    Frame, FrameHeader, Opcode,
    errors::{ProtocolError, Result},
};

/// All possible frame payloads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    // Session Management
    /// Client handshake
    Hello(session::Hello),
    /// Server handshake reply
    Welcome(session::Welcome),
    /// Graceful disconnect
    Goodbye(session::Goodbye),

    // Server to client
    /// General-room message
    Broadcast(chat::Broadcast),
    /// Direct message
    Direct(chat::Direct),
    /// Participant snapshot
    Roster(chat::Roster),

    // Client to server
    /// Post to the general room
    SendBroadcast(chat::SendBroadcast),
    /// Send a direct message
    SendDirect(chat::SendDirect),
    /// Enter a pairwise room
    JoinRoom(chat::JoinRoom),

    // Error frame
    /// Error response
    Error(ErrorPayload),
}

/// Error payload for error frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Error code identifying the type of error.
    pub code: u16,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorPayload {
    /// Frame was rejected by the server.
    pub const FRAME_REJECTED: u16 = 0x0001;
    /// Invalid payload format.
    pub const INVALID_PAYLOAD: u16 = 0x0002;
    /// Frame arrived before the handshake completed.
    pub const NOT_AUTHENTICATED: u16 = 0x0003;
    /// Room key is malformed or does not include the sender.
    pub const INVALID_ROOM: u16 = 0x0004;

    /// Create a frame rejection error.
    pub fn frame_rejected(reason: impl Into<String>) -> Self {
        Self { code: Self::FRAME_REJECTED, message: reason.into() }
    }

    /// Create an invalid payload error.
    pub fn invalid_payload(msg: impl Into<String>) -> Self {
        Self { code: Self::INVALID_PAYLOAD, message: msg.into() }
    }

    /// Create a handshake-required error.
    pub fn not_authenticated() -> Self {
        Self { code: Self::NOT_AUTHENTICATED, message: "send Hello first".to_string() }
    }

    /// Create an invalid room error.
    pub fn invalid_room(room: &str) -> Self {
        Self { code: Self::INVALID_ROOM, message: format!("invalid room: {room}") }
    }
}

impl Payload {
    /// Opcode corresponding to this payload type.
    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        match self {
            Self::Hello(_) => Opcode::Hello,
            Self::Welcome(_) => Opcode::Welcome,
            Self::Goodbye(_) => Opcode::Goodbye,
            Self::Broadcast(_) => Opcode::Broadcast,
            Self::Direct(_) => Opcode::Direct,
            Self::Roster(_) => Opcode::Roster,
            Self::SendBroadcast(_) => Opcode::SendBroadcast,
            Self::SendDirect(_) => Opcode::SendDirect,
            Self::JoinRoom(_) => Opcode::JoinRoom,
            Self::Error(_) => Opcode::Error,
        }
    }

    /// Encode payload to buffer
    ///
    /// Serializes only the inner struct, NOT the variant tag. Size limits are
    /// enforced later by [`Frame::encode`].
    ///
    /// # Errors
    ///
    /// - `ProtocolError::CborEncode` if serialization fails
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        let mut writer = dst.writer();

        match self {
            Self::Hello(inner) => ciborium::ser::into_writer(inner, &mut writer),
            Self::Welcome(inner) => ciborium::ser::into_writer(inner, &mut writer),
            Self::Goodbye(inner) => ciborium::ser::into_writer(inner, &mut writer),
            Self::Broadcast(inner) => ciborium::ser::into_writer(inner, &mut writer),
            Self::Direct(inner) => ciborium::ser::into_writer(inner, &mut writer),
            Self::Roster(inner) => ciborium::ser::into_writer(inner, &mut writer),
            Self::SendBroadcast(inner) => ciborium::ser::into_writer(inner, &mut writer),
            Self::SendDirect(inner) => ciborium::ser::into_writer(inner, &mut writer),
            Self::JoinRoom(inner) => ciborium::ser::into_writer(inner, &mut writer),
            Self::Error(inner) => ciborium::ser::into_writer(inner, &mut writer),
        }
        .map_err(|e| ProtocolError::CborEncode(e.to_string()))
    }

    /// Decode payload from bytes based on opcode
    ///
    /// The size check runs before CBOR parsing so oversized input never
    /// reaches the decoder.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PayloadTooLarge` if bytes exceed `MAX_PAYLOAD_SIZE`
    /// - `ProtocolError::CborDecode` if CBOR deserialization fails
    pub fn decode(opcode: Opcode, bytes: &[u8]) -> Result<Self> {
        if bytes.len() > FrameHeader::MAX_PAYLOAD_SIZE as usize {
            return Err(ProtocolError::PayloadTooLarge {
                size: bytes.len(),
                max: FrameHeader::MAX_PAYLOAD_SIZE as usize,
            });
        }

        let payload = match opcode {
            Opcode::Hello => Self::Hello(from_cbor(bytes)?),
            Opcode::Welcome => Self::Welcome(from_cbor(bytes)?),
            Opcode::Goodbye => Self::Goodbye(from_cbor(bytes)?),
            Opcode::Broadcast => Self::Broadcast(from_cbor(bytes)?),
            Opcode::Direct => Self::Direct(from_cbor(bytes)?),
            Opcode::Roster => Self::Roster(from_cbor(bytes)?),
            Opcode::SendBroadcast => Self::SendBroadcast(from_cbor(bytes)?),
            Opcode::SendDirect => Self::SendDirect(from_cbor(bytes)?),
            Opcode::JoinRoom => Self::JoinRoom(from_cbor(bytes)?),
            Opcode::Error => Self::Error(from_cbor(bytes)?),
        };

        Ok(payload)
    }

    /// Convert payload into a transport frame
    ///
    /// Encodes the payload, stamps the opcode into `header` and sets the
    /// payload size.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::CborEncode` if serialization fails
    pub fn into_frame(self, mut header: FrameHeader) -> Result<Frame> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        header.opcode = self.opcode().to_u16().to_be_bytes();
        Ok(Frame::new(header, buf))
    }

    /// Convert payload into a frame with a fresh header.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::CborEncode` if serialization fails
    pub fn to_frame(&self) -> Result<Frame> {
        self.clone().into_frame(FrameHeader::new(self.opcode()))
    }

    /// Parse payload from a raw transport frame
    ///
    /// # Errors
    ///
    /// - `ProtocolError::UnknownOpcode` if the header opcode is unrecognized
    /// - `ProtocolError::CborDecode` if CBOR deserialization fails
    /// - `ProtocolError::PayloadTooLarge` if payload exceeds maximum size
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        let opcode = frame
            .header
            .opcode_enum()
            .ok_or(ProtocolError::UnknownOpcode(frame.header.opcode()))?;
        Self::decode(opcode, &frame.payload)
    }
}

fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    ciborium::de::from_reader(bytes).map_err(|e| ProtocolError::CborDecode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(payload: Payload) {
        let frame = payload.to_frame().expect("should create frame");
        assert_eq!(frame.header.opcode_enum(), Some(payload.opcode()));

        let decoded = Payload::from_frame(&frame).expect("should parse payload");
        assert_eq!(payload, decoded);
    }

    #[test]
    fn direct_round_trip() {
        round_trip(Payload::Direct(chat::Direct {
            message: "hey".to_string(),
            from: "10.0.0.2".to_string(),
            to: "10.0.0.1".to_string(),
        }));
    }

    #[test]
    fn broadcast_without_sender_round_trip() {
        round_trip(Payload::Broadcast(chat::Broadcast {
            text: "(10.0.0.1) says: hi".to_string(),
            sender: None,
        }));
    }

    #[test]
    fn error_round_trip() {
        round_trip(Payload::Error(ErrorPayload::invalid_room("nope")));
    }

    #[test]
    fn roster_encodes_as_positional_pairs() {
        let roster = chat::Roster {
            entries: vec![("10.0.0.2".to_string(), "Alice".to_string())],
        };
        let mut buf = Vec::new();
        Payload::Roster(roster).encode(&mut buf).unwrap();

        let value: ciborium::Value = ciborium::de::from_reader(buf.as_slice()).unwrap();
        let expected = ciborium::Value::Array(vec![ciborium::Value::Array(vec![
            ciborium::Value::Text("10.0.0.2".to_string()),
            ciborium::Value::Text("Alice".to_string()),
        ])]);
        assert_eq!(value, expected);
    }

    #[test]
    fn send_broadcast_encodes_as_plain_string() {
        let mut buf = Vec::new();
        Payload::SendBroadcast(chat::SendBroadcast { text: "hello".to_string() })
            .encode(&mut buf)
            .unwrap();

        let value: ciborium::Value = ciborium::de::from_reader(buf.as_slice()).unwrap();
        assert_eq!(value, ciborium::Value::Text("hello".to_string()));
    }

    #[test]
    fn opcode_payload_mismatch_is_decode_error() {
        let frame = Payload::SendBroadcast(chat::SendBroadcast { text: "x".to_string() })
            .to_frame()
            .unwrap();

        let result = Payload::decode(Opcode::Direct, &frame.payload);
        assert!(matches!(result, Err(ProtocolError::CborDecode(_))));
    }

    #[test]
    fn unknown_opcode_is_rejected() {
        let mut bytes = FrameHeader::new(Opcode::Hello).to_bytes();
        bytes[6..8].copy_from_slice(&0x4242u16.to_be_bytes());
        let frame = Frame::decode(&bytes).unwrap();

        assert_eq!(Payload::from_frame(&frame), Err(ProtocolError::UnknownOpcode(0x4242)));
    }
}
