//! Operation codes.
//!
//! Opcodes are grouped by range: `0x00xx` session management, `0x01xx`
//! server-to-client chat events, `0x02xx` client-to-server chat requests and
//! `0xFFxx` errors.

/// Frame operation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Opcode {
    /// Client handshake.
    Hello = 0x0001,
    /// Server handshake reply carrying the assigned participant id.
    Welcome = 0x0002,
    /// Graceful disconnect.
    Goodbye = 0x0003,

    /// Message in the general room.
    Broadcast = 0x0101,
    /// Message between two participants.
    Direct = 0x0102,
    /// Snapshot of connected participants.
    Roster = 0x0103,

    /// Request to post in the general room.
    SendBroadcast = 0x0201,
    /// Request to send a direct message.
    SendDirect = 0x0202,
    /// Notice that the client entered a pairwise room.
    JoinRoom = 0x0203,

    /// Error response.
    Error = 0xFF00,
}

impl Opcode {
    /// Every opcode, in wire order.
    pub const ALL: [Self; 10] = [
        Self::Hello,
        Self::Welcome,
        Self::Goodbye,
        Self::Broadcast,
        Self::Direct,
        Self::Roster,
        Self::SendBroadcast,
        Self::SendDirect,
        Self::JoinRoom,
        Self::Error,
    ];

    /// Raw wire value.
    #[must_use]
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Parse a raw wire value. `None` if unrecognized.
    #[must_use]
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0001 => Some(Self::Hello),
            0x0002 => Some(Self::Welcome),
            0x0003 => Some(Self::Goodbye),
            0x0101 => Some(Self::Broadcast),
            0x0102 => Some(Self::Direct),
            0x0103 => Some(Self::Roster),
            0x0201 => Some(Self::SendBroadcast),
            0x0202 => Some(Self::SendDirect),
            0x0203 => Some(Self::JoinRoom),
            0xFF00 => Some(Self::Error),
            _ => None,
        }
    }

    /// Sent by clients only.
    #[must_use]
    pub const fn is_client_request(self) -> bool {
        matches!(
            self,
            Self::Hello | Self::Goodbye | Self::SendBroadcast | Self::SendDirect | Self::JoinRoom
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_wire_values_round_trip() {
        for opcode in Opcode::ALL {
            assert_eq!(Opcode::from_u16(opcode.to_u16()), Some(opcode));
        }
    }

    #[test]
    fn unknown_opcode_is_none() {
        assert_eq!(Opcode::from_u16(0x0000), None);
        assert_eq!(Opcode::from_u16(0x0104), None);
        assert_eq!(Opcode::from_u16(0xFFFF), None);
    }

    #[test]
    fn client_requests_are_classified() {
        assert!(Opcode::SendDirect.is_client_request());
        assert!(Opcode::Hello.is_client_request());
        assert!(!Opcode::Broadcast.is_client_request());
        assert!(!Opcode::Welcome.is_client_request());
    }
}
