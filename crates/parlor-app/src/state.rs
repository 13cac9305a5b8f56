//! Observable application state types.

use parlor_core::ParticipantId;

/// Connection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected to server.
    Disconnected,
    /// Connection in progress, waiting for `Welcome`.
    Connecting,
    /// Handshake completed.
    Connected {
        /// Identity assigned by the server.
        participant_id: ParticipantId,
    },
}

impl ConnectionState {
    /// True once the handshake completed.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }
}
