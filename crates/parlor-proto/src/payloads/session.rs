//! Session management payloads.

use serde::{Deserialize, Serialize};

/// Client handshake, sent once right after the connection opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hello {
    /// Protocol version the client speaks.
    pub version: u8,
    /// Preferred display name. The server picks a default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Server handshake reply carrying the identity assigned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Welcome {
    /// Participant id derived from the client's network address.
    pub participant_id: String,
    /// Display name the server will advertise in rosters.
    pub display_name: String,
}

/// Graceful disconnect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goodbye {
    /// Optional human-readable reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
