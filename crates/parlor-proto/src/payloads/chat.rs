//! Chat payloads.
//!
//! Server-to-client events (`Broadcast`, `Direct`, `Roster`) and
//! client-to-server requests (`SendBroadcast`, `SendDirect`, `JoinRoom`).

use serde::{Deserialize, Serialize};

/// A message in the general room, already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Broadcast {
    /// Display-ready text. By convention it embeds `(<sender id>)`.
    pub text: String,
    /// Structured sender id. Older servers omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
}

/// A message between two participants, delivered to both of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Direct {
    /// Display-ready text.
    pub message: String,
    /// Participant id of the author.
    pub from: String,
    /// Participant id of the recipient.
    pub to: String,
}

/// Snapshot of every connected participant.
///
/// Encoded as a CBOR array of `[id, display_name]` pairs, in join order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    /// `(participant id, display name)` pairs.
    pub entries: Vec<(String, String)>,
}

/// Request to post in the general room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SendBroadcast {
    /// Raw message text.
    pub text: String,
}

/// Request to send a direct message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendDirect {
    /// Raw message text.
    pub message: String,
    /// Participant id of the recipient.
    pub receiver: String,
}

/// Notice that the client entered a pairwise room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRoom {
    /// Canonical pairwise room key (`<a>_<b>`, ids sorted).
    pub room: String,
}
