//! Application input events.
//!
//! Events originate from two sources: the terminal (resize, ticks) and
//! protocol notifications translated by the [`crate::Bridge`].

use parlor_core::{ParticipantId, Roster};

/// Events processed by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Periodic tick.
    Tick,

    /// Terminal resize (columns, rows).
    Resize(u16, u16),

    /// Connection in progress.
    Connecting,

    /// Handshake completed.
    Welcome {
        /// Identity assigned by the server.
        participant_id: ParticipantId,
        /// Name the server advertises for us.
        display_name: String,
    },

    /// Connection lost or closed by the server.
    Disconnected,

    /// General-room message.
    BroadcastReceived {
        /// Display-ready text.
        text: String,
        /// Author, when the server supplied one.
        sender: Option<ParticipantId>,
    },

    /// Direct message, including copies of our own.
    DirectReceived {
        /// Display-ready text.
        message: String,
        /// Author.
        from: ParticipantId,
        /// Recipient.
        to: ParticipantId,
    },

    /// New participant snapshot.
    RosterReceived {
        /// Participants in server order.
        roster: Roster,
    },

    /// Error occurred.
    Error {
        /// Error description.
        message: String,
    },
}
