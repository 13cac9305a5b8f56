//! Application side-effects and intents.
//!
//! This module defines the [`AppAction`] enum, which represents instructions
//! produced by the [`crate::App`] state machine for the runtime to execute.

use parlor_core::{Effect, Outbound, ViewCommand};

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Connect to server.
    Connect {
        /// Server address (host:port).
        server_addr: String,
    },

    /// Hand a request to the protocol bridge.
    Send(Outbound),

    /// Update the view.
    View(ViewCommand),
}

impl From<Effect> for AppAction {
    fn from(effect: Effect) -> Self {
        match effect {
            Effect::Send(outbound) => Self::Send(outbound),
            Effect::View(command) => Self::View(command),
        }
    }
}
