//! Parlor core
//!
//! Sans-IO chat session state machine. A [`Session`] tracks which room the
//! local participant is viewing, keeps the latest [`Roster`] and routes inbound
//! chat events against that state. Every operation returns a list of
//! [`Effect`]s describing what the caller must send or render; nothing here
//! touches the network or the terminal.
//!
//! # Components
//!
//! - [`Session`]: room selection, roster replacement, outbound composition
//! - [`Room`] / [`RoomKey`]: the general room and pairwise direct rooms
//! - [`Effect`]: sends and view commands produced by the session
//! - [`View`]: render collaborator contract
//! - [`Environment`]: wall clock and randomness for drivers

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod effect;
pub mod env;
mod id;
mod room;
mod roster;
mod router;
mod session;
mod view;

pub use effect::{Effect, InboundMessage, Outbound, ViewCommand};
pub use env::Environment;
pub use id::ParticipantId;
pub use room::{Room, RoomKey, RoomKeyError, TargetError};
pub use roster::{Roster, RosterEntry};
pub use session::Session;
pub use view::{RoomListEntry, View};
