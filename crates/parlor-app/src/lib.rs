//! Application layer for Parlor
//!
//! Pure state machines and a generic runtime for UI and protocol
//! orchestration. The same code runs in the terminal client and in tests.
//!
//! # Components
//!
//! - [`App`]: UI state machine (connection, session, status line)
//! - [`Bridge`]: Protocol bridge (session effects to frames, frames to events)
//! - [`Driver`]: Trait for platform-specific I/O abstraction
//! - [`Runtime`]: Generic orchestration loop using Driver

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod bridge;
mod driver;
mod event;
mod runtime;
mod state;

pub use action::AppAction;
pub use app::App;
pub use bridge::Bridge;
pub use driver::Driver;
pub use event::AppEvent;
pub use runtime::Runtime;
pub use state::ConnectionState;
