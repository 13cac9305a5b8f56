//! Terminal UI for Parlor
//!
//! A thin shell over [`parlor_app::Driver`] that provides terminal-specific
//! I/O. All orchestration logic lives in the generic [`parlor_app::Runtime`];
//! this crate handles key input, `/` commands and rendering.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod commands;
pub mod input;
pub mod terminal;
pub mod ui;
pub mod view;

pub use input::{InputState, KeyAction};
pub use parlor_app::{App, AppAction, AppEvent, Driver, Runtime};
pub use terminal::{TerminalDriver, TerminalError};
pub use view::{ChatLine, ViewState};
