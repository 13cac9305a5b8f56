//! Parlor client transport.
//!
//! Connects to a Parlor server over QUIC and exposes the connection as a pair
//! of frame channels. Protocol logic lives in `parlor-app`; this crate only
//! moves [`parlor_proto::Frame`]s.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod transport;

pub use transport::{ConnectedClient, TransportError, connect};
