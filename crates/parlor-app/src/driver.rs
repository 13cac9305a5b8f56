//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::future::Future;

use parlor_core::View;
use parlor_proto::Frame;

use crate::{App, AppAction};

/// Abstracts I/O operations for the application runtime.
///
/// A driver is also the [`View`] that session effects render into, so the
/// runtime can apply view commands directly.
///
/// # Implementations
///
/// - **TUI**: crossterm for terminal events, quinn for QUIC transport
/// - **Tests**: scripted input and in-memory frame queues
pub trait Driver: View + Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Poll for the next input and translate it through `app`.
    ///
    /// Returns the resulting actions, empty if nothing happened.
    fn poll_event(
        &mut self,
        app: &mut App,
    ) -> impl Future<Output = Result<Vec<AppAction>, Self::Error>> + Send;

    /// Send a frame to the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is closed or send fails.
    fn send_frame(&mut self, frame: Frame) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receive a frame from the server.
    ///
    /// Returns a frame if one is ready, `None` otherwise. Must not block.
    fn recv_frame(&mut self) -> impl Future<Output = Option<Frame>> + Send;

    /// Establish connection to the server.
    ///
    /// # Errors
    ///
    /// Returns an error if connection cannot be established.
    fn connect(&mut self, addr: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Check if connected to server.
    fn is_connected(&self) -> bool;

    /// Render the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, app: &App) -> Result<(), Self::Error>;

    /// Stop the connection and clean up resources.
    fn stop(&mut self);
}
