//! Terminal driver for the TUI.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm for
//! keyboard events and ratatui for rendering. Network goes through
//! [`parlor_client`] over QUIC.

use std::io::{self, Stdout, stdout};

use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use parlor_app::{App, AppAction, AppEvent, Driver};
use parlor_client::{ConnectedClient, TransportError};
use parlor_core::{RoomListEntry, View};
use parlor_proto::Frame;
use ratatui::{Terminal, backend::CrosstermBackend};
use thiserror::Error;
use tokio::sync::mpsc::error::TryRecvError;

use crate::{ViewState, input::KeyAction, ui};

/// How long to wait for a key before ticking.
const TICK_INTERVAL: tokio::time::Duration = tokio::time::Duration::from_millis(100);

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Terminal driver implementing the [`Driver`] trait.
///
/// Owns the terminal, the connection and the [`ViewState`] that session
/// effects render into.
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_stream: EventStream,
    connection: Option<ConnectedClient>,
    view: ViewState,
}

impl TerminalDriver {
    /// Switch the terminal to raw mode and the alternate screen.
    pub fn new() -> Result<Self, TerminalError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;
        let event_stream = EventStream::new();

        Ok(Self { terminal, event_stream, connection: None, view: ViewState::new() })
    }

    fn drop_connection(&mut self, why: &str) {
        if let Some(conn) = self.connection.take() {
            tracing::info!("{}", why);
            conn.stop();
        }
    }
}

impl View for TerminalDriver {
    fn render_message(&mut self, text: &str, is_self: bool, is_private: bool) {
        self.view.render_message(text, is_self, is_private);
    }

    fn render_room_list(&mut self, rooms: &[RoomListEntry]) {
        self.view.render_room_list(rooms);
    }

    fn clear_conversation(&mut self) {
        self.view.clear_conversation();
    }

    fn clear_composer(&mut self) {
        self.view.clear_composer();
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;

    async fn poll_event(&mut self, app: &mut App) -> Result<Vec<AppAction>, Self::Error> {
        tokio::select! {
            biased;

            maybe_event = self.event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) if key_event.kind == KeyEventKind::Press => {
                        match KeyAction::from_key(key_event) {
                            Some(action) => Ok(self.view.input.apply(action, app)),
                            None => Ok(vec![]),
                        }
                    },
                    Some(Ok(Event::Resize(cols, rows))) => {
                        Ok(app.handle(AppEvent::Resize(cols, rows)))
                    },
                    Some(Err(e)) => Err(TerminalError::Io(e)),
                    _ => Ok(vec![]),
                }
            }

            () = tokio::time::sleep(TICK_INTERVAL) => {
                Ok(app.handle(AppEvent::Tick))
            }
        }
    }

    async fn send_frame(&mut self, frame: Frame) -> Result<(), Self::Error> {
        let Some(conn) = &self.connection else {
            return Ok(());
        };
        if conn.to_server.send(frame).await.is_err() {
            self.drop_connection("connection task ended while sending");
        }
        Ok(())
    }

    async fn recv_frame(&mut self) -> Option<Frame> {
        let conn = self.connection.as_mut()?;
        match conn.from_server.try_recv() {
            Ok(frame) => Some(frame),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.drop_connection("server connection closed");
                None
            },
        }
    }

    async fn connect(&mut self, addr: &str) -> Result<(), Self::Error> {
        let client = parlor_client::connect(addr).await?;
        self.connection = Some(client);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        let view = &self.view;
        self.terminal.draw(|frame| {
            ui::render(frame, app, view);
        })?;
        Ok(())
    }

    fn stop(&mut self) {
        self.drop_connection("stopping");
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        self.stop();
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}
