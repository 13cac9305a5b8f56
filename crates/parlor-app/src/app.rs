//! Application state machine.
//!
//! This module defines the [`App`] state machine, which manages the interactive
//! state of the application completely decoupled from I/O and protocol
//! mechanics.
//!
//! This is a pure state machine: it consumes [`crate::AppEvent`] inputs and
//! produces [`crate::AppAction`] instructions for the runtime to execute.
//!
//! # Responsibilities
//!
//! - Owns the chat [`Session`] once the server has assigned an identity.
//! - Stores terminal dimensions to handle resize events.
//! - Tracks high-level connection state and a status line for UI feedback.

use parlor_core::{Effect, Room, Session, ViewCommand};

use crate::{AppAction, AppEvent, ConnectionState};

/// Application state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable without a terminal or network.
#[derive(Debug, Clone)]
pub struct App {
    /// Connection state.
    state: ConnectionState,
    /// Server address for connection.
    server_addr: String,
    /// Preferred display name sent in `Hello`. `None` lets the server choose.
    display_name: Option<String>,
    /// Chat session. `None` until the handshake completes.
    session: Option<Session>,
    /// Terminal dimensions (columns, rows).
    terminal_size: (u16, u16),
    /// Transient status message. `None` if no message.
    status_message: Option<String>,
}

impl App {
    /// Create a new App with the given server address.
    pub fn new(server_addr: String) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            server_addr,
            display_name: None,
            session: None,
            terminal_size: (80, 24),
            status_message: None,
        }
    }

    /// Set the display name to request during the handshake.
    #[must_use]
    pub fn with_display_name(mut self, display_name: Option<String>) -> Self {
        self.display_name = display_name;
        self
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Tick => vec![],
            AppEvent::Resize(cols, rows) => {
                self.terminal_size = (cols, rows);
                vec![AppAction::Render]
            },
            AppEvent::Connecting => {
                self.state = ConnectionState::Connecting;
                self.status_message = Some(format!("Connecting to {}...", self.server_addr));
                vec![AppAction::Render]
            },
            AppEvent::Welcome { participant_id, display_name } => {
                tracing::info!(%participant_id, %display_name, "session established");
                let session = Session::new(participant_id.clone());
                let room_list = session.room_list();

                self.session = Some(session);
                self.state = ConnectionState::Connected { participant_id };
                self.status_message = Some(format!("Connected as {display_name}"));

                vec![
                    AppAction::View(ViewCommand::ClearConversation),
                    AppAction::View(ViewCommand::RenderRoomList(room_list)),
                    AppAction::Render,
                ]
            },
            AppEvent::Disconnected => {
                self.state = ConnectionState::Disconnected;
                self.session = None;
                self.status_message = Some("Disconnected".to_string());
                vec![AppAction::Render]
            },
            AppEvent::BroadcastReceived { text, sender } => {
                let Some(session) = &self.session else {
                    tracing::warn!("broadcast before handshake, dropping");
                    return vec![];
                };
                Self::with_render(session.route_broadcast(text, sender))
            },
            AppEvent::DirectReceived { message, from, to } => {
                let Some(session) = &self.session else {
                    tracing::warn!("direct message before handshake, dropping");
                    return vec![];
                };
                Self::with_render(session.route_direct(message, from, to))
            },
            AppEvent::RosterReceived { roster } => {
                let Some(session) = &mut self.session else {
                    tracing::warn!("roster before handshake, dropping");
                    return vec![];
                };
                Self::with_render(session.apply_roster(roster))
            },
            AppEvent::Error { message } => {
                self.status_message = Some(format!("Error: {message}"));
                vec![AppAction::Render]
            },
        }
    }

    /// Set a status message to display to the user.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// Initiate connection to the server.
    pub fn connect(&mut self) -> Vec<AppAction> {
        self.state = ConnectionState::Connecting;
        vec![AppAction::Connect { server_addr: self.server_addr.clone() }, AppAction::Render]
    }

    /// Switch the current room.
    pub fn select_room(&mut self, target: Room) -> Vec<AppAction> {
        let Some(session) = &mut self.session else {
            self.status_message = Some("Not connected".to_string());
            return vec![AppAction::Render];
        };
        let effects = session.select_room(target);
        let label = session.room_label(session.current_room());
        self.status_message = Some(format!("Viewing {label}"));
        Self::with_render(effects)
    }

    /// Select the room after the current one in the room list, wrapping.
    pub fn next_room(&mut self) -> Vec<AppAction> {
        self.cycle_room(1)
    }

    /// Select the room before the current one in the room list, wrapping.
    pub fn previous_room(&mut self) -> Vec<AppAction> {
        self.cycle_room(-1)
    }

    /// Send `text` to the current room.
    ///
    /// Blank text produces no actions, so the composer keeps its content.
    pub fn submit(&mut self, text: &str) -> Vec<AppAction> {
        let Some(session) = &self.session else {
            self.status_message = Some("Not connected".to_string());
            return vec![AppAction::Render];
        };
        let effects = session.compose_outbound(text);
        if effects.is_empty() {
            return vec![];
        }
        Self::with_render(effects)
    }

    /// Quit the application.
    pub fn quit(&self) -> Vec<AppAction> {
        vec![AppAction::Quit]
    }

    /// Current connection state.
    pub fn connection_state(&self) -> &ConnectionState {
        &self.state
    }

    /// Server address (host:port).
    pub fn server_addr(&self) -> &str {
        &self.server_addr
    }

    /// Display name requested in the handshake.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Chat session. `None` before the handshake.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Current room. `None` before the handshake.
    pub fn current_room(&self) -> Option<&Room> {
        self.session.as_ref().map(Session::current_room)
    }

    /// Label of the current room. `None` before the handshake.
    pub fn current_room_label(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.room_label(s.current_room()))
    }

    /// Terminal dimensions (columns, rows).
    pub fn terminal_size(&self) -> (u16, u16) {
        self.terminal_size
    }

    /// Transient status message. `None` if no message.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    fn cycle_room(&mut self, step: isize) -> Vec<AppAction> {
        let Some(session) = &self.session else {
            return vec![];
        };

        let rooms = session.room_list();
        let len = rooms.len() as isize;
        let current = rooms.iter().position(|entry| entry.active).map_or(0, |idx| idx as isize);
        let next = (current + step).rem_euclid(len) as usize;

        match rooms.into_iter().nth(next) {
            Some(entry) => self.select_room(entry.room),
            None => vec![],
        }
    }

    fn with_render(effects: Vec<Effect>) -> Vec<AppAction> {
        if effects.is_empty() {
            return vec![];
        }
        let mut actions: Vec<AppAction> = effects.into_iter().map(AppAction::from).collect();
        actions.push(AppAction::Render);
        actions
    }
}

#[cfg(test)]
mod tests {
    use parlor_core::{Outbound, ParticipantId, Roster};

    use super::*;

    fn connected_app() -> App {
        let mut app = App::new("localhost:4433".into());
        let _ = app.handle(AppEvent::Welcome {
            participant_id: ParticipantId::from("10.0.0.1"),
            display_name: "User (10.0.0.1)".into(),
        });
        app
    }

    fn with_roster(mut app: App) -> App {
        let _ = app.handle(AppEvent::RosterReceived {
            roster: Roster::from_pairs([
                ("10.0.0.1", "Me"),
                ("10.0.0.2", "Alice"),
                ("10.0.0.3", "Bob"),
            ]),
        });
        app
    }

    #[test]
    fn welcome_creates_session() {
        let app = connected_app();

        assert!(app.connection_state().is_connected());
        assert_eq!(app.current_room(), Some(&Room::General));
        assert_eq!(app.status_message(), Some("Connected as User (10.0.0.1)"));
    }

    #[test]
    fn chat_before_welcome_is_dropped() {
        let mut app = App::new("localhost:4433".into());
        let actions = app.handle(AppEvent::BroadcastReceived { text: "hi".into(), sender: None });

        assert!(actions.is_empty());
        assert!(app.session().is_none());
    }

    #[test]
    fn api_connect() {
        let mut app = App::new("localhost:4433".into());
        let actions = app.connect();

        assert!(matches!(actions.as_slice(), [AppAction::Connect { .. }, AppAction::Render]));
        assert!(matches!(app.state, ConnectionState::Connecting));
    }

    #[test]
    fn api_submit_in_general() {
        let mut app = connected_app();
        let actions = app.submit("hello");

        assert!(matches!(actions.as_slice(), [
            AppAction::Send(Outbound::Broadcast { .. }),
            AppAction::View(ViewCommand::ClearComposer),
            AppAction::Render
        ]));
    }

    #[test]
    fn api_submit_blank_is_noop() {
        let mut app = connected_app();
        assert!(app.submit("   ").is_empty());
    }

    #[test]
    fn api_submit_disconnected_sets_status() {
        let mut app = App::new("localhost:4433".into());

        assert_eq!(app.submit("hello"), vec![AppAction::Render]);
        assert_eq!(app.status_message(), Some("Not connected"));
    }

    #[test]
    fn api_select_room_reports_label() {
        let mut app = with_roster(connected_app());
        let actions = app.select_room(Room::parse_target("10.0.0.2").unwrap());

        assert!(matches!(actions.first(), Some(AppAction::Send(Outbound::JoinRoom { .. }))));
        assert_eq!(app.status_message(), Some("Viewing Alice"));
    }

    #[test]
    fn next_room_cycles_and_wraps() {
        let mut app = with_roster(connected_app());

        let _ = app.next_room();
        assert_eq!(app.current_room(), Some(&Room::parse_target("10.0.0.2").unwrap()));
        let _ = app.next_room();
        assert_eq!(app.current_room(), Some(&Room::parse_target("10.0.0.3").unwrap()));
        let _ = app.next_room();
        assert_eq!(app.current_room(), Some(&Room::General));
    }

    #[test]
    fn previous_room_wraps_to_last() {
        let mut app = with_roster(connected_app());

        let _ = app.previous_room();
        assert_eq!(app.current_room(), Some(&Room::parse_target("10.0.0.3").unwrap()));
    }

    #[test]
    fn cycling_with_only_general_is_noop() {
        let mut app = connected_app();
        assert!(app.next_room().is_empty());
        assert_eq!(app.current_room(), Some(&Room::General));
    }

    #[test]
    fn disconnect_drops_session() {
        let mut app = connected_app();
        let _ = app.handle(AppEvent::Disconnected);

        assert!(app.session().is_none());
        assert_eq!(app.connection_state(), &ConnectionState::Disconnected);
    }
}
