//! Server driver.
//!
//! Sans-IO core of the server: consumes [`ServerEvent`]s from the runtime and
//! returns [`ServerAction`]s for it to execute. Ties together the
//! [`ConnectionRegistry`] and the chat routing rules:
//!
//! - `Hello` binds the session to a participant id derived from its address
//!   and answers with `Welcome`; every session then receives the new roster.
//! - `SendBroadcast` fans out to every authenticated session.
//! - `SendDirect` goes to the receiver's sessions and is echoed to the
//!   sender's.
//! - `JoinRoom` is a notice: the key must name a pairwise room the sender
//!   belongs to. Nothing is stored, since direct messages are routed by
//!   participant.
//!
//! Frames from a session that has not said `Hello` are answered with an
//! `Error` frame.

use std::{net::SocketAddr, str::FromStr};

use chrono::{DateTime, Local};
use parlor_core::{Environment, ParticipantId, RoomKey};
use parlor_proto::{
    Frame, FrameHeader, Opcode, Payload,
    payloads::{
        ErrorPayload,
        chat::{Broadcast, Direct, JoinRoom, Roster, SendBroadcast, SendDirect},
        session::{Goodbye, Hello, Welcome},
    },
};

use crate::{
    error::DriverError,
    registry::{ConnectionRegistry, Departure},
};

/// Format of the timestamp appended to every chat line.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Driver configuration
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Maximum concurrent connections
    pub max_connections: usize,
    /// Include the port in participant ids, so clients sharing a host are
    /// told apart.
    pub id_with_port: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { max_connections: 10_000, id_with_port: false }
    }
}

/// Events that the server driver processes.
#[derive(Debug, Clone)]
pub enum ServerEvent {
    /// A new connection was accepted
    ConnectionAccepted {
        /// Unique connection ID assigned by the runtime
        session_id: u64,
        /// Remote address of the peer
        addr: SocketAddr,
    },

    /// A frame was received from a connection
    FrameReceived {
        /// Connection that sent the frame
        session_id: u64,
        /// The received frame
        frame: Frame,
    },

    /// A connection was closed (by peer or error)
    ConnectionClosed {
        /// Connection that was closed
        session_id: u64,
        /// Reason for closure
        reason: String,
    },
}

/// Actions that the server driver produces.
#[derive(Debug, Clone)]
pub enum ServerAction {
    /// Send a frame to a specific session
    SendToSession {
        /// Target session ID
        session_id: u64,
        /// Frame to send
        frame: Frame,
    },

    /// Close a connection
    CloseConnection {
        /// Session to close
        session_id: u64,
        /// Reason for closure
        reason: String,
    },

    /// Log a message
    Log {
        /// Log level
        level: LogLevel,
        /// Message to log
        message: String,
    },
}

/// Log levels for server actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug information
    Debug,
    /// Informational message
    Info,
    /// Warning
    Warn,
    /// Error
    Error,
}

/// Action-based server driver.
pub struct ServerDriver<E: Environment> {
    registry: ConnectionRegistry,
    env: E,
    config: DriverConfig,
}

impl<E: Environment> ServerDriver<E> {
    /// Create a new server driver.
    pub fn new(env: E, config: DriverConfig) -> Self {
        Self { registry: ConnectionRegistry::new(), env, config }
    }

    /// Process a server event and return actions to execute.
    pub fn process_event(&mut self, event: ServerEvent) -> Result<Vec<ServerAction>, DriverError> {
        match event {
            ServerEvent::ConnectionAccepted { session_id, addr } => {
                self.handle_connection_accepted(session_id, addr)
            },
            ServerEvent::FrameReceived { session_id, frame } => {
                self.handle_frame_received(session_id, &frame)
            },
            ServerEvent::ConnectionClosed { session_id, reason } => {
                self.handle_connection_closed(session_id, &reason)
            },
        }
    }

    fn handle_connection_accepted(
        &mut self,
        session_id: u64,
        addr: SocketAddr,
    ) -> Result<Vec<ServerAction>, DriverError> {
        if self.registry.session_count() >= self.config.max_connections {
            return Ok(vec![ServerAction::CloseConnection {
                session_id,
                reason: "max connections exceeded".to_string(),
            }]);
        }

        if !self.registry.register_session(session_id, addr) {
            return Err(DriverError::SessionAlreadyExists(session_id));
        }

        Ok(vec![log(LogLevel::Debug, format!("connection {session_id} accepted from {addr}"))])
    }

    fn handle_frame_received(
        &mut self,
        session_id: u64,
        frame: &Frame,
    ) -> Result<Vec<ServerAction>, DriverError> {
        if !self.registry.has_session(session_id) {
            return Err(DriverError::SessionNotFound(session_id));
        }

        let request_id = frame.header.request_id();
        let payload = match Payload::from_frame(frame) {
            Ok(payload) => payload,
            Err(e) => {
                let error = match frame.header.opcode_enum() {
                    Some(_) => ErrorPayload::invalid_payload(e.to_string()),
                    None => ErrorPayload::frame_rejected(e.to_string()),
                };
                return self.reply_error(session_id, request_id, error);
            },
        };

        let Some(sender) = self.registry.participant(session_id).cloned() else {
            return match payload {
                Payload::Hello(hello) => self.handle_hello(session_id, hello),
                Payload::Goodbye(goodbye) => Ok(self.handle_goodbye(session_id, goodbye)),
                _ => self.reply_error(session_id, request_id, ErrorPayload::not_authenticated()),
            };
        };

        match payload {
            Payload::Hello(_) => self.reply_error(
                session_id,
                request_id,
                ErrorPayload::frame_rejected("already said hello"),
            ),
            Payload::Goodbye(goodbye) => Ok(self.handle_goodbye(session_id, goodbye)),
            Payload::SendBroadcast(send) => self.handle_send_broadcast(&sender, send),
            Payload::SendDirect(send) => self.handle_send_direct(session_id, request_id, &sender, send),
            Payload::JoinRoom(join) => self.handle_join_room(session_id, request_id, &sender, &join),
            other => self.reply_error(
                session_id,
                request_id,
                ErrorPayload::frame_rejected(format!(
                    "{:?} is not a client request",
                    other.opcode()
                )),
            ),
        }
    }

    fn handle_hello(
        &mut self,
        session_id: u64,
        hello: Hello,
    ) -> Result<Vec<ServerAction>, DriverError> {
        let Some(info) = self.registry.session(session_id) else {
            return Err(DriverError::SessionNotFound(session_id));
        };

        let participant = if self.config.id_with_port {
            ParticipantId::new(info.addr.to_string())
        } else {
            ParticipantId::new(info.addr.ip().to_string())
        };

        let display_name = hello
            .display_name
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| default_display_name(&participant));

        self.registry.authenticate(session_id, participant.clone(), display_name.clone());

        let welcome = Payload::Welcome(Welcome {
            participant_id: participant.as_str().to_owned(),
            display_name: display_name.clone(),
        });

        let mut actions = vec![
            ServerAction::SendToSession { session_id, frame: encode(&welcome)? },
            log(
                LogLevel::Info,
                format!("session {session_id} joined as {participant} ({display_name})"),
            ),
        ];
        if hello.version != parlor_proto::PROTOCOL_VERSION {
            actions.push(log(
                LogLevel::Warn,
                format!("session {session_id} speaks protocol version {}", hello.version),
            ));
        }
        actions.extend(self.roster_to_all()?);
        Ok(actions)
    }

    fn handle_goodbye(&self, session_id: u64, goodbye: Goodbye) -> Vec<ServerAction> {
        vec![ServerAction::CloseConnection {
            session_id,
            reason: goodbye.reason.unwrap_or_else(|| "client said goodbye".to_string()),
        }]
    }

    fn handle_send_broadcast(
        &self,
        sender: &ParticipantId,
        send: SendBroadcast,
    ) -> Result<Vec<ServerAction>, DriverError> {
        let text = send.text.trim();
        if text.is_empty() {
            return Ok(vec![log(LogLevel::Debug, format!("dropping empty broadcast from {sender}"))]);
        }

        let frame = encode(&Payload::Broadcast(Broadcast {
            text: self.format_line(sender, text),
            sender: Some(sender.as_str().to_owned()),
        }))?;

        let mut actions: Vec<ServerAction> = self
            .registry
            .authenticated_sessions()
            .into_iter()
            .map(|session_id| ServerAction::SendToSession { session_id, frame: frame.clone() })
            .collect();
        actions.push(log(LogLevel::Debug, format!("broadcast from {sender}")));
        Ok(actions)
    }

    fn handle_send_direct(
        &self,
        session_id: u64,
        request_id: u32,
        sender: &ParticipantId,
        send: SendDirect,
    ) -> Result<Vec<ServerAction>, DriverError> {
        let receiver = ParticipantId::new(send.receiver.trim());
        if receiver.as_str().is_empty() {
            return self.reply_error(
                session_id,
                request_id,
                ErrorPayload::invalid_payload("direct message without receiver"),
            );
        }

        let text = send.message.trim();
        if text.is_empty() {
            return Ok(vec![log(
                LogLevel::Debug,
                format!("dropping empty direct message from {sender}"),
            )]);
        }

        let frame = encode(&Payload::Direct(Direct {
            message: self.format_line(sender, text),
            from: sender.as_str().to_owned(),
            to: receiver.as_str().to_owned(),
        }))?;

        let mut targets: Vec<u64> = self.registry.sessions_for(&receiver).collect();
        let delivered = !targets.is_empty();
        targets.extend(self.registry.sessions_for(sender));
        targets.sort_unstable();
        targets.dedup();

        let mut actions: Vec<ServerAction> = targets
            .into_iter()
            .map(|session_id| ServerAction::SendToSession { session_id, frame: frame.clone() })
            .collect();
        if delivered {
            actions.push(log(LogLevel::Debug, format!("direct message {sender} -> {receiver}")));
        } else {
            actions.push(log(
                LogLevel::Debug,
                format!("direct message {sender} -> {receiver}: receiver offline, echoed only"),
            ));
        }
        Ok(actions)
    }

    fn handle_join_room(
        &self,
        session_id: u64,
        request_id: u32,
        sender: &ParticipantId,
        join: &JoinRoom,
    ) -> Result<Vec<ServerAction>, DriverError> {
        let room = match RoomKey::from_str(&join.room) {
            Ok(room) if room.contains(sender) => room,
            Ok(_) | Err(_) => {
                return self.reply_error(
                    session_id,
                    request_id,
                    ErrorPayload::invalid_room(&join.room),
                );
            },
        };

        Ok(vec![log(LogLevel::Debug, format!("session {session_id} opened room {room}"))])
    }

    fn handle_connection_closed(
        &mut self,
        session_id: u64,
        reason: &str,
    ) -> Result<Vec<ServerAction>, DriverError> {
        let Some(Departure { info, left_roster }) = self.registry.unregister_session(session_id)
        else {
            return Ok(Vec::new());
        };

        let mut actions = vec![log(
            LogLevel::Info,
            format!("connection {session_id} from {} closed: {reason}", info.addr),
        )];
        if left_roster {
            actions.extend(self.roster_to_all()?);
        }
        Ok(actions)
    }

    /// Current roster sent to every authenticated session.
    fn roster_to_all(&self) -> Result<Vec<ServerAction>, DriverError> {
        let entries = self
            .registry
            .roster()
            .iter()
            .map(|entry| (entry.id.as_str().to_owned(), entry.display_name.clone()))
            .collect();
        let frame = encode(&Payload::Roster(Roster { entries }))?;

        Ok(self
            .registry
            .authenticated_sessions()
            .into_iter()
            .map(|session_id| ServerAction::SendToSession { session_id, frame: frame.clone() })
            .collect())
    }

    fn reply_error(
        &self,
        session_id: u64,
        request_id: u32,
        error: ErrorPayload,
    ) -> Result<Vec<ServerAction>, DriverError> {
        let message = format!("rejected frame from session {session_id}: {}", error.message);

        let mut header = FrameHeader::new(Opcode::Error);
        header.set_request_id(request_id);
        let frame = Payload::Error(error)
            .into_frame(header)
            .map_err(|e| DriverError::Protocol(e.to_string()))?;

        Ok(vec![ServerAction::SendToSession { session_id, frame }, log(LogLevel::Warn, message)])
    }

    /// Chat line as shown to clients: `(<sender>) says: <text> - [<time>]`.
    fn format_line(&self, sender: &ParticipantId, text: &str) -> String {
        let time: DateTime<Local> = self.env.wall_clock().into();
        format!("{} says: {text} - [{}]", sender.marker(), time.format(TIMESTAMP_FORMAT))
    }

    /// Registry view for the runtime and tests.
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Number of open connections.
    pub fn connection_count(&self) -> usize {
        self.registry.session_count()
    }

    /// Environment the driver reads time from.
    pub fn env(&self) -> &E {
        &self.env
    }
}

impl<E: Environment> std::fmt::Debug for ServerDriver<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerDriver")
            .field("session_count", &self.registry.session_count())
            .field("participant_count", &self.registry.roster().len())
            .finish_non_exhaustive()
    }
}

/// Display name given to participants that did not pick one.
pub fn default_display_name(participant: &ParticipantId) -> String {
    format!("User {}", participant.marker())
}

fn encode(payload: &Payload) -> Result<Frame, DriverError> {
    payload.to_frame().map_err(|e| DriverError::Protocol(e.to_string()))
}

fn log(level: LogLevel, message: String) -> ServerAction {
    ServerAction::Log { level, message }
}
