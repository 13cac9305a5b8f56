//! Parlor chat server.
//!
//! Production "glue" around the Sans-IO [`ServerDriver`]: [`Server`] accepts
//! QUIC connections, feeds what it reads to the driver and executes the
//! [`ServerAction`]s it returns.
//!
//! # Components
//!
//! - [`ServerDriver`]: Action-based chat routing (pure logic, no I/O)
//! - [`ConnectionRegistry`]: Sessions, participants and roster
//! - [`Server`]: Runtime that executes driver actions
//! - [`QuinnTransport`]: QUIC transport via Quinn
//! - [`SystemEnv`]: Production environment (system clock, OS RNG)
//!
//! # Streams
//!
//! Each client opens a bidirectional stream per frame it sends. The server
//! opens one unidirectional stream per connection and writes every frame for
//! that client on it, so the client sees them in order.
//!
//! Frames for a client are queued, and a writer task per connection drains
//! the queue onto the stream. No lock is held while writing to a peer, so a
//! client that stops reading stalls only its own writer. When its queue
//! fills up the server closes that connection.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod driver;
mod error;
mod registry;
mod system_env;
mod transport;

use std::{collections::HashMap, sync::Arc, time::Duration};

use bytes::BytesMut;
pub use driver::{
    DriverConfig, LogLevel, ServerAction, ServerDriver, ServerEvent, default_display_name,
};
pub use error::{DriverError, ServerError};
use parlor_core::Environment;
use parlor_proto::{Frame, FrameHeader};
pub use registry::{ConnectionRegistry, Departure, SessionInfo};
pub use system_env::SystemEnv;
use tokio::sync::{Mutex, RwLock, mpsc};
pub use transport::{QuinnConnection, QuinnTransport};

type SharedDriver = Arc<Mutex<ServerDriver<SystemEnv>>>;

/// Encoded frames waiting for one client before it is considered stuck.
const OUTBOUND_QUEUE_CAPACITY: usize = 128;

/// Shared state for all connections.
struct SharedState {
    /// Session ID → QUIC connection (for closing)
    connections: RwLock<HashMap<u64, QuinnConnection>>,
    /// Session ID → queue drained by that client's writer task
    outbound: RwLock<HashMap<u64, mpsc::Sender<Vec<u8>>>>,
}

/// Server configuration for the production runtime.
#[derive(Debug, Clone)]
pub struct ServerRuntimeConfig {
    /// Address to bind to (e.g., "0.0.0.0:4433")
    pub bind_address: String,
    /// Path to TLS certificate (PEM format)
    pub cert_path: Option<String>,
    /// Path to TLS private key (PEM format)
    pub key_path: Option<String>,
    /// Close connections with no traffic for this long. Keep-alive pings
    /// stop live clients from hitting it.
    pub idle_timeout: Duration,
    /// Driver configuration
    pub driver: DriverConfig,
}

impl Default for ServerRuntimeConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:4433".to_string(),
            cert_path: None,
            key_path: None,
            idle_timeout: Duration::from_secs(30),
            driver: DriverConfig::default(),
        }
    }
}

/// Production Parlor server.
pub struct Server {
    driver: ServerDriver<SystemEnv>,
    transport: QuinnTransport,
    env: SystemEnv,
}

impl Server {
    /// Create and bind a new server.
    ///
    /// Must be called from within a tokio runtime.
    pub fn bind(config: ServerRuntimeConfig) -> Result<Self, ServerError> {
        let env = SystemEnv::new();
        let driver = ServerDriver::new(env, config.driver);

        let transport = QuinnTransport::bind(
            &config.bind_address,
            config.cert_path.as_deref(),
            config.key_path.as_deref(),
            config.idle_timeout,
        )?;

        Ok(Self { driver, transport, env })
    }

    /// Run the server until the endpoint closes.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("server starting on {}", self.transport.local_addr()?);

        let env = self.env;
        let driver = Arc::new(Mutex::new(self.driver));
        let shared = Arc::new(SharedState {
            connections: RwLock::new(HashMap::new()),
            outbound: RwLock::new(HashMap::new()),
        });

        loop {
            match self.transport.accept().await {
                Ok(Some(conn)) => {
                    let driver = Arc::clone(&driver);
                    let shared = Arc::clone(&shared);

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, driver, shared, env).await {
                            tracing::error!("connection error: {}", e);
                        }
                    });
                },
                Ok(None) => {
                    tracing::info!("endpoint closed, server stopping");
                    return Ok(());
                },
                Err(e) => {
                    tracing::warn!("accept error: {}", e);
                },
            }
        }
    }

    /// Local address the server is bound to.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, ServerError> {
        self.transport.local_addr()
    }
}

/// Handle a single QUIC connection from handshake to close.
async fn handle_connection(
    conn: QuinnConnection,
    driver: SharedDriver,
    shared: Arc<SharedState>,
    env: SystemEnv,
) -> Result<(), ServerError> {
    let session_id = env.random_u64();
    let addr = conn.remote_addr();

    tracing::debug!(session_id, %addr, "new connection");

    let outbound_stream = conn.open_uni().await?;
    let (queue, pending) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
    tokio::spawn(write_outbound(session_id, outbound_stream, pending));

    shared.connections.write().await.insert(session_id, conn.clone());
    shared.outbound.write().await.insert(session_id, queue);

    {
        let mut driver = driver.lock().await;
        let actions = driver.process_event(ServerEvent::ConnectionAccepted { session_id, addr })?;
        dispatch_actions(actions, &shared).await?;
    }

    loop {
        match conn.accept_bi().await {
            Ok((send, recv)) => {
                let driver = Arc::clone(&driver);
                let shared = Arc::clone(&shared);

                tokio::spawn(async move {
                    if let Err(e) = handle_stream(session_id, send, recv, driver, &shared).await {
                        tracing::debug!("stream error: {}", e);
                    }
                });
            },
            Err(e) => {
                tracing::debug!(session_id, "connection closed: {}", e);
                break;
            },
        }
    }

    shared.connections.write().await.remove(&session_id);
    // Dropping the queue lets the writer task finish.
    shared.outbound.write().await.remove(&session_id);

    let mut driver = driver.lock().await;
    let actions = driver.process_event(ServerEvent::ConnectionClosed {
        session_id,
        reason: "connection closed".to_string(),
    })?;
    dispatch_actions(actions, &shared).await
}

/// Drain one client's queue onto its outbound stream.
async fn write_outbound(
    session_id: u64,
    mut stream: quinn::SendStream,
    mut pending: mpsc::Receiver<Vec<u8>>,
) {
    while let Some(bytes) = pending.recv().await {
        if let Err(e) = stream.write_all(&bytes).await {
            tracing::debug!(session_id, "write failed: {}", e);
            return;
        }
    }

    if let Err(e) = stream.finish() {
        tracing::debug!(session_id, "finish failed: {}", e);
    }
}

/// Read frames from one client stream until it finishes.
async fn handle_stream(
    session_id: u64,
    send: quinn::SendStream,
    mut recv: quinn::RecvStream,
    driver: SharedDriver,
    shared: &SharedState,
) -> Result<(), ServerError> {
    // Replies travel on the per-connection outbound stream.
    drop(send);

    let mut buf = BytesMut::with_capacity(FrameHeader::SIZE);

    loop {
        buf.clear();
        buf.resize(FrameHeader::SIZE, 0);

        match recv.read_exact(&mut buf[..]).await {
            Ok(()) => {},
            Err(quinn::ReadExactError::FinishedEarly(0)) => break,
            Err(e) => return Err(ServerError::Transport(format!("read error: {e}"))),
        }

        let payload_size = match FrameHeader::from_bytes(&buf) {
            Ok(header) => header.payload_size() as usize,
            Err(e) => {
                tracing::warn!(session_id, "invalid frame header: {}", e);
                break;
            },
        };

        if payload_size > 0 {
            buf.resize(FrameHeader::SIZE + payload_size, 0);
            recv.read_exact(&mut buf[FrameHeader::SIZE..])
                .await
                .map_err(|e| ServerError::Transport(format!("payload read error: {e}")))?;
        }

        let frame = match Frame::decode(&buf) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(session_id, "frame decode error: {}", e);
                break;
            },
        };

        // Queued under the driver lock so every client gets frames in the
        // order the driver produced them.
        let mut driver = driver.lock().await;
        match driver.process_event(ServerEvent::FrameReceived { session_id, frame }) {
            Ok(actions) => dispatch_actions(actions, shared).await?,
            Err(e) => tracing::warn!(session_id, "frame processing error: {}", e),
        }
    }

    Ok(())
}

/// Execute server actions.
///
/// Never waits on a peer: frames are handed to the per-connection queues.
async fn dispatch_actions(
    actions: Vec<ServerAction>,
    shared: &SharedState,
) -> Result<(), ServerError> {
    for action in actions {
        match action {
            ServerAction::SendToSession { session_id, frame } => {
                let mut buf = Vec::with_capacity(frame.encoded_len());
                frame.encode(&mut buf).map_err(|e| ServerError::Protocol(e.to_string()))?;

                let queued =
                    shared.outbound.read().await.get(&session_id).map(|queue| queue.try_send(buf));
                match queued {
                    Some(Ok(())) => {},
                    Some(Err(mpsc::error::TrySendError::Full(_))) => {
                        tracing::warn!(session_id, "outbound queue full, dropping client");
                        close_connection(shared, session_id, "client not reading").await;
                    },
                    Some(Err(mpsc::error::TrySendError::Closed(_))) | None => {
                        tracing::debug!(session_id, "send skipped, session gone");
                    },
                }
            },

            ServerAction::CloseConnection { session_id, reason } => {
                tracing::info!(session_id, "closing connection: {}", reason);
                close_connection(shared, session_id, &reason).await;
            },

            ServerAction::Log { level, message } => match level {
                LogLevel::Debug => tracing::debug!("{}", message),
                LogLevel::Info => tracing::info!("{}", message),
                LogLevel::Warn => tracing::warn!("{}", message),
                LogLevel::Error => tracing::error!("{}", message),
            },
        }
    }

    Ok(())
}

async fn close_connection(shared: &SharedState, session_id: u64, reason: &str) {
    if let Some(conn) = shared.connections.read().await.get(&session_id) {
        conn.close(0u32.into(), reason.as_bytes());
    }
}
