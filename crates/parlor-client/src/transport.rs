//! QUIC transport for connecting to a Parlor server.
//!
//! One background task owns the QUIC connection. Outgoing frames are written
//! each on their own bidirectional stream; the server pushes frames to us on
//! unidirectional streams, which are read until they finish.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use bytes::BytesMut;
use parlor_proto::{ALPN_PROTOCOL, Frame, FrameHeader};
use quinn::{ClientConfig, Connection, Endpoint, RecvStream};
use tokio::{sync::mpsc, task::AbortHandle};

/// Capacity of the frame channels in each direction.
const CHANNEL_CAPACITY: usize = 32;

/// Connections with no traffic for this long are closed.
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Ping interval on a quiet connection. Must stay below [`IDLE_TIMEOUT`].
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(10);

/// TLS server name presented during the handshake.
const SERVER_NAME: &str = "localhost";

/// Transport error.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Could not establish the connection.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Stream read or write failed.
    #[error("stream error: {0}")]
    Stream(String),

    /// Bytes on the wire did not form a valid frame.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// A live connection to the server.
///
/// Frames pushed into `to_server` are sent by the background task; frames read
/// from the server arrive on `from_server`. When the connection ends the
/// background task exits and `from_server` yields `None`.
pub struct ConnectedClient {
    /// Frames to send to the server.
    pub to_server: mpsc::Sender<Frame>,
    /// Frames received from the server.
    pub from_server: mpsc::Receiver<Frame>,
    abort_handle: AbortHandle,
}

impl ConnectedClient {
    /// Stop the background connection task.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

impl Drop for ConnectedClient {
    fn drop(&mut self) {
        self.abort_handle.abort();
    }
}

/// Connect to a server at `server_addr` (`host:port`).
///
/// Must be called from within a tokio runtime.
pub async fn connect(server_addr: &str) -> Result<ConnectedClient, TransportError> {
    let addr = resolve(server_addr).await?;

    let bind_addr: SocketAddr = if addr.is_ipv6() {
        SocketAddr::from(([0u16; 8], 0))
    } else {
        SocketAddr::from(([0, 0, 0, 0], 0))
    };

    let mut endpoint =
        Endpoint::client(bind_addr).map_err(|e| TransportError::Connection(e.to_string()))?;
    endpoint.set_default_client_config(insecure_client_config()?);

    let connection = endpoint
        .connect(addr, SERVER_NAME)
        .map_err(|e| TransportError::Connection(e.to_string()))?
        .await
        .map_err(|e| TransportError::Connection(e.to_string()))?;

    tracing::info!(%addr, "connected to server");

    let (to_server, outgoing) = mpsc::channel::<Frame>(CHANNEL_CAPACITY);
    let (incoming, from_server) = mpsc::channel::<Frame>(CHANNEL_CAPACITY);

    let task = tokio::spawn(async move {
        run_connection(endpoint, connection, outgoing, incoming).await;
    });

    Ok(ConnectedClient { to_server, from_server, abort_handle: task.abort_handle() })
}

async fn resolve(server_addr: &str) -> Result<SocketAddr, TransportError> {
    if let Ok(addr) = server_addr.parse::<SocketAddr>() {
        return Ok(addr);
    }

    tokio::net::lookup_host(server_addr)
        .await
        .map_err(|e| TransportError::Connection(format!("cannot resolve '{server_addr}': {e}")))?
        .next()
        .ok_or_else(|| TransportError::Connection(format!("no address for '{server_addr}'")))
}

async fn run_connection(
    endpoint: Endpoint,
    connection: Connection,
    mut outgoing: mpsc::Receiver<Frame>,
    incoming: mpsc::Sender<Frame>,
) {
    let reader_conn = connection.clone();
    let reader = tokio::spawn(async move {
        loop {
            match reader_conn.accept_uni().await {
                Ok(stream) => {
                    let incoming = incoming.clone();
                    tokio::spawn(async move {
                        if let Err(e) = read_stream(stream, &incoming).await {
                            tracing::debug!(error = %e, "incoming stream ended");
                        }
                    });
                },
                Err(e) => {
                    tracing::info!(error = %e, "connection closed");
                    break;
                },
            }
        }
    });

    loop {
        tokio::select! {
            frame = outgoing.recv() => {
                let Some(frame) = frame else { break };
                if let Err(e) = send_frame(&connection, &frame).await {
                    tracing::warn!(error = %e, "failed to send frame");
                    break;
                }
            },
            () = wait_closed(&connection) => break,
        }
    }

    reader.abort();
    connection.close(0u32.into(), b"client closed");
    endpoint.wait_idle().await;
}

async fn wait_closed(connection: &Connection) {
    let reason = connection.closed().await;
    tracing::debug!(%reason, "connection closed by peer");
}

/// Read frames from one server stream until it finishes.
async fn read_stream(
    mut stream: RecvStream,
    incoming: &mpsc::Sender<Frame>,
) -> Result<(), TransportError> {
    let mut buf = BytesMut::with_capacity(FrameHeader::SIZE);

    loop {
        buf.clear();
        buf.resize(FrameHeader::SIZE, 0);

        match stream.read_exact(&mut buf[..]).await {
            Ok(()) => {},
            Err(quinn::ReadExactError::FinishedEarly(0)) => return Ok(()),
            Err(e) => return Err(TransportError::Stream(e.to_string())),
        }

        let payload_size = FrameHeader::from_bytes(&buf)
            .map_err(|e| TransportError::Protocol(e.to_string()))?
            .payload_size() as usize;

        if payload_size > 0 {
            buf.resize(FrameHeader::SIZE + payload_size, 0);
            stream
                .read_exact(&mut buf[FrameHeader::SIZE..])
                .await
                .map_err(|e| TransportError::Stream(e.to_string()))?;
        }

        let frame = Frame::decode(&buf).map_err(|e| TransportError::Protocol(e.to_string()))?;

        if incoming.send(frame).await.is_err() {
            // Receiver dropped, nobody is listening any more.
            return Ok(());
        }
    }
}

async fn send_frame(connection: &Connection, frame: &Frame) -> Result<(), TransportError> {
    let mut buf = Vec::with_capacity(frame.encoded_len());
    frame.encode(&mut buf).map_err(|e| TransportError::Protocol(e.to_string()))?;

    let (mut send, _recv) =
        connection.open_bi().await.map_err(|e| TransportError::Stream(e.to_string()))?;

    send.write_all(&buf).await.map_err(|e| TransportError::Stream(e.to_string()))?;
    send.finish().map_err(|e| TransportError::Stream(e.to_string()))?;

    Ok(())
}

/// Client config that skips certificate verification.
///
/// Development only: the server runs with a self-signed certificate by default.
fn insecure_client_config() -> Result<ClientConfig, TransportError> {
    let mut crypto = rustls::ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(InsecureCertVerifier))
        .with_no_client_auth();

    crypto.alpn_protocols = vec![ALPN_PROTOCOL.to_vec()];

    let mut config = ClientConfig::new(Arc::new(
        quinn::crypto::rustls::QuicClientConfig::try_from(crypto)
            .map_err(|e| TransportError::Connection(format!("invalid TLS config: {e}")))?,
    ));

    let idle_timeout = quinn::IdleTimeout::try_from(IDLE_TIMEOUT)
        .map_err(|e| TransportError::Connection(format!("invalid idle timeout: {e}")))?;
    let mut transport = quinn::TransportConfig::default();
    transport.max_idle_timeout(Some(idle_timeout));
    transport.keep_alive_interval(Some(KEEP_ALIVE_INTERVAL));
    config.transport_config(Arc::new(transport));

    Ok(config)
}

/// Certificate verifier that accepts any certificate.
#[derive(Debug)]
struct InsecureCertVerifier;

impl rustls::client::danger::ServerCertVerifier for InsecureCertVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        vec![
            rustls::SignatureScheme::RSA_PKCS1_SHA256,
            rustls::SignatureScheme::RSA_PKCS1_SHA384,
            rustls::SignatureScheme::RSA_PKCS1_SHA512,
            rustls::SignatureScheme::ECDSA_NISTP256_SHA256,
            rustls::SignatureScheme::ECDSA_NISTP384_SHA384,
            rustls::SignatureScheme::ECDSA_NISTP521_SHA512,
            rustls::SignatureScheme::RSA_PSS_SHA256,
            rustls::SignatureScheme::RSA_PSS_SHA384,
            rustls::SignatureScheme::RSA_PSS_SHA512,
            rustls::SignatureScheme::ED25519,
        ]
    }
}
