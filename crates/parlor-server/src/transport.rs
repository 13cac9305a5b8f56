//! Quinn-based QUIC transport.
//!
//! TLS 1.3 via rustls with ALPN `parlor`. Uses the PEM certificate and key
//! when both paths are given, otherwise a freshly generated self-signed
//! certificate for `localhost`. Self-signed certificates are for local use
//! only.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use parlor_proto::ALPN_PROTOCOL;
use quinn::{Endpoint, IdleTimeout, RecvStream, SendStream, ServerConfig, TransportConfig};

use crate::error::ServerError;

/// QUIC endpoint accepting client connections.
pub struct QuinnTransport {
    endpoint: Endpoint,
}

impl QuinnTransport {
    /// Create and bind a new QUIC transport.
    ///
    /// Connections quiet for `idle_timeout` are closed; the server pings each
    /// client often enough that a live but silent client stays connected.
    ///
    /// Must be called from within a tokio runtime.
    pub fn bind(
        address: &str,
        cert_path: Option<&str>,
        key_path: Option<&str>,
        idle_timeout: Duration,
    ) -> Result<Self, ServerError> {
        let addr: SocketAddr = address
            .parse()
            .map_err(|e| ServerError::Config(format!("invalid bind address '{address}': {e}")))?;

        let mut server_config = match (cert_path, key_path) {
            (Some(cert), Some(key)) => load_tls_config(cert, key)?,
            _ => generate_self_signed_config()?,
        };
        server_config.transport_config(Arc::new(transport_config(idle_timeout)?));

        let endpoint = Endpoint::server(server_config, addr)
            .map_err(|e| ServerError::Transport(format!("failed to create endpoint: {e}")))?;

        tracing::info!(%addr, "QUIC transport bound");

        Ok(Self { endpoint })
    }

    /// Wait for the next connection to complete its handshake.
    ///
    /// Returns `Ok(None)` once the endpoint is closed.
    pub async fn accept(&self) -> Result<Option<QuinnConnection>, ServerError> {
        let Some(incoming) = self.endpoint.accept().await else {
            return Ok(None);
        };

        let connection = incoming
            .await
            .map_err(|e| ServerError::Transport(format!("connection failed: {e}")))?;

        Ok(Some(QuinnConnection { connection }))
    }

    /// Stop accepting and close every connection.
    pub fn close(&self) {
        self.endpoint.close(0u32.into(), b"server shutting down");
    }

    /// Local address the transport is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.endpoint
            .local_addr()
            .map_err(|e| ServerError::Transport(format!("failed to get local address: {e}")))
    }
}

/// A QUIC connection.
///
/// Clones share the underlying connection.
#[derive(Clone)]
pub struct QuinnConnection {
    connection: quinn::Connection,
}

impl QuinnConnection {
    /// Accept the next client-opened bidirectional stream.
    pub async fn accept_bi(&self) -> Result<(SendStream, RecvStream), ServerError> {
        self.connection
            .accept_bi()
            .await
            .map_err(|e| ServerError::Transport(format!("accept_bi failed: {e}")))
    }

    /// Open a unidirectional stream towards the client.
    pub async fn open_uni(&self) -> Result<SendStream, ServerError> {
        self.connection
            .open_uni()
            .await
            .map_err(|e| ServerError::Transport(format!("open_uni failed: {e}")))
    }

    /// Remote peer address.
    pub fn remote_addr(&self) -> SocketAddr {
        self.connection.remote_address()
    }

    /// Close the connection with an error code and reason.
    pub fn close(&self, error_code: quinn::VarInt, reason: &[u8]) {
        self.connection.close(error_code, reason);
    }
}

/// Idle timeout plus keep-alive pings at a third of it.
fn transport_config(idle_timeout: Duration) -> Result<TransportConfig, ServerError> {
    if idle_timeout.is_zero() {
        return Err(ServerError::Config("idle timeout must be positive".to_string()));
    }
    let max_idle = IdleTimeout::try_from(idle_timeout)
        .map_err(|e| ServerError::Config(format!("invalid idle timeout: {e}")))?;

    let mut transport = TransportConfig::default();
    transport.max_idle_timeout(Some(max_idle));
    transport.keep_alive_interval(Some(keep_alive_interval(idle_timeout)));
    Ok(transport)
}

fn keep_alive_interval(idle_timeout: Duration) -> Duration {
    idle_timeout / 3
}

fn load_tls_config(cert_path: &str, key_path: &str) -> Result<ServerConfig, ServerError> {
    let cert_pem = std::fs::read(cert_path)
        .map_err(|e| ServerError::Config(format!("failed to read cert '{cert_path}': {e}")))?;

    let key_pem = std::fs::read(key_path)
        .map_err(|e| ServerError::Config(format!("failed to read key '{key_path}': {e}")))?;

    let certs = rustls_pemfile::certs(&mut &cert_pem[..])
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ServerError::Config(format!("failed to parse certificates: {e}")))?;

    let key = rustls_pemfile::private_key(&mut &key_pem[..])
        .map_err(|e| ServerError::Config(format!("failed to parse private key: {e}")))?
        .ok_or_else(|| ServerError::Config("no private key found".to_string()))?;

    quic_config(certs, key)
}

fn generate_self_signed_config() -> Result<ServerConfig, ServerError> {
    let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()])
        .map_err(|e| ServerError::Config(format!("failed to generate self-signed cert: {e}")))?;

    let cert_chain = vec![cert.cert.der().clone()];
    let key = rustls::pki_types::PrivatePkcs8KeyDer::from(cert.key_pair.serialize_der());

    tracing::warn!("using self-signed certificate, not for production use");

    quic_config(cert_chain, key.into())
}

fn quic_config(
    certs: Vec<rustls::pki_types::CertificateDer<'static>>,
    key: rustls::pki_types::PrivateKeyDer<'static>,
) -> Result<ServerConfig, ServerError> {
    let mut tls_config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| ServerError::Config(format!("invalid TLS config: {e}")))?;

    tls_config.alpn_protocols = vec![ALPN_PROTOCOL.to_vec()];

    Ok(ServerConfig::with_crypto(Arc::new(
        quinn::crypto::rustls::QuicServerConfig::try_from(tls_config)
            .map_err(|e| ServerError::Config(format!("QUIC config error: {e}")))?,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDLE: Duration = Duration::from_secs(30);

    #[tokio::test]
    async fn transport_binds_with_self_signed() {
        let transport = QuinnTransport::bind("127.0.0.1:0", None, None, IDLE).unwrap();
        let addr = transport.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn transport_rejects_invalid_address() {
        assert!(matches!(
            QuinnTransport::bind("invalid:address:format", None, None, IDLE),
            Err(ServerError::Config(_))
        ));
    }

    #[tokio::test]
    async fn transport_reports_missing_cert_files() {
        let result = QuinnTransport::bind(
            "127.0.0.1:0",
            Some("/nonexistent/cert.pem"),
            Some("/nonexistent/key.pem"),
            IDLE,
        );
        assert!(matches!(result, Err(ServerError::Config(_))));
    }

    #[test]
    fn keep_alive_is_shorter_than_idle_timeout() {
        for secs in [1, 5, 30, 600] {
            let idle = Duration::from_secs(secs);
            assert!(keep_alive_interval(idle) < idle);
            assert!(transport_config(idle).is_ok());
        }
    }

    #[test]
    fn zero_idle_timeout_is_rejected() {
        assert!(matches!(transport_config(Duration::ZERO), Err(ServerError::Config(_))));
    }
}
