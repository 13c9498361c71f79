//! PJLink class 1 client.
//!
//! # Architecture
//!
//! ```text
//! VirtualPin
//!     │
//!     └─> PjlinkConnector::connect ───(TCP 4352)───> Projector
//!             │
//!             └─> PjlinkSession
//!                    │
//!                    └─> PjlinkCodec (CR framing)
//! ```
//!
//! # Design Principles
//!
//! - **One session per action**: a virtual pin opens, uses and closes a
//!   session for every activation. No pooling and no keepalive.
//! - **No automatic retry**: the caller decides what a failure means.
//! - **Bounded waits**: connect, every send and every receive share a
//!   single timeout (default 3000 ms).

use futures::{SinkExt, StreamExt};
use mediactl_core::constants::{DEFAULT_REMOTE_TIMEOUT_MS, PJLINK_DEFAULT_PORT};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, error, info, trace, warn};

use crate::codec::PjlinkCodec;
use crate::error::{RemoteError, Result};
use crate::message::{Greeting, PowerCommand, PowerResponse, auth_digest};
use crate::traits::{ProjectorConnector, ProjectorSession};

/// Configuration for the PJLink client.
///
/// # Example
///
/// ```
/// use mediactl_network::PjlinkConfig;
/// use std::time::Duration;
///
/// let config = PjlinkConfig {
///     timeout: Duration::from_millis(5000),
///     ..PjlinkConfig::default()
/// };
/// assert_eq!(config.default_port, 4352);
/// ```
#[derive(Debug, Clone)]
pub struct PjlinkConfig {
    /// Port used when an address carries none.
    pub default_port: u16,

    /// Timeout for all I/O operations (connect, send, recv).
    pub timeout: Duration,
}

impl Default for PjlinkConfig {
    fn default() -> Self {
        Self {
            default_port: PJLINK_DEFAULT_PORT,
            timeout: Duration::from_millis(DEFAULT_REMOTE_TIMEOUT_MS),
        }
    }
}

/// Split `host`, `host:port`, `ip`, `ip:port` or `[v6]:port` into a host
/// and a port.
pub fn parse_target(address: &str, default_port: u16) -> Result<(String, u16)> {
    let address = address.trim();
    if address.is_empty() {
        return Err(RemoteError::invalid_address(address));
    }

    if let Ok(addr) = address.parse::<SocketAddr>() {
        return Ok((addr.ip().to_string(), addr.port()));
    }
    if let Ok(ip) = address.parse::<IpAddr>() {
        return Ok((ip.to_string(), default_port));
    }

    match address.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| RemoteError::invalid_address(address))?;
            if host.is_empty() {
                return Err(RemoteError::invalid_address(address));
            }
            Ok((host.to_string(), port))
        }
        None => Ok((address.to_string(), default_port)),
    }
}

/// Connector for PJLink class 1 projectors.
#[derive(Debug, Clone, Default)]
pub struct PjlinkConnector {
    config: PjlinkConfig,
}

impl PjlinkConnector {
    /// Create a connector with the given configuration.
    pub fn new(config: PjlinkConfig) -> Self {
        Self { config }
    }

    /// Get the connector configuration.
    pub fn config(&self) -> &PjlinkConfig {
        &self.config
    }
}

impl ProjectorConnector for PjlinkConnector {
    type Session = PjlinkSession;

    async fn connect(&self, address: &str, credential: Option<&str>) -> Result<PjlinkSession> {
        let (host, port) = parse_target(address, self.config.default_port)?;
        let timeout = self.config.timeout;
        let timeout_ms = timeout.as_millis() as u64;
        info!(projector = %host, port, "Connecting to projector");

        let stream =
            match tokio::time::timeout(timeout, TcpStream::connect((host.as_str(), port))).await {
                Ok(Ok(stream)) => stream,
                Ok(Err(e)) => {
                    error!(projector = %host, "Connection failed: {}", e);
                    return Err(e.into());
                }
                Err(_) => {
                    warn!(projector = %host, "Connection timeout after {}ms", timeout_ms);
                    return Err(RemoteError::ConnectionTimeout(timeout_ms));
                }
            };

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }

        let mut session = PjlinkSession {
            peer: format!("{host}:{port}"),
            framed: Some(Framed::new(stream, PjlinkCodec::new())),
            greeting: Greeting::Open,
            password: credential.map(str::to_string),
            authenticated: false,
            timeout,
        };

        let line = session.recv_line().await?;
        session.greeting = Greeting::parse(&line)?;
        debug!(
            projector = %session.peer,
            requires_auth = session.greeting.requires_auth(),
            "Received greeting"
        );

        Ok(session)
    }
}

/// An open PJLink session.
///
/// Dropping the session closes the TCP connection; [`close`](ProjectorSession::close)
/// shuts it down gracefully.
pub struct PjlinkSession {
    /// Resolved peer, for logging.
    peer: String,

    /// Framed TCP stream (None once closed or lost).
    framed: Option<Framed<TcpStream, PjlinkCodec>>,

    greeting: Greeting,
    password: Option<String>,
    authenticated: bool,
    timeout: Duration,
}

impl std::fmt::Debug for PjlinkSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PjlinkSession")
            .field("peer", &self.peer)
            .field("connected", &self.framed.is_some())
            .field("greeting", &self.greeting)
            .field("authenticated", &self.authenticated)
            .finish()
    }
}

impl PjlinkSession {
    /// Check if the session still holds a connection.
    pub fn is_connected(&self) -> bool {
        self.framed.is_some()
    }

    /// Greeting received on connect.
    pub fn greeting(&self) -> &Greeting {
        &self.greeting
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    async fn send_line(&mut self, line: String) -> Result<()> {
        let timeout = self.timeout;
        let timeout_ms = self.timeout_ms();
        let framed = self.framed.as_mut().ok_or(RemoteError::NotConnected)?;
        trace!(projector = %self.peer, line = %line, "Sending line");

        match tokio::time::timeout(timeout, framed.send(line)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!(projector = %self.peer, "Send failed: {}", e);
                if matches!(e, RemoteError::Io(_)) {
                    self.framed = None;
                }
                Err(e)
            }
            Err(_) => {
                warn!(projector = %self.peer, "Send timeout after {}ms", timeout_ms);
                Err(RemoteError::WriteTimeout(timeout_ms))
            }
        }
    }

    async fn recv_line(&mut self) -> Result<String> {
        let timeout = self.timeout;
        let timeout_ms = self.timeout_ms();
        let framed = self.framed.as_mut().ok_or(RemoteError::NotConnected)?;

        match tokio::time::timeout(timeout, framed.next()).await {
            Ok(Some(Ok(line))) => {
                trace!(projector = %self.peer, line = %line, "Received line");
                Ok(line)
            }
            Ok(Some(Err(e))) => {
                error!(projector = %self.peer, "Receive failed: {}", e);
                Err(e)
            }
            Ok(None) => {
                warn!(projector = %self.peer, "Connection closed by projector");
                self.framed = None;
                Err(RemoteError::ConnectionLost(
                    "projector closed connection".to_string(),
                ))
            }
            Err(_) => {
                warn!(projector = %self.peer, "Receive timeout after {}ms", timeout_ms);
                Err(RemoteError::ReadTimeout(timeout_ms))
            }
        }
    }

    async fn request(&mut self, line: String) -> Result<String> {
        self.send_line(line).await?;
        self.recv_line().await
    }
}

impl ProjectorSession for PjlinkSession {
    async fn authenticate(&mut self) -> Result<()> {
        let seed = match &self.greeting {
            Greeting::Open => {
                self.authenticated = true;
                return Ok(());
            }
            Greeting::Secured { seed } => seed.clone(),
        };
        let password = self
            .password
            .as_deref()
            .ok_or(RemoteError::AuthenticationRequired)?;

        // The digest only prefixes the first command of a connection; a
        // harmless power query carries it.
        let line = format!("{}{}", auth_digest(&seed, password), PowerCommand::Query.to_line());
        let response = self.request(line).await?;

        match PowerResponse::parse(&response) {
            Ok(_) | Err(RemoteError::Projector { .. }) => {
                debug!(projector = %self.peer, "Authenticated");
                self.authenticated = true;
                Ok(())
            }
            Err(e) => {
                warn!(projector = %self.peer, "Authentication failed: {}", e);
                Err(e)
            }
        }
    }

    async fn set_power(&mut self, on: bool) -> Result<()> {
        if self.greeting.requires_auth() && !self.authenticated {
            return Err(RemoteError::AuthenticationRequired);
        }

        let response = self.request(PowerCommand::from(on).to_line()).await?;
        match PowerResponse::parse(&response)? {
            PowerResponse::Ok => {
                info!(projector = %self.peer, on, "Projector power set");
                Ok(())
            }
            PowerResponse::State(_) => Err(RemoteError::protocol(format!(
                "unexpected response '{response}' to power command"
            ))),
        }
    }

    async fn close(mut self) -> Result<()> {
        if let Some(framed) = self.framed.take() {
            let mut stream = framed.into_inner();
            stream.shutdown().await?;
            debug!(projector = %self.peer, "Session closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("192.168.1.50", ("192.168.1.50", 4352))]
    #[case("192.168.1.50:4353", ("192.168.1.50", 4353))]
    #[case("projector.local", ("projector.local", 4352))]
    #[case("projector.local:10000", ("projector.local", 10000))]
    #[case("::1", ("::1", 4352))]
    #[case("[::1]:4400", ("::1", 4400))]
    #[case(" 10.0.0.2 ", ("10.0.0.2", 4352))]
    fn test_parse_target(#[case] input: &str, #[case] expected: (&str, u16)) {
        let (host, port) = parse_target(input, PJLINK_DEFAULT_PORT).unwrap();
        assert_eq!((host.as_str(), port), expected);
    }

    #[rstest]
    #[case("")]
    #[case("projector:port")]
    #[case(":4352")]
    #[case("projector:70000")]
    fn test_parse_target_invalid(#[case] input: &str) {
        assert!(matches!(
            parse_target(input, PJLINK_DEFAULT_PORT),
            Err(RemoteError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_default_config() {
        let config = PjlinkConfig::default();
        assert_eq!(config.default_port, 4352);
        assert_eq!(config.timeout, Duration::from_millis(3000));
    }
}
