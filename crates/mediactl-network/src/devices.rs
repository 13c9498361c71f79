//! Enum wrappers for projector connector dispatch.
//!
//! Native `async fn` in traits is not object-safe, so the engine holds an
//! [`AnyConnector`] and works with the [`AnySession`] it returns. Calling
//! through the concrete enums also keeps the returned futures `Send`, which
//! the engine needs to run triggers on spawned tasks.

use crate::client::{PjlinkConnector, PjlinkSession};
use crate::error::Result;
use crate::mock::{MockProjector, MockSession};
use crate::traits::{ProjectorConnector, ProjectorSession};

/// Enum wrapper for connector dispatch.
///
/// # Examples
///
/// ```
/// use mediactl_network::devices::AnyConnector;
/// use mediactl_network::PjlinkConnector;
///
/// let connector = AnyConnector::from(PjlinkConnector::default());
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AnyConnector {
    /// PJLink class 1 over TCP.
    Pjlink(PjlinkConnector),

    /// Mock projector for development and testing.
    Mock(MockProjector),
}

impl Default for AnyConnector {
    fn default() -> Self {
        Self::Pjlink(PjlinkConnector::default())
    }
}

impl ProjectorConnector for AnyConnector {
    type Session = AnySession;

    async fn connect(&self, address: &str, credential: Option<&str>) -> Result<AnySession> {
        match self {
            Self::Pjlink(connector) => connector
                .connect(address, credential)
                .await
                .map(AnySession::Pjlink),
            Self::Mock(connector) => connector
                .connect(address, credential)
                .await
                .map(AnySession::Mock),
        }
    }
}

impl From<PjlinkConnector> for AnyConnector {
    fn from(connector: PjlinkConnector) -> Self {
        Self::Pjlink(connector)
    }
}

impl From<MockProjector> for AnyConnector {
    fn from(connector: MockProjector) -> Self {
        Self::Mock(connector)
    }
}

/// Enum wrapper for session dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnySession {
    Pjlink(PjlinkSession),
    Mock(MockSession),
}

impl ProjectorSession for AnySession {
    async fn authenticate(&mut self) -> Result<()> {
        match self {
            Self::Pjlink(session) => session.authenticate().await,
            Self::Mock(session) => session.authenticate().await,
        }
    }

    async fn set_power(&mut self, on: bool) -> Result<()> {
        match self {
            Self::Pjlink(session) => session.set_power(on).await,
            Self::Mock(session) => session.set_power(on).await,
        }
    }

    async fn close(self) -> Result<()> {
        match self {
            Self::Pjlink(session) => session.close().await,
            Self::Mock(session) => session.close().await,
        }
    }
}
