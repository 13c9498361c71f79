//! Remote device control traits.
//!
//! A virtual pin controls its device through a scoped session:
//!
//! ```text
//! connect(address, credential) -> session
//!     session.authenticate()
//!     session.set_power(on)
//!     session.close()
//! ```
//!
//! Native `async fn` in traits is not object-safe; use
//! [`AnyConnector`](crate::devices::AnyConnector) for runtime selection.

#![allow(async_fn_in_trait)]

use crate::error::Result;

/// Opens sessions to remote projectors.
///
/// # Examples
///
/// ```
/// use mediactl_network::mock::MockProjector;
/// use mediactl_network::traits::{ProjectorConnector, ProjectorSession};
///
/// #[tokio::main]
/// async fn main() -> mediactl_network::Result<()> {
///     let (projector, handle) = MockProjector::new();
///
///     let mut session = projector.connect("192.168.1.50", None).await?;
///     session.authenticate().await?;
///     session.set_power(true).await?;
///     session.close().await?;
///
///     assert_eq!(handle.power_commands(), vec![("192.168.1.50".to_string(), true)]);
///     Ok(())
/// }
/// ```
pub trait ProjectorConnector: Send + Sync {
    /// Session type produced by this connector.
    type Session: ProjectorSession;

    /// Open a session to the projector at `address` (`host` or `host:port`).
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid, the connection cannot be
    /// established in time, or the projector greeting is malformed.
    async fn connect(&self, address: &str, credential: Option<&str>) -> Result<Self::Session>;
}

/// An open projector session.
pub trait ProjectorSession: Send {
    /// Authenticate the session.
    ///
    /// A no-op for projectors that do not require authentication.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationRequired`](crate::RemoteError::AuthenticationRequired)
    /// when a password is needed but none was given, and
    /// [`AuthenticationFailed`](crate::RemoteError::AuthenticationFailed) when
    /// the projector rejects it.
    async fn authenticate(&mut self) -> Result<()>;

    /// Switch the projector on or off.
    ///
    /// # Errors
    ///
    /// Returns an error on timeout, connection loss or a projector error code.
    async fn set_power(&mut self, on: bool) -> Result<()>;

    /// Close the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be shut down cleanly.
    async fn close(self) -> Result<()>
    where
        Self: Sized;
}
