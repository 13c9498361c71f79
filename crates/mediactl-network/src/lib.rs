//! Remote device control for virtual pins.
//!
//! This crate provides the projector collaborator used by virtual pins: a
//! scoped `connect -> authenticate -> set_power -> close` session over
//! PJLink class 1, and a mock for tests.
//!
//! # Components
//!
//! - **PjlinkCodec**: CR-terminated line framing for `tokio_util::codec::Framed`
//! - **PjlinkConnector / PjlinkSession**: TCP client with MD5 authentication
//! - **MockProjector**: call recorder with failure injection
//! - **AnyConnector / AnySession**: enum dispatch for runtime selection
//!
//! # Example
//!
//! ```no_run
//! use mediactl_network::{PjlinkConnector, ProjectorConnector, ProjectorSession};
//!
//! # async fn example() -> mediactl_network::Result<()> {
//! let connector = PjlinkConnector::default();
//! let mut session = connector.connect("192.168.1.50", Some("secret")).await?;
//! session.authenticate().await?;
//! session.set_power(true).await?;
//! session.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod devices;
pub mod error;
pub mod message;
pub mod mock;
pub mod traits;

mod client;

pub use client::{PjlinkConfig, PjlinkConnector, PjlinkSession, parse_target};
pub use codec::PjlinkCodec;
pub use devices::{AnyConnector, AnySession};
pub use error::{ProjectorErrorCode, RemoteError, Result};
pub use traits::{ProjectorConnector, ProjectorSession};
