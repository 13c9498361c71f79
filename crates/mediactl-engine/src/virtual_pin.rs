//! Virtual pin hook: one remote power command per activation.
//!
//! Errors are returned to the trigger protocol, which absorbs them for this
//! kind (see [`FailurePolicy::Absorb`](crate::pin::FailurePolicy)).

use mediactl_core::RemoteAction;
use mediactl_network::{AnyConnector, ProjectorConnector, ProjectorSession, RemoteError};
use tracing::debug;

use crate::pin::Pin;

/// Settings of a virtual pin.
#[derive(Clone, Default)]
pub(crate) struct VirtualSettings {
    /// `host` or `host:port`.
    pub(crate) address: Option<String>,
    pub(crate) credential: Option<String>,
    pub(crate) action: RemoteAction,
}

impl std::fmt::Debug for VirtualSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualSettings")
            .field("address", &self.address)
            .field("credential", &self.credential.as_ref().map(|_| "***"))
            .field("action", &self.action)
            .finish()
    }
}

/// Connect, authenticate, send the power command and close the session.
///
/// No-op when the action is `none` or no address is set. The session is
/// closed even when authentication or the command fails.
pub(crate) async fn after_activate(
    connector: &AnyConnector,
    pin: &Pin,
    settings: &VirtualSettings,
) -> Result<(), RemoteError> {
    let Some(on) = settings.action.power() else {
        return Ok(());
    };
    let Some(address) = settings
        .address
        .as_deref()
        .filter(|address| !address.trim().is_empty())
    else {
        debug!(pin = %pin.id, "No remote address, skipping {}", settings.action);
        return Ok(());
    };

    let mut session = connector
        .connect(address, settings.credential.as_deref())
        .await?;

    let result = match session.authenticate().await {
        Ok(()) => session.set_power(on).await,
        Err(e) => Err(e),
    };
    let closed = session.close().await;

    result?;
    closed?;
    debug!(pin = %pin.id, address, action = %settings.action, "Remote command sent");
    Ok(())
}
