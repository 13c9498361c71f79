//! Mock projector for testing and development.
//!
//! [`MockProjector`] accepts every address, records the calls made through
//! its sessions and can be told to fail at a chosen step.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

use crate::error::{RemoteError, Result};
use crate::traits::{ProjectorConnector, ProjectorSession};

/// A call observed by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Connect {
        address: String,
        credential: Option<String>,
    },
    Authenticate {
        address: String,
    },
    SetPower {
        address: String,
        on: bool,
    },
    Close {
        address: String,
    },
}

/// Step at which the mock fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Connect,
    Authenticate,
    SetPower,
}

#[derive(Debug, Default)]
struct MockProjectorState {
    calls: Vec<MockCall>,
    failure: Option<MockFailure>,
    latency: Duration,
}

fn lock(state: &Mutex<MockProjectorState>) -> MutexGuard<'_, MockProjectorState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Record a call and return the configured failure and latency for a step.
fn record(
    state: &Mutex<MockProjectorState>,
    call: MockCall,
    step: MockFailure,
) -> (Duration, Result<()>) {
    let mut state = lock(state);
    state.calls.push(call);
    let result = if state.failure == Some(step) {
        Err(match step {
            MockFailure::Connect => RemoteError::ConnectionTimeout(0),
            MockFailure::Authenticate => RemoteError::AuthenticationFailed,
            MockFailure::SetPower => RemoteError::ConnectionLost("simulated".to_string()),
        })
    } else {
        Ok(())
    };
    (state.latency, result)
}

/// Mock projector connector.
#[derive(Debug, Clone)]
pub struct MockProjector {
    state: Arc<Mutex<MockProjectorState>>,
}

impl MockProjector {
    /// Create a mock and the handle that inspects it.
    pub fn new() -> (Self, MockProjectorHandle) {
        let state = Arc::new(Mutex::new(MockProjectorState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockProjectorHandle { state },
        )
    }
}

impl Default for MockProjector {
    fn default() -> Self {
        Self::new().0
    }
}

impl ProjectorConnector for MockProjector {
    type Session = MockSession;

    async fn connect(&self, address: &str, credential: Option<&str>) -> Result<MockSession> {
        let call = MockCall::Connect {
            address: address.to_string(),
            credential: credential.map(str::to_string),
        };
        let (latency, result) = record(&self.state, call, MockFailure::Connect);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        result?;

        debug!(projector = %address, "Mock session opened");
        Ok(MockSession {
            address: address.to_string(),
            state: Arc::clone(&self.state),
        })
    }
}

/// Session produced by [`MockProjector`].
#[derive(Debug)]
pub struct MockSession {
    address: String,
    state: Arc<Mutex<MockProjectorState>>,
}

impl ProjectorSession for MockSession {
    async fn authenticate(&mut self) -> Result<()> {
        let call = MockCall::Authenticate {
            address: self.address.clone(),
        };
        let (latency, result) = record(&self.state, call, MockFailure::Authenticate);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        result
    }

    async fn set_power(&mut self, on: bool) -> Result<()> {
        let call = MockCall::SetPower {
            address: self.address.clone(),
            on,
        };
        let (latency, result) = record(&self.state, call, MockFailure::SetPower);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        result
    }

    async fn close(self) -> Result<()> {
        lock(&self.state).calls.push(MockCall::Close {
            address: self.address,
        });
        Ok(())
    }
}

/// Handle for inspecting and scripting a [`MockProjector`].
#[derive(Debug, Clone)]
pub struct MockProjectorHandle {
    state: Arc<Mutex<MockProjectorState>>,
}

impl MockProjectorHandle {
    /// Every call made so far, oldest first.
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.state).calls.clone()
    }

    /// Successful and failed power commands as `(address, on)`.
    pub fn power_commands(&self) -> Vec<(String, bool)> {
        lock(&self.state)
            .calls
            .iter()
            .filter_map(|call| match call {
                MockCall::SetPower { address, on } => Some((address.clone(), *on)),
                _ => None,
            })
            .collect()
    }

    /// Fail every subsequent call at `step`.
    pub fn fail_at(&self, step: MockFailure) {
        lock(&self.state).failure = Some(step);
    }

    /// Stop injecting failures.
    pub fn clear_failure(&self) {
        lock(&self.state).failure = None;
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        lock(&self.state).latency = latency;
    }
}
