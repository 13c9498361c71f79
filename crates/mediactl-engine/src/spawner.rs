//! Task spawning capability used for fan-out.
//!
//! The trigger protocol never calls `tokio::spawn` directly. Fire-and-forget
//! work (sensing-loop triggers, input fan-out) goes through a [`Spawner`]
//! handed to [`Controller::start`](crate::Controller::start), so tests can
//! queue the work and run it at a point of their choosing.

use futures::future::{BoxFuture, join_all};
use std::sync::{Arc, Mutex, PoisonError};

/// Runs detached tasks.
pub trait Spawner: Send + Sync + 'static {
    /// Start `task` without waiting for it.
    fn spawn(&self, task: BoxFuture<'static, ()>);
}

/// Spawner backed by the ambient tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSpawner;

impl Spawner for TokioSpawner {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        tokio::spawn(task);
    }
}

impl Spawner for tokio::runtime::Handle {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        tokio::runtime::Handle::spawn(self, task);
    }
}

/// In-memory task queue.
///
/// Tasks are held until [`run_until_idle`](Self::run_until_idle) is awaited.
/// Clones share the same queue.
#[derive(Clone, Default)]
pub struct ManualSpawner {
    queue: Arc<Mutex<Vec<BoxFuture<'static, ()>>>>,
}

impl ManualSpawner {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued tasks.
    pub fn pending(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Run queued tasks concurrently, including tasks they queue, until the
    /// queue stays empty.
    pub async fn run_until_idle(&self) {
        loop {
            let batch: Vec<_> = self
                .queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .drain(..)
                .collect();
            if batch.is_empty() {
                return;
            }
            join_all(batch).await;
        }
    }
}

impl std::fmt::Debug for ManualSpawner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualSpawner")
            .field("pending", &self.pending())
            .finish()
    }
}

impl Spawner for ManualSpawner {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(task);
    }
}
