//! Pin events published by a running controller.

use chrono::{DateTime, Utc};
use mediactl_core::PinId;
use std::fmt;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::trace;

/// Why a trigger was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefusalReason {
    /// The pin was already inside a trigger cycle.
    Busy,
    /// The pin was blocked after its start hook ran.
    Blocked,
}

impl fmt::Display for RefusalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefusalReason::Busy => write!(f, "busy"),
            RefusalReason::Blocked => write!(f, "blocked"),
        }
    }
}

/// Observable pin lifecycle event.
#[derive(Debug, Clone, PartialEq)]
pub enum PinEvent {
    /// Rising edge on an input.
    Pressed { pin: PinId },

    /// Falling edge on an input.
    Released { pin: PinId },

    /// Pin entered `active`.
    Activated {
        pin: PinId,
        source: PinId,
        at: DateTime<Utc>,
    },

    /// Pin left `active`.
    Deactivated { pin: PinId },

    /// Start hook aborted the trigger (debounce).
    Aborted { pin: PinId },

    /// Trigger was refused.
    Refused { pin: PinId, reason: RefusalReason },

    /// A remote command failed and was absorbed.
    RemoteFailed { pin: PinId, error: String },

    /// Reading an input failed; its sensing loop has stopped.
    SensorFailed { pin: PinId, error: String },
}

impl PinEvent {
    /// Pin the event is about.
    pub fn pin(&self) -> &PinId {
        match self {
            PinEvent::Pressed { pin }
            | PinEvent::Released { pin }
            | PinEvent::Activated { pin, .. }
            | PinEvent::Deactivated { pin }
            | PinEvent::Aborted { pin }
            | PinEvent::Refused { pin, .. }
            | PinEvent::RemoteFailed { pin, .. }
            | PinEvent::SensorFailed { pin, .. } => pin,
        }
    }
}

/// Non-blocking publisher for [`PinEvent`]s.
///
/// A full or closed channel drops the event; triggers never wait on
/// observers.
#[derive(Debug, Clone)]
pub(crate) struct EventSink {
    tx: mpsc::Sender<PinEvent>,
}

impl EventSink {
    pub(crate) fn new(tx: mpsc::Sender<PinEvent>) -> Self {
        Self { tx }
    }

    pub(crate) fn publish(&self, event: PinEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                trace!(pin = %event.pin(), "Event channel full, dropping event");
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> PinId {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_publish_delivers() {
        let (tx, mut rx) = mpsc::channel(4);
        let sink = EventSink::new(tx);

        sink.publish(PinEvent::Pressed { pin: id("I#17") });
        assert_eq!(rx.recv().await, Some(PinEvent::Pressed { pin: id("I#17") }));
    }

    #[tokio::test]
    async fn test_publish_drops_when_full() {
        let (tx, mut rx) = mpsc::channel(1);
        let sink = EventSink::new(tx);

        sink.publish(PinEvent::Pressed { pin: id("I#1") });
        sink.publish(PinEvent::Released { pin: id("I#1") });

        assert_eq!(rx.recv().await, Some(PinEvent::Pressed { pin: id("I#1") }));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_publish_after_close_is_silent() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        EventSink::new(tx).publish(PinEvent::Deactivated { pin: id("O#2") });
    }

    #[test]
    fn test_event_pin() {
        let event = PinEvent::Refused {
            pin: id("O#27"),
            reason: RefusalReason::Blocked,
        };
        assert_eq!(event.pin().as_str(), "O#27");
    }
}
