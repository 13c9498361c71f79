//! The trigger protocol shared by every pin kind.
//!
//! One call runs a full cycle:
//!
//! 1. claim the in-flight latch (a second call while the pin is anywhere in
//!    its cycle returns [`TriggerOutcome::Busy`])
//! 2. start hook, which may delay and abort (input debounce)
//! 3. refuse if the pin is blocked
//! 4. apply the pin's block and unblock lists
//! 5. go `active`, run the activation hook
//! 6. go `inactive`, run the deactivation hook
//! 7. reverse step 4
//! 8. end hook
//!
//! Steps 6 to 8 run whatever the activation hook returned. The cycle's
//! guards are released on drop, so a trigger future that is dropped midway
//! still leaves the pin idle and the block topology restored.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

use crate::engine::Engine;
use crate::error::Result;
use crate::events::{PinEvent, RefusalReason};
use crate::pin::{BlockScope, FailurePolicy, Pin, PinIndex, PinVariant};
use crate::{input, output, virtual_pin};

/// Where a trigger came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TriggerOrigin {
    /// Rising edge seen by the sensing loop.
    Sensed,
    /// Explicit call through the controller handle.
    Manual,
    /// Fan-out from an input.
    FanOut,
}

/// Originating pin and time of a trigger.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TriggerContext {
    pub(crate) source: PinIndex,
    pub(crate) at: DateTime<Utc>,
    pub(crate) origin: TriggerOrigin,
}

impl TriggerContext {
    pub(crate) fn now(source: PinIndex, origin: TriggerOrigin) -> Self {
        Self {
            source,
            at: Utc::now(),
            origin,
        }
    }
}

/// How a trigger call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The pin ran a full active cycle.
    Completed,
    /// The pin was already inside a cycle; nothing happened.
    Busy,
    /// The start hook aborted (debounce); no side effects.
    Aborted,
    /// The pin was blocked after its start hook; no side effects.
    Blocked,
}

/// Decision of a start hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StartDecision {
    Proceed,
    Abort,
}

impl Engine {
    /// Run one trigger cycle on `idx`.
    ///
    /// # Errors
    ///
    /// Returns the first hardware error raised by an input or output hook,
    /// after the deactivation and block restoration steps have run. Virtual
    /// pins never fail.
    pub(crate) async fn trigger(
        self: &Arc<Self>,
        idx: PinIndex,
        ctx: TriggerContext,
    ) -> Result<TriggerOutcome> {
        let pin = self.pin(idx);

        let Some(_in_flight) = pin.runtime.claim() else {
            trace!(pin = %pin.id, "Trigger ignored, pin is busy");
            self.events.publish(PinEvent::Refused {
                pin: pin.id.clone(),
                reason: RefusalReason::Busy,
            });
            return Ok(TriggerOutcome::Busy);
        };

        if self.on_trigger_start(pin, &ctx).await == StartDecision::Abort {
            debug!(pin = %pin.id, "Trigger aborted, input released during activation delay");
            self.events.publish(PinEvent::Aborted {
                pin: pin.id.clone(),
            });
            return Ok(TriggerOutcome::Aborted);
        }

        if pin.runtime.is_blocked() {
            debug!(pin = %pin.id, "Trigger refused, pin is blocked");
            self.events.publish(PinEvent::Refused {
                pin: pin.id.clone(),
                reason: RefusalReason::Blocked,
            });
            return Ok(TriggerOutcome::Blocked);
        }

        let scope = BlockScope::apply(&self.pins, pin);

        let active = pin.runtime.activate();
        let source = &self.pin(ctx.source).id;
        info!(pin = %pin.id, source = %source, at = %ctx.at, "Pin activated");
        self.events.publish(PinEvent::Activated {
            pin: pin.id.clone(),
            source: source.clone(),
            at: ctx.at,
        });

        let activated = match (self.after_activate(idx, pin, &ctx).await, pin.failure_policy()) {
            (Err(e), FailurePolicy::Absorb) => {
                warn!(pin = %pin.id, error = %e, "Remote command failed");
                self.events.publish(PinEvent::RemoteFailed {
                    pin: pin.id.clone(),
                    error: e.to_string(),
                });
                Ok(())
            }
            (result, _) => result,
        };

        drop(active);
        let deactivated = self.before_deactivate(pin).await;
        info!(pin = %pin.id, "Pin deactivated");
        self.events.publish(PinEvent::Deactivated {
            pin: pin.id.clone(),
        });

        drop(scope);
        self.on_trigger_end(pin, &ctx);

        activated?;
        deactivated?;
        Ok(TriggerOutcome::Completed)
    }

    /// Start `trigger` on the spawner without waiting for it.
    pub(crate) fn spawn_trigger(self: &Arc<Self>, idx: PinIndex, ctx: TriggerContext) {
        let engine = Arc::clone(self);
        self.spawner.spawn(Box::pin(async move {
            if let Err(e) = engine.trigger(idx, ctx).await {
                error!(pin = %engine.pin(idx).id, error = %e, "Trigger failed");
            }
        }));
    }

    async fn on_trigger_start(&self, pin: &Pin, ctx: &TriggerContext) -> StartDecision {
        match &pin.variant {
            PinVariant::Input(settings) => input::on_trigger_start(pin, settings, ctx).await,
            PinVariant::Output(_) | PinVariant::Virtual(_) => StartDecision::Proceed,
        }
    }

    async fn after_activate(
        self: &Arc<Self>,
        idx: PinIndex,
        pin: &Pin,
        ctx: &TriggerContext,
    ) -> Result<()> {
        match &pin.variant {
            PinVariant::Input(settings) => {
                input::after_activate(self, idx, settings);
                Ok(())
            }
            PinVariant::Output(settings) => output::after_activate(self, pin, settings, ctx).await,
            PinVariant::Virtual(settings) => {
                virtual_pin::after_activate(&self.connector, pin, settings).await?;
                Ok(())
            }
        }
    }

    async fn before_deactivate(&self, pin: &Pin) -> Result<()> {
        match &pin.variant {
            PinVariant::Output(_) => output::before_deactivate(self, pin).await,
            PinVariant::Input(_) | PinVariant::Virtual(_) => Ok(()),
        }
    }

    fn on_trigger_end(&self, pin: &Pin, ctx: &TriggerContext) {
        trace!(pin = %pin.id, origin = ?ctx.origin, "Trigger cycle finished");
    }

    /// Falling edge of a sensed input. No kind reacts to it yet; outputs
    /// waiting on the line watch `is_triggered` instead.
    pub(crate) fn on_untrigger(&self, pin: &Pin) {
        trace!(pin = %pin.id, "Untriggered");
    }
}
