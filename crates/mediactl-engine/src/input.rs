//! Input pin hooks.
//!
//! An input optionally waits `activation_delay` before it activates. When
//! the trigger came from the sensing loop and the line was released during
//! the wait, the trigger is aborted, so pulses shorter than the delay never
//! fan out. Activation starts an independent trigger on every pin in
//! `triggered_pins` and returns without waiting for them.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::engine::Engine;
use crate::pin::{Pin, PinIndex};
use crate::trigger::{StartDecision, TriggerContext, TriggerOrigin};

/// Settings of an input pin.
#[derive(Debug, Clone, Default)]
pub(crate) struct InputSettings {
    pub(crate) activation_delay: Duration,
    pub(crate) triggered_pins: Vec<PinIndex>,
}

pub(crate) async fn on_trigger_start(
    pin: &Pin,
    settings: &InputSettings,
    ctx: &TriggerContext,
) -> StartDecision {
    if settings.activation_delay.is_zero() {
        return StartDecision::Proceed;
    }

    tokio::time::sleep(settings.activation_delay).await;

    if ctx.origin == TriggerOrigin::Sensed && !pin.runtime.is_triggered() {
        StartDecision::Abort
    } else {
        StartDecision::Proceed
    }
}

pub(crate) fn after_activate(engine: &Arc<Engine>, idx: PinIndex, settings: &InputSettings) {
    let ctx = TriggerContext::now(idx, TriggerOrigin::FanOut);

    for target in &settings.triggered_pins {
        debug!(
            pin = %engine.pin(idx).id,
            target = %engine.pin(*target).id,
            "Fan-out trigger"
        );
        engine.spawn_trigger(*target, ctx);
    }
}
