//! Output pin hooks.

use mediactl_core::TriggerMethod;
use mediactl_hardware::{GpioDriver, HardwareError, Level};
use std::time::Duration;
use tokio::time::sleep;
use tracing::trace;

use crate::engine::Engine;
use crate::error::Result;
use crate::pin::Pin;
use crate::trigger::TriggerContext;

/// Settings of an output pin.
#[derive(Debug, Clone, Default)]
pub(crate) struct OutputSettings {
    pub(crate) trigger_method: TriggerMethod,
    /// Only used by [`TriggerMethod::Hold`].
    pub(crate) hold_time: Duration,
}

fn line(pin: &Pin) -> Result<u32> {
    pin.line()
        .ok_or_else(|| HardwareError::other(format!("pin {} has no GPIO line", pin.id)).into())
}

/// Drive the line high, wait according to the trigger method, drive low.
pub(crate) async fn after_activate(
    engine: &Engine,
    pin: &Pin,
    settings: &OutputSettings,
    ctx: &TriggerContext,
) -> Result<()> {
    let line = line(pin)?;
    engine.gpio.write(line, Level::High).await?;

    match settings.trigger_method {
        TriggerMethod::Pulse => sleep(engine.timing.pulse_width).await,
        TriggerMethod::Hold => sleep(settings.hold_time).await,
        TriggerMethod::WhileUpstreamActive => {
            let source = engine.pin(ctx.source);
            while source.runtime.is_triggered() {
                trace!(pin = %pin.id, source = %source.id, "Upstream still active");
                sleep(engine.timing.upstream_poll_interval).await;
            }
        }
    }

    engine.gpio.write(line, Level::Low).await?;
    Ok(())
}

/// Drive the line low.
pub(crate) async fn before_deactivate(engine: &Engine, pin: &Pin) -> Result<()> {
    engine.gpio.write(line(pin)?, Level::Low).await?;
    Ok(())
}
