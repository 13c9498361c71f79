//! Controller lifecycle and the input sensing loop.
//!
//! A [`Controller`] wraps a [`PinRegistry`] together with the remote device
//! connector and the engine timing. [`Controller::start`] freezes the
//! registry, spawns one sensing task per input and returns a
//! [`ControllerHandle`] for events, manual triggers and shutdown.
//!
//! # Lifecycle
//!
//! 1. Create the controller (directly or from a [`MediaConfig`])
//! 2. Register and wire pins through [`Controller::registry_mut`]
//! 3. Call `start()` to begin sensing
//! 4. Consume [`PinEvent`]s from the handle
//! 5. `shutdown()` stops sensing, `release_hardware()` drives outputs low
//!    and releases every line
//!
//! # Examples
//!
//! ```no_run
//! use mediactl_config::MediaConfig;
//! use mediactl_engine::{Controller, TokioSpawner};
//! use mediactl_hardware::mock::MockGpio;
//! use mediactl_network::AnyConnector;
//!
//! #[tokio::main]
//! async fn main() -> mediactl_engine::Result<()> {
//!     let (gpio, _handle) = MockGpio::new();
//!     let config = MediaConfig::default();
//!
//!     let controller = Controller::from_config(gpio.into(), AnyConnector::default(), &config).await?;
//!     let mut handle = controller.start(TokioSpawner);
//!
//!     if let Some(event) = handle.recv().await {
//!         println!("{event:?}");
//!     }
//!
//!     handle.shutdown().await;
//!     handle.release_hardware().await
//! }
//! ```

use mediactl_config::MediaConfig;
use mediactl_core::{PinKind, PinState};
use mediactl_core::constants::EVENT_CHANNEL_CAPACITY;
use mediactl_hardware::{AnyGpio, GpioDriver, Level};
use mediactl_network::AnyConnector;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use crate::engine::Engine;
use crate::error::{EngineError, Result};
use crate::events::{EventSink, PinEvent};
use crate::pin::PinIndex;
use crate::registry::PinRegistry;
use crate::spawner::Spawner;
use crate::timing::EngineTiming;
use crate::trigger::{TriggerContext, TriggerOrigin, TriggerOutcome};

/// Pin controller before it starts.
#[derive(Debug)]
pub struct Controller {
    registry: PinRegistry,
    connector: AnyConnector,
    timing: EngineTiming,
}

impl Controller {
    /// Create a controller with an empty registry and default timing.
    pub fn new(gpio: AnyGpio, connector: AnyConnector) -> Self {
        Self {
            registry: PinRegistry::new(gpio),
            connector,
            timing: EngineTiming::default(),
        }
    }

    /// Create a controller and apply a configuration document.
    ///
    /// # Errors
    ///
    /// Returns the first registration or reference error; see
    /// [`PinRegistry::apply_config`].
    pub async fn from_config(
        gpio: AnyGpio,
        connector: AnyConnector,
        config: &MediaConfig,
    ) -> Result<Self> {
        let mut controller = Self::new(gpio, connector);
        controller.registry.apply_config(config).await?;
        Ok(controller)
    }

    /// Replace the engine timing.
    pub fn with_timing(mut self, timing: EngineTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn timing(&self) -> EngineTiming {
        self.timing
    }

    pub fn registry(&self) -> &PinRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut PinRegistry {
        &mut self.registry
    }

    /// Freeze the registry and start one sensing task per input.
    ///
    /// Must be called within a tokio runtime. Fan-out and sensed triggers
    /// run on `spawner`.
    pub fn start<S: Spawner>(self, spawner: S) -> ControllerHandle {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let PinRegistry {
            pins, index, gpio, ..
        } = self.registry;

        let engine = Arc::new(Engine {
            pins,
            index,
            gpio,
            connector: self.connector,
            timing: self.timing,
            events: EventSink::new(event_tx),
            spawner: Arc::new(spawner),
        });

        let mut tasks = JoinSet::new();
        for idx in engine.input_indices() {
            tasks.spawn(sense_input(Arc::clone(&engine), idx));
        }

        info!(
            pins = engine.pins.len(),
            inputs = tasks.len(),
            "Controller started"
        );

        ControllerHandle {
            engine,
            event_rx,
            tasks,
            stopped: false,
        }
    }
}

/// Handle to a started controller.
pub struct ControllerHandle {
    engine: Arc<Engine>,
    event_rx: mpsc::Receiver<PinEvent>,
    tasks: JoinSet<Result<()>>,
    stopped: bool,
}

impl ControllerHandle {
    /// Receive the next pin event.
    ///
    /// Returns `None` once every sender is gone, which only happens after
    /// the handle's engine and all trigger tasks are dropped.
    pub async fn recv(&mut self) -> Option<PinEvent> {
        self.event_rx.recv().await
    }

    /// Take an already published event without waiting.
    pub fn try_recv(&mut self) -> Option<PinEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Trigger a pin by hand and wait for its cycle to finish.
    ///
    /// The pin itself is recorded as the trigger source. Inputs skip the
    /// debounce check; downstream fan-out is not awaited.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Stopped` after shutdown, `UnknownPin` for an
    /// unknown id, or the hardware error of an input or output hook.
    pub async fn trigger(&self, id: &str) -> Result<TriggerOutcome> {
        if self.stopped {
            return Err(EngineError::Stopped);
        }
        let idx = self.engine.lookup(id)?;
        self.engine
            .trigger(idx, TriggerContext::now(idx, TriggerOrigin::Manual))
            .await
    }

    /// Current state of a pin.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::UnknownPin` for an unknown id.
    pub fn pin_state(&self, id: &str) -> Result<PinState> {
        let idx = self.engine.lookup(id)?;
        Ok(self.engine.pin(idx).state())
    }

    /// Sensed level latch of a pin.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::UnknownPin` for an unknown id.
    pub fn is_triggered(&self, id: &str) -> Result<bool> {
        let idx = self.engine.lookup(id)?;
        Ok(self.engine.pin(idx).is_triggered())
    }

    /// Number of sensing tasks still owned by the handle.
    pub fn sensing_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Stop every sensing loop.
    ///
    /// Triggers already running are left alone and finish on their own.
    /// Manual triggers are refused afterwards.
    pub async fn shutdown(&mut self) {
        self.stopped = true;
        self.tasks.abort_all();

        let mut error_count = 0;
        let mut panic_count = 0;

        while let Some(result) = self.tasks.join_next().await {
            match classify_task_result(result) {
                TaskTermination::Success | TaskTermination::Cancelled => {}
                TaskTermination::Error => error_count += 1,
                TaskTermination::Panic => panic_count += 1,
            }
        }

        info!(
            errors = error_count,
            panics = panic_count,
            "Controller stopped"
        );
    }

    /// Drive every output low and release every physical line.
    ///
    /// Continues past failures.
    ///
    /// # Errors
    ///
    /// Returns the first hardware error encountered.
    pub async fn release_hardware(mut self) -> Result<()> {
        if !self.stopped {
            self.shutdown().await;
        }

        let mut first_error = None;
        let gpio = &self.engine.gpio;

        for pin in &self.engine.pins {
            let Some(line) = pin.line() else {
                continue;
            };

            if pin.kind() == PinKind::Output
                && let Err(e) = gpio.write(line, Level::Low).await
            {
                warn!(pin = %pin.id, error = %e, "Failed to drive output low");
                first_error.get_or_insert(e);
            }
            if let Err(e) = gpio.cleanup(line).await {
                warn!(pin = %pin.id, error = %e, "Failed to release line");
                first_error.get_or_insert(e);
            }
        }

        info!("Hardware released");
        first_error.map_or(Ok(()), |e| Err(e.into()))
    }
}

impl std::fmt::Debug for ControllerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerHandle")
            .field("engine", &self.engine)
            .field("sensing_tasks", &self.tasks.len())
            .field("stopped", &self.stopped)
            .finish()
    }
}

/// Task termination classification for shutdown handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskTermination {
    Success,
    Error,
    /// Aborted by shutdown.
    Cancelled,
    Panic,
}

fn classify_task_result(
    result: std::result::Result<Result<()>, tokio::task::JoinError>,
) -> TaskTermination {
    match result {
        Ok(Ok(())) => TaskTermination::Success,
        Ok(Err(_)) => TaskTermination::Error,
        Err(e) if e.is_cancelled() => TaskTermination::Cancelled,
        Err(_) => TaskTermination::Panic,
    }
}

/// Poll one input and turn level edges into triggers.
///
/// Runs until aborted. A read failure publishes `SensorFailed` and ends the
/// loop for this input only.
async fn sense_input(engine: Arc<Engine>, idx: PinIndex) -> Result<()> {
    let pin = engine.pin(idx);
    let Some(line) = pin.line() else {
        return Ok(());
    };

    let mut ticker = interval(engine.timing.sense_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let level = match engine.gpio.read(line).await {
            Ok(level) => level,
            Err(e) => {
                error!(pin = %pin.id, error = %e, "Failed to read input, sensing stopped");
                engine.events.publish(PinEvent::SensorFailed {
                    pin: pin.id.clone(),
                    error: e.to_string(),
                });
                return Err(e.into());
            }
        };

        match (level.is_high(), pin.runtime.is_triggered()) {
            (true, false) => {
                pin.runtime.set_triggered(true);
                debug!(pin = %pin.id, "Rising edge");
                engine.events.publish(PinEvent::Pressed {
                    pin: pin.id.clone(),
                });
                engine.spawn_trigger(idx, TriggerContext::now(idx, TriggerOrigin::Sensed));
            }
            (false, true) => {
                pin.runtime.set_triggered(false);
                debug!(pin = %pin.id, "Falling edge");
                engine.on_untrigger(pin);
                engine.events.publish(PinEvent::Released {
                    pin: pin.id.clone(),
                });
            }
            _ => {}
        }
    }
}
