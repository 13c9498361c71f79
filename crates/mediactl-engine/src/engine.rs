//! Frozen pin graph shared by every running task.

use mediactl_core::{PinId, PinKind};
use mediactl_hardware::AnyGpio;
use mediactl_network::AnyConnector;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{EngineError, Result};
use crate::events::EventSink;
use crate::pin::{Pin, PinIndex};
use crate::spawner::Spawner;
use crate::timing::EngineTiming;

/// Pins, collaborators and timing of a started controller.
///
/// Built once from a registry when the controller starts and never
/// reshaped afterwards; only pin runtime flags change.
pub(crate) struct Engine {
    pub(crate) pins: Vec<Pin>,
    pub(crate) index: HashMap<PinId, PinIndex>,
    pub(crate) gpio: AnyGpio,
    pub(crate) connector: AnyConnector,
    pub(crate) timing: EngineTiming,
    pub(crate) events: EventSink,
    pub(crate) spawner: Arc<dyn Spawner>,
}

impl Engine {
    pub(crate) fn pin(&self, idx: PinIndex) -> &Pin {
        &self.pins[idx.0]
    }

    pub(crate) fn lookup(&self, id: &str) -> Result<PinIndex> {
        id.parse::<PinId>()
            .ok()
            .and_then(|id| self.index.get(&id).copied())
            .ok_or_else(|| EngineError::UnknownPin(id.to_string()))
    }

    pub(crate) fn input_indices(&self) -> impl Iterator<Item = PinIndex> + '_ {
        self.pins
            .iter()
            .enumerate()
            .filter(|(_, pin)| pin.kind() == PinKind::Input)
            .map(|(n, _)| PinIndex(n))
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("pins", &self.pins.len())
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}
