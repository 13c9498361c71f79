//! Pin records and their runtime flags.
//!
//! A [`Pin`] keeps the shared fields of every kind (identity, address,
//! label, block and unblock lists) and a [`PinVariant`] payload with the
//! kind-specific settings. Pins refer to each other by [`PinIndex`] into the
//! owning arena, never by pointer.
//!
//! Runtime flags live in [`PinRuntime`] and are atomics, so a frozen pin
//! graph can be shared by every trigger task without locks. Cross-pin
//! blocking is the only place two tasks write the same pin; holds and lifts
//! are counters, so overlapping scopes compose.

use mediactl_core::{PinAddress, PinId, PinKind, PinState, RemoteAction, TriggerMethod};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;
use tracing::debug;

use crate::input::InputSettings;
use crate::output::OutputSettings;
use crate::virtual_pin::VirtualSettings;

/// Position of a pin in the owning arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct PinIndex(pub(crate) usize);

/// Kind-specific settings.
#[derive(Debug, Clone)]
pub(crate) enum PinVariant {
    Input(InputSettings),
    Output(OutputSettings),
    Virtual(VirtualSettings),
}

/// How a kind treats errors raised by its activation hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailurePolicy {
    /// Finish the cycle, then return the error from `trigger`.
    Propagate,
    /// Log the error, publish it as an event and complete normally.
    Absorb,
}

/// A registered pin.
#[derive(Debug)]
pub struct Pin {
    pub(crate) id: PinId,
    pub(crate) address: PinAddress,
    pub(crate) display_name: String,
    pub(crate) pins_to_block: Vec<PinIndex>,
    pub(crate) pins_to_unblock: Vec<PinIndex>,
    pub(crate) variant: PinVariant,
    pub(crate) runtime: PinRuntime,
}

impl Pin {
    pub(crate) fn new(id: PinId, address: PinAddress, display_name: Option<&str>) -> Self {
        let variant = match id.kind() {
            PinKind::Input => PinVariant::Input(InputSettings::default()),
            PinKind::Output => PinVariant::Output(OutputSettings::default()),
            PinKind::Virtual => PinVariant::Virtual(VirtualSettings::default()),
        };
        let display_name = display_name
            .filter(|name| !name.is_empty())
            .map_or_else(|| id.to_string(), str::to_string);

        Self {
            id,
            address,
            display_name,
            pins_to_block: Vec::new(),
            pins_to_unblock: Vec::new(),
            variant,
            runtime: PinRuntime::default(),
        }
    }

    pub fn id(&self) -> &PinId {
        &self.id
    }

    pub fn kind(&self) -> PinKind {
        self.id.kind()
    }

    pub fn address(&self) -> PinAddress {
        self.address
    }

    /// GPIO line, `None` for virtual pins.
    pub fn line(&self) -> Option<u32> {
        self.address.line()
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PinState {
        self.runtime.state()
    }

    /// Sensed level latch of an input.
    pub fn is_triggered(&self) -> bool {
        self.runtime.is_triggered()
    }

    /// Resting blocked flag set by configuration.
    pub fn is_blocked_at_rest(&self) -> bool {
        self.runtime.resting_blocked.load(Ordering::SeqCst)
    }

    pub fn activation_delay(&self) -> Option<Duration> {
        match &self.variant {
            PinVariant::Input(settings) => Some(settings.activation_delay),
            _ => None,
        }
    }

    pub fn trigger_method(&self) -> Option<TriggerMethod> {
        match &self.variant {
            PinVariant::Output(settings) => Some(settings.trigger_method),
            _ => None,
        }
    }

    pub fn hold_time(&self) -> Option<Duration> {
        match &self.variant {
            PinVariant::Output(settings) => Some(settings.hold_time),
            _ => None,
        }
    }

    pub fn remote_address(&self) -> Option<&str> {
        match &self.variant {
            PinVariant::Virtual(settings) => settings.address.as_deref(),
            _ => None,
        }
    }

    pub fn remote_action(&self) -> Option<RemoteAction> {
        match &self.variant {
            PinVariant::Virtual(settings) => Some(settings.action),
            _ => None,
        }
    }

    pub(crate) fn failure_policy(&self) -> FailurePolicy {
        match self.variant {
            PinVariant::Virtual(_) => FailurePolicy::Absorb,
            PinVariant::Input(_) | PinVariant::Output(_) => FailurePolicy::Propagate,
        }
    }

    pub(crate) fn triggered_pins(&self) -> &[PinIndex] {
        match &self.variant {
            PinVariant::Input(settings) => &settings.triggered_pins,
            _ => &[],
        }
    }

    /// Drop every reference to `removed` and shift the indices above it.
    pub(crate) fn forget(&mut self, removed: PinIndex) {
        let remap = |list: &mut Vec<PinIndex>| {
            list.retain(|idx| *idx != removed);
            for idx in list.iter_mut() {
                if idx.0 > removed.0 {
                    idx.0 -= 1;
                }
            }
        };

        remap(&mut self.pins_to_block);
        remap(&mut self.pins_to_unblock);
        if let PinVariant::Input(settings) = &mut self.variant {
            remap(&mut settings.triggered_pins);
        }
    }
}

/// Runtime flags of one pin.
#[derive(Debug, Default)]
pub(crate) struct PinRuntime {
    in_flight: AtomicBool,
    active: AtomicBool,
    triggered: AtomicBool,
    pub(crate) resting_blocked: AtomicBool,
    holds: AtomicU32,
    lifts: AtomicU32,
}

impl PinRuntime {
    /// Claim the pin for one trigger cycle. `None` when a cycle is running.
    pub(crate) fn claim(&self) -> Option<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| InFlightGuard { runtime: self })
    }

    pub(crate) fn activate(&self) -> ActiveGuard<'_> {
        self.active.store(true, Ordering::SeqCst);
        ActiveGuard { runtime: self }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Effective blocked status. Scoped holds beat scoped lifts, which beat
    /// the resting flag.
    pub(crate) fn is_blocked(&self) -> bool {
        self.holds.load(Ordering::SeqCst) > 0
            || (self.resting_blocked.load(Ordering::SeqCst)
                && self.lifts.load(Ordering::SeqCst) == 0)
    }

    pub(crate) fn state(&self) -> PinState {
        if self.is_active() {
            PinState::Active
        } else if self.is_blocked() {
            PinState::Blocked
        } else {
            PinState::Inactive
        }
    }

    pub(crate) fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    pub(crate) fn set_triggered(&self, value: bool) {
        self.triggered.store(value, Ordering::SeqCst);
    }

    pub(crate) fn set_resting_blocked(&self, value: bool) {
        self.resting_blocked.store(value, Ordering::SeqCst);
    }
}

/// Releases the in-flight latch on drop.
#[derive(Debug)]
pub(crate) struct InFlightGuard<'a> {
    runtime: &'a PinRuntime,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.runtime.in_flight.store(false, Ordering::SeqCst);
    }
}

/// Clears the active flag on drop.
#[derive(Debug)]
pub(crate) struct ActiveGuard<'a> {
    runtime: &'a PinRuntime,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.runtime.active.store(false, Ordering::SeqCst);
    }
}

/// Block and unblock side effects of one activation.
///
/// Applied on construction, reversed exactly on drop.
#[derive(Debug)]
pub(crate) struct BlockScope<'a> {
    pins: &'a [Pin],
    owner: &'a PinId,
    blocked: &'a [PinIndex],
    unblocked: &'a [PinIndex],
}

impl<'a> BlockScope<'a> {
    pub(crate) fn apply(pins: &'a [Pin], owner: &'a Pin) -> Self {
        for idx in &owner.pins_to_block {
            let target = &pins[idx.0];
            target.runtime.holds.fetch_add(1, Ordering::SeqCst);
            debug!(pin = %target.id, by = %owner.id, "Pin blocked");
        }
        for idx in &owner.pins_to_unblock {
            let target = &pins[idx.0];
            target.runtime.lifts.fetch_add(1, Ordering::SeqCst);
            debug!(pin = %target.id, by = %owner.id, "Pin unblocked");
        }

        Self {
            pins,
            owner: &owner.id,
            blocked: &owner.pins_to_block,
            unblocked: &owner.pins_to_unblock,
        }
    }
}

impl Drop for BlockScope<'_> {
    fn drop(&mut self) {
        for idx in self.blocked {
            let target = &self.pins[idx.0];
            target.runtime.holds.fetch_sub(1, Ordering::SeqCst);
            debug!(pin = %target.id, by = %self.owner, "Block released");
        }
        for idx in self.unblocked {
            let target = &self.pins[idx.0];
            target.runtime.lifts.fetch_sub(1, Ordering::SeqCst);
            debug!(pin = %target.id, by = %self.owner, "Unblock released");
        }
    }
}
