//! Pin registry: the mutable phase before the controller starts.
//!
//! The registry owns every [`Pin`] in an arena keyed by [`PinId`]. Pins are
//! registered first, relationships are wired afterwards by id. Starting a
//! [`Controller`](crate::Controller) freezes the arena into the shared
//! engine, after which the topology can no longer change.
//!
//! # Examples
//!
//! ```
//! use mediactl_core::{PinKind, TriggerMethod};
//! use mediactl_engine::PinRegistry;
//! use mediactl_hardware::mock::MockGpio;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> mediactl_engine::Result<()> {
//!     let (gpio, _handle) = MockGpio::new();
//!     let mut registry = PinRegistry::new(gpio.into());
//!
//!     let button = registry.register_pin(PinKind::Input, 17, Some("Stage button")).await?;
//!     let lamp = registry.register_pin(PinKind::Output, 27, None).await?;
//!
//!     registry.add_triggered_pin(button.as_str(), lamp.as_str())?;
//!     registry.set_trigger_method(lamp.as_str(), TriggerMethod::Hold)?;
//!     registry.set_hold_time(lamp.as_str(), Duration::from_secs(3))?;
//!
//!     assert_eq!(registry.triggered_pins(button.as_str())?, vec![lamp]);
//!     Ok(())
//! }
//! ```

use mediactl_config::Project;
use mediactl_core::{PinAddress, PinId, PinKind, RemoteAction, TriggerMethod};
use mediactl_hardware::{AnyGpio, Direction, GpioDriver};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{EngineError, Result};
use crate::input::InputSettings;
use crate::output::OutputSettings;
use crate::pin::{Pin, PinIndex, PinVariant};
use crate::virtual_pin::VirtualSettings;

/// Owner of all pins before the controller starts.
#[derive(Debug)]
pub struct PinRegistry {
    pub(crate) pins: Vec<Pin>,
    pub(crate) index: HashMap<PinId, PinIndex>,
    pub(crate) gpio: AnyGpio,
    pub(crate) project: Project,
}

impl PinRegistry {
    /// Create an empty registry bound to a GPIO backend.
    pub fn new(gpio: AnyGpio) -> Self {
        Self {
            pins: Vec::new(),
            index: HashMap::new(),
            gpio,
            project: Project::default(),
        }
    }

    /// Project metadata carried through configuration export.
    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn set_project(&mut self, project: Project) {
        self.project = project;
    }

    // Registration

    /// Register a pin and set up its GPIO line.
    ///
    /// Physical pins take a non-negative line number, virtual pins a
    /// negative placeholder. The id is derived from kind and address
    /// (`I#17`, `O#27`, `V#1`).
    ///
    /// # Errors
    ///
    /// Returns an error if the address does not fit the kind, the id is
    /// taken, another physical pin uses the same line, or the line cannot
    /// be set up.
    pub async fn register_pin(
        &mut self,
        kind: PinKind,
        address: i32,
        display_name: Option<&str>,
    ) -> Result<PinId> {
        let address = PinAddress::new(kind, address)?;
        let id = PinId::derive(kind, address);

        if self.index.contains_key(&id) {
            return Err(EngineError::DuplicatePin(id));
        }
        if let Some(line) = address.line()
            && let Some(other) = self
                .pins
                .iter()
                .find(|pin| pin.line() == Some(line))
        {
            return Err(EngineError::AddressInUse {
                address: address.as_i32(),
                id: other.id.clone(),
            });
        }

        match (kind, address.line()) {
            (PinKind::Input, Some(line)) => self.gpio.setup(line, Direction::InputPullDown).await?,
            (PinKind::Output, Some(line)) => self.gpio.setup(line, Direction::Output).await?,
            _ => {}
        }

        let pin = Pin::new(id.clone(), address, display_name);
        info!(pin = %id, %address, name = %pin.display_name, "Pin registered");

        self.index.insert(id.clone(), PinIndex(self.pins.len()));
        self.pins.push(pin);
        Ok(id)
    }

    /// Remove a pin, every reference to it, and release its GPIO line.
    ///
    /// # Errors
    ///
    /// Returns an error if the pin is unknown or the line cannot be released.
    /// The pin is removed from the registry in either case.
    pub async fn unregister_pin(&mut self, id: &str) -> Result<()> {
        let idx = self.lookup(id)?;
        let pin = self.pins.remove(idx.0);

        for other in &mut self.pins {
            other.forget(idx);
        }
        self.index = self
            .pins
            .iter()
            .enumerate()
            .map(|(n, p)| (p.id.clone(), PinIndex(n)))
            .collect();

        info!(pin = %pin.id, "Pin unregistered");

        if let Some(line) = pin.line() {
            self.gpio.cleanup(line).await?;
        }
        Ok(())
    }

    // Queries

    pub fn get_pin_by_id(&self, id: &str) -> Option<&Pin> {
        self.lookup(id).ok().map(|idx| &self.pins[idx.0])
    }

    /// Pin with the given raw address (line number or virtual placeholder).
    pub fn get_pin_by_gpio(&self, address: i32) -> Option<&Pin> {
        self.pins.iter().find(|pin| pin.address.as_i32() == address)
    }

    pub fn pins(&self) -> impl Iterator<Item = &Pin> {
        self.pins.iter()
    }

    pub fn input_pins(&self) -> impl Iterator<Item = &Pin> {
        self.pins_of(PinKind::Input)
    }

    pub fn output_pins(&self) -> impl Iterator<Item = &Pin> {
        self.pins_of(PinKind::Output)
    }

    pub fn virtual_pins(&self) -> impl Iterator<Item = &Pin> {
        self.pins_of(PinKind::Virtual)
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    /// Ids an input fans out to.
    ///
    /// # Errors
    ///
    /// Returns an error if the pin is unknown.
    pub fn triggered_pins(&self, id: &str) -> Result<Vec<PinId>> {
        let pin = self.pin(id)?;
        Ok(self.ids(pin.triggered_pins()))
    }

    /// Ids blocked while the pin is active.
    ///
    /// # Errors
    ///
    /// Returns an error if the pin is unknown.
    pub fn pins_to_block(&self, id: &str) -> Result<Vec<PinId>> {
        Ok(self.ids(&self.pin(id)?.pins_to_block))
    }

    /// Ids unblocked while the pin is active.
    ///
    /// # Errors
    ///
    /// Returns an error if the pin is unknown.
    pub fn pins_to_unblock(&self, id: &str) -> Result<Vec<PinId>> {
        Ok(self.ids(&self.pin(id)?.pins_to_unblock))
    }

    // Relationship editing

    /// Make an input trigger an output or virtual pin. Adding an existing
    /// target again has no effect.
    ///
    /// # Errors
    ///
    /// Returns an error if either pin is unknown or of the wrong kind.
    pub fn add_triggered_pin(&mut self, source: &str, target: &str) -> Result<()> {
        let source_idx = self.lookup(source)?;
        let target_idx = self.lookup(target)?;
        self.link_triggered(source_idx, target_idx)
    }

    /// # Errors
    ///
    /// Returns an error if either pin is unknown or the source is not an input.
    pub fn remove_triggered_pin(&mut self, source: &str, target: &str) -> Result<()> {
        let target_idx = self.lookup(target)?;
        let settings = self.input_settings_mut(source)?;
        settings.triggered_pins.retain(|idx| *idx != target_idx);
        Ok(())
    }

    /// Block `target` while `source` is active.
    ///
    /// # Errors
    ///
    /// Returns an error if either pin is unknown.
    pub fn add_block_pin(&mut self, source: &str, target: &str) -> Result<()> {
        let source_idx = self.lookup(source)?;
        let target_idx = self.lookup(target)?;
        push_unique(&mut self.pins[source_idx.0].pins_to_block, target_idx);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if either pin is unknown.
    pub fn remove_block_pin(&mut self, source: &str, target: &str) -> Result<()> {
        let source_idx = self.lookup(source)?;
        let target_idx = self.lookup(target)?;
        self.pins[source_idx.0]
            .pins_to_block
            .retain(|idx| *idx != target_idx);
        Ok(())
    }

    /// Unblock `target` while `source` is active.
    ///
    /// # Errors
    ///
    /// Returns an error if either pin is unknown.
    pub fn add_unblock_pin(&mut self, source: &str, target: &str) -> Result<()> {
        let source_idx = self.lookup(source)?;
        let target_idx = self.lookup(target)?;
        push_unique(&mut self.pins[source_idx.0].pins_to_unblock, target_idx);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if either pin is unknown.
    pub fn remove_unblock_pin(&mut self, source: &str, target: &str) -> Result<()> {
        let source_idx = self.lookup(source)?;
        let target_idx = self.lookup(target)?;
        self.pins[source_idx.0]
            .pins_to_unblock
            .retain(|idx| *idx != target_idx);
        Ok(())
    }

    // Settings

    /// Set the label. An empty name resets it to the id.
    ///
    /// # Errors
    ///
    /// Returns an error if the pin is unknown.
    pub fn set_display_name(&mut self, id: &str, name: &str) -> Result<()> {
        let idx = self.lookup(id)?;
        let pin = &mut self.pins[idx.0];
        pin.display_name = if name.is_empty() {
            pin.id.to_string()
        } else {
            name.to_string()
        };
        Ok(())
    }

    /// Set the resting blocked flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the pin is unknown.
    pub fn set_blocked(&mut self, id: &str, blocked: bool) -> Result<()> {
        self.pin(id)?.runtime.set_resting_blocked(blocked);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the pin is unknown or not an input.
    pub fn set_activation_delay(&mut self, id: &str, delay: Duration) -> Result<()> {
        self.input_settings_mut(id)?.activation_delay = delay;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the pin is unknown or not an output.
    pub fn set_trigger_method(&mut self, id: &str, method: TriggerMethod) -> Result<()> {
        self.output_settings_mut(id)?.trigger_method = method;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the pin is unknown or not an output.
    pub fn set_hold_time(&mut self, id: &str, hold_time: Duration) -> Result<()> {
        self.output_settings_mut(id)?.hold_time = hold_time;
        Ok(())
    }

    /// Set the remote address (`host` or `host:port`) of a virtual pin.
    ///
    /// # Errors
    ///
    /// Returns an error if the pin is unknown or not virtual.
    pub fn set_remote_address(&mut self, id: &str, address: Option<&str>) -> Result<()> {
        self.virtual_settings_mut(id)?.address = address.map(str::to_string);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the pin is unknown or not virtual.
    pub fn set_credential(&mut self, id: &str, credential: Option<&str>) -> Result<()> {
        self.virtual_settings_mut(id)?.credential = credential.map(str::to_string);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the pin is unknown or not virtual.
    pub fn set_remote_action(&mut self, id: &str, action: RemoteAction) -> Result<()> {
        self.virtual_settings_mut(id)?.action = action;
        Ok(())
    }

    // Internals

    pub(crate) fn lookup(&self, id: &str) -> Result<PinIndex> {
        id.parse::<PinId>()
            .ok()
            .and_then(|id| self.index.get(&id).copied())
            .ok_or_else(|| EngineError::UnknownPin(id.to_string()))
    }

    fn pin(&self, id: &str) -> Result<&Pin> {
        self.lookup(id).map(|idx| &self.pins[idx.0])
    }

    pub(crate) fn ids(&self, list: &[PinIndex]) -> Vec<PinId> {
        list.iter().map(|idx| self.pins[idx.0].id.clone()).collect()
    }

    fn pins_of(&self, kind: PinKind) -> impl Iterator<Item = &Pin> {
        self.pins.iter().filter(move |pin| pin.kind() == kind)
    }

    pub(crate) fn link_triggered(&mut self, source: PinIndex, target: PinIndex) -> Result<()> {
        let target_pin = &self.pins[target.0];
        if !target_pin.kind().is_triggerable() {
            return Err(EngineError::wrong_kind(&target_pin.id, "output or virtual"));
        }
        let target_id = target_pin.id.clone();

        let source_pin = &mut self.pins[source.0];
        match &mut source_pin.variant {
            PinVariant::Input(settings) => {
                push_unique(&mut settings.triggered_pins, target);
                debug!(pin = %source_pin.id, target = %target_id, "Trigger link added");
                Ok(())
            }
            _ => Err(EngineError::wrong_kind(&source_pin.id, "input")),
        }
    }

    fn input_settings_mut(&mut self, id: &str) -> Result<&mut InputSettings> {
        let idx = self.lookup(id)?;
        let pin = &mut self.pins[idx.0];
        match &mut pin.variant {
            PinVariant::Input(settings) => Ok(settings),
            _ => Err(EngineError::wrong_kind(&pin.id, "input")),
        }
    }

    fn output_settings_mut(&mut self, id: &str) -> Result<&mut OutputSettings> {
        let idx = self.lookup(id)?;
        let pin = &mut self.pins[idx.0];
        match &mut pin.variant {
            PinVariant::Output(settings) => Ok(settings),
            _ => Err(EngineError::wrong_kind(&pin.id, "output")),
        }
    }

    fn virtual_settings_mut(&mut self, id: &str) -> Result<&mut VirtualSettings> {
        let idx = self.lookup(id)?;
        let pin = &mut self.pins[idx.0];
        match &mut pin.variant {
            PinVariant::Virtual(settings) => Ok(settings),
            _ => Err(EngineError::wrong_kind(&pin.id, "virtual")),
        }
    }
}

pub(crate) fn push_unique(list: &mut Vec<PinIndex>, idx: PinIndex) {
    if !list.contains(&idx) {
        list.push(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediactl_core::PinState;
    use mediactl_hardware::mock::{MockGpio, MockGpioHandle};
    use rstest::rstest;

    fn registry() -> (PinRegistry, MockGpioHandle) {
        let (gpio, handle) = MockGpio::new();
        (PinRegistry::new(gpio.into()), handle)
    }

    #[tokio::test]
    async fn test_register_sets_up_lines() {
        let (mut registry, handle) = registry();

        let input = registry.register_pin(PinKind::Input, 17, None).await.unwrap();
        let output = registry.register_pin(PinKind::Output, 27, None).await.unwrap();
        let remote = registry.register_pin(PinKind::Virtual, -1, None).await.unwrap();

        assert_eq!(input.as_str(), "I#17");
        assert_eq!(output.as_str(), "O#27");
        assert_eq!(remote.as_str(), "V#1");
        assert_eq!(handle.direction(17), Some(Direction::InputPullDown));
        assert_eq!(handle.direction(27), Some(Direction::Output));
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.input_pins().count(), 1);
        assert_eq!(registry.virtual_pins().count(), 1);
    }

    #[rstest]
    #[case(PinKind::Input, -3)]
    #[case(PinKind::Output, -1)]
    #[case(PinKind::Virtual, 0)]
    #[case(PinKind::Virtual, 4)]
    #[case(PinKind::Virtual, i32::MIN)]
    #[tokio::test]
    async fn test_register_rejects_invalid_address(#[case] kind: PinKind, #[case] address: i32) {
        let (mut registry, _) = registry();
        let error = registry.register_pin(kind, address, None).await.unwrap_err();
        assert!(matches!(error, EngineError::Core(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_shared_lines() {
        let (mut registry, _) = registry();
        registry.register_pin(PinKind::Input, 5, None).await.unwrap();

        let duplicate = registry.register_pin(PinKind::Input, 5, None).await.unwrap_err();
        assert!(matches!(duplicate, EngineError::DuplicatePin(_)));

        let shared = registry.register_pin(PinKind::Output, 5, None).await.unwrap_err();
        assert!(matches!(shared, EngineError::AddressInUse { address: 5, .. }));
    }

    #[tokio::test]
    async fn test_register_surfaces_setup_failure() {
        let (mut registry, handle) = registry();
        handle.fail(9);

        let error = registry.register_pin(PinKind::Output, 9, None).await.unwrap_err();
        assert!(matches!(error, EngineError::Hardware(_)));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_queries() {
        let (mut registry, _) = registry();
        registry.register_pin(PinKind::Input, 17, Some("Button")).await.unwrap();
        registry.register_pin(PinKind::Virtual, -2, None).await.unwrap();

        let pin = registry.get_pin_by_id("I#17").unwrap();
        assert_eq!(pin.display_name(), "Button");
        assert_eq!(pin.state(), PinState::Inactive);

        assert_eq!(registry.get_pin_by_gpio(-2).unwrap().id().as_str(), "V#2");
        assert!(registry.get_pin_by_gpio(3).is_none());
        assert!(registry.get_pin_by_id("garbage").is_none());
    }

    #[tokio::test]
    async fn test_triggered_pin_kinds() {
        let (mut registry, _) = registry();
        registry.register_pin(PinKind::Input, 1, None).await.unwrap();
        registry.register_pin(PinKind::Input, 2, None).await.unwrap();
        registry.register_pin(PinKind::Output, 3, None).await.unwrap();

        let error = registry.add_triggered_pin("I#1", "I#2").unwrap_err();
        assert!(matches!(error, EngineError::WrongKind { .. }));

        let error = registry.add_triggered_pin("O#3", "O#3").unwrap_err();
        assert!(matches!(error, EngineError::WrongKind { .. }));

        registry.add_triggered_pin("I#1", "O#3").unwrap();
        registry.add_triggered_pin("I#1", "O#3").unwrap();
        assert_eq!(registry.triggered_pins("I#1").unwrap().len(), 1);

        registry.remove_triggered_pin("I#1", "O#3").unwrap();
        assert!(registry.triggered_pins("I#1").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_block_lists() {
        let (mut registry, _) = registry();
        registry.register_pin(PinKind::Output, 1, None).await.unwrap();
        registry.register_pin(PinKind::Output, 2, None).await.unwrap();

        registry.add_block_pin("O#1", "O#2").unwrap();
        registry.add_unblock_pin("O#2", "O#1").unwrap();
        assert_eq!(registry.pins_to_block("O#1").unwrap()[0].as_str(), "O#2");
        assert_eq!(registry.pins_to_unblock("O#2").unwrap()[0].as_str(), "O#1");

        registry.remove_block_pin("O#1", "O#2").unwrap();
        registry.remove_unblock_pin("O#2", "O#1").unwrap();
        assert!(registry.pins_to_block("O#1").unwrap().is_empty());
        assert!(registry.pins_to_unblock("O#2").unwrap().is_empty());

        let error = registry.add_block_pin("O#1", "O#9").unwrap_err();
        assert!(matches!(error, EngineError::UnknownPin(_)));
    }

    #[tokio::test]
    async fn test_unregister_removes_references_and_cleans_up() {
        let (mut registry, handle) = registry();
        registry.register_pin(PinKind::Input, 1, None).await.unwrap();
        registry.register_pin(PinKind::Output, 2, None).await.unwrap();
        registry.register_pin(PinKind::Output, 3, None).await.unwrap();
        registry.add_triggered_pin("I#1", "O#2").unwrap();
        registry.add_triggered_pin("I#1", "O#3").unwrap();
        registry.add_block_pin("O#3", "O#2").unwrap();

        registry.unregister_pin("O#2").await.unwrap();

        assert_eq!(handle.cleaned_up(), vec![2]);
        assert!(registry.get_pin_by_id("O#2").is_none());
        let triggered = registry.triggered_pins("I#1").unwrap();
        assert_eq!(triggered.len(), 1);
        assert_eq!(triggered[0].as_str(), "O#3");
        assert!(registry.pins_to_block("O#3").unwrap().is_empty());
        assert_eq!(registry.get_pin_by_id("O#3").unwrap().id().as_str(), "O#3");
    }

    #[tokio::test]
    async fn test_settings_check_kind() {
        let (mut registry, _) = registry();
        registry.register_pin(PinKind::Input, 1, None).await.unwrap();
        registry.register_pin(PinKind::Virtual, -1, None).await.unwrap();

        registry.set_activation_delay("I#1", Duration::from_millis(250)).unwrap();
        registry.set_remote_address("V#1", Some("10.0.0.5")).unwrap();
        registry.set_remote_action("V#1", RemoteAction::PowerOff).unwrap();
        registry.set_display_name("V#1", "Beamer").unwrap();

        let remote = registry.get_pin_by_id("V#1").unwrap();
        assert_eq!(remote.remote_address(), Some("10.0.0.5"));
        assert_eq!(remote.remote_action(), Some(RemoteAction::PowerOff));
        assert_eq!(remote.display_name(), "Beamer");
        assert_eq!(
            registry.get_pin_by_id("I#1").unwrap().activation_delay(),
            Some(Duration::from_millis(250))
        );

        assert!(registry.set_hold_time("I#1", Duration::ZERO).is_err());
        assert!(registry.set_credential("I#1", Some("x")).is_err());
        assert!(registry.set_activation_delay("V#1", Duration::ZERO).is_err());
    }

    #[tokio::test]
    async fn test_resting_blocked_flag() {
        let (mut registry, _) = registry();
        registry.register_pin(PinKind::Output, 4, None).await.unwrap();

        registry.set_blocked("O#4", true).unwrap();
        let pin = registry.get_pin_by_id("O#4").unwrap();
        assert!(pin.is_blocked_at_rest());
        assert_eq!(pin.state(), PinState::Blocked);
    }
}
