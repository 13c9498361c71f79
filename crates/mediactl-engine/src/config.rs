//! Building a registry from a configuration document and exporting it back.
//!
//! Application runs in two passes. Every record is registered first, in
//! document order (inputs, outputs, virtual pins), so references may point
//! forward. References are resolved in the second pass; the first unknown,
//! duplicated or ill-typed reference aborts the whole application. A failed
//! application unregisters the pins it added, releasing their lines.

use mediactl_config::{InputPinConfig, MediaConfig, OutputPinConfig, VirtualPinConfig};
use mediactl_core::{PinAddress, PinId, PinKind, duration_from_secs};
use std::collections::HashSet;
use tracing::{info, warn};

use crate::error::{EngineError, Result};
use crate::pin::{Pin, PinIndex, PinVariant};
use crate::registry::{PinRegistry, push_unique};

/// References declared by one record, resolved after registration.
struct PendingLinks<'a> {
    owner: PinId,
    triggered: &'a [String],
    block: &'a [String],
    unblock: &'a [String],
}

impl PinRegistry {
    /// Register and wire every pin described by `config`.
    ///
    /// Virtual records without `gpio_pin` take the address encoded in their
    /// `id`, or else the next free negative address.
    ///
    /// # Errors
    ///
    /// Returns the first registration, identity, duration or reference
    /// error. Pins added before the error are unregistered again and the
    /// registry is left as it was.
    pub async fn apply_config(&mut self, config: &MediaConfig) -> Result<()> {
        let existing: HashSet<PinId> = self.index.keys().cloned().collect();
        let project = std::mem::replace(&mut self.project, config.project.clone());

        if let Err(e) = self.apply_records(config).await {
            self.project = project;
            self.roll_back(&existing).await;
            return Err(e);
        }

        info!(
            project = %self.project.name,
            pins = self.len(),
            "Configuration applied"
        );
        Ok(())
    }

    async fn apply_records(&mut self, config: &MediaConfig) -> Result<()> {
        let mut pending = Vec::with_capacity(config.pin_count());

        for record in &config.input_pins {
            pending.push(self.apply_input(record).await?);
        }
        for record in &config.output_pins {
            pending.push(self.apply_output(record).await?);
        }

        let mut reserved: HashSet<i32> = config
            .virtual_pins
            .iter()
            .filter_map(declared_virtual_address)
            .collect();
        for record in &config.virtual_pins {
            pending.push(self.apply_virtual(record, &mut reserved).await?);
        }

        for links in pending {
            self.resolve_links(&links)?;
        }
        Ok(())
    }

    /// Unregister every pin not in `existing`, newest first.
    async fn roll_back(&mut self, existing: &HashSet<PinId>) {
        let added: Vec<PinId> = self
            .pins
            .iter()
            .rev()
            .map(|pin| pin.id.clone())
            .filter(|id| !existing.contains(id))
            .collect();

        for id in added {
            if let Err(e) = self.unregister_pin(id.as_str()).await {
                warn!(pin = %id, error = %e, "Failed to release pin after configuration error");
            }
        }
    }

    /// Export the registry as a configuration document.
    ///
    /// Display names equal to the id are omitted.
    pub fn to_config(&self) -> MediaConfig {
        let mut config = MediaConfig {
            project: self.project.clone(),
            ..MediaConfig::default()
        };

        for pin in &self.pins {
            let id = Some(pin.id.to_string());
            let display_name =
                (pin.display_name != pin.id.as_str()).then(|| pin.display_name.clone());
            let pins_to_block = self.id_strings(&pin.pins_to_block);
            let pins_to_unblock = self.id_strings(&pin.pins_to_unblock);
            let blocked = pin.is_blocked_at_rest();

            match &pin.variant {
                PinVariant::Input(settings) => config.input_pins.push(InputPinConfig {
                    id,
                    gpio_pin: pin.address.as_i32(),
                    display_name,
                    activation_delay: settings.activation_delay.as_secs_f64(),
                    triggered_pins: self.id_strings(&settings.triggered_pins),
                    pins_to_block,
                    pins_to_unblock,
                    blocked,
                }),
                PinVariant::Output(settings) => config.output_pins.push(OutputPinConfig {
                    id,
                    gpio_pin: pin.address.as_i32(),
                    display_name,
                    trigger_method: settings.trigger_method,
                    hold_time: settings.hold_time.as_secs_f64(),
                    pins_to_block,
                    pins_to_unblock,
                    blocked,
                }),
                PinVariant::Virtual(settings) => config.virtual_pins.push(VirtualPinConfig {
                    id,
                    gpio_pin: Some(pin.address.as_i32()),
                    display_name,
                    ip_address: settings.address.clone(),
                    password: settings.credential.clone(),
                    remote_action: settings.action,
                    pins_to_block,
                    pins_to_unblock,
                    blocked,
                }),
            }
        }

        config
    }

    async fn apply_input<'a>(&mut self, record: &'a InputPinConfig) -> Result<PendingLinks<'a>> {
        let id = self
            .register_record(
                PinKind::Input,
                record.gpio_pin,
                record.id.as_deref(),
                record.display_name.as_deref(),
                record.blocked,
            )
            .await?;
        self.set_activation_delay(id.as_str(), duration_from_secs(record.activation_delay)?)?;

        Ok(PendingLinks {
            owner: id,
            triggered: &record.triggered_pins,
            block: &record.pins_to_block,
            unblock: &record.pins_to_unblock,
        })
    }

    async fn apply_output<'a>(&mut self, record: &'a OutputPinConfig) -> Result<PendingLinks<'a>> {
        let id = self
            .register_record(
                PinKind::Output,
                record.gpio_pin,
                record.id.as_deref(),
                record.display_name.as_deref(),
                record.blocked,
            )
            .await?;
        self.set_trigger_method(id.as_str(), record.trigger_method)?;
        self.set_hold_time(id.as_str(), duration_from_secs(record.hold_time)?)?;

        Ok(PendingLinks {
            owner: id,
            triggered: &[],
            block: &record.pins_to_block,
            unblock: &record.pins_to_unblock,
        })
    }

    async fn apply_virtual<'a>(
        &mut self,
        record: &'a VirtualPinConfig,
        reserved: &mut HashSet<i32>,
    ) -> Result<PendingLinks<'a>> {
        let address = match declared_virtual_address(record) {
            Some(address) => address,
            None => {
                let address = self.next_virtual_address(reserved)?;
                reserved.insert(address);
                address
            }
        };

        let id = self
            .register_record(
                PinKind::Virtual,
                address,
                record.id.as_deref(),
                record.display_name.as_deref(),
                record.blocked,
            )
            .await?;
        self.set_remote_address(id.as_str(), record.ip_address.as_deref())?;
        self.set_credential(id.as_str(), record.password.as_deref())?;
        self.set_remote_action(id.as_str(), record.remote_action)?;

        Ok(PendingLinks {
            owner: id,
            triggered: &[],
            block: &record.pins_to_block,
            unblock: &record.pins_to_unblock,
        })
    }

    async fn register_record(
        &mut self,
        kind: PinKind,
        address: i32,
        declared: Option<&str>,
        display_name: Option<&str>,
        blocked: bool,
    ) -> Result<PinId> {
        let derived = PinId::derive(kind, PinAddress::new(kind, address)?);
        if let Some(declared) = declared.filter(|d| !d.trim().is_empty())
            && declared.trim() != derived.as_str()
        {
            return Err(EngineError::IdMismatch {
                declared: declared.to_string(),
                derived,
            });
        }

        let id = self.register_pin(kind, address, display_name).await?;
        self.set_blocked(id.as_str(), blocked)?;
        Ok(id)
    }

    fn resolve_links(&mut self, links: &PendingLinks<'_>) -> Result<()> {
        let owner = self.lookup(links.owner.as_str())?;

        for target in self.resolve_list(links.triggered, &links.owner, "triggered_pins")? {
            self.link_triggered(owner, target)?;
        }
        for target in self.resolve_list(links.block, &links.owner, "pins_to_block")? {
            push_unique(&mut self.pins[owner.0].pins_to_block, target);
        }
        for target in self.resolve_list(links.unblock, &links.owner, "pins_to_unblock")? {
            push_unique(&mut self.pins[owner.0].pins_to_unblock, target);
        }
        Ok(())
    }

    /// Resolve one relationship list, keeping its order.
    fn resolve_list(
        &self,
        references: &[String],
        owner: &PinId,
        list: &'static str,
    ) -> Result<Vec<PinIndex>> {
        let mut targets = Vec::with_capacity(references.len());
        for reference in references {
            let target = self.resolve(reference, owner)?;
            if targets.contains(&target) {
                return Err(EngineError::DuplicateReference {
                    id: self.pins[target.0].id.clone(),
                    referenced_by: owner.clone(),
                    list,
                });
            }
            targets.push(target);
        }
        Ok(targets)
    }

    fn resolve(&self, reference: &str, referenced_by: &PinId) -> Result<PinIndex> {
        self.lookup(reference)
            .map_err(|_| EngineError::unknown_reference(reference, referenced_by))
    }

    fn next_virtual_address(&self, reserved: &HashSet<i32>) -> Result<i32> {
        let taken = |address: i32| {
            reserved.contains(&address)
                || self.pins.iter().any(|pin: &Pin| pin.address.as_i32() == address)
        };
        (1..=i32::MAX)
            .map(|n| -n)
            .find(|address| !taken(*address))
            .ok_or(EngineError::VirtualAddressesExhausted)
    }

    fn id_strings(&self, list: &[PinIndex]) -> Vec<String> {
        self.ids(list).into_iter().map(String::from).collect()
    }
}

/// Address a virtual record asks for: `gpio_pin`, else the one in its `id`.
fn declared_virtual_address(record: &VirtualPinConfig) -> Option<i32> {
    record.gpio_pin.or_else(|| {
        record
            .id
            .as_deref()
            .and_then(|id| id.parse::<PinId>().ok())
            .filter(|id| id.kind() == PinKind::Virtual)
            .map(|id| id.address().as_i32())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediactl_core::{RemoteAction, TriggerMethod};
    use mediactl_hardware::mock::MockGpio;
    use std::time::Duration;

    fn registry() -> PinRegistry {
        PinRegistry::new(MockGpio::new().0.into())
    }

    fn document(text: &str) -> MediaConfig {
        toml::from_str(text).unwrap()
    }

    #[tokio::test]
    async fn test_apply_resolves_forward_references() {
        let config = document(
            r#"
[[InputPins]]
gpio_pin = 17
activation_delay = 0.5
triggered_pins = ["O#27", "V#1"]
pins_to_block = ["I#18"]

[[InputPins]]
gpio_pin = 18

[[OutputPins]]
gpio_pin = 27
trigger_method = "hold"
hold_time = 3

[[VirtualPins]]
ip_address = "10.0.0.9"
remote_action = "power_on"
"#,
        );
        let mut registry = registry();
        registry.apply_config(&config).await.unwrap();

        assert_eq!(registry.len(), 4);
        let triggered = registry.triggered_pins("I#17").unwrap();
        assert_eq!(triggered.len(), 2);
        assert_eq!(triggered[1].as_str(), "V#1");
        assert_eq!(registry.pins_to_block("I#17").unwrap()[0].as_str(), "I#18");

        let input = registry.get_pin_by_id("I#17").unwrap();
        assert_eq!(input.activation_delay(), Some(Duration::from_millis(500)));
        let output = registry.get_pin_by_id("O#27").unwrap();
        assert_eq!(output.trigger_method(), Some(TriggerMethod::Hold));
        assert_eq!(output.hold_time(), Some(Duration::from_secs(3)));
        let remote = registry.get_pin_by_id("V#1").unwrap();
        assert_eq!(remote.remote_action(), Some(RemoteAction::PowerOn));
    }

    #[tokio::test]
    async fn test_apply_unknown_reference_fails() {
        let config = document(
            r#"
[[InputPins]]
gpio_pin = 1
triggered_pins = ["O#99"]
"#,
        );
        let error = registry().apply_config(&config).await.unwrap_err();
        assert!(matches!(
            error,
            EngineError::UnknownReference { ref id, .. } if id == "O#99"
        ));
    }

    #[tokio::test]
    async fn test_failed_apply_releases_registered_lines() {
        let config = document(
            r#"
[[InputPins]]
gpio_pin = 17
triggered_pins = ["O#99"]

[[OutputPins]]
gpio_pin = 27
"#,
        );
        let (gpio, handle) = MockGpio::new();
        let mut registry = PinRegistry::new(gpio.into());
        registry.register_pin(PinKind::Input, 4, None).await.unwrap();

        let error = registry.apply_config(&config).await.unwrap_err();

        assert!(matches!(error, EngineError::UnknownReference { .. }));
        assert_eq!(registry.len(), 1);
        assert!(registry.get_pin_by_id("I#4").is_some());
        assert!(!handle.is_set_up(17));
        assert!(!handle.is_set_up(27));
        assert!(handle.is_set_up(4));
        let mut released = handle.cleaned_up();
        released.sort_unstable();
        assert_eq!(released, vec![17, 27]);
    }

    #[tokio::test]
    async fn test_apply_duplicate_reference_fails() {
        let config = document(
            r#"
[[InputPins]]
gpio_pin = 1
pins_to_block = ["I#2", "I#2"]

[[InputPins]]
gpio_pin = 2
"#,
        );
        let error = registry().apply_config(&config).await.unwrap_err();
        assert!(matches!(
            error,
            EngineError::DuplicateReference { ref id, list: "pins_to_block", .. } if id.as_str() == "I#2"
        ));
    }

    #[tokio::test]
    async fn test_apply_garbage_reference_fails() {
        let config = document(
            r#"
[[OutputPins]]
gpio_pin = 1
pins_to_block = ["lamp"]
"#,
        );
        let error = registry().apply_config(&config).await.unwrap_err();
        assert!(matches!(error, EngineError::UnknownReference { .. }));
    }

    #[tokio::test]
    async fn test_apply_wrong_trigger_kind_fails() {
        let config = document(
            r#"
[[InputPins]]
gpio_pin = 1
triggered_pins = ["I#2"]

[[InputPins]]
gpio_pin = 2
"#,
        );
        let error = registry().apply_config(&config).await.unwrap_err();
        assert!(matches!(error, EngineError::WrongKind { .. }));
    }

    #[tokio::test]
    async fn test_apply_id_mismatch_fails() {
        let config = document(
            r#"
[[OutputPins]]
id = "O#5"
gpio_pin = 6
"#,
        );
        let error = registry().apply_config(&config).await.unwrap_err();
        assert!(matches!(error, EngineError::IdMismatch { .. }));
    }

    #[tokio::test]
    async fn test_apply_negative_delay_fails() {
        let config = document(
            r#"
[[InputPins]]
gpio_pin = 3
activation_delay = -1.0
"#,
        );
        let error = registry().apply_config(&config).await.unwrap_err();
        assert!(matches!(error, EngineError::Core(_)));
    }

    #[tokio::test]
    async fn test_virtual_addresses_allocated_around_declared_ones() {
        let config = document(
            r#"
[[VirtualPins]]
remote_action = "power_on"

[[VirtualPins]]
gpio_pin = -1

[[VirtualPins]]
id = "V#2"
"#,
        );
        let mut registry = registry();
        registry.apply_config(&config).await.unwrap();

        let ids: Vec<String> = registry.virtual_pins().map(|p| p.id().to_string()).collect();
        assert_eq!(ids, vec!["V#3", "V#1", "V#2"]);
    }

    #[tokio::test]
    async fn test_next_virtual_address_skips_taken() {
        let mut registry = registry();
        registry.register_pin(PinKind::Virtual, -1, None).await.unwrap();
        let reserved: HashSet<i32> = [-2].into_iter().collect();

        assert_eq!(registry.next_virtual_address(&reserved).unwrap(), -3);
    }

    #[tokio::test]
    async fn test_most_negative_virtual_address_rejected() {
        let config = document(
            r#"
[[VirtualPins]]
gpio_pin = -2147483648
"#,
        );
        let mut registry = registry();
        let error = registry.apply_config(&config).await.unwrap_err();

        assert!(matches!(error, EngineError::Core(_)));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_to_config_round_trip() {
        let config = document(
            r#"
[Project]
name = "hall"

[[InputPins]]
gpio_pin = 17
display_name = "Stage button"
triggered_pins = ["O#27"]
pins_to_unblock = ["O#28"]

[[OutputPins]]
gpio_pin = 27
trigger_method = "while_upstream_active"

[[OutputPins]]
gpio_pin = 28
blocked = true

[[VirtualPins]]
gpio_pin = -4
ip_address = "beamer.local:4352"
password = "secret"
remote_action = "power_off"
pins_to_block = ["O#27"]
"#,
        );
        let mut first = registry();
        first.apply_config(&config).await.unwrap();
        let exported = first.to_config();

        assert_eq!(exported.project.name, "hall");
        assert_eq!(exported.input_pins[0].id.as_deref(), Some("I#17"));
        assert_eq!(exported.input_pins[0].display_name.as_deref(), Some("Stage button"));
        assert_eq!(exported.output_pins[0].display_name, None);
        assert!(exported.output_pins[1].blocked);
        assert_eq!(exported.virtual_pins[0].pins_to_block, vec!["O#27"]);

        let mut second = registry();
        second.apply_config(&exported).await.unwrap();
        assert_eq!(second.to_config(), exported);
    }
}
