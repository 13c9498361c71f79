use crate::{
    Result,
    constants::{ID_SEPARATOR, INPUT_PREFIX, OUTPUT_PREFIX, VIRTUAL_PREFIX},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Pin variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinKind {
    /// Senses an external signal.
    Input,
    /// Drives a physical output.
    Output,
    /// No GPIO; actuates a networked device.
    Virtual,
}

impl PinKind {
    /// Prefix used when deriving pin ids.
    #[must_use]
    pub fn prefix(self) -> char {
        match self {
            PinKind::Input => INPUT_PREFIX,
            PinKind::Output => OUTPUT_PREFIX,
            PinKind::Virtual => VIRTUAL_PREFIX,
        }
    }

    /// Resolve a kind from its id prefix.
    ///
    /// # Errors
    /// Returns `Error::UnknownVariant` for any other character.
    pub fn from_prefix(c: char) -> Result<Self> {
        match c {
            INPUT_PREFIX => Ok(PinKind::Input),
            OUTPUT_PREFIX => Ok(PinKind::Output),
            VIRTUAL_PREFIX => Ok(PinKind::Virtual),
            _ => Err(Error::UnknownVariant {
                what: "pin prefix",
                value: c.to_string(),
            }),
        }
    }

    /// Returns `true` if this kind has a physical GPIO line.
    #[inline]
    #[must_use]
    pub fn is_physical(self) -> bool {
        !matches!(self, PinKind::Virtual)
    }

    /// Returns `true` if an input pin may list this kind in its triggered pins.
    #[inline]
    #[must_use]
    pub fn is_triggerable(self) -> bool {
        matches!(self, PinKind::Output | PinKind::Virtual)
    }
}

impl fmt::Display for PinKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PinKind::Input => write!(f, "input"),
            PinKind::Output => write!(f, "output"),
            PinKind::Virtual => write!(f, "virtual"),
        }
    }
}

impl std::str::FromStr for PinKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "input" => Ok(PinKind::Input),
            "output" => Ok(PinKind::Output),
            "virtual" => Ok(PinKind::Virtual),
            _ => Err(Error::UnknownVariant {
                what: "pin kind",
                value: s.to_string(),
            }),
        }
    }
}

/// Hardware or placeholder address of a pin.
///
/// Physical pins carry a non-negative GPIO line number. Virtual pins carry a
/// negative placeholder whose absolute value becomes part of their id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinAddress(i32);

impl PinAddress {
    /// Create an address for a pin of the given kind.
    ///
    /// # Errors
    /// Returns `Error::InvalidAddress` if a physical pin gets a negative
    /// address or a virtual pin gets a non-negative one. `i32::MIN` is
    /// rejected as well: its absolute value does not fit an id.
    pub fn new(kind: PinKind, address: i32) -> Result<Self> {
        let valid = if kind.is_physical() {
            address >= 0
        } else {
            address < 0 && address != i32::MIN
        };

        if !valid {
            return Err(Error::InvalidAddress { kind, address });
        }
        Ok(PinAddress(address))
    }

    /// Get the raw address.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self.0
    }

    /// GPIO line number, or `None` for a virtual placeholder.
    #[must_use]
    pub fn line(self) -> Option<u32> {
        u32::try_from(self.0).ok()
    }

    /// Returns `true` for a virtual placeholder address.
    #[must_use]
    pub fn is_virtual(self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for PinAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable pin identifier (`I#17`, `O#27`, `V#1`).
///
/// Ids are derived from the kind prefix and the absolute address at
/// registration and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PinId(String);

impl PinId {
    /// Derive the id of a pin from its kind and address.
    #[must_use]
    pub fn derive(kind: PinKind, address: PinAddress) -> Self {
        PinId(format!(
            "{}{}{}",
            kind.prefix(),
            ID_SEPARATOR,
            address.as_i32().unsigned_abs()
        ))
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Kind encoded in the id prefix.
    #[must_use]
    pub fn kind(&self) -> PinKind {
        // Construction guarantees a valid prefix.
        match self.0.chars().next() {
            Some(OUTPUT_PREFIX) => PinKind::Output,
            Some(VIRTUAL_PREFIX) => PinKind::Virtual,
            _ => PinKind::Input,
        }
    }

    /// Address encoded in the id.
    #[must_use]
    pub fn address(&self) -> PinAddress {
        let number = self
            .0
            .split_once(ID_SEPARATOR)
            .and_then(|(_, n)| n.parse::<i32>().ok())
            .unwrap_or_default();

        match self.kind() {
            PinKind::Virtual => PinAddress(-number),
            _ => PinAddress(number),
        }
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PinId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let mut chars = s.chars();

        let kind = chars
            .next()
            .ok_or_else(|| Error::InvalidPinId(s.to_string()))
            .and_then(|c| PinKind::from_prefix(c).map_err(|_| Error::InvalidPinId(s.to_string())))?;

        if chars.next() != Some(ID_SEPARATOR) {
            return Err(Error::InvalidPinId(s.to_string()));
        }

        let number: u32 = chars
            .as_str()
            .parse()
            .map_err(|_| Error::InvalidPinId(s.to_string()))?;

        let raw = i32::try_from(number).map_err(|_| Error::InvalidPinId(s.to_string()))?;
        let address = match kind {
            PinKind::Virtual if raw == 0 => return Err(Error::InvalidPinId(s.to_string())),
            PinKind::Virtual => PinAddress::new(kind, -raw)?,
            _ => PinAddress::new(kind, raw)?,
        };

        Ok(PinId::derive(kind, address))
    }
}

impl TryFrom<String> for PinId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PinId> for String {
    fn from(id: PinId) -> Self {
        id.0
    }
}

/// Lifecycle state of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinState {
    /// Resting; may be triggered.
    Inactive,
    /// Performing its effect.
    Active,
    /// Refuses to trigger.
    Blocked,
}

impl fmt::Display for PinState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PinState::Inactive => write!(f, "inactive"),
            PinState::Active => write!(f, "active"),
            PinState::Blocked => write!(f, "blocked"),
        }
    }
}

/// Timing strategy of an output pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMethod {
    /// Fixed short high pulse.
    #[default]
    Pulse,
    /// High for the configured hold time.
    Hold,
    /// High for as long as the originating input stays triggered.
    #[serde(alias = "while_input")]
    WhileUpstreamActive,
}

impl fmt::Display for TriggerMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TriggerMethod::Pulse => write!(f, "pulse"),
            TriggerMethod::Hold => write!(f, "hold"),
            TriggerMethod::WhileUpstreamActive => write!(f, "while_upstream_active"),
        }
    }
}

impl std::str::FromStr for TriggerMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pulse" => Ok(TriggerMethod::Pulse),
            "hold" => Ok(TriggerMethod::Hold),
            "while_upstream_active" | "while_input" => Ok(TriggerMethod::WhileUpstreamActive),
            _ => Err(Error::UnknownVariant {
                what: "trigger method",
                value: s.to_string(),
            }),
        }
    }
}

/// Command a virtual pin sends to its remote device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteAction {
    /// Switch the device on.
    #[serde(alias = "pjlink_power_on")]
    PowerOn,
    /// Switch the device off.
    #[serde(alias = "pjlink_power_off")]
    PowerOff,
    /// Do nothing.
    #[default]
    #[serde(alias = "nothing")]
    None,
}

impl RemoteAction {
    /// Power state requested by this action, if any.
    #[must_use]
    pub fn power(self) -> Option<bool> {
        match self {
            RemoteAction::PowerOn => Some(true),
            RemoteAction::PowerOff => Some(false),
            RemoteAction::None => None,
        }
    }
}

impl fmt::Display for RemoteAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RemoteAction::PowerOn => write!(f, "power_on"),
            RemoteAction::PowerOff => write!(f, "power_off"),
            RemoteAction::None => write!(f, "none"),
        }
    }
}

impl std::str::FromStr for RemoteAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "power_on" | "pjlink_power_on" => Ok(RemoteAction::PowerOn),
            "power_off" | "pjlink_power_off" => Ok(RemoteAction::PowerOff),
            "none" | "nothing" => Ok(RemoteAction::None),
            _ => Err(Error::UnknownVariant {
                what: "remote action",
                value: s.to_string(),
            }),
        }
    }
}

/// Convert a configured number of seconds into a `Duration`.
///
/// # Errors
/// Returns `Error::InvalidDuration` for negative, NaN or infinite values.
pub fn duration_from_secs(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|e| Error::InvalidDuration(format!("{secs}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PinKind::Input, 17, "I#17")]
    #[case(PinKind::Output, 27, "O#27")]
    #[case(PinKind::Virtual, -1, "V#1")]
    #[case(PinKind::Virtual, -12, "V#12")]
    fn test_pin_id_derive(#[case] kind: PinKind, #[case] raw: i32, #[case] expected: &str) {
        let address = PinAddress::new(kind, raw).unwrap();
        let id = PinId::derive(kind, address);
        assert_eq!(id.as_str(), expected);
        assert_eq!(id.kind(), kind);
        assert_eq!(id.address(), address);
    }

    #[rstest]
    #[case("I#17", PinKind::Input)]
    #[case(" O#0 ", PinKind::Output)]
    #[case("V#3", PinKind::Virtual)]
    fn test_pin_id_parse(#[case] input: &str, #[case] kind: PinKind) {
        let id: PinId = input.parse().unwrap();
        assert_eq!(id.kind(), kind);
        assert_eq!(id.as_str(), input.trim());
    }

    #[rstest]
    #[case("")]
    #[case("I17")]
    #[case("X#17")]
    #[case("I#")]
    #[case("I#-3")]
    #[case("V#0")]
    fn test_pin_id_invalid(#[case] input: &str) {
        let result: Result<PinId> = input.parse();
        assert!(matches!(result, Err(Error::InvalidPinId(_))));
    }

    #[rstest]
    #[case(PinKind::Input, -1)]
    #[case(PinKind::Output, -5)]
    #[case(PinKind::Virtual, 0)]
    #[case(PinKind::Virtual, 4)]
    #[case(PinKind::Virtual, i32::MIN)]
    fn test_pin_address_invalid(#[case] kind: PinKind, #[case] raw: i32) {
        assert_eq!(
            PinAddress::new(kind, raw),
            Err(Error::InvalidAddress { kind, address: raw })
        );
    }

    #[test]
    fn test_most_negative_virtual_id_parses_back() {
        let address = PinAddress::new(PinKind::Virtual, -i32::MAX).unwrap();
        let id = PinId::derive(PinKind::Virtual, address);

        assert_eq!(id.as_str(), "V#2147483647");
        assert_eq!(id.as_str().parse::<PinId>(), Ok(id.clone()));
        assert_eq!(id.address(), address);
        assert!("V#2147483648".parse::<PinId>().is_err());
    }

    #[test]
    fn test_pin_address_line() {
        assert_eq!(PinAddress::new(PinKind::Input, 17).unwrap().line(), Some(17));
        assert_eq!(PinAddress::new(PinKind::Virtual, -1).unwrap().line(), None);
    }

    #[test]
    fn test_trigger_method_legacy_name() {
        assert_eq!(
            "while_input".parse::<TriggerMethod>().unwrap(),
            TriggerMethod::WhileUpstreamActive
        );
        let parsed: TriggerMethod = serde_json::from_str("\"while_input\"").unwrap();
        assert_eq!(parsed, TriggerMethod::WhileUpstreamActive);
        assert_eq!(
            serde_json::to_string(&TriggerMethod::WhileUpstreamActive).unwrap(),
            "\"while_upstream_active\""
        );
    }

    #[test]
    fn test_remote_action_aliases() {
        let parsed: RemoteAction = serde_json::from_str("\"pjlink_power_on\"").unwrap();
        assert_eq!(parsed, RemoteAction::PowerOn);
        let parsed: RemoteAction = serde_json::from_str("\"nothing\"").unwrap();
        assert_eq!(parsed, RemoteAction::None);
        assert_eq!(RemoteAction::PowerOff.power(), Some(false));
        assert_eq!(RemoteAction::None.power(), None);
        assert!("reboot".parse::<RemoteAction>().is_err());
    }

    #[test]
    fn test_duration_from_secs() {
        assert_eq!(duration_from_secs(3.0).unwrap(), Duration::from_secs(3));
        assert_eq!(duration_from_secs(0.0).unwrap(), Duration::ZERO);
        assert!(duration_from_secs(-1.0).is_err());
        assert!(duration_from_secs(f64::NAN).is_err());
    }

    #[test]
    fn test_pin_id_serde() {
        let id: PinId = serde_json::from_str("\"O#27\"").unwrap();
        assert_eq!(id.kind(), PinKind::Output);
        assert!(serde_json::from_str::<PinId>("\"Q#1\"").is_err());
    }
}
