//! PJLink class 1 message grammar.
//!
//! Only the subset needed for power control is modelled: the connection
//! greeting, the `POWR` command and its responses, and the authentication
//! error line.

use md5::{Digest, Md5};

use crate::error::{ProjectorErrorCode, RemoteError, Result};

/// Command prefix for class 1 commands.
const CLASS1_PREFIX: &str = "%1";

/// Line sent by the projector when the password digest is wrong.
const AUTH_ERROR: &str = "PJLINK ERRA";

/// Greeting sent by the projector right after the TCP connection opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Greeting {
    /// `PJLINK 0`: no authentication.
    Open,
    /// `PJLINK 1 <seed>`: every connection must authenticate with the
    /// MD5 digest of `seed + password`.
    Secured { seed: String },
}

impl Greeting {
    /// Parse a greeting line.
    pub fn parse(line: &str) -> Result<Self> {
        if line == AUTH_ERROR {
            return Err(RemoteError::AuthenticationFailed);
        }

        let mut parts = line.split(' ');
        if parts.next() != Some("PJLINK") {
            return Err(RemoteError::protocol(format!("unexpected greeting '{line}'")));
        }

        match (parts.next(), parts.next(), parts.next()) {
            (Some("0"), None, None) => Ok(Self::Open),
            (Some("1"), Some(seed), None) if !seed.is_empty() => Ok(Self::Secured {
                seed: seed.to_string(),
            }),
            _ => Err(RemoteError::protocol(format!("unexpected greeting '{line}'"))),
        }
    }

    /// Returns `true` when the projector requires authentication.
    pub fn requires_auth(&self) -> bool {
        matches!(self, Self::Secured { .. })
    }
}

/// Compute the PJLink authentication digest: `md5(seed + password)` as
/// lower-case hex.
pub fn auth_digest(seed: &str, password: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(seed.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Power command body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerCommand {
    /// `%1POWR 1`
    On,
    /// `%1POWR 0`
    Off,
    /// `%1POWR ?`
    Query,
}

impl PowerCommand {
    /// Command line without terminator.
    pub fn to_line(self) -> String {
        let param = match self {
            Self::On => "1",
            Self::Off => "0",
            Self::Query => "?",
        };
        format!("{CLASS1_PREFIX}POWR {param}")
    }
}

impl From<bool> for PowerCommand {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

/// Power state reported by a `%1POWR ?` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Off,
    On,
    Cooling,
    WarmingUp,
}

/// Parsed response to a `POWR` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerResponse {
    /// `%1POWR=OK`
    Ok,
    /// `%1POWR=0..3`
    State(PowerState),
}

impl PowerResponse {
    /// Parse a response line.
    ///
    /// Projector error codes and the authentication error are returned as
    /// [`RemoteError`]s.
    pub fn parse(line: &str) -> Result<Self> {
        if line == AUTH_ERROR {
            return Err(RemoteError::AuthenticationFailed);
        }

        let body = line
            .strip_prefix(CLASS1_PREFIX)
            .and_then(|rest| rest.strip_prefix("POWR="))
            .ok_or_else(|| RemoteError::protocol(format!("unexpected response '{line}'")))?;

        match body {
            "OK" => Ok(Self::Ok),
            "0" => Ok(Self::State(PowerState::Off)),
            "1" => Ok(Self::State(PowerState::On)),
            "2" => Ok(Self::State(PowerState::Cooling)),
            "3" => Ok(Self::State(PowerState::WarmingUp)),
            other => match ProjectorErrorCode::from_wire(other) {
                Some(code) => Err(RemoteError::projector(code)),
                None => Err(RemoteError::protocol(format!("unexpected response '{line}'"))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_greeting_open() {
        assert_eq!(Greeting::parse("PJLINK 0").unwrap(), Greeting::Open);
        assert!(!Greeting::Open.requires_auth());
    }

    #[test]
    fn test_greeting_secured() {
        let greeting = Greeting::parse("PJLINK 1 498e4a67").unwrap();
        assert_eq!(
            greeting,
            Greeting::Secured {
                seed: "498e4a67".to_string()
            }
        );
        assert!(greeting.requires_auth());
    }

    #[rstest]
    #[case("HELLO")]
    #[case("PJLINK")]
    #[case("PJLINK 1")]
    #[case("PJLINK 2 abc")]
    fn test_greeting_invalid(#[case] line: &str) {
        assert!(matches!(Greeting::parse(line), Err(RemoteError::Protocol(_))));
    }

    #[test]
    fn test_auth_digest_reference_value() {
        // Reference pair from the PJLink class 1 specification.
        assert_eq!(
            auth_digest("498e4a67", "JBMIAProjectorLink"),
            "5d8409bc1c3fa39749434aa3a5c38682"
        );
    }

    #[test]
    fn test_power_command_lines() {
        assert_eq!(PowerCommand::from(true).to_line(), "%1POWR 1");
        assert_eq!(PowerCommand::from(false).to_line(), "%1POWR 0");
        assert_eq!(PowerCommand::Query.to_line(), "%1POWR ?");
    }

    #[rstest]
    #[case("%1POWR=OK", PowerResponse::Ok)]
    #[case("%1POWR=0", PowerResponse::State(PowerState::Off))]
    #[case("%1POWR=1", PowerResponse::State(PowerState::On))]
    #[case("%1POWR=2", PowerResponse::State(PowerState::Cooling))]
    #[case("%1POWR=3", PowerResponse::State(PowerState::WarmingUp))]
    fn test_power_response_ok(#[case] line: &str, #[case] expected: PowerResponse) {
        assert_eq!(PowerResponse::parse(line).unwrap(), expected);
    }

    #[test]
    fn test_power_response_errors() {
        assert!(matches!(
            PowerResponse::parse("%1POWR=ERR3"),
            Err(RemoteError::Projector {
                code: ProjectorErrorCode::UnavailableTime,
                ..
            })
        ));
        assert!(matches!(
            PowerResponse::parse("PJLINK ERRA"),
            Err(RemoteError::AuthenticationFailed)
        ));
        assert!(matches!(
            PowerResponse::parse("%1INPT=OK"),
            Err(RemoteError::Protocol(_))
        ));
    }
}
