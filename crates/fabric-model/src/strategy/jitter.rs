use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::{ModelError, ModelResult};

/// Randomisation applied to peer reconnect delays.
///
/// `base` below is the exponential delay for the current attempt; the sampling itself
/// happens in the core retry helper against the injected entropy source.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JitterStrategy {
    /// Exactly `base`.
    None,
    /// Uniform in `[0, base]`.
    #[default]
    Full,
    /// Uniform in `[base / 2, base]`.
    Equal,
    /// Uniform in `[base, 3 * base]`, capped at the backoff maximum.
    Decorrelated,
}

impl JitterStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            JitterStrategy::None => "none",
            JitterStrategy::Full => "full",
            JitterStrategy::Equal => "equal",
            JitterStrategy::Decorrelated => "decorrelated",
        }
    }
}

impl fmt::Display for JitterStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JitterStrategy {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "" | "none" | "off" => Ok(Self::None),
            "full" => Ok(Self::Full),
            "equal" => Ok(Self::Equal),
            "decorrelated" => Ok(Self::Decorrelated),
            _ => Err(ModelError::UnknownJitter(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!(" Equal ".parse::<JitterStrategy>().unwrap(), JitterStrategy::Equal);
        assert_eq!("OFF".parse::<JitterStrategy>().unwrap(), JitterStrategy::None);
        for s in [
            JitterStrategy::None,
            JitterStrategy::Full,
            JitterStrategy::Equal,
            JitterStrategy::Decorrelated,
        ] {
            assert_eq!(s.as_str().parse::<JitterStrategy>().unwrap(), s);
        }
    }

    #[test]
    fn unknown_name_is_reported_verbatim() {
        match "Gaussian".parse::<JitterStrategy>() {
            Err(ModelError::UnknownJitter(name)) => assert_eq!(name, "Gaussian"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
