//! Validator configuration loaded from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CardAddrError, Result};
use crate::types::LegacyRule;
use crate::validation::AddressValidator;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Authoritative legacy-address rule set.
    pub legacy_rule: LegacyRule,
}

impl ValidatorConfig {
    pub fn from_json_str(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|err| CardAddrError::Config(err.to_string()))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw).map_err(|err| match err {
            CardAddrError::Config(msg) => {
                CardAddrError::Config(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }
}

impl From<&ValidatorConfig> for AddressValidator {
    fn from(config: &ValidatorConfig) -> Self {
        AddressValidator::new(config.legacy_rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config = ValidatorConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ValidatorConfig::default());
        assert_eq!(config.legacy_rule, LegacyRule::Strict);
    }

    #[test]
    fn reads_historical_rule() {
        let config = ValidatorConfig::from_json_str(r#"{"legacy_rule": "historical"}"#).unwrap();
        let validator = AddressValidator::from(&config);
        assert_eq!(validator.legacy_rule(), LegacyRule::Historical);
        assert!(validator.is_valid("11QAZXSWedcvfr4322WSXZxsw"));
    }

    #[test]
    fn rejects_unknown_keys_and_values() {
        assert!(matches!(
            ValidatorConfig::from_json_str(r#"{"legacy": "strict"}"#),
            Err(CardAddrError::Config(_))
        ));
        assert!(matches!(
            ValidatorConfig::from_json_str(r#"{"legacy_rule": "loose"}"#),
            Err(CardAddrError::Config(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ValidatorConfig::from_json_file(Path::new("/nonexistent/cardaddr.json"))
            .unwrap_err();
        assert!(matches!(err, CardAddrError::Io(_)));
    }
}
