//! Expansion settings.
//!
//! All fields have defaults, so a config file only needs the keys it changes:
//!
//! ```yaml
//! max_depth: 32
//! record_trace: true
//! ```

use serde::{Deserialize, Serialize};

use crate::{err_msg, SpliceError};

/// Default limit on Matched→Substituted transitions along one root-to-node path.
pub const MAX_MACRO_RECURSION_DEPTH: usize = 128;

/// Largest `max_depth` accepted. Rewrite chains at one position are walked
/// iteratively, but macro calls produced inside arguments still nest on the
/// stack once per level.
pub const MAX_DEPTH_LIMIT: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExpansionConfig {
    /// Runaway-recursion guard.
    pub max_depth: usize,
    /// Keep an [`crate::macros::ExpansionStep`] for every expansion.
    pub record_trace: bool,
    /// Re-walk the result and fail if any macro call or placeholder remains.
    pub verify_fixpoint: bool,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_MACRO_RECURSION_DEPTH,
            record_trace: false,
            verify_fixpoint: true,
        }
    }
}

impl ExpansionConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, SpliceError> {
        let config: Self = serde_yaml::from_str(text).map_err(|e| SpliceError::Config {
            message: format!("invalid YAML expansion config: {}", e),
            ctx: Default::default(),
            source: Some(Box::new(e)),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, SpliceError> {
        let config: Self = serde_json::from_str(text).map_err(|e| SpliceError::Config {
            message: format!("invalid JSON expansion config: {}", e),
            ctx: Default::default(),
            source: Some(Box::new(e)),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_trace(mut self, record_trace: bool) -> Self {
        self.record_trace = record_trace;
        self
    }

    /// Rejects depth limits outside `1..=MAX_DEPTH_LIMIT`.
    pub fn validate(&self) -> Result<(), SpliceError> {
        if self.max_depth == 0 {
            return Err(err_msg!(Config, "max_depth must be at least 1"));
        }
        if self.max_depth > MAX_DEPTH_LIMIT {
            return Err(err_msg!(
                Config,
                "max_depth {} exceeds the supported limit of {}",
                self.max_depth,
                MAX_DEPTH_LIMIT
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_overrides_only_given_keys() {
        let config = ExpansionConfig::from_yaml_str("max_depth: 8\n").unwrap();
        assert_eq!(config.max_depth, 8);
        assert!(!config.record_trace);
        assert!(config.verify_fixpoint);
    }

    #[test]
    fn json_config_parses() {
        let config =
            ExpansionConfig::from_json_str(r#"{"record_trace": true, "verify_fixpoint": false}"#)
                .unwrap();
        assert_eq!(config.max_depth, MAX_MACRO_RECURSION_DEPTH);
        assert!(config.record_trace);
        assert!(!config.verify_fixpoint);
    }

    #[test]
    fn unknown_keys_and_zero_depth_are_rejected() {
        let unknown = ExpansionConfig::from_yaml_str("max_dept: 3\n").unwrap_err();
        assert_eq!(unknown.kind(), crate::ErrorKind::Config);
        let zero = ExpansionConfig::from_json_str(r#"{"max_depth": 0}"#).unwrap_err();
        assert!(zero.to_string().contains("at least 1"));
    }

    #[test]
    fn depth_above_supported_limit_is_rejected() {
        let err = ExpansionConfig::from_yaml_str("max_depth: 200000\n").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Config);
        assert!(err.to_string().contains("256"), "{err}");
        assert!(ExpansionConfig::default()
            .with_max_depth(MAX_DEPTH_LIMIT)
            .validate()
            .is_ok());
    }
}
