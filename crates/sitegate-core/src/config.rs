//! Admission configuration, loadable from TOML.
//!
//! ```toml
//! max_write_attempts = 3
//!
//! [accuracy]
//! lenient = true
//! poor_threshold_m = 50.0
//! very_poor_threshold_m = 100.0
//! max_buffer_m = 200.0
//! ```
//!
//! Every field has a default, so an empty file is a valid configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::AccuracyPolicy;

pub const DEFAULT_MAX_WRITE_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdmissionConfig {
    /// GPS accuracy leniency applied by the geofence gate.
    pub accuracy: AccuracyPolicy,

    /// How many times a conflicting write is re-read and re-evaluated before
    /// giving up.
    pub max_write_attempts: u32,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            accuracy: AccuracyPolicy::default(),
            max_write_attempts: DEFAULT_MAX_WRITE_ATTEMPTS,
        }
    }
}

impl AdmissionConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_write_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_write_attempts must be at least 1".into(),
            ));
        }
        self.accuracy.validate().map_err(ConfigError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        let config = AdmissionConfig::from_toml_str("").unwrap();
        assert_eq!(config, AdmissionConfig::default());
        assert!(config.accuracy.lenient);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = AdmissionConfig::from_toml_str(
            r#"
            [accuracy]
            lenient = false
            "#,
        )
        .unwrap();
        assert!(!config.accuracy.lenient);
        assert_eq!(config.accuracy.max_buffer_m, 200.0);
        assert_eq!(config.max_write_attempts, DEFAULT_MAX_WRITE_ATTEMPTS);
    }

    #[test]
    fn zero_attempts_is_invalid() {
        let err = AdmissionConfig::from_toml_str("max_write_attempts = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = AdmissionConfig::from_toml_str("max_write_attempt = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn misspelled_accuracy_key_is_rejected() {
        let err = AdmissionConfig::from_toml_str(
            r#"
            [accuracy]
            poor_threshold = 10
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AdmissionConfig::load("/nonexistent/sitegate.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/sitegate.toml"));
    }
}
