//! Derivation parameters with explicit defaults. Deployments tune these per
//! installation, so every field can be overridden from a JSON file while
//! partial files fall back to the documented defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::encoding::Encoding;

pub const DEFAULT_SALT_LENGTH: usize = 32;
pub const DEFAULT_ITERATIONS: u32 = 25_000;
pub const DEFAULT_KEY_LENGTH: usize = 512;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file unreadable: {0}")]
    Io(String),
    #[error("config parse failed: {0}")]
    Parse(String),
    #[error("invalid parameter: {0}")]
    Invalid(String),
}

/// Parameters for salt generation and key derivation. Changing any of these
/// invalidates previously stored credentials, so they must stay stable for
/// the lifetime of a credential set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivationConfig {
    /// Random salt length in bytes.
    pub salt_length: usize,
    /// PBKDF2 iteration count.
    pub iterations: u32,
    /// Derived key length in bytes.
    pub key_length: usize,
    /// Encoding used for the stored salt and hash strings.
    pub encoding: Encoding,
}

impl Default for DerivationConfig {
    fn default() -> Self {
        Self {
            salt_length: DEFAULT_SALT_LENGTH,
            iterations: DEFAULT_ITERATIONS,
            key_length: DEFAULT_KEY_LENGTH,
            encoding: Encoding::Hex,
        }
    }
}

impl DerivationConfig {
    /// Rejects degenerate parameters. A zero salt, iteration count, or key
    /// length would silently weaken every credential derived afterwards.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.salt_length == 0 {
            return Err(ConfigError::Invalid("salt_length must be non-zero".into()));
        }
        if self.iterations == 0 {
            return Err(ConfigError::Invalid("iterations must be non-zero".into()));
        }
        if self.key_length == 0 {
            return Err(ConfigError::Invalid("key_length must be non-zero".into()));
        }
        Ok(())
    }
}

/// Loads a JSON configuration file and validates it. Missing fields take
/// their defaults; present fields override them.
pub fn load_config(path: impl AsRef<Path>) -> Result<DerivationConfig, ConfigError> {
    let raw_json = fs::read_to_string(&path).map_err(|e| ConfigError::Io(format!("{e}")))?;
    let config: DerivationConfig =
        serde_json::from_str(&raw_json).map_err(|e| ConfigError::Parse(format!("{e}")))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::{load_config, ConfigError, DerivationConfig};
    use crate::crypto::encoding::Encoding;
    use std::fs;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_documented_values() {
        let config = DerivationConfig::default();
        assert_eq!(config.salt_length, 32);
        assert_eq!(config.iterations, 25_000);
        assert_eq!(config.key_length, 512);
        assert_eq!(config.encoding, Encoding::Hex);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let file = NamedTempFile::new().expect("temp file");
        fs::write(file.path(), r#"{"iterations": 1000, "encoding": "base64"}"#).unwrap();

        let config = load_config(file.path()).expect("config should load");
        assert_eq!(config.iterations, 1_000);
        assert_eq!(config.encoding, Encoding::Base64);
        assert_eq!(config.salt_length, 32);
        assert_eq!(config.key_length, 512);
    }

    #[test]
    fn zero_parameters_are_rejected() {
        let file = NamedTempFile::new().expect("temp file");
        fs::write(file.path(), r#"{"iterations": 0}"#).unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let file = NamedTempFile::new().expect("temp file");
        fs::write(file.path(), "{not json").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_config("/nonexistent/warden-config.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
