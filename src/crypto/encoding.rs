//! String encodings for persisted salts and derived hashes. The encoding is
//! part of the credential format: a pair written with one encoding must be
//! decoded with the same one, so the choice lives in the configuration.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("hex decoding failed: {0}")]
    Hex(String),
    #[error("base64 decoding failed: {0}")]
    Base64(String),
}

/// Wire encoding used for salt and hash strings. Hex is the default;
/// base64 is denser for long derived keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Hex,
    Base64,
}

impl Encoding {
    pub fn encode(&self, bytes: &[u8]) -> String {
        match self {
            Encoding::Hex => hex::encode(bytes),
            Encoding::Base64 => STANDARD_NO_PAD.encode(bytes),
        }
    }

    pub fn decode(&self, text: &str) -> Result<Vec<u8>, EncodingError> {
        match self {
            Encoding::Hex => {
                hex::decode(text).map_err(|e| EncodingError::Hex(format!("{e}")))
            }
            Encoding::Base64 => STANDARD_NO_PAD
                .decode(text.as_bytes())
                .map_err(|e| EncodingError::Base64(format!("{e}"))),
        }
    }
}
