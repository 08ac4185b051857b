//! Salted passphrase hashing built on PBKDF2-HMAC-SHA256. Each call is a
//! pure transformation: a fresh random salt goes in, an encoded (salt, hash)
//! pair comes out, and nothing is persisted here.

use hmac::Hmac;
use pbkdf2::pbkdf2;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroize;

use crate::config::DerivationConfig;
use crate::crypto::encoding::EncodingError;

#[derive(Debug, Error)]
pub enum PassphraseError {
    #[error("passphrase is missing or empty")]
    MissingPassphrase,
    #[error("entropy or key derivation failure: {0}")]
    CryptoFailure(String),
    #[error("stored credential is not decodable: {0}")]
    Encoding(#[from] EncodingError),
}

/// Serializable envelope for one credential. The salt and the derived hash
/// are always set together; a record holding one without the other is
/// corrupt. Both strings use the encoding configured at derivation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialPair {
    pub salt: String,
    pub hash: String,
}

/// Derives a fresh credential for `passphrase`. A new random salt is drawn
/// on every call, so repeating the same passphrase yields a different pair.
pub fn set_passphrase(
    passphrase: &str,
    config: &DerivationConfig,
) -> Result<CredentialPair, PassphraseError> {
    if passphrase.is_empty() {
        return Err(PassphraseError::MissingPassphrase);
    }

    let mut salt = vec![0u8; config.salt_length];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| PassphraseError::CryptoFailure(format!("{e}")))?;

    let mut derived = derive(passphrase, &salt, config)?;
    let pair = CredentialPair {
        salt: config.encoding.encode(&salt),
        hash: config.encoding.encode(&derived),
    };
    derived.zeroize();
    Ok(pair)
}

/// Checks `passphrase` against a stored (salt, hash) pair by re-deriving
/// with the same parameters. Returns `Ok(false)` on mismatch; callers decide
/// whether a mismatch is an error in their context.
pub fn verify_passphrase(
    passphrase: &str,
    salt: &str,
    expected_hash: &str,
    config: &DerivationConfig,
) -> Result<bool, PassphraseError> {
    if passphrase.is_empty() {
        return Err(PassphraseError::MissingPassphrase);
    }

    let salt_bytes = config.encoding.decode(salt)?;
    let expected = config.encoding.decode(expected_hash)?;

    let mut derived = derive(passphrase, &salt_bytes, config)?;
    let matches = constant_time_eq(&derived, &expected);
    derived.zeroize();
    Ok(matches)
}

fn derive(
    passphrase: &str,
    salt: &[u8],
    config: &DerivationConfig,
) -> Result<Vec<u8>, PassphraseError> {
    let mut output = vec![0u8; config.key_length];
    pbkdf2::<Hmac<Sha256>>(
        passphrase.as_bytes(),
        salt,
        config.iterations,
        &mut output,
    )
    .map_err(|e| PassphraseError::CryptoFailure(format!("{e}")))?;
    Ok(output)
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
