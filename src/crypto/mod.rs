//! Cryptographic core that exposes passphrase hashing and the string
//! encodings used to persist salts and derived hashes. Each submodule
//! focuses on a single responsibility so the security model stays simple
//! and auditable.

pub mod encoding;
pub mod passphrase;
