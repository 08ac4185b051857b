//! Principal registration and authentication over a pluggable credential
//! store. The store only ever sees encoded (salt, hash) pairs; raw
//! passphrases stay inside the calls that derive or verify them.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::DerivationConfig;
use crate::crypto::passphrase::{
    set_passphrase, verify_passphrase, CredentialPair, PassphraseError,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("identifier already registered")]
    DuplicateIdentifier,
    #[error("identifier not found")]
    NotFound,
    #[error("store backend failure: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("identifier is missing or empty")]
    MissingIdentifier,
    #[error("no principal registered under that identifier")]
    UnknownIdentifier,
    #[error("a principal with that identifier already exists")]
    PrincipalExists,
    #[error("passphrase does not match the stored credential")]
    IncorrectPassphrase,
    #[error(transparent)]
    Passphrase(#[from] PassphraseError),
    #[error("credential store failure: {0}")]
    Store(StoreError),
}

/// A registered principal: the identifier plus its current credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub identifier: String,
    pub credential: CredentialPair,
}

/// Persistence boundary for credentials. Implementations must enforce
/// identifier uniqueness on insert and must write the salt and hash of a
/// pair atomically, never one without the other.
pub trait CredentialStore: Send + Sync {
    fn find(&self, identifier: &str) -> Result<Option<CredentialPair>, StoreError>;
    fn insert(&self, identifier: &str, credential: CredentialPair) -> Result<(), StoreError>;
    fn update(&self, identifier: &str, credential: CredentialPair) -> Result<(), StoreError>;
}

/// In-memory reference store. Suitable for tests and the CLI; production
/// deployments implement `CredentialStore` over their own database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, CredentialPair>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a store from previously persisted principals.
    pub fn from_principals(principals: Vec<Principal>) -> Self {
        let entries = principals
            .into_iter()
            .map(|p| (p.identifier, p.credential))
            .collect();
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Snapshot of all principals, sorted by identifier for stable output.
    pub fn principals(&self) -> Result<Vec<Principal>, StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Backend(format!("{e}")))?;
        let mut principals: Vec<Principal> = entries
            .iter()
            .map(|(identifier, credential)| Principal {
                identifier: identifier.clone(),
                credential: credential.clone(),
            })
            .collect();
        principals.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        Ok(principals)
    }
}

impl CredentialStore for MemoryStore {
    fn find(&self, identifier: &str) -> Result<Option<CredentialPair>, StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Backend(format!("{e}")))?;
        Ok(entries.get(identifier).cloned())
    }

    fn insert(&self, identifier: &str, credential: CredentialPair) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Backend(format!("{e}")))?;
        if entries.contains_key(identifier) {
            return Err(StoreError::DuplicateIdentifier);
        }
        entries.insert(identifier.to_string(), credential);
        Ok(())
    }

    fn update(&self, identifier: &str, credential: CredentialPair) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Backend(format!("{e}")))?;
        match entries.get_mut(identifier) {
            Some(existing) => {
                *existing = credential;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }
}

/// Registration and authentication operations. Each operation has its own
/// named entry point; there is no polymorphic dispatch on argument shape.
pub struct Registry<S: CredentialStore> {
    store: S,
    config: DerivationConfig,
}

impl<S: CredentialStore> Registry<S> {
    /// The config must already be validated; see `config::load_config`.
    pub fn new(store: S, config: DerivationConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Registers a new principal. The identifier must be non-empty after
    /// trimming and not yet taken; the passphrase must be non-empty.
    pub fn register(&self, identifier: &str, passphrase: &str) -> Result<Principal, RegistryError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(RegistryError::MissingIdentifier);
        }

        let credential = set_passphrase(passphrase, &self.config)?;
        match self.store.insert(identifier, credential.clone()) {
            Ok(()) => Ok(Principal {
                identifier: identifier.to_string(),
                credential,
            }),
            Err(StoreError::DuplicateIdentifier) => Err(RegistryError::PrincipalExists),
            Err(e) => Err(RegistryError::Store(e)),
        }
    }

    /// Authenticates a principal by identifier and passphrase.
    pub fn authenticate(
        &self,
        identifier: &str,
        passphrase: &str,
    ) -> Result<Principal, RegistryError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(RegistryError::MissingIdentifier);
        }
        if passphrase.is_empty() {
            return Err(RegistryError::Passphrase(PassphraseError::MissingPassphrase));
        }

        match self.store.find(identifier).map_err(RegistryError::Store)? {
            Some(credential) => {
                if verify_passphrase(passphrase, &credential.salt, &credential.hash, &self.config)? {
                    Ok(Principal {
                        identifier: identifier.to_string(),
                        credential,
                    })
                } else {
                    Err(RegistryError::IncorrectPassphrase)
                }
            }
            None => {
                // Unknown identifiers still pay for a derivation so the miss
                // path is not distinguishable from a mismatch by latency.
                let _ = set_passphrase(passphrase, &self.config);
                Err(RegistryError::UnknownIdentifier)
            }
        }
    }

    /// Rotates a principal's credential. `None` means the caller had no new
    /// passphrase for this update and the stored credential is left as-is;
    /// `Some` derives a fresh salt and hash. Absence is only an error at
    /// registration time, not here.
    pub fn change_passphrase(
        &self,
        identifier: &str,
        passphrase: Option<&str>,
    ) -> Result<(), RegistryError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(RegistryError::MissingIdentifier);
        }
        let Some(passphrase) = passphrase else {
            return Ok(());
        };

        let credential = set_passphrase(passphrase, &self.config)?;
        match self.store.update(identifier, credential) {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound) => Err(RegistryError::UnknownIdentifier),
            Err(e) => Err(RegistryError::Store(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CredentialStore, MemoryStore, Registry, RegistryError, StoreError};
    use crate::config::DerivationConfig;
    use crate::crypto::encoding::Encoding;
    use crate::crypto::passphrase::PassphraseError;

    fn test_registry() -> Registry<MemoryStore> {
        let config = DerivationConfig {
            salt_length: 16,
            iterations: 500,
            key_length: 64,
            encoding: Encoding::Hex,
        };
        Registry::new(MemoryStore::new(), config)
    }

    #[test]
    fn register_then_authenticate() {
        let registry = test_registry();
        registry
            .register("alice", "correct-horse")
            .expect("registration should succeed");

        let principal = registry
            .authenticate("alice", "correct-horse")
            .expect("authentication should succeed");
        assert_eq!(principal.identifier, "alice");

        let err = registry.authenticate("alice", "wrong-horse").unwrap_err();
        assert!(matches!(err, RegistryError::IncorrectPassphrase));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let registry = test_registry();
        registry.register("alice", "one").expect("first registration");
        let err = registry.register("alice", "two").unwrap_err();
        assert!(matches!(err, RegistryError::PrincipalExists));
    }

    #[test]
    fn unknown_identifier_is_reported() {
        let registry = test_registry();
        let err = registry.authenticate("nobody", "whatever").unwrap_err();
        assert!(matches!(err, RegistryError::UnknownIdentifier));
    }

    #[test]
    fn empty_inputs_are_rejected() {
        let registry = test_registry();

        let err = registry.register("   ", "pass").unwrap_err();
        assert!(matches!(err, RegistryError::MissingIdentifier));

        let err = registry.register("alice", "").unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Passphrase(PassphraseError::MissingPassphrase)
        ));

        let err = registry.authenticate("alice", "").unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Passphrase(PassphraseError::MissingPassphrase)
        ));
    }

    #[test]
    fn identifier_is_trimmed_on_every_operation() {
        let registry = test_registry();
        registry.register("  bob  ", "pass").expect("registration");
        registry
            .authenticate("bob", "pass")
            .expect("authentication should succeed");
    }

    #[test]
    fn change_passphrase_without_value_is_a_no_op() {
        let registry = test_registry();
        let before = registry.register("alice", "original").expect("registration");

        registry
            .change_passphrase("alice", None)
            .expect("no-op update should succeed");

        let stored = registry
            .store()
            .find("alice")
            .expect("lookup")
            .expect("present");
        assert_eq!(stored, before.credential);
        registry
            .authenticate("alice", "original")
            .expect("original passphrase still valid");
    }

    #[test]
    fn change_passphrase_rotates_salt_and_hash() {
        let registry = test_registry();
        let before = registry.register("alice", "original").expect("registration");

        registry
            .change_passphrase("alice", Some("rotated"))
            .expect("update should succeed");

        let stored = registry
            .store()
            .find("alice")
            .expect("lookup")
            .expect("present");
        assert_ne!(stored.salt, before.credential.salt);
        assert_ne!(stored.hash, before.credential.hash);

        registry
            .authenticate("alice", "rotated")
            .expect("new passphrase should authenticate");
        let err = registry.authenticate("alice", "original").unwrap_err();
        assert!(matches!(err, RegistryError::IncorrectPassphrase));
    }

    #[test]
    fn change_passphrase_for_unknown_identifier_fails() {
        let registry = test_registry();
        let err = registry
            .change_passphrase("nobody", Some("pass"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownIdentifier));
    }

    #[test]
    fn memory_store_enforces_uniqueness() {
        let store = MemoryStore::new();
        let pair = crate::crypto::passphrase::CredentialPair {
            salt: "00".into(),
            hash: "ff".into(),
        };
        store.insert("alice", pair.clone()).expect("first insert");
        let err = store.insert("alice", pair.clone()).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateIdentifier));

        let err = store.update("nobody", pair).unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn principals_snapshot_is_sorted() {
        let registry = test_registry();
        registry.register("carol", "p1").expect("register");
        registry.register("alice", "p2").expect("register");
        registry.register("bob", "p3").expect("register");

        let names: Vec<String> = registry
            .store()
            .principals()
            .expect("snapshot")
            .into_iter()
            .map(|p| p.identifier)
            .collect();
        assert_eq!(names, ["alice", "bob", "carol"]);
    }
}
