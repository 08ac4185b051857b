//! Credential registration and verification built around salted PBKDF2.
//! This crate is deliberately small and transparent so raw passphrases never
//! outlive the call that hashes or checks them, and the stored format stays
//! auditable in-repo.

pub mod config;
pub mod crypto;
pub mod registry;
