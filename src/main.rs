//! Minimal CLI for credential handling. Commands are intentionally small and
//! auditable so operators can see exactly how passphrases are derived and
//! where credentials are written.

use std::env;
use std::fs;
use std::path::Path;

use serde_json::json;
use warden_rs::config::{load_config, DerivationConfig};
use warden_rs::crypto::passphrase::{set_passphrase, verify_passphrase};
use warden_rs::registry::{MemoryStore, Principal, Registry};

fn print_usage() {
    eprintln!("Usage: warden [-c <config.json>] <command>\nCommands:\n  set-passphrase <plaintext>\n  verify-passphrase <plaintext> <salt> <hash>\n  register <store.json> <identifier> <plaintext>\n  authenticate <store.json> <identifier> <plaintext>\n  load-config <path>");
}

/// A missing store file is an empty store; `register` bootstraps it.
fn read_store(path: &Path) -> Result<Vec<Principal>, String> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path).map_err(|e| format!("store file unreadable: {e}"))?;
    serde_json::from_str(&raw).map_err(|e| format!("store file invalid: {e}"))
}

fn write_store(path: &Path, principals: &[Principal]) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(principals)
        .map_err(|e| format!("store serialization failed: {e}"))?;
    fs::write(path, raw).map_err(|e| format!("store file unwritable: {e}"))
}

fn main() {
    let mut args: Vec<String> = env::args().skip(1).collect();

    let config = if args.len() >= 2 && args[0] == "-c" {
        let path = args[1].clone();
        args.drain(..2);
        match load_config(&path) {
            Ok(cfg) => cfg,
            Err(err) => return eprintln!("config load failed: {err}"),
        }
    } else {
        DerivationConfig::default()
    };

    if args.is_empty() {
        return print_usage();
    }

    match args[0].as_str() {
        "set-passphrase" => {
            if args.len() != 2 {
                return print_usage();
            }
            match set_passphrase(&args[1], &config) {
                Ok(pair) => println!("{}", serde_json::to_string_pretty(&pair).unwrap()),
                Err(err) => eprintln!("derivation failed: {err}"),
            }
        }
        "verify-passphrase" => {
            if args.len() != 4 {
                return print_usage();
            }
            match verify_passphrase(&args[1], &args[2], &args[3], &config) {
                Ok(true) => println!("match"),
                Ok(false) => println!("no-match"),
                Err(err) => eprintln!("verification failed: {err}"),
            }
        }
        "register" => {
            if args.len() != 4 {
                return print_usage();
            }
            let store_path = Path::new(&args[1]);
            let principals = match read_store(store_path) {
                Ok(principals) => principals,
                Err(err) => return eprintln!("{err}"),
            };
            let registry = Registry::new(MemoryStore::from_principals(principals), config);
            if let Err(err) = registry.register(&args[2], &args[3]) {
                return eprintln!("registration failed: {err}");
            }
            let snapshot = match registry.store().principals() {
                Ok(snapshot) => snapshot,
                Err(err) => return eprintln!("store snapshot failed: {err}"),
            };
            match write_store(store_path, &snapshot) {
                Ok(()) => println!("registered {}", args[2].trim()),
                Err(err) => eprintln!("{err}"),
            }
        }
        "authenticate" => {
            if args.len() != 4 {
                return print_usage();
            }
            let principals = match read_store(Path::new(&args[1])) {
                Ok(principals) => principals,
                Err(err) => return eprintln!("{err}"),
            };
            let registry = Registry::new(MemoryStore::from_principals(principals), config);
            match registry.authenticate(&args[2], &args[3]) {
                Ok(principal) => println!("authenticated {}", principal.identifier),
                Err(err) => eprintln!("authentication failed: {err}"),
            }
        }
        "load-config" => {
            if args.len() != 2 {
                return print_usage();
            }
            match load_config(&args[1]) {
                Ok(cfg) => {
                    let printable = json!({
                        "salt_length": cfg.salt_length,
                        "iterations": cfg.iterations,
                        "key_length": cfg.key_length,
                        "encoding": cfg.encoding,
                    });
                    println!("{}", serde_json::to_string_pretty(&printable).unwrap());
                }
                Err(err) => eprintln!("config load failed: {err}"),
            }
        }
        _ => print_usage(),
    }
}
