//! Key and script lookup capabilities
//!
//! The engine holds no key or script state. Callers hand it a [`KeyDb`]
//! and a [`ScriptDb`]; both are consulted once per address encountered,
//! nested ones included. Closures implement both traits directly.

use std::collections::HashMap;

use secp256k1::SecretKey;
use thiserror::Error;

use crate::core::{Address, AddressKind};
use crate::crypto::KeyPair;

/// A lookup that failed for reasons other than "not found"
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Lookup failed: {0}")]
pub struct LookupError(pub String);

/// A private key as returned by a [`KeyDb`]
#[derive(Clone)]
pub struct ResolvedKey {
    pub secret_key: SecretKey,
    /// Whether the address was derived from the compressed public key
    pub compressed: bool,
}

impl ResolvedKey {
    pub fn new(secret_key: SecretKey, compressed: bool) -> Self {
        Self {
            secret_key,
            compressed,
        }
    }
}

impl std::fmt::Debug for ResolvedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedKey")
            .field("compressed", &self.compressed)
            .finish_non_exhaustive()
    }
}

/// Resolves an address to the private key controlling it
///
/// Stores are shared by every thread signing with the same `TxSigner`.
pub trait KeyDb: Sync {
    fn get_key(&self, address: &Address) -> Result<Option<ResolvedKey>, LookupError>;
}

/// Resolves a script-hash or multisig address to its redeem script
pub trait ScriptDb: Sync {
    fn get_script(&self, address: &Address) -> Result<Option<Vec<u8>>, LookupError>;
}

impl<F> KeyDb for F
where
    F: Fn(&Address) -> Result<Option<ResolvedKey>, LookupError> + Sync,
{
    fn get_key(&self, address: &Address) -> Result<Option<ResolvedKey>, LookupError> {
        self(address)
    }
}

impl<F> ScriptDb for F
where
    F: Fn(&Address) -> Result<Option<Vec<u8>>, LookupError> + Sync,
{
    fn get_script(&self, address: &Address) -> Result<Option<Vec<u8>>, LookupError> {
        self(address)
    }
}

/// In-memory key store keyed by pubkey-hash address
#[derive(Debug, Default, Clone)]
pub struct MemoryKeyDb {
    keys: HashMap<Address, ResolvedKey>,
}

impl MemoryKeyDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key under the address of its compressed or uncompressed public key
    pub fn insert(&mut self, key: &KeyPair, compressed: bool) -> Address {
        let address = Address::pubkey_hash(key.public_key_hash(compressed));
        self.keys
            .insert(address, ResolvedKey::new(key.secret_key, compressed));
        address
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl KeyDb for MemoryKeyDb {
    fn get_key(&self, address: &Address) -> Result<Option<ResolvedKey>, LookupError> {
        Ok(self.keys.get(address).cloned())
    }
}

/// In-memory redeem script store
#[derive(Debug, Default, Clone)]
pub struct MemoryScriptDb {
    scripts: HashMap<Address, Vec<u8>>,
}

impl MemoryScriptDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a script under its hash160 address of the given kind
    pub fn insert(&mut self, kind: AddressKind, script: Vec<u8>) -> Address {
        let address = Address::from_script(kind, &script);
        self.scripts.insert(address, script);
        address
    }

    /// Register a script under an explicit address
    pub fn insert_at(&mut self, address: Address, script: Vec<u8>) {
        self.scripts.insert(address, script);
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

impl ScriptDb for MemoryScriptDb {
    fn get_script(&self, address: &Address) -> Result<Option<Vec<u8>>, LookupError> {
        Ok(self.scripts.get(address).cloned())
    }
}

/// A store with nothing in it
#[derive(Debug, Default, Clone, Copy)]
pub struct NoScripts;

impl ScriptDb for NoScripts {
    fn get_script(&self, _address: &Address) -> Result<Option<Vec<u8>>, LookupError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> KeyPair {
        KeyPair::from_secret_key(SecretKey::from_slice(&[byte; 32]).unwrap())
    }

    #[test]
    fn test_memory_key_db() {
        let mut db = MemoryKeyDb::new();
        let k = key(1);
        let address = db.insert(&k, true);

        let found = db.get_key(&address).unwrap().unwrap();
        assert_eq!(found.secret_key, k.secret_key);
        assert!(found.compressed);

        let uncompressed = Address::pubkey_hash(k.public_key_hash(false));
        assert!(db.get_key(&uncompressed).unwrap().is_none());
    }

    #[test]
    fn test_memory_script_db_kinds_are_distinct() {
        let mut db = MemoryScriptDb::new();
        let address = db.insert(AddressKind::ScriptHash, vec![1, 2, 3]);
        assert_eq!(db.get_script(&address).unwrap(), Some(vec![1, 2, 3]));

        let same_hash = Address::multisig(*address.hash());
        assert_eq!(db.get_script(&same_hash).unwrap(), None);
    }

    #[test]
    fn test_closures_are_capabilities() {
        let failing = |_: &Address| -> Result<Option<Vec<u8>>, LookupError> {
            Err(LookupError("store offline".to_string()))
        };
        let err = failing.get_script(&Address::script_hash([0; 20])).unwrap_err();
        assert_eq!(err.to_string(), "Lookup failed: store offline");

        let k = key(2);
        let only = Address::pubkey_hash(k.public_key_hash(true));
        let secret = k.secret_key;
        let keys = move |a: &Address| -> Result<Option<ResolvedKey>, LookupError> {
            Ok((*a == only).then(|| ResolvedKey::new(secret, true)))
        };
        assert!(keys.get_key(&only).unwrap().is_some());
        assert!(keys.get_key(&Address::pubkey_hash([0; 20])).unwrap().is_none());
    }
}
