//! Network parameters
//!
//! Each network assigns a one-byte version identifier to every address
//! kind. The identifiers appear both in lock scripts and in the address
//! slots of multisig bodies.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::address::AddressKind;

/// Chain parameter errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamsError {
    #[error("Address id 0x{0:02x} is used by more than one address kind")]
    DuplicateAddressId(u8),
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),
}

/// Network-specific address version identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParams {
    /// Network name
    pub name: String,
    /// Version id of pay-to-pubkey-hash addresses
    pub pubkey_hash_addr_id: u8,
    /// Version id of pay-to-script-hash addresses
    pub script_hash_addr_id: u8,
    /// Version id of multisig addresses
    pub multisig_addr_id: u8,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl ChainParams {
    pub fn mainnet() -> Self {
        Self {
            name: "mainnet".to_string(),
            pubkey_hash_addr_id: 0x00,
            script_hash_addr_id: 0x05,
            multisig_addr_id: 0x0d,
        }
    }

    pub fn testnet() -> Self {
        Self {
            name: "testnet".to_string(),
            pubkey_hash_addr_id: 0x6f,
            script_hash_addr_id: 0xc4,
            multisig_addr_id: 0x7d,
        }
    }

    pub fn regtest() -> Self {
        Self {
            name: "regtest".to_string(),
            ..Self::testnet()
        }
    }

    /// Look up a preset by network name
    pub fn by_name(name: &str) -> Result<Self, ParamsError> {
        match name {
            "mainnet" | "main" => Ok(Self::mainnet()),
            "testnet" | "test" => Ok(Self::testnet()),
            "regtest" => Ok(Self::regtest()),
            other => Err(ParamsError::UnknownNetwork(other.to_string())),
        }
    }

    /// Version id used for an address kind
    pub fn addr_id(&self, kind: AddressKind) -> u8 {
        match kind {
            AddressKind::PubKeyHash => self.pubkey_hash_addr_id,
            AddressKind::ScriptHash => self.script_hash_addr_id,
            AddressKind::MultiSig => self.multisig_addr_id,
        }
    }

    /// Address kind identified by a version id, if any
    pub fn address_kind(&self, id: u8) -> Option<AddressKind> {
        if id == self.pubkey_hash_addr_id {
            Some(AddressKind::PubKeyHash)
        } else if id == self.script_hash_addr_id {
            Some(AddressKind::ScriptHash)
        } else if id == self.multisig_addr_id {
            Some(AddressKind::MultiSig)
        } else {
            None
        }
    }

    /// The three ids must be pairwise distinct
    pub fn validate(&self) -> Result<(), ParamsError> {
        let ids = [
            self.pubkey_hash_addr_id,
            self.script_hash_addr_id,
            self.multisig_addr_id,
        ];
        for i in 0..ids.len() {
            for j in i + 1..ids.len() {
                if ids[i] == ids[j] {
                    return Err(ParamsError::DuplicateAddressId(ids[i]));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for params in [
            ChainParams::mainnet(),
            ChainParams::testnet(),
            ChainParams::regtest(),
        ] {
            assert!(params.validate().is_ok());
        }
    }

    #[test]
    fn test_address_kind_lookup() {
        let params = ChainParams::mainnet();
        for kind in [
            AddressKind::PubKeyHash,
            AddressKind::ScriptHash,
            AddressKind::MultiSig,
        ] {
            assert_eq!(params.address_kind(params.addr_id(kind)), Some(kind));
        }
        assert_eq!(params.address_kind(0xee), None);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let params = ChainParams {
            multisig_addr_id: 0x05,
            ..ChainParams::mainnet()
        };
        assert_eq!(params.validate(), Err(ParamsError::DuplicateAddressId(0x05)));
    }

    #[test]
    fn test_by_name() {
        assert_eq!(ChainParams::by_name("testnet").unwrap(), ChainParams::testnet());
        assert!(ChainParams::by_name("nope").is_err());
    }
}
