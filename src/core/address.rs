//! Addresses
//!
//! An address is a 20-byte hash tagged with its kind. On the wire the kind
//! is encoded as the network's one-byte version id; for display the same
//! `[id][hash]` payload is Base58Check encoded.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::params::ChainParams;
use crate::crypto::{double_sha256, hash160, HASH160_LEN};
use crate::script::OpCode;

/// Address decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid base58 encoding")]
    InvalidEncoding,
    #[error("Invalid address length: {0}")]
    InvalidLength(usize),
    #[error("Checksum mismatch")]
    ChecksumMismatch,
    #[error("Unknown address version 0x{0:02x}")]
    UnknownVersion(u8),
}

/// The three address kinds a script can refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressKind {
    /// Hash of a public key
    PubKeyHash,
    /// Hash of a redeem script
    ScriptHash,
    /// Hash of a multisig body
    MultiSig,
}

impl AddressKind {
    /// Lock script discriminator for this kind
    pub fn pay_opcode(self) -> OpCode {
        match self {
            AddressKind::PubKeyHash => OpCode::Pay2Pkh,
            AddressKind::ScriptHash => OpCode::Pay2ScriptHash,
            AddressKind::MultiSig => OpCode::PayMultisig,
        }
    }
}

impl std::fmt::Display for AddressKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AddressKind::PubKeyHash => "pubkeyhash",
            AddressKind::ScriptHash => "scripthash",
            AddressKind::MultiSig => "multisig",
        };
        f.write_str(name)
    }
}

/// A kind-tagged 20-byte hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    kind: AddressKind,
    hash: [u8; HASH160_LEN],
}

impl Address {
    pub fn new(kind: AddressKind, hash: [u8; HASH160_LEN]) -> Self {
        Self { kind, hash }
    }

    pub fn pubkey_hash(hash: [u8; HASH160_LEN]) -> Self {
        Self::new(AddressKind::PubKeyHash, hash)
    }

    pub fn script_hash(hash: [u8; HASH160_LEN]) -> Self {
        Self::new(AddressKind::ScriptHash, hash)
    }

    pub fn multisig(hash: [u8; HASH160_LEN]) -> Self {
        Self::new(AddressKind::MultiSig, hash)
    }

    /// Pubkey-hash address of a serialized public key
    pub fn from_public_key(public_key: &[u8]) -> Self {
        Self::pubkey_hash(hash160(public_key))
    }

    /// Address committing to a script (script-hash or multisig kind)
    pub fn from_script(kind: AddressKind, script: &[u8]) -> Self {
        Self::new(kind, hash160(script))
    }

    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    pub fn hash(&self) -> &[u8; HASH160_LEN] {
        &self.hash
    }

    /// `[id][hash]`, the payload of an address slot push
    pub fn to_payload(&self, params: &ChainParams) -> Vec<u8> {
        let mut payload = Vec::with_capacity(1 + HASH160_LEN);
        payload.push(params.addr_id(self.kind));
        payload.extend_from_slice(&self.hash);
        payload
    }

    /// Parse an `[id][hash]` payload; `None` if the id is not an address id
    pub fn from_payload(payload: &[u8], params: &ChainParams) -> Option<Self> {
        if payload.len() != 1 + HASH160_LEN {
            return None;
        }
        let kind = params.address_kind(payload[0])?;
        let mut hash = [0u8; HASH160_LEN];
        hash.copy_from_slice(&payload[1..]);
        Some(Self { kind, hash })
    }

    /// Standard lock script paying to this address: `[id][hash][pay-op]`
    pub fn lock_script(&self, params: &ChainParams) -> Vec<u8> {
        let mut script = self.to_payload(params);
        script.push(self.kind.pay_opcode().to_byte());
        script
    }

    /// Base58Check encoding
    pub fn encode(&self, params: &ChainParams) -> String {
        let mut bytes = self.to_payload(params);
        let checksum = double_sha256(&bytes);
        bytes.extend_from_slice(&checksum[..4]);
        bs58::encode(bytes).into_string()
    }

    /// Decode a Base58Check address for the given network
    pub fn decode(encoded: &str, params: &ChainParams) -> Result<Self, AddressError> {
        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|_| AddressError::InvalidEncoding)?;
        if bytes.len() != 1 + HASH160_LEN + 4 {
            return Err(AddressError::InvalidLength(bytes.len()));
        }

        let (payload, checksum) = bytes.split_at(1 + HASH160_LEN);
        if double_sha256(payload)[..4] != checksum[..] {
            return Err(AddressError::ChecksumMismatch);
        }

        Self::from_payload(payload, params).ok_or(AddressError::UnknownVersion(payload[0]))
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, hex::encode(self.hash))
    }
}
