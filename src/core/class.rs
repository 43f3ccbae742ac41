//! Lock script classification
//!
//! Standard lock scripts have the fixed layout
//!
//! ```text
//! [address-id:1][hash160:20][pay-op:1]
//! ```
//!
//! where the trailing pay opcode is the lock's discriminator. A script
//! starting with `RETURN` is a data carrier.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::address::{Address, AddressKind};
use super::params::ChainParams;
use crate::crypto::HASH160_LEN;
use crate::script::OpCode;

/// Length of a standard address-bearing lock script
pub const LOCK_SCRIPT_LEN: usize = 1 + HASH160_LEN + 1;

/// Offset of the pay opcode inside a standard lock script
pub const DISCRIMINATOR_OFFSET: usize = 1 + HASH160_LEN;

/// Lock scripts that cannot be parsed at all
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("Empty lock script")]
    Empty,
    #[error("Lock script for {kind} address truncated at {len} bytes")]
    Truncated { kind: AddressKind, len: usize },
}

/// Class of a lock script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptClass {
    PubKeyHash,
    ScriptHash,
    MultiSig,
    NullData,
    Unknown,
}

impl std::fmt::Display for ScriptClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ScriptClass::PubKeyHash => "pubkeyhash",
            ScriptClass::ScriptHash => "scripthash",
            ScriptClass::MultiSig => "multisig",
            ScriptClass::NullData => "nulldata",
            ScriptClass::Unknown => "nonstandard",
        };
        f.write_str(name)
    }
}

/// Result of classifying a lock script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub class: ScriptClass,
    /// Addresses embedded in the lock
    pub addresses: Vec<Address>,
    /// Nominal number of signatures required.
    /// For multisig locks the real threshold lives in the redeem body.
    pub required: usize,
}

impl Classification {
    fn without_addresses(class: ScriptClass) -> Self {
        Self {
            class,
            addresses: Vec::new(),
            required: 0,
        }
    }
}

/// Classify a lock script and extract its addresses
pub fn classify(lock_script: &[u8], params: &ChainParams) -> Result<Classification, ClassifyError> {
    let first = *lock_script.first().ok_or(ClassifyError::Empty)?;

    if first == OpCode::Return.to_byte() {
        return Ok(Classification::without_addresses(ScriptClass::NullData));
    }

    let kind = match params.address_kind(first) {
        Some(kind) => kind,
        None => return Ok(Classification::without_addresses(ScriptClass::Unknown)),
    };

    if lock_script.len() < LOCK_SCRIPT_LEN {
        return Err(ClassifyError::Truncated {
            kind,
            len: lock_script.len(),
        });
    }
    if lock_script.len() > LOCK_SCRIPT_LEN
        || lock_script[DISCRIMINATOR_OFFSET] != kind.pay_opcode().to_byte()
    {
        return Ok(Classification::without_addresses(ScriptClass::Unknown));
    }

    let address = match Address::from_payload(&lock_script[..DISCRIMINATOR_OFFSET], params) {
        Some(address) => address,
        None => return Ok(Classification::without_addresses(ScriptClass::Unknown)),
    };

    let class = match kind {
        AddressKind::PubKeyHash => ScriptClass::PubKeyHash,
        AddressKind::ScriptHash => ScriptClass::ScriptHash,
        AddressKind::MultiSig => ScriptClass::MultiSig,
    };

    Ok(Classification {
        class,
        addresses: vec![address],
        required: 1,
    })
}
