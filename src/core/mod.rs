//! Chain-level types consumed by the signing engine
//!
//! This module contains:
//! - Network parameters (address version ids)
//! - Addresses (kind-tagged hash160, Base58Check)
//! - Lock script classification
//! - Transactions and their binary serialization
//! - Signature hash computation

pub mod address;
pub mod class;
pub mod params;
pub mod sighash;
pub mod transaction;

pub use address::{Address, AddressError, AddressKind};
pub use class::{
    classify, Classification, ClassifyError, ScriptClass, DISCRIMINATOR_OFFSET, LOCK_SCRIPT_LEN,
};
pub use params::{ChainParams, ParamsError};
pub use sighash::{sign_text_script, LegacyHasher, SigHashType, SighashError, SignatureHasher};
pub use transaction::{OutPoint, Transaction, TxIn, TxOut, SEQUENCE_FINAL, TX_VERSION};
