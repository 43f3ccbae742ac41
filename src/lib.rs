//! Sigscript: signature script production for UTXO transactions
//!
//! This crate builds the signature scripts that unlock transaction outputs:
//! - Pay-to-pubkey-hash signing (ECDSA over secp256k1, DER signatures)
//! - M-of-N multisig bodies resolved incrementally across signers
//! - Nested multisig and pay-to-script-hash members, recursively
//! - Pay-to-script-hash envelopes around any of the above
//!
//! Keys and redeem scripts are supplied through the [`KeyDb`] and
//! [`ScriptDb`] capabilities; the engine itself holds no state.
//!
//! # Example
//!
//! ```rust
//! use sigscript::core::{ChainParams, OutPoint, SigHashType, Transaction, TxIn, TxOut};
//! use sigscript::crypto::KeyPair;
//! use sigscript::script::pay_to_address;
//! use sigscript::signer::{sign_tx_output, MemoryKeyDb, NoScripts};
//!
//! let params = ChainParams::mainnet();
//! let key = KeyPair::generate();
//!
//! let mut keys = MemoryKeyDb::new();
//! let address = keys.insert(&key, true);
//! let lock = pay_to_address(&address, &params);
//!
//! let tx = Transaction::new(
//!     vec![TxIn::new(OutPoint::new([0; 32], 0))],
//!     vec![TxOut::new(1_000, lock.clone())],
//! );
//!
//! let script = sign_tx_output(&params, &tx, 0, &lock, SigHashType::All, &keys, &NoScripts, None)
//!     .unwrap()
//!     .expect("key is known");
//! println!("Signature script: {}", hex::encode(script));
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod crypto;
pub mod script;
pub mod signer;

// Re-export commonly used types
pub use crate::config::{ConfigError, SignerConfig};
pub use crate::core::{Address, AddressKind, ChainParams, ScriptClass, SigHashType, Transaction};
pub use crate::crypto::KeyPair;
pub use crate::script::{MultisigBody, MultisigBuilder};
pub use crate::signer::{
    raw_tx_in_signature, sign_tx_output, signature_script, KeyDb, ScriptDb, SignError, TxSigner,
};
