//! Signature script production
//!
//! This module contains:
//! - Key and script lookup capabilities ([`KeyDb`], [`ScriptDb`])
//! - The raw signature primitive and the pay-to-pubkey-hash signer
//! - The recursive multisig resolver
//! - The lock script dispatcher
//! - The top-level driver ([`TxSigner`], [`sign_tx_output`])

pub mod db;
pub mod dispatch;
pub mod multisig;
pub mod output;
pub mod raw;

use thiserror::Error;

use crate::core::{ClassifyError, ScriptClass, SighashError};
use crate::crypto::KeyError;
use crate::script::ScriptError;

pub use db::{KeyDb, LookupError, MemoryKeyDb, MemoryScriptDb, NoScripts, ResolvedKey, ScriptDb};
pub use dispatch::Resolution;
pub use multisig::MultisigOutcome;
pub use output::{sign_tx_output, TxSigner};
pub use raw::{raw_tx_in_signature, signature_script};

/// Signing errors
///
/// Missing keys and scripts are not errors; they surface as an absent
/// signature script.
#[derive(Error, Debug)]
pub enum SignError {
    #[error("Cannot classify lock script: {0}")]
    Classification(#[from] ClassifyError),
    #[error("Unsupported lock kind: {0}")]
    UnsupportedLockKind(String),
    #[error("Lock script class {0} cannot be signed")]
    Unsignable(ScriptClass),
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("Signing failed: {0}")]
    Signing(String),
    #[error("Malformed script: {0}")]
    MalformedScript(ScriptError),
    #[error("Recursion limit of {0} exceeded")]
    RecursionLimitExceeded(usize),
    #[error(transparent)]
    LookupFailed(#[from] LookupError),
}

impl From<ScriptError> for SignError {
    fn from(err: ScriptError) -> Self {
        match err {
            ScriptError::NestingTooDeep(limit) => SignError::RecursionLimitExceeded(limit),
            other => SignError::MalformedScript(other),
        }
    }
}

impl From<KeyError> for SignError {
    fn from(err: KeyError) -> Self {
        SignError::Signing(err.to_string())
    }
}

impl From<SighashError> for SignError {
    fn from(err: SighashError) -> Self {
        SignError::Signing(err.to_string())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use secp256k1::SecretKey;

    use crate::core::{ChainParams, OutPoint, Transaction, TxIn, TxOut};
    use crate::crypto::KeyPair;

    pub fn params() -> ChainParams {
        ChainParams::mainnet()
    }

    pub fn key(byte: u8) -> KeyPair {
        KeyPair::from_secret_key(SecretKey::from_slice(&[byte; 32]).unwrap())
    }

    /// Two inputs, two outputs; tests sign input 0
    pub fn spend_tx() -> Transaction {
        Transaction::new(
            vec![
                TxIn::new(OutPoint::new([0x11; 32], 0)),
                TxIn::new(OutPoint::new([0x22; 32], 3)),
            ],
            vec![
                TxOut::new(50_000, vec![0x00; 22]),
                TxOut::new(12_500, vec![0x05; 22]),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nesting_error_maps_to_recursion_limit() {
        let err: SignError = ScriptError::NestingTooDeep(4).into();
        assert!(matches!(err, SignError::RecursionLimitExceeded(4)));

        let err: SignError = ScriptError::MissingTerminator(3).into();
        assert!(matches!(err, SignError::MalformedScript(_)));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            SignError::Unsignable(ScriptClass::NullData).to_string(),
            "Lock script class nulldata cannot be signed"
        );
        assert_eq!(
            SignError::from(LookupError("disk".to_string())).to_string(),
            "Lookup failed: disk"
        );
    }
}
