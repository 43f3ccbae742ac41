//! Signature primitive and pay-to-pubkey-hash signature scripts

use secp256k1::SecretKey;

use super::SignError;
use crate::core::{sign_text_script, SigHashType, SignatureHasher, Transaction, DISCRIMINATOR_OFFSET};
use crate::crypto::{sign_digest, KeyPair};
use crate::script::{OpCode, ScriptBuilder};

/// Sign the signature hash of `sub_script` for one input
///
/// Returns the DER encoded signature. Signing is deterministic (RFC6979).
pub fn raw_tx_in_signature(
    tx: &Transaction,
    input_index: usize,
    sub_script: &[u8],
    key: &SecretKey,
    hasher: &dyn SignatureHasher,
) -> Result<Vec<u8>, SignError> {
    let digest = hasher.signature_hash(tx, input_index, sub_script)?;
    Ok(sign_digest(key, &digest)?)
}

/// Signature script spending a pay-to-pubkey-hash lock
///
/// Emits `PUSH(pubkey) PUSH(signature) SIGNTEXT(hashType)`; the signature
/// commits to the sign-text sub-script `SIGNTEXT hashType`.
pub fn signature_script(
    tx: &Transaction,
    input_index: usize,
    lock_script: &[u8],
    key: &SecretKey,
    compressed: bool,
    hash_type: SigHashType,
    hasher: &dyn SignatureHasher,
) -> Result<Vec<u8>, SignError> {
    let discriminator = lock_script.get(DISCRIMINATOR_OFFSET).copied();
    match discriminator.and_then(OpCode::from_byte) {
        Some(OpCode::Pay2Pkh) => {}
        Some(OpCode::PayMultisig) => {
            return Err(SignError::NotImplemented(
                "multisig locks are signed through the multisig resolver",
            ))
        }
        _ => {
            return Err(SignError::UnsupportedLockKind(match discriminator {
                Some(byte) => format!("discriminator 0x{:02x}", byte),
                None => format!("lock script of {} bytes", lock_script.len()),
            }))
        }
    }

    let [public_key, signature] =
        key_pushes(tx, input_index, key, compressed, hash_type, hasher)?;

    let mut builder = ScriptBuilder::new();
    builder
        .push_data(&public_key)?
        .push_data(&signature)?
        .sign_text(hash_type.to_byte());
    Ok(builder.into_bytes())
}

/// Serialized public key and signature over the sign-text digest
pub(crate) fn key_pushes(
    tx: &Transaction,
    input_index: usize,
    key: &SecretKey,
    compressed: bool,
    hash_type: SigHashType,
    hasher: &dyn SignatureHasher,
) -> Result<[Vec<u8>; 2], SignError> {
    let signature = raw_tx_in_signature(tx, input_index, &sign_text_script(hash_type), key, hasher)?;
    let public_key = KeyPair::from_secret_key(*key).public_key_bytes(compressed);
    Ok([public_key, signature])
}
