//! Cryptographic utilities for the signing engine
//!
//! This module provides:
//! - SHA-256, double SHA-256 and hash160 digests
//! - ECDSA key management and DER signing (secp256k1)

pub mod hash;
pub mod keys;

pub use hash::{double_sha256, hash160, hash160_hex, sha256, HASH160_LEN};
pub use keys::{
    public_key_from_slice, serialize_public_key, sign_digest, verify_signature, KeyError, KeyPair,
};
