//! Hashing utilities used by the signing engine
//!
//! Provides SHA-256 based digests for signature hashes and the
//! RIPEMD160(SHA256(x)) digest used by every address kind.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Length of a hash160 digest in bytes
pub const HASH160_LEN: usize = 20;

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes double SHA-256 hash (SHA-256 of SHA-256)
/// Used for signature hashes and address checksums
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Computes RIPEMD160(SHA256(data))
///
/// Public-key hashes, script hashes and multisig addresses are all
/// derived with this digest.
pub fn hash160(data: &[u8]) -> [u8; HASH160_LEN] {
    let mut ripemd = Ripemd160::new();
    ripemd.update(sha256(data));
    ripemd.finalize().into()
}

/// Computes hash160 and returns it as a hex string
pub fn hash160_hex(data: &[u8]) -> String {
    hex::encode(hash160(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256() {
        let data = b"hello world";
        assert_eq!(
            hex::encode(sha256(data)),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_double_sha256() {
        let data = b"hello world";
        assert_eq!(double_sha256(data), sha256(&sha256(data)));
    }

    #[test]
    fn test_hash160_empty() {
        // Well known RIPEMD160(SHA256("")) value
        assert_eq!(
            hash160_hex(b""),
            "b472a266d0bd89c13706a4132ccfb16f7c3b9fcb"
        );
    }
}
