//! Signature hashes
//!
//! The digest that is actually signed for an input. Which parts of the
//! transaction it covers is selected by the hash type carried in the
//! `SIGNTEXT` tag of the sub-script being signed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::transaction::{Transaction, TxOut};
use crate::crypto::double_sha256;
use crate::script::{decode, Token};

/// Signature hash errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SighashError {
    #[error("Input index {index} out of range (transaction has {inputs} inputs)")]
    InputIndexOutOfRange { index: usize, inputs: usize },
    #[error("SIGHASH_SINGLE for input {index} but transaction has only {outputs} outputs")]
    NoSingleOutput { index: usize, outputs: usize },
}

// =============================================================================
// Signature Hash Types
// =============================================================================

/// Signature hash type determines what parts of the transaction are signed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum SigHashType {
    /// Sign all inputs and all outputs (default)
    All = 0x01,
    /// Sign all inputs but no outputs (blank check)
    None = 0x02,
    /// Sign all inputs and only the output with same index
    Single = 0x03,
    /// SIGHASH_ALL | SIGHASH_ANYONECANPAY
    AllAnyoneCanPay = 0x81,
    /// SIGHASH_NONE | SIGHASH_ANYONECANPAY
    NoneAnyoneCanPay = 0x82,
    /// SIGHASH_SINGLE | SIGHASH_ANYONECANPAY
    SingleAnyoneCanPay = 0x83,
}

impl Default for SigHashType {
    fn default() -> Self {
        SigHashType::All
    }
}

/// ANYONECANPAY flag bit
pub const SIGHASH_ANYONECANPAY: u8 = 0x80;

/// Mask selecting the base hash type
pub const SIGHASH_MASK: u8 = 0x1f;

impl SigHashType {
    /// Parse sighash type from byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(SigHashType::All),
            0x02 => Some(SigHashType::None),
            0x03 => Some(SigHashType::Single),
            0x81 => Some(SigHashType::AllAnyoneCanPay),
            0x82 => Some(SigHashType::NoneAnyoneCanPay),
            0x83 => Some(SigHashType::SingleAnyoneCanPay),
            _ => None,
        }
    }

    /// Parse the names accepted on the command line
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "all" => Some(SigHashType::All),
            "none" => Some(SigHashType::None),
            "single" => Some(SigHashType::Single),
            "all|anyonecanpay" => Some(SigHashType::AllAnyoneCanPay),
            "none|anyonecanpay" => Some(SigHashType::NoneAnyoneCanPay),
            "single|anyonecanpay" => Some(SigHashType::SingleAnyoneCanPay),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Check if this sighash includes ANYONECANPAY flag
    pub fn is_anyone_can_pay(&self) -> bool {
        (*self as u8) & SIGHASH_ANYONECANPAY != 0
    }

    /// Get the base type (without ANYONECANPAY flag)
    pub fn base_type(&self) -> SigHashType {
        match (*self as u8) & SIGHASH_MASK {
            0x02 => SigHashType::None,
            0x03 => SigHashType::Single,
            _ => SigHashType::All,
        }
    }
}

/// Sign-text sub-script `SIGNTEXT hashType` whose digest a signature commits to
pub fn sign_text_script(hash_type: SigHashType) -> Vec<u8> {
    vec![crate::script::OpCode::SignText.to_byte(), hash_type.to_byte()]
}

// =============================================================================
// Signature Hash Computation
// =============================================================================

/// Computes the 32-byte digest signed for one input
pub trait SignatureHasher: Sync {
    fn signature_hash(
        &self,
        tx: &Transaction,
        input_index: usize,
        sub_script: &[u8],
    ) -> Result<[u8; 32], SighashError>;
}

/// Legacy-style signature hash over a masked copy of the transaction
///
/// The signed input's script is replaced by the sub-script, every other
/// input script is emptied, and outputs/inputs are pruned according to the
/// hash type found in the sub-script's trailing `SIGNTEXT` tag (ALL if
/// there is none). The digest is `sha256d(serialize(copy) || hashType:u32)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LegacyHasher;

impl LegacyHasher {
    fn hash_type_of(sub_script: &[u8]) -> u8 {
        match decode(sub_script).ok().and_then(|tokens| tokens.last().cloned()) {
            Some(Token::SignText(tag)) => tag,
            _ => SigHashType::All.to_byte(),
        }
    }
}

impl SignatureHasher for LegacyHasher {
    fn signature_hash(
        &self,
        tx: &Transaction,
        input_index: usize,
        sub_script: &[u8],
    ) -> Result<[u8; 32], SighashError> {
        if input_index >= tx.inputs.len() {
            return Err(SighashError::InputIndexOutOfRange {
                index: input_index,
                inputs: tx.inputs.len(),
            });
        }

        let hash_type = Self::hash_type_of(sub_script);
        let base = hash_type & SIGHASH_MASK;
        let mut copy = tx.clone();

        for (i, input) in copy.inputs.iter_mut().enumerate() {
            input.signature_script = if i == input_index {
                sub_script.to_vec()
            } else {
                Vec::new()
            };
        }

        if base == SigHashType::None.to_byte() {
            copy.outputs.clear();
            zero_other_sequences(&mut copy, input_index);
        } else if base == SigHashType::Single.to_byte() {
            if input_index >= copy.outputs.len() {
                return Err(SighashError::NoSingleOutput {
                    index: input_index,
                    outputs: copy.outputs.len(),
                });
            }
            copy.outputs.truncate(input_index + 1);
            for output in copy.outputs.iter_mut().take(input_index) {
                *output = TxOut::new(u64::MAX, Vec::new());
            }
            zero_other_sequences(&mut copy, input_index);
        }

        if hash_type & SIGHASH_ANYONECANPAY != 0 {
            let own = copy.inputs.swap_remove(input_index);
            copy.inputs = vec![own];
        }

        let mut preimage = copy.serialize();
        preimage.extend_from_slice(&u32::from(hash_type).to_le_bytes());
        Ok(double_sha256(&preimage))
    }
}

fn zero_other_sequences(tx: &mut Transaction, input_index: usize) {
    for (i, input) in tx.inputs.iter_mut().enumerate() {
        if i != input_index {
            input.sequence = 0;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::{OutPoint, TxIn};

    fn two_in_two_out() -> Transaction {
        Transaction::new(
            vec![
                TxIn::new(OutPoint::new([1; 32], 0)),
                TxIn::new(OutPoint::new([2; 32], 1)),
            ],
            vec![TxOut::new(100, vec![1]), TxOut::new(200, vec![2])],
        )
    }

    #[test]
    fn test_sighash_types() {
        assert_eq!(SigHashType::default(), SigHashType::All);
        assert!(!SigHashType::All.is_anyone_can_pay());
        assert!(SigHashType::AllAnyoneCanPay.is_anyone_can_pay());
        assert_eq!(SigHashType::AllAnyoneCanPay.base_type(), SigHashType::All);
        assert_eq!(SigHashType::from_byte(0x83), Some(SigHashType::SingleAnyoneCanPay));
        assert_eq!(SigHashType::from_name("NONE"), Some(SigHashType::None));
    }

    #[test]
    fn test_hash_depends_on_hash_type() {
        let tx = two_in_two_out();
        let all = LegacyHasher
            .signature_hash(&tx, 0, &sign_text_script(SigHashType::All))
            .unwrap();
        let none = LegacyHasher
            .signature_hash(&tx, 0, &sign_text_script(SigHashType::None))
            .unwrap();
        assert_ne!(all, none);
    }

    #[test]
    fn test_none_ignores_outputs() {
        let tx = two_in_two_out();
        let mut changed = tx.clone();
        changed.outputs[1].value = 999;

        let script = sign_text_script(SigHashType::None);
        assert_eq!(
            LegacyHasher.signature_hash(&tx, 0, &script).unwrap(),
            LegacyHasher.signature_hash(&changed, 0, &script).unwrap()
        );

        let script = sign_text_script(SigHashType::All);
        assert_ne!(
            LegacyHasher.signature_hash(&tx, 0, &script).unwrap(),
            LegacyHasher.signature_hash(&changed, 0, &script).unwrap()
        );
    }

    #[test]
    fn test_single_covers_only_matching_output() {
        let tx = two_in_two_out();
        let mut changed = tx.clone();
        changed.outputs[1].value = 999;

        let script = sign_text_script(SigHashType::Single);
        assert_eq!(
            LegacyHasher.signature_hash(&tx, 0, &script).unwrap(),
            LegacyHasher.signature_hash(&changed, 0, &script).unwrap()
        );
        assert_ne!(
            LegacyHasher.signature_hash(&tx, 1, &script).unwrap(),
            LegacyHasher.signature_hash(&changed, 1, &script).unwrap()
        );
    }

    #[test]
    fn test_anyone_can_pay_ignores_other_inputs() {
        let tx = two_in_two_out();
        let mut changed = tx.clone();
        changed.inputs[1].previous_output.index = 7;

        let script = sign_text_script(SigHashType::AllAnyoneCanPay);
        assert_eq!(
            LegacyHasher.signature_hash(&tx, 0, &script).unwrap(),
            LegacyHasher.signature_hash(&changed, 0, &script).unwrap()
        );
    }

    #[test]
    fn test_other_input_scripts_are_ignored() {
        let tx = two_in_two_out();
        let mut signed = tx.clone();
        signed.inputs[1].signature_script = vec![0x02, 0x01];

        let script = sign_text_script(SigHashType::All);
        assert_eq!(
            LegacyHasher.signature_hash(&tx, 0, &script).unwrap(),
            LegacyHasher.signature_hash(&signed, 0, &script).unwrap()
        );
    }

    #[test]
    fn test_errors() {
        let tx = two_in_two_out();
        let script = sign_text_script(SigHashType::All);
        assert!(matches!(
            LegacyHasher.signature_hash(&tx, 2, &script),
            Err(SighashError::InputIndexOutOfRange { index: 2, inputs: 2 })
        ));

        let mut short = tx.clone();
        short.outputs.truncate(1);
        assert!(matches!(
            LegacyHasher.signature_hash(&short, 1, &sign_text_script(SigHashType::Single)),
            Err(SighashError::NoSingleOutput { index: 1, outputs: 1 })
        ));
    }
}
