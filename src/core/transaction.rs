//! Transaction container
//!
//! A minimal UTXO transaction: inputs reference previous outputs and carry
//! a signature script, outputs carry a value and a lock script. Byte
//! fields serialize as hex strings in JSON.

use serde::{Deserialize, Serialize};

use crate::crypto::double_sha256;

// =============================================================================
// Constants
// =============================================================================

/// Current transaction version
pub const TX_VERSION: u32 = 2;

/// Sequence number that disables locktime
pub const SEQUENCE_FINAL: u32 = 0xFFFFFFFF;

// =============================================================================
// Hex serde helpers
// =============================================================================

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

mod hex_hash {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hash: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected a 32 byte hash"))
    }
}

// =============================================================================
// Transaction Input
// =============================================================================

/// Reference to a previous transaction output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutPoint {
    /// Hash of the previous transaction
    #[serde(with = "hex_hash")]
    pub hash: [u8; 32],
    /// Index of the output in the previous transaction
    pub index: u32,
}

impl OutPoint {
    pub fn new(hash: [u8; 32], index: u32) -> Self {
        Self { hash, index }
    }
}

/// Transaction input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIn {
    pub previous_output: OutPoint,
    /// Unlocking script, empty until signed
    #[serde(with = "hex_bytes", default)]
    pub signature_script: Vec<u8>,
    #[serde(default = "default_sequence")]
    pub sequence: u32,
}

fn default_sequence() -> u32 {
    SEQUENCE_FINAL
}

impl TxIn {
    /// Create an unsigned input spending `previous_output`
    pub fn new(previous_output: OutPoint) -> Self {
        Self {
            previous_output,
            signature_script: Vec::new(),
            sequence: SEQUENCE_FINAL,
        }
    }
}

// =============================================================================
// Transaction Output
// =============================================================================

/// Transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    /// Amount of coins
    pub value: u64,
    /// Lock script guarding the output
    #[serde(with = "hex_bytes")]
    pub pk_script: Vec<u8>,
}

impl TxOut {
    pub fn new(value: u64, pk_script: Vec<u8>) -> Self {
        Self { value, pk_script }
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A transaction being signed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default = "default_version")]
    pub version: u32,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    #[serde(default)]
    pub lock_time: u32,
}

fn default_version() -> u32 {
    TX_VERSION
}

impl Transaction {
    /// Create a new transaction (unsigned)
    pub fn new(inputs: Vec<TxIn>, outputs: Vec<TxOut>) -> Self {
        Self {
            version: TX_VERSION,
            inputs,
            outputs,
            lock_time: 0,
        }
    }

    /// Binary serialization used for hashing
    ///
    /// Layout: version, inputs, outputs, lock time; integers little
    /// endian, counts and script lengths as compact-size varints.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.serialized_size_hint());
        out.extend_from_slice(&self.version.to_le_bytes());

        write_compact_size(&mut out, self.inputs.len() as u64);
        for input in &self.inputs {
            out.extend_from_slice(&input.previous_output.hash);
            out.extend_from_slice(&input.previous_output.index.to_le_bytes());
            write_compact_size(&mut out, input.signature_script.len() as u64);
            out.extend_from_slice(&input.signature_script);
            out.extend_from_slice(&input.sequence.to_le_bytes());
        }

        write_compact_size(&mut out, self.outputs.len() as u64);
        for output in &self.outputs {
            out.extend_from_slice(&output.value.to_le_bytes());
            write_compact_size(&mut out, output.pk_script.len() as u64);
            out.extend_from_slice(&output.pk_script);
        }

        out.extend_from_slice(&self.lock_time.to_le_bytes());
        out
    }

    /// Transaction id: double SHA-256 of the serialization
    pub fn txid(&self) -> [u8; 32] {
        double_sha256(&self.serialize())
    }

    /// Transaction id as a hex string
    pub fn txid_hex(&self) -> String {
        hex::encode(self.txid())
    }

    fn serialized_size_hint(&self) -> usize {
        let inputs: usize = self
            .inputs
            .iter()
            .map(|i| 32 + 4 + 9 + i.signature_script.len() + 4)
            .sum();
        let outputs: usize = self
            .outputs
            .iter()
            .map(|o| 8 + 9 + o.pk_script.len())
            .sum();
        4 + 9 + inputs + 9 + outputs + 4
    }
}

/// Append a compact-size varint
pub fn write_compact_size(out: &mut Vec<u8>, n: u64) {
    match n {
        0..=0xfc => out.push(n as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x10000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&n.to_le_bytes());
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx() -> Transaction {
        Transaction::new(
            vec![TxIn::new(OutPoint::new([1; 32], 0))],
            vec![TxOut::new(5000, vec![0x00, 0x01, 0x02])],
        )
    }

    #[test]
    fn test_compact_size() {
        let mut out = Vec::new();
        write_compact_size(&mut out, 0xfc);
        write_compact_size(&mut out, 0xfd);
        write_compact_size(&mut out, 0x1_0000);
        assert_eq!(out, vec![0xfc, 0xfd, 0xfd, 0x00, 0xfe, 0x00, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn test_serialize_layout() {
        let tx = sample_tx();
        let bytes = tx.serialize();
        // version + 1 input (32 + 4 + 1 + 0 + 4) + 1 output (8 + 1 + 3) + locktime
        assert_eq!(bytes.len(), 4 + 1 + 41 + 1 + 12 + 4);
        assert_eq!(&bytes[..4], &TX_VERSION.to_le_bytes());
    }

    #[test]
    fn test_txid_changes_with_script() {
        let tx = sample_tx();
        let mut signed = tx.clone();
        signed.inputs[0].signature_script = vec![0x02, 0x01];
        assert_ne!(tx.txid(), signed.txid());
    }

    #[test]
    fn test_json_roundtrip() {
        let tx = sample_tx();
        let json = serde_json::to_string(&tx).unwrap();
        assert!(json.contains("\"pk_script\":\"000102\""));
        let decoded: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, tx);
    }
}
