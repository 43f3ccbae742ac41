//! Signature script encoding
//!
//! This module contains:
//! - The opcode table and the `PUSH`/`SIGNTEXT` token codec
//! - A script builder
//! - The multisig body tree (header + member slots) and its parser
//! - Template extraction for partially signed nested multisig blobs
//! - Lock and redeem script construction helpers

pub mod builder;
pub mod lock;
pub mod multisig;
pub mod opcodes;
pub mod template;
pub mod token;

use thiserror::Error;

pub use builder::ScriptBuilder;
pub use lock::{multisig_address, pay_to_address, script_hash_address, MultisigBuilder};
pub use multisig::{MultisigBody, MultisigHeader, Slot, ADDRESS_PUSH_LEN, MULTISIG_TEXTCODE};
pub use opcodes::OpCode;
pub use template::extract_template;
pub use token::{chunk_pushes, decode, encode, Token, TokenCursor, MAX_PUSH_LEN};

/// Default bound on multisig/P2SH nesting
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Script encoding and structure errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("Script truncated at offset {0}")]
    Truncated(usize),
    #[error("Unexpected opcode 0x{op:02x} at offset {offset}")]
    UnexpectedOpcode { op: u8, offset: usize },
    #[error("Unexpected token at index {index}: expected {expected}")]
    UnexpectedToken { index: usize, expected: &'static str },
    #[error("Missing SIGNTEXT terminator at token {0}")]
    MissingTerminator(usize),
    #[error("Push of {0} bytes exceeds the 255 byte limit")]
    PushTooLarge(usize),
    #[error("Invalid multisig header: {0}")]
    InvalidHeader(String),
    #[error("Nested multisig ends after {found} of {expected} members")]
    IncompleteBody { expected: usize, found: usize },
    #[error("Multisig nesting exceeds depth {0}")]
    NestingTooDeep(usize),
}
