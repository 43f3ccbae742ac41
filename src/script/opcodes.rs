//! Script opcodes
//!
//! Only the opcodes that appear in signature scripts and in the
//! standard lock scripts are modelled here.

use serde::{Deserialize, Serialize};

/// Opcodes understood by the signing engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum OpCode {
    /// Push data: `PUSH <len:u8> <data>`
    Push = 0x01,
    /// Sign-text tag: `SIGNTEXT <hashType:u8>`
    SignText = 0x02,

    // Lock discriminators (0x40 - 0x4F)
    /// Pay to public key hash
    Pay2Pkh = 0x41,
    /// Pay to script hash
    Pay2ScriptHash = 0x42,
    /// Pay to multisig address
    PayMultisig = 0x43,

    /// Data carrier, provably unspendable
    Return = 0x6a,
}

impl OpCode {
    /// Convert byte to opcode
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(OpCode::Push),
            0x02 => Some(OpCode::SignText),
            0x41 => Some(OpCode::Pay2Pkh),
            0x42 => Some(OpCode::Pay2ScriptHash),
            0x43 => Some(OpCode::PayMultisig),
            0x6a => Some(OpCode::Return),
            _ => None,
        }
    }

    /// Get the opcode's byte value
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Get the opcode name
    pub fn name(&self) -> &'static str {
        match self {
            OpCode::Push => "PUSH",
            OpCode::SignText => "SIGNTEXT",
            OpCode::Pay2Pkh => "PAY2PKH",
            OpCode::Pay2ScriptHash => "PAY2SCRIPTH",
            OpCode::PayMultisig => "PAYMULTISIG",
            OpCode::Return => "RETURN",
        }
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
