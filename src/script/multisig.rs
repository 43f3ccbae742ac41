//! Multisig body tree
//!
//! A multisig redeem body is a header followed by member slots:
//!
//! ```text
//! Body   := PUSH(4){total:u16le, required:u16le} SIGNTEXT(textcode) Slot*
//! Slot   := AddrPush(pkh)  SIGNTEXT                    unresolved key member
//!         | AddrPush(ms)   SIGNTEXT                    unresolved nested multisig
//!         | AddrPush(ms)   Body(total members) SIGNTEXT  nested multisig, partly signed
//!         | AddrPush(sh)   SIGNTEXT                    unresolved nested script
//!         | AddrPush(sh)   PUSH+ SIGNTEXT              nested script attached
//!         | PUSH+          SIGNTEXT                    signed data
//! ```
//!
//! `AddrPush` is a 21-byte push `[id][hash160]` whose id is one of the
//! network's address ids. Every slot ends with exactly one `SIGNTEXT`.
//! The body is parsed once into a tree, resolved, and serialized again;
//! unchanged slots serialize to their original bytes.

use super::builder::ScriptBuilder;
use super::template::parse_nested;
use super::token::{decode, Token, TokenCursor};
use super::ScriptError;
use crate::core::{Address, AddressKind, ChainParams};

/// Length of an address slot push: id byte plus hash160
pub const ADDRESS_PUSH_LEN: usize = 21;

/// Textcode written into the header of newly built bodies
pub const MULTISIG_TEXTCODE: u8 = 0x00;

/// Length of the encoded header in bytes
pub const HEADER_LEN: usize = 8;

/// `PUSH(4){total, required} SIGNTEXT(textcode)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultisigHeader {
    /// Number of member slots
    pub total: u16,
    /// Signatures required to satisfy the body
    pub required: u16,
    pub textcode: u8,
}

impl MultisigHeader {
    pub fn new(total: u16, required: u16) -> Self {
        Self {
            total,
            required,
            textcode: MULTISIG_TEXTCODE,
        }
    }

    pub(crate) fn parse(cursor: &mut TokenCursor<'_>) -> Result<Self, ScriptError> {
        let counts = match cursor.next_token() {
            Some(Token::Push(data)) if data.len() == 4 => data,
            Some(Token::Push(data)) => {
                return Err(ScriptError::InvalidHeader(format!(
                    "count push has {} bytes, expected 4",
                    data.len()
                )))
            }
            Some(Token::SignText(_)) => {
                return Err(ScriptError::InvalidHeader(
                    "body starts with SIGNTEXT".to_string(),
                ))
            }
            None => return Err(ScriptError::InvalidHeader("empty body".to_string())),
        };

        let textcode = match cursor.next_token() {
            Some(Token::SignText(tag)) => *tag,
            _ => {
                return Err(ScriptError::InvalidHeader(
                    "missing header SIGNTEXT".to_string(),
                ))
            }
        };

        Ok(Self {
            total: u16::from_le_bytes([counts[0], counts[1]]),
            required: u16::from_le_bytes([counts[2], counts[3]]),
            textcode,
        })
    }

    pub(crate) fn write(&self, builder: &mut ScriptBuilder) -> Result<(), ScriptError> {
        let mut counts = [0u8; 4];
        counts[..2].copy_from_slice(&self.total.to_le_bytes());
        counts[2..].copy_from_slice(&self.required.to_le_bytes());
        builder.push_data(&counts)?.sign_text(self.textcode);
        Ok(())
    }
}

/// One member position of a multisig body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// Key member awaiting a signature
    PubKeyHash { address: Address, terminator: u8 },
    /// Nested multisig, either a bare reference or a spliced body
    MultiSig {
        address: Address,
        nested: Option<MultisigBody>,
        terminator: u8,
    },
    /// Nested P2SH member; `attached` holds the redeem script chunks once set
    ScriptHash {
        address: Address,
        attached: Vec<Vec<u8>>,
        terminator: u8,
    },
    /// Data already placed by a signer (pubkey, signature, ...)
    Signed { pushes: Vec<Vec<u8>>, terminator: u8 },
}

impl Slot {
    /// Parse one slot starting at the cursor
    pub(crate) fn parse(
        cursor: &mut TokenCursor<'_>,
        params: &ChainParams,
        depth: usize,
        max_depth: usize,
    ) -> Result<Self, ScriptError> {
        let at = cursor.position();
        let first = match cursor.next_token() {
            Some(Token::Push(data)) => data,
            Some(Token::SignText(_)) => {
                return Err(ScriptError::UnexpectedToken {
                    index: at,
                    expected: "PUSH",
                })
            }
            None => return Err(ScriptError::MissingTerminator(at)),
        };

        let address = match Address::from_payload(first, params) {
            Some(address) => address,
            None => {
                let mut pushes = vec![first.clone()];
                pushes.extend(cursor.take_pushes());
                let terminator = cursor.expect_sign_text()?;
                return Ok(Slot::Signed { pushes, terminator });
            }
        };

        match address.kind() {
            AddressKind::PubKeyHash => Ok(Slot::PubKeyHash {
                address,
                terminator: cursor.expect_sign_text()?,
            }),
            AddressKind::MultiSig => {
                let nested = match cursor.peek() {
                    Some(Token::SignText(_)) => None,
                    _ => Some(parse_nested(cursor, params, depth + 1, max_depth)?),
                };
                Ok(Slot::MultiSig {
                    address,
                    nested,
                    terminator: cursor.expect_sign_text()?,
                })
            }
            AddressKind::ScriptHash => {
                let attached = cursor.take_pushes();
                Ok(Slot::ScriptHash {
                    address,
                    attached,
                    terminator: cursor.expect_sign_text()?,
                })
            }
        }
    }

    pub(crate) fn write(
        &self,
        builder: &mut ScriptBuilder,
        params: &ChainParams,
    ) -> Result<(), ScriptError> {
        match self {
            Slot::PubKeyHash {
                address,
                terminator,
            } => {
                builder.push_data(&address.to_payload(params))?;
                builder.sign_text(*terminator);
            }
            Slot::MultiSig {
                address,
                nested,
                terminator,
            } => {
                builder.push_data(&address.to_payload(params))?;
                if let Some(body) = nested {
                    body.write(builder, params)?;
                }
                builder.sign_text(*terminator);
            }
            Slot::ScriptHash {
                address,
                attached,
                terminator,
            } => {
                builder.push_data(&address.to_payload(params))?;
                for chunk in attached {
                    builder.push_data(chunk)?;
                }
                builder.sign_text(*terminator);
            }
            Slot::Signed { pushes, terminator } => {
                for push in pushes {
                    builder.push_data(push)?;
                }
                builder.sign_text(*terminator);
            }
        }
        Ok(())
    }

    /// Slot holding signer-provided data
    pub fn is_signed(&self) -> bool {
        matches!(self, Slot::Signed { .. })
    }
}

/// Parsed multisig body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultisigBody {
    pub header: MultisigHeader,
    pub slots: Vec<Slot>,
}

impl MultisigBody {
    /// Parse a complete body; slots run to the end of the script
    pub fn parse(
        script: &[u8],
        params: &ChainParams,
        max_depth: usize,
    ) -> Result<Self, ScriptError> {
        let tokens = decode(script)?;
        let mut cursor = TokenCursor::new(&tokens);
        let header = MultisigHeader::parse(&mut cursor)?;

        let mut slots = Vec::new();
        while !cursor.is_empty() {
            slots.push(Slot::parse(&mut cursor, params, 0, max_depth)?);
        }

        Ok(Self { header, slots })
    }

    /// Number of signatures required by the header
    pub fn required(&self) -> usize {
        self.header.required as usize
    }

    /// Serialize the tree
    pub fn encode(&self, params: &ChainParams) -> Result<Vec<u8>, ScriptError> {
        let mut builder = ScriptBuilder::new();
        self.write(&mut builder, params)?;
        Ok(builder.into_bytes())
    }

    pub(crate) fn write(
        &self,
        builder: &mut ScriptBuilder,
        params: &ChainParams,
    ) -> Result<(), ScriptError> {
        self.header.write(builder)?;
        for slot in &self.slots {
            slot.write(builder, params)?;
        }
        Ok(())
    }

    /// Render the tree for display, one slot per line
    pub fn describe(&self, indent: usize) -> String {
        let pad = "  ".repeat(indent);
        let mut out = format!(
            "{}multisig {}-of-{}\n",
            pad, self.header.required, self.header.total
        );
        for slot in &self.slots {
            match slot {
                Slot::PubKeyHash { address, .. } => {
                    out.push_str(&format!("{}  key {} (unsigned)\n", pad, address));
                }
                Slot::MultiSig {
                    address, nested, ..
                } => match nested {
                    Some(body) => {
                        out.push_str(&format!("{}  nested {}\n", pad, address));
                        out.push_str(&body.describe(indent + 2));
                    }
                    None => out.push_str(&format!("{}  nested {} (unresolved)\n", pad, address)),
                },
                Slot::ScriptHash {
                    address, attached, ..
                } => {
                    let size: usize = attached.iter().map(Vec::len).sum();
                    if attached.is_empty() {
                        out.push_str(&format!("{}  script {} (unresolved)\n", pad, address));
                    } else {
                        out.push_str(&format!(
                            "{}  script {} ({} bytes attached)\n",
                            pad, address, size
                        ));
                    }
                }
                Slot::Signed { pushes, .. } => {
                    out.push_str(&format!("{}  signed ({} pushes)\n", pad, pushes.len()));
                }
            }
        }
        out
    }
}
