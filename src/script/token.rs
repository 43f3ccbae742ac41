//! Script token stream codec
//!
//! A signature script is a flat concatenation of two token kinds:
//!
//! ```text
//! Push     := PUSH <len:u8> <data:len bytes>
//! SignText := SIGNTEXT <hashType:u8>
//! ```
//!
//! Decoding is strict: every byte must belong to exactly one token.

use super::opcodes::OpCode;
use super::ScriptError;

/// Maximum payload of a single push (the length field is one byte)
pub const MAX_PUSH_LEN: usize = 255;

/// A single element of a signature script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Data push
    Push(Vec<u8>),
    /// Sign-text tag carrying a hash type or textcode
    SignText(u8),
}

impl Token {
    /// Number of bytes this token occupies on the wire
    pub fn encoded_len(&self) -> usize {
        match self {
            Token::Push(data) => 2 + data.len(),
            Token::SignText(_) => 2,
        }
    }

    /// Append the wire form of this token to `out`
    pub fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), ScriptError> {
        match self {
            Token::Push(data) => {
                if data.len() > MAX_PUSH_LEN {
                    return Err(ScriptError::PushTooLarge(data.len()));
                }
                out.push(OpCode::Push.to_byte());
                out.push(data.len() as u8);
                out.extend_from_slice(data);
            }
            Token::SignText(tag) => {
                out.push(OpCode::SignText.to_byte());
                out.push(*tag);
            }
        }
        Ok(())
    }

    pub fn is_push(&self) -> bool {
        matches!(self, Token::Push(_))
    }

    pub fn is_sign_text(&self) -> bool {
        matches!(self, Token::SignText(_))
    }

    /// Human readable form used by the CLI
    pub fn to_asm_string(&self) -> String {
        match self {
            Token::Push(data) => format!("{} {}", OpCode::Push, hex::encode(data)),
            Token::SignText(tag) => format!("{} 0x{:02x}", OpCode::SignText, tag),
        }
    }
}

/// Decode a complete script into tokens
pub fn decode(script: &[u8]) -> Result<Vec<Token>, ScriptError> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < script.len() {
        let op = script[pos];
        match OpCode::from_byte(op) {
            Some(OpCode::Push) => {
                let len = *script
                    .get(pos + 1)
                    .ok_or(ScriptError::Truncated(pos))? as usize;
                let start = pos + 2;
                let end = start + len;
                if end > script.len() {
                    return Err(ScriptError::Truncated(pos));
                }
                tokens.push(Token::Push(script[start..end].to_vec()));
                pos = end;
            }
            Some(OpCode::SignText) => {
                let tag = *script.get(pos + 1).ok_or(ScriptError::Truncated(pos))?;
                tokens.push(Token::SignText(tag));
                pos += 2;
            }
            _ => return Err(ScriptError::UnexpectedOpcode { op, offset: pos }),
        }
    }

    Ok(tokens)
}

/// Encode tokens back into a script
pub fn encode(tokens: &[Token]) -> Result<Vec<u8>, ScriptError> {
    let mut out = Vec::with_capacity(tokens.iter().map(Token::encoded_len).sum());
    for token in tokens {
        token.encode_into(&mut out)?;
    }
    Ok(out)
}

/// Split data into consecutive pushes of at most [`MAX_PUSH_LEN`] bytes
pub fn chunk_pushes(data: &[u8]) -> Vec<Vec<u8>> {
    data.chunks(MAX_PUSH_LEN).map(<[u8]>::to_vec).collect()
}

/// Forward-only cursor over a decoded token stream
#[derive(Debug)]
pub struct TokenCursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> TokenCursor<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    pub fn next_token(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    /// Index of the next token
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Consume every consecutive push
    pub fn take_pushes(&mut self) -> Vec<Vec<u8>> {
        let mut pushes = Vec::new();
        while let Some(Token::Push(data)) = self.peek() {
            pushes.push(data.clone());
            self.pos += 1;
        }
        pushes
    }

    /// Consume a sign-text token, failing on anything else
    pub fn expect_sign_text(&mut self) -> Result<u8, ScriptError> {
        let at = self.pos;
        match self.next_token() {
            Some(Token::SignText(tag)) => Ok(*tag),
            Some(Token::Push(_)) => Err(ScriptError::UnexpectedToken {
                index: at,
                expected: "SIGNTEXT",
            }),
            None => Err(ScriptError::MissingTerminator(at)),
        }
    }
}
