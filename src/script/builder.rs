//! Incremental script construction

use super::token::{chunk_pushes, Token, MAX_PUSH_LEN};
use super::opcodes::OpCode;
use super::ScriptError;

/// Builds a signature script token by token
#[derive(Debug, Default, Clone)]
pub struct ScriptBuilder {
    script: Vec<u8>,
}

impl ScriptBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single push; fails if `data` does not fit a one-byte length
    pub fn push_data(&mut self, data: &[u8]) -> Result<&mut Self, ScriptError> {
        if data.len() > MAX_PUSH_LEN {
            return Err(ScriptError::PushTooLarge(data.len()));
        }
        self.script.push(OpCode::Push.to_byte());
        self.script.push(data.len() as u8);
        self.script.extend_from_slice(data);
        Ok(self)
    }

    /// Append `data` as consecutive pushes of at most 255 bytes
    ///
    /// Empty data still produces one empty push.
    pub fn push_chunked(&mut self, data: &[u8]) -> &mut Self {
        if data.is_empty() {
            self.script.extend_from_slice(&[OpCode::Push.to_byte(), 0]);
            return self;
        }
        for chunk in chunk_pushes(data) {
            self.script.push(OpCode::Push.to_byte());
            self.script.push(chunk.len() as u8);
            self.script.extend_from_slice(&chunk);
        }
        self
    }

    /// Append a `SIGNTEXT` tag
    pub fn sign_text(&mut self, tag: u8) -> &mut Self {
        self.script.push(OpCode::SignText.to_byte());
        self.script.push(tag);
        self
    }

    /// Append an already decoded token
    pub fn token(&mut self, token: &Token) -> Result<&mut Self, ScriptError> {
        token.encode_into(&mut self.script)?;
        Ok(self)
    }

    /// Current length in bytes
    pub fn len(&self) -> usize {
        self.script.len()
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }

    /// View the script built so far
    pub fn script(&self) -> &[u8] {
        &self.script
    }

    /// Finish building
    pub fn into_bytes(self) -> Vec<u8> {
        self.script
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::token::decode;

    #[test]
    fn test_builder_layout() {
        let mut builder = ScriptBuilder::new();
        builder.push_data(&[0xde, 0xad]).unwrap().sign_text(0x01);
        assert_eq!(builder.script(), &[0x01, 0x02, 0xde, 0xad, 0x02, 0x01]);
    }

    #[test]
    fn test_push_data_limit() {
        let mut builder = ScriptBuilder::new();
        assert!(builder.push_data(&[0u8; 255]).is_ok());
        assert!(matches!(
            builder.push_data(&[0u8; 256]),
            Err(ScriptError::PushTooLarge(256))
        ));
    }

    #[test]
    fn test_push_chunked() {
        let data = vec![7u8; 600];
        let mut builder = ScriptBuilder::new();
        builder.push_chunked(&data);
        let tokens = decode(builder.script()).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Push(vec![7; 255]),
                Token::Push(vec![7; 255]),
                Token::Push(vec![7; 90]),
            ]
        );
    }
}
