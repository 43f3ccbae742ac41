//! Template extraction for nested multisig blobs
//!
//! When a nested multisig member has already been partly signed, its body
//! is spliced inline after the member's address push and nothing marks
//! where it ends. The extent is recovered from the body's own header:
//! exactly `total` member slots follow it, each closed by one `SIGNTEXT`.

use super::multisig::{MultisigBody, MultisigHeader, Slot};
use super::token::{decode, TokenCursor};
use super::{ScriptError, DEFAULT_MAX_DEPTH};
use crate::core::ChainParams;

/// Parse a nested body of `total` slots starting at the cursor
pub(crate) fn parse_nested(
    cursor: &mut TokenCursor<'_>,
    params: &ChainParams,
    depth: usize,
    max_depth: usize,
) -> Result<MultisigBody, ScriptError> {
    if depth > max_depth {
        return Err(ScriptError::NestingTooDeep(max_depth));
    }

    let header = MultisigHeader::parse(cursor)?;
    let expected = header.total as usize;
    let mut slots = Vec::with_capacity(expected);

    while slots.len() < expected {
        if cursor.is_empty() {
            return Err(ScriptError::IncompleteBody {
                expected,
                found: slots.len(),
            });
        }
        slots.push(Slot::parse(cursor, params, depth, max_depth)?);
    }

    log::trace!(
        "extracted nested {}-of-{} template at depth {}",
        header.required,
        header.total,
        depth
    );

    Ok(MultisigBody { header, slots })
}

/// Recover the normalized body of a partly signed nested multisig blob
///
/// `script` starts with the nested body and may continue with data that
/// belongs to the enclosing body; only the nested part is returned.
pub fn extract_template(script: &[u8], params: &ChainParams) -> Result<Vec<u8>, ScriptError> {
    extract_template_bounded(script, params, DEFAULT_MAX_DEPTH)
}

/// [`extract_template`] with an explicit nesting bound
pub fn extract_template_bounded(
    script: &[u8],
    params: &ChainParams,
    max_depth: usize,
) -> Result<Vec<u8>, ScriptError> {
    let tokens = decode(script)?;
    let mut cursor = TokenCursor::new(&tokens);
    let body = parse_nested(&mut cursor, params, 1, max_depth)?;
    body.encode(params)
}
