//! Recursive multisig resolution
//!
//! Walks a parsed multisig body slot by slot and fills in whatever the
//! available keys and scripts allow:
//!
//! - pubkey-hash members are signed
//! - nested multisig members are fetched (or taken from the spliced blob)
//!   and resolved recursively
//! - nested script-hash members get their redeem script attached
//!
//! Anything that cannot be resolved is copied through unchanged so a later
//! signer can continue where this one stopped. Once the header's threshold
//! is reached the remaining slots are left alone.

use secp256k1::SecretKey;

use super::output::TxSigner;
use super::raw::key_pushes;
use super::SignError;
use crate::core::{Address, SigHashType, Transaction};
use crate::crypto::KeyPair;
use crate::script::{chunk_pushes, MultisigBody, ScriptError, Slot};

/// Result of resolving one multisig body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultisigOutcome {
    /// Resolved body; `None` when no slot counted as signed
    pub script: Option<Vec<u8>>,
    /// Threshold from the body header
    pub required: usize,
    /// Slots counted toward the threshold
    pub signed: usize,
    pub fulfilled: bool,
}

struct ResolvedBody {
    body: MultisigBody,
    signed: usize,
}

impl ResolvedBody {
    fn fulfilled(&self) -> bool {
        self.signed >= self.body.required()
    }
}

impl<'a> TxSigner<'a> {
    /// Resolve a serialized multisig body against the key and script stores
    pub fn resolve_multisig(
        &self,
        tx: &Transaction,
        input_index: usize,
        body: &[u8],
        hash_type: SigHashType,
    ) -> Result<MultisigOutcome, SignError> {
        self.resolve_multisig_at_depth(tx, input_index, body, hash_type, 0)
    }

    /// Resolve a body reached `depth` levels below the top-level lock
    pub(crate) fn resolve_multisig_at_depth(
        &self,
        tx: &Transaction,
        input_index: usize,
        body: &[u8],
        hash_type: SigHashType,
        depth: usize,
    ) -> Result<MultisigOutcome, SignError> {
        if depth > self.max_depth {
            return Err(SignError::RecursionLimitExceeded(self.max_depth));
        }
        let parsed = self.parse_at_depth(body, depth)?;
        let resolved = self.resolve_body(tx, input_index, &parsed, hash_type, depth)?;

        let required = resolved.body.required();
        let fulfilled = resolved.fulfilled();
        log::debug!(
            "multisig {}-of-{}: {} signed",
            required,
            resolved.body.header.total,
            resolved.signed
        );

        if resolved.signed == 0 {
            return Ok(MultisigOutcome {
                script: None,
                required,
                signed: 0,
                fulfilled: false,
            });
        }

        Ok(MultisigOutcome {
            script: Some(resolved.body.encode(self.params)?),
            required,
            signed: resolved.signed,
            fulfilled,
        })
    }

    fn resolve_body(
        &self,
        tx: &Transaction,
        input_index: usize,
        body: &MultisigBody,
        hash_type: SigHashType,
        depth: usize,
    ) -> Result<ResolvedBody, SignError> {
        let required = body.required();
        let mut signed = 0;
        let mut slots = Vec::with_capacity(body.slots.len());

        for slot in &body.slots {
            if signed >= required {
                slots.push(slot.clone());
                continue;
            }
            let (resolved, counted) = self.resolve_slot(tx, input_index, slot, hash_type, depth)?;
            if counted {
                signed += 1;
            }
            slots.push(resolved);
        }

        Ok(ResolvedBody {
            body: MultisigBody {
                header: body.header,
                slots,
            },
            signed,
        })
    }

    /// Resolve one slot; the flag tells whether it counts toward the threshold
    fn resolve_slot(
        &self,
        tx: &Transaction,
        input_index: usize,
        slot: &Slot,
        hash_type: SigHashType,
        depth: usize,
    ) -> Result<(Slot, bool), SignError> {
        match slot {
            Slot::Signed { .. } => Ok((slot.clone(), true)),

            Slot::PubKeyHash { address, .. } => {
                let key = match self.keys.get_key(address) {
                    Ok(Some(key)) => key,
                    Ok(None) => {
                        log::trace!("no key for {}", address);
                        return Ok((slot.clone(), false));
                    }
                    Err(e) => {
                        log::warn!("key lookup for {} failed: {}", address, e);
                        return Ok((slot.clone(), false));
                    }
                };

                match self.sign_member(tx, input_index, &key.secret_key, address, hash_type) {
                    Ok(pushes) => Ok((
                        Slot::Signed {
                            pushes,
                            terminator: hash_type.to_byte(),
                        },
                        true,
                    )),
                    Err(e) => {
                        log::warn!("signing for {} failed: {}", address, e);
                        Ok((slot.clone(), false))
                    }
                }
            }

            Slot::MultiSig {
                address,
                nested,
                terminator,
            } => {
                let fetched;
                let nested_body = match nested {
                    Some(body) => body,
                    None => match self.fetch_nested(address, depth + 1)? {
                        Some(body) => {
                            fetched = body;
                            &fetched
                        }
                        None => return Ok((slot.clone(), false)),
                    },
                };

                if depth >= self.max_depth {
                    return Err(SignError::RecursionLimitExceeded(self.max_depth));
                }
                let inner = self.resolve_body(tx, input_index, nested_body, hash_type, depth + 1)?;
                if inner.signed == 0 {
                    return Ok((slot.clone(), false));
                }

                let counted = inner.fulfilled();
                Ok((
                    Slot::MultiSig {
                        address: *address,
                        nested: Some(inner.body),
                        terminator: *terminator,
                    },
                    counted,
                ))
            }

            Slot::ScriptHash {
                address,
                attached,
                terminator,
            } => {
                if !attached.is_empty() {
                    return Ok((slot.clone(), false));
                }

                let script = match self.scripts.get_script(address) {
                    Ok(Some(script)) => script,
                    Ok(None) => return Ok((slot.clone(), false)),
                    Err(e) => {
                        log::warn!("script lookup for {} failed: {}", address, e);
                        return Ok((slot.clone(), false));
                    }
                };

                let mut attached = chunk_pushes(&script);
                if attached.is_empty() {
                    attached.push(Vec::new());
                }
                log::trace!("attached {} byte script for {}", script.len(), address);
                Ok((
                    Slot::ScriptHash {
                        address: *address,
                        attached,
                        terminator: *terminator,
                    },
                    true,
                ))
            }
        }
    }

    /// Fetch and parse the body behind an unresolved multisig member
    fn fetch_nested(&self, address: &Address, depth: usize) -> Result<Option<MultisigBody>, SignError> {
        let script = match self.scripts.get_script(address) {
            Ok(Some(script)) => script,
            Ok(None) => {
                log::trace!("no script for {}", address);
                return Ok(None);
            }
            Err(e) => {
                log::warn!("script lookup for {} failed: {}", address, e);
                return Ok(None);
            }
        };

        let body = self.parse_at_depth(&script, depth)?;

        // Spliced bodies are re-read by member count
        let total = body.header.total as usize;
        if body.slots.len() != total {
            return Err(SignError::MalformedScript(ScriptError::IncompleteBody {
                expected: total,
                found: body.slots.len(),
            }));
        }
        Ok(Some(body))
    }

    /// Parse a body whose top level sits `depth` levels down; spliced
    /// bodies inside it count against the remaining bound
    fn parse_at_depth(&self, script: &[u8], depth: usize) -> Result<MultisigBody, SignError> {
        let remaining = self.max_depth.saturating_sub(depth);
        MultisigBody::parse(script, self.params, remaining).map_err(|err| match err {
            ScriptError::NestingTooDeep(_) => SignError::RecursionLimitExceeded(self.max_depth),
            other => SignError::MalformedScript(other),
        })
    }

    /// Sign a key member, picking the public key encoding its hash commits to
    fn sign_member(
        &self,
        tx: &Transaction,
        input_index: usize,
        key: &SecretKey,
        address: &Address,
        hash_type: SigHashType,
    ) -> Result<Vec<Vec<u8>>, SignError> {
        let compressed = KeyPair::from_secret_key(*key).public_key_hash(true) == *address.hash();
        let pushes = key_pushes(tx, input_index, key, compressed, hash_type, self.hasher)?;
        Ok(pushes.into())
    }
}
