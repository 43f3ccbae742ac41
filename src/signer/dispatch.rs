//! Lock script dispatch

use super::output::TxSigner;
use super::raw::signature_script;
use super::SignError;
use crate::core::{classify, Address, ScriptClass, SigHashType, Transaction};

/// What the dispatcher produced for one lock script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Signature script, or the redeem script for a script-hash lock
    pub script: Option<Vec<u8>>,
    pub class: ScriptClass,
    pub addresses: Vec<Address>,
    /// Signatures required; the header threshold for multisig locks
    pub required: usize,
}

impl<'a> TxSigner<'a> {
    /// Classify `lock_script` and produce whatever the stores allow for it
    ///
    /// Missing keys or scripts yield `script: None`. For script-hash locks
    /// the returned script is the redeem script, not a solution.
    pub fn resolve(
        &self,
        tx: &Transaction,
        input_index: usize,
        lock_script: &[u8],
        hash_type: SigHashType,
        previous_script: &[u8],
    ) -> Result<Resolution, SignError> {
        self.resolve_at_depth(tx, input_index, lock_script, hash_type, previous_script, 0)
    }

    /// `depth` is the number of script-hash levels above this lock; a
    /// multisig body resolved here starts counting from it
    pub(crate) fn resolve_at_depth(
        &self,
        tx: &Transaction,
        input_index: usize,
        lock_script: &[u8],
        hash_type: SigHashType,
        previous_script: &[u8],
        depth: usize,
    ) -> Result<Resolution, SignError> {
        let classification = classify(lock_script, self.params)?;
        let class = classification.class;
        let mut required = classification.required;

        let address = match (class, classification.addresses.first()) {
            (ScriptClass::NullData | ScriptClass::Unknown, _) | (_, None) => {
                return Err(SignError::Unsignable(class))
            }
            (_, Some(address)) => *address,
        };
        log::debug!("resolving {} lock for {}", class, address);

        let script = match class {
            ScriptClass::PubKeyHash => match self.keys.get_key(&address)? {
                Some(key) => Some(signature_script(
                    tx,
                    input_index,
                    lock_script,
                    &key.secret_key,
                    key.compressed,
                    hash_type,
                    self.hasher,
                )?),
                None => {
                    log::debug!("no key for {}", address);
                    None
                }
            },

            ScriptClass::ScriptHash => self.scripts.get_script(&address)?,

            ScriptClass::MultiSig => {
                let body = if previous_script.is_empty() {
                    self.scripts.get_script(&address)?
                } else {
                    Some(previous_script.to_vec())
                };
                match body {
                    Some(body) => {
                        let outcome = self.resolve_multisig_at_depth(
                            tx,
                            input_index,
                            &body,
                            hash_type,
                            depth,
                        )?;
                        required = outcome.required;
                        outcome.script
                    }
                    None => {
                        log::debug!("no multisig body for {}", address);
                        None
                    }
                }
            }

            ScriptClass::NullData | ScriptClass::Unknown => return Err(SignError::Unsignable(class)),
        };

        Ok(Resolution {
            script,
            class,
            addresses: classification.addresses,
            required,
        })
    }
}
