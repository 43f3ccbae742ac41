//! Top-level signing driver

use super::db::{KeyDb, ScriptDb};
use super::SignError;
use crate::config::SignerConfig;
use crate::core::{ChainParams, LegacyHasher, ScriptClass, SigHashType, SignatureHasher, Transaction};
use crate::script::{decode, ScriptBuilder, Token, DEFAULT_MAX_DEPTH};

/// Produces signature scripts for transaction inputs
///
/// Holds only borrowed capabilities. The capability traits require `Sync`,
/// so one `TxSigner` can sign several inputs from different threads.
///
/// `max_depth` bounds script-hash and nested multisig levels together.
#[derive(Clone, Copy)]
pub struct TxSigner<'a> {
    pub(crate) params: &'a ChainParams,
    pub(crate) keys: &'a dyn KeyDb,
    pub(crate) scripts: &'a dyn ScriptDb,
    pub(crate) hasher: &'a dyn SignatureHasher,
    pub(crate) max_depth: usize,
}

impl<'a> TxSigner<'a> {
    pub fn new(params: &'a ChainParams, keys: &'a dyn KeyDb, scripts: &'a dyn ScriptDb) -> Self {
        Self {
            params,
            keys,
            scripts,
            hasher: &LegacyHasher,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Signer using the network and depth bound from a config
    pub fn from_config(
        config: &'a SignerConfig,
        keys: &'a dyn KeyDb,
        scripts: &'a dyn ScriptDb,
    ) -> Self {
        Self::new(&config.params, keys, scripts).with_max_depth(config.max_depth)
    }

    pub fn with_hasher(mut self, hasher: &'a dyn SignatureHasher) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn params(&self) -> &ChainParams {
        self.params
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Produce the signature script for input `input_index` spending `lock_script`
    ///
    /// `previous_script` is the input's current signature script when a
    /// multisig spend is being completed incrementally. Returns `None` when
    /// the stores hold nothing that can make progress.
    pub fn sign_output(
        &self,
        tx: &Transaction,
        input_index: usize,
        lock_script: &[u8],
        hash_type: SigHashType,
        previous_script: Option<&[u8]>,
    ) -> Result<Option<Vec<u8>>, SignError> {
        let previous = previous_script.unwrap_or_default();
        let script = self.sign_at_depth(tx, input_index, lock_script, hash_type, previous, 0)?;
        match &script {
            Some(script) => log::debug!(
                "signed input {} of {} ({} bytes)",
                input_index,
                tx.txid_hex(),
                script.len()
            ),
            None => log::debug!("nothing to sign for input {} of {}", input_index, tx.txid_hex()),
        }
        Ok(script)
    }

    fn sign_at_depth(
        &self,
        tx: &Transaction,
        input_index: usize,
        lock_script: &[u8],
        hash_type: SigHashType,
        previous_script: &[u8],
        depth: usize,
    ) -> Result<Option<Vec<u8>>, SignError> {
        if depth > self.max_depth {
            return Err(SignError::RecursionLimitExceeded(self.max_depth));
        }

        let resolution = self.resolve_at_depth(
            tx,
            input_index,
            lock_script,
            hash_type,
            previous_script,
            depth,
        )?;
        if resolution.class != ScriptClass::ScriptHash {
            return Ok(resolution.script);
        }

        let redeem_script = match resolution.script {
            Some(script) => script,
            None => return Ok(None),
        };

        let inner_previous = unwrap_envelope(previous_script);
        let solution = self.sign_at_depth(
            tx,
            input_index,
            &redeem_script,
            hash_type,
            &inner_previous,
            depth + 1,
        )?;

        Ok(solution.map(|solution| envelope(&solution)))
    }
}

/// Sign one transaction output with the default hasher and depth bound
#[allow(clippy::too_many_arguments)]
pub fn sign_tx_output(
    params: &ChainParams,
    tx: &Transaction,
    input_index: usize,
    lock_script: &[u8],
    hash_type: SigHashType,
    keys: &dyn KeyDb,
    scripts: &dyn ScriptDb,
    previous_script: Option<&[u8]>,
) -> Result<Option<Vec<u8>>, SignError> {
    TxSigner::new(params, keys, scripts).sign_output(
        tx,
        input_index,
        lock_script,
        hash_type,
        previous_script,
    )
}

/// Script-hash envelope: the inner solution as pushed data
fn envelope(solution: &[u8]) -> Vec<u8> {
    let mut builder = ScriptBuilder::new();
    builder.push_chunked(solution);
    builder.into_bytes()
}

/// Inner solution of an envelope; anything that is not push-only passes through
fn unwrap_envelope(previous_script: &[u8]) -> Vec<u8> {
    if previous_script.is_empty() {
        return Vec::new();
    }
    match decode(previous_script) {
        Ok(tokens) if tokens.iter().all(Token::is_push) => tokens
            .into_iter()
            .filter_map(|token| match token {
                Token::Push(data) => Some(data),
                Token::SignText(_) => None,
            })
            .flatten()
            .collect(),
        _ => previous_script.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Address, AddressKind};
    use crate::script::{pay_to_address, MultisigBody, MultisigBuilder, Slot};
    use crate::signer::fixtures::{key, params, spend_tx};
    use crate::signer::{signature_script, LookupError, MemoryKeyDb, MemoryScriptDb, NoScripts};

    #[test]
    fn test_pubkey_hash_output() {
        let p = params();
        let tx = spend_tx();
        let a = key(1);
        let mut keys = MemoryKeyDb::new();
        let address = keys.insert(&a, true);
        let lock = pay_to_address(&address, &p);

        let script = sign_tx_output(&p, &tx, 0, &lock, SigHashType::All, &keys, &NoScripts, None)
            .unwrap()
            .unwrap();
        let direct =
            signature_script(&tx, 0, &lock, &a.secret_key, true, SigHashType::All, &LegacyHasher)
                .unwrap();
        assert_eq!(script, direct);
    }

    #[test]
    fn test_missing_key_gives_no_script() {
        let p = params();
        let tx = spend_tx();
        let keys = MemoryKeyDb::new();
        let lock = pay_to_address(&Address::pubkey_hash([1; 20]), &p);

        assert_eq!(
            sign_tx_output(&p, &tx, 0, &lock, SigHashType::All, &keys, &NoScripts, None).unwrap(),
            None
        );
    }

    #[test]
    fn test_script_hash_over_pubkey_hash() {
        let p = params();
        let tx = spend_tx();
        let a = key(1);
        let mut keys = MemoryKeyDb::new();
        let inner_address = keys.insert(&a, true);

        let redeem = pay_to_address(&inner_address, &p);
        let mut scripts = MemoryScriptDb::new();
        let sh = scripts.insert(AddressKind::ScriptHash, redeem.clone());

        let script = sign_tx_output(
            &p,
            &tx,
            0,
            &pay_to_address(&sh, &p),
            SigHashType::All,
            &keys,
            &scripts,
            None,
        )
        .unwrap()
        .unwrap();

        let solution =
            signature_script(&tx, 0, &redeem, &a.secret_key, true, SigHashType::All, &LegacyHasher)
                .unwrap();
        let mut expected = ScriptBuilder::new();
        expected.push_data(&solution).unwrap();
        assert_eq!(script, expected.into_bytes());
    }

    #[test]
    fn test_script_hash_without_inner_solution() {
        let p = params();
        let tx = spend_tx();
        let keys = MemoryKeyDb::new();
        let mut scripts = MemoryScriptDb::new();
        let sh = scripts.insert(
            AddressKind::ScriptHash,
            pay_to_address(&Address::pubkey_hash([9; 20]), &p),
        );

        let signer = TxSigner::new(&p, &keys, &scripts);
        let lock = pay_to_address(&sh, &p);
        assert_eq!(signer.sign_output(&tx, 0, &lock, SigHashType::All, None).unwrap(), None);

        let unknown = pay_to_address(&Address::script_hash([1; 20]), &p);
        assert_eq!(signer.sign_output(&tx, 0, &unknown, SigHashType::All, None).unwrap(), None);
    }

    #[test]
    fn test_script_hash_over_multisig_incremental() {
        let p = params();
        let tx = spend_tx();
        let (a, b, c) = (key(1), key(2), key(3));

        let body = MultisigBuilder::new(3)
            .members([&a, &b, &c].iter().map(|k| Address::pubkey_hash(k.public_key_hash(true))))
            .build(&p)
            .unwrap();
        let mut scripts = MemoryScriptDb::new();
        let ms = scripts.insert(AddressKind::MultiSig, body);
        let sh = scripts.insert(AddressKind::ScriptHash, pay_to_address(&ms, &p));
        let lock = pay_to_address(&sh, &p);

        let mut first_keys = MemoryKeyDb::new();
        first_keys.insert(&a, true);
        let first = TxSigner::new(&p, &first_keys, &scripts)
            .sign_output(&tx, 0, &lock, SigHashType::All, None)
            .unwrap()
            .unwrap();

        let mut second_keys = MemoryKeyDb::new();
        second_keys.insert(&b, true);
        second_keys.insert(&c, true);
        let second = TxSigner::new(&p, &second_keys, &scripts)
            .sign_output(&tx, 0, &lock, SigHashType::All, Some(&first))
            .unwrap()
            .unwrap();

        let mut all_keys = MemoryKeyDb::new();
        for k in [&a, &b, &c] {
            all_keys.insert(k, true);
        }
        let at_once = TxSigner::new(&p, &all_keys, &scripts)
            .sign_output(&tx, 0, &lock, SigHashType::All, None)
            .unwrap()
            .unwrap();
        assert_eq!(second, at_once);

        // Envelope carries a fully signed body longer than one push
        let inner = unwrap_envelope(&second);
        assert!(inner.len() > 255);
        let resolved = MultisigBody::parse(&inner, &p, DEFAULT_MAX_DEPTH).unwrap();
        assert!(resolved.slots.iter().all(Slot::is_signed));
    }

    #[test]
    fn test_envelope_chunking_round_trip() {
        let solution: Vec<u8> = (0..600u32).map(|i| (i % 251) as u8).collect();
        let wrapped = envelope(&solution);
        let tokens = decode(&wrapped).unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(unwrap_envelope(&wrapped), solution);

        // Non-envelope scripts pass through
        let body = vec![0x01, 0x04, 1, 0, 1, 0, 0x02, 0x00];
        assert_eq!(unwrap_envelope(&body), body);
    }

    #[test]
    fn test_script_hash_nesting_is_bounded() {
        let p = params();
        let tx = spend_tx();
        let a = key(1);
        let mut keys = MemoryKeyDb::new();
        let mut lock = pay_to_address(&keys.insert(&a, true), &p);

        let mut scripts = MemoryScriptDb::new();
        for _ in 0..3 {
            let sh = scripts.insert(AddressKind::ScriptHash, lock);
            lock = pay_to_address(&sh, &p);
        }

        let signer = TxSigner::new(&p, &keys, &scripts);
        let script = signer
            .sign_output(&tx, 0, &lock, SigHashType::All, None)
            .unwrap()
            .unwrap();
        // Three envelopes around the key solution
        let mut inner = script;
        for _ in 0..3 {
            inner = unwrap_envelope(&inner);
        }
        assert_eq!(decode(&inner).unwrap().len(), 3);

        assert!(matches!(
            signer
                .with_max_depth(2)
                .sign_output(&tx, 0, &lock, SigHashType::All, None),
            Err(SignError::RecursionLimitExceeded(2))
        ));
    }

    #[test]
    fn test_depth_counts_script_hash_and_multisig_levels() {
        let p = params();
        let tx = spend_tx();
        let a = key(1);
        let mut keys = MemoryKeyDb::new();
        let mut member = keys.insert(&a, true);

        // Two multisig levels below the body of the lock itself
        let mut scripts = MemoryScriptDb::new();
        for _ in 0..2 {
            let body = MultisigBuilder::new(1).member(member).build(&p).unwrap();
            member = scripts.insert(AddressKind::MultiSig, body);
        }
        let top = MultisigBuilder::new(1).member(member).build(&p).unwrap();
        let ms = scripts.insert(AddressKind::MultiSig, top);

        // Two script-hash levels above it
        let mut lock = pay_to_address(&ms, &p);
        for _ in 0..2 {
            let sh = scripts.insert(AddressKind::ScriptHash, lock);
            lock = pay_to_address(&sh, &p);
        }

        let signer = TxSigner::new(&p, &keys, &scripts);
        assert!(signer
            .sign_output(&tx, 0, &lock, SigHashType::All, None)
            .unwrap()
            .is_some());
        assert!(signer
            .with_max_depth(4)
            .sign_output(&tx, 0, &lock, SigHashType::All, None)
            .unwrap()
            .is_some());
        assert!(matches!(
            signer
                .with_max_depth(2)
                .sign_output(&tx, 0, &lock, SigHashType::All, None),
            Err(SignError::RecursionLimitExceeded(2))
        ));
        assert!(matches!(
            signer
                .with_max_depth(3)
                .sign_output(&tx, 0, &lock, SigHashType::All, None),
            Err(SignError::RecursionLimitExceeded(3))
        ));
    }

    #[test]
    fn test_signer_shared_across_threads() {
        let p = params();
        let tx = spend_tx();
        let a = key(1);
        let mut keys = MemoryKeyDb::new();
        let lock = pay_to_address(&keys.insert(&a, true), &p);
        let signer = TxSigner::new(&p, &keys, &NoScripts);

        let sequential: Vec<_> = (0..2)
            .map(|index| {
                signer
                    .sign_output(&tx, index, &lock, SigHashType::All, None)
                    .unwrap()
            })
            .collect();

        let parallel: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..2)
                .map(|index| {
                    let (signer, tx, lock) = (&signer, &tx, &lock);
                    s.spawn(move || {
                        signer
                            .sign_output(tx, index, lock, SigHashType::All, None)
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(parallel, sequential);
        assert!(parallel.iter().all(Option::is_some));
        assert_ne!(parallel[0], parallel[1]);
    }

    #[test]
    fn test_null_data_is_unsignable() {
        let p = params();
        let tx = spend_tx();
        let keys = MemoryKeyDb::new();
        let lock = [0x6a, 0x04, 0xde, 0xad, 0xbe, 0xef];
        assert!(matches!(
            sign_tx_output(&p, &tx, 0, &lock, SigHashType::All, &keys, &NoScripts, None),
            Err(SignError::Unsignable(ScriptClass::NullData))
        ));
    }

    #[test]
    fn test_script_lookup_error_aborts() {
        let p = params();
        let tx = spend_tx();
        let keys = MemoryKeyDb::new();
        let scripts = |_: &Address| -> Result<Option<Vec<u8>>, LookupError> {
            Err(LookupError("index corrupt".to_string()))
        };
        let lock = pay_to_address(&Address::script_hash([4; 20]), &p);

        assert!(matches!(
            sign_tx_output(&p, &tx, 0, &lock, SigHashType::All, &keys, &scripts, None),
            Err(SignError::LookupFailed(_))
        ));
    }

    #[test]
    fn test_from_config() {
        let config = SignerConfig {
            max_depth: 3,
            ..SignerConfig::default()
        };
        let keys = MemoryKeyDb::new();
        let signer = TxSigner::from_config(&config, &keys, &NoScripts);
        assert_eq!(signer.max_depth(), 3);
        assert_eq!(signer.params(), &config.params);
    }
}
