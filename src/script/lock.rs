//! Lock and redeem script construction

use super::builder::ScriptBuilder;
use super::multisig::{MultisigHeader, MULTISIG_TEXTCODE};
use super::ScriptError;
use crate::core::{Address, AddressKind, ChainParams};

/// Lock script paying to `address`
pub fn pay_to_address(address: &Address, params: &ChainParams) -> Vec<u8> {
    address.lock_script(params)
}

/// Script-hash address committing to a redeem script
pub fn script_hash_address(redeem_script: &[u8]) -> Address {
    Address::from_script(AddressKind::ScriptHash, redeem_script)
}

/// Multisig address committing to a multisig body
pub fn multisig_address(body: &[u8]) -> Address {
    Address::from_script(AddressKind::MultiSig, body)
}

/// Builds an unsigned multisig redeem body
///
/// Each member becomes an address slot closed by `SIGNTEXT textcode`.
/// Members may be pubkey-hash, multisig or script-hash addresses.
#[derive(Debug, Clone)]
pub struct MultisigBuilder {
    required: u16,
    members: Vec<Address>,
    textcode: u8,
}

impl MultisigBuilder {
    pub fn new(required: u16) -> Self {
        Self {
            required,
            members: Vec::new(),
            textcode: MULTISIG_TEXTCODE,
        }
    }

    pub fn member(mut self, address: Address) -> Self {
        self.members.push(address);
        self
    }

    pub fn members(mut self, addresses: impl IntoIterator<Item = Address>) -> Self {
        self.members.extend(addresses);
        self
    }

    pub fn textcode(mut self, textcode: u8) -> Self {
        self.textcode = textcode;
        self
    }

    pub fn build(&self, params: &ChainParams) -> Result<Vec<u8>, ScriptError> {
        let total = u16::try_from(self.members.len())
            .map_err(|_| ScriptError::InvalidHeader("too many members".to_string()))?;
        if self.required == 0 || self.required > total {
            return Err(ScriptError::InvalidHeader(format!(
                "threshold {} invalid for {} members",
                self.required, total
            )));
        }

        let mut builder = ScriptBuilder::new();
        MultisigHeader {
            total,
            required: self.required,
            textcode: self.textcode,
        }
        .write(&mut builder)?;

        for member in &self.members {
            builder
                .push_data(&member.to_payload(params))?
                .sign_text(self.textcode);
        }

        Ok(builder.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{classify, ScriptClass};
    use crate::script::{decode, Token};

    #[test]
    fn test_build_layout() {
        let params = ChainParams::mainnet();
        let script = MultisigBuilder::new(1)
            .member(Address::pubkey_hash([1; 20]))
            .member(Address::script_hash([2; 20]))
            .build(&params)
            .unwrap();

        let tokens = decode(&script).unwrap();
        assert_eq!(tokens.len(), 2 + 2 * 2);
        assert_eq!(tokens[0], Token::Push(vec![2, 0, 1, 0]));
        assert_eq!(
            tokens[4],
            Token::Push(Address::script_hash([2; 20]).to_payload(&params))
        );
        assert_eq!(tokens[5], Token::SignText(MULTISIG_TEXTCODE));
    }

    #[test]
    fn test_build_rejects_bad_threshold() {
        let params = ChainParams::mainnet();
        assert!(MultisigBuilder::new(0)
            .member(Address::pubkey_hash([1; 20]))
            .build(&params)
            .is_err());
        assert!(MultisigBuilder::new(2)
            .member(Address::pubkey_hash([1; 20]))
            .build(&params)
            .is_err());
    }

    #[test]
    fn test_multisig_lock_classifies() {
        let params = ChainParams::mainnet();
        let body = MultisigBuilder::new(1)
            .member(Address::pubkey_hash([1; 20]))
            .build(&params)
            .unwrap();
        let lock = pay_to_address(&multisig_address(&body), &params);
        let class = classify(&lock, &params).unwrap();
        assert_eq!(class.class, ScriptClass::MultiSig);
        assert_eq!(class.addresses, vec![multisig_address(&body)]);
    }
}
