//! CLI commands for the signer
//!
//! Implements all command handlers for the CLI interface.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::SignerConfig;
use crate::core::{classify, Address, AddressKind, ChainParams, SigHashType, Transaction};
use crate::crypto::KeyPair;
use crate::script::{decode, multisig_address, pay_to_address, MultisigBody, MultisigBuilder};
use crate::signer::{MemoryKeyDb, MemoryScriptDb, TxSigner};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

// =============================================================================
// Sign Requests
// =============================================================================

/// JSON document consumed by `sign`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignRequest {
    pub transaction: Transaction,
    pub input_index: usize,
    /// Hex encoded lock script of the output being spent
    pub lock_script: String,
    /// Falls back to the configured default
    #[serde(default)]
    pub hash_type: Option<SigHashType>,
    #[serde(default)]
    pub keys: Vec<KeyEntry>,
    #[serde(default)]
    pub scripts: Vec<ScriptEntry>,
    /// Hex encoded signature script produced by an earlier signer
    #[serde(default)]
    pub previous_script: Option<String>,
}

/// A private key made available to the signer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyEntry {
    pub private_key: String,
    #[serde(default = "default_compressed")]
    pub compressed: bool,
}

fn default_compressed() -> bool {
    true
}

/// A redeem script registered under its hash160 address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptEntry {
    pub kind: AddressKind,
    pub script: String,
}

/// Run a sign request against in-memory stores
pub fn sign_request(config: &SignerConfig, request: &SignRequest) -> CliResult<Option<Vec<u8>>> {
    let mut keys = MemoryKeyDb::new();
    for entry in &request.keys {
        let key = KeyPair::from_private_key_hex(&entry.private_key)?;
        keys.insert(&key, entry.compressed);
    }

    let mut scripts = MemoryScriptDb::new();
    for entry in &request.scripts {
        scripts.insert(entry.kind, hex::decode(&entry.script)?);
    }

    let lock_script = hex::decode(&request.lock_script)?;
    let previous = request
        .previous_script
        .as_deref()
        .map(hex::decode)
        .transpose()?;
    let hash_type = request.hash_type.unwrap_or(config.default_hash_type);

    log::info!(
        "signing input {} with {} key(s) and {} script(s)",
        request.input_index,
        keys.len(),
        scripts.len()
    );

    let signer = TxSigner::from_config(config, &keys, &scripts);
    let script = signer.sign_output(
        &request.transaction,
        request.input_index,
        &lock_script,
        hash_type,
        previous.as_deref(),
    )?;
    Ok(script)
}

// =============================================================================
// Command Handlers
// =============================================================================

/// Generate a new key pair
pub fn cmd_keygen(params: &ChainParams, uncompressed: bool) -> CliResult<()> {
    let key = KeyPair::generate();
    let compressed = !uncompressed;
    let address = Address::pubkey_hash(key.public_key_hash(compressed));

    println!("🔐 New key generated ({})", params.name);
    println!("   🔑 Private key: {}", key.private_key_hex());
    println!("   📢 Public key: {}", hex::encode(key.public_key_bytes(compressed)));
    println!("   📍 Address: {}", address.encode(params));
    println!("   🔒 Lock script: {}", hex::encode(pay_to_address(&address, params)));
    println!("\n   ⚠️  The private key is shown once. Store it somewhere safe!");

    Ok(())
}

/// Build a multisig redeem body
pub fn cmd_multisig(params: &ChainParams, required: u16, members: &[String]) -> CliResult<()> {
    let addresses = members
        .iter()
        .map(|m| Address::decode(m, params))
        .collect::<Result<Vec<_>, _>>()?;

    let body = MultisigBuilder::new(required)
        .members(addresses)
        .build(params)?;
    let address = multisig_address(&body);

    println!("👥 {}-of-{} multisig", required, members.len());
    println!("   ├─ Body: {}", hex::encode(&body));
    println!("   ├─ Address: {}", address.encode(params));
    println!("   └─ Lock script: {}", hex::encode(pay_to_address(&address, params)));

    Ok(())
}

/// Print the lock script paying to an address
pub fn cmd_lock(params: &ChainParams, address: &str) -> CliResult<()> {
    let address = Address::decode(address, params)?;
    println!("{}", hex::encode(pay_to_address(&address, params)));
    Ok(())
}

/// Sign an input described by a JSON request file
pub fn cmd_sign(config: &SignerConfig, request_path: &Path) -> CliResult<()> {
    let request: SignRequest = serde_json::from_str(&fs::read_to_string(request_path)?)?;

    match sign_request(config, &request)? {
        Some(script) => {
            println!("✅ Signature script ({} bytes):", script.len());
            println!("{}", hex::encode(script));
        }
        None => {
            println!("📭 No signature produced: no matching keys or scripts");
        }
    }

    Ok(())
}

/// Decode a script and print its tokens
pub fn cmd_decode(config: &SignerConfig, script_hex: &str) -> CliResult<()> {
    let params = &config.params;
    let script = hex::decode(script_hex.trim())?;

    if let Ok(class) = classify(&script, params) {
        if !class.addresses.is_empty() {
            println!("🔒 Lock script ({})", class.class);
            for address in &class.addresses {
                println!("   └─ {}", address.encode(params));
            }
            return Ok(());
        }
    }

    let tokens = decode(&script)?;
    println!("📜 {} token(s)", tokens.len());
    for token in &tokens {
        println!("   {}", token.to_asm_string());
    }

    if let Ok(body) = MultisigBody::parse(&script, params, config.max_depth) {
        println!();
        print!("{}", body.describe(1));
    }

    Ok(())
}
