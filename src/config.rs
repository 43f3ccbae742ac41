//! Signer configuration
//!
//! Network parameters, the nesting bound and the default hash type,
//! persisted as JSON.

use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{ChainParams, ParamsError, SigHashType};
use crate::script::DEFAULT_MAX_DEPTH;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid chain parameters: {0}")]
    Params(#[from] ParamsError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Signer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignerConfig {
    pub params: ChainParams,
    /// Bound on multisig and script-hash nesting
    pub max_depth: usize,
    pub default_hash_type: SigHashType,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            params: ChainParams::mainnet(),
            max_depth: DEFAULT_MAX_DEPTH,
            default_hash_type: SigHashType::All,
        }
    }
}

impl SignerConfig {
    /// Default configuration for a named network
    pub fn for_network(name: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            params: ChainParams::by_name(name)?,
            ..Self::default()
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.params.validate()?;
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid("max_depth must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config: SignerConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        log::debug!("loaded {} config from {}", config.params.name, path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let file = fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}
