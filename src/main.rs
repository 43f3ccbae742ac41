//! Sigscript CLI Application
//!
//! A command-line interface for building lock scripts and signing inputs.

use clap::{Parser, Subcommand};
use sigscript::cli;
use sigscript::config::SignerConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sigscript")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "Signature script builder for P2PKH, multisig and P2SH outputs", long_about = None)]
struct Cli {
    /// Network whose address ids are used
    #[arg(short, long, default_value = "mainnet")]
    network: String,

    /// JSON config file; takes precedence over --network
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new key pair
    Keygen {
        /// Derive the address from the uncompressed public key
        #[arg(long)]
        uncompressed: bool,
    },

    /// Build a multisig redeem body from member addresses
    Multisig {
        /// Signatures required
        #[arg(short, long)]
        required: u16,

        /// Member address (repeat for each member)
        #[arg(short, long = "member", required = true)]
        members: Vec<String>,
    },

    /// Print the lock script for an address
    Lock {
        #[arg(short, long)]
        address: String,
    },

    /// Sign an input from a JSON request
    Sign {
        /// Path to the request file
        #[arg(short, long)]
        request: PathBuf,
    },

    /// Decode a hex script
    Decode {
        /// Hex encoded script
        script: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SignerConfig::load(path)?,
        None => SignerConfig::for_network(&cli.network)?,
    };
    log::debug!("using {} parameters", config.params.name);

    match cli.command {
        Commands::Keygen { uncompressed } => {
            cli::cmd_keygen(&config.params, uncompressed)?;
        }

        Commands::Multisig { required, members } => {
            cli::cmd_multisig(&config.params, required, &members)?;
        }

        Commands::Lock { address } => {
            cli::cmd_lock(&config.params, &address)?;
        }

        Commands::Sign { request } => {
            cli::cmd_sign(&config, &request)?;
        }

        Commands::Decode { script } => {
            cli::cmd_decode(&config, &script)?;
        }
    }

    Ok(())
}
