//! Entangle command-line binary.
//!
//! # Usage
//!
//! ```bash
//! # Show a seed for the peer to scan
//! entangle pair generate
//!
//! # Scan the peer's seed
//! entangle pair scan <BASE64>
//!
//! # Exchange messages (fingerprint-only state needs the seed again)
//! entangle --seed <BASE64> encrypt "hello"
//! entangle --seed <BASE64> decrypt WZgbjBM=
//!
//! # Keep the secret in the state file and skip --seed
//! entangle --persist-secret pair scan <BASE64>
//! entangle --persist-secret encrypt "hello"
//! ```

mod commands;

use std::{io, path::PathBuf};

use clap::{Parser, Subcommand};
use entangle_core::DEFAULT_STATE_KEY;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Synchronized keystream messaging between two paired devices
#[derive(Parser, Debug)]
#[command(name = "entangle")]
#[command(about = "Pair two devices by seed and exchange XOR-encrypted messages")]
#[command(version)]
struct Args {
    /// Path to the state database
    #[arg(long, default_value = "entangle.redb")]
    state: PathBuf,

    /// Storage key of the state record
    #[arg(long, default_value = DEFAULT_STATE_KEY)]
    state_key: String,

    /// Store the secret itself so restarts resume without the seed
    #[arg(long)]
    persist_secret: bool,

    /// Seed (Base64) to resume a fingerprint-only pairing
    #[arg(long)]
    seed: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Pair with a peer
    #[command(subcommand)]
    Pair(PairCommand),

    /// Encrypt text and print Base64 ciphertext
    Encrypt {
        /// Plaintext
        text: String,
    },

    /// Decrypt Base64 ciphertext and print the text
    Decrypt {
        /// Base64 ciphertext
        ciphertext: String,
    },

    /// Show pairing state and remaining keystream budget
    Status,

    /// Forget the pairing
    Unpair,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum PairCommand {
    /// Generate a new seed, pair with it and print it for the peer
    Generate,

    /// Pair with a seed shown by the peer
    Scan {
        /// Base64 seed
        seed: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let options = commands::Options {
        state: args.state,
        state_key: args.state_key,
        persist_secret: args.persist_secret,
        seed: args.seed,
    };

    commands::run(&options, &args.command, &mut io::stdout().lock())?;

    Ok(())
}
