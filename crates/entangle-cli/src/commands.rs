//! Command execution over a redb state file.

use std::{io::Write, path::PathBuf};

use entangle_core::{
    EngineConfig, EngineError, RedbStore, Restored, SecretPersistence, Seed, Session, SystemEnv,
};
use thiserror::Error;

use crate::{Command, PairCommand};

/// Global options shared by every command.
#[derive(Debug, Clone)]
pub struct Options {
    /// Path to the redb state file
    pub state: PathBuf,
    /// Storage key of the state record
    pub state_key: String,
    /// Keep the secret in the state file
    pub persist_secret: bool,
    /// Base64 seed for resuming a dormant pairing
    pub seed: Option<String>,
}

/// Errors reported by the binary.
#[derive(Error, Debug)]
pub enum CliError {
    /// Pairing is stored without its secret and `--seed` was not given
    #[error("pairing is dormant: pass --seed <BASE64> to resume it")]
    SeedRequired,

    /// Engine rejected the command
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Result could not be written to stdout
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl Options {
    fn config(&self) -> EngineConfig {
        let secret_persistence = if self.persist_secret {
            SecretPersistence::Secret
        } else {
            SecretPersistence::FingerprintOnly
        };
        EngineConfig { secret_persistence, state_key: self.state_key.clone(), ..Default::default() }
    }
}

/// Open the session, resuming a dormant pairing when `--seed` is given.
fn open(options: &Options) -> Result<Session<RedbStore, SystemEnv>, CliError> {
    let store = RedbStore::open(&options.state).map_err(EngineError::from)?;
    let mut session = Session::new(store, SystemEnv::new(), options.config())?;

    let restored = session.restore()?;
    if let (Restored::AwaitingSeed { .. }, Some(encoded)) = (restored, options.seed.as_deref()) {
        session.resume(&Seed::from_base64(encoded)?)?;
    }
    tracing::debug!(?restored, entangled = session.is_entangled(), "Opened state");
    Ok(session)
}

fn require_entangled(session: &Session<RedbStore, SystemEnv>) -> Result<(), CliError> {
    if session.is_entangled() {
        return Ok(());
    }
    match session.diagnostics()?.counter {
        Some(_) => Err(CliError::SeedRequired),
        None => Err(EngineError::NotEntangled.into()),
    }
}

/// Run `command` and write its result to `out`.
pub fn run(options: &Options, command: &Command, out: &mut impl Write) -> Result<(), CliError> {
    let mut session = open(options)?;

    match command {
        Command::Pair(PairCommand::Generate) => {
            let seed = session.regenerate()?;
            writeln!(out, "{}", seed.to_base64())?;
        },
        Command::Pair(PairCommand::Scan { seed }) => {
            session.scan(seed)?;
            writeln!(out, "entangled")?;
        },
        Command::Encrypt { text } => {
            require_entangled(&session)?;
            writeln!(out, "{}", session.encrypt(text)?)?;
        },
        Command::Decrypt { ciphertext } => {
            require_entangled(&session)?;
            writeln!(out, "{}", session.decrypt(ciphertext)?)?;
        },
        Command::Status => {
            let diagnostics = session.diagnostics()?;
            writeln!(out, "entangled: {}", if diagnostics.entangled { "yes" } else { "no" })?;
            match diagnostics.counter {
                Some(counter) => writeln!(out, "counter: {counter}")?,
                None => writeln!(out, "counter: -")?,
            }
            writeln!(out, "remaining: {}", diagnostics.remaining)?;
            writeln!(out, "health: {:?}", diagnostics.health)?;
        },
        Command::Unpair => {
            session.disentangle()?;
            writeln!(out, "disentangled")?;
        },
    }

    Ok(())
}
