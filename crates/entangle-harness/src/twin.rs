//! Two-peer fixture.
//!
//! Alice and Bob each own a [`Session`] over their own [`MemoryStore`]. The
//! seed is shown by Alice and scanned by Bob, the same way a QR code would
//! carry it. Restarting a peer rebuilds its session over the surviving store.

use arbitrary::Arbitrary;
use entangle_core::{EngineConfig, EngineError, MemoryStore, Restored, Seed, Session, StateStore};

use crate::{
    SimEnv,
    model::{ModelPeer, ObservableState, Operation, OperationError, OperationResult},
};

/// One of the two peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum PeerId {
    /// Shows the seed
    Alice,
    /// Scans the seed
    Bob,
}

impl PeerId {
    /// The other peer.
    pub fn other(self) -> Self {
        match self {
            Self::Alice => Self::Bob,
            Self::Bob => Self::Alice,
        }
    }
}

/// A session together with the store that outlives it.
pub struct Peer {
    store: MemoryStore,
    session: Session<MemoryStore, SimEnv>,
}

impl Peer {
    fn new(env: &SimEnv, config: &EngineConfig) -> Result<Self, EngineError> {
        let store = MemoryStore::new();
        let session = Session::new(store.clone(), env.clone(), config.clone())?;
        Ok(Self { store, session })
    }

    /// The peer's session.
    pub fn session(&self) -> &Session<MemoryStore, SimEnv> {
        &self.session
    }

    /// The peer's session, mutably.
    pub fn session_mut(&mut self) -> &mut Session<MemoryStore, SimEnv> {
        &mut self.session
    }

    /// The peer's backing store.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}

/// Alice and Bob with a shared deterministic environment.
pub struct TwinPeers {
    env: SimEnv,
    config: EngineConfig,
    alice: Peer,
    bob: Peer,
    seed: Option<Seed>,
}

impl TwinPeers {
    /// Two unpaired peers.
    pub fn new(rng_seed: u64, config: EngineConfig) -> Result<Self, EngineError> {
        let env = SimEnv::with_seed(rng_seed);
        let alice = Peer::new(&env, &config)?;
        let bob = Peer::new(&env, &config)?;
        Ok(Self { env, config, alice, bob, seed: None })
    }

    /// Two peers paired through a freshly generated seed.
    pub fn paired(rng_seed: u64, config: EngineConfig) -> Result<Self, EngineError> {
        let mut twins = Self::new(rng_seed, config)?;
        twins.pair()?;
        Ok(twins)
    }

    /// Alice regenerates, Bob scans the displayed seed.
    pub fn pair(&mut self) -> Result<Seed, EngineError> {
        let seed = self.alice.session.regenerate()?;
        self.bob.session.scan(&seed.to_base64())?;
        tracing::debug!("Paired twins");
        self.seed = Some(seed.clone());
        Ok(seed)
    }

    /// Both peers scan an externally chosen seed.
    pub fn pair_with(&mut self, seed: &Seed) -> Result<(), EngineError> {
        self.alice.session.establish(seed)?;
        self.bob.session.establish(seed)?;
        self.seed = Some(seed.clone());
        Ok(())
    }

    /// Seed of the current pairing, if any.
    pub fn seed(&self) -> Option<&Seed> {
        self.seed.as_ref()
    }

    /// Shared environment.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// A peer.
    pub fn peer(&self, id: PeerId) -> &Peer {
        match id {
            PeerId::Alice => &self.alice,
            PeerId::Bob => &self.bob,
        }
    }

    /// A peer's session, mutably.
    pub fn session_mut(&mut self, id: PeerId) -> &mut Session<MemoryStore, SimEnv> {
        match id {
            PeerId::Alice => &mut self.alice.session,
            PeerId::Bob => &mut self.bob.session,
        }
    }

    /// Encrypt at `from` and decrypt at the other peer.
    ///
    /// Returns whatever the receiver recovered; divergent counters yield
    /// garbage rather than an error.
    pub fn send(&mut self, from: PeerId, plaintext: &str) -> Result<String, EngineError> {
        let ciphertext = self.session_mut(from).encrypt(plaintext)?;
        self.session_mut(from.other()).decrypt(&ciphertext)
    }

    /// Encrypt at `from` and lose the message.
    pub fn drop_message(&mut self, from: PeerId, plaintext: &str) -> Result<(), EngineError> {
        self.session_mut(from).encrypt(plaintext).map(|_| ())
    }

    /// Rebuild a peer's session over its store and reload state.
    ///
    /// A dormant binding is resumed with the current pairing seed.
    pub fn restart(&mut self, id: PeerId) -> Result<Restored, EngineError> {
        let store = self.peer(id).store.clone();
        let session = Session::new(store, self.env.clone(), self.config.clone())?;
        let seed = self.seed.clone();

        let peer = match id {
            PeerId::Alice => &mut self.alice,
            PeerId::Bob => &mut self.bob,
        };
        peer.session = session;

        let restored = peer.session.restore()?;
        tracing::debug!(?id, ?restored, "Restarted peer");

        if let (Restored::AwaitingSeed { .. }, Some(seed)) = (restored, seed) {
            peer.session.resume(&seed)?;
        }
        Ok(restored)
    }

    /// True if `id` has persisted state.
    pub fn has_record(&self, id: PeerId) -> Result<bool, EngineError> {
        let peer = self.peer(id);
        Ok(peer.store.get(&self.config.state_key)?.is_some())
    }

    /// Apply a model operation to the real peers.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        let unexpected =
            |e: EngineError| OperationResult::Error(OperationError::Unexpected(e.to_string()));

        match op {
            Operation::Pair => self.pair().map_or_else(unexpected, |_| OperationResult::Ok),
            Operation::Send { from, content } => {
                let text = content.to_text();
                let ciphertext = match self.session_mut(*from).encrypt(&text) {
                    Ok(ciphertext) => ciphertext,
                    Err(e) => return OperationResult::Error(OperationError::at_sender(&e)),
                };
                match self.session_mut(from.other()).decrypt(&ciphertext) {
                    Ok(recovered) => OperationResult::Delivered { intact: recovered == text },
                    Err(e) => OperationResult::Error(OperationError::at_receiver(&e)),
                }
            },
            Operation::Lose { from, content } => {
                match self.drop_message(*from, &content.to_text()) {
                    Ok(()) => OperationResult::Ok,
                    Err(e) => OperationResult::Error(OperationError::at_sender(&e)),
                }
            },
            Operation::Restart { peer } => {
                self.restart(*peer).map_or_else(unexpected, |_| OperationResult::Ok)
            },
            Operation::Unpair { peer } => {
                let result = self.session_mut(*peer).disentangle();
                result.map_or_else(unexpected, |()| OperationResult::Ok)
            },
        }
    }

    /// Both peers' diagnostics in model terms.
    pub fn observable_state(&self) -> Result<ObservableState, EngineError> {
        let view = |id: PeerId| -> Result<ModelPeer, EngineError> {
            let diagnostics = self.peer(id).session.diagnostics()?;
            Ok(ModelPeer { entangled: diagnostics.entangled, counter: diagnostics.counter })
        };
        Ok(ObservableState { alice: view(PeerId::Alice)?, bob: view(PeerId::Bob)? })
    }
}
