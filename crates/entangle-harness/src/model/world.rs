//! Model world - the oracle for the twin peers.

use super::operation::{Operation, OperationError, OperationResult};
use crate::twin::PeerId;

/// What one peer exposes through its diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModelPeer {
    /// Secret is active
    pub entangled: bool,
    /// Persisted counter, if the peer has a record
    pub counter: Option<u64>,
}

/// Observable state for oracle comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// Alice's view
    pub alice: ModelPeer,
    /// Bob's view
    pub bob: ModelPeer,
}

/// Model world - the reference implementation.
///
/// Every paired peer holds the current pairing's secret: `Pair` always pairs
/// both sides, and unpairing only ever removes one.
#[derive(Debug, Clone, Default)]
pub struct ModelWorld {
    alice: ModelPeer,
    bob: ModelPeer,
}

impl ModelWorld {
    /// Two unpaired peers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an operation and return the result the twins must produce.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::Pair => {
                let fresh = ModelPeer { entangled: true, counter: Some(0) };
                self.alice = fresh;
                self.bob = fresh;
                OperationResult::Ok
            },
            Operation::Send { from, content } => {
                let blocks = content.blocks();
                let Some(sent_at) = self.advance(*from, blocks) else {
                    return OperationResult::Error(OperationError::SenderNotEntangled);
                };
                let receiver = self.peer_mut(from.other());
                if !receiver.entangled {
                    return OperationResult::Error(OperationError::ReceiverNotEntangled);
                }
                let received_at = receiver.counter.unwrap_or_default();
                receiver.counter = Some(received_at + blocks);
                OperationResult::Delivered { intact: sent_at == received_at }
            },
            Operation::Lose { from, content } => match self.advance(*from, content.blocks()) {
                Some(_) => OperationResult::Ok,
                None => OperationResult::Error(OperationError::SenderNotEntangled),
            },
            Operation::Restart { .. } => OperationResult::Ok,
            Operation::Unpair { peer } => {
                *self.peer_mut(*peer) = ModelPeer::default();
                OperationResult::Ok
            },
        }
    }

    /// Current observable state.
    pub fn observable_state(&self) -> ObservableState {
        ObservableState { alice: self.alice, bob: self.bob }
    }

    fn peer_mut(&mut self, id: PeerId) -> &mut ModelPeer {
        match id {
            PeerId::Alice => &mut self.alice,
            PeerId::Bob => &mut self.bob,
        }
    }

    /// Advance an entangled peer, returning its counter before the move.
    fn advance(&mut self, id: PeerId, blocks: u64) -> Option<u64> {
        let peer = self.peer_mut(id);
        if !peer.entangled {
            return None;
        }
        let before = peer.counter.unwrap_or_default();
        peer.counter = Some(before + blocks);
        Some(before)
    }
}
