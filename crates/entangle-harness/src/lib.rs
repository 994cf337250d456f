//! Deterministic simulation harness for Entangle.
//!
//! A seeded [`SimEnv`] makes every generated seed and fingerprint salt
//! reproducible, and [`TwinPeers`] wires two sessions together the way a
//! shown and a scanned QR code would.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation for model-based
//! testing. Operations are applied to both the model and the real twins, and
//! their observable states are compared.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod model;
pub mod sim_env;
pub mod twin;

pub use model::{
    ModelPeer, ModelWorld, ObservableState, Operation, OperationError, OperationResult,
    SmallMessage,
};
pub use sim_env::SimEnv;
pub use twin::{Peer, PeerId, TwinPeers};
