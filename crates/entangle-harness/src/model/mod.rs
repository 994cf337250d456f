//! Reference model for model-based testing.
//!
//! The model tracks only what the protocol promises: who is paired and how
//! far each counter has moved. The real twins must agree with it after every
//! operation.

mod operation;
mod world;

pub use operation::{Operation, OperationError, OperationResult, SmallMessage};
pub use world::{ModelPeer, ModelWorld, ObservableState};
