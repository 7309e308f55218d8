use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which execution phase of a block an event was emitted in. Events carry
/// the index of the extrinsic that emitted them, which is what lets the
/// processor tell failed extrinsics apart from successful ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Initialization,
    ApplyExtrinsic(u32),
    Finalization,
}

/// A pallet event as delivered by the node, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    pub section: String,
    pub method: String,
    pub phase: Phase,
    /// Pallet-specific payload, kept as loose JSON until the enricher gives
    /// it a shape.
    pub data: Value,
}

/// A submitted extrinsic and its call arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawExtrinsic {
    pub section: String,
    pub method: String,
    pub signer: Option<String>,
    pub args: Value,
}

/// One block's worth of raw material for the processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBlock {
    pub number: u64,
    pub events: Vec<RawEvent>,
    pub extrinsics: Vec<RawExtrinsic>,
}
