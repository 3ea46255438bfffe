// Error types for the fallible surfaces of the navigation core.
//
// Routine misses (absent nodes, unreachable goals, exhausted budgets) are not
// errors and never appear here; they are empty `Vec`s and `None`s. These
// enums cover I/O, decoding, configuration, and the one geometry-contract
// violation that aborts a build.

use crate::types::GridIndex;
use thiserror::Error;

/// Failure to encode or decode an adjacency graph or a level.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The writer failed outside bincode, e.g. on flush.
    #[error("graph i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("graph codec failed: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("node {0} appears more than once in the encoded graph")]
    DuplicateNode(GridIndex),
    #[error("unknown edge type tag {0}")]
    UnknownEdgeType(u8),
    #[error("block {0} appears more than once in the encoded level")]
    DuplicateBlock(u32),
}

/// Failure of a terrain build. Nothing is published when a build fails.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The floor probe at the midpoint of a confirmed slope found no surface.
    /// Two connected nodes imply gap-free ground between them, so the
    /// geometry oracle is inconsistent.
    #[error("no floor at the midpoint of slope {from} -> {to}")]
    MidpointGap { from: GridIndex, to: GridIndex },
    #[error("build worker panicked")]
    WorkerPanicked,
}

/// Failure to load a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("config json invalid: {0}")]
    Json(#[from] serde_json::Error),
}
