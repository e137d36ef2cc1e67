//! Error types for caloflow-core.

use thiserror::Error;

/// Result type alias for caloflow operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for caloflow operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Neighbour connectivity must be 0, 4 or 8.
    #[error("invalid neighbour connectivity: {0} (allowed: 0, 4, 8)")]
    InvalidConnectivity(i32),

    /// Position restriction mode must be -1, 5 or 9.
    #[error("invalid position restriction mode: {0} (allowed: -1, 5, 9)")]
    InvalidPositionMode(i32),

    /// Depth correction mode must be 0, 1 or 2.
    #[error("invalid depth correction mode: {0} (allowed: 0, 1, 2)")]
    InvalidDepthCorrectionMode(i32),

    /// Cell index outside the arena.
    #[error("cell index {index} out of range for store of {len} cells")]
    CellIndexOutOfRange { index: usize, len: usize },

    /// The position normalization vanished after the depth correction,
    /// although the uncorrected pass succeeded.
    #[error("cluster position normalization vanished after depth correction")]
    DegeneratePosition,
}
