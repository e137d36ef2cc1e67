//! Cluster output types.

use crate::cell::{Layer, Point3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The share of one cell's energy assigned to a cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellFraction {
    /// Index of the contributing cell.
    pub cell: u32,
    /// Fraction of the cell's energy, in [0, 1].
    pub fraction: f64,
}

impl CellFraction {
    /// Creates a new fraction record.
    #[inline]
    #[must_use]
    pub fn new(cell: u32, fraction: f64) -> Self {
        Self { cell, fraction }
    }
}

/// A finalized cluster: the energy footprint of one particle shower.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cluster {
    /// Total energy, summed over fractional contributions.
    pub energy: f64,
    /// Depth-corrected position.
    pub position: Point3,
    /// Position before the depth correction; used internally for the
    /// energy-sharing distances and kept for downstream consumers.
    pub position_raw: Point3,
    /// Layer carrying the largest energy share.
    pub layer: Layer,
    /// Per-cell contributions.
    pub fractions: Vec<CellFraction>,
}

impl Cluster {
    /// Number of contributing cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fractions.len()
    }

    /// Whether the cluster has no contributions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fractions.is_empty()
    }

    /// The fraction assigned to a given cell, if any.
    #[must_use]
    pub fn fraction_of(&self, cell: u32) -> Option<f64> {
        self.fractions
            .iter()
            .find(|f| f.cell == cell)
            .map(|f| f.fraction)
    }
}
