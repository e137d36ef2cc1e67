//! Clustering parameter table.
//!
//! One immutable [`ClusteringParams`] value is handed to the engine at
//! construction; nothing in the hot path reads mutable configuration.

use crate::cell::Layer;
use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-layer-group thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Thresholds {
    /// Energy below which a cell never joins a topological region.
    pub cell: f64,
    /// Transverse-momentum floor for region membership (0 = disabled).
    pub cell_pt: f64,
    /// Energy below which a cell cannot seed a cluster.
    pub seed: f64,
    /// Transverse-momentum floor for seeding (0 = disabled).
    pub seed_pt: f64,
    /// Energy above which a seed candidate is tested for isolation.
    pub clean: f64,
    /// Minimum surrounding-energy fraction an energetic seed must carry
    /// to survive cleaning.
    pub min_sharing: f64,
}

/// Neighbour-adjacency scheme used for seed isolation and region growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Connectivity {
    /// No neighbours: every eligible cell seeds its own cluster.
    None,
    /// Side-sharing neighbours only.
    Four,
    /// Side- and corner-sharing neighbours.
    Eight,
}

impl TryFrom<i32> for Connectivity {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Connectivity::None),
            4 => Ok(Connectivity::Four),
            8 => Ok(Connectivity::Eight),
            other => Err(Error::InvalidConnectivity(other)),
        }
    }
}

/// Which cells contribute to a cluster's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PositionMode {
    /// Every cell holding a fraction contributes.
    AllCells,
    /// Only the seed and its side-sharing neighbours contribute.
    FiveCell,
    /// Only the seed and its eight neighbours contribute.
    NineCell,
}

impl TryFrom<i32> for PositionMode {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            -1 => Ok(PositionMode::AllCells),
            5 => Ok(PositionMode::FiveCell),
            9 => Ok(PositionMode::NineCell),
            other => Err(Error::InvalidPositionMode(other)),
        }
    }
}

/// Shower-depth correction applied to electromagnetic clusters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DepthCorrection {
    /// No correction.
    Off,
    /// depth = a * (b + ln(energy)); electrons and photons.
    ShowerProfile {
        /// Scale constant.
        a: f64,
        /// Offset constant.
        b: f64,
        /// Scale constant under the preshower band.
        a_preshower: f64,
        /// Offset constant under the preshower band.
        b_preshower: f64,
    },
    /// depth = a; hadrons.
    Fixed {
        /// Depth constant.
        a: f64,
        /// Depth constant under the preshower band.
        a_preshower: f64,
    },
}

impl DepthCorrection {
    /// Builds a correction from the raw mode integer and constants.
    pub fn from_mode(mode: i32, a: f64, b: f64, a_preshower: f64, b_preshower: f64) -> Result<Self> {
        match mode {
            0 => Ok(DepthCorrection::Off),
            1 => Ok(DepthCorrection::ShowerProfile {
                a,
                b,
                a_preshower,
                b_preshower,
            }),
            2 => Ok(DepthCorrection::Fixed { a, a_preshower }),
            other => Err(Error::InvalidDepthCorrectionMode(other)),
        }
    }
}

/// Full parameter table for one engine instance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusteringParams {
    /// Thresholds for barrel layers.
    pub barrel: Thresholds,
    /// Thresholds for endcap, forward and preshower layers.
    pub endcap: Thresholds,
    /// Neighbour scheme for seeding and the local-maximum test.
    pub connectivity: Connectivity,
    /// Which cells enter the position sums in multi-seed regions.
    pub position_mode: PositionMode,
    /// Reference energy scale for the logarithmic position weights.
    /// Negative selects the dominant layer group's cell threshold.
    pub p1: f64,
    /// Transverse shower spread used by the Gaussian energy sharing.
    pub shower_sigma: f64,
    /// Depth correction for electromagnetic clusters.
    pub depth_correction: DepthCorrection,
    /// Grow regions through corner-sharing neighbours as well.
    pub use_corner_cells: bool,
}

impl Default for ClusteringParams {
    fn default() -> Self {
        Self {
            barrel: Thresholds {
                cell: 0.0,
                cell_pt: 0.0,
                seed: 0.2,
                seed_pt: 0.0,
                clean: 1e5,
                min_sharing: 0.0,
            },
            endcap: Thresholds {
                cell: 0.0,
                cell_pt: 0.0,
                seed: 0.6,
                seed_pt: 0.0,
                clean: 1e5,
                min_sharing: 0.0,
            },
            connectivity: Connectivity::Four,
            position_mode: PositionMode::AllCells,
            p1: -1.0,
            shower_sigma: 5.0,
            depth_correction: DepthCorrection::Off,
            use_corner_cells: false,
        }
    }
}

impl ClusteringParams {
    /// Creates the default parameter table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Thresholds for a given layer.
    #[inline]
    #[must_use]
    pub fn thresholds(&self, layer: Layer) -> &Thresholds {
        if layer.is_barrel() {
            &self.barrel
        } else {
            &self.endcap
        }
    }

    /// Sets the barrel threshold table.
    #[must_use]
    pub fn with_barrel(mut self, thresholds: Thresholds) -> Self {
        self.barrel = thresholds;
        self
    }

    /// Sets the endcap threshold table.
    #[must_use]
    pub fn with_endcap(mut self, thresholds: Thresholds) -> Self {
        self.endcap = thresholds;
        self
    }

    /// Sets the neighbour connectivity.
    #[must_use]
    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Sets the position restriction mode.
    #[must_use]
    pub fn with_position_mode(mut self, mode: PositionMode) -> Self {
        self.position_mode = mode;
        self
    }

    /// Sets the position reference scale (negative = automatic).
    #[must_use]
    pub fn with_p1(mut self, p1: f64) -> Self {
        self.p1 = p1;
        self
    }

    /// Sets the shower spread.
    #[must_use]
    pub fn with_shower_sigma(mut self, sigma: f64) -> Self {
        self.shower_sigma = sigma;
        self
    }

    /// Sets the depth correction.
    #[must_use]
    pub fn with_depth_correction(mut self, correction: DepthCorrection) -> Self {
        self.depth_correction = correction;
        self
    }

    /// Enables or disables corner-cell region growth.
    #[must_use]
    pub fn with_corner_cells(mut self, enabled: bool) -> Self {
        self.use_corner_cells = enabled;
        self
    }
}
