//! Cluster energy and position determination.
//!
//! Positions are logarithmically weighted averages of the contributing
//! cell centres, optionally restricted to the seed's immediate
//! neighbourhood, with a shower-depth correction for electromagnetic
//! clusters.

use caloflow_core::{
    CellFraction, CellStore, ClusteringParams, DepthCorrection, Error, Layer, Point3,
    PositionMode, Result,
};

/// Negligible-fraction cutoff: contributions below this are dropped
/// from the position sums.
const MIN_FRACTION: f64 = 1e-9;

/// Normalization below this counts as degenerate.
const MIN_NORM: f64 = 1e-9;

/// A cluster being accumulated inside one topological region.
#[derive(Debug, Clone)]
pub(crate) struct WorkCluster {
    /// The seed cell this cluster is anchored on.
    pub seed: u32,
    /// Current per-cell contributions.
    pub fractions: Vec<CellFraction>,
    /// Energy summed over contributions.
    pub energy: f64,
    /// Layer with the largest energy share.
    pub layer: Layer,
    /// Depth-corrected position.
    pub position: Point3,
    /// Uncorrected position; the energy-sharing distances use this.
    pub position_raw: Point3,
}

impl WorkCluster {
    /// Starts a cluster holding only its seed at fraction 1.
    pub fn seeded(cells: &CellStore, seed: u32) -> Self {
        Self {
            seed,
            fractions: vec![CellFraction::new(seed, 1.0)],
            energy: 0.0,
            layer: cells.cell(seed).layer,
            position: Point3::origin(),
            position_raw: Point3::origin(),
        }
    }
}

/// Whether a contribution takes part in the position sums under the
/// given restriction mode.
#[inline]
fn contributes(cells: &CellStore, work: &WorkCluster, cell: u32, mode: PositionMode) -> bool {
    if cell == work.seed {
        return true;
    }
    match mode {
        PositionMode::AllCells => true,
        PositionMode::FiveCell => cells.cell(cell).is_side_neighbour(work.seed),
        PositionMode::NineCell => cells.cell(cell).is_neighbour(work.seed),
    }
}

/// The reference energy scale for the logarithmic weights.
fn reference_scale(params: &ClusteringParams, layer: Layer) -> f64 {
    let p1 = if params.p1 < 0.0 {
        // Automatic: the dominant layer group's cell threshold.
        params.thresholds(layer).cell
    } else {
        params.p1
    };
    p1.max(MIN_NORM)
}

/// Recomputes a cluster's energy, dominant layer and position from its
/// current contribution list.
///
/// The first (uncorrected) pass may legitimately collapse for a cluster
/// whose cells all sit far below the reference scale; the position is
/// then the sentinel origin and the raw position keeps its previous
/// value. A collapse after the depth correction is a contract violation
/// and surfaces as [`Error::DegeneratePosition`].
pub(crate) fn calculate(
    cells: &CellStore,
    params: &ClusteringParams,
    work: &mut WorkCluster,
    mode: PositionMode,
) -> Result<()> {
    debug_assert!(!work.fractions.is_empty());

    // Total energy and the per-layer split.
    work.energy = 0.0;
    let mut layer_sums: Vec<(Layer, f64)> = Vec::new();
    for f in &work.fractions {
        let energy = cells.cell(f.cell).energy * f.fraction;
        work.energy += energy;
        let layer = cells.cell(f.cell).layer;
        match layer_sums.iter_mut().find(|(l, _)| *l == layer) {
            Some((_, sum)) => *sum += energy,
            None => layer_sums.push((layer, energy)),
        }
    }
    let mut max_energy = 0.0;
    for &(layer, sum) in &layer_sums {
        if sum > max_energy {
            max_energy = sum;
            work.layer = layer;
        }
    }

    let p1 = reference_scale(params, work.layer);

    // Uncorrected position.
    let mut x = 0.0;
    let mut y = 0.0;
    let mut z = 0.0;
    let mut norm = 0.0;
    for f in &work.fractions {
        if !contributes(cells, work, f.cell, mode) {
            continue;
        }
        let cell = cells.cell(f.cell);
        let weight = if f.fraction < MIN_FRACTION {
            0.0
        } else {
            (cell.energy * f.fraction / p1).ln().max(0.0)
        };
        x += cell.position.x * weight;
        y += cell.position.y * weight;
        z += cell.position.z * weight;
        norm += weight;
    }

    if norm < MIN_NORM {
        log::debug!("cluster too far from its seeding cell, position set to origin");
        work.position = Point3::origin();
        return Ok(());
    }
    let uncorrected = Point3::new(x / norm, y / norm, z / norm);
    work.position = uncorrected;
    work.position_raw = uncorrected;

    if !work.layer.is_ecal() {
        return Ok(());
    }

    // Shower-depth correction: displace every contributing cell along
    // its own axis by the projection of the depth vector, then average
    // again with the same weight policy.
    let eta = uncorrected.eta().abs();
    let preshower_band = eta > 1.65 && eta < 2.6;
    let depth = match params.depth_correction {
        DepthCorrection::Off => return Ok(()),
        DepthCorrection::ShowerProfile {
            a,
            b,
            a_preshower,
            b_preshower,
        } => {
            if preshower_band {
                a_preshower * (b_preshower + work.energy.ln())
            } else {
                a * (b + work.energy.ln())
            }
        }
        DepthCorrection::Fixed { a, a_preshower } => {
            if preshower_band {
                a_preshower
            } else {
                a
            }
        }
    };
    let depth_vector = uncorrected.unit().scaled(depth);

    x = 0.0;
    y = 0.0;
    z = 0.0;
    norm = 0.0;
    for f in &work.fractions {
        if !contributes(cells, work, f.cell, mode) {
            continue;
        }
        let cell = cells.cell(f.cell);
        let axis = cell.axis.unit();
        let displaced = cell.position.plus(&axis.scaled(axis.dot(&depth_vector)));
        let weight = if f.fraction < MIN_FRACTION {
            0.0
        } else {
            (cell.energy * f.fraction / p1).ln().max(0.0)
        };
        x += displaced.x * weight;
        y += displaced.y * weight;
        z += displaced.z * weight;
        norm += weight;
    }

    if norm < MIN_NORM {
        return Err(Error::DegeneratePosition);
    }
    work.position = Point3::new(x / norm, y / norm, z / norm);

    Ok(())
}
