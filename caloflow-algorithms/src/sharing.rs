//! Iterative energy sharing inside one topological region.
//!
//! Each seed anchors one cluster. Every iteration redistributes each
//! cell's energy among the clusters with Gaussian weights built from
//! the cluster's last position and energy, then recomputes positions,
//! until the largest position displacement drops below tolerance. Seed
//! cells are pinned: a seed contributes fully to its own cluster and
//! nothing to the others, so every cluster stays anchored on its local
//! maximum.
#![allow(clippy::cast_precision_loss)]

use caloflow_core::{CellFraction, CellStore, Cluster, ClusteringParams, PositionMode, Result};

use crate::position::{calculate, WorkCluster};
use crate::seeding::SeedState;

/// Hard cap on sharing iterations.
pub const MAX_ITERATIONS: usize = 50;

/// Cells beyond this many sigma from a cluster are not attached unless
/// they belong to it almost entirely.
const ATTACH_DISTANCE: f64 = 10.0;

/// Fractions above this attach regardless of distance, keeping a seed
/// inside its cluster even when the cluster drifts away from it.
const ATTACH_FRACTION: f64 = 0.99999;

/// Resolves one topological region into its final clusters.
///
/// `states` is the per-cell seeding verdict; cells of the region whose
/// state is [`SeedState::Yes`] anchor one cluster each, in region
/// order. Returns an empty list for a region without seeds.
pub fn resolve_topo_cluster(
    cells: &CellStore,
    params: &ClusteringParams,
    region: &[u32],
    states: &[SeedState],
) -> Result<Vec<Cluster>> {
    let seeds: Vec<u32> = region
        .iter()
        .copied()
        .filter(|&i| states[i as usize] == SeedState::Yes)
        .collect();
    if seeds.is_empty() {
        return Ok(Vec::new());
    }

    // The position restriction only matters when several clusters
    // compete for the region's cells.
    let mode = if seeds.len() > 1 {
        params.position_mode
    } else {
        PositionMode::AllCells
    };

    let mut clusters: Vec<WorkCluster> = Vec::with_capacity(seeds.len());
    for &seed in &seeds {
        let mut work = WorkCluster::seeded(cells, seed);
        calculate(cells, params, &mut work, mode)?;
        clusters.push(work);
    }

    // Convergence tolerance scales with the square of the effective
    // number of competing seeds.
    let ns2 = 1.0f64.max(seeds.len() as f64 - 1.0).powi(2);
    let tolerance = 1e-8 * ns2;

    let mut snapshot_energy = Vec::with_capacity(clusters.len());
    let mut snapshot_position = Vec::with_capacity(clusters.len());
    let mut distance = Vec::with_capacity(clusters.len());
    let mut fraction = Vec::with_capacity(clusters.len());

    let mut diff = ns2;
    let mut iterations = 0;
    while iterations < MAX_ITERATIONS && diff > tolerance {
        iterations += 1;

        snapshot_energy.clear();
        snapshot_position.clear();
        for work in &mut clusters {
            snapshot_energy.push(work.energy);
            snapshot_position.push(work.position);
            work.fractions.clear();
        }

        for &rhi in region {
            let cell = cells.cell(rhi);
            let cell_is_seed = states[rhi as usize] == SeedState::Yes;

            distance.clear();
            fraction.clear();
            let mut total = 0.0;
            for (ic, work) in clusters.iter().enumerate() {
                let d = work.position_raw.distance(&cell.position) / params.shower_sigma;
                distance.push(d);

                let raw = if rhi == work.seed {
                    1.0
                } else if cell_is_seed {
                    0.0
                } else {
                    snapshot_energy[ic] * (-d * d / 2.0).exp()
                };
                total += raw;
                fraction.push(raw);
            }

            // Nothing claims this cell in this iteration.
            if total == 0.0 {
                continue;
            }

            for (ic, work) in clusters.iter_mut().enumerate() {
                let share = fraction[ic] / total;
                // Only close cells attach, plus any cell the cluster
                // owns almost entirely. A close foreign seed stays in
                // the list at fraction zero.
                if distance[ic] < ATTACH_DISTANCE || share > ATTACH_FRACTION {
                    work.fractions.push(CellFraction::new(rhi, share));
                }
            }
        }

        diff = 0.0;
        for (ic, work) in clusters.iter_mut().enumerate() {
            calculate(cells, params, work, mode)?;
            let delta = work.position.delta_r(&snapshot_position[ic]);
            if delta > diff {
                diff = delta;
            }
        }
    }

    if diff > tolerance {
        log::warn!(
            "energy sharing hit the {MAX_ITERATIONS}-iteration cap (residual {diff:.3e}, {} seeds); keeping the last iterate",
            seeds.len(),
        );
    }

    Ok(clusters
        .into_iter()
        .map(|work| Cluster {
            energy: work.energy,
            position: work.position,
            position_raw: work.position_raw,
            layer: work.layer,
            fractions: work.fractions,
        })
        .collect())
}
