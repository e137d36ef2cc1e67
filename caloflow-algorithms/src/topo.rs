//! Topological cluster building.
//!
//! Starting from every unconsumed seed, a flood fill collects all cells
//! reachable through neighbours whose energy stays at or above the
//! layer's topological threshold. Cells below threshold neither join a
//! region nor propagate the fill, so two seed groups separated by an
//! unthresholded gap end up in distinct regions.

use caloflow_core::{CellStore, ClusteringParams};

/// Grows one region from `start` using an explicit work stack, bounding
/// stack usage independently of region size.
fn fill_region(
    cells: &CellStore,
    params: &ClusteringParams,
    start: u32,
    used: &mut [bool],
    region: &mut Vec<u32>,
    stack: &mut Vec<u32>,
) {
    stack.clear();
    stack.push(start);

    while let Some(index) = stack.pop() {
        if used[index as usize] {
            continue;
        }

        let cell = cells.cell(index);
        let thresholds = params.thresholds(cell.layer);
        if cell.energy < thresholds.cell
            || (thresholds.cell_pt > 0.0 && cell.pt2 < thresholds.cell_pt * thresholds.cell_pt)
        {
            continue;
        }

        used[index as usize] = true;
        region.push(index);

        if params.use_corner_cells {
            for n in cell.all_neighbours() {
                if !used[n as usize] {
                    stack.push(n);
                }
            }
        } else {
            for n in cell.side_neighbours() {
                if !used[n as usize] {
                    stack.push(n);
                }
            }
        }
    }
}

/// Builds the topological regions, one per connected seed group.
///
/// Seeds are visited in discovery order; a seed already swallowed by an
/// earlier region does not start a new one. `used` must match the
/// store's length and start all-false. Membership is independent of the
/// traversal order; only the listing order of cells within a region
/// depends on it.
#[must_use]
pub fn build_topo_clusters(
    cells: &CellStore,
    params: &ClusteringParams,
    mask: &[bool],
    seeds: &[u32],
    used: &mut [bool],
) -> Vec<Vec<u32>> {
    let mut regions = Vec::new();
    let mut stack = Vec::new();

    for &seed in seeds {
        if !mask[seed as usize] || used[seed as usize] {
            continue;
        }

        let mut region = Vec::new();
        fill_region(cells, params, seed, used, &mut region, &mut stack);
        if !region.is_empty() {
            regions.push(region);
        }
    }

    log::debug!("built {} topological regions from {} seeds", regions.len(), seeds.len());
    regions
}
