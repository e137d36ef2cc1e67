//! Seed finding.
//!
//! A seed is a local energy maximum above its layer's seed threshold.
//! Candidates are visited in decreasing energy order, and every accepted
//! seed suppresses its neighbours, so a lower-energy neighbour of a seed
//! can never seed a cluster of its own. An isolation-cleaning pass
//! demotes energetic seeds whose surroundings carry too small an energy
//! share to be a genuine shower core.

use caloflow_core::{Cell, CellStore, ClusteringParams, Connectivity, Thresholds};

/// Per-cell seeding verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedState {
    /// Not yet examined.
    Unknown,
    /// Local maximum above threshold.
    Yes,
    /// Below threshold, or suppressed by a higher-energy neighbour.
    No,
    /// Demoted by isolation cleaning.
    Cleaned,
}

/// Collects the neighbour list used for the local-maximum test.
///
/// Preshower planes always use side neighbours; the calorimeter layers
/// follow the configured connectivity.
fn seed_neighbours(cell: &Cell, connectivity: Connectivity, buf: &mut Vec<u32>) {
    buf.clear();
    if cell.layer.is_preshower() {
        buf.extend(cell.side_neighbours());
        return;
    }
    match connectivity {
        Connectivity::None => {}
        Connectivity::Four => buf.extend(cell.side_neighbours()),
        Connectivity::Eight => buf.extend(cell.all_neighbours()),
    }
}

/// Demotes an energetic candidate whose immediate surroundings hold too
/// little energy. Returns true when the cell was cleaned.
fn clean_isolated(
    cells: &CellStore,
    thresholds: &Thresholds,
    index: u32,
    mask: &mut [bool],
    states: &mut [SeedState],
) -> bool {
    let cell = cells.cell(index);

    let mut surrounding = cell.energy_mate;
    for n in cell.side_neighbours() {
        let neighbour = cells.cell(n);
        surrounding += neighbour.energy + neighbour.energy_mate;
    }
    let fraction = surrounding / cell.energy;
    if fraction >= thresholds.min_sharing {
        return false;
    }

    // Forward and preshower layers get no extra tightening.
    let tighter = if cell.layer.is_forward() || cell.layer.is_preshower() {
        1.0
    } else {
        2.0
    };

    // Boundary guard: never clean at the forward edge, tighten across
    // the barrel/forward and barrel/endcap transition bands.
    let eta = cell.position.eta().abs();
    let cleanable = eta < 5.0
        && (eta < 2.8 || cell.energy > tighter * thresholds.clean)
        && ((eta - 1.48).abs() > 0.02 || fraction < thresholds.min_sharing / tighter);
    if !cleanable {
        return false;
    }

    states[index as usize] = SeedState::Cleaned;
    mask[index as usize] = false;
    log::debug!(
        "cleaned isolated seed candidate: E={:.3} eta={:.3} sharing fraction={:.4} (cut {:.4})",
        cell.energy,
        cell.position.eta(),
        fraction,
        thresholds.min_sharing,
    );
    true
}

/// Finds the seed cells.
///
/// `order` must list cell indices by decreasing energy; `mask` and
/// `states` must both match the store's length. Returns the seed
/// indices in discovery order and leaves the verdict for every visited
/// cell in `states`. Cleaning clears the mask bit of demoted cells.
pub fn find_seeds(
    cells: &CellStore,
    params: &ClusteringParams,
    order: &[u32],
    mask: &mut [bool],
    states: &mut [SeedState],
) -> Vec<u32> {
    let mut seeds = Vec::new();
    let mut neighbours = Vec::with_capacity(8);

    for &rhi in order {
        if !mask[rhi as usize] {
            continue;
        }
        // Already claimed as the neighbour of a higher-energy seed.
        if states[rhi as usize] == SeedState::No {
            continue;
        }

        let cell = cells.cell(rhi);
        let thresholds = params.thresholds(cell.layer);

        if cell.energy < thresholds.seed
            || (thresholds.seed_pt > 0.0 && cell.pt2 < thresholds.seed_pt * thresholds.seed_pt)
        {
            states[rhi as usize] = SeedState::No;
            continue;
        }

        seed_neighbours(cell, params.connectivity, &mut neighbours);

        states[rhi as usize] = SeedState::Yes;
        for &n in &neighbours {
            if cells.cell(n).energy > cell.energy {
                states[rhi as usize] = SeedState::No;
                break;
            }
        }

        if cell.energy > thresholds.clean {
            clean_isolated(cells, thresholds, rhi, mask, states);
        }

        if states[rhi as usize] == SeedState::Yes {
            seeds.push(rhi);
            for &n in &neighbours {
                states[n as usize] = SeedState::No;
            }
        }
    }

    log::debug!("found {} seeds among {} cells", seeds.len(), cells.len());
    seeds
}

#[cfg(test)]
mod tests {
    use super::*;
    use caloflow_core::{CellGridBuilder, Layer};

    fn run(
        store: &CellStore,
        params: &ClusteringParams,
    ) -> (Vec<u32>, Vec<SeedState>, Vec<bool>) {
        let order = store.indices_by_decreasing_energy();
        let mut mask = vec![true; store.len()];
        let mut states = vec![SeedState::Unknown; store.len()];
        let seeds = find_seeds(store, params, &order, &mut mask, &mut states);
        (seeds, states, mask)
    }

    #[test]
    fn test_single_maximum_wins() {
        let mut builder = CellGridBuilder::new(Layer::HcalBarrel);
        builder.add(0, 0, 5.0).add(0, 1, 3.0).add(0, 2, 1.0);
        let store = builder.build();

        let (seeds, states, _) = run(&store, &ClusteringParams::new());
        assert_eq!(seeds, vec![0]);
        assert_eq!(states[1], SeedState::No);
        // Cell 2 is above threshold but its neighbour holds more energy.
        assert_eq!(states[2], SeedState::No);
    }

    #[test]
    fn test_two_separated_maxima() {
        let mut builder = CellGridBuilder::new(Layer::HcalBarrel);
        builder.add(0, 0, 5.0).add(0, 1, 1.0).add(0, 2, 1.2).add(0, 3, 4.0);
        let store = builder.build();

        let (seeds, _, _) = run(&store, &ClusteringParams::new());
        assert_eq!(seeds, vec![0, 3]);
    }

    #[test]
    fn test_below_threshold_is_not_a_seed() {
        let mut builder = CellGridBuilder::new(Layer::HcalBarrel);
        builder.add(0, 0, 0.1);
        let store = builder.build();

        let (seeds, states, _) = run(&store, &ClusteringParams::new());
        assert!(seeds.is_empty());
        assert_eq!(states[0], SeedState::No);
    }

    #[test]
    fn test_connectivity_none_makes_every_eligible_cell_a_seed() {
        let mut builder = CellGridBuilder::new(Layer::HcalBarrel);
        builder.add(0, 0, 5.0).add(0, 1, 3.0).add(0, 2, 1.0);
        let store = builder.build();

        let params = ClusteringParams::new().with_connectivity(Connectivity::None);
        let (seeds, _, _) = run(&store, &params);
        assert_eq!(seeds, vec![0, 1, 2]);
    }

    #[test]
    fn test_masked_cell_is_skipped() {
        let mut builder = CellGridBuilder::new(Layer::HcalBarrel);
        builder.add(0, 0, 5.0).add(0, 2, 3.0);
        let store = builder.build();

        let order = store.indices_by_decreasing_energy();
        let mut mask = vec![false, true];
        let mut states = vec![SeedState::Unknown; store.len()];
        let seeds = find_seeds(&store, &ClusteringParams::new(), &order, &mut mask, &mut states);
        assert_eq!(seeds, vec![1]);
        assert_eq!(states[0], SeedState::Unknown);
    }

    #[test]
    fn test_isolated_spike_is_cleaned() {
        let mut builder = CellGridBuilder::new(Layer::HcalBarrel);
        builder.add(0, 0, 50.0);
        builder.add(0, 1, 0.0);
        builder.add(0, -1, 0.0);
        builder.add(1, 0, 0.0);
        builder.add(-1, 0, 0.0);
        let store = builder.build();

        let mut barrel = ClusteringParams::new().barrel;
        barrel.clean = 10.0;
        barrel.min_sharing = 0.1;
        let params = ClusteringParams::new().with_barrel(barrel);

        let (seeds, states, mask) = run(&store, &params);
        assert!(seeds.is_empty());
        assert_eq!(states[0], SeedState::Cleaned);
        assert!(!mask[0]);
    }

    #[test]
    fn test_well_shared_spike_survives_cleaning() {
        let mut builder = CellGridBuilder::new(Layer::HcalBarrel);
        builder.add(0, 0, 50.0);
        builder.add(0, 1, 10.0);
        builder.add(0, -1, 10.0);
        let store = builder.build();

        let mut barrel = ClusteringParams::new().barrel;
        barrel.clean = 10.0;
        barrel.min_sharing = 0.1;
        let params = ClusteringParams::new().with_barrel(barrel);

        let (seeds, states, _) = run(&store, &params);
        assert_eq!(seeds, vec![0]);
        assert_eq!(states[0], SeedState::Yes);
    }
}
