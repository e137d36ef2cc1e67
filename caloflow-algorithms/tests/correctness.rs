#![allow(clippy::uninlined_format_args)]
use approx::assert_relative_eq;
use caloflow_algorithms::{
    build_topo_clusters, find_seeds, ClusterEngine, ClusteringParams, Connectivity, SeedState,
    MAX_ITERATIONS,
};
use caloflow_core::{CellGridBuilder, CellStore, Layer, Thresholds};

fn thresholds(cell: f64, seed: f64) -> Thresholds {
    Thresholds {
        cell,
        cell_pt: 0.0,
        seed,
        seed_pt: 0.0,
        clean: 1e5,
        min_sharing: 0.0,
    }
}

fn params(cell: f64, seed: f64) -> ClusteringParams {
    ClusteringParams::new()
        .with_barrel(thresholds(cell, seed))
        .with_endcap(thresholds(cell, seed))
}

/// A 7x7 patch with two energy bumps on a noise floor.
fn two_bump_event() -> CellStore {
    let mut builder = CellGridBuilder::new(Layer::HcalBarrel);
    for row in 0..7 {
        for col in 0..7 {
            let energy = match (row, col) {
                (1, 1) => 9.0,
                (1, 2) | (2, 1) | (0, 1) | (1, 0) => 1.5,
                (5, 5) => 6.0,
                (5, 4) | (4, 5) | (5, 6) | (6, 5) => 1.2,
                _ => 0.3,
            };
            builder.add(row, col, energy);
        }
    }
    builder.build()
}

fn seeds_of(store: &CellStore, params: &ClusteringParams) -> (Vec<u32>, Vec<SeedState>, Vec<bool>) {
    let order = store.indices_by_decreasing_energy();
    let mut mask = vec![true; store.len()];
    let mut states = vec![SeedState::Unknown; store.len()];
    let seeds = find_seeds(store, params, &order, &mut mask, &mut states);
    (seeds, states, mask)
}

#[test]
fn test_seed_exclusivity() {
    let store = two_bump_event();
    let p = params(0.5, 1.0);
    let (seeds, _, _) = seeds_of(&store, &p);
    assert!(!seeds.is_empty());

    for &s in &seeds {
        for n in store.cell(s).side_neighbours() {
            assert!(
                !seeds.contains(&n),
                "seed {} and its neighbour {} are both seeds",
                s,
                n
            );
        }
    }
}

#[test]
fn test_seed_threshold_monotonicity() {
    let store = two_bump_event();
    let mut counts = Vec::new();
    for seed_thresh in [0.5, 1.0, 1.4, 3.0, 8.0, 20.0] {
        let p = params(0.3, seed_thresh);
        let (seeds, _, _) = seeds_of(&store, &p);
        counts.push(seeds.len());
    }
    for pair in counts.windows(2) {
        assert!(
            pair[1] <= pair[0],
            "raising the seed threshold increased the seed count: {:?}",
            counts
        );
    }
}

#[test]
fn test_region_partition() {
    let store = two_bump_event();
    let p = params(1.0, 2.0);
    let (seeds, _, mask) = seeds_of(&store, &p);
    let mut used = vec![false; store.len()];
    let regions = build_topo_clusters(&store, &p, &mask, &seeds, &mut used);

    // At most one region per cell.
    let mut owner = vec![None; store.len()];
    for (ir, region) in regions.iter().enumerate() {
        for &i in region {
            assert!(owner[i as usize].is_none(), "cell {} in two regions", i);
            owner[i as usize] = Some(ir);
        }
    }

    // Region members are above the cell threshold; cells adjacent to a
    // region and above threshold belong to one.
    for region in &regions {
        for &i in region {
            assert!(store.cell(i).energy >= 1.0);
            for n in store.cell(i).side_neighbours() {
                if store.cell(n).energy >= 1.0 {
                    assert!(owner[n as usize].is_some());
                }
            }
        }
    }
}

#[test]
fn test_fraction_boundedness() {
    let store = two_bump_event();
    let mut engine = ClusterEngine::new(params(0.2, 1.0));
    let clusters = engine.cluster(&store).unwrap();
    assert!(!clusters.is_empty());

    for cell in 0..store.len() as u32 {
        let total: f64 = clusters.iter().filter_map(|c| c.fraction_of(cell)).sum();
        assert!(
            total <= 1.0 + 1e-9,
            "cell {} carries total fraction {}",
            cell,
            total
        );
    }
}

#[test]
fn test_single_seed_region_fractions_are_one() {
    let mut builder = CellGridBuilder::new(Layer::HcalBarrel);
    builder.add(0, 0, 5.0).add(0, 1, 1.0).add(1, 0, 1.0).add(0, -1, 1.0);
    let store = builder.build();

    let mut engine = ClusterEngine::new(params(0.5, 2.0));
    let clusters = engine.cluster(&store).unwrap();
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].fractions.len(), 4);
    for f in &clusters[0].fractions {
        assert_relative_eq!(f.fraction, 1.0);
    }
    assert_relative_eq!(clusters[0].energy, 8.0);
}

#[test]
fn test_convergence_stays_bounded() {
    // A crowded ridge of near-equal seeds: hard case for the sharing
    // loop. The engine must return whether or not it converged, and
    // the iteration cap is a compile-time constant.
    assert_eq!(MAX_ITERATIONS, 50);

    let mut builder = CellGridBuilder::new(Layer::HcalBarrel);
    for col in 0..20 {
        let energy = if col % 3 == 0 { 5.0 + f64::from(col) * 0.01 } else { 1.0 };
        builder.add(0, col, energy);
    }
    let store = builder.build();

    let mut engine = ClusterEngine::new(params(0.5, 2.0));
    let clusters = engine.cluster(&store).unwrap();
    assert_eq!(clusters.len(), 7);
}

#[test]
fn test_two_seed_line_scenario() {
    // Seeds of 10 and 8 separated by three unit cells, sigma = 5,
    // 4-connectivity: one region, two clusters, shared cells split
    // with fractions summing to one.
    let mut builder = CellGridBuilder::new(Layer::HcalBarrel);
    builder
        .add(0, 0, 10.0)
        .add(0, 1, 1.0)
        .add(0, 2, 1.0)
        .add(0, 3, 1.0)
        .add(0, 4, 8.0);
    let store = builder.build();

    let p = params(0.5, 2.0).with_shower_sigma(5.0);
    let (seeds, _, mask) = seeds_of(&store, &p);
    assert_eq!(seeds.len(), 2);
    let mut used = vec![false; store.len()];
    let regions = build_topo_clusters(&store, &p, &mask, &seeds, &mut used);
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].len(), 5);

    let mut engine = ClusterEngine::new(p);
    let clusters = engine.cluster(&store).unwrap();
    assert_eq!(clusters.len(), 2);

    for shared in [1u32, 2, 3] {
        let total: f64 = clusters.iter().filter_map(|c| c.fraction_of(shared)).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-9);
    }

    // Each cluster holds its seed's energy plus its share of the ridge.
    assert!(clusters[0].energy > 10.0);
    assert!(clusters[1].energy > 8.0);
    assert_relative_eq!(clusters[0].energy + clusters[1].energy, 13.0, epsilon = 1e-6);

    // The cell next to each seed leans towards that seed's cluster
    // relative to the cell next to the other seed.
    let near_first = clusters[0].fraction_of(1).unwrap();
    let far_first = clusters[0].fraction_of(3).unwrap();
    assert!(near_first > far_first);
}

#[test]
fn test_isolated_spike_is_cleaned_away() {
    let mut builder = CellGridBuilder::new(Layer::HcalBarrel);
    builder.add(0, 0, 50.0);
    builder.add(0, 1, 0.0).add(0, -1, 0.0).add(1, 0, 0.0).add(-1, 0, 0.0);
    let store = builder.build();

    let mut t = thresholds(0.5, 2.0);
    t.clean = 10.0;
    t.min_sharing = 0.2;
    let p = ClusteringParams::new().with_barrel(t).with_endcap(t);

    let mut engine = ClusterEngine::new(p);
    let clusters = engine.cluster(&store).unwrap();
    assert!(clusters.is_empty(), "cleaned spike still produced clusters");
}

#[test]
fn test_connectivity_zero_gives_one_cluster_per_cell() {
    let mut builder = CellGridBuilder::new(Layer::HcalBarrel);
    for col in 0..4 {
        builder.add(0, col, 3.0 + f64::from(col));
    }
    let store = builder.build();

    let p = params(0.5, 2.0).with_connectivity(Connectivity::None);
    let mut engine = ClusterEngine::new(p);
    let clusters = engine.cluster(&store).unwrap();

    // Every eligible cell seeds its own cluster and keeps its energy;
    // clusters come out in decreasing seed energy order.
    assert_eq!(clusters.len(), 4);
    let energies: Vec<f64> = clusters.iter().map(|c| c.energy).collect();
    for (got, want) in energies.iter().zip([6.0, 5.0, 4.0, 3.0]) {
        assert_relative_eq!(*got, want, epsilon = 1e-9);
    }
}

#[test]
fn test_deterministic_output() {
    let store = two_bump_event();
    let mut engine_a = ClusterEngine::new(params(0.3, 1.0));
    let mut engine_b = ClusterEngine::new(params(0.3, 1.0));
    let a = engine_a.cluster(&store).unwrap();
    let b = engine_b.cluster(&store).unwrap();

    assert_eq!(a.len(), b.len());
    for (ca, cb) in a.iter().zip(&b) {
        assert_relative_eq!(ca.energy, cb.energy);
        assert_relative_eq!(ca.position.x, cb.position.x);
        assert_eq!(ca.fractions.len(), cb.fractions.len());
    }
}
