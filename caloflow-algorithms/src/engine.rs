//! The clustering engine front end.
//!
//! Runs seed finding, topological building and per-region energy
//! sharing, in order, over one event's cell store. Regions share no
//! mutable state and resolve in parallel.

use rayon::prelude::*;

use caloflow_core::{CellStore, Cluster, ClusteringParams, Result};

use crate::seeding::{find_seeds, SeedState};
use crate::sharing::resolve_topo_cluster;
use crate::topo::build_topo_clusters;

/// One clustering engine, immutable parameters for its lifetime.
///
/// The cell mask persists across invocations so that callers can
/// exclude cells between events; it is reinitialized to all-true
/// whenever the cell count changes.
#[derive(Debug, Clone)]
pub struct ClusterEngine {
    params: ClusteringParams,
    mask: Vec<bool>,
}

impl ClusterEngine {
    /// Creates an engine with the given parameter table.
    #[must_use]
    pub fn new(params: ClusteringParams) -> Self {
        Self {
            params,
            mask: Vec::new(),
        }
    }

    /// The engine's parameter table.
    #[must_use]
    pub fn params(&self) -> &ClusteringParams {
        &self.params
    }

    /// Replaces the cell mask. Cells whose bit is false are never
    /// seeds and never anchor regions.
    pub fn set_mask(&mut self, mask: Vec<bool>) {
        self.mask = mask;
    }

    /// Clusters one event.
    ///
    /// Returns the finalized clusters, region by region in seed
    /// discovery order. Deterministic for a fixed cell store and mask.
    ///
    /// # Errors
    /// Propagates [`caloflow_core::Error::DegeneratePosition`] when a
    /// cluster's position collapses after the depth correction.
    pub fn cluster(&mut self, cells: &CellStore) -> Result<Vec<Cluster>> {
        if self.mask.len() != cells.len() {
            self.mask = vec![true; cells.len()];
        }
        if cells.is_empty() {
            return Ok(Vec::new());
        }

        let order = cells.indices_by_decreasing_energy();
        let mut states = vec![SeedState::Unknown; cells.len()];
        let mut used = vec![false; cells.len()];

        let seeds = find_seeds(cells, &self.params, &order, &mut self.mask, &mut states);
        let regions = build_topo_clusters(cells, &self.params, &self.mask, &seeds, &mut used);

        let resolved: Result<Vec<Vec<Cluster>>> = regions
            .par_iter()
            .map(|region| resolve_topo_cluster(cells, &self.params, region, &states))
            .collect();

        let mut clusters = Vec::new();
        for region_clusters in resolved? {
            clusters.extend(region_clusters);
        }
        log::debug!(
            "clustered {} cells into {} clusters across {} regions",
            cells.len(),
            clusters.len(),
            regions.len(),
        );
        Ok(clusters)
    }
}
