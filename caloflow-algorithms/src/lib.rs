//! caloflow-algorithms: The particle-flow clustering engine.
//!
//! Stages, in data-flow order:
//! - **Seed finding**: local energy maxima above threshold, with
//!   isolation cleaning of noise spikes
//! - **Topological building**: flood fill through above-threshold
//!   neighbours, one region per connected seed group
//! - **Energy sharing**: iterative Gaussian splitting of each region's
//!   energy among its seeds
//! - **Position calculation**: log-weighted, depth-corrected cluster
//!   positions
//!
#![warn(missing_docs)]

mod engine;
mod position;
mod seeding;
mod sharing;
mod topo;

pub use engine::ClusterEngine;
pub use seeding::{find_seeds, SeedState};
pub use sharing::{resolve_topo_cluster, MAX_ITERATIONS};
pub use topo::build_topo_clusters;

// Re-export the core types the engine API speaks in.
pub use caloflow_core::{
    CellStore, Cluster, ClusteringParams, Connectivity, DepthCorrection, PositionMode,
};
