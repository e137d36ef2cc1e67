//! caloflow-core: Core types for particle-flow clustering of calorimeter
//! cells.
//!
//! This crate provides the cell arena, the cluster output records, the
//! clustering parameter table, and a planar grid builder standing in for
//! the external cell-graph adapter.

pub mod cell;
pub mod cluster;
pub mod error;
pub mod grid;
pub mod params;

pub use cell::{Cell, CellStore, Layer, Point3, NEIGHBOUR_SIDES, NEIGHBOUR_SLOTS};
pub use cluster::{CellFraction, Cluster};
pub use error::{Error, Result};
pub use grid::CellGridBuilder;
pub use params::{
    ClusteringParams, Connectivity, DepthCorrection, PositionMode, Thresholds,
};
