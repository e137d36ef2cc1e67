//! Planar grid cell-graph builder.
//!
//! The production cell graph comes from the detector geometry service;
//! this builder is the in-repo stand-in used by the CLI and the test
//! suite. Cells sit on a rectangular grid on the plane x = radius, rows
//! running along z and columns along y, with 8-way neighbour wiring
//! between the cells that are actually present.
#![allow(clippy::cast_possible_truncation)]

use std::collections::HashMap;

use crate::cell::{Cell, CellStore, Layer, Point3, NEIGHBOUR_SLOTS};

/// Assembles a [`CellStore`] from grid-addressed energy deposits.
#[derive(Debug, Clone)]
pub struct CellGridBuilder {
    layer: Layer,
    pitch: f64,
    radius: f64,
    z_offset: f64,
    deposits: Vec<(i32, i32, f64, f64)>,
    occupied: HashMap<(i32, i32), u32>,
}

/// Neighbour slot offsets in (row, col), matching the N, NW, W, SW, S,
/// SE, E, NE order of [`Cell::neighbours`].
const SLOT_OFFSETS: [(i32, i32); NEIGHBOUR_SLOTS] = [
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

impl CellGridBuilder {
    /// Creates a builder for a grid of cells in `layer`.
    #[must_use]
    pub fn new(layer: Layer) -> Self {
        Self {
            layer,
            pitch: 1.0,
            radius: 200.0,
            z_offset: 0.0,
            deposits: Vec::new(),
            occupied: HashMap::new(),
        }
    }

    /// Sets the cell pitch (centimetres).
    #[must_use]
    pub fn with_pitch(mut self, pitch: f64) -> Self {
        self.pitch = pitch;
        self
    }

    /// Sets the distance of the grid plane from the beam axis.
    #[must_use]
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Shifts the whole grid along z (moves it in pseudorapidity).
    #[must_use]
    pub fn with_z_offset(mut self, z_offset: f64) -> Self {
        self.z_offset = z_offset;
        self
    }

    /// Adds a deposit at grid address (row, col). Rows grow along z,
    /// columns along y. Later deposits at the same address are ignored.
    pub fn add(&mut self, row: i32, col: i32, energy: f64) -> &mut Self {
        self.add_with_mate(row, col, energy, 0.0)
    }

    /// Adds a deposit together with its companion-layer energy.
    pub fn add_with_mate(
        &mut self,
        row: i32,
        col: i32,
        energy: f64,
        energy_mate: f64,
    ) -> &mut Self {
        if let std::collections::hash_map::Entry::Vacant(entry) =
            self.occupied.entry((row, col))
        {
            entry.insert(self.deposits.len() as u32);
            self.deposits.push((row, col, energy, energy_mate));
        }
        self
    }

    /// Number of deposits added so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.deposits.len()
    }

    /// Whether no deposits have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deposits.is_empty()
    }

    /// Builds the cell store. Cell indices follow insertion order, so a
    /// fixed sequence of `add` calls yields an identical store.
    #[must_use]
    pub fn build(&self) -> CellStore {
        let mut store = CellStore::with_capacity(self.deposits.len());
        for &(row, col, energy, energy_mate) in &self.deposits {
            let position = Point3::new(
                self.radius,
                f64::from(col) * self.pitch,
                f64::from(row) * self.pitch + self.z_offset,
            );
            let r2 = position.dot(&position);
            let pt2 = if r2 > 0.0 {
                energy * energy * position.rho() * position.rho() / r2
            } else {
                0.0
            };
            let mut neighbours = [None; NEIGHBOUR_SLOTS];
            for (slot, &(dr, dc)) in SLOT_OFFSETS.iter().enumerate() {
                neighbours[slot] = self.occupied.get(&(row + dr, col + dc)).copied();
            }
            store.push(Cell {
                layer: self.layer,
                energy,
                position,
                axis: position.unit(),
                energy_mate,
                pt2,
                neighbours,
            });
        }
        store
    }
}
