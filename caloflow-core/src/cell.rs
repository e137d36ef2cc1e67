//! Cell records and the per-event cell arena.
#![allow(clippy::cast_possible_truncation)]

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Calorimeter layer tag carried by every cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Layer {
    /// Electromagnetic calorimeter, barrel section.
    EcalBarrel,
    /// Electromagnetic calorimeter, endcap section.
    EcalEndcap,
    /// Hadronic calorimeter, barrel section.
    HcalBarrel,
    /// Outer hadronic calorimeter (behind the barrel).
    HcalOuter,
    /// Hadronic calorimeter, endcap section.
    HcalEndcap,
    /// Forward calorimeter, electromagnetic depth.
    ForwardEm,
    /// Forward calorimeter, hadronic depth.
    ForwardHad,
    /// First preshower plane.
    Preshower1,
    /// Second preshower plane.
    Preshower2,
}

impl Layer {
    /// Whether this layer belongs to the barrel threshold group.
    #[inline]
    #[must_use]
    pub fn is_barrel(self) -> bool {
        matches!(self, Layer::EcalBarrel | Layer::HcalBarrel | Layer::HcalOuter)
    }

    /// Whether this layer is part of the electromagnetic calorimeter
    /// proper (the layers subject to the shower-depth correction).
    #[inline]
    #[must_use]
    pub fn is_ecal(self) -> bool {
        matches!(self, Layer::EcalBarrel | Layer::EcalEndcap)
    }

    /// Whether this layer sits in the forward calorimeter.
    #[inline]
    #[must_use]
    pub fn is_forward(self) -> bool {
        matches!(self, Layer::ForwardEm | Layer::ForwardHad)
    }

    /// Whether this layer is a preshower plane.
    #[inline]
    #[must_use]
    pub fn is_preshower(self) -> bool {
        matches!(self, Layer::Preshower1 | Layer::Preshower2)
    }
}

/// A point or vector in the detector frame, in centimetres.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point3 {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate (along the beam axis).
    pub z: f64,
}

impl Point3 {
    /// Creates a new point.
    #[inline]
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The origin.
    #[inline]
    #[must_use]
    pub fn origin() -> Self {
        Self::default()
    }

    /// Distance from the origin.
    #[inline]
    #[must_use]
    pub fn r(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Transverse distance from the beam axis.
    #[inline]
    #[must_use]
    pub fn rho(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Pseudorapidity. Zero at the origin, a signed infinity elsewhere
    /// on the beam axis.
    #[must_use]
    pub fn eta(&self) -> f64 {
        let rho = self.rho();
        if rho > 0.0 {
            (self.z / rho).asinh()
        } else if self.z == 0.0 {
            0.0
        } else if self.z > 0.0 {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        }
    }

    /// Azimuthal angle in (-pi, pi].
    #[inline]
    #[must_use]
    pub fn phi(&self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Euclidean distance to another point.
    #[inline]
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Angular distance sqrt(deta^2 + dphi^2), with phi wrapped.
    #[must_use]
    pub fn delta_r(&self, other: &Self) -> f64 {
        let deta = self.eta() - other.eta();
        let mut dphi = self.phi() - other.phi();
        while dphi > std::f64::consts::PI {
            dphi -= 2.0 * std::f64::consts::PI;
        }
        while dphi < -std::f64::consts::PI {
            dphi += 2.0 * std::f64::consts::PI;
        }
        (deta * deta + dphi * dphi).sqrt()
    }

    /// Dot product, treating both points as vectors.
    #[inline]
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// The unit vector pointing the same way. Zero vectors stay zero.
    #[must_use]
    pub fn unit(&self) -> Self {
        let r = self.r();
        if r > 0.0 {
            Self::new(self.x / r, self.y / r, self.z / r)
        } else {
            *self
        }
    }

    /// This vector scaled by a factor.
    #[inline]
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Component-wise sum.
    #[inline]
    #[must_use]
    pub fn plus(&self, other: &Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

/// Neighbour slot order within [`Cell::neighbours`].
///
/// Slots 0, 2, 4, 6 (N, W, S, E) form the side-sharing 4-neighbourhood;
/// all eight slots form the 8-neighbourhood.
pub const NEIGHBOUR_SIDES: [usize; 4] = [0, 2, 4, 6];

/// Number of neighbour slots per cell.
pub const NEIGHBOUR_SLOTS: usize = 8;

/// A single detector energy deposit. Immutable once constructed; the
/// clustering engine only ever reads cells through a [`CellStore`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cell {
    /// Layer this cell belongs to.
    pub layer: Layer,
    /// Deposited energy.
    pub energy: f64,
    /// Cell centre.
    pub position: Point3,
    /// Unit vector along the cell's depth axis.
    pub axis: Point3,
    /// Energy of the companion cell in the partner layer (zero when the
    /// layer has no partner). Consumed by isolation cleaning.
    pub energy_mate: f64,
    /// Squared transverse momentum assigned to the deposit.
    pub pt2: f64,
    /// Neighbour indices, ordered N, NW, W, SW, S, SE, E, NE.
    /// `None` marks a missing neighbour (detector edge).
    pub neighbours: [Option<u32>; NEIGHBOUR_SLOTS],
}

impl Cell {
    /// Iterates over the side-sharing (4-connectivity) neighbours.
    #[inline]
    pub fn side_neighbours(&self) -> impl Iterator<Item = u32> + '_ {
        NEIGHBOUR_SIDES
            .iter()
            .filter_map(move |&slot| self.neighbours[slot])
    }

    /// Iterates over all (8-connectivity) neighbours.
    #[inline]
    pub fn all_neighbours(&self) -> impl Iterator<Item = u32> + '_ {
        self.neighbours.iter().filter_map(|&n| n)
    }

    /// Whether `other` is a side-sharing neighbour of this cell.
    #[inline]
    #[must_use]
    pub fn is_side_neighbour(&self, other: u32) -> bool {
        self.side_neighbours().any(|n| n == other)
    }

    /// Whether `other` is any neighbour (side or corner) of this cell.
    #[inline]
    #[must_use]
    pub fn is_neighbour(&self, other: u32) -> bool {
        self.all_neighbours().any(|n| n == other)
    }
}

/// Arena of cells for one event. The graph adapter owns the backing
/// store; the engine addresses cells by their `u32` index.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellStore {
    cells: Vec<Cell>,
}

impl CellStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: Vec::with_capacity(capacity),
        }
    }

    /// Appends a cell and returns its index.
    pub fn push(&mut self, cell: Cell) -> u32 {
        let index = self.cells.len() as u32;
        self.cells.push(cell);
        index
    }

    /// Number of cells in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the store holds no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The cell at `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of range. The graph adapter guarantees
    /// neighbour references are valid, so in-range indices are a
    /// precondition of every engine entry point.
    #[inline]
    #[must_use]
    pub fn cell(&self, index: u32) -> &Cell {
        &self.cells[index as usize]
    }

    /// The cell at `index`, as a checked lookup for boundary code.
    pub fn get(&self, index: u32) -> Result<&Cell> {
        self.cells
            .get(index as usize)
            .ok_or(Error::CellIndexOutOfRange {
                index: index as usize,
                len: self.cells.len(),
            })
    }

    /// Iterates over `(index, cell)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Cell)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, c)| (i as u32, c))
    }

    /// Cell indices sorted by strictly decreasing energy, index order
    /// breaking ties. Deterministic for a fixed input order.
    #[must_use]
    pub fn indices_by_decreasing_energy(&self) -> Vec<u32> {
        let mut order: Vec<u32> = (0..self.cells.len() as u32).collect();
        order.sort_by(|&a, &b| {
            self.cells[b as usize]
                .energy
                .partial_cmp(&self.cells[a as usize].energy)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bare_cell(energy: f64) -> Cell {
        Cell {
            layer: Layer::HcalBarrel,
            energy,
            position: Point3::new(100.0, 0.0, 0.0),
            axis: Point3::new(1.0, 0.0, 0.0),
            energy_mate: 0.0,
            pt2: energy * energy,
            neighbours: [None; NEIGHBOUR_SLOTS],
        }
    }

    #[test]
    fn test_point_eta_phi() {
        let p = Point3::new(3.0, 4.0, 0.0);
        assert_relative_eq!(p.rho(), 5.0);
        assert_relative_eq!(p.eta(), 0.0);
        assert_relative_eq!(p.phi(), (4.0f64 / 3.0).atan(), epsilon = 1e-12);

        let forward = Point3::new(0.0, 0.0, 10.0);
        assert!(forward.eta().is_infinite());
        assert!(forward.eta() > 0.0);
    }

    #[test]
    fn test_delta_r_phi_wrap() {
        let a = Point3::new(1.0, 1e-9, 0.0);
        let b = Point3::new(1.0, -1e-9, 0.0);
        // Just across the phi = 0 line: tiny delta, no 2pi jump.
        assert!(a.delta_r(&b) < 1e-6);
    }

    #[test]
    fn test_side_neighbours_pick_even_slots() {
        let mut cell = bare_cell(1.0);
        cell.neighbours = [
            Some(0),
            Some(1),
            Some(2),
            Some(3),
            Some(4),
            Some(5),
            Some(6),
            Some(7),
        ];
        let sides: Vec<u32> = cell.side_neighbours().collect();
        assert_eq!(sides, vec![0, 2, 4, 6]);
        assert_eq!(cell.all_neighbours().count(), 8);
        assert!(cell.is_side_neighbour(4));
        assert!(!cell.is_side_neighbour(5));
        assert!(cell.is_neighbour(5));
    }

    #[test]
    fn test_store_energy_order_is_stable() {
        let mut store = CellStore::new();
        store.push(bare_cell(1.0));
        store.push(bare_cell(3.0));
        store.push(bare_cell(2.0));
        store.push(bare_cell(3.0));
        assert_eq!(store.indices_by_decreasing_energy(), vec![1, 3, 2, 0]);
    }

    #[test]
    fn test_store_checked_lookup() {
        let mut store = CellStore::new();
        store.push(bare_cell(1.0));
        assert!(store.get(0).is_ok());
        assert!(store.get(1).is_err());
    }

    #[test]
    fn test_layer_groups() {
        assert!(Layer::HcalOuter.is_barrel());
        assert!(!Layer::HcalEndcap.is_barrel());
        assert!(Layer::EcalEndcap.is_ecal());
        assert!(Layer::ForwardEm.is_forward());
        assert!(Layer::Preshower2.is_preshower());
    }
}
