//! Column geometry: a dense D×D×H cell lattice cut to a cylinder.
//!
//! The cross-section is the circle inscribed in the D×D square. A cell is
//! free when its center lies inside (or exactly on) that circle; everything
//! else is wall and never carries liquid or tracer.
//!
//! Cells are stored in one flat `Vec<Cell>` indexed `(z * D + y) * D + x`,
//! so a level is a contiguous slice and levels are visited top-down by
//! increasing `z`.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalyst::PlacementReport;
use crate::error::{ColumnError, Result};
use crate::flow::FlowReport;
use crate::ways::{LockedWays, MAX_LOCKED_WAYS};

/// Upper bound on the number of cells a single column may allocate.
pub const MAX_CELLS: u128 = 1 << 30;

/// Per-cell state. Fixed size, no heap data.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Cell {
    /// Center lies within the circular cross-section. Immutable.
    pub free: bool,
    /// Directions through which this cell cannot be entered. Immutable.
    pub locked: LockedWays,
    /// Occupied by catalyst.
    pub catalyst: bool,
    /// Fraction of injected liquid reaching this cell.
    pub volume: f64,
    /// Carries liquid after propagation (`volume > 0`).
    pub wet: bool,
}

/// Integer cell coordinates; `z` grows downwards from the injection level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellIndex {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl CellIndex {
    #[inline]
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }
}

/// Horizontal position of the injection jet. The injection cell is `(x, y, 0)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Injection {
    pub x: usize,
    pub y: usize,
}

impl Injection {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// The jet aimed at the middle of the cross-section, `(D/2, D/2)`.
    pub const fn centered(diameter: usize) -> Self {
        Self {
            x: diameter / 2,
            y: diameter / 2,
        }
    }

    /// The top-level cell receiving the jet.
    #[inline]
    pub const fn cell(self) -> CellIndex {
        CellIndex::new(self.x, self.y, 0)
    }
}

/// How far a column has been prepared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Geometry and connectivity only.
    Built,
    /// Catalyst placed, volumes cleared.
    Placed,
    /// Volumes and wetness computed; ready for sampling.
    Propagated,
}

/// Flat, serializable view of one cell for the orchestration layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub x: usize,
    pub y: usize,
    pub z: usize,
    pub free: bool,
    pub catalyst: bool,
    pub volume: f64,
    pub wet: bool,
    pub locked_ways: Vec<(i32, i32)>,
}

/// The packed column: geometry, connectivity and per-try occupancy/flow.
#[derive(Clone, Debug)]
pub struct Column {
    diameter: usize,
    height: usize,
    cell_length: f64,
    lock_count: usize,
    pub(crate) injection: Injection,
    pub(crate) stage: Stage,
    pub(crate) cells: Vec<Cell>,
    pub(crate) placement: Option<PlacementReport>,
    pub(crate) flow: Option<FlowReport>,
}

/// Whether a point at offset `(dx, dy)` from the center lies within `radius`.
///
/// Inclusive: a point exactly on the circle is inside.
#[inline]
pub fn center_within(dx: f64, dy: f64, radius: f64) -> bool {
    dx * dx + dy * dy <= radius * radius
}

/// Inscribed-circle rule for cell `(x, y)` of a `diameter`-wide square.
pub fn is_free_cell(x: usize, y: usize, diameter: usize, cell_length: f64) -> bool {
    let radius = 0.5 * diameter as f64 * cell_length;
    let dx = cell_length * (x as f64 + 0.5) - radius;
    let dy = cell_length * (y as f64 + 0.5) - radius;
    center_within(dx, dy, radius)
}

impl Column {
    /// Build the lattice, mark free cells and draw each free cell's locked ways.
    ///
    /// Randomness is consumed only for connectivity, one draw per free cell in
    /// storage order.
    pub fn new<R: Rng + ?Sized>(
        diameter: usize,
        height: usize,
        cell_length: f64,
        lock_count: usize,
        rng: &mut R,
    ) -> Result<Self> {
        if diameter == 0 {
            return Err(ColumnError::invalid("diameter", "must be positive, got 0"));
        }
        if height == 0 {
            return Err(ColumnError::invalid("height", "must be positive, got 0"));
        }
        if !(cell_length.is_finite() && cell_length > 0.0) {
            return Err(ColumnError::invalid(
                "cell_length",
                format!("must be positive and finite, got {cell_length}"),
            ));
        }
        if lock_count > MAX_LOCKED_WAYS {
            return Err(ColumnError::invalid(
                "lock_count",
                format!("must be at most {MAX_LOCKED_WAYS}, got {lock_count}"),
            ));
        }

        let cell_count = (diameter as u128)
            .checked_mul(diameter as u128)
            .and_then(|n| n.checked_mul(height as u128))
            .unwrap_or(u128::MAX);
        if cell_count > MAX_CELLS {
            return Err(ColumnError::OutOfResources { cells: cell_count });
        }
        let cell_count = cell_count as usize;

        let mut cells = Vec::new();
        cells
            .try_reserve_exact(cell_count)
            .map_err(|_| ColumnError::OutOfResources {
                cells: cell_count as u128,
            })?;

        // The free mask is identical on every level.
        let free_mask: Vec<bool> = (0..diameter * diameter)
            .map(|i| is_free_cell(i % diameter, i / diameter, diameter, cell_length))
            .collect();

        for _z in 0..height {
            for &free in &free_mask {
                let locked = if free {
                    LockedWays::random(lock_count, rng)
                } else {
                    LockedWays::NONE
                };
                cells.push(Cell {
                    free,
                    locked,
                    ..Cell::default()
                });
            }
        }

        Ok(Self {
            diameter,
            height,
            cell_length,
            lock_count,
            injection: Injection::centered(diameter),
            stage: Stage::Built,
            cells,
            placement: None,
            flow: None,
        })
    }

    // ========== Dimensions ==========

    /// Cells across the cross-section.
    pub fn diameter(&self) -> usize {
        self.diameter
    }

    /// Number of levels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Physical edge length of one cell.
    pub fn cell_length(&self) -> f64 {
        self.cell_length
    }

    /// Locked ways drawn per free cell.
    pub fn lock_count(&self) -> usize {
        self.lock_count
    }

    pub fn injection(&self) -> Injection {
        self.injection
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Statistics of the latest catalyst placement, if any.
    pub fn placement_report(&self) -> Option<&PlacementReport> {
        self.placement.as_ref()
    }

    /// Diagnostics of the latest flow propagation, if any.
    pub fn flow_report(&self) -> Option<&FlowReport> {
        self.flow.as_ref()
    }

    // ========== Indexing ==========

    #[inline]
    pub fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.diameter + y) * self.diameter + x
    }

    #[inline]
    pub fn contains(&self, at: CellIndex) -> bool {
        at.x < self.diameter && at.y < self.diameter && at.z < self.height
    }

    /// Cell at `at`. Panics when out of bounds; use [`Column::get`] otherwise.
    #[inline]
    pub fn cell(&self, at: CellIndex) -> &Cell {
        &self.cells[self.idx(at.x, at.y, at.z)]
    }

    #[inline]
    pub(crate) fn cell_mut(&mut self, at: CellIndex) -> &mut Cell {
        let i = self.idx(at.x, at.y, at.z);
        &mut self.cells[i]
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<&Cell> {
        if self.contains(CellIndex::new(x, y, z)) {
            Some(&self.cells[self.idx(x, y, z)])
        } else {
            None
        }
    }

    /// All cells in storage order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Coordinates of every cell on level `z`, x varying fastest.
    pub fn level(&self, z: usize) -> impl Iterator<Item = CellIndex> {
        let d = self.diameter;
        (0..d * d).map(move |i| CellIndex::new(i % d, i / d, z))
    }

    // ========== Neighbour rule ==========

    /// Collect the neighbours of `from` on level `from.z + dz` into `out`.
    ///
    /// A destination qualifies when it is inside the grid, free, does not lock
    /// the offset it is entered through, and passes `accept`. The cell itself
    /// is never its own neighbour. `out` is cleared first.
    pub fn collect_neighbors<F>(
        &self,
        from: CellIndex,
        dz: usize,
        offsets: &[(i32, i32)],
        accept: F,
        out: &mut Vec<CellIndex>,
    ) where
        F: Fn(&Cell) -> bool,
    {
        out.clear();
        let z = from.z + dz;
        if z >= self.height {
            return;
        }
        for &(dx, dy) in offsets {
            if dz == 0 && dx == 0 && dy == 0 {
                continue;
            }
            let (Some(x), Some(y)) = (
                step(from.x, dx, self.diameter),
                step(from.y, dy, self.diameter),
            ) else {
                continue;
            };
            let dest = &self.cells[self.idx(x, y, z)];
            if !dest.free || dest.locked.contains(dx, dy) || !accept(dest) {
                continue;
            }
            out.push(CellIndex::new(x, y, z));
        }
    }

    // ========== Reporting ==========

    /// Free cells per level (identical on every level).
    pub fn free_cells_per_level(&self) -> usize {
        self.cells[..self.diameter * self.diameter]
            .iter()
            .filter(|c| c.free)
            .count()
    }

    /// Sum of `volume` over each level, top to bottom.
    pub fn level_volume_sums(&self) -> Vec<f64> {
        let per_level = self.diameter * self.diameter;
        self.cells
            .chunks(per_level)
            .map(|level| level.iter().map(|c| c.volume).sum())
            .collect()
    }

    /// Plain per-cell data for persistence by the caller.
    pub fn cell_records(&self) -> Vec<CellRecord> {
        let d = self.diameter;
        self.cells
            .iter()
            .enumerate()
            .map(|(i, c)| CellRecord {
                x: i % d,
                y: (i / d) % d,
                z: i / (d * d),
                free: c.free,
                catalyst: c.catalyst,
                volume: c.volume,
                wet: c.wet,
                locked_ways: c.locked.offsets().collect(),
            })
            .collect()
    }
}

/// `base + delta` if it stays within `[0, limit)`.
#[inline]
fn step(base: usize, delta: i32, limit: usize) -> Option<usize> {
    let moved = base as i64 + delta as i64;
    if moved >= 0 && (moved as usize) < limit {
        Some(moved as usize)
    } else {
        None
    }
}
