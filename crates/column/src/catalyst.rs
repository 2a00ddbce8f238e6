//! Random catalyst placement and plug repair.
//!
//! Every free cell independently receives catalyst with the configured share.
//! A catalyst cell is a plug when no same-level lateral neighbour could take
//! liquid around it; plugs are cleared in one pass over a snapshot of the
//! occupancy taken after placement. Clearing a plug never creates a new one,
//! but the pass is not iterated.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ColumnError, Result};
use crate::grid::{CellIndex, Column, Injection, Stage};
use crate::ways::LATERAL_OFFSETS;

/// Occupancy statistics of one placement.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementReport {
    /// Free cells in the whole column.
    pub free_cells: usize,
    /// Catalyst cells after the Bernoulli draw and injection clearing.
    pub placed: usize,
    /// Plugs cleared by the repair pass.
    pub repaired: usize,
    /// Catalyst cells remaining.
    pub catalyst_cells: usize,
}

impl PlacementReport {
    /// Fraction of free cells holding catalyst after repair.
    pub fn achieved_share(&self) -> f64 {
        if self.free_cells == 0 {
            0.0
        } else {
            self.catalyst_cells as f64 / self.free_cells as f64
        }
    }
}

/// Fill the column with catalyst and repair plugs.
///
/// Resets volumes and wetness from any previous try. Connectivity is left
/// untouched. The injection cell never holds catalyst.
pub fn place<R: Rng + ?Sized>(
    column: &mut Column,
    share: f64,
    injection: Injection,
    rng: &mut R,
) -> Result<PlacementReport> {
    if !(0.0..=1.0).contains(&share) {
        return Err(ColumnError::invalid(
            "catalyst_share",
            format!("must lie in [0, 1], got {share}"),
        ));
    }
    if injection.x >= column.diameter() || injection.y >= column.diameter() {
        return Err(ColumnError::invalid(
            "injection",
            format!(
                "({}, {}) lies outside a {}-wide grid",
                injection.x,
                injection.y,
                column.diameter()
            ),
        ));
    }

    let mut report = PlacementReport::default();
    for cell in column.cells.iter_mut() {
        cell.volume = 0.0;
        cell.wet = false;
        cell.catalyst = cell.free && rng.gen_bool(share);
        report.free_cells += cell.free as usize;
    }
    column.cell_mut(injection.cell()).catalyst = false;
    column.injection = injection;
    report.placed = column.cells.iter().filter(|c| c.catalyst).count();

    let plugs = find_plugs(column);
    for &at in &plugs {
        column.cell_mut(at).catalyst = false;
    }
    report.repaired = plugs.len();
    report.catalyst_cells = report.placed - report.repaired;

    log::debug!(
        "placed catalyst in {} of {} free cells (target share {share}, achieved {:.4}), repaired {} plugs",
        report.catalyst_cells,
        report.free_cells,
        report.achieved_share(),
        report.repaired,
    );

    column.stage = Stage::Placed;
    column.flow = None;
    column.placement = Some(report.clone());
    Ok(report)
}

/// Catalyst cells without a free, catalyst-free, unlocked same-level neighbour.
pub fn find_plugs(column: &Column) -> Vec<CellIndex> {
    let mut plugs = Vec::new();
    let mut neighbours = Vec::with_capacity(LATERAL_OFFSETS.len());
    for z in 0..column.height() {
        for at in column.level(z) {
            if !column.cell(at).catalyst {
                continue;
            }
            column.collect_neighbors(at, 0, &LATERAL_OFFSETS, |c| !c.catalyst, &mut neighbours);
            if neighbours.is_empty() {
                plugs.push(at);
            }
        }
    }
    plugs
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn built(d: usize, h: usize, locks: usize, seed: u64) -> (Column, ChaCha8Rng) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let col = Column::new(d, h, 2.0, locks, &mut rng).unwrap();
        (col, rng)
    }

    #[test]
    fn zero_share_places_nothing() {
        let (mut col, mut rng) = built(9, 6, 2, 11);
        let report = place(&mut col, 0.0, Injection::centered(9), &mut rng).unwrap();
        assert_eq!(report.placed, 0);
        assert_eq!(report.repaired, 0);
        assert!(col.cells().iter().all(|c| !c.catalyst));
        assert_eq!(col.stage(), Stage::Placed);
    }

    #[test]
    fn full_share_leaves_no_plug() {
        let (mut col, mut rng) = built(9, 6, 0, 5);
        let report = place(&mut col, 1.0, Injection::centered(9), &mut rng).unwrap();
        assert!(find_plugs(&col).is_empty());
        // Only the injection cell is clear before repair.
        assert_eq!(report.placed, report.free_cells - 1);
        // Top level keeps the ring around the injection cell.
        assert_eq!(report.catalyst_cells, 8);
        assert!(!col.cell(col.injection().cell()).catalyst);
    }

    #[test]
    fn injection_cell_is_cleared() {
        let (mut col, mut rng) = built(7, 3, 0, 2);
        let injection = Injection::new(2, 4);
        for _ in 0..20 {
            place(&mut col, 0.9, injection, &mut rng).unwrap();
            assert!(!col.cell(injection.cell()).catalyst);
        }
    }

    #[test]
    fn walls_never_hold_catalyst() {
        let (mut col, mut rng) = built(13, 4, 1, 8);
        place(&mut col, 1.0, Injection::centered(13), &mut rng).unwrap();
        assert!(col.cells().iter().filter(|c| !c.free).all(|c| !c.catalyst));
    }

    #[test]
    fn placement_resets_previous_flow() {
        let (mut col, mut rng) = built(5, 3, 0, 4);
        col.cells[0].volume = 0.5;
        col.cells[0].wet = true;
        place(&mut col, 0.3, Injection::centered(5), &mut rng).unwrap();
        assert!(col.cells().iter().all(|c| c.volume == 0.0 && !c.wet));
        assert!(col.flow_report().is_none());
    }

    #[test]
    fn rejects_bad_share_and_injection() {
        let (mut col, mut rng) = built(5, 3, 0, 4);
        assert!(matches!(
            place(&mut col, 1.5, Injection::centered(5), &mut rng),
            Err(ColumnError::InvalidConfig { field: "catalyst_share", .. })
        ));
        assert!(matches!(
            place(&mut col, f64::NAN, Injection::centered(5), &mut rng),
            Err(ColumnError::InvalidConfig { field: "catalyst_share", .. })
        ));
        assert!(matches!(
            place(&mut col, 0.5, Injection::new(5, 0), &mut rng),
            Err(ColumnError::InvalidConfig { field: "injection", .. })
        ));
    }

    #[test]
    fn achieved_share_tracks_target() {
        let (mut col, mut rng) = built(21, 40, 0, 17);
        let report = place(&mut col, 0.2, Injection::centered(21), &mut rng).unwrap();
        let share = report.placed as f64 / report.free_cells as f64;
        assert!((share - 0.2).abs() < 0.02, "placed share {share}");
    }
}
