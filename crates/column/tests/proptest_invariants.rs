//! Property-based tests for column construction, placement and flow
//!
//! These verify structural invariants across random geometries and seeds:
//! - Free cells are exactly those inside the inscribed circle
//! - Every free cell locks exactly `lock_count` lateral ways
//! - The injection cell never holds catalyst and no plug survives repair
//! - Catalyst-free, unlocked columns conserve volume level by level

use column::catalyst::{self, find_plugs};
use column::{flow, Column, Injection, LockedWays};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const MAX_DIAMETER: usize = 21;
const MAX_HEIGHT: usize = 12;

/// Free-cell rule in half-cell units: offset `2x + 1 - D` from the axis,
/// radius `D`. Exact in integers, independent of the cell length.
fn inside_circle(x: usize, y: usize, diameter: usize) -> bool {
    let d = diameter as i64;
    let dx = 2 * x as i64 + 1 - d;
    let dy = 2 * y as i64 + 1 - d;
    dx * dx + dy * dy <= d * d
}

fn build(diameter: usize, height: usize, locks: usize, seed: u64) -> (Column, ChaCha8Rng) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let column = Column::new(diameter, height, 2.0, locks, &mut rng).unwrap();
    (column, rng)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Property: the free mask matches the inscribed circle for any cell length
    #[test]
    fn free_cells_match_inscribed_circle(
        diameter in 1..MAX_DIAMETER,
        cell_length in 0.1f64..8.0,
        seed in any::<u64>(),
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let column = Column::new(diameter, 2, cell_length, 0, &mut rng).unwrap();
        for z in 0..2 {
            for at in column.level(z) {
                prop_assert_eq!(
                    column.cell(at).free,
                    inside_circle(at.x, at.y, diameter),
                    "cell {:?} of a {}-wide column", at, diameter
                );
            }
        }
    }

    /// Property: each free cell locks exactly `lock_count` distinct lateral ways
    #[test]
    fn free_cells_lock_exact_way_count(
        diameter in 1..MAX_DIAMETER,
        height in 1..MAX_HEIGHT,
        locks in 0usize..=8,
        seed in any::<u64>(),
    ) {
        let (column, _) = build(diameter, height, locks, seed);
        for cell in column.cells() {
            if cell.free {
                prop_assert_eq!(cell.locked.len(), locks);
                prop_assert!(!cell.locked.contains(0, 0));
            } else {
                prop_assert_eq!(cell.locked, LockedWays::NONE);
            }
        }
    }

    /// Property: placement never plugs the injection cell and leaves no plugs
    #[test]
    fn placement_leaves_no_plugs(
        diameter in 3..MAX_DIAMETER,
        height in 1..MAX_HEIGHT,
        locks in 0usize..=8,
        share in 0.0f64..=1.0,
        seed in any::<u64>(),
    ) {
        let (mut column, mut rng) = build(diameter, height, locks, seed);
        let injection = Injection::centered(diameter);
        let report = catalyst::place(&mut column, share, injection, &mut rng).unwrap();

        prop_assert!(!column.cell(injection.cell()).catalyst);
        prop_assert!(find_plugs(&column).is_empty());
        prop_assert_eq!(
            report.catalyst_cells,
            column.cells().iter().filter(|c| c.catalyst).count()
        );
        prop_assert!(column.cells().iter().all(|c| c.free || !c.catalyst));
    }

    /// Property: without catalyst or locks every level carries the full volume
    #[test]
    fn open_column_conserves_volume(
        diameter in 1..MAX_DIAMETER,
        height in 1..MAX_HEIGHT,
        irrigation in 0.01f64..1000.0,
        seed in any::<u64>(),
    ) {
        let (mut column, mut rng) = build(diameter, height, 0, seed);
        catalyst::place(&mut column, 0.0, Injection::centered(diameter), &mut rng).unwrap();
        let report = flow::propagate(&mut column, irrigation).unwrap();

        prop_assert!(report.dead_ends.is_empty());
        for (z, sum) in report.level_sums.iter().enumerate() {
            prop_assert!((sum - 1.0).abs() < 1e-12, "level {} sums to {}", z, sum);
        }
    }

    /// Property: wet cells are exactly the free, catalyst-free cells with volume
    #[test]
    fn wet_map_matches_volumes(
        diameter in 3..MAX_DIAMETER,
        height in 1..MAX_HEIGHT,
        locks in 0usize..=8,
        share in 0.0f64..0.6,
        irrigation in 0.01f64..1000.0,
        seed in any::<u64>(),
    ) {
        let (mut column, mut rng) = build(diameter, height, locks, seed);
        catalyst::place(&mut column, share, Injection::centered(diameter), &mut rng).unwrap();
        let report = flow::propagate(&mut column, irrigation).unwrap();

        for cell in column.cells() {
            prop_assert!(cell.volume >= 0.0 && cell.volume <= 1.0 + 1e-12);
            prop_assert_eq!(cell.wet, cell.volume > 0.0);
            if cell.wet {
                prop_assert!(cell.free && !cell.catalyst);
            }
        }
        let total_last = report.level_sums.last().copied().unwrap_or(0.0);
        prop_assert!((total_last + report.lost_volume - 1.0).abs() < 1e-9);
    }
}
