//! Lateral connectivity: offset tables and per-cell locked-way masks.
//!
//! A cell's locked ways are the lateral directions through which it can NOT
//! be entered. They are drawn once when the column is built and never change.

use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The eight lateral offsets, in bit order of [`LockedWays`].
pub const LATERAL_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Straight down only.
pub const STRAIGHT_OFFSETS: [(i32, i32); 1] = [(0, 0)];

/// Straight down plus the eight diagonals/sides.
pub const DESCENT_OFFSETS: [(i32, i32); 9] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 0),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Number of lockable directions.
pub const MAX_LOCKED_WAYS: usize = LATERAL_OFFSETS.len();

/// Bitmask over [`LATERAL_OFFSETS`]. Bit `i` set means offset `i` is locked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockedWays(u8);

impl LockedWays {
    /// No direction locked.
    pub const NONE: LockedWays = LockedWays(0);

    /// Build from a raw mask.
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw mask.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Draw `count` distinct directions uniformly without replacement.
    ///
    /// `count` is clamped to [`MAX_LOCKED_WAYS`]; callers validate it first.
    pub fn random<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Self {
        let count = count.min(MAX_LOCKED_WAYS);
        if count == 0 {
            return Self::NONE;
        }
        let mut bits = 0u8;
        for i in index::sample(rng, MAX_LOCKED_WAYS, count) {
            bits |= 1 << i;
        }
        Self(bits)
    }

    /// Whether entering through lateral offset `(dx, dy)` is forbidden.
    ///
    /// The straight-down offset `(0, 0)` is never locked.
    #[inline]
    pub fn contains(self, dx: i32, dy: i32) -> bool {
        match offset_bit(dx, dy) {
            Some(bit) => self.0 & (1 << bit) != 0,
            None => false,
        }
    }

    /// Number of locked directions.
    #[inline]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Locked offsets in table order.
    pub fn offsets(self) -> impl Iterator<Item = (i32, i32)> {
        LATERAL_OFFSETS
            .into_iter()
            .enumerate()
            .filter(move |&(i, _)| self.0 & (1 << i) != 0)
            .map(|(_, offset)| offset)
    }
}

#[inline]
fn offset_bit(dx: i32, dy: i32) -> Option<usize> {
    LATERAL_OFFSETS.iter().position(|&o| o == (dx, dy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn straight_down_is_never_locked() {
        let all = LockedWays::from_bits(0xFF);
        assert_eq!(all.len(), 8);
        assert!(!all.contains(0, 0));
        for (dx, dy) in LATERAL_OFFSETS {
            assert!(all.contains(dx, dy));
        }
    }

    #[test]
    fn random_draws_exact_count_of_distinct_ways() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for count in 0..=MAX_LOCKED_WAYS {
            for _ in 0..50 {
                let ways = LockedWays::random(count, &mut rng);
                assert_eq!(ways.len(), count);
                assert_eq!(ways.offsets().count(), count);
            }
        }
    }

    #[test]
    fn zero_count_blocks_nothing() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let ways = LockedWays::random(0, &mut rng);
        assert!(ways.is_empty());
        assert!(DESCENT_OFFSETS.iter().all(|&(dx, dy)| !ways.contains(dx, dy)));
    }

    #[test]
    fn every_direction_gets_locked_eventually() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let mut seen = 0u8;
        for _ in 0..200 {
            seen |= LockedWays::random(1, &mut rng).bits();
        }
        assert_eq!(seen, 0xFF);
    }
}
