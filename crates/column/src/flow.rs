//! Top-down liquid distribution.
//!
//! The injection cell starts with volume 1. Each wet, catalyst-free cell hands
//! its volume to the level below, split evenly over the first non-empty
//! candidate set produced by an ordered list of [`Tier`]s:
//!
//! | cell volume      | tiers tried in order                                  |
//! |------------------|-------------------------------------------------------|
//! | `v < 1/τ`        | straight down, toward the injection axis, any way down |
//! | `v >= 1/τ`       | any way down                                          |
//!
//! where τ is the irrigation. When no tier yields a candidate the volume is
//! lost at that cell; this is counted in the [`FlowReport`], not raised.
//! Propagation uses no randomness.

use serde::{Deserialize, Serialize};

use crate::error::{ColumnError, Result};
use crate::grid::{Cell, CellIndex, Column, Injection, Stage};
use crate::ways::{DESCENT_OFFSETS, STRAIGHT_OFFSETS};

/// One candidate-generating strategy for handing volume downwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tier {
    /// Only the cell directly below.
    StraightDown,
    /// Any cell below that is no farther from the injection axis on either
    /// horizontal axis.
    TowardInjection,
    /// Any cell below.
    AnyDirection,
}

/// Tiers for cells carrying less than the irrigation threshold.
pub const LOW_VOLUME_TIERS: [Tier; 3] = [Tier::StraightDown, Tier::TowardInjection, Tier::AnyDirection];

/// Tiers for cells at or above the irrigation threshold.
pub const HIGH_VOLUME_TIERS: [Tier; 1] = [Tier::AnyDirection];

fn accepts_liquid(cell: &Cell) -> bool {
    !cell.catalyst
}

impl Tier {
    /// Fill `out` with this tier's candidates for `from`.
    pub fn candidates(
        self,
        column: &Column,
        from: CellIndex,
        injection: Injection,
        out: &mut Vec<CellIndex>,
    ) {
        match self {
            Tier::StraightDown => {
                column.collect_neighbors(from, 1, &STRAIGHT_OFFSETS, accepts_liquid, out)
            }
            Tier::AnyDirection => {
                column.collect_neighbors(from, 1, &DESCENT_OFFSETS, accepts_liquid, out)
            }
            Tier::TowardInjection => {
                column.collect_neighbors(from, 1, &DESCENT_OFFSETS, accepts_liquid, out);
                let reach_x = from.x.abs_diff(injection.x);
                let reach_y = from.y.abs_diff(injection.y);
                out.retain(|c| {
                    c.x.abs_diff(injection.x) <= reach_x && c.y.abs_diff(injection.y) <= reach_y
                });
            }
        }
    }
}

/// Tiers applicable to a cell holding `volume` under `irrigation`.
pub fn tiers_for(volume: f64, irrigation: f64) -> &'static [Tier] {
    if volume < 1.0 / irrigation {
        &LOW_VOLUME_TIERS
    } else {
        &HIGH_VOLUME_TIERS
    }
}

/// Diagnostics of one propagation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowReport {
    /// Irrigation the flow was computed for.
    pub irrigation: f64,
    /// Cells whose volume could not be handed down.
    pub dead_ends: Vec<CellIndex>,
    /// Total volume lost at dead ends.
    pub lost_volume: f64,
    /// Sum of volume per level, top to bottom.
    pub level_sums: Vec<f64>,
    /// Cells left carrying liquid.
    pub wet_cells: usize,
}

/// Compute volumes level by level and derive the wet map.
///
/// Any previous volumes are discarded, so one placement may be propagated for
/// several irrigation values.
pub fn propagate(column: &mut Column, irrigation: f64) -> Result<FlowReport> {
    if !(irrigation > 0.0) {
        return Err(ColumnError::invalid(
            "irrigation",
            format!("must be positive, got {irrigation}"),
        ));
    }
    let injection = column.injection();
    if !column.cell(injection.cell()).free {
        return Err(ColumnError::InjectionNotFree {
            x: injection.x,
            y: injection.y,
        });
    }

    for cell in column.cells.iter_mut() {
        cell.volume = 0.0;
        cell.wet = false;
    }
    column.cell_mut(injection.cell()).volume = 1.0;

    let mut report = FlowReport {
        irrigation,
        ..FlowReport::default()
    };
    let mut targets = Vec::with_capacity(DESCENT_OFFSETS.len());

    for z in 0..column.height().saturating_sub(1) {
        for at in column.level(z) {
            let cell = *column.cell(at);
            if !cell.free || cell.catalyst || cell.volume <= 0.0 {
                continue;
            }

            let mut handed_down = false;
            for &tier in tiers_for(cell.volume, irrigation) {
                tier.candidates(column, at, injection, &mut targets);
                if targets.is_empty() {
                    continue;
                }
                let share = cell.volume / targets.len() as f64;
                for &target in &targets {
                    column.cell_mut(target).volume += share;
                }
                handed_down = true;
                break;
            }

            if !handed_down {
                log::debug!(
                    "cell ({}, {}, {}) has no way down; dropping volume {:.6}",
                    at.x,
                    at.y,
                    at.z,
                    cell.volume
                );
                report.dead_ends.push(at);
                report.lost_volume += cell.volume;
            }
        }
    }

    for cell in column.cells.iter_mut() {
        cell.wet = cell.volume > 0.0;
    }
    report.wet_cells = column.cells.iter().filter(|c| c.wet).count();
    report.level_sums = column.level_volume_sums();

    if !report.dead_ends.is_empty() {
        log::warn!(
            "flow lost {:.6} of the injected volume at {} dead-end cells (irrigation {irrigation})",
            report.lost_volume,
            report.dead_ends.len(),
        );
    }

    column.stage = Stage::Propagated;
    column.flow = Some(report.clone());
    Ok(report)
}
