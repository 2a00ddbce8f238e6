//! Single-tracer random walk through the wet network.
//!
//! A tracer enters at the injection cell and visits one cell per level. In
//! each visited cell it spends `1 / volume` time units, plus
//! `retention_scale / volume` for every failed leave trial (Bernoulli with the
//! leave probability) before the first success. It then drops to a uniformly
//! chosen wet cell on the next level.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ColumnError, Result};
use crate::grid::{Cell, CellIndex, Column, Injection};
use crate::ways::DESCENT_OFFSETS;

/// Retention model shared by every walk of a batch.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WalkParams {
    /// Probability of leaving a cell on each trial, in `(0, 1]`.
    pub leave_probability: f64,
    /// Hold-up added per failed trial, scaled by `1 / volume`.
    pub retention_scale: f64,
}

impl WalkParams {
    pub fn new(leave_probability: f64, retention_scale: f64) -> Result<Self> {
        let params = Self {
            leave_probability,
            retention_scale,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.leave_probability > 0.0 && self.leave_probability <= 1.0) {
            return Err(ColumnError::invalid(
                "leave_probability",
                format!("must lie in (0, 1], got {}", self.leave_probability),
            ));
        }
        if !(self.retention_scale.is_finite() && self.retention_scale >= 0.0) {
            return Err(ColumnError::invalid(
                "retention_scale",
                format!("must be finite and non-negative, got {}", self.retention_scale),
            ));
        }
        Ok(())
    }
}

fn is_wet(cell: &Cell) -> bool {
    cell.wet
}

/// Walk one tracer from the injection cell to the bottom level.
///
/// `buf` is scratch space for candidate cells, reused across walks. Expects a
/// propagated column and validated `params`.
pub fn walk<R: Rng + ?Sized>(
    column: &Column,
    injection: Injection,
    params: &WalkParams,
    rng: &mut R,
    buf: &mut Vec<CellIndex>,
) -> Result<f64> {
    let mut current = injection.cell();
    if !column.contains(current) || !column.cell(current).wet {
        return Err(no_descent(current));
    }

    let height = column.height();
    let mut time = 0.0;

    for z in 0..height {
        let next = if z + 1 < height {
            column.collect_neighbors(current, 1, &DESCENT_OFFSETS, is_wet, buf);
            if buf.is_empty() {
                return Err(no_descent(current));
            }
            Some(buf[rng.gen_range(0..buf.len())])
        } else {
            None
        };

        let volume = column.cell(current).volume;
        time += 1.0 / volume;
        while !rng.gen_bool(params.leave_probability) {
            time += params.retention_scale / volume;
        }

        if let Some(next) = next {
            current = next;
        }
    }

    Ok(time)
}

fn no_descent(at: CellIndex) -> ColumnError {
    ColumnError::NoDescentPath {
        x: at.x,
        y: at.y,
        z: at.z,
    }
}
