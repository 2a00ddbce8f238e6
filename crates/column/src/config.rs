//! Parameters of one column configuration, loadable from JSON.
//!
//! Missing fields fall back to [`ColumnConfig::default`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ColumnError, Result};
use crate::tracer::WalkParams;
use crate::ways::MAX_LOCKED_WAYS;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    /// Cells across the cross-section.
    pub diameter: usize,
    /// Levels from injection to outlet.
    pub height: usize,
    /// Physical cell edge (e.g. mm).
    pub cell_length: f64,
    /// Locked ways per free cell (0..=8).
    pub lock_count: usize,
    /// Probability that a free cell holds catalyst.
    pub catalyst_share: f64,
    /// Irrigation τ; cells below volume 1/τ prefer to drain straight down.
    pub irrigation: f64,
    /// Per-trial probability of a tracer leaving its cell.
    pub leave_probability: f64,
    /// Hold-up per failed leave trial.
    pub retention_scale: f64,
    /// Tracers per batch.
    pub sample_size: usize,
    /// Base seed for connectivity, placement and walks.
    pub seed: u64,
    /// Placements tried before a replicate gives up on dead ends.
    pub max_attempts: usize,
    /// Sampling threads; `None` uses every core.
    pub threads: Option<usize>,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            diameter: 13,
            height: 75,
            cell_length: 2.0,
            lock_count: 0,
            catalyst_share: 0.2,
            irrigation: 50.0,
            leave_probability: 0.5,
            retention_scale: 1.0,
            sample_size: 1000,
            seed: 0,
            max_attempts: 3,
            threads: None,
        }
    }
}

impl ColumnConfig {
    pub fn from_json_str(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read a JSON file. Unlike the simulation errors this is an I/O concern,
    /// so the error is boxed.
    pub fn load(path: &Path) -> std::result::Result<Self, Box<dyn std::error::Error>> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_json_str(&json)?)
    }

    pub fn walk_params(&self) -> WalkParams {
        WalkParams {
            leave_probability: self.leave_probability,
            retention_scale: self.retention_scale,
        }
    }

    /// Reject the configuration before any simulation work is done.
    pub fn validate(&self) -> Result<()> {
        if self.diameter == 0 {
            return Err(ColumnError::invalid("diameter", "must be positive, got 0"));
        }
        if self.height == 0 {
            return Err(ColumnError::invalid("height", "must be positive, got 0"));
        }
        if !(self.cell_length.is_finite() && self.cell_length > 0.0) {
            return Err(ColumnError::invalid(
                "cell_length",
                format!("must be positive and finite, got {}", self.cell_length),
            ));
        }
        if self.lock_count > MAX_LOCKED_WAYS {
            return Err(ColumnError::invalid(
                "lock_count",
                format!("must be at most {MAX_LOCKED_WAYS}, got {}", self.lock_count),
            ));
        }
        if !(0.0..=1.0).contains(&self.catalyst_share) {
            return Err(ColumnError::invalid(
                "catalyst_share",
                format!("must lie in [0, 1], got {}", self.catalyst_share),
            ));
        }
        if !(self.irrigation > 0.0) {
            return Err(ColumnError::invalid(
                "irrigation",
                format!("must be positive, got {}", self.irrigation),
            ));
        }
        self.walk_params().validate()?;
        if self.sample_size == 0 {
            return Err(ColumnError::invalid("sample_size", "must be at least 1"));
        }
        if self.max_attempts == 0 {
            return Err(ColumnError::invalid("max_attempts", "must be at least 1"));
        }
        Ok(())
    }
}
