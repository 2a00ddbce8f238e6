//! Packed-column tracer residence-time simulation.
//!
//! A cylindrical column is discretised into a D×D×H lattice. Catalyst grains
//! occupy some of the free cells; liquid injected at the top is distributed
//! downwards level by level; tracer particles then random-walk through the
//! wetted network and their transit times form a residence-time sample.
//!
//! The pipeline is build → place → propagate → sample:
//!
//! ```
//! use column::{build_column, place_catalyst, propagate_flow, sample_transit_times};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(7);
//! let column = build_column(9, 20, 2.0, 1, &mut rng).unwrap();
//! let column = place_catalyst(column, 0.0, 4, 4, &mut rng).unwrap();
//! let column = propagate_flow(column, 50.0).unwrap();
//! let injection = column.injection();
//! let times = sample_transit_times(&column, injection, 0.5, 1.0, 100, 42).unwrap();
//! assert_eq!(times.len(), 100);
//! ```

#![forbid(unsafe_code)]

pub mod catalyst;
pub mod config;
pub mod error;
pub mod flow;
pub mod grid;
pub mod replicate;
pub mod sampling;
pub mod tracer;
pub mod ways;

pub use catalyst::PlacementReport;
pub use config::ColumnConfig;
pub use error::{ColumnError, Result};
pub use flow::{FlowReport, Tier};
pub use grid::{Cell, CellIndex, CellRecord, Column, Injection, Stage};
pub use replicate::{run_replicate, Replicate, ReplicateFailure, SampleTag};
pub use sampling::SamplingOptions;
pub use tracer::WalkParams;
pub use ways::LockedWays;

use rand::Rng;

/// Build an empty column with random connectivity drawn from `rng`.
pub fn build_column<R: Rng + ?Sized>(
    diameter: usize,
    height: usize,
    cell_length: f64,
    lock_count: usize,
    rng: &mut R,
) -> Result<Column> {
    Column::new(diameter, height, cell_length, lock_count, rng)
}

/// Fill `column` with catalyst around an injection at `(injection_x, injection_y)`.
///
/// Any previous placement and flow are discarded; connectivity is reused.
pub fn place_catalyst<R: Rng + ?Sized>(
    mut column: Column,
    catalyst_share: f64,
    injection_x: usize,
    injection_y: usize,
    rng: &mut R,
) -> Result<Column> {
    catalyst::place(
        &mut column,
        catalyst_share,
        Injection::new(injection_x, injection_y),
        rng,
    )?;
    Ok(column)
}

/// Distribute the injected liquid for the given irrigation.
pub fn propagate_flow(mut column: Column, irrigation: f64) -> Result<Column> {
    flow::propagate(&mut column, irrigation)?;
    Ok(column)
}

/// Sample `sample_count` transit times on rayon's global pool.
pub fn sample_transit_times(
    column: &Column,
    injection: Injection,
    leave_probability: f64,
    retention_scale: f64,
    sample_count: usize,
    seed: u64,
) -> Result<Vec<f64>> {
    let params = WalkParams {
        leave_probability,
        retention_scale,
    };
    sampling::sample(
        column,
        injection,
        &params,
        sample_count,
        seed,
        SamplingOptions::default(),
    )
}
