//! Parallel tracer sampling.
//!
//! Walks share the propagated column read-only. Walk `i` draws from its own
//! `ChaCha8Rng` seeded with the batch seed on stream `i`, so a batch yields
//! the same samples whatever the thread count or scheduling order.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::error::{ColumnError, Result};
use crate::grid::{Column, Injection, Stage};
use crate::tracer::{self, WalkParams};
use crate::ways::DESCENT_OFFSETS;

/// Execution options for a sampling batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SamplingOptions {
    /// Worker threads; `None` uses rayon's global pool sized to the machine.
    pub threads: Option<usize>,
}

/// Random stream of walk `index` in a batch seeded with `seed`.
pub fn walk_rng(seed: u64, index: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(index);
    rng
}

/// Run `sample_count` independent walks and return their transit times.
///
/// The first failing walk aborts the batch and its error is returned.
pub fn sample(
    column: &Column,
    injection: Injection,
    params: &WalkParams,
    sample_count: usize,
    seed: u64,
    options: SamplingOptions,
) -> Result<Vec<f64>> {
    params.validate()?;
    if sample_count == 0 {
        return Err(ColumnError::invalid("sample_count", "must be at least 1"));
    }
    if column.stage() != Stage::Propagated {
        return Err(ColumnError::NotPropagated);
    }
    if !column.contains(injection.cell()) || !column.cell(injection.cell()).free {
        return Err(ColumnError::InjectionNotFree {
            x: injection.x,
            y: injection.y,
        });
    }

    let run = || -> Result<Vec<f64>> {
        (0..sample_count)
            .into_par_iter()
            .map_init(
                || Vec::with_capacity(DESCENT_OFFSETS.len()),
                |buf, i| {
                    let mut rng = walk_rng(seed, i as u64);
                    tracer::walk(column, injection, params, &mut rng, buf)
                },
            )
            .collect()
    };

    let samples = match options.threads {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| ColumnError::invalid("threads", e.to_string()))?;
            pool.install(run)?
        }
        None => run()?,
    };

    log::info!(
        "sampled {} tracers (p = {}, retention = {}, seed = {seed})",
        samples.len(),
        params.leave_probability,
        params.retention_scale,
    );
    Ok(samples)
}
