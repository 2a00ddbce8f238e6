//! One replicate ("try") of a configuration: build, place, propagate, sample.
//!
//! Every random stream is derived from `config.seed`, the try index and the
//! attempt number, so any replicate (and any failure) can be reproduced from
//! its [`SampleTag`] alone. When a placement leaves a tracer without a way
//! down, the replicate retries with a fresh placement on the same column.

use std::fmt;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalyst::{self, PlacementReport};
use crate::config::ColumnConfig;
use crate::error::ColumnError;
use crate::flow::{self, FlowReport};
use crate::grid::{Column, Injection};
use crate::sampling::{self, SamplingOptions};

const CONNECTIVITY_STREAM: u64 = 0;

fn placement_stream(try_index: usize, attempt: usize) -> u64 {
    1 + 2 * attempt_key(try_index, attempt)
}

fn sampling_stream(try_index: usize, attempt: usize) -> u64 {
    2 + 2 * attempt_key(try_index, attempt)
}

fn attempt_key(try_index: usize, attempt: usize) -> u64 {
    ((try_index as u64) << 24) | attempt as u64
}

fn stream_rng(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

/// Parameters that produced a replicate's samples.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleTag {
    pub diameter: usize,
    pub height: usize,
    pub cell_length: f64,
    pub lock_count: usize,
    pub catalyst_share: f64,
    pub irrigation: f64,
    pub leave_probability: f64,
    pub retention_scale: f64,
    pub sample_size: usize,
    pub seed: u64,
    pub try_index: usize,
    /// Placements used, including the successful one.
    pub attempts: usize,
}

impl SampleTag {
    pub fn new(config: &ColumnConfig, try_index: usize) -> Self {
        Self {
            diameter: config.diameter,
            height: config.height,
            cell_length: config.cell_length,
            lock_count: config.lock_count,
            catalyst_share: config.catalyst_share,
            irrigation: config.irrigation,
            leave_probability: config.leave_probability,
            retention_scale: config.retention_scale,
            sample_size: config.sample_size,
            seed: config.seed,
            try_index,
            attempts: 0,
        }
    }
}

impl fmt::Display for SampleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "diameter={} height={} cell_length={} lock_count={} catalyst_share={} \
             irrigation={} leave_probability={} retention_scale={} sample_size={} \
             seed={} try={} attempts={}",
            self.diameter,
            self.height,
            self.cell_length,
            self.lock_count,
            self.catalyst_share,
            self.irrigation,
            self.leave_probability,
            self.retention_scale,
            self.sample_size,
            self.seed,
            self.try_index,
            self.attempts,
        )
    }
}

/// A replicate's error together with everything needed to reproduce it.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("replicate failed [{tag}]: {source}")]
pub struct ReplicateFailure {
    pub tag: SampleTag,
    pub source: ColumnError,
}

/// Samples of one replicate plus the column state that produced them.
#[derive(Clone, Debug)]
pub struct Replicate {
    pub tag: SampleTag,
    pub samples: Vec<f64>,
    pub placement: PlacementReport,
    pub flow: FlowReport,
    pub column: Column,
}

/// Run replicate `try_index` of `config`.
pub fn run_replicate(
    config: &ColumnConfig,
    try_index: usize,
) -> Result<Replicate, ReplicateFailure> {
    let mut tag = SampleTag::new(config, try_index);
    let fail = |tag: &SampleTag, source| ReplicateFailure {
        tag: tag.clone(),
        source,
    };

    config.validate().map_err(|e| fail(&tag, e))?;

    let mut rng = stream_rng(config.seed, CONNECTIVITY_STREAM);
    let mut column = Column::new(
        config.diameter,
        config.height,
        config.cell_length,
        config.lock_count,
        &mut rng,
    )
    .map_err(|e| fail(&tag, e))?;

    let injection = Injection::centered(config.diameter);
    let params = config.walk_params();
    let options = SamplingOptions {
        threads: config.threads,
    };

    let mut attempt = 0;
    loop {
        tag.attempts = attempt + 1;

        let mut rng = stream_rng(config.seed, placement_stream(try_index, attempt));
        let placement = catalyst::place(&mut column, config.catalyst_share, injection, &mut rng)
            .map_err(|e| fail(&tag, e))?;
        let flow = flow::propagate(&mut column, config.irrigation).map_err(|e| fail(&tag, e))?;

        let walk_seed = stream_rng(config.seed, sampling_stream(try_index, attempt)).next_u64();
        match sampling::sample(&column, injection, &params, config.sample_size, walk_seed, options) {
            Ok(samples) => {
                log::debug!("replicate done after {} attempt(s): {tag}", tag.attempts);
                return Ok(Replicate {
                    tag,
                    samples,
                    placement,
                    flow,
                    column,
                });
            }
            Err(err @ ColumnError::NoDescentPath { .. }) if attempt + 1 < config.max_attempts => {
                log::warn!("{err}; retrying with a fresh placement ({tag})");
                attempt += 1;
            }
            Err(err) => return Err(fail(&tag, err)),
        }
    }
}
