//! Single Replicate
//!
//! Runs one replicate of a column configuration and prints a summary of the
//! residence-time sample. With no argument the built-in defaults are used.
//!
//! Run with: cargo run --release --example single_replicate -- [config.json] [try]

use std::path::Path;
use std::time::Instant;

use column::{run_replicate, ColumnConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => ColumnConfig::load(Path::new(&path))?,
        None => ColumnConfig::default(),
    };
    let try_index: usize = match args.next() {
        Some(arg) => arg.parse()?,
        None => 0,
    };

    println!("=== Column replicate {try_index} ===");
    println!(
        "D={} H={} L={} locks={} share={} irrigation={}",
        config.diameter,
        config.height,
        config.cell_length,
        config.lock_count,
        config.catalyst_share,
        config.irrigation
    );

    let start = Instant::now();
    let rep = run_replicate(&config, try_index)?;
    let elapsed = start.elapsed();

    let n = rep.samples.len() as f64;
    let mean = rep.samples.iter().sum::<f64>() / n;
    let var = rep.samples.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / n;
    let min = rep.samples.iter().copied().fold(f64::INFINITY, f64::min);
    let max = rep.samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    println!(
        "catalyst: {} of {} free cells ({:.3}), {} plugs repaired",
        rep.placement.catalyst_cells,
        rep.placement.free_cells,
        rep.placement.achieved_share(),
        rep.placement.repaired
    );
    println!(
        "flow: {} wet cells, {} dead ends, lost volume {:.6}",
        rep.flow.wet_cells,
        rep.flow.dead_ends.len(),
        rep.flow.lost_volume
    );
    println!(
        "samples: n={} mean={:.4} sd={:.4} min={:.4} max={:.4}",
        rep.samples.len(),
        mean,
        var.sqrt(),
        min,
        max
    );
    println!("attempts: {}, elapsed: {:.2?}", rep.tag.attempts, elapsed);
    println!("tag: {}", serde_json::to_string(&rep.tag)?);

    Ok(())
}
