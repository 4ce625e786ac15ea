use anyhow::{Context, Result};
use std::path::PathBuf;

use fractal_mesh::{RankOutput, RunConfig, RunStats, UnstructuredVolume, simulate_ranks};

/// Ranks simulated when the config does not say.
const DEFAULT_RANKS: usize = 4;

fn print_stats_summary(config: &RunConfig, nprocs: usize, outputs: &[RankOutput]) {
    let total = RunStats::sum(outputs.iter().map(|o| &o.stats));

    println!();
    println!("=== Field Statistics ===");
    println!(
        "Cuts:            {} x {} x {}",
        config.cuts.x, config.cuts.y, config.cuts.z
    );
    println!(
        "Resolution:      {} x {} x {}",
        config.resolution[0], config.resolution[1], config.resolution[2]
    );
    println!("Budget:          {} steps", config.nsteps);
    println!("Ranks:           {}", nprocs);
    println!();
    for out in outputs {
        let volume = UnstructuredVolume::from_mesh(&out.mesh);
        let range = volume
            .value_range
            .map(|(lo, hi)| format!("[{lo}, {hi}]"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "Rank {:>3}: {:>4} subdomains, {:>9} cells, {:>9} escaped, nsteps {}  ({:.2}ms)",
            out.context.rank(),
            out.stats.subdomains,
            out.stats.cells,
            out.stats.escaped,
            range,
            out.stats.total_time_secs * 1000.0
        );
    }
    println!();
    total.print_report();
    println!("========================");
}

fn main() -> Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => RunConfig::load(&path)?,
        None => RunConfig::default(),
    };
    let nprocs = config.nprocs.unwrap_or(DEFAULT_RANKS);

    log::info!(
        "simulating {} ranks over {} subdomains",
        nprocs,
        config.cuts.total()
    );
    let outputs = simulate_ranks(&config, nprocs).context("Simulation failed")?;

    print_stats_summary(&config, nprocs, &outputs);
    Ok(())
}
