use crate::config::RunConfig;
use crate::mesh::HexMesh;
use crate::{Error, Result};

/// Which rank this process is, out of how many.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RankContext {
    rank: usize,
    nprocs: usize,
}

impl RankContext {
    pub fn new(rank: usize, nprocs: usize) -> Result<Self> {
        if nprocs == 0 {
            return Err(Error::NoProcesses);
        }
        if rank >= nprocs {
            return Err(Error::RankOutOfRange { rank, nprocs });
        }
        Ok(Self { rank, nprocs })
    }

    /// Rank 0 of a one-process group.
    pub fn single() -> Self {
        Self { rank: 0, nprocs: 1 }
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn nprocs(&self) -> usize {
        self.nprocs
    }

    pub fn is_root(&self) -> bool {
        self.rank == 0
    }

    /// Apply `config.rank` / `config.nprocs` where set.
    pub fn with_overrides(self, config: &RunConfig) -> Result<Self> {
        Self::new(
            config.rank.unwrap_or(self.rank),
            config.nprocs.unwrap_or(self.nprocs),
        )
    }
}

/// Counts and per-stage timing for one rank (or a sum over ranks).
#[derive(Clone, Debug, Default)]
pub struct RunStats {
    pub total_time_secs: f64,

    /// Field construction and stepping
    pub step_time_secs: f64,
    pub subdomains: usize,
    pub voxels: usize,
    pub escaped: usize,
    pub non_finite: usize,

    /// Mesh emission
    pub emit_time_secs: f64,
    pub points: usize,
    pub cells: usize,

    /// Hand-off to the redistributor, zero when disabled
    pub redistribute_time_secs: f64,
}

impl RunStats {
    /// Add another rank's numbers into this one.
    pub fn accumulate(&mut self, other: &RunStats) {
        self.total_time_secs += other.total_time_secs;
        self.step_time_secs += other.step_time_secs;
        self.subdomains += other.subdomains;
        self.voxels += other.voxels;
        self.escaped += other.escaped;
        self.non_finite += other.non_finite;
        self.emit_time_secs += other.emit_time_secs;
        self.points += other.points;
        self.cells += other.cells;
        self.redistribute_time_secs += other.redistribute_time_secs;
    }

    pub fn sum<'a>(stats: impl IntoIterator<Item = &'a RunStats>) -> RunStats {
        let mut total = RunStats::default();
        for s in stats {
            total.accumulate(s);
        }
        total
    }

    /// Print a human-readable report to stdout
    pub fn print_report(&self) {
        let pct = |t: f64| {
            if self.total_time_secs > 0.0 {
                t / self.total_time_secs * 100.0
            } else {
                0.0
            }
        };
        println!("Total time: {:.2}ms", self.total_time_secs * 1000.0);
        println!(
            "Stepping: {:.2}ms ({:.1}%)",
            self.step_time_secs * 1000.0,
            pct(self.step_time_secs)
        );
        println!("  Subdomains: {}", self.subdomains);
        println!("  Voxels: {}", self.voxels);
        println!("  Escaped: {}", self.escaped);
        println!("  Non-finite: {}", self.non_finite);
        println!(
            "Emission: {:.2}ms ({:.1}%)",
            self.emit_time_secs * 1000.0,
            pct(self.emit_time_secs)
        );
        println!("  Points: {}", self.points);
        println!("  Cells: {}", self.cells);
        if self.redistribute_time_secs > 0.0 {
            println!(
                "Redistribution: {:.2}ms ({:.1}%)",
                self.redistribute_time_secs * 1000.0,
                pct(self.redistribute_time_secs)
            );
        }
    }
}

/// What a rank hands back: its mesh and how it got there.
#[derive(Clone, Debug)]
pub struct RankOutput {
    pub context: RankContext,
    pub mesh: HexMesh,
    pub stats: RunStats,
}
