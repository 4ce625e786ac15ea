pub mod bounds;
pub mod config;
pub mod driver;
pub mod export;
pub mod field;
pub mod mesh;
pub mod parallel_iter;
pub mod partition;
pub mod weld;

pub use bounds::{Axis, Bounds};
pub use config::RunConfig;
pub use driver::{PassThrough, RankContext, RankOutput, Redistributor, RunStats, run_rank, simulate_ranks};
pub use export::UnstructuredVolume;
pub use field::{DebugMode, EscapeTimeField};
pub use mesh::{CellScalars, CellType, HexMesh, NSTEPS_ARRAY};
pub use partition::{Cuts, Partition, Subdomain};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Process count must be at least 1")]
    NoProcesses,
    #[error("Rank {rank} is out of range for {nprocs} processes")]
    RankOutOfRange { rank: usize, nprocs: usize },
    #[error("Degenerate bounds on {axis} axis: {lo} >= {hi}")]
    DegenerateBounds { axis: Axis, lo: f32, hi: f32 },
    #[error("Point index overflow: {0} points do not fit a u32 index")]
    IndexOverflow(usize),
    #[error("No cell array named {0}")]
    UnknownScalars(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Redistribution failed: {0}")]
    Redistribution(String),
}

pub type Result<T> = std::result::Result<T, Error>;
