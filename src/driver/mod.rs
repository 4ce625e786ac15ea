//! Per-rank pipeline: partition, step, emit, hand off.
//!
//! 1. **Partition** - every rank computes the same round-robin assignment and
//!    keeps the subdomains carrying its own rank.
//!
//! 2. **Step** - one [`EscapeTimeField`] per owned subdomain, each advanced by
//!    the configured budget.
//!
//! 3. **Emit** - all owned fields are folded into one [`HexMesh`] whose active
//!    scalars are `"nsteps"`. A rank that owns nothing still returns a valid,
//!    empty mesh.
//!
//! 4. **Hand-off** - when enabled, the mesh goes through a [`Redistributor`],
//!    the seam where an external distributed-data stage plugs in.

use web_time::Instant;

pub mod types;


pub use types::{RankContext, RankOutput, RunStats};

use crate::config::RunConfig;
use crate::field::EscapeTimeField;
use crate::mesh::{HexMesh, NSTEPS_ARRAY};
use crate::parallel_iter::map_range;
use crate::partition::Partition;
use crate::{Error, Result};

/// Receives a rank's finished mesh and returns what that rank should keep.
pub trait Redistributor {
    fn redistribute(&self, context: RankContext, mesh: HexMesh) -> Result<HexMesh>;
}

/// Keeps every mesh where it is.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassThrough;

impl Redistributor for PassThrough {
    fn redistribute(&self, _context: RankContext, mesh: HexMesh) -> Result<HexMesh> {
        Ok(mesh)
    }
}

impl<F> Redistributor for F
where
    F: Fn(RankContext, HexMesh) -> Result<HexMesh>,
{
    fn redistribute(&self, context: RankContext, mesh: HexMesh) -> Result<HexMesh> {
        self(context, mesh)
    }
}

/// Run one rank with the identity hand-off.
pub fn run_rank(config: &RunConfig, context: RankContext) -> Result<RankOutput> {
    run_rank_with(config, context, &PassThrough)
}

pub fn run_rank_with<R>(config: &RunConfig, context: RankContext, redistributor: &R) -> Result<RankOutput>
where
    R: Redistributor + ?Sized,
{
    let total_start = Instant::now();
    config.validate()?;
    let context = context.with_overrides(config)?;
    let partition = Partition::new(config.cuts, context.nprocs())?;
    let [nx, ny, nz] = config.resolution;
    let mut stats = RunStats::default();

    // Step
    let step_start = Instant::now();
    let mut fields = Vec::with_capacity(partition.count_for(context.rank()));
    for sub in partition.owned_by(context.rank()) {
        let bounds = sub.bounds(&config.bounds, config.cuts);
        let mut field = EscapeTimeField::new(nx, ny, nz, bounds)?;
        field.advance(config.nsteps);

        stats.voxels += field.voxel_count();
        stats.escaped += field.escaped_count();
        stats.non_finite += field.non_finite_count();
        fields.push(field);
    }
    stats.subdomains = fields.len();
    stats.step_time_secs = step_start.elapsed().as_secs_f64();

    if stats.non_finite > 0 {
        log::warn!(
            "rank {}: {} of {} voxels hold non-finite values",
            context.rank(),
            stats.non_finite,
            stats.voxels
        );
    }

    if context.is_root()
        && log::log_enabled!(log::Level::Debug)
        && let (Some(mode), Some(first)) = (config.debug_dump, fields.first())
        && let Some(dump) = first.debug_dump(mode)
    {
        log::debug!("rank 0, first subdomain ({mode:?}):\n{dump}");
    }

    // Emit
    let emit_start = Instant::now();
    let mut mesh = HexMesh::new();
    for field in &fields {
        mesh.append_field(field)?;
    }
    mesh.set_active_scalars(NSTEPS_ARRAY)?;
    drop(fields);
    stats.emit_time_secs = emit_start.elapsed().as_secs_f64();

    // Hand-off
    if config.enable_redistribution {
        let start = Instant::now();
        mesh = redistributor.redistribute(context, mesh)?;
        stats.redistribute_time_secs = start.elapsed().as_secs_f64();
    }

    stats.points = mesh.point_count();
    stats.cells = mesh.cell_count();
    stats.total_time_secs = total_start.elapsed().as_secs_f64();

    log::info!(
        "rank {}/{}: {} subdomains, {} cells, {} escaped in {:.2}ms",
        context.rank(),
        context.nprocs(),
        stats.subdomains,
        stats.cells,
        stats.escaped,
        stats.total_time_secs * 1000.0
    );

    Ok(RankOutput {
        context,
        mesh,
        stats,
    })
}

/// Run every rank of an `nprocs` group in this process, ordered by rank.
pub fn simulate_ranks(config: &RunConfig, nprocs: usize) -> Result<Vec<RankOutput>> {
    simulate_ranks_with(config, nprocs, &PassThrough)
}

/// Like [`simulate_ranks`] with a custom hand-off. Rank and process-count
/// overrides in `config` are ignored here.
pub fn simulate_ranks_with<R>(config: &RunConfig, nprocs: usize, redistributor: &R) -> Result<Vec<RankOutput>>
where
    R: Redistributor + Sync + ?Sized,
{
    if nprocs == 0 {
        return Err(Error::NoProcesses);
    }
    let config = RunConfig {
        rank: None,
        nprocs: None,
        ..config.clone()
    };

    map_range(0..nprocs, |rank| {
        RankContext::new(rank, nprocs).and_then(|context| run_rank_with(&config, context, redistributor))
    })
    .into_iter()
    .collect()
}
