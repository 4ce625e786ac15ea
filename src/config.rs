use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::Error;
use crate::bounds::Bounds;
use crate::field::DebugMode;
use crate::partition::Cuts;

/// Everything one run needs. Missing JSON fields take the defaults below.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Global box; z is the exponent range, not a spatial extent.
    pub bounds: Bounds,
    /// Voxels per subdomain along x, y, z.
    pub resolution: [usize; 3],
    pub cuts: Cuts,
    /// Iteration budget per voxel.
    pub nsteps: usize,
    /// Overrides the rank handed to the driver.
    pub rank: Option<usize>,
    /// Overrides the process count handed to the driver.
    pub nprocs: Option<usize>,
    pub enable_redistribution: bool,
    /// Dump rendered for the first field on rank 0, at debug level.
    pub debug_dump: Option<DebugMode>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            bounds: Bounds::default(),
            resolution: [16, 16, 16],
            cuts: Cuts::default(),
            nsteps: 16,
            rank: None,
            nprocs: None,
            enable_redistribution: false,
            debug_dump: Some(DebugMode::StepCount),
        }
    }
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path).with_context(|| format!("Failed to read run config: {}", path.display()))?;
        let config: RunConfig = serde_json::from_slice(&data).context("Failed to decode run config JSON")?;
        config
            .validate()
            .with_context(|| format!("Invalid run config: {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_vec_pretty(self).context("Failed to encode run config JSON")?;
        fs::write(path, data).with_context(|| format!("Failed to write run config: {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: RunConfig = serde_json::from_str(json).context("Failed to decode run config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no rank could run with.
    pub fn validate(&self) -> crate::Result<()> {
        if self.resolution.contains(&0) {
            return Err(Error::InvalidConfig(format!(
                "resolution must be non-zero on every axis, got {:?}",
                self.resolution
            )));
        }
        if self.cuts.as_array().contains(&0) {
            return Err(Error::InvalidConfig(format!(
                "cuts must be non-zero on every axis, got {:?}",
                self.cuts.as_array()
            )));
        }
        if self.nprocs == Some(0) {
            return Err(Error::NoProcesses);
        }
        if let (Some(rank), Some(nprocs)) = (self.rank, self.nprocs)
            && rank >= nprocs
        {
            return Err(Error::RankOutOfRange { rank, nprocs });
        }
        self.bounds.ensure_nondegenerate()
    }

    /// Voxels in one subdomain.
    pub fn voxels_per_subdomain(&self) -> usize {
        self.resolution.iter().product()
    }
}
