//! Axis-aligned bounds and the grid-index → coordinate mapping.
//!
//! Every coordinate in the crate is produced by the same lerp,
//! `min + ratio * (max - min)` with `ratio = index / n` evaluated in `f32`.
//! The field sampler, the mesh emitter and the subdomain splitter all go
//! through this module so that a voxel's corners and its parameter agree
//! bit-for-bit.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// One of the three grid axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
            Axis::Z => write!(f, "z"),
        }
    }
}

/// Fraction of the way `index` sits along an axis split into `n` steps.
///
/// `n == 0` yields NaN, same as the float division would.
#[inline]
pub fn axis_ratio(index: usize, n: usize) -> f32 {
    index as f32 / n as f32
}

/// Standard lerp, `min + ratio * (max - min)`.
#[inline]
pub fn lerp(min: f32, max: f32, ratio: f32) -> f32 {
    min + ratio * (max - min)
}

/// Axis-aligned box stored as min/max corners.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Build from the flat `[minX, minY, minZ, maxX, maxY, maxZ]` layout.
    pub fn from_array(b: [f32; 6]) -> Self {
        Self {
            min: Vec3::new(b[0], b[1], b[2]),
            max: Vec3::new(b[3], b[4], b[5]),
        }
    }

    /// Flatten to `[minX, minY, minZ, maxX, maxY, maxZ]`.
    pub fn to_array(&self) -> [f32; 6] {
        [
            self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z,
        ]
    }

    #[inline]
    pub fn min_on(&self, axis: Axis) -> f32 {
        self.min[axis.index()]
    }

    #[inline]
    pub fn max_on(&self, axis: Axis) -> f32 {
        self.max[axis.index()]
    }

    /// Coordinate of grid line `index` when `axis` is split into `n` steps.
    #[inline]
    pub fn coord(&self, axis: Axis, index: usize, n: usize) -> f32 {
        lerp(self.min_on(axis), self.max_on(axis), axis_ratio(index, n))
    }

    /// All `n + 1` grid-line coordinates along `axis`.
    pub fn grid_lines(&self, axis: Axis, n: usize) -> Vec<f32> {
        (0..=n).map(|k| self.coord(axis, k, n)).collect()
    }

    /// Sub-box `(xi, yi, zi)` of a uniform `cuts` split.
    ///
    /// Uses `min + (max - min) / cuts * k` in that operation order.
    pub fn subdivide(&self, cuts: [usize; 3], index: [usize; 3]) -> Bounds {
        let mut min = Vec3::ZERO;
        let mut max = Vec3::ZERO;
        for axis in Axis::ALL {
            let a = axis.index();
            let lo = self.min[a];
            let step = (self.max[a] - lo) / cuts[a] as f32;
            min[a] = lo + step * index[a] as f32;
            max[a] = lo + step * (index[a] + 1) as f32;
        }
        Bounds { min, max }
    }

    /// Fails on the first axis where `min >= max` (or either side is NaN).
    pub fn ensure_nondegenerate(&self) -> Result<()> {
        for axis in Axis::ALL {
            ensure_increasing(axis, self.min_on(axis), self.max_on(axis))?;
        }
        Ok(())
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: Vec3::new(-2.0, -2.0, 2.0),
            max: Vec3::new(2.0, 2.0, 4.0),
        }
    }
}

#[inline]
pub(crate) fn ensure_increasing(axis: Axis, lo: f32, hi: f32) -> Result<()> {
    // written so NaN fails too
    if lo < hi {
        Ok(())
    } else {
        Err(Error::DegenerateBounds { axis, lo, hi })
    }
}
