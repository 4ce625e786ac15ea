//! Escape-time field over one subdomain.
//!
//! Each voxel carries a complex state `z` and a step counter. The voxel's
//! x/y grid position gives the additive constant `c = x + iy`; its z grid
//! position is not a spatial coordinate but the real exponent `p` of the map
//!
//! ```text
//! z_{n+1} = z_n^p + c,   z_0 = 0
//! ```
//!
//! where `z^p` is the principal-branch power `exp(p * ln z)`. Iteration stops
//! for a voxel once `|z|^2 >= 2.0` (tested before each update), after which
//! neither its state nor its counter change again.

use num_complex::Complex32;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::bounds::{Axis, Bounds};
use crate::parallel_iter::for_each_pair_mut;

/// Squared-magnitude bailout. Fixed; not configurable.
pub const BAILOUT_NORM_SQR: f32 = 2.0;

/// Fields larger than this along any axis are not dumped.
pub const DEBUG_DUMP_MAX_EXTENT: usize = 16;

/// What `debug_dump` prints per voxel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugMode {
    /// The complex state, `+r.rr+i.iii`.
    State,
    /// The step counter, zero-padded to three digits.
    StepCount,
}

/// Principal-branch power `exp(p * ln z)`.
///
/// Unlike `Complex::powf` there is no shortcut for `p == 0`: `0^0` goes
/// through `ln 0 = -inf` and comes out NaN, as does `0^p` for `p < 0`.
#[inline]
pub fn complex_power(z: Complex32, p: f32) -> Complex32 {
    (z.ln() * p).exp()
}

/// Run up to `budget` escape-time iterations on a single voxel.
///
/// Counters wrap on overflow rather than saturating.
#[inline]
pub fn escape_iterate(z: &mut Complex32, count: &mut u16, c: Complex32, p: f32, budget: usize) {
    for _ in 0..budget {
        if z.norm_sqr() >= BAILOUT_NORM_SQR {
            break;
        }
        *z = complex_power(*z, p) + c;
        *count = count.wrapping_add(1);
    }
}

/// Dense escape-time field, x fastest: `index = (zi * ny + yi) * nx + xi`.
#[derive(Clone, Debug)]
pub struct EscapeTimeField {
    nx: usize,
    ny: usize,
    nz: usize,
    bounds: Bounds,
    state: Vec<Complex32>,
    step_count: Vec<u16>,
}

impl EscapeTimeField {
    /// Zero-initialised field. Fails if `bounds` is degenerate on any axis.
    pub fn new(nx: usize, ny: usize, nz: usize, bounds: Bounds) -> Result<Self> {
        bounds.ensure_nondegenerate()?;
        let n = nx * ny * nz;
        Ok(Self {
            nx,
            ny,
            nz,
            bounds,
            state: vec![Complex32::new(0.0, 0.0); n],
            step_count: vec![0; n],
        })
    }

    pub fn dims(&self) -> [usize; 3] {
        [self.nx, self.ny, self.nz]
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn voxel_count(&self) -> usize {
        self.step_count.len()
    }

    #[inline]
    pub fn voxel_index(&self, xi: usize, yi: usize, zi: usize) -> usize {
        (zi * self.ny + yi) * self.nx + xi
    }

    /// Complex state per voxel.
    pub fn state(&self) -> &[Complex32] {
        &self.state
    }

    /// The same state as interleaved `re, im` pairs.
    pub fn state_components(&self) -> &[f32] {
        bytemuck::cast_slice(&self.state)
    }

    pub fn step_counts(&self) -> &[u16] {
        &self.step_count
    }

    pub fn value_at(&self, xi: usize, yi: usize, zi: usize) -> Complex32 {
        self.state[self.voxel_index(xi, yi, zi)]
    }

    pub fn steps_at(&self, xi: usize, yi: usize, zi: usize) -> u16 {
        self.step_count[self.voxel_index(xi, yi, zi)]
    }

    /// The additive constant `c` and exponent `p` of a voxel.
    pub fn parameters(&self, xi: usize, yi: usize, zi: usize) -> (Complex32, f32) {
        let x = self.bounds.coord(Axis::X, xi, self.nx);
        let y = self.bounds.coord(Axis::Y, yi, self.ny);
        let p = self.bounds.coord(Axis::Z, zi, self.nz);
        (Complex32::new(x, y), p)
    }

    /// Advance every voxel by at most `budget` iterations.
    ///
    /// Resumes from the current state; `advance(a)` followed by `advance(b)`
    /// is identical to `advance(a + b)`.
    pub fn advance(&mut self, budget: usize) {
        if budget == 0 || self.state.is_empty() {
            return;
        }

        let (nx, ny) = (self.nx, self.ny);
        let xs: Vec<f32> = (0..self.nx).map(|i| self.bounds.coord(Axis::X, i, self.nx)).collect();
        let ys: Vec<f32> = (0..self.ny).map(|i| self.bounds.coord(Axis::Y, i, self.ny)).collect();
        let ps: Vec<f32> = (0..self.nz).map(|i| self.bounds.coord(Axis::Z, i, self.nz)).collect();

        for_each_pair_mut(&mut self.state, &mut self.step_count, |i, z, count| {
            let xi = i % nx;
            let yi = (i / nx) % ny;
            let zi = i / (nx * ny);
            let c = Complex32::new(xs[xi], ys[yi]);
            escape_iterate(z, count, c, ps[zi], budget);
        });
    }

    /// Voxels whose magnitude has reached the bailout.
    pub fn escaped_count(&self) -> usize {
        self.state
            .iter()
            .filter(|z| z.norm_sqr() >= BAILOUT_NORM_SQR)
            .count()
    }

    /// Voxels whose state holds an infinity or NaN.
    pub fn non_finite_count(&self) -> usize {
        self.state
            .iter()
            .filter(|z| !(z.re.is_finite() && z.im.is_finite()))
            .count()
    }

    /// ASCII rendering, one block per z slice and one line per y row.
    ///
    /// Returns `None` when any axis exceeds [`DEBUG_DUMP_MAX_EXTENT`].
    pub fn debug_dump(&self, mode: DebugMode) -> Option<String> {
        if self.nx > DEBUG_DUMP_MAX_EXTENT
            || self.ny > DEBUG_DUMP_MAX_EXTENT
            || self.nz > DEBUG_DUMP_MAX_EXTENT
        {
            return None;
        }

        let mut out = String::new();
        for zi in 0..self.nz {
            out.push('[');
            for yi in 0..self.ny {
                out.push_str(if yi == 0 { " [" } else { "  [" });
                for xi in 0..self.nx {
                    let i = self.voxel_index(xi, yi, zi);
                    let cell = match mode {
                        DebugMode::State => {
                            let z = self.state[i];
                            format!(" {:+.2}{:+.2}i", z.re, z.im)
                        }
                        DebugMode::StepCount => format!(" {:03}", self.step_count[i]),
                    };
                    out.push_str(&cell);
                }
                out.push('\n');
            }
            out.push('\n');
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn unit_cube() -> Bounds {
        Bounds::from_array([-1.0, -1.0, -1.0, 1.0, 1.0, 1.0])
    }

    fn same_bits(a: &EscapeTimeField, b: &EscapeTimeField) -> bool {
        a.step_counts() == b.step_counts()
            && a.state_components()
                .iter()
                .zip(b.state_components())
                .all(|(x, y)| x.to_bits() == y.to_bits())
    }

    #[test]
    fn new_field_is_zeroed() {
        let f = EscapeTimeField::new(3, 4, 5, unit_cube()).unwrap();
        assert_eq!(f.voxel_count(), 60);
        assert_eq!(f.state_components().len(), 2 * f.step_counts().len());
        assert!(f.state_components().iter().all(|&v| v == 0.0));
        assert!(f.step_counts().iter().all(|&n| n == 0));
    }

    #[test]
    fn degenerate_bounds_rejected() {
        let flat = Bounds::new(Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 1.0, 1.0));
        assert!(EscapeTimeField::new(2, 2, 2, flat).is_err());
    }

    #[test]
    fn voxel_index_is_x_fastest() {
        let f = EscapeTimeField::new(3, 4, 5, unit_cube()).unwrap();
        assert_eq!(f.voxel_index(1, 0, 0), 1);
        assert_eq!(f.voxel_index(0, 1, 0), 3);
        assert_eq!(f.voxel_index(0, 0, 1), 12);
        assert_eq!(f.voxel_index(2, 3, 4), 59);
    }

    #[test]
    fn single_step_on_unit_cube() {
        let mut f = EscapeTimeField::new(2, 2, 2, unit_cube()).unwrap();
        f.advance(1);

        assert!(f.step_counts().iter().all(|&n| n == 1));

        for yi in 0..2 {
            for xi in 0..2 {
                // zi = 1 gives p = 0, and exp(0 * ln 0) is NaN
                let (_, p) = f.parameters(xi, yi, 1);
                assert_eq!(p, 0.0);
                let z = f.value_at(xi, yi, 1);
                assert!(z.re.is_nan(), "{z:?}");

                // zi = 0 gives p = -1, and 0^-1 is not finite
                let (_, p) = f.parameters(xi, yi, 0);
                assert_eq!(p, -1.0);
                let z = f.value_at(xi, yi, 0);
                assert!(!(z.re.is_finite() && z.im.is_finite()), "{z:?}");
            }
        }

        assert_eq!(f.non_finite_count(), 8);
    }

    #[test]
    fn zero_to_the_zero_is_nan() {
        assert!(complex_power(Complex32::new(0.0, 0.0), 0.0).re.is_nan());
        assert_eq!(complex_power(Complex32::new(0.0, 0.0), 2.0), Complex32::new(0.0, 0.0));

        let one = complex_power(Complex32::new(3.0, -4.0), 0.0);
        assert!((one.re - 1.0).abs() < 1e-6 && one.im.abs() < 1e-6, "{one:?}");

        let sq = complex_power(Complex32::new(1.0, 1.0), 2.0);
        assert!(sq.re.abs() < 1e-5 && (sq.im - 2.0).abs() < 1e-5, "{sq:?}");
    }

    #[test]
    fn nan_voxels_use_the_whole_budget() {
        let mut z = Complex32::new(0.0, 0.0);
        let mut count = 0u16;
        escape_iterate(&mut z, &mut count, Complex32::new(0.5, -1.0), 0.0, 5);
        assert!(z.re.is_nan());
        assert_eq!(count, 5);

        // the p = 0 slice of the unit cube never reaches the bailout
        let mut f = EscapeTimeField::new(2, 2, 2, unit_cube()).unwrap();
        f.advance(7);
        for yi in 0..2 {
            for xi in 0..2 {
                assert_eq!(f.steps_at(xi, yi, 1), 7);
            }
        }
    }

    #[test]
    fn advance_resumes_where_it_stopped() {
        let mut split = EscapeTimeField::new(6, 5, 4, Bounds::default()).unwrap();
        let mut whole = split.clone();

        split.advance(3);
        split.advance(5);
        whole.advance(8);

        assert!(same_bits(&split, &whole));
    }

    #[test]
    fn escaped_voxels_stay_frozen() {
        let mut f = EscapeTimeField::new(8, 8, 4, Bounds::default()).unwrap();
        f.advance(50);

        // c = -2 - 2i escapes right after the first step
        assert_eq!(f.steps_at(0, 0, 0), 1);

        let before = f.clone();
        let escaped: Vec<usize> = (0..f.voxel_count())
            .filter(|&i| before.state()[i].norm_sqr() >= BAILOUT_NORM_SQR)
            .collect();
        assert!(!escaped.is_empty());
        assert_eq!(escaped.len(), f.escaped_count());

        f.advance(50);
        for i in escaped {
            assert_eq!(f.step_counts()[i], before.step_counts()[i]);
            assert_eq!(f.state()[i].re.to_bits(), before.state()[i].re.to_bits());
            assert_eq!(f.state()[i].im.to_bits(), before.state()[i].im.to_bits());
        }
    }

    #[test]
    fn zero_budget_is_a_no_op() {
        let mut f = EscapeTimeField::new(4, 4, 4, Bounds::default()).unwrap();
        f.advance(0);
        assert!(f.step_counts().iter().all(|&n| n == 0));
    }

    #[test]
    fn counters_wrap_instead_of_panicking() {
        let mut z = Complex32::new(0.0, 0.0);
        let mut count = u16::MAX;
        escape_iterate(&mut z, &mut count, Complex32::new(0.0, 0.0), 2.0, 1);
        assert_eq!(count, 0);
    }

    #[test]
    fn debug_dump_formats_and_does_not_mutate() {
        let bounds = Bounds::from_array([0.0, 0.0, 2.0, 1.0, 1.0, 3.0]);
        let mut f = EscapeTimeField::new(2, 1, 1, bounds).unwrap();
        f.advance(1);
        let before = f.clone();

        assert_eq!(f.debug_dump(DebugMode::StepCount).unwrap(), "[ [ 001 001\n\n");
        assert_eq!(
            f.debug_dump(DebugMode::State).unwrap(),
            "[ [ +0.00+0.00i +0.50+0.00i\n\n"
        );
        assert!(same_bits(&f, &before));
    }

    #[test]
    fn debug_dump_skips_large_fields() {
        let f = EscapeTimeField::new(17, 1, 1, Bounds::default()).unwrap();
        assert!(f.debug_dump(DebugMode::StepCount).is_none());
    }
}
