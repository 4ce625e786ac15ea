//! Conditional parallel iteration helpers.
//!
//! With the `parallel` feature these run on the rayon pool; without it they
//! fall back to plain sequential iteration with identical results.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Map over a range in parallel (or sequentially), collecting in range order.
#[cfg(feature = "parallel")]
pub fn map_range<R, F>(range: std::ops::Range<usize>, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(usize) -> R + Sync + Send,
{
    range.into_par_iter().map(f).collect()
}

#[cfg(not(feature = "parallel"))]
pub fn map_range<R, F>(range: std::ops::Range<usize>, f: F) -> Vec<R>
where
    F: Fn(usize) -> R,
{
    range.map(f).collect()
}

/// Visit two equally long slices element-pairwise, with the shared index.
///
/// Each call only touches its own pair of slots, so the pairs may be
/// processed in any order.
#[cfg(feature = "parallel")]
pub fn for_each_pair_mut<A, B, F>(a: &mut [A], b: &mut [B], f: F)
where
    A: Send,
    B: Send,
    F: Fn(usize, &mut A, &mut B) + Sync + Send,
{
    debug_assert_eq!(a.len(), b.len());
    a.par_iter_mut()
        .zip(b.par_iter_mut())
        .enumerate()
        .for_each(|(i, (x, y))| f(i, x, y));
}

#[cfg(not(feature = "parallel"))]
pub fn for_each_pair_mut<A, B, F>(a: &mut [A], b: &mut [B], f: F)
where
    F: Fn(usize, &mut A, &mut B),
{
    debug_assert_eq!(a.len(), b.len());
    a.iter_mut()
        .zip(b.iter_mut())
        .enumerate()
        .for_each(|(i, (x, y))| f(i, x, y));
}
