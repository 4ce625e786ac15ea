//! Static round-robin decomposition of the global box.
//!
//! Every rank computes the full assignment independently and keeps the
//! entries carrying its own rank, so the ordering below must never change:
//! outer loop x, middle y, inner z, `rank = linear_index % nprocs`.

use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;
use crate::{Error, Result};

/// Number of cuts along each axis of the global box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cuts {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl Cuts {
    pub fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// Total subdomain count, `x * y * z`.
    pub fn total(&self) -> usize {
        self.x * self.y * self.z
    }

    pub fn as_array(&self) -> [usize; 3] {
        [self.x, self.y, self.z]
    }
}

impl Default for Cuts {
    fn default() -> Self {
        Self { x: 4, y: 4, z: 4 }
    }
}

/// One sub-box of the global volume and the rank that owns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subdomain {
    pub rank: usize,
    pub xi: usize,
    pub yi: usize,
    pub zi: usize,
}

impl Subdomain {
    pub fn index(&self) -> [usize; 3] {
        [self.xi, self.yi, self.zi]
    }

    /// Position in the global enumeration order.
    pub fn linear_index(&self, cuts: Cuts) -> usize {
        (self.xi * cuts.y + self.yi) * cuts.z + self.zi
    }

    /// Spatial extent of this subdomain inside `global`.
    pub fn bounds(&self, global: &Bounds, cuts: Cuts) -> Bounds {
        global.subdivide(cuts.as_array(), self.index())
    }
}

/// Enumerate every subdomain with its owning rank.
///
/// Zero cuts on any axis yields an empty list. `nprocs == 0` has no
/// meaningful owner and is rejected.
pub fn assign(cuts: Cuts, nprocs: usize) -> Result<Vec<Subdomain>> {
    if nprocs == 0 {
        return Err(Error::NoProcesses);
    }

    let mut out = Vec::with_capacity(cuts.total());
    let mut i = 0usize;
    for xi in 0..cuts.x {
        for yi in 0..cuts.y {
            for zi in 0..cuts.z {
                out.push(Subdomain {
                    rank: i % nprocs,
                    xi,
                    yi,
                    zi,
                });
                i += 1;
            }
        }
    }
    Ok(out)
}

/// The full assignment for one process group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    cuts: Cuts,
    nprocs: usize,
    subdomains: Vec<Subdomain>,
}

impl Partition {
    pub fn new(cuts: Cuts, nprocs: usize) -> Result<Self> {
        let subdomains = assign(cuts, nprocs)?;
        Ok(Self {
            cuts,
            nprocs,
            subdomains,
        })
    }

    pub fn cuts(&self) -> Cuts {
        self.cuts
    }

    pub fn nprocs(&self) -> usize {
        self.nprocs
    }

    /// All subdomains in global order.
    pub fn subdomains(&self) -> &[Subdomain] {
        &self.subdomains
    }

    pub fn len(&self) -> usize {
        self.subdomains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subdomains.is_empty()
    }

    /// Subdomains owned by `rank`, in global order. Empty for ranks that own nothing.
    pub fn owned_by(&self, rank: usize) -> impl Iterator<Item = &Subdomain> + '_ {
        self.subdomains.iter().filter(move |s| s.rank == rank)
    }

    pub fn count_for(&self, rank: usize) -> usize {
        self.owned_by(rank).count()
    }

    /// Subdomain count per rank, indexed by rank.
    pub fn rank_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.nprocs];
        for s in &self.subdomains {
            counts[s.rank] += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::collections::HashSet;

    #[test]
    fn two_cuts_two_ranks() {
        let p = Partition::new(Cuts::new(2, 1, 1), 2).unwrap();
        let r0: Vec<_> = p.owned_by(0).copied().collect();
        let r1: Vec<_> = p.owned_by(1).copied().collect();
        assert_eq!(r0, vec![Subdomain { rank: 0, xi: 0, yi: 0, zi: 0 }]);
        assert_eq!(r1, vec![Subdomain { rank: 1, xi: 1, yi: 0, zi: 0 }]);
    }

    #[test]
    fn enumeration_is_x_outer_z_inner() {
        let subs = assign(Cuts::new(2, 2, 2), 3).unwrap();
        let order: Vec<_> = subs.iter().map(|s| (s.xi, s.yi, s.zi)).collect();
        assert_eq!(
            order,
            vec![
                (0, 0, 0),
                (0, 0, 1),
                (0, 1, 0),
                (0, 1, 1),
                (1, 0, 0),
                (1, 0, 1),
                (1, 1, 0),
                (1, 1, 1),
            ]
        );
        let ranks: Vec<_> = subs.iter().map(|s| s.rank).collect();
        assert_eq!(ranks, vec![0, 1, 2, 0, 1, 2, 0, 1]);

        for (i, s) in subs.iter().enumerate() {
            assert_eq!(s.linear_index(Cuts::new(2, 2, 2)), i);
        }
    }

    #[test]
    fn every_subdomain_owned_exactly_once() {
        for cuts in [
            Cuts::new(1, 1, 1),
            Cuts::new(3, 2, 1),
            Cuts::new(4, 4, 4),
            Cuts::new(1, 5, 3),
        ] {
            for nprocs in 1..=9 {
                let p = Partition::new(cuts, nprocs).unwrap();
                let mut seen = HashSet::new();
                for rank in 0..nprocs {
                    for s in p.owned_by(rank) {
                        assert!(seen.insert(s.index()), "{s:?} assigned twice");
                    }
                }
                assert_eq!(seen.len(), cuts.total());
                assert_eq!(p.rank_counts().iter().sum::<usize>(), cuts.total());
            }
        }
    }

    #[test]
    fn assignment_is_deterministic() {
        let cuts = Cuts::new(3, 3, 2);
        assert_eq!(assign(cuts, 4).unwrap(), assign(cuts, 4).unwrap());
        assert_eq!(assign(cuts, 4).unwrap().len(), assign(cuts, 7).unwrap().len());
    }

    #[test]
    fn surplus_ranks_own_nothing() {
        let p = Partition::new(Cuts::new(2, 1, 1), 5).unwrap();
        assert_eq!(p.rank_counts(), vec![1, 1, 0, 0, 0]);
        assert_eq!(p.owned_by(4).count(), 0);
    }

    #[test]
    fn zero_cuts_and_zero_procs() {
        assert!(Partition::new(Cuts::new(0, 4, 4), 2).unwrap().is_empty());
        assert!(matches!(assign(Cuts::default(), 0), Err(Error::NoProcesses)));
    }

    #[test]
    fn subdomain_bounds_are_increasing() {
        let global = Bounds::new(Vec3::new(-2.0, -2.0, 2.0), Vec3::new(2.0, 2.0, 4.0));
        let cuts = Cuts::new(3, 5, 7);
        for s in assign(cuts, 4).unwrap() {
            let b = s.bounds(&global, cuts);
            assert!(b.ensure_nondegenerate().is_ok(), "{s:?} -> {b:?}");
        }
    }
}
