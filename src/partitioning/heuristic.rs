use super::{BuildSource, PrimInfo, PrimRef};
use crate::math::Real;

/// A split decision: an axis-aligned plane through the centroids of a set of primitives.
///
/// `pos` is expressed in the same space as [`PrimRef::center2`], i.e., with doubled
/// coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Split {
    /// The axis orthogonal to the splitting plane.
    pub axis: usize,
    /// The position of the splitting plane along `axis`.
    pub pos: Real,
    /// The estimated cost of this split. Lower is better.
    pub cost: Real,
}

impl Default for Split {
    fn default() -> Self {
        Self::invalid()
    }
}

impl Split {
    /// A split with an infinite cost, meaning no splitting plane was found.
    pub fn invalid() -> Self {
        Self {
            axis: 0,
            pos: 0.0,
            cost: Real::INFINITY,
        }
    }

    /// Does this split have a finite cost?
    pub fn is_valid(&self) -> bool {
        self.cost < Real::INFINITY
    }

    /// Is `prim` on the left side of the splitting plane?
    #[inline]
    pub fn is_left(&self, prim: &PrimRef) -> bool {
        prim.center2()[self.axis] < self.pos
    }
}

/// A cost model computing the best split of a set of primitives from statistics gathered
/// over all its primitive references.
///
/// A heuristic is created for one set of primitives, fed with every block of that set
/// through [`BinningHeuristic::bin`], then queried once with [`BinningHeuristic::best`].
pub trait BinningHeuristic<'a, S: ?Sized + BuildSource>: Sized {
    /// Creates a heuristic for the set of primitives described by `pinfo`.
    fn new(pinfo: &PrimInfo, source: &'a S) -> Self;

    /// Accumulates the statistics of a contiguous range of primitive references.
    fn bin(&mut self, prims: &[PrimRef]);

    /// The best split according to the accumulated statistics.
    ///
    /// Returns [`Split::invalid`] if no splitting plane separates the primitives.
    fn best(&self) -> Split;
}
