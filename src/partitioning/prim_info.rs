use super::{PrimRef, PrimRefBag};
use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::math::Real;

/// Aggregate information about a set of primitive references.
///
/// This is the immutable summary handed around with a [`PrimRefBag`]: how many primitives
/// it contains, the union of their bounding boxes, and the union of their centroids (as given
/// by [`Aabb::center2`]).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct PrimInfo {
    /// The number of primitives.
    pub num: usize,
    /// The union of the bounding boxes of all the primitives.
    pub geom_bounds: Aabb,
    /// The union of the doubled centers of the bounding boxes of all the primitives.
    pub cent_bounds: Aabb,
    /// The depth of the BVH node these primitives belong to. Zero for the root.
    pub depth: usize,
}

impl Default for PrimInfo {
    fn default() -> Self {
        Self::empty()
    }
}

impl PrimInfo {
    /// Information about an empty set of primitives at the root of a tree.
    pub fn empty() -> Self {
        Self::new(0, Aabb::new_invalid(), Aabb::new_invalid())
    }

    /// Information about a root set of primitives.
    pub fn new(num: usize, geom_bounds: Aabb, cent_bounds: Aabb) -> Self {
        Self {
            num,
            geom_bounds,
            cent_bounds,
            depth: 0,
        }
    }

    /// Information about a subset of the primitives described by `parent`.
    ///
    /// The counts and bounds are the ones given, everything else is inherited from `parent`.
    pub fn derived(num: usize, geom_bounds: Aabb, cent_bounds: Aabb, parent: &PrimInfo) -> Self {
        Self {
            num,
            geom_bounds,
            cent_bounds,
            depth: parent.depth + 1,
        }
    }

    /// Computes the exact information of a set of primitive references.
    pub fn from_prims<'a>(prims: impl IntoIterator<Item = &'a PrimRef>) -> Self {
        let mut acc = PrimInfoAcc::default();
        for prim in prims {
            acc.add(prim);
        }
        Self::new(acc.num, acc.geom_bounds, acc.cent_bounds)
    }

    /// Computes the exact information of all the primitive references stored in `bag`.
    pub fn from_bag(bag: &mut PrimRefBag) -> Self {
        Self::from_prims(bag.prims())
    }

    /// The number of primitives.
    #[inline]
    pub fn size(&self) -> usize {
        self.num
    }

    /// Does this describe an empty set of primitives?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num == 0
    }

    /// The SAH cost of making a single leaf out of all these primitives.
    pub fn sah_leaf_cost(&self) -> Real {
        self.geom_bounds.half_area() * self.num as Real
    }
}

/// Running counts and bounds, turned into a [`PrimInfo`] once complete.
#[derive(Copy, Clone, Debug)]
pub(crate) struct PrimInfoAcc {
    pub num: usize,
    pub geom_bounds: Aabb,
    pub cent_bounds: Aabb,
}

impl Default for PrimInfoAcc {
    fn default() -> Self {
        Self {
            num: 0,
            geom_bounds: Aabb::new_invalid(),
            cent_bounds: Aabb::new_invalid(),
        }
    }
}

impl PrimInfoAcc {
    #[inline]
    pub fn add(&mut self, prim: &PrimRef) {
        let bounds = prim.bounds();
        self.num += 1;
        self.geom_bounds.merge(&bounds);
        self.cent_bounds.take_point(bounds.center2());
    }

    pub fn merge(&mut self, other: &PrimInfoAcc) {
        self.num += other.num;
        self.geom_bounds.merge(&other.geom_bounds);
        self.cent_bounds.merge(&other.cent_bounds);
    }
}
