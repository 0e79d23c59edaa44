use crate::bounding_volume::Aabb;
use crate::math::{Point, Real};
use core::ops::Index;

/// A reference to a primitive of the scene being built.
///
/// This is a lightweight handle standing in for the primitive during construction: its
/// bounding box plus the identifiers needed to find it again in the [`BuildSource`] it was
/// generated from. It is created once per input primitive and copied around by value.
///
/// [`BuildSource`]: super::BuildSource
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct PrimRef {
    bounds: Aabb,
    geom_id: u32,
    prim_id: u32,
}

impl PrimRef {
    /// Creates a reference to the primitive `prim_id` of the geometry `geom_id`.
    #[inline]
    pub fn new(bounds: Aabb, geom_id: u32, prim_id: u32) -> Self {
        Self {
            bounds,
            geom_id,
            prim_id,
        }
    }

    /// The bounding box of the referenced primitive.
    #[inline]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Twice the center of [`Self::bounds`].
    #[inline]
    pub fn center2(&self) -> Point<Real> {
        self.bounds.center2()
    }

    /// The identifier of the geometry containing the referenced primitive.
    #[inline]
    pub fn geom_id(&self) -> u32 {
        self.geom_id
    }

    /// The index of the referenced primitive within its geometry.
    #[inline]
    pub fn prim_id(&self) -> u32 {
        self.prim_id
    }
}

/// A fixed-capacity, append-only array of primitive references.
///
/// Blocks never grow: [`PrimRefBlock::insert`] reports when the block is full so the caller
/// can fetch a new block from its [`PrimRefAlloc`](super::PrimRefAlloc).
#[derive(Clone, Debug)]
pub struct PrimRefBlock {
    prims: Vec<PrimRef>,
    capacity: usize,
}

impl Default for PrimRefBlock {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl PrimRefBlock {
    /// The number of primitive references a block holds when no other capacity is configured.
    pub const DEFAULT_CAPACITY: usize = 256;

    /// Creates an empty block able to hold `capacity` primitive references.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            prims: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// The maximum number of primitive references this block can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of primitive references currently stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.prims.len()
    }

    /// Is this block empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.prims.is_empty()
    }

    /// Is this block at capacity?
    #[inline]
    pub fn is_full(&self) -> bool {
        self.prims.len() >= self.capacity
    }

    /// Appends `prim` to this block.
    ///
    /// Returns `false` and leaves the block untouched if it is full.
    #[inline]
    #[must_use]
    pub fn insert(&mut self, prim: PrimRef) -> bool {
        if self.is_full() {
            return false;
        }

        self.prims.push(prim);
        true
    }

    /// The `i`-th primitive reference of this block.
    ///
    /// Panics if `i >= self.len()`.
    #[inline]
    pub fn at(&self, i: usize) -> &PrimRef {
        &self.prims[i]
    }

    /// All the primitive references of this block, contiguous in memory.
    #[inline]
    pub fn as_slice(&self) -> &[PrimRef] {
        &self.prims
    }

    /// Removes every primitive reference from this block. The capacity is unchanged.
    pub fn clear(&mut self) {
        self.prims.clear();
    }
}

impl Index<usize> for PrimRefBlock {
    type Output = PrimRef;

    #[inline]
    fn index(&self, i: usize) -> &PrimRef {
        self.at(i)
    }
}
