use super::prim_info::PrimInfoAcc;
use super::{
    BinningHeuristic, BuildSource, PrimInfo, PrimRef, PrimRefAlloc, PrimRefBag, PrimRefBlock,
    Split,
};
use core::mem;

/// One side of a fallback split: its primitive references and their aggregate information.
#[derive(Debug)]
pub struct FallbackHalf {
    /// The primitive references assigned to this side.
    pub prims: PrimRefBag,
    /// The exact aggregate information of `prims`.
    pub info: PrimInfo,
}

/// The result of [`FallbackSplitter::split`]: both halves plus the split recommended by the
/// binning heuristic for each of them.
#[derive(Debug)]
pub struct FallbackSplit {
    /// The left half.
    pub left: FallbackHalf,
    /// The best split of the left half.
    pub lsplit: Split,
    /// The right half.
    pub right: FallbackHalf,
    /// The best split of the right half.
    pub rsplit: Split,
}

/// The splitter of last resort.
///
/// When the primary splitter cannot separate a set of primitives (e.g. all of them share
/// the same centroid), a recursive build would never terminate. The fallback splitter ignores
/// the geometry and deals the primitives alternately to the left and to the right instead.
/// Both halves thus differ by at most one primitive and, as soon as there are at least two
/// primitives, neither of them is empty. This is a single linear pass over the input.
///
/// The assignment only depends on the order in which primitives are drained from the source
/// bag: the `k`-th primitive (zero-based) goes to the right if `k` is even and to the left
/// otherwise. It is deterministic when a single thread drains the bag.
///
/// # Example
///
/// ```rust
/// # #[cfg(all(feature = "dim3", feature = "f32"))] {
/// use bvhsplit3d::bounding_volume::Aabb;
/// use bvhsplit3d::partitioning::{
///     FallbackSplitter, HeuristicBinning8, PrimInfo, PrimRef, PrimRefAlloc,
///     PrimRefAllocSettings, PrimRefBag, PrimRefBlock,
/// };
/// use nalgebra::Point3;
///
/// // Ten copies of the same box: no splitting plane can separate them.
/// let aabb = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
/// let boxes = vec![aabb; 10];
/// let mut block = PrimRefBlock::with_capacity(16);
/// for i in 0..10 {
///     assert!(block.insert(PrimRef::new(aabb, 0, i)));
/// }
///
/// let mut prims = PrimRefBag::new();
/// prims.insert(Box::new(block));
/// let pinfo = PrimInfo::from_bag(&mut prims);
///
/// let alloc = PrimRefAlloc::new(PrimRefAllocSettings::default()).unwrap();
/// let result = FallbackSplitter::split::<HeuristicBinning8, _>(
///     0, &alloc, &boxes[..], &prims, &pinfo,
/// );
///
/// assert_eq!(result.left.info.num, 5);
/// assert_eq!(result.right.info.num, 5);
/// assert!(prims.is_empty());
/// # }
/// ```
#[derive(Copy, Clone, Debug, Default)]
pub struct FallbackSplitter;

impl FallbackSplitter {
    /// Splits `prims` into two halves and computes the best split of each half with the
    /// heuristic `H`.
    ///
    /// `prims` is drained: it is empty when this returns, and its blocks are given back to
    /// the pool of the thread `thread_index`. `pinfo` is the information of the node being
    /// split; the depth of both halves derives from it.
    pub fn split<'a, H, S>(
        thread_index: usize,
        alloc: &PrimRefAlloc,
        source: &'a S,
        prims: &PrimRefBag,
        pinfo: &PrimInfo,
    ) -> FallbackSplit
    where
        S: ?Sized + BuildSource,
        H: BinningHeuristic<'a, S>,
    {
        let (mut left, mut right) = Self::partition(thread_index, alloc, prims, pinfo);
        let lsplit = Self::binned_split::<H, S>(&mut left, source);
        let rsplit = Self::binned_split::<H, S>(&mut right, source);

        FallbackSplit {
            left,
            lsplit,
            right,
            rsplit,
        }
    }

    /// Splits `prims` into two halves, without running any heuristic on them.
    ///
    /// Returns the left and right halves, in that order. See [`FallbackSplitter::split`].
    pub fn partition(
        thread_index: usize,
        alloc: &PrimRefAlloc,
        prims: &PrimRefBag,
        pinfo: &PrimInfo,
    ) -> (FallbackHalf, FallbackHalf) {
        let mut left = SplitSide::new(alloc, thread_index);
        let mut right = SplitSide::new(alloc, thread_index);

        while let Some(block) = prims.take() {
            for prim in block.as_slice() {
                if (left.acc.num + right.acc.num) & 1 == 1 {
                    left.push(prim);
                } else {
                    right.push(prim);
                }
            }

            alloc.free(thread_index, block);
        }

        log::debug!(
            "Fallback split at depth {}: {} primitives -> {} left, {} right.",
            pinfo.depth,
            left.acc.num + right.acc.num,
            left.acc.num,
            right.acc.num
        );

        (left.finish(pinfo), right.finish(pinfo))
    }

    fn binned_split<'a, H, S>(half: &mut FallbackHalf, source: &'a S) -> Split
    where
        S: ?Sized + BuildSource,
        H: BinningHeuristic<'a, S>,
    {
        let mut heuristic = H::new(&half.info, source);
        for block in half.prims.iter() {
            heuristic.bin(block.as_slice());
        }
        heuristic.best()
    }
}

/// The destination of a partition: a bag being filled one block at a time.
struct SplitSide<'a> {
    alloc: &'a PrimRefAlloc,
    thread_index: usize,
    prims: PrimRefBag,
    block: Box<PrimRefBlock>,
    acc: PrimInfoAcc,
}

impl<'a> SplitSide<'a> {
    fn new(alloc: &'a PrimRefAlloc, thread_index: usize) -> Self {
        Self {
            alloc,
            thread_index,
            prims: PrimRefBag::new(),
            block: alloc.malloc(thread_index),
            acc: PrimInfoAcc::default(),
        }
    }

    #[inline]
    fn push(&mut self, prim: &PrimRef) {
        self.acc.add(prim);

        if self.block.insert(*prim) {
            return;
        }

        let full = mem::replace(&mut self.block, self.alloc.malloc(self.thread_index));
        log::trace!("Primitive block full ({} references).", full.len());
        self.prims.insert(full);

        let inserted = self.block.insert(*prim);
        debug_assert!(inserted, "Freshly allocated blocks cannot be full.");
    }

    fn finish(self, parent: &PrimInfo) -> FallbackHalf {
        self.prims.insert(self.block);
        let info = PrimInfo::derived(
            self.acc.num,
            self.acc.geom_bounds,
            self.acc.cent_bounds,
            parent,
        );

        FallbackHalf {
            prims: self.prims,
            info,
        }
    }
}
