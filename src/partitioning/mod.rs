//! Partitioning primitives of a BVH builder.
//!
//! The working set of a BVH node is a [`PrimRefBag`]: an unordered, lock-free bag of
//! fixed-capacity [`PrimRefBlock`]s, summarized by a [`PrimInfo`]. Splitters drain one bag and
//! fill two new ones. The [`FallbackSplitter`] is the splitter of last resort: it ignores the
//! geometry entirely and alternates primitives between both sides, so it always halves the
//! primitive count.

pub use self::atomic_set::{AtomicSet, AtomicSetDrain, AtomicSetIter, PrimRefBag};
pub use self::build_source::{BuildSource, TriangleSoup};
pub use self::error::BuildError;
pub use self::heuristic::{BinningHeuristic, Split};
pub use self::heuristic_binning::{HeuristicBinning, HeuristicBinning16, HeuristicBinning8};
pub use self::prim_info::PrimInfo;
pub use self::prim_ref::{PrimRef, PrimRefBlock};
pub use self::prim_ref_alloc::{PrimRefAlloc, PrimRefAllocSettings};
pub use self::prim_ref_gen::PrimRefListGen;
pub use self::splitter_fallback::{FallbackHalf, FallbackSplit, FallbackSplitter};

mod atomic_set;
mod build_source;
mod error;
mod heuristic;
mod heuristic_binning;
mod prim_info;
mod prim_ref;
mod prim_ref_alloc;
mod prim_ref_gen;
mod splitter_fallback;
