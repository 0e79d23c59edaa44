use super::{BinningHeuristic, BuildSource, PrimInfo, PrimRef, Split};
use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::math::{Real, Vector, DIM};

/// Object binning with 8 bins per axis.
pub type HeuristicBinning8 = HeuristicBinning<8>;
/// Object binning with 16 bins per axis.
pub type HeuristicBinning16 = HeuristicBinning<16>;

/// Leaves are made of blocks of `1 << LOG_BLOCK_SIZE` primitives, the SAH counts primitives
/// rounded up to that granularity.
const LOG_BLOCK_SIZE: usize = 2;

#[inline]
fn blocks(num: usize) -> usize {
    (num + (1 << LOG_BLOCK_SIZE) - 1) >> LOG_BLOCK_SIZE
}

#[derive(Copy, Clone, Debug)]
struct Bin {
    counts: [usize; DIM],
    bounds: [Aabb; DIM],
}

impl Default for Bin {
    fn default() -> Self {
        Self {
            counts: [0; DIM],
            bounds: [Aabb::new_invalid(); DIM],
        }
    }
}

/// Surface-area-heuristic object binning.
///
/// This implements the strategy from "On fast Construction of SAH-based Bounding Volume
/// Hierarchies", Ingo Wald: primitive centroids are binned into `BINS` uniform bins along each
/// axis of the centroid bounds, then the `BINS - 1` planes between bins are evaluated with the
/// SAH and the cheapest one is selected.
///
/// Axes along which all the centroids coincide cannot be split and are skipped. If every axis
/// is degenerate (e.g. all the primitives have the same bounding box), [`BinningHeuristic::best`]
/// returns [`Split::invalid`]; that is the case the fallback splitter exists for.
#[derive(Clone, Debug)]
pub struct HeuristicBinning<const BINS: usize> {
    ofs: Vector<Real>,
    scale: Vector<Real>,
    bins: [Bin; BINS],
}

impl<const BINS: usize> HeuristicBinning<BINS> {
    // Evaluated when `new` is monomorphized: fewer than two bins do not compile.
    const AT_LEAST_TWO_BINS: () = assert!(BINS >= 2, "Binning requires at least two bins.");

    /// Creates empty bins spanning the centroid bounds of `pinfo`.
    pub fn new(pinfo: &PrimInfo) -> Self {
        let () = Self::AT_LEAST_TWO_BINS;

        let ofs = pinfo.cent_bounds.mins.coords;
        let diag = pinfo.cent_bounds.extents();
        // Slightly less than BINS so the largest centroid still falls into the last bin.
        let range = BINS as Real * 0.99;
        let scale = diag.map(|d| {
            let s = range / d;
            if d > 0.0 && s.is_finite() {
                s
            } else {
                0.0
            }
        });

        Self {
            ofs,
            scale,
            bins: [Bin::default(); BINS],
        }
    }

    #[inline]
    fn bin_id(&self, center2: Real, axis: usize) -> usize {
        let bin = ((center2 - self.ofs[axis]) * self.scale[axis]).floor();
        // NOTE: the float -> usize cast maps NaN and negative values to zero.
        (bin as usize).min(BINS - 1)
    }

    /// The number of primitives binned so far.
    pub fn num_binned(&self) -> usize {
        self.bins.iter().map(|bin| bin.counts[0]).sum()
    }

    /// Adds the centroids of `prims` to the bins.
    pub fn bin(&mut self, prims: &[PrimRef]) {
        for prim in prims {
            let bounds = prim.bounds();
            let center2 = bounds.center2();

            for axis in 0..DIM {
                let bin_id = self.bin_id(center2[axis], axis);
                let bin = &mut self.bins[bin_id];
                bin.counts[axis] += 1;
                bin.bounds[axis].merge(&bounds);
            }
        }
    }

    /// The cheapest splitting plane between two bins, along any axis.
    pub fn best(&self) -> Split {
        let mut best = Split::invalid();

        for axis in 0..DIM {
            if self.scale[axis] == 0.0 {
                continue;
            }

            // Sweep from the right: everything in bins `i..`.
            let mut right_counts = [0; BINS];
            let mut right_areas = [0.0; BINS];
            let mut count = 0;
            let mut bounds = Aabb::new_invalid();

            for i in (1..BINS).rev() {
                count += self.bins[i].counts[axis];
                bounds.merge(&self.bins[i].bounds[axis]);
                right_counts[i] = count;
                right_areas[i] = bounds.half_area();
            }

            // Sweep from the left: everything in bins `..i`.
            let mut count = 0;
            let mut bounds = Aabb::new_invalid();

            for i in 1..BINS {
                count += self.bins[i - 1].counts[axis];
                bounds.merge(&self.bins[i - 1].bounds[axis]);

                if count == 0 || right_counts[i] == 0 {
                    continue;
                }

                let cost = bounds.half_area() * blocks(count) as Real
                    + right_areas[i] * blocks(right_counts[i]) as Real;

                if cost < best.cost {
                    best = Split {
                        axis,
                        pos: self.ofs[axis] + i as Real / self.scale[axis],
                        cost,
                    };
                }
            }
        }

        best
    }
}

impl<'a, S: ?Sized + BuildSource, const BINS: usize> BinningHeuristic<'a, S>
    for HeuristicBinning<BINS>
{
    fn new(pinfo: &PrimInfo, _: &'a S) -> Self {
        Self::new(pinfo)
    }

    fn bin(&mut self, prims: &[PrimRef]) {
        Self::bin(self, prims)
    }

    fn best(&self) -> Split {
        Self::best(self)
    }
}
