use super::prim_info::PrimInfoAcc;
use super::{BuildSource, PrimInfo, PrimRef, PrimRefAlloc, PrimRefBag};
use core::ops::Range;

/// The number of primitives processed by a single generation task, in blocks.
const BLOCKS_PER_TASK: usize = 4;

/// A contiguous range of primitives of one geometry.
#[derive(Clone, Debug)]
struct GenTask {
    geom_id: u32,
    prims: Range<u32>,
}

/// Generator of the primitive references of the root of a BVH.
pub struct PrimRefListGen;

impl PrimRefListGen {
    /// Creates one primitive reference per valid primitive of `source`.
    ///
    /// Primitives for which [`BuildSource::prim_bounds`] returns `None` are skipped. Returns
    /// the bag of references and its exact aggregate information, with a depth of zero.
    ///
    /// With the `parallel` feature enabled, the primitives are processed by the rayon thread
    /// pool and each worker allocates blocks from its own pool of `alloc`.
    pub fn generate<S>(source: &S, alloc: &PrimRefAlloc) -> (PrimRefBag, PrimInfo)
    where
        S: ?Sized + BuildSource,
    {
        let prims = PrimRefBag::new();
        let tasks = Self::tasks(source, alloc.block_capacity() * BLOCKS_PER_TASK);

        #[cfg(feature = "parallel")]
        let (acc, num_skipped) = {
            use rayon::prelude::*;

            tasks
                .par_iter()
                .map(|task| {
                    let thread_index = rayon::current_thread_index().unwrap_or(0);
                    Self::run_task(source, alloc, thread_index, task, &prims)
                })
                .reduce(|| (PrimInfoAcc::default(), 0), Self::merge_results)
        };

        #[cfg(not(feature = "parallel"))]
        let (acc, num_skipped) = tasks
            .iter()
            .map(|task| Self::run_task(source, alloc, 0, task, &prims))
            .fold((PrimInfoAcc::default(), 0), Self::merge_results);

        log::debug!(
            "Generated {} primitive references from {} geometries ({} invalid primitives skipped).",
            acc.num,
            source.num_geometries(),
            num_skipped
        );

        let info = PrimInfo::new(acc.num, acc.geom_bounds, acc.cent_bounds);
        (prims, info)
    }

    fn tasks<S: ?Sized + BuildSource>(source: &S, task_size: usize) -> Vec<GenTask> {
        let task_size = task_size.max(1);
        let mut tasks = vec![];

        for geom_id in 0..source.num_geometries() as u32 {
            let num_prims = source.num_primitives(geom_id);

            for start in (0..num_prims).step_by(task_size) {
                let end = (start + task_size).min(num_prims);
                tasks.push(GenTask {
                    geom_id,
                    prims: start as u32..end as u32,
                });
            }
        }

        tasks
    }

    fn run_task<S: ?Sized + BuildSource>(
        source: &S,
        alloc: &PrimRefAlloc,
        thread_index: usize,
        task: &GenTask,
        prims: &PrimRefBag,
    ) -> (PrimInfoAcc, usize) {
        let mut acc = PrimInfoAcc::default();
        let mut num_skipped = 0;
        let mut block = alloc.malloc(thread_index);

        for prim_id in task.prims.clone() {
            let Some(bounds) = source.prim_bounds(task.geom_id, prim_id) else {
                num_skipped += 1;
                continue;
            };

            let prim = PrimRef::new(bounds, task.geom_id, prim_id);
            acc.add(&prim);

            if !block.insert(prim) {
                prims.insert(block);
                block = alloc.malloc(thread_index);
                let inserted = block.insert(prim);
                debug_assert!(inserted, "Freshly allocated blocks cannot be full.");
            }
        }

        if block.is_empty() {
            alloc.free(thread_index, block);
        } else {
            prims.insert(block);
        }

        (acc, num_skipped)
    }

    fn merge_results(
        mut lhs: (PrimInfoAcc, usize),
        rhs: (PrimInfoAcc, usize),
    ) -> (PrimInfoAcc, usize) {
        lhs.0.merge(&rhs.0);
        lhs.1 += rhs.1;
        lhs
    }
}
