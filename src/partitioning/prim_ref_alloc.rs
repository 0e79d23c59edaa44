use super::{AtomicSet, BuildError, PrimRef, PrimRefBag, PrimRefBlock};
use core::sync::atomic::{AtomicUsize, Ordering};
use crossbeam::utils::CachePadded;

/// Configuration of a [`PrimRefAlloc`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct PrimRefAllocSettings {
    /// The number of per-thread block pools.
    ///
    /// Thread indices passed to [`PrimRefAlloc::malloc`] are wrapped around this value.
    pub num_threads: usize,
    /// The number of primitive references each allocated block can hold.
    pub block_capacity: usize,
}

impl Default for PrimRefAllocSettings {
    fn default() -> Self {
        Self {
            num_threads: default_num_threads(),
            block_capacity: PrimRefBlock::DEFAULT_CAPACITY,
        }
    }
}

#[cfg(feature = "parallel")]
fn default_num_threads() -> usize {
    rayon::current_num_threads()
}

#[cfg(not(feature = "parallel"))]
fn default_num_threads() -> usize {
    1
}

#[derive(Default)]
struct ThreadPool {
    free: AtomicSet<Box<PrimRefBlock>>,
    allocated: AtomicUsize,
}

/// Per-thread pools of empty primitive blocks.
///
/// Each build thread draws blocks from its own pool (selected by its thread index), so
/// allocating a block never contends with other threads. Blocks handed out are always empty
/// and have the configured capacity. Ownership transfers to the caller; blocks may be given
/// back with [`PrimRefAlloc::free`] to be reused.
pub struct PrimRefAlloc {
    pools: Vec<CachePadded<ThreadPool>>,
    block_capacity: usize,
}

impl PrimRefAlloc {
    /// Creates an allocator with one block pool per thread.
    pub fn new(settings: PrimRefAllocSettings) -> Result<Self, BuildError> {
        if settings.num_threads == 0 {
            return Err(BuildError::ZeroThreads);
        }

        if settings.block_capacity == 0 {
            return Err(BuildError::ZeroBlockCapacity);
        }

        let pools = (0..settings.num_threads)
            .map(|_| CachePadded::new(ThreadPool::default()))
            .collect();

        Ok(Self {
            pools,
            block_capacity: settings.block_capacity,
        })
    }

    /// The number of per-thread pools.
    pub fn num_threads(&self) -> usize {
        self.pools.len()
    }

    /// The capacity of every block allocated by `self`.
    pub fn block_capacity(&self) -> usize {
        self.block_capacity
    }

    #[inline]
    fn pool(&self, thread_index: usize) -> &ThreadPool {
        &self.pools[thread_index % self.pools.len()]
    }

    /// Returns an empty block from the pool of the thread `thread_index`.
    pub fn malloc(&self, thread_index: usize) -> Box<PrimRefBlock> {
        let pool = self.pool(thread_index);

        if let Some(block) = pool.free.take() {
            debug_assert!(block.is_empty());
            return block;
        }

        let _ = pool.allocated.fetch_add(1, Ordering::Relaxed);
        Box::new(PrimRefBlock::with_capacity(self.block_capacity))
    }

    /// Gives `block` back to the pool of the thread `thread_index`.
    ///
    /// The block is cleared first. Blocks with a capacity different from
    /// [`Self::block_capacity`] were not allocated here and are simply dropped.
    pub fn free(&self, thread_index: usize, mut block: Box<PrimRefBlock>) {
        if block.capacity() != self.block_capacity {
            return;
        }

        block.clear();
        self.pool(thread_index).free.insert(block);
    }

    /// Gives every block of `bag` back to the pool of the thread `thread_index`.
    pub fn recycle(&self, thread_index: usize, bag: PrimRefBag) {
        for block in bag.drain() {
            self.free(thread_index, block);
        }
    }

    /// The total number of blocks created by this allocator since its creation.
    ///
    /// Blocks reused from a pool are not counted twice.
    pub fn allocated_blocks(&self) -> usize {
        self.pools
            .iter()
            .map(|pool| pool.allocated.load(Ordering::Relaxed))
            .sum()
    }

    /// The approximate memory footprint, in bytes, of all the blocks created by this allocator.
    pub fn bytes_allocated(&self) -> usize {
        let block_bytes =
            size_of::<PrimRefBlock>() + self.block_capacity * size_of::<PrimRef>();
        self.allocated_blocks() * block_bytes
    }
}
