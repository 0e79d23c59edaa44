use super::{PrimRef, PrimRefBlock};
use core::fmt;
use core::mem::ManuallyDrop;
use core::ptr;
use core::sync::atomic::Ordering;
use crossbeam::epoch::{self, Atomic, Owned, Shared};

/// The bag of primitive blocks holding the working set of a BVH node.
pub type PrimRefBag = AtomicSet<Box<PrimRefBlock>>;

static_assertions::assert_impl_all!(PrimRefBag: Send, Sync);

struct Node<T> {
    item: ManuallyDrop<T>,
    next: Atomic<Node<T>>,
}

/// A lock-free, unordered bag of items.
///
/// Items are kept in an intrusive singly-linked list whose head is updated with
/// compare-and-swap. Removed nodes are reclaimed through epoch-based garbage collection so
/// concurrent [`AtomicSet::insert`] and [`AtomicSet::take`] calls never observe a freed node.
///
/// No operation blocks: `take` on an empty set returns `None` immediately. Enumerating the
/// items with [`AtomicSet::iter`] requires an exclusive borrow, so it can never race with
/// insertions or removals.
pub struct AtomicSet<T> {
    head: Atomic<Node<T>>,
}

impl<T> Default for AtomicSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for AtomicSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomicSet")
            .field("is_empty", &self.is_empty())
            .finish_non_exhaustive()
    }
}

impl<T> AtomicSet<T> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            head: Atomic::null(),
        }
    }

    /// Moves `item` into this set.
    ///
    /// Can be called concurrently with any other `insert` or `take`.
    pub fn insert(&self, item: T) {
        let mut node = Owned::new(Node {
            item: ManuallyDrop::new(item),
            next: Atomic::null(),
        });
        let guard = epoch::pin();

        loop {
            let head = self.head.load(Ordering::Relaxed, &guard);
            node.next.store(head, Ordering::Relaxed);

            match self.head.compare_exchange(
                head,
                node,
                Ordering::Release,
                Ordering::Relaxed,
                &guard,
            ) {
                Ok(_) => break,
                Err(err) => node = err.new,
            }
        }
    }

    /// Removes an arbitrary item from this set, or returns `None` if it is empty.
    ///
    /// Can be called concurrently with any other `insert` or `take`.
    pub fn take(&self) -> Option<T> {
        let guard = epoch::pin();

        loop {
            let head = self.head.load(Ordering::Acquire, &guard);
            // SAFETY: `head` is protected by `guard`. Nodes are only freed through
            //         `defer_destroy` so it stays valid until the guard is dropped.
            let node = unsafe { head.as_ref() }?;
            let next = node.next.load(Ordering::Relaxed, &guard);

            if self
                .head
                .compare_exchange(head, next, Ordering::Relaxed, Ordering::Relaxed, &guard)
                .is_ok()
            {
                // SAFETY: the successful CAS unlinked `head`, so this thread is the only one
                //         reading its item. The node itself is freed once no other thread
                //         can still hold a reference to it, and `ManuallyDrop` prevents the
                //         item from being dropped twice.
                unsafe {
                    guard.defer_destroy(head);
                    return Some(ManuallyDrop::into_inner(ptr::read(&node.item)));
                }
            }
        }
    }

    /// Is this set empty?
    ///
    /// The result may already be outdated when it is returned if other threads are
    /// modifying the set.
    pub fn is_empty(&self) -> bool {
        let guard = epoch::pin();
        self.head.load(Ordering::Acquire, &guard).is_null()
    }

    /// The number of items in this set.
    pub fn len(&mut self) -> usize {
        self.iter().count()
    }

    /// Iterates through all the items of this set without removing them.
    pub fn iter(&mut self) -> AtomicSetIter<'_, T> {
        // SAFETY: `&mut self` guarantees no other thread accesses the list.
        let guard = unsafe { epoch::unprotected() };
        AtomicSetIter {
            curr: self.head.load(Ordering::Acquire, guard),
        }
    }

    /// Removes the items of this set one by one with [`AtomicSet::take`].
    ///
    /// The iterator ends as soon as `take` returns `None`.
    pub fn drain(&self) -> AtomicSetDrain<'_, T> {
        AtomicSetDrain { set: self }
    }
}

impl<T> Drop for AtomicSet<T> {
    fn drop(&mut self) {
        // SAFETY: `&mut self` guarantees no other thread accesses the list, and every node
        //         still linked owns its item.
        unsafe {
            let guard = epoch::unprotected();
            let mut curr = self.head.load(Ordering::Relaxed, guard);

            while !curr.is_null() {
                let mut node = curr.into_owned();
                ManuallyDrop::drop(&mut node.item);
                curr = node.next.load(Ordering::Relaxed, guard);
            }
        }
    }
}

impl<T> Extend<T> for AtomicSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}

impl<T> FromIterator<T> for AtomicSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut result = Self::new();
        result.extend(iter);
        result
    }
}

/// Iterator through the items of an [`AtomicSet`], see [`AtomicSet::iter`].
pub struct AtomicSetIter<'a, T> {
    curr: Shared<'a, Node<T>>,
}

impl<'a, T> Iterator for AtomicSetIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        // SAFETY: the set is exclusively borrowed for `'a` so no node can be unlinked or
        //         freed while this iterator exists.
        let node = unsafe { self.curr.as_ref() }?;
        self.curr = node.next.load(Ordering::Relaxed, unsafe { epoch::unprotected() });
        Some(&*node.item)
    }
}

/// Draining iterator of an [`AtomicSet`], see [`AtomicSet::drain`].
pub struct AtomicSetDrain<'a, T> {
    set: &'a AtomicSet<T>,
}

impl<T> Iterator for AtomicSetDrain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.set.take()
    }
}

impl AtomicSet<Box<PrimRefBlock>> {
    /// The total number of primitive references across all the blocks of this bag.
    pub fn prim_count(&mut self) -> usize {
        self.iter().map(|block| block.len()).sum()
    }

    /// Iterates through every primitive reference of every block of this bag.
    pub fn prims(&mut self) -> impl Iterator<Item = &PrimRef> + '_ {
        self.iter().flat_map(|block| block.as_slice().iter())
    }
}
