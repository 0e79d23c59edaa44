use bvhsplit3d::bounding_volume::Aabb;
use bvhsplit3d::math::{Point, Real, Vector};
use bvhsplit3d::partitioning::{PrimRef, PrimRefAlloc, PrimRefAllocSettings, PrimRefBag};

mod concurrent_build;
mod fallback_split;

pub fn alloc(num_threads: usize, block_capacity: usize) -> PrimRefAlloc {
    PrimRefAlloc::new(PrimRefAllocSettings {
        num_threads,
        block_capacity,
    })
    .unwrap()
}

/// A random box with coordinates in `[-100, 100]`.
pub fn random_aabb(rng: &mut oorandom::Rand32) -> Aabb {
    let center = Point::new(
        rng.rand_float() as Real * 200.0 - 100.0,
        rng.rand_float() as Real * 200.0 - 100.0,
        rng.rand_float() as Real * 200.0 - 100.0,
    );
    let half_extents = Vector::new(
        rng.rand_float() as Real * 5.0,
        rng.rand_float() as Real * 5.0,
        rng.rand_float() as Real * 5.0,
    );
    Aabb::from_half_extents(center, half_extents)
}

/// Fills a bag with one reference per box, spread over blocks from `alloc`.
pub fn bag_from_boxes(boxes: &[Aabb], alloc: &PrimRefAlloc) -> PrimRefBag {
    let bag = PrimRefBag::new();
    let mut block = alloc.malloc(0);

    for (i, aabb) in boxes.iter().enumerate() {
        let prim = PrimRef::new(*aabb, 0, i as u32);
        if !block.insert(prim) {
            bag.insert(block);
            block = alloc.malloc(0);
            assert!(block.insert(prim));
        }
    }

    bag.insert(block);
    bag
}

pub fn sorted_ids(bag: &mut PrimRefBag) -> Vec<(u32, u32)> {
    let mut ids: Vec<_> = bag.prims().map(|p| (p.geom_id(), p.prim_id())).collect();
    ids.sort_unstable();
    ids
}
