use super::{alloc, bag_from_boxes, random_aabb, sorted_ids};
use bvhsplit3d::bounding_volume::{Aabb, BoundingVolume};
use bvhsplit3d::math::{Point, Real, Vector};
use bvhsplit3d::partitioning::{
    FallbackSplitter, HeuristicBinning16, HeuristicBinning8, PrimInfo, PrimRef, PrimRefBag,
    PrimRefBlock,
};

fn check_halves(
    num_prims: usize,
    block_capacity: usize,
    rng: &mut oorandom::Rand32,
) {
    let boxes: Vec<_> = (0..num_prims).map(|_| random_aabb(rng)).collect();
    let alloc = alloc(1, block_capacity);
    let mut bag = bag_from_boxes(&boxes, &alloc);
    let pinfo = PrimInfo::from_bag(&mut bag);
    let all_ids = sorted_ids(&mut bag);

    let mut result =
        FallbackSplitter::split::<HeuristicBinning16, _>(0, &alloc, &boxes[..], &bag, &pinfo);

    // The source is fully drained.
    assert!(bag.is_empty());
    assert_eq!(bag.drain().count(), 0);

    let left_info = result.left.info;
    let right_info = result.right.info;

    // Every reference ends up on exactly one side.
    let mut ids = sorted_ids(&mut result.left.prims);
    ids.extend(sorted_ids(&mut result.right.prims));
    ids.sort_unstable();
    assert_eq!(ids, all_ids);
    assert_eq!(left_info.num + right_info.num, num_prims);

    // Both sides differ by at most one, the right one getting the extra reference.
    assert!(right_info.num == left_info.num || right_info.num == left_info.num + 1);

    if num_prims >= 2 {
        assert!(left_info.num > 0 && right_info.num > 0);
    }

    for (half, split) in [
        (&mut result.left, result.lsplit),
        (&mut result.right, result.rsplit),
    ] {
        // The recorded information is exact.
        let recomputed = PrimInfo::from_bag(&mut half.prims);
        assert_eq!(recomputed.num, half.info.num);
        assert_eq!(recomputed.geom_bounds, half.info.geom_bounds);
        assert_eq!(recomputed.cent_bounds, half.info.cent_bounds);
        assert_eq!(half.info.depth, pinfo.depth + 1);

        // And contained in the information of the parent.
        if half.info.num > 0 {
            assert!(pinfo.geom_bounds.contains(&half.info.geom_bounds));
            assert!(pinfo.cent_bounds.contains(&half.info.cent_bounds));
        }

        assert!(half.prims.iter().all(|block| block.len() <= block_capacity));

        if split.is_valid() {
            let num_left = half.prims.prims().filter(|p| split.is_left(p)).count();
            assert!(num_left > 0 && num_left < half.info.num);
        }
    }

    assert_eq!(
        left_info.geom_bounds.merged(&right_info.geom_bounds),
        pinfo.geom_bounds
    );
}

#[test]
fn random_sets_are_halved() {
    let mut rng = oorandom::Rand32::new(42);

    for num_prims in [0, 1, 2, 3, 7, 64, 257, 1000] {
        for block_capacity in [1, 3, 16, 256] {
            check_halves(num_prims, block_capacity, &mut rng);
        }
    }
}

#[test]
fn five_primitives_in_one_block() {
    let boxes: Vec<_> = (0..5)
        .map(|i| Aabb::from_half_extents(Point::new(i as Real, 0.0, 0.0), Vector::repeat(0.5)))
        .collect();
    let mut block = PrimRefBlock::with_capacity(8);
    for (i, aabb) in boxes.iter().enumerate() {
        assert!(block.insert(PrimRef::new(*aabb, 0, i as u32)));
    }
    let mut bag = PrimRefBag::new();
    bag.insert(Box::new(block));
    let pinfo = PrimInfo::from_bag(&mut bag);

    let alloc = alloc(1, 8);
    let (mut left, mut right) = FallbackSplitter::partition(0, &alloc, &bag, &pinfo);

    assert_eq!(sorted_ids(&mut right.prims), vec![(0, 0), (0, 2), (0, 4)]);
    assert_eq!(sorted_ids(&mut left.prims), vec![(0, 1), (0, 3)]);
    assert_eq!(right.prims.len(), 1);
    assert_eq!(left.prims.len(), 1);

    assert_eq!(right.info.geom_bounds, boxes[0].merged(&boxes[4]));
    assert_eq!(left.info.geom_bounds, boxes[1].merged(&boxes[3]));
    assert_eq!(
        left.info.cent_bounds,
        Aabb::new(boxes[1].center2(), boxes[3].center2())
    );
}

#[test]
fn empty_input() {
    let bag = PrimRefBag::new();
    let boxes: Vec<Aabb> = vec![];
    let alloc = alloc(1, 8);

    let mut result = FallbackSplitter::split::<HeuristicBinning8, _>(
        0,
        &alloc,
        &boxes[..],
        &bag,
        &PrimInfo::empty(),
    );

    for half in [&mut result.left, &mut result.right] {
        assert_eq!(half.info.num, 0);
        assert!(half.info.geom_bounds.is_empty());
        assert_eq!(half.prims.len(), 1);
        assert!(half.prims.iter().all(|block| block.is_empty()));
    }

    assert!(!result.lsplit.is_valid());
    assert!(!result.rsplit.is_valid());
}

#[test]
fn identical_primitives_spread_over_blocks() {
    let aabb = Aabb::new(Point::new(-1.0, 2.0, 3.0), Point::new(0.0, 4.0, 3.5));
    let boxes = vec![aabb; 10];
    let alloc = alloc(1, 3);
    let mut bag = bag_from_boxes(&boxes, &alloc);
    let pinfo = PrimInfo::from_bag(&mut bag);

    let result =
        FallbackSplitter::split::<HeuristicBinning8, _>(0, &alloc, &boxes[..], &bag, &pinfo);

    assert_eq!(result.left.info.num, 5);
    assert_eq!(result.right.info.num, 5);

    for info in [result.left.info, result.right.info] {
        assert_eq!(info.geom_bounds, aabb);
        assert_eq!(info.cent_bounds, Aabb::new(aabb.center2(), aabb.center2()));
    }
}

#[test]
fn source_blocks_are_recycled() {
    let mut rng = oorandom::Rand32::new(7);
    let boxes: Vec<_> = (0..100).map(|_| random_aabb(&mut rng)).collect();
    let alloc = alloc(1, 10);
    let mut bag = bag_from_boxes(&boxes, &alloc);
    let pinfo = PrimInfo::from_bag(&mut bag);
    assert_eq!(alloc.allocated_blocks(), 10);

    let (left, right) = FallbackSplitter::partition(0, &alloc, &bag, &pinfo);

    // 5 blocks per side, taken from the 10 freed source blocks as soon as they were drained,
    // except for the two blocks opened before anything was freed.
    assert!(alloc.allocated_blocks() <= 12);

    alloc.recycle(0, left.prims);
    alloc.recycle(0, right.prims);
    let before = alloc.allocated_blocks();
    let _ = alloc.malloc(0);
    assert_eq!(alloc.allocated_blocks(), before);
}
