use super::{alloc, random_aabb, sorted_ids};
use bvhsplit3d::math::{Point, Real};
use bvhsplit3d::partitioning::{
    FallbackSplitter, HeuristicBinning8, PrimInfo, PrimRefBag, PrimRefListGen, TriangleSoup,
};

const NUM_THREADS: usize = 4;

fn grid_soup(num_meshes: u32, quads_per_side: u32) -> TriangleSoup {
    let mut soup = TriangleSoup::new();

    for m in 0..num_meshes {
        let n = quads_per_side + 1;
        let mut vertices = vec![];
        let mut indices = vec![];

        for i in 0..n {
            for j in 0..n {
                vertices.push(Point::new(i as Real, j as Real, m as Real));
            }
        }

        for i in 0..quads_per_side {
            for j in 0..quads_per_side {
                let a = i * n + j;
                indices.push([a, a + n, a + 1]);
                indices.push([a + 1, a + n, a + n + 1]);
            }
        }

        let _ = soup.add_mesh(vertices, indices).unwrap();
    }

    soup
}

#[test]
fn concurrent_drains_of_one_bag_lose_nothing() {
    let soup = grid_soup(3, 40);
    let alloc = alloc(NUM_THREADS, 16);
    let (mut prims, pinfo) = PrimRefListGen::generate(&soup, &alloc);
    let expected = sorted_ids(&mut prims);
    assert_eq!(pinfo.num, 3 * 40 * 40 * 2);

    let halves = std::thread::scope(|s| {
        let handles: Vec<_> = (0..NUM_THREADS)
            .map(|thread_index| {
                let (alloc, prims, pinfo) = (&alloc, &prims, &pinfo);
                s.spawn(move || FallbackSplitter::partition(thread_index, alloc, prims, pinfo))
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>()
    });

    assert!(prims.is_empty());

    let mut ids = vec![];
    let mut num = 0;
    for (mut left, mut right) in halves {
        num += left.info.num + right.info.num;
        ids.extend(sorted_ids(&mut left.prims));
        ids.extend(sorted_ids(&mut right.prims));
        assert_eq!(PrimInfo::from_bag(&mut left.prims).num, left.info.num);
        assert_eq!(PrimInfo::from_bag(&mut right.prims).num, right.info.num);
    }
    ids.sort_unstable();

    assert_eq!(num, pinfo.num);
    assert_eq!(ids, expected);
}

#[test]
fn independent_nodes_split_in_parallel() {
    let mut rng = oorandom::Rand32::new(1234);
    let alloc = alloc(NUM_THREADS, 8);

    let nodes: Vec<_> = (0..NUM_THREADS)
        .map(|_| {
            let boxes: Vec<_> = (0..500).map(|_| random_aabb(&mut rng)).collect();
            let (mut prims, pinfo) = PrimRefListGen::generate(&boxes[..], &alloc);
            let ids = sorted_ids(&mut prims);
            (boxes, prims, pinfo, ids)
        })
        .collect();

    std::thread::scope(|s| {
        for (thread_index, (boxes, prims, pinfo, ids)) in nodes.iter().enumerate() {
            let alloc = &alloc;
            let _ = s.spawn(move || {
                let mut result = FallbackSplitter::split::<HeuristicBinning8, _>(
                    thread_index,
                    alloc,
                    &boxes[..],
                    prims,
                    pinfo,
                );

                assert_eq!(result.left.info.num, 250);
                assert_eq!(result.right.info.num, 250);

                let mut split_ids = sorted_ids(&mut result.left.prims);
                split_ids.extend(sorted_ids(&mut result.right.prims));
                split_ids.sort_unstable();
                assert_eq!(&split_ids, ids);

                alloc.recycle(thread_index, result.left.prims);
                alloc.recycle(thread_index, result.right.prims);
            });
        }
    });

    assert!(nodes.iter().all(|(_, prims, _, _)| prims.is_empty()));
}

#[test]
fn shared_bag_under_contention() {
    const PER_THREAD: usize = 2000;
    let alloc = alloc(NUM_THREADS, 4);
    let bag = PrimRefBag::new();

    std::thread::scope(|s| {
        for thread_index in 0..NUM_THREADS {
            let (alloc, bag) = (&alloc, &bag);
            let _ = s.spawn(move || {
                for i in 0..PER_THREAD {
                    let block = alloc.malloc(thread_index);
                    bag.insert(block);

                    if i % 3 == 0 {
                        if let Some(block) = bag.take() {
                            alloc.free(thread_index, block);
                        }
                    }
                }
            });
        }
    });

    let mut bag = bag;
    let remaining = bag.len();
    let taken = NUM_THREADS * PER_THREAD - remaining;
    assert!(taken <= NUM_THREADS * PER_THREAD.div_ceil(3));
    assert!(alloc.allocated_blocks() <= NUM_THREADS * PER_THREAD);
    assert!(alloc.allocated_blocks() >= remaining);
}
