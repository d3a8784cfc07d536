use criterion::{Criterion, criterion_group, criterion_main};
use grid_waldo_core::{CellIndex, CellSet, HighlightPathGenerator, RandomWalkPath, shortest_path};
use rand::{SeedableRng, rngs::SmallRng};
use std::hint::black_box;

fn bench_highlight_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("highlight_path");

    group.bench_function("all_targets", |b| {
        let mut rng = SmallRng::seed_from_u64(0x5eed);
        b.iter(|| {
            for target in CellIndex::all() {
                black_box(RandomWalkPath::new(&mut rng).generate(black_box(target)));
            }
        })
    });

    group.bench_function("long_walk", |b| {
        let mut rng = SmallRng::seed_from_u64(0x5eed);
        let target = CellIndex::new(4).expect("center is on the grid");
        b.iter(|| {
            black_box(
                RandomWalkPath::new(&mut rng)
                    .with_walk_length(8)
                    .generate(target),
            )
        })
    });

    group.bench_function("shortest_path_corner_to_corner", |b| {
        let from = CellIndex::new(0).expect("corner is on the grid");
        let to = CellIndex::new(8).expect("corner is on the grid");
        b.iter(|| black_box(shortest_path(black_box(from), black_box(to), CellSet::empty())))
    });

    group.finish();
}

criterion_group!(benches, bench_highlight_path);
criterion_main!(benches);
