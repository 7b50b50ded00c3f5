use std::time::Duration;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use umbra_geom::{Rect, Segment, Vec2};
use umbra_movement::{
    CancelToken, EdgeOracle, Generation, Graph, Lattice, SearchControl, SearchLimits,
    smooth_path, weighted_astar,
};

struct Walls(Vec<Segment>);

impl EdgeOracle for Walls {
    fn edge_cost(&self, a: Vec2, b: Vec2) -> Option<f32> {
        let seg = Segment::new(a, b);
        self.0
            .iter()
            .all(|w| seg.intersect(w).is_none())
            .then(|| a.distance(b))
    }
}

fn run(walls: &Walls, lattice: Lattice, start: Vec2, end: Vec2, bounds: Rect) -> Option<Vec<Vec2>> {
    let mut graph = Graph::new(lattice, start, end, bounds, 200_000);
    let cancel = CancelToken::new();
    let generation = Generation::new();
    let control = SearchControl {
        cancel: &cancel,
        generation: &generation,
        started_at: generation.current(),
    };
    let limits = SearchLimits {
        weight: 1.15,
        max_iterations: 1_000_000,
    };
    weighted_astar(&mut graph, walls, lattice.heuristic(), limits, &control)
        .0
        .ok()
}

/// Comb of vertical walls alternately open at the top and bottom.
fn serpentine(n: usize, step: f32, height: f32) -> Vec<Segment> {
    (0..n)
        .map(|i| {
            let x = (i as f32 + 1.0) * step * 4.0 + step * 0.5;
            if i % 2 == 0 {
                Segment::new(Vec2::new(x, 0.0), Vec2::new(x, height - step * 2.0))
            } else {
                Segment::new(Vec2::new(x, step * 2.0), Vec2::new(x, height))
            }
        })
        .collect()
}

fn bench_open_field(c: &mut Criterion) {
    let mut group = c.benchmark_group("astar_open");
    let walls = Walls(Vec::new());
    let bounds = Rect::new(0.0, 0.0, 6000.0, 6000.0);
    let start = Vec2::new(50.0, 50.0);
    let end = Vec2::new(5950.0, 4050.0);
    group.bench_function("square8_60x60", |b| {
        b.iter(|| black_box(run(&walls, Lattice::Square8 { step: 100.0 }, start, end, bounds)))
    });
    group.bench_function("hex_60x60", |b| {
        let hex = Lattice::Hex {
            step: 100.0,
            columns: false,
        };
        b.iter(|| black_box(run(&walls, hex, start, end, bounds)))
    });
    group.finish();
}

fn bench_serpentine(c: &mut Criterion) {
    let mut group = c.benchmark_group("astar_walled");
    let walls = Walls(serpentine(12, 100.0, 4000.0));
    let bounds = Rect::new(0.0, 0.0, 5400.0, 4000.0);
    let start = Vec2::new(50.0, 2050.0);
    let end = Vec2::new(5350.0, 2050.0);
    group.bench_function("serpentine_12", |b| {
        b.iter(|| black_box(run(&walls, Lattice::Square8 { step: 100.0 }, start, end, bounds)))
    });
    let path = run(&walls, Lattice::Square8 { step: 100.0 }, start, end, bounds).unwrap_or_default();
    group.bench_function("smooth_serpentine_12", |b| {
        b.iter(|| black_box(smooth_path(&path, &walls)))
    });
    group.finish();
}

fn config() -> Criterion {
    Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .warm_up_time(Duration::from_secs(3))
        .sample_size(20)
}

criterion_group! {
    name = benches;
    config = config();
    targets = bench_open_field, bench_serpentine
}
criterion_main!(benches);
