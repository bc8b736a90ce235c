use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use wr_core::belief::Belief;
use wr_core::catalog::Catalog;
use wr_core::config::PlannerConfig;
use wr_mcts::Planner;

fn bench_plan_fresh_hole(c: &mut Criterion) {
    let planner = Planner::new(Catalog::standard(), PlannerConfig::default()).unwrap();
    let belief = Belief::new(1800.0, 2200.0).unwrap();

    c.bench_function("plan_10k_fresh_hole", |b| {
        b.iter(|| {
            let mut rng = ChaCha8Rng::seed_from_u64(0);
            let tree = planner
                .plan(black_box(belief), black_box(0.0), 10_000, &mut rng)
                .unwrap();
            black_box(planner.action_results(&tree))
        })
    });
}

fn bench_plan_narrow_hole(c: &mut Criterion) {
    // Narrow remaining range: short playouts, more root-level churn.
    let planner = Planner::new(Catalog::standard(), PlannerConfig::default()).unwrap();
    let belief = Belief::new(100.0, 200.0).unwrap();

    c.bench_function("plan_10k_narrow_hole", |b| {
        b.iter(|| {
            let mut rng = ChaCha8Rng::seed_from_u64(0);
            black_box(
                planner
                    .plan(black_box(belief), black_box(0.0), 10_000, &mut rng)
                    .unwrap(),
            )
        })
    });
}

criterion_group!(benches, bench_plan_fresh_hole, bench_plan_narrow_hole);
criterion_main!(benches);
