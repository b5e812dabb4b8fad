//! # Trajectory Batcher Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use arm_lib::arm_ctrl::{
    ElbowPolicy, LinkLengths, MotorAxisSpec, RoundingPolicy, SpatialSolver, StepQuantiser,
    TargetPoint, TrajectoryBatcher,
};

fn batcher_benchmark(c: &mut Criterion) {
    // ---- Build the batcher for the reference arm ----

    let links = LinkLengths::new(21.0, 15.0).unwrap();
    let solver = SpatialSolver::new(links, ElbowPolicy::default()).unwrap();

    let axes = vec![
        MotorAxisSpec {
            joint: 2,
            steps_per_rev: 800,
            reversed: true,
        },
        MotorAxisSpec {
            joint: 0,
            steps_per_rev: 800,
            reversed: false,
        },
        MotorAxisSpec {
            joint: 1,
            steps_per_rev: 1600,
            reversed: false,
        },
    ];

    // A helix around the base, partly out of reach
    let targets: Vec<TargetPoint> = (0..1000)
        .map(|i| {
            let t = i as f64 * 0.01;
            TargetPoint::spatial(25.0 * (3.0 * t).cos(), 25.0 * (3.0 * t).sin(), 4.0 * t - 20.0)
        })
        .collect();

    for policy in [RoundingPolicy::Truncate, RoundingPolicy::CarryRemainder].iter() {
        let quantiser = StepQuantiser::new(axes.clone(), *policy, 3).unwrap();
        let batcher = TrajectoryBatcher::new(Box::new(solver.clone()), quantiser).unwrap();

        c.bench_function(&format!("TrajectoryBatcher::plan::{:?}", policy), |b| {
            b.iter(|| batcher.plan(black_box(&targets)).unwrap())
        });
    }
}

criterion_group!(benches, batcher_benchmark);
criterion_main!(benches);
