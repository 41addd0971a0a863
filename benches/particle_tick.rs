//! # Eruption Tick Benchmark
//!
//! Cost of one full frame (stage machine, activation, five particle pools,
//! feedback) with every eruption subsystem active at default pool sizes.
//!
//! Run with: `cargo bench --bench particle_tick`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use volcano_sim::{Stage, SubsystemKind, VolcanoSim};

const FRAME: f32 = 1.0 / 60.0;

/// A simulation sitting in the eruption stage.
fn erupting_sim() -> VolcanoSim {
    let mut sim = VolcanoSim::new();
    sim.set_auto_demo(true);
    for _ in 0..(20 * 60) {
        if sim.stage() == Stage::Erupting {
            break;
        }
        sim.step(FRAME);
    }
    sim
}

fn bench_eruption_frame(c: &mut Criterion) {
    let mut sim = erupting_sim();
    c.bench_function("eruption_frame", |b| {
        b.iter(|| {
            sim.step(black_box(FRAME));
        });
    });
}

fn bench_render_export(c: &mut Criterion) {
    let sim = erupting_sim();
    let mut group = c.benchmark_group("render_export");
    for kind in SubsystemKind::ALL {
        let mut buffer = Vec::new();
        group.bench_with_input(BenchmarkId::from_parameter(kind.label()), &kind, |b, &kind| {
            b.iter(|| {
                sim.write_render_buffer(kind, &mut buffer);
                black_box(buffer.len())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_eruption_frame, bench_render_export);
criterion_main!(benches);
