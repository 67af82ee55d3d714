use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use tofex_core::{EndReason, EntityId, EntityLookup, Hit, Pose, PoseSource, RayCaster, Vec3};
use tofex_experiment::{TrialConfig, TrialRecorder};
use tofex_timing::ManualClock;

// Constant wall two metres ahead of a stationary agent.
struct WallAhead;

impl RayCaster for WallAhead {
    fn cast(&self, origin: Vec3, direction: Vec3, _max_range: f32) -> Option<Hit> {
        Some(Hit::along(origin, direction, 2.0))
    }
}

impl PoseSource for WallAhead {
    fn pose(&self, _entity: EntityId) -> Option<Pose> {
        Some(Pose::default())
    }
}

impl EntityLookup for WallAhead {
    fn find_entity(&self, _name: &str) -> Option<EntityId> {
        Some(EntityId(0))
    }
}

fn harness(dir: &std::path::Path) -> TrialRecorder<ManualClock> {
    let config = TrialConfig {
        sample_hz: 1000.0,
        output_directory: dir.to_path_buf(),
        ..Default::default()
    };
    let mut recorder = TrialRecorder::tracking_agent(config, ManualClock::new(0.0))
        .expect("bench config is valid");
    recorder.start(&WallAhead, "bench").expect("bench start");
    recorder
}

fn bench_tick(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("tempdir");

    c.bench_function("tick_10k_frames", |b| {
        b.iter_batched(
            || harness(dir.path()),
            |mut recorder| {
                for i in 0..10_000 {
                    let _ = recorder.tick_at(black_box(i as f64 * 0.001), &WallAhead);
                }
                recorder
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("finalize_10k_rows", |b| {
        b.iter_batched(
            || {
                let mut recorder = harness(dir.path());
                for i in 0..10_000 {
                    let _ = recorder.tick_at(i as f64 * 0.001, &WallAhead);
                }
                recorder
            },
            |mut recorder| black_box(recorder.finalize(EndReason::ExternalStop)),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_tick);
criterion_main!(benches);
