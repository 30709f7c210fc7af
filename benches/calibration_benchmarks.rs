//! Benchmarks for calibration fits and the per-frame pipeline

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gaze_dwell::{
    calibration::{regression::fit, CalibrationSample, CaptureKind},
    config::Config,
    geometry::{Point, Rect, Viewport},
    page::{StaticPage, TargetId},
    pipeline::{FrameInput, Tracker},
    pose::PoseDelta,
    signal::{Detection, GazePrediction},
};
use rand::Rng;

fn samples(count: usize) -> Vec<CalibrationSample> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            let raw = Point::new(rng.gen_range(0.0..1280.0), rng.gen_range(0.0..720.0));
            let pose = PoseDelta::new(rng.gen_range(-0.1..0.1), rng.gen_range(-0.1..0.1), 0.0);
            #[allow(clippy::cast_precision_loss)]
            let timestamp = i as f64 * 250.0;
            CalibrationSample {
                raw,
                target: Point::new(1.1f64.mul_add(raw.x, 30.0), 0.9f64.mul_add(raw.y, 12.0)),
                pose,
                weight: 1.0,
                timestamp,
                kind: CaptureKind::Explicit,
            }
        })
        .collect()
}

fn benchmark_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("regression_fit");

    for count in [5usize, 20, 60, 200] {
        let data = samples(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &data, |b, data| {
            b.iter(|| black_box(fit(black_box(data), 1e-6, 45_000.0, 60_000.0)));
        });
    }

    group.finish();
}

fn benchmark_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");

    let mut page = StaticPage::new();
    for row in 0..6u32 {
        for col in 0..10u32 {
            let id = TargetId(u64::from(row * 10 + col));
            page.insert(id, Rect::new(f64::from(col) * 128.0, f64::from(row) * 120.0, 120.0, 110.0));
        }
    }

    let mut rng = rand::thread_rng();
    let frames: Vec<FrameInput> = (0..300u32)
        .map(|i| FrameInput {
            timestamp: f64::from(i) * 33.3,
            viewport: Viewport::new(1280.0, 720.0),
            detection: Detection {
                face: None,
                gaze: Some(GazePrediction {
                    x: 400.0 + rng.gen_range(-10.0..10.0),
                    y: 300.0 + rng.gen_range(-10.0..10.0),
                    score: 0.9,
                    normalized: false,
                }),
            },
            gesture_active: None,
        })
        .collect();

    group.bench_function("live_300_frames", |b| {
        b.iter(|| {
            let Ok(mut tracker) = Tracker::new(Config::default()) else {
                return;
            };
            tracker.start_live();
            for frame in &frames {
                black_box(tracker.process_frame(frame, &page));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_fit, benchmark_pipeline);
criterion_main!(benches);
