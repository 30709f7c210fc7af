//! Stability gate behaviour over realistic point streams

use gaze_dwell::{
    config::StabilityConfig,
    geometry::{PointSample, Viewport},
    stability::{Hysteresis, StabilityGate},
};

fn jittered(i: u32, amplitude: f64) -> PointSample {
    let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
    PointSample::new(600.0 + sign * amplitude, 400.0 + sign * amplitude, f64::from(i) * 33.0)
}

#[test]
fn test_fast_oscillation_never_flips() {
    let mut h = Hysteresis::new(120.0, 220.0);
    for i in 0..100u32 {
        // Raw value flips every 50 ms, faster than either debounce
        let raw = (i / 2) % 2 == 0;
        assert!(!h.update(raw, f64::from(i) * 25.0));
    }
    assert_eq!(h.changed_at(), None);

    let mut h = Hysteresis::new(120.0, 220.0);
    h.update(true, 0.0);
    assert!(h.update(true, 200.0));
    for i in 0..100u32 {
        let raw = (i / 2) % 2 == 1;
        assert!(h.update(raw, f64::from(i).mul_add(25.0, 300.0)));
    }
}

#[test]
fn test_sweep_is_unstable() {
    let mut gate = StabilityGate::new(StabilityConfig::default());
    let viewport = Viewport::new(1920.0, 1080.0);
    for i in 0..16u32 {
        let x = f64::from(i).mul_add(100.0, 100.0);
        let t = f64::from(i) * 33.0;
        assert!(!gate.update(PointSample::new(x, 500.0, t), viewport, 0));
    }
    let report = gate.report().unwrap();
    assert!(report.speed > report.speed_limit);
}

#[test]
fn test_single_spike_keeps_stability() {
    let mut gate = StabilityGate::new(StabilityConfig::default());
    let viewport = Viewport::new(1920.0, 1080.0);
    for i in 0..30 {
        gate.update(jittered(i, 1.0), viewport, 0);
    }
    assert!(gate.is_stable());

    let spike = PointSample::new(1100.0, 400.0, 30.0 * 33.0);
    assert!(gate.update(spike, viewport, 0));
    for i in 31..40 {
        assert!(gate.update(jittered(i, 1.0), viewport, 0));
    }
}

#[test]
fn test_limits_scale_with_viewport() {
    let config = StabilityConfig::default();
    let mut large = StabilityGate::new(config.clone());
    let mut small = StabilityGate::new(config);
    for i in 0..30 {
        large.update(jittered(i, 10.0), Viewport::new(1920.0, 1080.0), 0);
        small.update(jittered(i, 10.0), Viewport::new(320.0, 240.0), 0);
    }
    assert!(large.is_stable());
    assert!(!small.is_stable());
}

#[test]
fn test_missing_frames_age_out_window() {
    let mut gate = StabilityGate::new(StabilityConfig::default());
    let viewport = Viewport::new(1920.0, 1080.0);
    for i in 0..30 {
        gate.update(jittered(i, 1.0), viewport, 0);
    }
    assert!(gate.is_stable());

    // Once the window empties, stability is lost after the exit delay
    let last = 29.0 * 33.0;
    assert!(gate.tick(last + 800.0, viewport, 0));
    assert!(!gate.tick(last + 1100.0, viewport, 0));
    assert!(gate.window().is_empty());
}
