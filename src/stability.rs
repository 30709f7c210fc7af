//! Stability gate for the calibrated point stream.
//!
//! A rolling window of recent screen points is judged "stable now" when its
//! robust dispersion and trimmed speed stay under thresholds that scale with
//! the viewport. The visible flag follows that judgement only through a
//! time-based hysteresis.

use crate::{
    config::StabilityConfig,
    constants::{MAD_TO_SIGMA, MIN_FILTER_DT_MS, SPEED_TRIM_FRACTION},
    filters::median::MedianFilter,
    geometry::{PointSample, PointWindow, Viewport},
};
use log::debug;

/// Median absolute deviation scaled to match a standard deviation
#[must_use]
pub fn robust_dispersion(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let median = MedianFilter::median(values);
    let deviations: Vec<f64> = values.iter().map(|v| (v - median).abs()).collect();
    MAD_TO_SIGMA * MedianFilter::median(&deviations)
}

/// Mean after dropping `floor(n * fraction)` values from each end
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)] // window sizes are small
pub fn trimmed_mean(values: &[f64], fraction: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let trim = ((sorted.len() as f64) * fraction).floor() as usize;
    let kept = &sorted[trim..sorted.len() - trim];
    if kept.is_empty() {
        return MedianFilter::median(&sorted);
    }
    kept.iter().sum::<f64>() / kept.len() as f64
}

/// Frame-to-frame speeds in pixels per second
fn speeds(samples: &[PointSample]) -> Vec<f64> {
    samples
        .windows(2)
        .map(|pair| {
            let dt = (pair[1].timestamp - pair[0].timestamp).max(MIN_FILTER_DT_MS);
            pair[1].point().distance(&pair[0].point()) / (dt / 1000.0)
        })
        .collect()
}

/// Statistics behind one stability judgement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilityReport {
    pub samples: usize,
    pub dispersion_x: f64,
    pub dispersion_y: f64,
    /// Trimmed mean speed in pixels per second
    pub speed: f64,
    pub dispersion_limit: f64,
    pub speed_limit: f64,
    pub stable_now: bool,
}

impl StabilityReport {
    /// Larger of the two axis dispersions
    #[must_use]
    pub fn dispersion(&self) -> f64 {
        self.dispersion_x.max(self.dispersion_y)
    }
}

/// Evaluate a window against viewport-scaled thresholds
#[must_use]
pub fn evaluate(samples: &[PointSample], config: &StabilityConfig, viewport: Viewport, factor: f64) -> StabilityReport {
    let diagonal = viewport.diagonal();
    let dispersion_limit = diagonal * config.dispersion_fraction * factor;
    let speed_limit = diagonal * config.speed_fraction * factor;

    if samples.len() < config.min_samples {
        return StabilityReport {
            samples: samples.len(),
            dispersion_x: 0.0,
            dispersion_y: 0.0,
            speed: 0.0,
            dispersion_limit,
            speed_limit,
            stable_now: false,
        };
    }

    let xs: Vec<f64> = samples.iter().map(|s| s.x).collect();
    let ys: Vec<f64> = samples.iter().map(|s| s.y).collect();
    let dispersion_x = robust_dispersion(&xs);
    let dispersion_y = robust_dispersion(&ys);
    let speed = trimmed_mean(&speeds(samples), SPEED_TRIM_FRACTION);

    StabilityReport {
        samples: samples.len(),
        dispersion_x,
        dispersion_y,
        speed,
        dispersion_limit,
        speed_limit,
        stable_now: dispersion_x <= dispersion_limit && dispersion_y <= dispersion_limit && speed <= speed_limit,
    }
}

/// Debounced boolean: flips only after the raw value holds long enough
#[derive(Debug, Clone)]
pub struct Hysteresis {
    enter_ms: f64,
    exit_ms: f64,
    state: bool,
    /// When the raw value started disagreeing with `state`
    candidate_since: Option<f64>,
    /// When `state` last changed
    changed_at: Option<f64>,
}

impl Hysteresis {
    #[must_use]
    pub const fn new(enter_ms: f64, exit_ms: f64) -> Self {
        Self {
            enter_ms,
            exit_ms,
            state: false,
            candidate_since: None,
            changed_at: None,
        }
    }

    /// Feed the raw value observed at `now` and return the debounced state
    pub fn update(&mut self, raw: bool, now: f64) -> bool {
        if raw == self.state {
            self.candidate_since = None;
            return self.state;
        }
        let since = *self.candidate_since.get_or_insert(now);
        let required = if raw { self.enter_ms } else { self.exit_ms };
        if now - since >= required {
            self.state = raw;
            self.candidate_since = None;
            self.changed_at = Some(now);
        }
        self.state
    }

    #[must_use]
    pub const fn state(&self) -> bool {
        self.state
    }

    /// Time of the last flip, if any
    #[must_use]
    pub const fn changed_at(&self) -> Option<f64> {
        self.changed_at
    }

    pub fn reset(&mut self) {
        self.state = false;
        self.candidate_since = None;
        self.changed_at = None;
    }
}

/// Rolling-window stability judgement with hysteresis
#[derive(Debug, Clone)]
pub struct StabilityGate {
    config: StabilityConfig,
    window: PointWindow,
    hysteresis: Hysteresis,
    report: Option<StabilityReport>,
}

impl StabilityGate {
    #[must_use]
    pub fn new(config: StabilityConfig) -> Self {
        Self {
            window: PointWindow::new(config.window_size, config.window_ms),
            hysteresis: Hysteresis::new(config.enter_ms, config.exit_ms),
            config,
            report: None,
        }
    }

    /// Threshold multiplier for the given number of calibration samples
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // sample counts are small
    pub fn threshold_factor(&self, calibration_samples: usize) -> f64 {
        if self.config.tighten_after_samples == 0 {
            return self.config.tightened_factor;
        }
        let progress = (calibration_samples as f64 / self.config.tighten_after_samples as f64).min(1.0);
        (self.config.tightened_factor - 1.0).mul_add(progress, 1.0)
    }

    /// Add a point and return the debounced stability flag
    pub fn update(&mut self, sample: PointSample, viewport: Viewport, calibration_samples: usize) -> bool {
        self.window.push(sample);
        self.judge(sample.timestamp, viewport, calibration_samples)
    }

    /// Age out the window on a frame without a point
    pub fn tick(&mut self, now: f64, viewport: Viewport, calibration_samples: usize) -> bool {
        self.window.evict_older_than(now);
        self.judge(now, viewport, calibration_samples)
    }

    fn judge(&mut self, now: f64, viewport: Viewport, calibration_samples: usize) -> bool {
        let samples: Vec<PointSample> = self.window.iter().copied().collect();
        let report = evaluate(&samples, &self.config, viewport, self.threshold_factor(calibration_samples));
        let before = self.hysteresis.state();
        let after = self.hysteresis.update(report.stable_now, now);
        if before != after {
            debug!(
                "Stability {} (dispersion {:.1}/{:.1} px, speed {:.0}/{:.0} px/s)",
                if after { "gained" } else { "lost" },
                report.dispersion(),
                report.dispersion_limit,
                report.speed,
                report.speed_limit
            );
        }
        self.report = Some(report);
        after
    }

    #[must_use]
    pub const fn is_stable(&self) -> bool {
        self.hysteresis.state()
    }

    /// Statistics from the latest judgement
    #[must_use]
    pub const fn report(&self) -> Option<&StabilityReport> {
        self.report.as_ref()
    }

    #[must_use]
    pub const fn window(&self) -> &PointWindow {
        &self.window
    }

    pub fn set_config(&mut self, config: StabilityConfig) {
        *self = Self::new(config);
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.hysteresis.reset();
        self.report = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_robust_dispersion_ignores_outlier() {
        let values = [10.0, 11.0, 9.0, 10.0, 10.5, 9.5, 500.0];
        let dispersion = robust_dispersion(&values);
        assert!(dispersion < 2.0, "dispersion {dispersion}");
        assert_eq!(robust_dispersion(&[]), 0.0);
    }

    #[test]
    fn test_trimmed_mean_drops_extremes() {
        let mut values: Vec<f64> = (1..=10).map(f64::from).collect();
        values[9] = 1000.0;
        // One value dropped from each end of ten
        assert!((trimmed_mean(&values, 0.1) - 5.5).abs() < 1e-12);
        assert!((trimmed_mean(&[4.0, 6.0], 0.1) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_hysteresis_enter_and_exit() {
        let mut h = Hysteresis::new(100.0, 200.0);
        assert!(!h.update(true, 0.0));
        assert!(!h.update(true, 99.0));
        assert!(h.update(true, 100.0));
        assert!(h.update(false, 150.0));
        assert!(h.update(false, 349.0));
        assert!(!h.update(false, 350.0));
        assert_eq!(h.changed_at(), Some(350.0));
    }

    #[test]
    fn test_threshold_factor_tightens() {
        let gate = StabilityGate::new(StabilityConfig::default());
        assert!((gate.threshold_factor(0) - 1.0).abs() < 1e-12);
        assert!(gate.threshold_factor(6) < 1.0);
        assert!((gate.threshold_factor(12) - 0.7).abs() < 1e-12);
        assert!((gate.threshold_factor(100) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_too_few_samples_never_stable() {
        let mut gate = StabilityGate::new(StabilityConfig::default());
        let viewport = Viewport::default();
        for i in 0..5 {
            let t = f64::from(i) * 100.0;
            assert!(!gate.update(PointSample::new(500.0, 500.0, t), viewport, 0));
        }
        assert!(gate.report().is_some_and(|r| !r.stable_now));
    }

    #[test]
    fn test_steady_points_become_stable() {
        let mut gate = StabilityGate::new(StabilityConfig::default());
        let viewport = Viewport::default();
        let mut stable = false;
        for i in 0..40 {
            let t = f64::from(i) * 33.0;
            let jitter = if i % 2 == 0 { 1.0 } else { -1.0 };
            stable = gate.update(PointSample::new(600.0 + jitter, 400.0 - jitter, t), viewport, 0);
        }
        assert!(stable);
    }
}
