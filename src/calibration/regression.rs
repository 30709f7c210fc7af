//! Weighted ridge regression calibration.
//!
//! Each screen axis is a linear combination of five features: raw x, raw y,
//! yaw delta, pitch delta and a bias. Both axes share one normal-equations
//! matrix and are solved together by Gaussian elimination with partial
//! pivoting.

use super::{sample_weight, CalibrationSample, CaptureKind, FitOutcome, RejectReason, SampleBuffer, ScreenMapping};
use crate::{
    config::CalibrationConfig,
    constants::{DISTINCT_SAMPLE_TOLERANCE, PIVOT_TOLERANCE, REGRESSION_FEATURES},
    geometry::{Point, Viewport},
    pose::PoseDelta,
};
use log::{debug, info, warn};
use nalgebra::{SMatrix, Vector5};
use std::sync::Arc;

/// Feature vector `[raw_x, raw_y, yaw, pitch, 1]`
pub type Features = Vector5<f64>;

/// One row of coefficients per screen axis
pub type Coefficients = SMatrix<f64, 2, REGRESSION_FEATURES>;

type NormalMatrix = SMatrix<f64, REGRESSION_FEATURES, REGRESSION_FEATURES>;
type Solution = SMatrix<f64, REGRESSION_FEATURES, 2>;

const BIAS: usize = REGRESSION_FEATURES - 1;

#[must_use]
pub fn features(raw: Point, pose: &PoseDelta) -> Features {
    Features::new(raw.x, raw.y, pose.yaw, pose.pitch, 1.0)
}

/// Ridge magnitude for `sample_count` samples
///
/// Constant up to `threshold`, then shrinks with the square of the ratio.
#[must_use]
#[allow(clippy::cast_precision_loss)] // sample counts are capped far below 2^52
pub fn ridge_lambda(sample_count: usize, base: f64, threshold: usize) -> f64 {
    if sample_count <= threshold {
        base
    } else {
        let ratio = threshold as f64 / sample_count as f64;
        base * ratio * ratio
    }
}

/// Exponential decay factor for a sample of the given age
#[must_use]
pub fn time_decay(age_ms: f64, half_life_ms: f64) -> f64 {
    0.5f64.powf(age_ms.max(0.0) / half_life_ms)
}

/// A fitted mapping, shared as an immutable snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTransform {
    pub coefficients: Coefficients,
    /// False until a fit succeeds; apply is then a clamped passthrough
    pub ready: bool,
    /// Samples used by the fit
    pub sample_count: usize,
    /// Weighted RMS distance between fitted and target points
    pub residual_rms: f64,
    pub fitted_at: Option<f64>,
}

impl Default for CalibrationTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl CalibrationTransform {
    /// Unfitted passthrough transform
    #[must_use]
    pub fn identity() -> Self {
        let mut coefficients = Coefficients::zeros();
        coefficients[(0, 0)] = 1.0;
        coefficients[(1, 1)] = 1.0;
        Self {
            coefficients,
            ready: false,
            sample_count: 0,
            residual_rms: 0.0,
            fitted_at: None,
        }
    }

    /// Evaluate the mapping without clamping
    #[must_use]
    pub fn map(&self, raw: Point, pose: &PoseDelta) -> Point {
        let out = self.coefficients * features(raw, pose);
        Point::new(out[0], out[1])
    }
}

impl ScreenMapping for CalibrationTransform {
    fn map_to_screen(&self, signal: Point, pose: &PoseDelta, viewport: Viewport) -> Point {
        if self.ready {
            viewport.clamp(self.map(signal, pose))
        } else {
            viewport.clamp(signal)
        }
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}

/// Fit a transform to `samples` with the given ridge, decaying weights by age
///
/// The ridge is added to every feature except the bias.
pub fn fit(
    samples: &[CalibrationSample],
    ridge: f64,
    half_life_ms: f64,
    now: f64,
) -> Result<CalibrationTransform, RejectReason> {
    if samples.is_empty() {
        return Err(RejectReason::TooFewSamples { have: 0, need: 1 });
    }

    let mut normal = NormalMatrix::zeros();
    let mut rhs = Solution::zeros();
    let mut weights = Vec::with_capacity(samples.len());

    for sample in samples {
        let w = sample.weight * time_decay(now - sample.timestamp, half_life_ms);
        let f = features(sample.raw, &sample.pose);
        if !(w.is_finite() && f.iter().all(|v| v.is_finite()) && sample.target.is_finite()) {
            return Err(RejectReason::NonFinite);
        }
        normal += f * f.transpose() * w;
        for i in 0..REGRESSION_FEATURES {
            rhs[(i, 0)] += w * f[i] * sample.target.x;
            rhs[(i, 1)] += w * f[i] * sample.target.y;
        }
        weights.push(w);
    }
    for i in 0..BIAS {
        normal[(i, i)] += ridge;
    }

    let solution = solve(normal, rhs).ok_or(RejectReason::Singular)?;
    let coefficients = solution.transpose();
    if !coefficients.iter().all(|v| v.is_finite()) {
        return Err(RejectReason::NonFinite);
    }

    let mut transform = CalibrationTransform {
        coefficients,
        ready: true,
        sample_count: samples.len(),
        residual_rms: 0.0,
        fitted_at: Some(now),
    };

    let (weighted_sq, total_weight) = samples.iter().zip(&weights).fold((0.0, 0.0), |(sq, total), (s, w)| {
        let d = transform.map(s.raw, &s.pose).distance(&s.target);
        ((w * d).mul_add(d, sq), total + w)
    });
    if total_weight > 0.0 {
        transform.residual_rms = (weighted_sq / total_weight).sqrt();
    }
    Ok(transform)
}

/// Gaussian elimination with partial pivoting for both right-hand sides
fn solve(mut a: NormalMatrix, mut b: Solution) -> Option<Solution> {
    let n = REGRESSION_FEATURES;
    for col in 0..n {
        let pivot_row = (col..n).max_by(|&i, &j| a[(i, col)].abs().total_cmp(&a[(j, col)].abs()))?;
        if a[(pivot_row, col)].abs() < PIVOT_TOLERANCE {
            return None;
        }
        if pivot_row != col {
            a.swap_rows(col, pivot_row);
            b.swap_rows(col, pivot_row);
        }
        let pivot = a[(col, col)];
        for row in col + 1..n {
            let factor = a[(row, col)] / pivot;
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                let delta = factor * a[(col, k)];
                a[(row, k)] -= delta;
            }
            for k in 0..2 {
                let delta = factor * b[(col, k)];
                b[(row, k)] -= delta;
            }
        }
    }

    let mut x = Solution::zeros();
    for k in 0..2 {
        for row in (0..n).rev() {
            let mut acc = b[(row, k)];
            for c in row + 1..n {
                acc -= a[(row, c)] * x[(c, k)];
            }
            x[(row, k)] = acc / a[(row, row)];
        }
    }
    x.iter().all(|v| v.is_finite()).then_some(x)
}

/// Online regression calibrator with a throttled refit
#[derive(Debug, Clone)]
pub struct RegressionCalibrator {
    config: CalibrationConfig,
    samples: SampleBuffer,
    transform: Arc<CalibrationTransform>,
    last_fit_at: Option<f64>,
    pending: bool,
}

impl RegressionCalibrator {
    #[must_use]
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            samples: SampleBuffer::new(config.max_samples),
            config,
            transform: Arc::new(CalibrationTransform::identity()),
            last_fit_at: None,
            pending: false,
        }
    }

    pub fn set_config(&mut self, config: CalibrationConfig) {
        self.samples.set_capacity(config.max_samples);
        self.config = config;
    }

    /// Weight a new observation, store it and refit if allowed
    pub fn add_observation(
        &mut self,
        raw: Point,
        target: Point,
        pose: PoseDelta,
        kind: CaptureKind,
        now: f64,
    ) -> FitOutcome {
        let neighbours = self.samples.neighbours_within(target, self.config.density_radius_px);
        let weight = sample_weight(&self.config, kind, &pose, neighbours);
        self.add_sample(
            CalibrationSample {
                raw,
                target,
                pose,
                weight,
                timestamp: now,
                kind,
            },
            now,
        )
    }

    /// Store a prepared sample and refit if allowed
    pub fn add_sample(&mut self, sample: CalibrationSample, now: f64) -> FitOutcome {
        self.samples.push(sample);
        self.refit(now)
    }

    /// Refit now unless throttled or short of distinct samples
    pub fn refit(&mut self, now: f64) -> FitOutcome {
        let have = self.samples.distinct_raw_count(DISTINCT_SAMPLE_TOLERANCE);
        let need = self.config.min_samples;
        if have < need {
            self.pending = false;
            return FitOutcome::Insufficient { have, need };
        }
        if let Some(last) = self.last_fit_at {
            if now - last < self.config.min_refit_interval_ms {
                debug!("Calibration fit throttled ({:.0} ms since last fit)", now - last);
                self.pending = true;
                return FitOutcome::Throttled;
            }
        }

        self.pending = false;
        self.last_fit_at = Some(now);
        let snapshot = self.samples.snapshot();
        let ridge = ridge_lambda(snapshot.len(), self.config.ridge_base, self.config.ridge_threshold);
        match fit(&snapshot, ridge, self.config.half_life_ms, now) {
            Ok(transform) => {
                if self.transform.ready {
                    debug!(
                        "Calibration refit on {} samples, residual {:.1} px",
                        transform.sample_count, transform.residual_rms
                    );
                } else {
                    info!(
                        "Calibration ready with {} samples, residual {:.1} px",
                        transform.sample_count, transform.residual_rms
                    );
                }
                let transform = Arc::new(transform);
                self.transform = Arc::clone(&transform);
                FitOutcome::Fitted(transform)
            }
            Err(reason) => {
                warn!("Calibration fit rejected ({reason:?}), keeping previous transform");
                FitOutcome::Rejected(reason)
            }
        }
    }

    /// Run a pending fit once the refit interval has passed
    pub fn poll(&mut self, now: f64) -> Option<FitOutcome> {
        if !self.pending {
            return None;
        }
        let due = self
            .last_fit_at
            .map_or(true, |last| now - last >= self.config.min_refit_interval_ms);
        due.then(|| self.refit(now))
    }

    /// Current transform snapshot
    #[must_use]
    pub fn transform(&self) -> Arc<CalibrationTransform> {
        Arc::clone(&self.transform)
    }

    #[must_use]
    pub fn current(&self) -> &CalibrationTransform {
        &self.transform
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.transform.ready
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending
    }

    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub const fn samples(&self) -> &SampleBuffer {
        &self.samples
    }

    /// Forget all samples and return to the passthrough transform
    pub fn reset(&mut self) {
        self.samples.clear();
        self.transform = Arc::new(CalibrationTransform::identity());
        self.last_fit_at = None;
        self.pending = false;
    }
}
