//! Calibration engine: maps the smoothed signal to screen coordinates.
//!
//! Two methods share one contract. Regression fits a weighted ridge model
//! from raw signal and pose delta to screen pixels. Range mapping scales the
//! signal by four directional ranges measured around a centre. Either way
//! [`CalibrationEngine::apply`] always yields a point inside the viewport.
//!
//! Samples come from capture sessions opened with
//! [`CalibrationEngine::begin_capture`] and closed by
//! [`CalibrationEngine::finalize`] or by their deadline.

/// Capture sessions
pub mod capture;

/// Directional range mapping
pub mod range;

/// Weighted ridge regression
pub mod regression;

pub use capture::{CaptureSession, CaptureTarget};
pub use range::{RangeCalibrator, RangeStep, StepOutcome};
pub use regression::{CalibrationTransform, RegressionCalibrator};

use crate::{
    config::CalibrationConfig,
    geometry::{Point, Viewport},
    pose::PoseDelta,
    Error, Result,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

/// Which calibration model maps the signal to the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationMethod {
    #[default]
    Regression,
    Range,
}

/// Origin of a calibration sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureKind {
    /// User looked at a calibration target on request
    #[default]
    Explicit,
    /// Captured passively while dwelling on a known element
    Refinement,
}

/// One averaged observation paired with its on-screen target
///
/// Immutable once created; only its decay factor changes with age.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationSample {
    pub raw: Point,
    pub target: Point,
    pub pose: PoseDelta,
    /// Capture, density and pose weight, before time decay
    pub weight: f64,
    pub timestamp: f64,
    pub kind: CaptureKind,
}

/// Why a fit or range step was not applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectReason {
    /// A pivot fell below the numerical tolerance
    Singular,
    /// A sample or the solution contained NaN or infinity
    NonFinite,
    /// Not enough samples to estimate the step
    TooFewSamples { have: usize, need: usize },
    /// The measured directional range is below the minimum
    RangeTooSmall { range: f64 },
}

/// Result of asking the regression model to refit
#[derive(Debug, Clone, PartialEq)]
pub enum FitOutcome {
    /// A new transform was installed
    Fitted(Arc<CalibrationTransform>),
    /// The fit failed; the previous transform stays in place
    Rejected(RejectReason),
    /// Inside the minimum refit interval; the fit runs on a later poll
    Throttled,
    /// Fewer samples than the minimum; nothing was fitted
    Insufficient { have: usize, need: usize },
}

impl FitOutcome {
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// Bounded ring buffer of calibration samples
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: VecDeque<CalibrationSample>,
    capacity: usize,
}

impl SampleBuffer {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Append a sample, evicting the oldest past the cap
    pub fn push(&mut self, sample: CalibrationSample) {
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Change the cap, evicting the oldest samples if needed
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &CalibrationSample> {
        self.samples.iter()
    }

    /// Copy of the current contents for fitting
    #[must_use]
    pub fn snapshot(&self) -> Vec<CalibrationSample> {
        self.samples.iter().copied().collect()
    }

    /// Number of stored samples with pairwise distinct raw points
    #[must_use]
    pub fn distinct_raw_count(&self, tolerance: f64) -> usize {
        let mut distinct: Vec<Point> = Vec::with_capacity(self.samples.len());
        for sample in &self.samples {
            if !distinct.iter().any(|p| p.distance(&sample.raw) <= tolerance) {
                distinct.push(sample.raw);
            }
        }
        distinct.len()
    }

    /// Number of stored samples whose target lies within `radius` of `point`
    #[must_use]
    pub fn neighbours_within(&self, point: Point, radius: f64) -> usize {
        self.samples
            .iter()
            .filter(|s| s.target.distance(&point) <= radius)
            .count()
    }
}

/// Weight of a new sample before time decay
///
/// Combines the capture-kind base weight, a bonus for sparsely covered
/// regions and a penalty for large pose deviation.
#[must_use]
#[allow(clippy::cast_precision_loss)] // neighbour counts are small
pub fn sample_weight(config: &CalibrationConfig, kind: CaptureKind, pose: &PoseDelta, neighbours: usize) -> f64 {
    let base = match kind {
        CaptureKind::Explicit => config.explicit_weight,
        CaptureKind::Refinement => config.refinement_weight,
    };
    let density = config.density_bonus / (1.0 + neighbours as f64);
    base * (1.0 + density) / config.pose_penalty.mul_add(pose.magnitude_squared(), 1.0)
}

/// Maps a filtered signal into screen space
pub trait ScreenMapping {
    /// Map a signal to a point clamped to the viewport
    fn map_to_screen(&self, signal: Point, pose: &PoseDelta, viewport: Viewport) -> Point;

    /// Whether the mapping is fitted or still a passthrough
    fn is_ready(&self) -> bool;
}

/// What closing a capture session produced
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// Discarded on request or because nothing was collected
    Discarded,
    /// A regression sample was added
    Regression(FitOutcome),
    /// A range step was recorded or rejected
    Range(StepOutcome),
}

/// Summary of a closed capture session
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureReport {
    pub target: CaptureTarget,
    pub kind: CaptureKind,
    /// Observations collected while the session was open
    pub observations: usize,
    /// Closed by its deadline instead of an explicit finalize
    pub timed_out: bool,
    pub outcome: CaptureOutcome,
}

/// Both calibration models plus the open capture session
#[derive(Debug, Clone)]
pub struct CalibrationEngine {
    config: CalibrationConfig,
    regression: RegressionCalibrator,
    range: RangeCalibrator,
    session: Option<CaptureSession>,
}

impl CalibrationEngine {
    #[must_use]
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            regression: RegressionCalibrator::new(config.clone()),
            range: RangeCalibrator::new(config.clone()),
            config,
            session: None,
        }
    }

    #[must_use]
    pub const fn method(&self) -> CalibrationMethod {
        self.config.method
    }

    /// Replace the configuration, keeping collected samples
    pub fn set_config(&mut self, config: CalibrationConfig) {
        self.regression.set_config(config.clone());
        self.range.set_config(config.clone());
        self.config = config;
    }

    /// Open a capture session, finalizing any session already open
    ///
    /// Screen targets belong to regression calibration and direction targets
    /// to range mapping; a mismatch is rejected.
    pub fn begin_capture(
        &mut self,
        target: CaptureTarget,
        kind: CaptureKind,
        window_ms: Option<f64>,
        now: f64,
    ) -> Result<Option<CaptureReport>> {
        match (self.config.method, target) {
            (CalibrationMethod::Regression, CaptureTarget::Screen(p)) if !p.is_finite() => {
                return Err(Error::InvalidInput(format!("Capture target must be finite, got {p:?}")));
            }
            (CalibrationMethod::Regression, CaptureTarget::Screen(_))
            | (CalibrationMethod::Range, CaptureTarget::Direction(_)) => {}
            (method, target) => {
                return Err(Error::CalibrationError(format!(
                    "{target:?} cannot be captured with {method:?} calibration"
                )));
            }
        }
        let window = window_ms.unwrap_or(self.config.capture_window_ms);
        if !(window.is_finite() && window > 0.0) {
            return Err(Error::InvalidInput(format!("Capture window must be positive, got {window}")));
        }

        let previous = self.session.take().map(|s| self.close(s, false, now, false));
        debug!("Capture opened for {target:?} ({kind:?}, {window:.0} ms)");
        self.session = Some(CaptureSession::new(target, kind, now, window));
        Ok(previous)
    }

    #[must_use]
    pub const fn is_capturing(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub const fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }

    /// Feed one observation to the open session, if any
    pub fn record(&mut self, raw: Point, pose: PoseDelta) {
        if let Some(session) = self.session.as_mut() {
            session.push(raw, pose);
        }
    }

    /// Close the open session; `discard` drops what it collected
    pub fn finalize(&mut self, discard: bool, now: f64) -> Option<CaptureReport> {
        let session = self.session.take()?;
        Some(self.close(session, discard, now, false))
    }

    /// Auto-finalize the open session once its deadline has passed
    pub fn expire(&mut self, now: f64) -> Option<CaptureReport> {
        if !self.session.as_ref().is_some_and(|s| s.is_expired(now)) {
            return None;
        }
        let session = self.session.take()?;
        if session.is_empty() {
            warn!("Capture for {:?} timed out with no observations, discarding", session.target());
        } else {
            warn!(
                "Capture for {:?} timed out, finalizing with {} observations",
                session.target(),
                session.len()
            );
        }
        Some(self.close(session, false, now, true))
    }

    /// Run a throttled regression fit that is now due
    pub fn poll_fit(&mut self, now: f64) -> Option<FitOutcome> {
        match self.config.method {
            CalibrationMethod::Regression => self.regression.poll(now),
            CalibrationMethod::Range => None,
        }
    }

    /// Add a passive refinement sample at a known target
    pub fn add_refinement(&mut self, raw: Point, pose: PoseDelta, target: Point, now: f64) -> Option<FitOutcome> {
        if self.config.method != CalibrationMethod::Regression || !raw.is_finite() || !target.is_finite() {
            return None;
        }
        Some(self.regression.add_observation(raw, target, pose, CaptureKind::Refinement, now))
    }

    /// Map a signal to the screen with the active model
    #[must_use]
    pub fn apply(&self, signal: Point, pose: &PoseDelta, viewport: Viewport) -> Point {
        self.mapping().map_to_screen(signal, pose, viewport)
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.mapping().is_ready()
    }

    /// Collected samples for regression, completed steps for range mapping
    #[must_use]
    pub fn sample_count(&self) -> usize {
        match self.config.method {
            CalibrationMethod::Regression => self.regression.sample_count(),
            CalibrationMethod::Range => self.range.steps_completed(),
        }
    }

    /// Snapshot of the current regression transform
    #[must_use]
    pub fn transform(&self) -> Arc<CalibrationTransform> {
        self.regression.transform()
    }

    #[must_use]
    pub const fn regression(&self) -> &RegressionCalibrator {
        &self.regression
    }

    #[must_use]
    pub const fn range(&self) -> &RangeCalibrator {
        &self.range
    }

    /// Drop all samples, steps and any open session
    pub fn reset(&mut self) {
        self.regression.reset();
        self.range.reset();
        self.session = None;
    }

    fn mapping(&self) -> &dyn ScreenMapping {
        match self.config.method {
            CalibrationMethod::Regression => self.regression.current(),
            CalibrationMethod::Range => &self.range,
        }
    }

    fn close(&mut self, session: CaptureSession, discard: bool, now: f64, timed_out: bool) -> CaptureReport {
        let observations = session.len();
        let outcome = if discard {
            CaptureOutcome::Discarded
        } else {
            match session.target() {
                CaptureTarget::Screen(target) => match session.average() {
                    Some((raw, pose)) => CaptureOutcome::Regression(self.regression.add_observation(
                        raw,
                        target,
                        pose,
                        session.kind(),
                        now,
                    )),
                    None => CaptureOutcome::Discarded,
                },
                CaptureTarget::Direction(step) => {
                    if session.is_empty() {
                        CaptureOutcome::Discarded
                    } else {
                        let recent = session.recent_raw(self.config.range_samples_per_step);
                        CaptureOutcome::Range(self.range.record_step(step, &recent))
                    }
                }
            }
        };
        debug!("Capture closed for {:?}: {outcome:?}", session.target());
        CaptureReport {
            target: session.target(),
            kind: session.kind(),
            observations,
            timed_out,
            outcome,
        }
    }
}
