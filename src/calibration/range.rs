//! Directional range mapping around a measured centre.

use super::{RejectReason, ScreenMapping};
use crate::{
    config::CalibrationConfig,
    geometry::{Point, Viewport},
    pose::PoseDelta,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// One directed-look step of range calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeStep {
    Center,
    Left,
    Right,
    Up,
    Down,
}

impl RangeStep {
    pub const ALL: [Self; 5] = [Self::Center, Self::Left, Self::Right, Self::Up, Self::Down];
}

/// Result of recording one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// Centre position or directional range now in use
    Accepted { step: RangeStep, value: f64 },
    Rejected { step: RangeStep, reason: RejectReason },
}

/// Per-direction linear scaling of the signal around its centre
#[derive(Debug, Clone)]
pub struct RangeCalibrator {
    config: CalibrationConfig,
    center: Option<Point>,
    left: Option<f64>,
    right: Option<f64>,
    up: Option<f64>,
    down: Option<f64>,
}

impl RangeCalibrator {
    #[must_use]
    pub const fn new(config: CalibrationConfig) -> Self {
        Self {
            config,
            center: None,
            left: None,
            right: None,
            up: None,
            down: None,
        }
    }

    pub fn set_config(&mut self, config: CalibrationConfig) {
        self.config = config;
    }

    /// Record a step from its most recent observations
    ///
    /// Directional steps are measured against the current centre. Recording
    /// the centre again discards every directional range.
    #[allow(clippy::cast_precision_loss)] // observation counts are small
    pub fn record_step(&mut self, step: RangeStep, observations: &[Point]) -> StepOutcome {
        let start = observations.len().saturating_sub(self.config.range_samples_per_step);
        let finite: Vec<Point> = observations[start..].iter().copied().filter(Point::is_finite).collect();
        if finite.len() < self.config.range_min_step_samples {
            return StepOutcome::Rejected {
                step,
                reason: RejectReason::TooFewSamples {
                    have: finite.len(),
                    need: self.config.range_min_step_samples,
                },
            };
        }
        let n = finite.len() as f64;
        let (sx, sy) = finite.iter().fold((0.0, 0.0), |(x, y), p| (x + p.x, y + p.y));
        let mean = Point::new(sx / n, sy / n);

        let center = self.center();
        let (range, slot) = match step {
            RangeStep::Center => {
                debug!("Range centre at ({:.3}, {:.3})", mean.x, mean.y);
                if self.steps_completed() > usize::from(self.center.is_some()) {
                    debug!("Range centre moved, directional steps cleared");
                }
                self.center = Some(mean);
                self.left = None;
                self.right = None;
                self.up = None;
                self.down = None;
                return StepOutcome::Accepted { step, value: 0.0 };
            }
            RangeStep::Left => (center.x - mean.x, &mut self.left),
            RangeStep::Right => (mean.x - center.x, &mut self.right),
            RangeStep::Up => (center.y - mean.y, &mut self.up),
            RangeStep::Down => (mean.y - center.y, &mut self.down),
        };
        if !(range.is_finite() && range >= self.config.min_range) {
            return StepOutcome::Rejected {
                step,
                reason: RejectReason::RangeTooSmall { range },
            };
        }

        *slot = Some(range);
        if self.is_complete() {
            info!(
                "Range calibration complete: left {:.3} right {:.3} up {:.3} down {:.3}",
                self.range_for(RangeStep::Left),
                self.range_for(RangeStep::Right),
                self.range_for(RangeStep::Up),
                self.range_for(RangeStep::Down)
            );
        }
        StepOutcome::Accepted { step, value: range }
    }

    /// Measured centre, or the origin before the centre step
    #[must_use]
    pub fn center(&self) -> Point {
        self.center.unwrap_or_default()
    }

    /// Range in use for a direction, falling back to the default range
    #[must_use]
    pub fn range_for(&self, step: RangeStep) -> f64 {
        let measured = match step {
            RangeStep::Center => None,
            RangeStep::Left => self.left,
            RangeStep::Right => self.right,
            RangeStep::Up => self.up,
            RangeStep::Down => self.down,
        };
        measured.unwrap_or(self.config.default_range)
    }

    #[must_use]
    pub fn steps_completed(&self) -> usize {
        [self.center.map(|_| 0.0), self.left, self.right, self.up, self.down]
            .iter()
            .filter(|s| s.is_some())
            .count()
    }

    fn is_complete(&self) -> bool {
        self.steps_completed() == RangeStep::ALL.len()
    }

    pub fn reset(&mut self) {
        let config = self.config.clone();
        *self = Self::new(config);
    }
}

fn scale(delta: f64, negative_range: f64, positive_range: f64) -> f64 {
    let range = if delta < 0.0 { negative_range } else { positive_range };
    (delta / range).clamp(-1.0, 1.0)
}

impl ScreenMapping for RangeCalibrator {
    fn map_to_screen(&self, signal: Point, _pose: &PoseDelta, viewport: Viewport) -> Point {
        let center = self.center();
        let nx = scale(
            signal.x - center.x,
            self.range_for(RangeStep::Left),
            self.range_for(RangeStep::Right),
        );
        let ny = scale(
            signal.y - center.y,
            self.range_for(RangeStep::Up),
            self.range_for(RangeStep::Down),
        );
        let half = viewport.center();
        viewport.clamp(Point::new(half.x.mul_add(nx, half.x), half.y.mul_add(ny, half.y)))
    }

    fn is_ready(&self) -> bool {
        self.is_complete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repeated(x: f64, y: f64) -> Vec<Point> {
        vec![Point::new(x, y); 6]
    }

    fn calibrated() -> RangeCalibrator {
        let mut range = RangeCalibrator::new(CalibrationConfig::default());
        range.record_step(RangeStep::Center, &repeated(0.0, 0.6));
        range.record_step(RangeStep::Left, &repeated(-0.2, 0.6));
        range.record_step(RangeStep::Right, &repeated(0.4, 0.6));
        range.record_step(RangeStep::Up, &repeated(0.0, 0.5));
        range.record_step(RangeStep::Down, &repeated(0.0, 0.8));
        range
    }

    #[test]
    fn test_all_steps_make_ready() {
        let range = calibrated();
        assert!(range.is_ready());
        assert_eq!(range.steps_completed(), 5);
        assert!((range.range_for(RangeStep::Right) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_asymmetric_ranges_map_to_edges() {
        let range = calibrated();
        let viewport = Viewport::new(1000.0, 800.0);
        let pose = PoseDelta::default();

        let center = range.map_to_screen(Point::new(0.0, 0.6), &pose, viewport);
        assert!((center.x - 500.0).abs() < 1e-9);
        assert!((center.y - 400.0).abs() < 1e-9);

        let half_left = range.map_to_screen(Point::new(-0.1, 0.6), &pose, viewport);
        assert!((half_left.x - 250.0).abs() < 1e-9);

        let half_right = range.map_to_screen(Point::new(0.2, 0.6), &pose, viewport);
        assert!((half_right.x - 750.0).abs() < 1e-9);

        let beyond = range.map_to_screen(Point::new(5.0, 5.0), &pose, viewport);
        assert_eq!(beyond, Point::new(999.0, 799.0));
    }

    #[test]
    fn test_recorded_centre_clears_directions() {
        let mut range = calibrated();
        assert!(range.is_ready());

        range.record_step(RangeStep::Center, &repeated(0.1, 0.6));
        assert!(!range.is_ready());
        assert_eq!(range.steps_completed(), 1);

        range.record_step(RangeStep::Left, &repeated(-0.2, 0.6));
        assert!((range.range_for(RangeStep::Left) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_small_range_rejected() {
        let mut range = RangeCalibrator::new(CalibrationConfig::default());
        range.record_step(RangeStep::Center, &repeated(0.0, 0.0));
        let outcome = range.record_step(RangeStep::Left, &repeated(-0.01, 0.0));
        assert!(matches!(
            outcome,
            StepOutcome::Rejected {
                reason: RejectReason::RangeTooSmall { .. },
                ..
            }
        ));
        // Looking the wrong way is also rejected
        let outcome = range.record_step(RangeStep::Right, &repeated(-0.3, 0.0));
        assert!(matches!(outcome, StepOutcome::Rejected { .. }));
        assert!(!range.is_ready());
    }

    #[test]
    fn test_too_few_samples_rejected() {
        let mut range = RangeCalibrator::new(CalibrationConfig::default());
        let outcome = range.record_step(RangeStep::Center, &[Point::new(0.0, 0.0), Point::new(f64::NAN, 0.0)]);
        assert_eq!(
            outcome,
            StepOutcome::Rejected {
                step: RangeStep::Center,
                reason: RejectReason::TooFewSamples { have: 1, need: 3 },
            }
        );
    }

    #[test]
    fn test_not_ready_uses_default_ranges() {
        let range = RangeCalibrator::new(CalibrationConfig::default());
        let viewport = Viewport::new(1000.0, 800.0);
        let p = range.map_to_screen(Point::new(0.125, 0.0), &PoseDelta::default(), viewport);
        assert!((p.x - 750.0).abs() < 1e-9);
        assert!(!range.is_ready());
    }
}
