//! Full smoothing chain for one signal: jump guard, median window, one-euro.

use super::{
    jump_guard::{JumpDecision, JumpGuard},
    median::MedianFilter,
    one_euro::OneEuroFilter2D,
    SignalFilter,
};
use crate::{config::SmoothingConfig, geometry::Point};

/// Jump guard → median pre-filter → per-axis one-euro
///
/// A rejected jump returns the previous output unchanged. A confirmed jump
/// re-seeds the median and one-euro state at the new location.
pub struct SmoothingPipeline {
    guard: JumpGuard,
    median: MedianFilter,
    euro: OneEuroFilter2D,
    last_output: Option<Point>,
}

impl SmoothingPipeline {
    #[must_use]
    pub fn new(config: &SmoothingConfig) -> Self {
        Self {
            guard: JumpGuard::new(config.jump_threshold, config.jump_confirm_frames),
            median: MedianFilter::new(config.median_window),
            euro: OneEuroFilter2D::new(config.min_cutoff, config.beta, config.d_cutoff),
            last_output: None,
        }
    }

    /// Smooth a point
    pub fn smooth(&mut self, point: Point, timestamp: f64) -> Point {
        if !point.is_finite() {
            return self.last_output.unwrap_or(point);
        }

        let output = match self.guard.check(point, self.last_output) {
            JumpDecision::Reject => return self.last_output.unwrap_or(point),
            JumpDecision::Confirmed => {
                self.median.reset();
                self.median.apply(point.x, point.y, timestamp);
                self.euro.seed(point.x, point.y, timestamp);
                point
            }
            JumpDecision::Accept => {
                let (mx, my) = self.median.apply(point.x, point.y, timestamp);
                let (x, y) = self.euro.apply(mx, my, timestamp);
                Point::new(x, y)
            }
        };

        self.last_output = Some(output);
        output
    }

    #[must_use]
    pub const fn last_output(&self) -> Option<Point> {
        self.last_output
    }
}

impl SignalFilter for SmoothingPipeline {
    fn apply(&mut self, x: f64, y: f64, timestamp: f64) -> (f64, f64) {
        let p = self.smooth(Point::new(x, y), timestamp);
        (p.x, p.y)
    }

    fn reset(&mut self) {
        self.guard.reset();
        self.median.reset();
        self.euro.reset();
        self.last_output = None;
    }

    fn name(&self) -> &str {
        "SmoothingPipeline"
    }
}
