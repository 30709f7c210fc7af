//! One-euro filter: a low-pass whose cutoff rises with signal speed.
//!
//! Slow motion gets heavy smoothing to remove jitter; fast motion gets a
//! high cutoff so the output keeps up.

use super::{
    low_pass::{smoothing_factor, LowPass},
    SignalFilter,
};
use crate::constants::{FILTER_SETTLE_EPSILON, MIN_FILTER_DT_MS};

/// Scalar one-euro filter over millisecond timestamps
#[derive(Debug, Clone)]
pub struct OneEuroFilter {
    min_cutoff: f64,
    beta: f64,
    d_cutoff: f64,
    value: LowPass,
    derivative: LowPass,
    last_raw: Option<f64>,
    last_timestamp: Option<f64>,
}

impl OneEuroFilter {
    /// Create a new one-euro filter
    ///
    /// # Panics
    ///
    /// Panics if a cutoff is not positive or beta is negative
    #[must_use]
    pub fn new(min_cutoff: f64, beta: f64, d_cutoff: f64) -> Self {
        assert!(min_cutoff > 0.0, "Minimum cutoff must be positive");
        assert!(beta >= 0.0, "Beta must be non-negative");
        assert!(d_cutoff > 0.0, "Derivative cutoff must be positive");
        Self {
            min_cutoff,
            beta,
            d_cutoff,
            value: LowPass::new(),
            derivative: LowPass::new(),
            last_raw: None,
            last_timestamp: None,
        }
    }

    /// Filter one value at `timestamp` (milliseconds)
    pub fn filter(&mut self, value: f64, timestamp: f64) -> f64 {
        let (Some(last_raw), Some(last_timestamp)) = (self.last_raw, self.last_timestamp) else {
            self.seed(value, timestamp);
            return value;
        };

        let dt_s = (timestamp - last_timestamp).max(MIN_FILTER_DT_MS) / 1000.0;

        let raw_derivative = (value - last_raw) / dt_s;
        let derivative = self
            .derivative
            .filter(raw_derivative, smoothing_factor(dt_s, self.d_cutoff));

        let cutoff = self.beta.mul_add(derivative.abs(), self.min_cutoff);
        let mut filtered = self.value.filter(value, smoothing_factor(dt_s, cutoff));
        if (value - filtered).abs() < FILTER_SETTLE_EPSILON {
            filtered = value;
            self.value.set(value);
        }

        self.last_raw = Some(value);
        self.last_timestamp = Some(timestamp.max(last_timestamp));
        filtered
    }

    /// Restart from `value` without any history
    pub fn seed(&mut self, value: f64, timestamp: f64) {
        self.value.reset();
        self.value.set(value);
        self.derivative.reset();
        self.derivative.set(0.0);
        self.last_raw = Some(value);
        self.last_timestamp = Some(timestamp);
    }

    #[must_use]
    pub const fn last(&self) -> Option<f64> {
        self.value.last()
    }

    pub fn reset(&mut self) {
        self.value.reset();
        self.derivative.reset();
        self.last_raw = None;
        self.last_timestamp = None;
    }
}

/// Independent one-euro filters on both axes
#[derive(Debug, Clone)]
pub struct OneEuroFilter2D {
    x: OneEuroFilter,
    y: OneEuroFilter,
}

impl OneEuroFilter2D {
    #[must_use]
    pub fn new(min_cutoff: f64, beta: f64, d_cutoff: f64) -> Self {
        Self {
            x: OneEuroFilter::new(min_cutoff, beta, d_cutoff),
            y: OneEuroFilter::new(min_cutoff, beta, d_cutoff),
        }
    }

    pub fn seed(&mut self, x: f64, y: f64, timestamp: f64) {
        self.x.seed(x, timestamp);
        self.y.seed(y, timestamp);
    }
}

impl SignalFilter for OneEuroFilter2D {
    fn apply(&mut self, x: f64, y: f64, timestamp: f64) -> (f64, f64) {
        (self.x.filter(x, timestamp), self.y.filter(y, timestamp))
    }

    fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
    }

    fn name(&self) -> &str {
        "OneEuroFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_value_passes_through() {
        let mut filter = OneEuroFilter::new(1.0, 0.01, 1.0);
        assert_eq!(filter.filter(42.0, 0.0), 42.0);
    }

    #[test]
    fn test_constant_input_settles_exactly() {
        let mut filter = OneEuroFilter::new(1.0, 0.01, 1.0);
        filter.filter(0.0, 0.0);
        let mut out = 0.0;
        for i in 1..=600 {
            out = filter.filter(100.0, f64::from(i) * 16.0);
        }
        assert_eq!(out, 100.0);
        assert_eq!(filter.filter(100.0, 601.0 * 16.0), 100.0);
    }

    #[test]
    fn test_fast_motion_is_smoothed_less() {
        // Same step, but one filter sees it after a fast ramp
        let mut slow = OneEuroFilter::new(1.0, 0.05, 1.0);
        let mut fast = OneEuroFilter::new(1.0, 0.05, 1.0);
        slow.filter(0.0, 0.0);
        fast.filter(0.0, 0.0);
        let mut slow_out = 0.0;
        let mut fast_out = 0.0;
        for i in 1..=5 {
            let t = f64::from(i) * 16.0;
            slow_out = slow.filter(f64::from(i), t);
            fast_out = fast.filter(f64::from(i) * 100.0, t);
        }
        let slow_lag = (5.0 - slow_out) / 5.0;
        let fast_lag = (500.0 - fast_out) / 500.0;
        assert!(fast_lag < slow_lag, "fast lag {fast_lag} should be below slow lag {slow_lag}");
    }

    #[test]
    fn test_duplicate_timestamp_does_not_blow_up() {
        let mut filter = OneEuroFilter::new(1.0, 0.01, 1.0);
        filter.filter(0.0, 100.0);
        let out = filter.filter(10.0, 100.0);
        assert!(out.is_finite());
        assert!(out > 0.0 && out <= 10.0);
    }
}
