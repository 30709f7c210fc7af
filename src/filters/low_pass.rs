use super::SignalFilter;
use std::f64::consts::PI;

/// Smoothing factor of a first-order low-pass at `cutoff_hz` for a step of `dt_s`
#[must_use]
pub fn smoothing_factor(dt_s: f64, cutoff_hz: f64) -> f64 {
    let r = 2.0 * PI * cutoff_hz * dt_s;
    r / (r + 1.0)
}

/// Scalar first-order low-pass with a per-call smoothing factor
#[derive(Debug, Clone, Default)]
pub struct LowPass {
    last: Option<f64>,
}

impl LowPass {
    #[must_use]
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Filter `value` with factor `alpha`; the first value passes through
    pub fn filter(&mut self, value: f64, alpha: f64) -> f64 {
        let filtered = match self.last {
            Some(last) => alpha.mul_add(value - last, last),
            None => value,
        };
        self.last = Some(filtered);
        filtered
    }

    /// Overwrite the held value
    pub fn set(&mut self, value: f64) {
        self.last = Some(value);
    }

    #[must_use]
    pub const fn last(&self) -> Option<f64> {
        self.last
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Fixed-factor low-pass over both axes
pub struct LowPassFilter {
    alpha: f64,
    x: LowPass,
    y: LowPass,
}

impl LowPassFilter {
    /// Create a new first-order low-pass filter
    ///
    /// # Panics
    ///
    /// Panics if alpha is not in the range (0, 1]
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "Alpha must be in (0, 1]");
        Self {
            alpha,
            x: LowPass::new(),
            y: LowPass::new(),
        }
    }
}

impl SignalFilter for LowPassFilter {
    fn apply(&mut self, x: f64, y: f64, _timestamp: f64) -> (f64, f64) {
        (self.x.filter(x, self.alpha), self.y.filter(y, self.alpha))
    }

    fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
    }

    fn name(&self) -> &str {
        "LowPassFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_order_low_pass() {
        let mut filter = LowPassFilter::new(0.5);

        // First value passes through
        let (x1, y1) = filter.apply(10.0, 20.0, 0.0);
        assert_eq!(x1, 10.0);
        assert_eq!(y1, 20.0);

        // Second value is filtered
        let (x2, y2) = filter.apply(20.0, 30.0, 16.0);
        assert_eq!(x2, 15.0); // 10 + 0.5 * (20 - 10)
        assert_eq!(y2, 25.0);
    }

    #[test]
    fn test_smoothing_factor_grows_with_cutoff() {
        let slow = smoothing_factor(1.0 / 30.0, 0.5);
        let fast = smoothing_factor(1.0 / 30.0, 10.0);
        assert!(slow > 0.0 && slow < fast && fast < 1.0);
    }
}
