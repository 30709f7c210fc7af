use super::SignalFilter;
use std::collections::VecDeque;

/// Median filter over a fixed window of recent points
pub struct MedianFilter {
    window_size: usize,
    x_buffer: VecDeque<f64>,
    y_buffer: VecDeque<f64>,
}

impl MedianFilter {
    /// Create a new median filter
    ///
    /// # Panics
    ///
    /// Panics if `window_size` is zero or even
    #[must_use]
    pub fn new(window_size: usize) -> Self {
        assert!(window_size > 0, "Window size must be greater than 0");
        assert!(window_size % 2 == 1, "Median filter window size must be odd");
        Self {
            window_size,
            x_buffer: VecDeque::with_capacity(window_size),
            y_buffer: VecDeque::with_capacity(window_size),
        }
    }

    /// Median of a slice, averaging the middle pair for even lengths
    #[must_use]
    pub fn median(values: &[f64]) -> f64 {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let len = sorted.len();
        if len == 0 {
            0.0
        } else if len % 2 == 0 {
            (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
        } else {
            sorted[len / 2]
        }
    }

    fn push(buffer: &mut VecDeque<f64>, window_size: usize, value: f64) -> f64 {
        if buffer.len() >= window_size {
            buffer.pop_front();
        }
        buffer.push_back(value);
        Self::median(buffer.make_contiguous())
    }
}

impl SignalFilter for MedianFilter {
    fn apply(&mut self, x: f64, y: f64, _timestamp: f64) -> (f64, f64) {
        let x_median = Self::push(&mut self.x_buffer, self.window_size, x);
        let y_median = Self::push(&mut self.y_buffer, self.window_size, y);
        (x_median, y_median)
    }

    fn reset(&mut self) {
        self.x_buffer.clear();
        self.y_buffer.clear();
    }

    fn name(&self) -> &str {
        "MedianFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_filter() {
        let mut filter = MedianFilter::new(3);

        let (x1, y1) = filter.apply(10.0, 20.0, 0.0);
        assert_eq!(x1, 10.0);
        assert_eq!(y1, 20.0);

        let (x2, y2) = filter.apply(20.0, 30.0, 1.0);
        assert_eq!(x2, 15.0); // median of [10, 20]
        assert_eq!(y2, 25.0);

        let (x3, y3) = filter.apply(30.0, 40.0, 2.0);
        assert_eq!(x3, 20.0); // median of [10, 20, 30]
        assert_eq!(y3, 30.0);
    }

    #[test]
    fn test_median_with_outliers() {
        let mut filter = MedianFilter::new(3);

        filter.apply(10.0, 20.0, 0.0);
        filter.apply(11.0, 21.0, 1.0);
        let (x, y) = filter.apply(100.0, 200.0, 2.0); // outlier

        assert_eq!(x, 11.0);
        assert_eq!(y, 21.0);
    }

    #[test]
    fn test_median_tolerates_nan() {
        let mut filter = MedianFilter::new(3);
        filter.apply(f64::NAN, 1.0, 0.0);
        let (_, y) = filter.apply(2.0, 3.0, 1.0);
        assert_eq!(y, 2.0);
    }
}
