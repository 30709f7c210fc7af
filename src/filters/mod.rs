//! Signal filtering algorithms for smoothing normalized signals.
//!
//! The adaptive chain used by the pipeline is [`smoothing::SmoothingPipeline`].
//! The individual stages are exposed for composition and benchmarking.

/// Scalar and fixed-factor low-pass filters
pub mod low_pass;

/// Median filter for single-frame outlier rejection
pub mod median;

/// Speed-adaptive one-euro filter
pub mod one_euro;

/// Jump guard for single-frame spikes
pub mod jump_guard;

/// Jump guard, median and one-euro chained
pub mod smoothing;

use crate::{config::SmoothingConfig, Error, Result};

/// Trait for all 2D signal filters
pub trait SignalFilter: Send + Sync {
    /// Apply filter to a point observed at `timestamp` (milliseconds)
    fn apply(&mut self, x: f64, y: f64, timestamp: f64) -> (f64, f64);

    /// Reset filter state
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes through values unchanged
pub struct NoFilter;

impl SignalFilter for NoFilter {
    fn apply(&mut self, x: f64, y: f64, _timestamp: f64) -> (f64, f64) {
        (x, y)
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "NoFilter"
    }
}

fn parse_param(spec: &str, value: Option<&str>, default: f64) -> Result<f64> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .parse::<f64>()
            .map_err(|_| Error::FilterError(format!("Invalid parameter '{raw}' in filter spec '{spec}'"))),
    }
}

/// Create a filter from a spec string such as `median:5` or `oneeuro:1.0:0.007`
pub fn create_filter(filter_spec: &str) -> Result<Box<dyn SignalFilter>> {
    let lowered = filter_spec.to_lowercase();
    let mut parts = lowered.split(':');
    let name = parts.next().unwrap_or_default();
    let p1 = parts.next();
    let p2 = parts.next();
    if parts.next().is_some() {
        return Err(Error::FilterError(format!("Too many parameters in filter spec '{filter_spec}'")));
    }

    match name {
        "none" | "nofilter" => Ok(Box::new(NoFilter)),
        "median" => {
            let window = parse_param(filter_spec, p1, 5.0)?;
            if window < 1.0 || window.fract() != 0.0 || window % 2.0 == 0.0 {
                return Err(Error::FilterError(format!(
                    "Median filter window size must be odd and greater than 0, got {window}"
                )));
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // checked above
            Ok(Box::new(median::MedianFilter::new(window as usize)))
        }
        "lowpass" | "low_pass" => {
            let alpha = parse_param(filter_spec, p1, 0.5)?;
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(Error::FilterError(format!("Alpha must be in (0, 1], got {alpha}")));
            }
            Ok(Box::new(low_pass::LowPassFilter::new(alpha)))
        }
        "oneeuro" | "one_euro" => {
            let defaults = SmoothingConfig::gaze_default();
            let min_cutoff = parse_param(filter_spec, p1, defaults.min_cutoff)?;
            let beta = parse_param(filter_spec, p2, defaults.beta)?;
            if !(min_cutoff > 0.0) || !(beta >= 0.0) {
                return Err(Error::FilterError(format!(
                    "One-euro needs a positive cutoff and non-negative beta, got {min_cutoff}:{beta}"
                )));
            }
            Ok(Box::new(one_euro::OneEuroFilter2D::new(min_cutoff, beta, defaults.d_cutoff)))
        }
        "adaptive" | "smoothing" => {
            if p1.is_some() {
                return Err(Error::FilterError(format!(
                    "Filter '{name}' takes no parameters; configure it through SmoothingConfig"
                )));
            }
            Ok(Box::new(smoothing::SmoothingPipeline::new(&SmoothingConfig::gaze_default())))
        }
        _ => Err(Error::FilterError(format!("Unknown filter type: {filter_spec}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_filter() {
        let mut filter = NoFilter;
        let (x, y) = filter.apply(10.0, 20.0, 0.0);
        assert_eq!(x, 10.0);
        assert_eq!(y, 20.0);
    }

    #[test]
    fn test_create_filter() {
        assert!(create_filter("none").is_ok());
        assert!(create_filter("oneeuro").is_ok());
        assert!(create_filter("oneeuro:1.0:0.01").is_ok());
        assert!(create_filter("median:3").is_ok());
        assert!(create_filter("adaptive").is_ok());
        assert!(create_filter("unknown").is_err());
        assert!(create_filter("median:4").is_err());
        assert!(create_filter("median:abc").is_err());
        assert!(create_filter("lowpass:0").is_err());
        assert!(create_filter("oneeuro:0").is_err());
        assert!(create_filter("oneeuro:1:-1").is_err());
        assert!(create_filter("median:3:1:1").is_err());
    }

    #[test]
    fn test_filter_names() {
        assert_eq!(create_filter("median").unwrap().name(), "MedianFilter");
        assert_eq!(create_filter("adaptive").unwrap().name(), "SmoothingPipeline");
    }
}
