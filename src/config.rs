//! Configuration management for the gaze dwell pipeline

use crate::{
    calibration::CalibrationMethod,
    constants::{
        FACE_MESH_POINTS, LANDMARK_LEFT_EYE_OUTER, LANDMARK_LOWER_LIP, LANDMARK_NOSE_TIP,
        LANDMARK_RIGHT_EYE_OUTER, LANDMARK_UPPER_LIP, MAX_CALIBRATION_SAMPLES, MAX_POINTER_THROTTLE_MS,
        MIN_DWELL_THRESHOLD_MS,
    },
    events::Button,
    signal::SignalMode,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Signal normalization
    pub signal: SignalConfig,

    /// Neutral-face baseline warm-up
    pub baseline: BaselineConfig,

    /// Smoothing filters
    pub filter: FilterConfig,

    /// Calibration engine
    pub calibration: CalibrationConfig,

    /// Stability gate
    pub stability: StabilityConfig,

    /// Dwell targeting and triggering
    pub dwell: DwellConfig,

    /// Edge-band scrolling
    pub edge_scroll: EdgeScrollConfig,

    /// Held-gesture discrete actions
    pub gesture: GestureConfig,

    /// Pointer-update emission
    pub pointer: PointerConfig,
}

/// Which signal drives the pointer and how landmarks are read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// `gaze` (raw screen predictions) or `head` (head-orientation vector)
    pub mode: SignalMode,

    /// Camera feed is mirrored
    pub mirrored: bool,

    /// Frames below this confidence are treated as missing
    pub min_confidence: f64,

    /// Landmark indices
    pub layout: LandmarkLayout,
}

/// Fixed indices into the upstream landmark list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkLayout {
    pub left_eye: usize,
    pub right_eye: usize,
    pub nose_tip: usize,
    pub upper_lip: usize,
    pub lower_lip: usize,
    /// Expected number of points in a complete landmark set
    pub expected_points: usize,
}

/// Neutral pose baseline parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Max |yaw| and |pitch| for a measurement to count as neutral
    pub neutral_threshold: f64,

    /// Minimum measurement confidence to update the baseline
    pub min_confidence: f64,

    /// Accumulation window after the first measurement
    pub warmup_ms: f64,

    /// Samples needed for readiness
    pub min_samples: usize,

    /// Samples needed for readiness inside a capture context
    pub early_ready_samples: usize,

    /// Fall back to a zero baseline after this long without readiness
    pub fallback_timeout_ms: f64,
}

/// Smoothing parameters for both signal kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Screen-space gaze predictions (pixels)
    pub gaze: SmoothingConfig,

    /// Head-orientation vectors (normalized units)
    pub head: SmoothingConfig,
}

/// One-euro, median and jump-guard parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Minimum cutoff frequency (Hz)
    pub min_cutoff: f64,

    /// Speed coefficient
    pub beta: f64,

    /// Derivative cutoff frequency (Hz)
    pub d_cutoff: f64,

    /// Median pre-filter window (odd, 1 disables)
    pub median_window: usize,

    /// Distance from the smoothed output beyond which a point is a jump
    pub jump_threshold: f64,

    /// Consecutive frames at a new location needed to accept a jump
    pub jump_confirm_frames: usize,
}

/// Calibration engine parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// `regression` or `range`
    pub method: CalibrationMethod,

    /// Samples needed before a regression fit
    pub min_samples: usize,

    /// Ring buffer cap
    pub max_samples: usize,

    /// Minimum time between fits
    pub min_refit_interval_ms: f64,

    /// Ridge magnitude for small sample counts
    pub ridge_base: f64,

    /// Sample count past which the ridge starts to shrink
    pub ridge_threshold: usize,

    /// Sample age at which its weight halves
    pub half_life_ms: f64,

    /// Base weight of explicit calibration clicks
    pub explicit_weight: f64,

    /// Base weight of passive refinement captures
    pub refinement_weight: f64,

    /// Neighbourhood radius for the density bonus
    pub density_radius_px: f64,

    /// Maximum bonus for a sample in an empty neighbourhood
    pub density_bonus: f64,

    /// Weight penalty per squared unit of pose deviation
    pub pose_penalty: f64,

    /// Default capture session length
    pub capture_window_ms: f64,

    /// Capture a refinement sample whenever a dwell triggers
    pub refine_on_dwell: bool,

    /// Span of raw signal averaged into a refinement sample
    pub refine_window_ms: f64,

    /// Samples averaged per range step
    pub range_samples_per_step: usize,

    /// Minimum samples for a range step to count
    pub range_min_step_samples: usize,

    /// Smallest accepted directional range
    pub min_range: f64,

    /// Range used for directions not yet measured
    pub default_range: f64,

    /// Consecutive rejected fits before asking for recalibration
    pub max_consecutive_rejections: usize,
}

/// Stability gate parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    /// Rolling window sample cap
    pub window_size: usize,

    /// Rolling window age cap
    pub window_ms: f64,

    /// Samples needed before the window is judged at all
    pub min_samples: usize,

    /// Acceptable robust dispersion as a fraction of the viewport diagonal
    pub dispersion_fraction: f64,

    /// Acceptable trimmed speed as a fraction of the diagonal per second
    pub speed_fraction: f64,

    /// Threshold multiplier once calibration is dense
    pub tightened_factor: f64,

    /// Calibration sample count at which the multiplier bottoms out
    pub tighten_after_samples: usize,

    /// Continuous stable time before reporting stable
    pub enter_ms: f64,

    /// Continuous unstable time before reporting unstable
    pub exit_ms: f64,
}

/// Dwell resolver and trigger parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DwellConfig {
    /// Time on target needed to trigger
    pub threshold_ms: f64,

    /// Minimum time between triggers on the same target
    pub cooldown_ms: f64,

    /// Resolver window sample cap
    pub resolver_window_size: usize,

    /// Resolver window age cap
    pub resolver_window_ms: f64,

    /// Hits needed for the majority element to count
    pub min_hits: usize,

    /// Margin around the target box for the centroid check
    pub target_padding_px: f64,

    /// Consecutive resolutions before dwelling starts
    pub confirm_frames: usize,

    /// Distance from the element centre that restarts the dwell timer
    pub drift_distance_px: f64,

    /// Minimum sticky radius around a snapped target
    pub sticky_radius_px: f64,

    /// Sticky radius as a multiple of the target half-diagonal
    pub sticky_scale: f64,

    /// Dispersion at which the threshold starts inflating
    pub jitter_reference_px: f64,

    /// Threshold inflation per unit of excess dispersion
    pub jitter_gain: f64,

    /// Upper bound on the inflated threshold, as a multiple
    pub max_threshold_factor: f64,

    /// Hit cache grid cell size
    pub hit_cache_grid_px: f64,

    /// Hit cache entry lifetime
    pub hit_cache_ttl_ms: f64,

    /// Hit cache entry cap
    pub hit_cache_capacity: usize,
}

/// Edge-band scroll parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeScrollConfig {
    pub enabled: bool,

    /// Band height as a fraction of the viewport height
    pub band_fraction: f64,

    /// Intensity needed to count toward the hold
    pub min_intensity: f64,

    /// Continuous hold before a scroll step
    pub hold_ms: f64,

    /// Scroll distance at full intensity
    pub step_px: f64,

    /// Pause edge scrolling while a dwell is accumulating
    pub suspend_while_dwelling: bool,
}

/// Held-gesture parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub enabled: bool,

    /// Mouth ratio at which the gesture engages
    pub open_ratio: f64,

    /// Mouth ratio at which the gesture releases
    pub close_ratio: f64,

    /// Shortest hold that produces an action
    pub short_hold_ms: f64,

    /// Shortest hold that produces the long action
    pub long_hold_ms: f64,

    /// Holds longer than this are cancelled
    pub max_hold_ms: f64,

    pub short_button: Button,

    pub long_button: Button,
}

/// Pointer emission parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerConfig {
    /// Minimum interval between pointer updates
    pub throttle_ms: f64,

    /// Missing-signal duration that raises the "unstable tracking" note
    pub missing_signal_note_ms: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            mode: SignalMode::Gaze,
            mirrored: true,
            min_confidence: 0.3,
            layout: LandmarkLayout::default(),
        }
    }
}

impl Default for LandmarkLayout {
    fn default() -> Self {
        Self {
            left_eye: LANDMARK_LEFT_EYE_OUTER,
            right_eye: LANDMARK_RIGHT_EYE_OUTER,
            nose_tip: LANDMARK_NOSE_TIP,
            upper_lip: LANDMARK_UPPER_LIP,
            lower_lip: LANDMARK_LOWER_LIP,
            expected_points: FACE_MESH_POINTS,
        }
    }
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            neutral_threshold: 0.22,
            min_confidence: 0.5,
            warmup_ms: 4000.0,
            min_samples: 18,
            early_ready_samples: 8,
            fallback_timeout_ms: 6000.0,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            gaze: SmoothingConfig::gaze_default(),
            head: SmoothingConfig::head_default(),
        }
    }
}

impl SmoothingConfig {
    /// Defaults for pixel-space gaze predictions
    #[must_use]
    pub const fn gaze_default() -> Self {
        Self {
            min_cutoff: 1.0,
            beta: 0.005,
            d_cutoff: 1.0,
            median_window: 5,
            jump_threshold: 280.0,
            jump_confirm_frames: 2,
        }
    }

    /// Defaults for normalized head-orientation vectors
    #[must_use]
    pub const fn head_default() -> Self {
        Self {
            min_cutoff: 1.2,
            beta: 4.0,
            d_cutoff: 1.0,
            median_window: 5,
            jump_threshold: 0.18,
            jump_confirm_frames: 2,
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self::gaze_default()
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            method: CalibrationMethod::Regression,
            min_samples: 5,
            max_samples: 60,
            min_refit_interval_ms: 250.0,
            ridge_base: 1e-6,
            ridge_threshold: 8,
            half_life_ms: 45_000.0,
            explicit_weight: 1.0,
            refinement_weight: 0.35,
            density_radius_px: 120.0,
            density_bonus: 0.5,
            pose_penalty: 8.0,
            capture_window_ms: 1200.0,
            refine_on_dwell: true,
            refine_window_ms: 500.0,
            range_samples_per_step: 12,
            range_min_step_samples: 3,
            min_range: 0.02,
            default_range: 0.25,
            max_consecutive_rejections: 3,
        }
    }
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            window_size: 20,
            window_ms: 700.0,
            min_samples: 6,
            dispersion_fraction: 0.035,
            speed_fraction: 0.6,
            tightened_factor: 0.7,
            tighten_after_samples: 12,
            enter_ms: 120.0,
            exit_ms: 220.0,
        }
    }
}

impl Default for DwellConfig {
    fn default() -> Self {
        Self {
            threshold_ms: 800.0,
            cooldown_ms: 1200.0,
            resolver_window_size: 12,
            resolver_window_ms: 450.0,
            min_hits: 4,
            target_padding_px: 8.0,
            confirm_frames: 2,
            drift_distance_px: 90.0,
            sticky_radius_px: 64.0,
            sticky_scale: 1.25,
            jitter_reference_px: 12.0,
            jitter_gain: 0.5,
            max_threshold_factor: 1.75,
            hit_cache_grid_px: 8.0,
            hit_cache_ttl_ms: 120.0,
            hit_cache_capacity: 256,
        }
    }
}

impl Default for EdgeScrollConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            band_fraction: 0.08,
            min_intensity: 0.35,
            hold_ms: 300.0,
            step_px: 120.0,
            suspend_while_dwelling: false,
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            open_ratio: 0.32,
            close_ratio: 0.22,
            short_hold_ms: 120.0,
            long_hold_ms: 700.0,
            max_hold_ms: 4000.0,
            short_button: Button::Left,
            long_button: Button::Right,
        }
    }
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            throttle_ms: 30.0,
            missing_signal_note_ms: 1500.0,
        }
    }
}

fn require(condition: bool, message: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::ConfigError(message.to_string()))
    }
}

fn require_positive(value: f64, name: &str) -> Result<()> {
    require(value.is_finite() && value > 0.0, &format!("{name} must be positive, got {value}"))
}

fn require_non_negative(value: f64, name: &str) -> Result<()> {
    require(value.is_finite() && value >= 0.0, &format!("{name} must be non-negative, got {value}"))
}

fn require_unit(value: f64, name: &str) -> Result<()> {
    require(
        (0.0..=1.0).contains(&value),
        &format!("{name} must be between 0.0 and 1.0, got {value}"),
    )
}

impl SmoothingConfig {
    /// Validate one smoothing section
    pub fn validate(&self, section: &str) -> Result<()> {
        require_positive(self.min_cutoff, &format!("{section}.min_cutoff"))?;
        require_non_negative(self.beta, &format!("{section}.beta"))?;
        require_positive(self.d_cutoff, &format!("{section}.d_cutoff"))?;
        require(
            self.median_window > 0 && self.median_window % 2 == 1,
            &format!("{section}.median_window must be odd and greater than 0"),
        )?;
        require_positive(self.jump_threshold, &format!("{section}.jump_threshold"))?;
        require(
            self.jump_confirm_frames > 0,
            &format!("{section}.jump_confirm_frames must be greater than 0"),
        )
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration; out-of-range values are rejected, never clamped
    pub fn validate(&self) -> Result<()> {
        // Signal
        require_unit(self.signal.min_confidence, "signal.min_confidence")?;
        let layout = &self.signal.layout;
        let highest = [layout.left_eye, layout.right_eye, layout.nose_tip, layout.upper_lip, layout.lower_lip]
            .into_iter()
            .max()
            .unwrap_or(0);
        require(
            layout.expected_points > highest,
            "signal.layout.expected_points must exceed every landmark index",
        )?;
        require(layout.left_eye != layout.right_eye, "signal.layout eye indices must differ")?;

        // Baseline
        require_positive(self.baseline.neutral_threshold, "baseline.neutral_threshold")?;
        require_unit(self.baseline.min_confidence, "baseline.min_confidence")?;
        require_positive(self.baseline.warmup_ms, "baseline.warmup_ms")?;
        require(self.baseline.min_samples > 0, "baseline.min_samples must be greater than 0")?;
        require(
            self.baseline.early_ready_samples > 0 && self.baseline.early_ready_samples <= self.baseline.min_samples,
            "baseline.early_ready_samples must be in 1..=min_samples",
        )?;
        require(
            self.baseline.fallback_timeout_ms >= self.baseline.warmup_ms,
            "baseline.fallback_timeout_ms must not be shorter than warmup_ms",
        )?;

        // Filters
        self.filter.gaze.validate("filter.gaze")?;
        self.filter.head.validate("filter.head")?;

        // Calibration
        let cal = &self.calibration;
        require(cal.min_samples >= 1, "calibration.min_samples must be greater than 0")?;
        require(
            cal.max_samples >= cal.min_samples && cal.max_samples <= MAX_CALIBRATION_SAMPLES,
            &format!("calibration.max_samples must be in min_samples..={MAX_CALIBRATION_SAMPLES}"),
        )?;
        require_non_negative(cal.min_refit_interval_ms, "calibration.min_refit_interval_ms")?;
        require_non_negative(cal.ridge_base, "calibration.ridge_base")?;
        require(cal.ridge_threshold > 0, "calibration.ridge_threshold must be greater than 0")?;
        require_positive(cal.half_life_ms, "calibration.half_life_ms")?;
        require_positive(cal.explicit_weight, "calibration.explicit_weight")?;
        require_positive(cal.refinement_weight, "calibration.refinement_weight")?;
        require_positive(cal.density_radius_px, "calibration.density_radius_px")?;
        require_non_negative(cal.density_bonus, "calibration.density_bonus")?;
        require_non_negative(cal.pose_penalty, "calibration.pose_penalty")?;
        require_positive(cal.capture_window_ms, "calibration.capture_window_ms")?;
        require_positive(cal.refine_window_ms, "calibration.refine_window_ms")?;
        require(
            cal.range_min_step_samples > 0 && cal.range_min_step_samples <= cal.range_samples_per_step,
            "calibration.range_min_step_samples must be in 1..=range_samples_per_step",
        )?;
        require_positive(cal.min_range, "calibration.min_range")?;
        require(
            cal.default_range.is_finite() && cal.default_range >= cal.min_range,
            "calibration.default_range must not be below min_range",
        )?;
        require(
            cal.max_consecutive_rejections > 0,
            "calibration.max_consecutive_rejections must be greater than 0",
        )?;

        // Stability
        let st = &self.stability;
        require(st.min_samples >= 3, "stability.min_samples must be at least 3")?;
        require(
            st.window_size >= st.min_samples,
            "stability.window_size must not be smaller than stability.min_samples",
        )?;
        require_positive(st.window_ms, "stability.window_ms")?;
        require_positive(st.dispersion_fraction, "stability.dispersion_fraction")?;
        require_positive(st.speed_fraction, "stability.speed_fraction")?;
        require(
            st.tightened_factor > 0.0 && st.tightened_factor <= 1.0,
            "stability.tightened_factor must be in (0, 1]",
        )?;
        require_non_negative(st.enter_ms, "stability.enter_ms")?;
        require_non_negative(st.exit_ms, "stability.exit_ms")?;

        // Dwell
        let dw = &self.dwell;
        Self::validate_dwell_threshold(dw.threshold_ms)?;
        require_non_negative(dw.cooldown_ms, "dwell.cooldown_ms")?;
        require(dw.resolver_window_size > 0, "dwell.resolver_window_size must be greater than 0")?;
        require_positive(dw.resolver_window_ms, "dwell.resolver_window_ms")?;
        require(
            dw.min_hits > 0 && dw.min_hits <= dw.resolver_window_size,
            "dwell.min_hits must be in 1..=resolver_window_size",
        )?;
        require_non_negative(dw.target_padding_px, "dwell.target_padding_px")?;
        require(dw.confirm_frames > 0, "dwell.confirm_frames must be greater than 0")?;
        require_positive(dw.drift_distance_px, "dwell.drift_distance_px")?;
        require_positive(dw.sticky_radius_px, "dwell.sticky_radius_px")?;
        require_positive(dw.sticky_scale, "dwell.sticky_scale")?;
        require_positive(dw.jitter_reference_px, "dwell.jitter_reference_px")?;
        require_non_negative(dw.jitter_gain, "dwell.jitter_gain")?;
        require(
            dw.max_threshold_factor.is_finite() && dw.max_threshold_factor >= 1.0,
            "dwell.max_threshold_factor must be at least 1.0",
        )?;
        require_positive(dw.hit_cache_grid_px, "dwell.hit_cache_grid_px")?;
        require_non_negative(dw.hit_cache_ttl_ms, "dwell.hit_cache_ttl_ms")?;

        // Edge scroll
        let es = &self.edge_scroll;
        require(
            es.band_fraction > 0.0 && es.band_fraction < 0.5,
            "edge_scroll.band_fraction must be in (0, 0.5)",
        )?;
        require_unit(es.min_intensity, "edge_scroll.min_intensity")?;
        require_positive(es.hold_ms, "edge_scroll.hold_ms")?;
        require_positive(es.step_px, "edge_scroll.step_px")?;

        // Gesture
        let ge = &self.gesture;
        require(
            ge.close_ratio > 0.0 && ge.close_ratio < ge.open_ratio,
            "gesture.close_ratio must be positive and below open_ratio",
        )?;
        require_positive(ge.short_hold_ms, "gesture.short_hold_ms")?;
        require(
            ge.long_hold_ms > ge.short_hold_ms,
            "gesture.long_hold_ms must be greater than short_hold_ms",
        )?;
        require(
            ge.max_hold_ms > ge.long_hold_ms,
            "gesture.max_hold_ms must be greater than long_hold_ms",
        )?;

        // Pointer
        require(
            (0.0..=MAX_POINTER_THROTTLE_MS).contains(&self.pointer.throttle_ms),
            &format!("pointer.throttle_ms must be between 0 and {MAX_POINTER_THROTTLE_MS}"),
        )?;
        require_positive(self.pointer.missing_signal_note_ms, "pointer.missing_signal_note_ms")?;

        Ok(())
    }

    /// Check a dwell threshold against the hard floor
    pub fn validate_dwell_threshold(threshold_ms: f64) -> Result<()> {
        require(
            threshold_ms.is_finite() && threshold_ms >= MIN_DWELL_THRESHOLD_MS,
            &format!("dwell.threshold_ms must be at least {MIN_DWELL_THRESHOLD_MS} ms, got {threshold_ms}"),
        )
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Gaze dwell configuration

signal:
  mode: gaze
  mirrored: true
  min_confidence: 0.3

filter:
  gaze:
    min_cutoff: 1.0
    beta: 0.005
    d_cutoff: 1.0
    median_window: 5
    jump_threshold: 280.0
    jump_confirm_frames: 2
  head:
    min_cutoff: 1.2
    beta: 4.0
    d_cutoff: 1.0
    median_window: 5
    jump_threshold: 0.18
    jump_confirm_frames: 2

calibration:
  method: regression
  min_samples: 5
  max_samples: 60
  min_refit_interval_ms: 250.0
  half_life_ms: 45000.0

stability:
  window_size: 20
  window_ms: 700.0
  min_samples: 6
  enter_ms: 120.0
  exit_ms: 220.0

dwell:
  threshold_ms: 800.0
  cooldown_ms: 1200.0
  min_hits: 4

edge_scroll:
  enabled: true
  band_fraction: 0.08
  hold_ms: 300.0

gesture:
  enabled: true
  short_hold_ms: 120.0
  long_hold_ms: 700.0
  short_button: left
  long_button: right

pointer:
  throttle_ms: 30.0
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_example_config_parses() {
        let config: Config = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.dwell.threshold_ms, 800.0);
        assert_eq!(config.gesture.long_button, Button::Right);
    }

    #[test]
    fn test_dwell_threshold_floor_rejected() {
        let mut config = Config::default();
        config.dwell.threshold_ms = 150.0;
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
        config.dwell.threshold_ms = 200.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_even_median_window_rejected() {
        let mut config = Config::default();
        config.filter.head.median_window = 4;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_stability_window_smaller_than_min_samples_rejected() {
        let mut config = Config::default();
        config.stability.window_size = 4;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sample_cap_bounds() {
        let mut config = Config::default();
        config.calibration.max_samples = 2;
        assert!(config.validate().is_err());
        config.calibration.max_samples = MAX_CALIBRATION_SAMPLES + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_throttle_out_of_range_rejected() {
        let mut config = Config::default();
        config.pointer.throttle_ms = -1.0;
        assert!(config.validate().is_err());
        config.pointer.throttle_ms = 5000.0;
        assert!(config.validate().is_err());
    }
}
