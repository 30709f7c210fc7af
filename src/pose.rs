//! Pose measurements and the neutral-face baseline.

use crate::config::BaselineConfig;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Bounded head pose for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseMeasurement {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
    pub confidence: f64,
}

/// Pose relative to the neutral baseline
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseDelta {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl PoseDelta {
    #[must_use]
    pub const fn new(yaw: f64, pitch: f64, roll: f64) -> Self {
        Self { yaw, pitch, roll }
    }

    /// Squared deviation used by the calibration weight penalty
    #[must_use]
    pub fn magnitude_squared(&self) -> f64 {
        self.roll.mul_add(self.roll, self.yaw.mul_add(self.yaw, self.pitch * self.pitch))
    }
}

/// How the baseline became ready
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineSource {
    Measured,
    EarlyMeasured,
    Fallback,
}

/// Incrementally averaged neutral pose
///
/// Accumulates near-neutral measurements during a bounded warm-up window.
/// Once ready it does not change until [`PoseBaseline::invalidate`].
#[derive(Debug, Clone)]
pub struct PoseBaseline {
    config: BaselineConfig,
    yaw: f64,
    pitch: f64,
    roll: f64,
    sample_count: usize,
    ready: Option<BaselineSource>,
    started_at: Option<f64>,
}

impl PoseBaseline {
    #[must_use]
    pub const fn new(config: BaselineConfig) -> Self {
        Self {
            config,
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
            sample_count: 0,
            ready: None,
            started_at: None,
        }
    }

    /// Feed a measurement; returns true on the call that makes the baseline ready
    ///
    /// `capture_context` allows the early-ready threshold.
    pub fn update(&mut self, measurement: Option<&PoseMeasurement>, now: f64, capture_context: bool) -> bool {
        if self.ready.is_some() {
            return false;
        }
        let started_at = *self.started_at.get_or_insert(now);
        let elapsed = now - started_at;

        if let Some(m) = measurement {
            let in_warmup = elapsed <= self.config.warmup_ms;
            let neutral = m.yaw.abs() < self.config.neutral_threshold && m.pitch.abs() < self.config.neutral_threshold;
            if in_warmup && neutral && m.confidence >= self.config.min_confidence {
                self.accumulate(m);
            }
        }

        if self.sample_count >= self.config.min_samples {
            return self.mark_ready(BaselineSource::Measured);
        }
        if capture_context && self.sample_count >= self.config.early_ready_samples {
            return self.mark_ready(BaselineSource::EarlyMeasured);
        }
        if elapsed >= self.config.fallback_timeout_ms {
            warn!(
                "Pose baseline not stable after {:.0} ms ({} samples), using zero baseline",
                elapsed, self.sample_count
            );
            self.yaw = 0.0;
            self.pitch = 0.0;
            self.roll = 0.0;
            return self.mark_ready(BaselineSource::Fallback);
        }
        false
    }

    #[allow(clippy::cast_precision_loss)] // sample counts are small
    fn accumulate(&mut self, m: &PoseMeasurement) {
        self.sample_count += 1;
        let n = self.sample_count as f64;
        self.yaw += (m.yaw - self.yaw) / n;
        self.pitch += (m.pitch - self.pitch) / n;
        self.roll += (m.roll - self.roll) / n;
    }

    fn mark_ready(&mut self, source: BaselineSource) -> bool {
        info!(
            "Pose baseline ready ({:?}, {} samples): yaw {:.3} pitch {:.3} roll {:.3}",
            source, self.sample_count, self.yaw, self.pitch, self.roll
        );
        self.ready = Some(source);
        true
    }

    /// Forget the baseline and restart the warm-up
    pub fn invalidate(&mut self) {
        let config = self.config.clone();
        *self = Self::new(config);
    }

    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.ready.is_some()
    }

    #[must_use]
    pub const fn source(&self) -> Option<BaselineSource> {
        self.ready
    }

    #[must_use]
    pub const fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Measurement relative to the baseline (zero baseline while warming up)
    #[must_use]
    pub fn delta(&self, m: &PoseMeasurement) -> PoseDelta {
        if self.ready.is_some() {
            PoseDelta::new(m.yaw - self.yaw, m.pitch - self.pitch, m.roll - self.roll)
        } else {
            PoseDelta::new(m.yaw, m.pitch, m.roll)
        }
    }

    /// Neutral pose as (yaw, pitch, roll)
    #[must_use]
    pub const fn neutral(&self) -> (f64, f64, f64) {
        (self.yaw, self.pitch, self.roll)
    }
}
