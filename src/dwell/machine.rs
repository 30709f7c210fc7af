//! Dwell state machine: `Idle -> Targeting -> Dwelling -> Triggered -> Idle`.

use super::Resolution;
use crate::{config::DwellConfig, constants::COOLDOWN_PRUNE_FACTOR, geometry::Point, page::TargetId};
use log::{debug, info};
use std::collections::HashMap;

/// Visible phase of the dwell machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DwellPhase {
    /// No candidate target
    Idle,
    /// A candidate is waiting for frame agreement
    Targeting,
    /// Dwell time is accumulating on the candidate
    Dwelling,
    /// Trigger fired; waiting out the cooldown on the same target
    Triggered,
}

/// Per-frame input to the dwell machine
#[derive(Debug, Clone, Copy)]
pub struct DwellInput {
    pub target: Option<Resolution>,
    /// Live calibrated point
    pub point: Point,
    /// Debounced stability flag
    pub stable: bool,
    /// Recent robust dispersion in pixels
    pub dispersion: f64,
    pub now: f64,
}

/// Dwell timing, agreement and per-target cooldowns
#[derive(Debug, Clone)]
pub struct DwellMachine {
    config: DwellConfig,
    phase: DwellPhase,
    current_target: Option<TargetId>,
    dwell_start: f64,
    agreeing_frames: usize,
    last_trigger_by_target: HashMap<TargetId, f64>,
}

impl DwellMachine {
    #[must_use]
    pub fn new(config: DwellConfig) -> Self {
        Self {
            config,
            phase: DwellPhase::Idle,
            current_target: None,
            dwell_start: 0.0,
            agreeing_frames: 0,
            last_trigger_by_target: HashMap::new(),
        }
    }

    /// Threshold after jitter inflation
    #[must_use]
    pub fn effective_threshold(&self, dispersion: f64) -> f64 {
        let excess = if dispersion.is_finite() {
            (dispersion / self.config.jitter_reference_px - 1.0).max(0.0)
        } else {
            0.0
        };
        let factor = self.config.jitter_gain.mul_add(excess, 1.0).min(self.config.max_threshold_factor);
        self.config.threshold_ms * factor
    }

    /// Advance one frame; returns the target when a dwell completes
    pub fn update(&mut self, input: &DwellInput) -> Option<TargetId> {
        let resolution = match input.target {
            Some(resolution) if input.stable => resolution,
            _ => {
                if self.phase != DwellPhase::Idle {
                    debug!("Dwell reset (target or stability lost) in {:?}", self.phase);
                }
                self.go_idle();
                return None;
            }
        };
        let id = resolution.target;

        if self.current_target == Some(id) {
            self.agreeing_frames += 1;
        } else {
            debug!("Dwell candidate {:?} -> {:?}", self.current_target, id);
            self.start_candidate(id, input.now);
        }

        // Passing through a large element is not dwelling on it
        let drift_radius = self.config.drift_distance_px.max(resolution.bounds.half_diagonal());
        if input.point.distance(&resolution.bounds.center()) > drift_radius {
            if self.phase != DwellPhase::Triggered {
                self.start_candidate(id, input.now);
            }
            return None;
        }

        match self.phase {
            DwellPhase::Triggered => {
                if self.cooldown_elapsed(id, input.now) {
                    self.go_idle();
                }
                None
            }
            DwellPhase::Idle | DwellPhase::Targeting => {
                if self.agreeing_frames >= self.config.confirm_frames {
                    self.phase = DwellPhase::Dwelling;
                }
                self.try_trigger(id, input)
            }
            DwellPhase::Dwelling => self.try_trigger(id, input),
        }
    }

    fn try_trigger(&mut self, id: TargetId, input: &DwellInput) -> Option<TargetId> {
        if self.phase != DwellPhase::Dwelling {
            return None;
        }
        let elapsed = input.now - self.dwell_start;
        if elapsed < self.effective_threshold(input.dispersion) || !self.cooldown_elapsed(id, input.now) {
            return None;
        }
        info!("Dwell trigger on {:?} after {:.0} ms", id, elapsed);
        self.last_trigger_by_target.insert(id, input.now);
        self.phase = DwellPhase::Triggered;
        self.prune(input.now);
        Some(id)
    }

    fn start_candidate(&mut self, id: TargetId, now: f64) {
        self.current_target = Some(id);
        self.dwell_start = now;
        self.agreeing_frames = 1;
        self.phase = DwellPhase::Targeting;
    }

    fn go_idle(&mut self) {
        self.phase = DwellPhase::Idle;
        self.current_target = None;
        self.agreeing_frames = 0;
    }

    fn cooldown_elapsed(&self, id: TargetId, now: f64) -> bool {
        self.last_trigger_by_target
            .get(&id)
            .map_or(true, |&last| now - last >= self.config.cooldown_ms)
    }

    fn prune(&mut self, now: f64) {
        let horizon = self.config.cooldown_ms * COOLDOWN_PRUNE_FACTOR;
        self.last_trigger_by_target.retain(|_, last| now - *last <= horizon);
    }

    #[must_use]
    pub const fn phase(&self) -> DwellPhase {
        self.phase
    }

    #[must_use]
    pub const fn current_target(&self) -> Option<TargetId> {
        self.current_target
    }

    /// Time on the current candidate
    #[must_use]
    pub fn elapsed(&self, now: f64) -> Option<f64> {
        self.current_target.map(|_| now - self.dwell_start)
    }

    /// Whether a dwell is accumulating or waiting for agreement
    #[must_use]
    pub fn is_engaged(&self) -> bool {
        matches!(self.phase, DwellPhase::Targeting | DwellPhase::Dwelling)
    }

    #[must_use]
    pub fn last_trigger(&self, id: TargetId) -> Option<f64> {
        self.last_trigger_by_target.get(&id).copied()
    }

    /// Replace thresholds; accumulated cooldowns survive
    pub fn set_config(&mut self, config: DwellConfig) {
        self.config = config;
    }

    /// Return to `Idle`; with `clear_cooldowns` the trigger history goes too
    pub fn reset(&mut self, clear_cooldowns: bool) {
        self.go_idle();
        if clear_cooldowns {
            self.last_trigger_by_target.clear();
        }
    }
}
