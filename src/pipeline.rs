//! Frame pipeline: normalize, filter, calibrate, gate, interact.
//!
//! All mutable per-session state lives in one [`PipelineState`] owned by a
//! [`Tracker`]. The host drives it with [`Tracker::process_frame`], one
//! completed detection at a time, and receives the events that frame
//! produced. No stage ever fails the frame: missing signal, rejected fits
//! and vanished targets only change state.

use crate::{
    calibration::{CalibrationEngine, CaptureKind, CaptureOutcome, CaptureReport, CaptureTarget, FitOutcome, StepOutcome},
    config::{Config, SmoothingConfig},
    constants::{NOTE_RECALIBRATION_NEEDED, NOTE_UNSTABLE_TRACKING, REFINE_HISTORY_CAPACITY},
    dwell::{
        gesture::action_events, machine::DwellInput, DwellMachine, DwellPhase, EdgeScroller, GestureDetector,
        StickySnap, TargetResolver,
    },
    events::{Event, Phase},
    filters::{smoothing::SmoothingPipeline, SignalFilter},
    geometry::{Point, PointSample, PointWindow, Viewport},
    page::PageQuery,
    pose::{PoseBaseline, PoseDelta},
    signal::{Detection, SignalMode, SignalNormalizer},
    stability::StabilityGate,
    Result,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Everything the host hands over for one frame
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameInput {
    /// Milliseconds on the host clock
    pub timestamp: f64,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub detection: Detection,
    /// Gesture state reported directly by the host, overriding the mouth ratio
    #[serde(default)]
    pub gesture_active: Option<bool>,
}

/// Which per-mode behaviour is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Pointer only
    #[default]
    Idle,
    /// Pointer plus capture sessions; no dwell
    Calibrating,
    /// Pointer, dwell, edge scroll and gestures
    Live,
}

fn smoothing_config(config: &Config) -> &SmoothingConfig {
    match config.signal.mode {
        SignalMode::Gaze => &config.filter.gaze,
        SignalMode::Head => &config.filter.head,
    }
}

/// All per-session state of one pipeline
pub struct PipelineState {
    mode: SessionMode,
    normalizer: SignalNormalizer,
    baseline: PoseBaseline,
    smoothing: SmoothingPipeline,
    calibration: CalibrationEngine,
    stability: StabilityGate,
    resolver: TargetResolver,
    snap: StickySnap,
    dwell: DwellMachine,
    edge: EdgeScroller,
    gesture: GestureDetector,
    /// Smoothed raw signal for refinement captures
    raw_history: PointWindow,
    last_pointer_at: Option<f64>,
    last_screen: Option<Point>,
    last_signal_at: Option<f64>,
    first_frame_at: Option<f64>,
    last_frame_at: Option<f64>,
    consecutive_rejections: usize,
    status: Option<(Phase, Option<String>)>,
}

impl PipelineState {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            mode: SessionMode::Idle,
            normalizer: SignalNormalizer::new(config.signal.mode, config.signal.layout, config.signal.mirrored),
            baseline: PoseBaseline::new(config.baseline.clone()),
            smoothing: SmoothingPipeline::new(smoothing_config(config)),
            calibration: CalibrationEngine::new(config.calibration.clone()),
            stability: StabilityGate::new(config.stability.clone()),
            resolver: TargetResolver::new(&config.dwell),
            snap: StickySnap::new(&config.dwell),
            dwell: DwellMachine::new(config.dwell.clone()),
            edge: EdgeScroller::new(config.edge_scroll.clone()),
            gesture: GestureDetector::new(config.gesture.clone()),
            raw_history: PointWindow::new(REFINE_HISTORY_CAPACITY, config.calibration.refine_window_ms),
            last_pointer_at: None,
            last_screen: None,
            last_signal_at: None,
            first_frame_at: None,
            last_frame_at: None,
            consecutive_rejections: 0,
            status: None,
        }
    }

    /// Clear filter history, windows and interaction machines
    fn reset_mode_state(&mut self) {
        self.smoothing.reset();
        self.stability.reset();
        self.resolver.clear();
        self.snap.clear();
        self.dwell.reset(true);
        self.edge.reset();
        self.gesture.reset();
        self.raw_history.clear();
        self.last_pointer_at = None;
        self.last_screen = None;
    }

    #[must_use]
    pub const fn mode(&self) -> SessionMode {
        self.mode
    }

    #[must_use]
    pub const fn calibration(&self) -> &CalibrationEngine {
        &self.calibration
    }

    #[must_use]
    pub const fn baseline(&self) -> &PoseBaseline {
        &self.baseline
    }

    #[must_use]
    pub const fn stability(&self) -> &StabilityGate {
        &self.stability
    }

    #[must_use]
    pub const fn dwell(&self) -> &DwellMachine {
        &self.dwell
    }

    #[must_use]
    pub const fn dwell_phase(&self) -> DwellPhase {
        self.dwell.phase()
    }

    /// Latest calibrated pointer position
    #[must_use]
    pub const fn pointer(&self) -> Option<Point> {
        self.last_screen
    }

    /// Last emitted status phase
    #[must_use]
    pub fn phase(&self) -> Option<Phase> {
        self.status.as_ref().map(|(phase, _)| *phase)
    }

    #[must_use]
    pub const fn consecutive_rejections(&self) -> usize {
        self.consecutive_rejections
    }
}

/// Controller owning the configuration and pipeline state
pub struct Tracker {
    config: Config,
    state: PipelineState,
}

impl Tracker {
    /// Create a tracker after validating `config`
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let state = PipelineState::new(&config);
        info!(
            "Tracker created ({:?} signal, {:?} calibration)",
            config.signal.mode, config.calibration.method
        );
        Ok(Self { config, state })
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub const fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Run one frame through the pipeline
    pub fn process_frame(&mut self, frame: &FrameInput, page: &dyn PageQuery) -> Vec<Event> {
        let now = frame.timestamp;
        let mut events = Vec::new();
        if !now.is_finite() {
            debug!("Frame with non-finite timestamp ignored");
            return events;
        }
        if self.state.last_frame_at.is_some_and(|last| now < last) {
            debug!("Out-of-order frame at {now:.1} ms ignored");
            return events;
        }
        self.state.last_frame_at = Some(now);
        self.state.first_frame_at.get_or_insert(now);
        let viewport = frame.viewport;

        let normalized = self.state.normalizer.normalize(&frame.detection, viewport);
        let measurement = normalized.head.map(|h| h.pose());
        let capture_context = self.state.calibration.is_capturing() || self.state.mode == SessionMode::Calibrating;
        self.state.baseline.update(measurement.as_ref(), now, capture_context);
        let pose = measurement.map_or_else(PoseDelta::default, |m| self.state.baseline.delta(&m));

        if let Some(report) = self.state.calibration.expire(now) {
            self.track_report(&report);
        }
        if let Some(outcome) = self.state.calibration.poll_fit(now) {
            self.track_fit(&outcome);
        }

        let signal = normalized
            .signal
            .filter(|s| s.confidence >= self.config.signal.min_confidence && s.signal.point().is_finite());

        match signal {
            Some(signal) => {
                self.state.last_signal_at = Some(now);
                let smoothed = self.state.smoothing.smooth(signal.signal.point(), now);
                self.state.raw_history.push(PointSample::new(smoothed.x, smoothed.y, now));
                self.state.calibration.record(smoothed, pose);

                let screen = self.state.calibration.apply(smoothed, &pose, viewport);
                self.state.last_screen = Some(screen);
                let due = self
                    .state
                    .last_pointer_at
                    .map_or(true, |last| now - last >= self.config.pointer.throttle_ms);
                if due {
                    self.state.last_pointer_at = Some(now);
                    events.push(Event::pointer_update(screen, signal.confidence, now));
                }

                if self.state.mode == SessionMode::Live {
                    self.interact(screen, pose, viewport, now, page, &mut events);
                }
            }
            None => {
                if self.state.mode == SessionMode::Live {
                    let samples = self.state.calibration.sample_count();
                    // A dropped frame is no update; only lost stability ends the dwell
                    if !self.state.stability.tick(now, viewport, samples) {
                        self.state.dwell.reset(false);
                    }
                    self.state.edge.update(None, viewport, now, false);
                }
            }
        }

        if self.state.mode == SessionMode::Live {
            let ratio = normalized.head.and_then(|h| h.mouth_ratio);
            if let Some(release) = self.state.gesture.update(ratio, frame.gesture_active, now) {
                let point = self.state.last_screen.unwrap_or_else(|| viewport.center());
                let target = self.state.snap.snapped().or_else(|| page.element_at(point));
                info!("Gesture {:?} ({:.0} ms) at {:?}", release.kind, release.hold_ms, target);
                events.extend(action_events(&release, target, point));
            }
        }

        self.emit_status(now, &mut events);
        events
    }

    fn interact(
        &mut self,
        screen: Point,
        pose: PoseDelta,
        viewport: Viewport,
        now: f64,
        page: &dyn PageQuery,
        events: &mut Vec<Event>,
    ) {
        let sample = PointSample::new(screen.x, screen.y, now);
        let samples = self.state.calibration.sample_count();
        let stable = self.state.stability.update(sample, viewport, samples);
        let dispersion = self.state.stability.report().map_or(0.0, |r| r.dispersion());

        self.state.resolver.push(sample);
        let fresh = self.state.resolver.resolve(page, now);
        let target = self.state.snap.apply(fresh, screen, page);
        let input = DwellInput {
            target,
            point: screen,
            stable,
            dispersion,
            now,
        };
        if let Some(id) = self.state.dwell.update(&input) {
            events.push(Event::DwellTrigger { target: id, timestamp: now });
            if self.config.calibration.refine_on_dwell {
                if let Some(bounds) = target.map(|t| t.bounds) {
                    self.refine(bounds.center(), pose, now);
                }
            }
        }

        let suspended = self.config.edge_scroll.suspend_while_dwelling && self.state.dwell.is_engaged();
        events.extend(self.state.edge.update(Some(screen), viewport, now, suspended));
    }

    #[allow(clippy::cast_precision_loss)] // history length is capped
    fn refine(&mut self, target: Point, pose: PoseDelta, now: f64) {
        self.state.raw_history.evict_older_than(now);
        let n = self.state.raw_history.len();
        if n == 0 {
            return;
        }
        let (sx, sy) = self
            .state
            .raw_history
            .iter()
            .fold((0.0, 0.0), |(x, y), s| (x + s.x, y + s.y));
        let raw = Point::new(sx / n as f64, sy / n as f64);
        debug!("Refinement sample from {n} frames toward ({:.0}, {:.0})", target.x, target.y);
        if let Some(outcome) = self.state.calibration.add_refinement(raw, pose, target, now) {
            self.track_fit(&outcome);
        }
    }

    fn track_fit(&mut self, outcome: &FitOutcome) {
        match outcome {
            FitOutcome::Fitted(_) => self.state.consecutive_rejections = 0,
            FitOutcome::Rejected(_) => self.note_rejection(),
            FitOutcome::Throttled | FitOutcome::Insufficient { .. } => {}
        }
    }

    fn track_report(&mut self, report: &CaptureReport) {
        match &report.outcome {
            CaptureOutcome::Regression(outcome) => self.track_fit(outcome),
            CaptureOutcome::Range(StepOutcome::Accepted { .. }) => self.state.consecutive_rejections = 0,
            CaptureOutcome::Range(StepOutcome::Rejected { .. }) => self.note_rejection(),
            CaptureOutcome::Discarded => {}
        }
    }

    fn note_rejection(&mut self) {
        self.state.consecutive_rejections += 1;
        if self.state.consecutive_rejections == self.config.calibration.max_consecutive_rejections {
            warn!(
                "{} consecutive calibration rejections, recalibration needed",
                self.state.consecutive_rejections
            );
        }
    }

    fn desired_status(&self, now: f64) -> (Phase, Option<String>) {
        let loaded = self.state.last_signal_at.is_some()
            && (self.config.signal.mode != SignalMode::Head || self.state.baseline.is_ready());
        let phase = if !loaded {
            Phase::Loading
        } else {
            match self.state.mode {
                SessionMode::Idle => Phase::Ready,
                SessionMode::Calibrating => Phase::Calibrating,
                SessionMode::Live => Phase::Live,
            }
        };

        let missing_for = self
            .state
            .last_signal_at
            .or(self.state.first_frame_at)
            .map_or(0.0, |since| now - since);
        let note = if self.state.consecutive_rejections >= self.config.calibration.max_consecutive_rejections {
            Some(NOTE_RECALIBRATION_NEEDED.to_string())
        } else if missing_for >= self.config.pointer.missing_signal_note_ms {
            Some(NOTE_UNSTABLE_TRACKING.to_string())
        } else {
            None
        };
        (phase, note)
    }

    fn emit_status(&mut self, now: f64, events: &mut Vec<Event>) {
        let status = self.desired_status(now);
        if self.state.status.as_ref() != Some(&status) {
            debug!("Status {:?} ({:?})", status.0, status.1);
            events.push(Event::Status {
                phase: status.0,
                note: status.1.clone(),
            });
            self.state.status = Some(status);
        }
    }

    fn transition(&mut self, mode: SessionMode) -> Vec<Event> {
        let now = self.state.last_frame_at.unwrap_or(0.0);
        if self.state.calibration.is_capturing() {
            debug!("Discarding open capture on mode change");
            self.state.calibration.finalize(true, now);
        }
        self.state.reset_mode_state();
        if self.state.mode != mode {
            info!("Mode {:?} -> {:?}", self.state.mode, mode);
        }
        self.state.mode = mode;
        let mut events = Vec::new();
        self.emit_status(now, &mut events);
        events
    }

    /// Enter calibration mode; `restart` also forgets samples and the baseline
    pub fn enter_calibration(&mut self, restart: bool) -> Vec<Event> {
        if restart {
            self.state.calibration.reset();
            self.state.baseline.invalidate();
            self.state.consecutive_rejections = 0;
        }
        self.transition(SessionMode::Calibrating)
    }

    /// Enter live dwell mode
    pub fn start_live(&mut self) -> Vec<Event> {
        self.transition(SessionMode::Live)
    }

    /// Leave calibration or live mode
    pub fn stop(&mut self) -> Vec<Event> {
        self.transition(SessionMode::Idle)
    }

    /// Open a capture session for a calibration target
    pub fn begin_capture(
        &mut self,
        target: CaptureTarget,
        kind: CaptureKind,
        window_ms: Option<f64>,
        now: f64,
    ) -> Result<Option<CaptureReport>> {
        let previous = self.state.calibration.begin_capture(target, kind, window_ms, now)?;
        if let Some(report) = &previous {
            self.track_report(report);
        }
        Ok(previous)
    }

    /// Close the open capture session
    pub fn finalize(&mut self, discard: bool, now: f64) -> Option<CaptureReport> {
        let report = self.state.calibration.finalize(discard, now)?;
        self.track_report(&report);
        Some(report)
    }

    /// Replace the configuration after validating it
    ///
    /// Calibration samples and the pose baseline survive. Filter history and
    /// interaction state restart under the new values.
    pub fn update_config(&mut self, config: Config) -> Result<()> {
        config.validate()?;
        let state = &mut self.state;
        state.normalizer = SignalNormalizer::new(config.signal.mode, config.signal.layout, config.signal.mirrored);
        if config.baseline != self.config.baseline {
            state.baseline = PoseBaseline::new(config.baseline.clone());
        }
        state.smoothing = SmoothingPipeline::new(smoothing_config(&config));
        state.calibration.set_config(config.calibration.clone());
        state.stability.set_config(config.stability.clone());
        state.resolver = TargetResolver::new(&config.dwell);
        state.snap = StickySnap::new(&config.dwell);
        state.dwell.set_config(config.dwell.clone());
        state.edge.set_config(config.edge_scroll.clone());
        state.gesture.set_config(config.gesture.clone());
        state.raw_history = PointWindow::new(REFINE_HISTORY_CAPACITY, config.calibration.refine_window_ms);
        state.reset_mode_state();
        info!("Configuration updated");
        self.config = config;
        Ok(())
    }

    /// Change the dwell threshold; values below the floor are rejected
    pub fn set_dwell_threshold(&mut self, threshold_ms: f64) -> Result<()> {
        Config::validate_dwell_threshold(threshold_ms)?;
        self.config.dwell.threshold_ms = threshold_ms;
        self.state.dwell.set_config(self.config.dwell.clone());
        Ok(())
    }
}
