//! Replay application: drives a [`Tracker`] from recorded JSON-lines input.
//!
//! Each input line is one tagged record. Every event the tracker emits is
//! written back as one JSON line, in order.

use crate::{
    calibration::{CaptureKind, CaptureTarget},
    config::Config,
    error::{Error, Result},
    events::Event,
    page::StaticPage,
    pipeline::{FrameInput, SessionMode, Tracker},
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};

/// One line of replay input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Record {
    Frame(FrameInput),
    BeginCapture {
        target: CaptureTarget,
        #[serde(default)]
        kind: CaptureKind,
        #[serde(default)]
        window_ms: Option<f64>,
        timestamp: f64,
    },
    Finalize {
        #[serde(default)]
        discard: bool,
        timestamp: f64,
    },
    Mode {
        mode: SessionMode,
        /// Entering calibration forgets earlier samples and the baseline
        #[serde(default)]
        restart: bool,
    },
    DwellThreshold {
        threshold_ms: f64,
    },
}

/// Replay application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Tracker configuration
    pub tracker: Config,
    /// Page layout the frames are resolved against
    pub page: StaticPage,
    /// Mode entered before the first record
    pub start_mode: SessionMode,
}

/// Counters reported when a replay finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub records: usize,
    pub frames: usize,
    pub events: usize,
    pub dwell_triggers: usize,
}

/// Replay runner
pub struct ReplayApp {
    tracker: Tracker,
    page: StaticPage,
    stats: ReplayStats,
}

impl ReplayApp {
    /// Create the runner and enter the start mode
    pub fn new(config: AppConfig) -> Result<Self> {
        let mut tracker = Tracker::new(config.tracker)?;
        let initial = match config.start_mode {
            SessionMode::Idle => Vec::new(),
            SessionMode::Calibrating => tracker.enter_calibration(false),
            SessionMode::Live => tracker.start_live(),
        };
        debug!("Start mode {:?} produced {} events", config.start_mode, initial.len());
        info!("Replay page has {} elements", config.page.elements.len());
        Ok(Self {
            tracker,
            page: config.page,
            stats: ReplayStats::default(),
        })
    }

    #[must_use]
    pub const fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Apply one record and return the events it produced
    pub fn handle(&mut self, record: &Record) -> Result<Vec<Event>> {
        self.stats.records += 1;
        let events = match record {
            Record::Frame(frame) => {
                self.stats.frames += 1;
                self.tracker.process_frame(frame, &self.page)
            }
            Record::BeginCapture {
                target,
                kind,
                window_ms,
                timestamp,
            } => {
                if let Some(report) = self.tracker.begin_capture(*target, *kind, *window_ms, *timestamp)? {
                    info!("Capture for {:?} closed: {:?}", report.target, report.outcome);
                }
                Vec::new()
            }
            Record::Finalize { discard, timestamp } => {
                if let Some(report) = self.tracker.finalize(*discard, *timestamp) {
                    info!(
                        "Capture for {:?} finalized with {} observations: {:?}",
                        report.target, report.observations, report.outcome
                    );
                }
                Vec::new()
            }
            Record::Mode { mode, restart } => match mode {
                SessionMode::Idle => self.tracker.stop(),
                SessionMode::Calibrating => self.tracker.enter_calibration(*restart),
                SessionMode::Live => self.tracker.start_live(),
            },
            Record::DwellThreshold { threshold_ms } => {
                self.tracker.set_dwell_threshold(*threshold_ms)?;
                Vec::new()
            }
        };
        self.stats.events += events.len();
        self.stats.dwell_triggers += events.iter().filter(|e| e.is_dwell_trigger()).count();
        Ok(events)
    }

    /// Replay every record from `reader`, writing events to `writer`
    ///
    /// Blank lines and lines starting with `#` are skipped.
    pub fn run<R: BufRead, W: Write>(&mut self, reader: R, mut writer: W) -> Result<ReplayStats> {
        info!("Starting replay");
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let record: Record = serde_json::from_str(trimmed)
                .map_err(|e| Error::InvalidInput(format!("line {}: {e}", index + 1)))?;
            for event in self.handle(&record)? {
                serde_json::to_writer(&mut writer, &event)?;
                writer.write_all(b"\n")?;
            }
        }
        writer.flush()?;
        info!(
            "Replay finished: {} frames, {} events, {} dwell triggers",
            self.stats.frames, self.stats.events, self.stats.dwell_triggers
        );
        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{geometry::Point, signal::GazePrediction};

    #[test]
    fn test_record_parsing() {
        let frame: Record = serde_json::from_str(
            r#"{"type":"frame","timestamp":10.0,"detection":{"gaze":{"x":100.0,"y":200.0,"score":0.9}}}"#,
        )
        .unwrap();
        let Record::Frame(frame) = frame else {
            panic!("expected a frame record");
        };
        assert_eq!(
            frame.detection.gaze,
            Some(GazePrediction {
                x: 100.0,
                y: 200.0,
                score: 0.9,
                normalized: false
            })
        );

        let capture: Record =
            serde_json::from_str(r#"{"type":"begin_capture","target":{"screen":{"x":5.0,"y":6.0}},"timestamp":0.0}"#)
                .unwrap();
        assert_eq!(
            capture,
            Record::BeginCapture {
                target: CaptureTarget::Screen(Point::new(5.0, 6.0)),
                kind: CaptureKind::Explicit,
                window_ms: None,
                timestamp: 0.0,
            }
        );

        let mode: Record = serde_json::from_str(r#"{"type":"mode","mode":"live"}"#).unwrap();
        assert_eq!(
            mode,
            Record::Mode {
                mode: SessionMode::Live,
                restart: false
            }
        );
    }

    #[test]
    fn test_run_writes_event_lines() {
        let input = "\
# two gaze frames
{\"type\":\"frame\",\"timestamp\":0.0,\"detection\":{\"gaze\":{\"x\":100.0,\"y\":100.0,\"score\":0.9}}}

{\"type\":\"frame\",\"timestamp\":40.0,\"detection\":{\"gaze\":{\"x\":101.0,\"y\":100.0,\"score\":0.9}}}
";
        let mut app = ReplayApp::new(AppConfig::default()).unwrap();
        let mut output = Vec::new();
        let stats = app.run(input.as_bytes(), &mut output).unwrap();
        assert_eq!(stats.frames, 2);

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), stats.events);
        assert!(lines.iter().any(|l| l.contains("\"event\":\"pointer_update\"")));
        assert!(lines.iter().any(|l| l.contains("\"event\":\"status\"")));
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let mut app = ReplayApp::new(AppConfig::default()).unwrap();
        let err = app.run("{\"type\":\"nope\"}\n".as_bytes(), Vec::new()).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_dwell_threshold_floor_rejected() {
        let mut app = ReplayApp::new(AppConfig::default()).unwrap();
        assert!(app.handle(&Record::DwellThreshold { threshold_ms: 50.0 }).is_err());
        assert!(app.handle(&Record::DwellThreshold { threshold_ms: 400.0 }).is_ok());
        assert!((app.tracker().config().dwell.threshold_ms - 400.0).abs() < 1e-12);
    }
}
