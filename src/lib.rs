//! Gaze and head-pose dwell interaction core.
//!
//! This library turns per-frame eye-gaze predictions or face landmarks into
//! pointer positions, dwell clicks, edge scrolling and gesture actions. It
//! provides:
//! - Adaptive smoothing (jump guard, median and one-euro filters)
//! - Pose-compensated ridge-regression and range calibration
//! - A stability gate with robust dispersion and speed limits
//! - A dwell state machine with sticky target snapping and cooldowns
//!
//! The host supplies detections and a page to hit-test against; the library
//! performs no camera capture or model inference itself.
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```no_run
//! use gaze_dwell::{
//!     config::Config,
//!     geometry::{Rect, Viewport},
//!     page::{StaticPage, TargetId},
//!     pipeline::{FrameInput, Tracker},
//!     signal::{Detection, GazePrediction},
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut page = StaticPage::new();
//! page.insert(TargetId(1), Rect::new(100.0, 100.0, 200.0, 80.0));
//!
//! let mut tracker = Tracker::new(Config::default())?;
//! tracker.start_live();
//!
//! let frame = FrameInput {
//!     timestamp: 0.0,
//!     viewport: Viewport::new(1280.0, 720.0),
//!     detection: Detection {
//!         face: None,
//!         gaze: Some(GazePrediction { x: 180.0, y: 140.0, score: 0.9, normalized: false }),
//!     },
//!     gesture_active: None,
//! };
//! for event in tracker.process_frame(&frame, &page) {
//!     println!("{}", serde_json::to_string(&event)?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Using Filters
//!
//! ```no_run
//! use gaze_dwell::filters::create_filter;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut filter = create_filter("oneeuro:1.0:0.01")?;
//! let (x, y) = filter.apply(640.0, 360.0, 0.0);
//! println!("Filtered: ({x:.1}, {y:.1})");
//! filter.reset();
//! # Ok(())
//! # }
//! ```

/// Replay application driving a tracker from recorded input
pub mod app;

/// Calibration engine, capture sessions and screen mappings
pub mod calibration;

/// Configuration management
pub mod config;

/// Constants used throughout the library
pub mod constants;

/// Dwell targeting, triggering, edge scrolling and gestures
pub mod dwell;

/// Error types and result handling
pub mod error;

/// Events emitted to the host
pub mod events;

/// Signal filtering algorithms for smoothing pointer estimates
pub mod filters;

/// Points, rectangles, viewports and sample windows
pub mod geometry;

/// Page hit-testing
pub mod page;

/// Per-frame pipeline and session state
pub mod pipeline;

/// Neutral-face baseline and pose deltas
pub mod pose;

/// Detection input and signal normalization
pub mod signal;

/// Stability gate
pub mod stability;

pub use error::{Error, Result};
pub use events::Event;
pub use pipeline::{FrameInput, SessionMode, Tracker};
