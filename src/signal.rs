//! Signal normalization: per-frame detections to a canonical 2D signal.
//!
//! Normalization is side-effect free. Partial or malformed landmark sets
//! yield `None` for the affected outputs instead of a partial result.

use crate::{
    config::LandmarkLayout,
    constants::{MIN_INTER_EYE_DISTANCE, POSE_LIMIT},
    geometry::{Point, Viewport},
    pose::PoseMeasurement,
};
use serde::{Deserialize, Serialize};

/// Which normalized signal drives the pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalMode {
    /// Raw screen-space gaze predictions
    #[default]
    Gaze,
    /// Head-orientation vector from face landmarks
    Head,
}

/// A single landmark in normalized image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
}

impl Landmark {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn valid(self) -> Option<Point> {
        (self.x.is_finite() && self.y.is_finite()).then_some(Point::new(self.x, self.y))
    }
}

/// One face record with a fixed-index point list
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceLandmarks {
    pub points: Vec<Option<Landmark>>,
    /// Detector score when the upstream model reports one
    #[serde(default)]
    pub score: Option<f64>,
}

impl FaceLandmarks {
    fn point(&self, index: usize) -> Option<Point> {
        self.points.get(index).copied().flatten().and_then(Landmark::valid)
    }
}

/// Raw gaze prediction from the upstream model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazePrediction {
    pub x: f64,
    pub y: f64,
    pub score: f64,
    /// Coordinates are fractions of the viewport rather than pixels
    #[serde(default)]
    pub normalized: bool,
}

/// Detection result handed over by the acquisition collaborator for one frame
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Detection {
    /// Face landmarks, or `None` for the "no face" sentinel
    #[serde(default)]
    pub face: Option<FaceLandmarks>,
    #[serde(default)]
    pub gaze: Option<GazePrediction>,
}

/// Canonical 2D signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    /// Normalized head-orientation vector (x right, y down)
    Head(Point),
    /// Screen-space point in pixels
    Screen(Point),
}

impl Signal {
    #[must_use]
    pub const fn point(&self) -> Point {
        match self {
            Self::Head(p) | Self::Screen(p) => *p,
        }
    }
}

/// Signal plus confidence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedSignal {
    pub signal: Signal,
    pub confidence: f64,
}

/// Geometry derived from one landmark set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadGeometry {
    /// Nose-tip projection in the eye-line frame, in inter-eye units
    pub vector: Point,
    /// Eye-line angle
    pub roll: f64,
    pub inter_eye_distance: f64,
    /// Mouth aperture over inter-eye distance, when lip points are present
    pub mouth_ratio: Option<f64>,
    pub confidence: f64,
}

impl HeadGeometry {
    /// Bounded pose measurement for baseline and calibration features
    #[must_use]
    pub fn pose(&self) -> PoseMeasurement {
        PoseMeasurement {
            yaw: self.vector.x.clamp(-POSE_LIMIT, POSE_LIMIT),
            pitch: self.vector.y.clamp(-POSE_LIMIT, POSE_LIMIT),
            roll: self.roll.clamp(-POSE_LIMIT, POSE_LIMIT),
            confidence: self.confidence,
        }
    }
}

/// Everything normalization extracts from one frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedFrame {
    /// Signal selected by the active mode
    pub signal: Option<NormalizedSignal>,
    pub head: Option<HeadGeometry>,
}

/// Converts detections to normalized signals
#[derive(Debug, Clone, Copy)]
pub struct SignalNormalizer {
    mode: SignalMode,
    layout: LandmarkLayout,
    mirrored: bool,
}

impl SignalNormalizer {
    #[must_use]
    pub const fn new(mode: SignalMode, layout: LandmarkLayout, mirrored: bool) -> Self {
        Self { mode, layout, mirrored }
    }

    #[must_use]
    pub const fn mode(&self) -> SignalMode {
        self.mode
    }

    /// Normalize one frame
    #[must_use]
    pub fn normalize(&self, detection: &Detection, viewport: Viewport) -> NormalizedFrame {
        let head = detection
            .face
            .as_ref()
            .and_then(|face| head_geometry(face, &self.layout, self.mirrored));

        let signal = match self.mode {
            SignalMode::Gaze => detection.gaze.and_then(|g| normalize_gaze(&g, viewport)),
            SignalMode::Head => head.map(|h| NormalizedSignal {
                signal: Signal::Head(h.vector),
                confidence: h.confidence,
            }),
        };

        NormalizedFrame { signal, head }
    }
}

/// Compute the head-orientation frame from eye and nose landmarks
#[must_use]
pub fn head_geometry(face: &FaceLandmarks, layout: &LandmarkLayout, mirrored: bool) -> Option<HeadGeometry> {
    let left = face.point(layout.left_eye)?;
    let right = face.point(layout.right_eye)?;
    let nose = face.point(layout.nose_tip)?;

    let iod = left.distance(&right);
    if !iod.is_finite() || iod < MIN_INTER_EYE_DISTANCE {
        return None;
    }

    // Eye-line axis and its perpendicular
    let u = Point::new((right.x - left.x) / iod, (right.y - left.y) / iod);
    let v = Point::new(-u.y, u.x);
    let mid = Point::new((left.x + right.x) / 2.0, (left.y + right.y) / 2.0);
    let d = Point::new(nose.x - mid.x, nose.y - mid.y);

    let mut x = d.x.mul_add(u.x, d.y * u.y) / iod;
    let y = d.x.mul_add(v.x, d.y * v.y) / iod;
    let mut roll = u.y.atan2(u.x);
    if mirrored {
        x = -x;
        roll = -roll;
    }

    let mouth_ratio = match (face.point(layout.upper_lip), face.point(layout.lower_lip)) {
        (Some(upper), Some(lower)) => Some(upper.distance(&lower) / iod),
        _ => None,
    };

    Some(HeadGeometry {
        vector: Point::new(x, y),
        roll,
        inter_eye_distance: iod,
        mouth_ratio,
        confidence: landmark_confidence(face, layout),
    })
}

#[allow(clippy::cast_precision_loss)] // landmark counts are small
fn landmark_confidence(face: &FaceLandmarks, layout: &LandmarkLayout) -> f64 {
    if let Some(score) = face.score.filter(|s| s.is_finite()) {
        return score.clamp(0.0, 1.0);
    }
    let valid = face
        .points
        .iter()
        .filter(|p| p.and_then(|l| l.valid()).is_some())
        .count();
    (valid as f64 / layout.expected_points.max(1) as f64).clamp(0.0, 1.0)
}

/// Convert a raw gaze prediction to a screen-space signal
#[must_use]
pub fn normalize_gaze(prediction: &GazePrediction, viewport: Viewport) -> Option<NormalizedSignal> {
    if !(prediction.x.is_finite() && prediction.y.is_finite() && prediction.score.is_finite()) {
        return None;
    }
    let point = if prediction.normalized {
        Point::new(prediction.x * viewport.width, prediction.y * viewport.height)
    } else {
        Point::new(prediction.x, prediction.y)
    };
    Some(NormalizedSignal {
        signal: Signal::Screen(point),
        confidence: prediction.score.clamp(0.0, 1.0),
    })
}
