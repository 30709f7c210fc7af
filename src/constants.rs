//! Constants used throughout the library

/// Hard floor for the dwell threshold; smaller values are rejected.
pub const MIN_DWELL_THRESHOLD_MS: f64 = 200.0;

/// Upper bound accepted for the calibration sample cap.
pub const MAX_CALIBRATION_SAMPLES: usize = 1000;

/// Upper bound accepted for the pointer-update throttle.
pub const MAX_POINTER_THROTTLE_MS: f64 = 1000.0;

/// Floor applied to elapsed time between filter updates (milliseconds).
pub const MIN_FILTER_DT_MS: f64 = 1.0;

/// Below this distance a smoothed value snaps onto its input.
pub const FILTER_SETTLE_EPSILON: f64 = 1e-9;

/// Scale factor turning a median absolute deviation into a sigma estimate.
pub const MAD_TO_SIGMA: f64 = 1.4826;

/// Fraction dropped from each end of the sorted speed list.
pub const SPEED_TRIM_FRACTION: f64 = 0.1;

/// Number of regression features per axis: rawX, rawY, yaw, pitch, bias.
pub const REGRESSION_FEATURES: usize = 5;

/// Pivot magnitude below which the normal equations count as singular.
pub const PIVOT_TOLERANCE: f64 = 1e-12;

/// Raw points closer than this count as one sample toward the fit minimum.
pub const DISTINCT_SAMPLE_TOLERANCE: f64 = 1e-6;

/// Bound on normalized yaw / pitch / roll values.
pub const POSE_LIMIT: f64 = 0.7;

/// Smallest inter-eye distance (normalized image units) accepted as a face.
pub const MIN_INTER_EYE_DISTANCE: f64 = 1e-3;

/// Default face-mesh landmark indices.
pub const LANDMARK_LEFT_EYE_OUTER: usize = 33;
pub const LANDMARK_RIGHT_EYE_OUTER: usize = 263;
pub const LANDMARK_NOSE_TIP: usize = 1;
pub const LANDMARK_UPPER_LIP: usize = 13;
pub const LANDMARK_LOWER_LIP: usize = 14;

/// Number of points in the default face-mesh layout.
pub const FACE_MESH_POINTS: usize = 468;

/// Cooldown map entries older than this many cooldowns are pruned.
pub const COOLDOWN_PRUNE_FACTOR: f64 = 10.0;

/// Cap on the raw-signal history kept for refinement captures.
pub const REFINE_HISTORY_CAPACITY: usize = 240;

/// Status note raised while the signal is missing.
pub const NOTE_UNSTABLE_TRACKING: &str = "unstable tracking";

/// Status note raised after repeated calibration rejections.
pub const NOTE_RECALIBRATION_NEEDED: &str = "recalibration needed";
