use super::{CaptureKind, RangeStep};
use crate::{geometry::Point, pose::PoseDelta};
use serde::{Deserialize, Serialize};

/// What the user is asked to look at during a capture
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureTarget {
    /// A known on-screen point (regression calibration)
    Screen(Point),
    /// A directed look (range mapping)
    Direction(RangeStep),
}

/// Observations accumulated for one target until finalize or deadline
#[derive(Debug, Clone)]
pub struct CaptureSession {
    target: CaptureTarget,
    kind: CaptureKind,
    opened_at: f64,
    deadline: f64,
    raw: Vec<Point>,
    poses: Vec<PoseDelta>,
}

impl CaptureSession {
    #[must_use]
    pub fn new(target: CaptureTarget, kind: CaptureKind, now: f64, window_ms: f64) -> Self {
        Self {
            target,
            kind,
            opened_at: now,
            deadline: now + window_ms,
            raw: Vec::new(),
            poses: Vec::new(),
        }
    }

    /// Add an observation; non-finite points are ignored
    pub fn push(&mut self, raw: Point, pose: PoseDelta) {
        if raw.is_finite() {
            self.raw.push(raw);
            self.poses.push(pose);
        }
    }

    #[must_use]
    pub const fn target(&self) -> CaptureTarget {
        self.target
    }

    #[must_use]
    pub const fn kind(&self) -> CaptureKind {
        self.kind
    }

    #[must_use]
    pub const fn opened_at(&self) -> f64 {
        self.opened_at
    }

    #[must_use]
    pub const fn deadline(&self) -> f64 {
        self.deadline
    }

    #[must_use]
    pub fn is_expired(&self, now: f64) -> bool {
        now >= self.deadline
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Mean raw point and mean pose delta
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // observation counts are small
    pub fn average(&self) -> Option<(Point, PoseDelta)> {
        if self.raw.is_empty() {
            return None;
        }
        let n = self.raw.len() as f64;
        let (sx, sy) = self.raw.iter().fold((0.0, 0.0), |(x, y), p| (x + p.x, y + p.y));
        let (yaw, pitch, roll) = self
            .poses
            .iter()
            .fold((0.0, 0.0, 0.0), |(a, b, c), d| (a + d.yaw, b + d.pitch, c + d.roll));
        Some((Point::new(sx / n, sy / n), PoseDelta::new(yaw / n, pitch / n, roll / n)))
    }

    /// Up to `count` most recent raw points
    #[must_use]
    pub fn recent_raw(&self, count: usize) -> Vec<Point> {
        let start = self.raw.len().saturating_sub(count);
        self.raw[start..].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_deadline() {
        let session = CaptureSession::new(
            CaptureTarget::Screen(Point::new(0.0, 0.0)),
            CaptureKind::Explicit,
            1000.0,
            500.0,
        );
        assert!(!session.is_expired(1499.0));
        assert!(session.is_expired(1500.0));
    }

    #[test]
    fn test_non_finite_observations_skipped() {
        let mut session = CaptureSession::new(
            CaptureTarget::Direction(RangeStep::Center),
            CaptureKind::Explicit,
            0.0,
            100.0,
        );
        session.push(Point::new(f64::NAN, 1.0), PoseDelta::default());
        session.push(Point::new(2.0, 4.0), PoseDelta::new(0.2, 0.0, 0.0));
        assert_eq!(session.len(), 1);
        let (raw, pose) = session.average().unwrap();
        assert_eq!(raw, Point::new(2.0, 4.0));
        assert!((pose.yaw - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_recent_raw_keeps_tail() {
        let mut session = CaptureSession::new(
            CaptureTarget::Direction(RangeStep::Left),
            CaptureKind::Explicit,
            0.0,
            100.0,
        );
        for i in 0..5 {
            session.push(Point::new(f64::from(i), 0.0), PoseDelta::default());
        }
        let tail = session.recent_raw(2);
        assert_eq!(tail, vec![Point::new(3.0, 0.0), Point::new(4.0, 0.0)]);
        assert_eq!(session.recent_raw(10).len(), 5);
    }
}
