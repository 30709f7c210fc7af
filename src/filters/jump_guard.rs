use crate::geometry::Point;
use log::debug;

/// Outcome of checking a point against the last smoothed output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpDecision {
    /// Within the threshold; smooth as usual
    Accept,
    /// Unconfirmed jump; hold the previous output
    Reject,
    /// Enough consecutive frames agree on the new location
    Confirmed,
}

/// Discards single-frame spikes while letting confirmed fast moves through
#[derive(Debug, Clone)]
pub struct JumpGuard {
    threshold: f64,
    confirm_frames: usize,
    pending: Option<(Point, usize)>,
}

impl JumpGuard {
    /// Create a new jump guard
    ///
    /// # Panics
    ///
    /// Panics if `threshold` is not positive or `confirm_frames` is zero
    #[must_use]
    pub fn new(threshold: f64, confirm_frames: usize) -> Self {
        assert!(threshold > 0.0, "Jump threshold must be positive");
        assert!(confirm_frames > 0, "Confirm frames must be greater than 0");
        Self {
            threshold,
            confirm_frames,
            pending: None,
        }
    }

    /// Classify `point` relative to the previous smoothed output
    pub fn check(&mut self, point: Point, reference: Option<Point>) -> JumpDecision {
        let Some(reference) = reference else {
            self.pending = None;
            return JumpDecision::Accept;
        };

        if point.distance(&reference) <= self.threshold {
            self.pending = None;
            return JumpDecision::Accept;
        }

        let count = match self.pending {
            Some((pending, count)) if point.distance(&pending) <= self.threshold => count + 1,
            _ => 1,
        };

        if count >= self.confirm_frames {
            debug!(
                "Jump to ({:.2}, {:.2}) confirmed after {} frames",
                point.x, point.y, count
            );
            self.pending = None;
            JumpDecision::Confirmed
        } else {
            debug!("Jump to ({:.2}, {:.2}) held back", point.x, point.y);
            self.pending = Some((point, count));
            JumpDecision::Reject
        }
    }

    pub fn reset(&mut self) {
        self.pending = None;
    }
}
