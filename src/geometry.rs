//! Screen-space primitives and the bounded rolling point window.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A 2D point in screen pixels (or signal units before calibration)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A timestamped point held inside rolling windows
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointSample {
    pub x: f64,
    pub y: f64,
    /// Milliseconds on the host clock
    pub timestamp: f64,
}

impl PointSample {
    #[must_use]
    pub const fn new(x: f64, y: f64, timestamp: f64) -> Self {
        Self { x, y, timestamp }
    }

    #[must_use]
    pub const fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Axis-aligned rectangle in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    #[must_use]
    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    /// Grow the rectangle by `margin` on every side
    #[must_use]
    pub fn padded(&self, margin: f64) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            2.0f64.mul_add(margin, self.width),
            2.0f64.mul_add(margin, self.height),
        )
    }

    #[must_use]
    pub fn half_diagonal(&self) -> f64 {
        self.width.hypot(self.height) / 2.0
    }
}

/// Visible page area in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn diagonal(&self) -> f64 {
        self.width.hypot(self.height)
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Clamp a point into `[0, width - 1] x [0, height - 1]`
    #[must_use]
    pub fn clamp(&self, p: Point) -> Point {
        let max_x = (self.width - 1.0).max(0.0);
        let max_y = (self.height - 1.0).max(0.0);
        let x = if p.x.is_finite() { p.x.clamp(0.0, max_x) } else { max_x / 2.0 };
        let y = if p.y.is_finite() { p.y.clamp(0.0, max_y) } else { max_y / 2.0 };
        Point::new(x, y)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1920.0, 1080.0)
    }
}

/// Rolling window of point samples bounded by count and by age
#[derive(Debug, Clone)]
pub struct PointWindow {
    max_len: usize,
    max_age_ms: f64,
    samples: VecDeque<PointSample>,
}

impl PointWindow {
    #[must_use]
    pub fn new(max_len: usize, max_age_ms: f64) -> Self {
        Self {
            max_len,
            max_age_ms,
            samples: VecDeque::with_capacity(max_len),
        }
    }

    /// Append a sample, evicting by count first and then by age relative to it
    pub fn push(&mut self, sample: PointSample) {
        while self.samples.len() >= self.max_len.max(1) {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        self.evict_older_than(sample.timestamp);
    }

    /// Drop samples older than `max_age_ms` relative to `now`
    pub fn evict_older_than(&mut self, now: f64) {
        while let Some(front) = self.samples.front() {
            if now - front.timestamp > self.max_age_ms {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&PointSample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PointSample> {
        self.samples.iter()
    }
}
