use crate::{
    config::EdgeScrollConfig,
    events::{Event, ScrollDirection},
    geometry::{Point, Viewport},
};
use log::debug;

/// Scroll steps from sustained presence in the top or bottom band
#[derive(Debug, Clone)]
pub struct EdgeScroller {
    config: EdgeScrollConfig,
    held: Option<(ScrollDirection, f64)>,
}

impl EdgeScroller {
    #[must_use]
    pub const fn new(config: EdgeScrollConfig) -> Self {
        Self { config, held: None }
    }

    /// Band direction and penetration depth in `[0, 1]`
    #[must_use]
    pub fn intensity(&self, point: Point, viewport: Viewport) -> Option<(ScrollDirection, f64)> {
        let band = viewport.height * self.config.band_fraction;
        if !(band > 0.0 && point.is_finite()) {
            return None;
        }
        if point.y < band {
            Some((ScrollDirection::Up, ((band - point.y) / band).clamp(0.0, 1.0)))
        } else if point.y > viewport.height - band {
            Some((ScrollDirection::Down, ((point.y - (viewport.height - band)) / band).clamp(0.0, 1.0)))
        } else {
            None
        }
    }

    /// Advance one frame; emits a step each time the hold completes
    pub fn update(&mut self, point: Option<Point>, viewport: Viewport, now: f64, suspended: bool) -> Option<Event> {
        let banded = point
            .filter(|_| self.config.enabled && !suspended)
            .and_then(|p| self.intensity(p, viewport))
            .filter(|&(_, intensity)| intensity >= self.config.min_intensity);
        let Some((direction, intensity)) = banded else {
            self.held = None;
            return None;
        };

        let since = match self.held {
            Some((held_direction, since)) if held_direction == direction => since,
            _ => {
                self.held = Some((direction, now));
                now
            }
        };
        if now - since < self.config.hold_ms {
            return None;
        }

        // Re-arm: the next step needs another full hold
        self.held = Some((direction, now));
        let magnitude = self.config.step_px * intensity;
        debug!("Edge scroll {direction:?} by {magnitude:.0} px");
        Some(Event::ScrollStep { direction, magnitude })
    }

    /// Whether a hold is in progress
    #[must_use]
    pub const fn is_scrolling(&self) -> bool {
        self.held.is_some()
    }

    pub fn set_config(&mut self, config: EdgeScrollConfig) {
        self.config = config;
        self.held = None;
    }

    pub fn reset(&mut self) {
        self.held = None;
    }
}
