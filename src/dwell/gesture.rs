//! Held-gesture detection and the synthesized input that follows it.

use crate::{
    config::GestureConfig,
    events::{Button, DiscreteKind, Event, SyntheticPointerKind},
    geometry::Point,
    page::TargetId,
};
use log::debug;

/// A completed hold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureRelease {
    pub kind: DiscreteKind,
    pub button: Button,
    pub hold_ms: f64,
}

/// Press/release detector over the mouth ratio or an explicit flag
#[derive(Debug, Clone)]
pub struct GestureDetector {
    config: GestureConfig,
    pressed_at: Option<f64>,
}

impl GestureDetector {
    #[must_use]
    pub const fn new(config: GestureConfig) -> Self {
        Self {
            config,
            pressed_at: None,
        }
    }

    /// Advance one frame
    ///
    /// `explicit` overrides the ratio when the host reports the gesture
    /// directly. With neither input a hold in progress is cancelled.
    pub fn update(&mut self, ratio: Option<f64>, explicit: Option<bool>, now: f64) -> Option<GestureRelease> {
        if !self.config.enabled {
            self.pressed_at = None;
            return None;
        }
        let engaged = match (explicit, ratio.filter(|r| r.is_finite())) {
            (Some(active), _) => active,
            (None, Some(r)) if self.pressed_at.is_some() => r > self.config.close_ratio,
            (None, Some(r)) => r >= self.config.open_ratio,
            (None, None) => {
                if self.pressed_at.take().is_some() {
                    debug!("Gesture cancelled: input lost");
                }
                return None;
            }
        };

        match (engaged, self.pressed_at) {
            (true, None) => {
                self.pressed_at = Some(now);
                None
            }
            (false, Some(pressed_at)) => {
                self.pressed_at = None;
                self.classify(now - pressed_at)
            }
            _ => None,
        }
    }

    fn classify(&self, hold_ms: f64) -> Option<GestureRelease> {
        let (kind, button) = if hold_ms < self.config.short_hold_ms || hold_ms > self.config.max_hold_ms {
            debug!("Gesture hold of {hold_ms:.0} ms ignored");
            return None;
        } else if hold_ms >= self.config.long_hold_ms {
            (DiscreteKind::Long, self.config.long_button)
        } else {
            (DiscreteKind::Short, self.config.short_button)
        };
        Some(GestureRelease { kind, button, hold_ms })
    }

    #[must_use]
    pub const fn is_pressed(&self) -> bool {
        self.pressed_at.is_some()
    }

    pub fn set_config(&mut self, config: GestureConfig) {
        self.config = config;
        self.pressed_at = None;
    }

    pub fn reset(&mut self) {
        self.pressed_at = None;
    }
}

/// The discrete action followed by its press/move/release sequence
#[must_use]
pub fn action_events(release: &GestureRelease, target: Option<TargetId>, point: Point) -> Vec<Event> {
    let button = release.button;
    let finish = match button {
        Button::Left => SyntheticPointerKind::Click,
        Button::Right => SyntheticPointerKind::ContextMenu,
    };
    let mut events = vec![Event::DiscreteAction {
        kind: release.kind,
        button,
        target,
        x: point.x,
        y: point.y,
    }];
    events.extend(
        [
            SyntheticPointerKind::PointerDown,
            SyntheticPointerKind::PointerMove,
            SyntheticPointerKind::PointerUp,
            finish,
        ]
        .into_iter()
        .map(|kind| Event::SyntheticPointer {
            kind,
            button,
            target,
            x: point.x,
            y: point.y,
        }),
    );
    events
}
