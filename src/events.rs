//! Events emitted to downstream UI and interaction consumers.

use crate::{geometry::Point, page::TargetId};
use serde::{Deserialize, Serialize};

/// Mouse button used by synthesized interactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    Left,
    Right,
}

/// Coarse lifecycle phase for UI feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Loading,
    Ready,
    Calibrating,
    Live,
}

/// Length class of a held gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscreteKind {
    Short,
    Long,
}

/// Edge-scroll direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
}

/// Step of a synthesized press/move/release sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticPointerKind {
    PointerDown,
    PointerMove,
    PointerUp,
    Click,
    ContextMenu,
}

/// Everything the pipeline reports to its host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// Throttled pointer position
    PointerUpdate {
        x: f64,
        y: f64,
        confidence: f64,
        timestamp: f64,
    },
    /// Lifecycle phase change or status note
    Status { phase: Phase, note: Option<String> },
    /// Dwell completed on a target
    DwellTrigger { target: TargetId, timestamp: f64 },
    /// Gesture released after a qualifying hold
    DiscreteAction {
        kind: DiscreteKind,
        button: Button,
        target: Option<TargetId>,
        x: f64,
        y: f64,
    },
    /// One step of the synthesized input sequence following a discrete action
    SyntheticPointer {
        kind: SyntheticPointerKind,
        button: Button,
        target: Option<TargetId>,
        x: f64,
        y: f64,
    },
    /// Edge-band hold completed
    ScrollStep { direction: ScrollDirection, magnitude: f64 },
}

impl Event {
    #[must_use]
    pub fn pointer_update(point: Point, confidence: f64, timestamp: f64) -> Self {
        Self::PointerUpdate {
            x: point.x,
            y: point.y,
            confidence,
            timestamp,
        }
    }

    #[must_use]
    pub const fn is_dwell_trigger(&self) -> bool {
        matches!(self, Self::DwellTrigger { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_tag() {
        let event = Event::ScrollStep {
            direction: ScrollDirection::Down,
            magnitude: 60.0,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"event":"scroll_step","direction":"down","magnitude":60.0}"#);
    }

    #[test]
    fn test_button_names() {
        let button: Button = serde_yaml::from_str("right").unwrap();
        assert_eq!(button, Button::Right);
    }
}
