//! Helper functions and utilities for tests

#![allow(dead_code)]

use gaze_dwell::{
    config::LandmarkLayout,
    events::{Event, Phase},
    geometry::{Rect, Viewport},
    page::{StaticPage, TargetId},
    pipeline::FrameInput,
    signal::{Detection, FaceLandmarks, GazePrediction, Landmark},
};

/// Viewport used by most tests
pub const fn test_viewport() -> Viewport {
    Viewport::new(1280.0, 720.0)
}

/// Frame carrying a pixel-space gaze prediction
pub fn gaze_frame(timestamp: f64, x: f64, y: f64) -> FrameInput {
    FrameInput {
        timestamp,
        viewport: test_viewport(),
        detection: Detection {
            face: None,
            gaze: Some(GazePrediction {
                x,
                y,
                score: 0.9,
                normalized: false,
            }),
        },
        gesture_active: None,
    }
}

/// Frame with no detection at all
pub fn empty_frame(timestamp: f64) -> FrameInput {
    FrameInput {
        timestamp,
        viewport: test_viewport(),
        ..FrameInput::default()
    }
}

/// Landmark set with eyes, nose and lips at the given normalized positions
pub fn face_landmarks(left_eye: (f64, f64), right_eye: (f64, f64), nose: (f64, f64), mouth_gap: f64) -> FaceLandmarks {
    let layout = LandmarkLayout::default();
    let mut points = vec![None; layout.expected_points];
    points[layout.left_eye] = Some(Landmark::new(left_eye.0, left_eye.1));
    points[layout.right_eye] = Some(Landmark::new(right_eye.0, right_eye.1));
    points[layout.nose_tip] = Some(Landmark::new(nose.0, nose.1));
    points[layout.upper_lip] = Some(Landmark::new(nose.0, nose.1 + 0.05));
    points[layout.lower_lip] = Some(Landmark::new(nose.0, nose.1 + 0.05 + mouth_gap));
    FaceLandmarks {
        points,
        score: Some(0.9),
    }
}

/// Frame with a near-neutral face looking slightly off-centre by `offset`
pub fn face_frame(timestamp: f64, offset: f64) -> FrameInput {
    FrameInput {
        timestamp,
        viewport: test_viewport(),
        detection: Detection {
            face: Some(face_landmarks((0.4, 0.4), (0.6, 0.4), (0.5 + offset, 0.42), 0.0)),
            gaze: None,
        },
        gesture_active: None,
    }
}

/// Page with a single 100x100 button centred on (300, 300)
pub fn single_button_page() -> StaticPage {
    let mut page = StaticPage::new();
    page.insert(TargetId(1), Rect::new(250.0, 250.0, 100.0, 100.0));
    page
}

/// Page with a grid of `cols` x `rows` buttons of the given size and gap
pub fn grid_page(cols: u32, rows: u32, size: f64, gap: f64) -> StaticPage {
    let mut page = StaticPage::new();
    for row in 0..rows {
        for col in 0..cols {
            let id = TargetId(u64::from(row * cols + col + 1));
            let x = gap + f64::from(col) * (size + gap);
            let y = gap + f64::from(row) * (size + gap);
            page.insert(id, Rect::new(x, y, size, size));
        }
    }
    page
}

/// Timestamps `start, start + step, ...` for `count` frames
pub fn frame_times(start: f64, step: f64, count: u32) -> impl Iterator<Item = f64> {
    (0..count).map(move |i| f64::from(i).mul_add(step, start))
}

pub fn dwell_triggers(events: &[Event]) -> Vec<(TargetId, f64)> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::DwellTrigger { target, timestamp } => Some((*target, *timestamp)),
            _ => None,
        })
        .collect()
}

pub fn statuses(events: &[Event]) -> Vec<(Phase, Option<String>)> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Status { phase, note } => Some((*phase, note.clone())),
            _ => None,
        })
        .collect()
}

pub fn pointer_updates(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, Event::PointerUpdate { .. }))
        .count()
}
