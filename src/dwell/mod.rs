//! Dwell targeting and the interaction state machines.
//!
//! [`resolver::TargetResolver`] turns the rolling point window into at most
//! one page target, [`snap::StickySnap`] holds on to it against flicker, and
//! [`machine::DwellMachine`] decides when attention on it becomes a trigger.
//! Edge scrolling and gesture actions run beside the dwell machine.
//!
//! None of these report failures. A vanished element or lost stability only
//! moves a machine back toward `Idle`.

/// Edge-band scrolling
pub mod edge_scroll;

/// Held-gesture discrete actions
pub mod gesture;

/// Dwell state machine
pub mod machine;

/// Majority-vote target resolution
pub mod resolver;

/// Sticky targeting
pub mod snap;

pub use edge_scroll::EdgeScroller;
pub use gesture::{GestureDetector, GestureRelease};
pub use machine::{DwellMachine, DwellPhase};
pub use resolver::{Resolution, TargetResolver};
pub use snap::StickySnap;
