//! # Budva Bot Watch
//!
//! The periodic-poll-and-notify core: a strict-decrease change detector
//! for the sea-water temperature, a first-sight set for flare events,
//! and the tokio interval loops that drive both.

pub mod detector;
pub mod engine;
pub mod seen;

pub use detector::{ChangeDetector, DropEvent};
pub use engine::{spawn_flare_watch, spawn_water_watch};
pub use seen::SeenFlares;
