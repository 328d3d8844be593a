//! Voice module - ephemeral channels driven by voice membership.
//!
//! - `transition` - Join/leave/switch derived from voice state updates
//! - `tracker` - Member counts of managed channels
//! - `processor` - Per-transition decisions and platform calls

mod processor;
mod tracker;
mod transition;

pub use processor::{Outcome, VoiceEventProcessor};
pub use tracker::OccupancyTracker;
pub use transition::VoiceTransition;
