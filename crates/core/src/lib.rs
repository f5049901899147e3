//! Shared data model for the Oxum boost rotation engine.

pub mod clock;
pub mod profile;

pub use clock::{Clock, ManualClock, SystemClock};
pub use profile::{ProfileScoreData, ProfileStatus, QueueFilters};
