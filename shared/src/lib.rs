//! Fitness Coach Shared Library
//!
//! Domain types used by the backend: activity and reminder models, the
//! completion status rule, reminder time arithmetic, and the callback
//! action codec used by chat controls.

pub mod errors;
pub mod models;
pub mod progress;
pub mod schedule;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use errors::*;
pub use models::*;
pub use progress::ActivityProgress;
pub use schedule::{fire_at, fire_time, parse_clock_time, DailyTimes, REMINDER_LEAD_MINUTES};
pub use types::*;
