//! Business logic services
//!
//! Leaves first: the reconciler and scheduler only touch the store; the
//! dispatcher and callback service add the chat transport; the schedule
//! service adds content generation.

pub mod callbacks;
pub mod dispatcher;
pub mod profile;
pub mod progress;
pub mod reconciler;
pub mod render;
pub mod schedule;
pub mod scheduler;

pub use callbacks::{CallbackService, ItemOutcome, ReminderOutcome};
pub use dispatcher::{ReminderDispatcher, TickReport};
pub use profile::{ProfileService, ProfileUpdate};
pub use progress::{ProgressReport, ProgressService};
pub use reconciler::CompletionReconciler;
pub use schedule::{DailySchedule, ScheduleService};
pub use scheduler::ReminderScheduler;
