//! Aggregate status of an activity derived from its item records

use serde::{Deserialize, Serialize};

use crate::models::{ActivityStatus, ItemStatus};

/// Counts and status of one activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityProgress {
    pub total: u32,
    pub completed: u32,
    pub skipped: u32,
    pub status: ActivityStatus,
}

impl ActivityProgress {
    /// Recompute progress from item outcomes
    ///
    /// Counts are clamped so that `completed + skipped <= total`. Once every
    /// item is accounted for the status becomes `Completed` if anything was
    /// completed and `Skipped` if everything was skipped. Before that point
    /// the current status is kept, which also preserves a terminal status set
    /// directly through a reminder action. An activity without items never
    /// changes status here.
    pub fn reconcile<I>(current: ActivityStatus, total: u32, outcomes: I) -> Self
    where
        I: IntoIterator<Item = ItemStatus>,
    {
        let (mut completed, mut skipped) = (0u32, 0u32);
        for outcome in outcomes {
            match outcome {
                ItemStatus::Completed => completed += 1,
                ItemStatus::Skipped => skipped += 1,
            }
        }

        let completed = completed.min(total);
        let skipped = skipped.min(total - completed);

        let status = if total > 0 && completed + skipped >= total {
            if completed > 0 {
                ActivityStatus::Completed
            } else {
                ActivityStatus::Skipped
            }
        } else {
            current
        };

        Self {
            total,
            completed,
            skipped,
            status,
        }
    }

    pub fn accounted(&self) -> u32 {
        self.completed + self.skipped
    }

    /// All items have an outcome
    pub fn is_settled(&self) -> bool {
        self.total > 0 && self.accounted() >= self.total
    }

    pub fn remaining(&self) -> u32 {
        self.total.saturating_sub(self.accounted())
    }

    /// Share of items completed, rounded to one decimal place
    pub fn completion_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        ((self.completed as f64 / self.total as f64) * 1000.0).round() / 10.0
    }
}
