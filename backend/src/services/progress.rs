//! Progress reporting over a user's recent activities
//!
//! Figures are computed from the counts stored on each activity, which the
//! reconciler keeps in step with the item records.

use crate::error::ServiceError;
use crate::store::ActivityStore;
use chrono::NaiveDate;
use fitness_coach_shared::{Activity, ActivityContent, ActivityKind, ActivityStatus};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Activities considered per kind
pub const REPORT_WINDOW: usize = 30;
const RECENT_WORKOUTS: usize = 5;
const RECENT_DIETS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tally {
    pub total: u32,
    pub completed: u32,
    pub skipped: u32,
    pub completion_percent: f64,
}

impl Tally {
    fn finish(mut self) -> Self {
        self.completion_percent = percent(self.completed, self.total);
        self
    }
}

fn percent(part: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    ((part as f64 / total as f64) * 1000.0).round() / 10.0
}

/// One line of the recent activity list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitySummary {
    pub id: Uuid,
    pub kind: ActivityKind,
    pub scheduled_date: NaiveDate,
    /// Workout type, or "Diet Plan"
    pub label: String,
    pub status: ActivityStatus,
    pub total: u32,
    pub completed: u32,
    pub skipped: u32,
}

impl From<&Activity> for ActivitySummary {
    fn from(activity: &Activity) -> Self {
        let label = match &activity.content {
            ActivityContent::Workout(w) => w.workout_type.clone(),
            ActivityContent::Diet(_) => "Diet Plan".to_string(),
        };
        Self {
            id: activity.id,
            kind: activity.kind(),
            scheduled_date: activity.scheduled_date,
            label,
            status: activity.status,
            total: activity.total_items,
            completed: activity.completed_items,
            skipped: activity.skipped_items,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressReport {
    pub user_id: i64,
    pub workouts: Tally,
    pub exercises: Tally,
    pub diets: Tally,
    pub meals: Tally,
    /// Workouts per muscle group
    pub muscle_groups: BTreeMap<String, u32>,
    pub recent_workouts: Vec<ActivitySummary>,
    pub recent_diets: Vec<ActivitySummary>,
}

impl ProgressReport {
    /// Build a report from workouts and diet plans, each newest first
    pub fn from_activities(user_id: i64, workouts: &[Activity], diets: &[Activity]) -> Self {
        let (workout_tally, exercise_tally) = tally(workouts);
        let (diet_tally, meal_tally) = tally(diets);

        let mut muscle_groups = BTreeMap::new();
        for workout in workouts {
            if let ActivityContent::Workout(content) = &workout.content {
                *muscle_groups.entry(content.workout_type.clone()).or_insert(0) += 1;
            }
        }

        Self {
            user_id,
            workouts: workout_tally,
            exercises: exercise_tally,
            diets: diet_tally,
            meals: meal_tally,
            muscle_groups,
            recent_workouts: workouts.iter().take(RECENT_WORKOUTS).map(Into::into).collect(),
            recent_diets: diets.iter().take(RECENT_DIETS).map(Into::into).collect(),
        }
    }
}

/// Activity-level and item-level tallies
fn tally(activities: &[Activity]) -> (Tally, Tally) {
    let mut parents = Tally::default();
    let mut items = Tally::default();
    for activity in activities {
        parents.total += 1;
        match activity.status {
            ActivityStatus::Completed => parents.completed += 1,
            ActivityStatus::Skipped => parents.skipped += 1,
            ActivityStatus::Scheduled => {}
        }
        items.total += activity.total_items;
        items.completed += activity.completed_items;
        items.skipped += activity.skipped_items;
    }
    (parents.finish(), items.finish())
}

/// Aggregated statistics for the progress report
pub struct ProgressService;

impl ProgressService {
    pub async fn user_progress(
        store: &dyn ActivityStore,
        user_id: i64,
    ) -> Result<ProgressReport, ServiceError> {
        let workouts = store
            .recent_activities(ActivityKind::Workout, user_id, REPORT_WINDOW)
            .await?;
        let diets = store
            .recent_activities(ActivityKind::Diet, user_id, REPORT_WINDOW)
            .await?;

        Ok(ProgressReport::from_activities(user_id, &workouts, &diets))
    }
}
