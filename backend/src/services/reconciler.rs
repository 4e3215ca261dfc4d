//! Completion reconciler
//!
//! Recomputes the aggregate counts and status of a workout or diet plan from
//! its item records. Reconciling twice without new records writes the same
//! values again, so callers may invoke it freely.

use crate::error::ServiceError;
use crate::store::ActivityStore;
use chrono::{DateTime, Utc};
use fitness_coach_shared::{Activity, ActivityKind, ActivityProgress};
use tracing::{debug, info};
use uuid::Uuid;

/// Upper bound on recompute rounds under concurrent item taps
const RECONCILE_PASSES: u32 = 4;

pub struct CompletionReconciler;

impl CompletionReconciler {
    /// Reconcile one activity and persist the result
    ///
    /// The completion timestamp is set the first time the activity reaches a
    /// terminal status and kept afterwards. Item records are insert-only, so
    /// when more of them appear while saving the counts are recomputed; the
    /// last writer therefore always saves counts covering every record it saw.
    pub async fn reconcile(
        store: &dyn ActivityStore,
        kind: ActivityKind,
        activity_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(Activity, ActivityProgress), ServiceError> {
        let mut activity = store
            .get_activity(kind, activity_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(not_found_label(kind)))?;
        let mut completions = store.list_item_completions(kind, activity_id).await?;

        let mut pass = 1;
        loop {
            let total = Self::total_items(&activity);
            let progress = ActivityProgress::reconcile(
                activity.status,
                total,
                completions.iter().map(|c| c.status),
            );

            let completed_at = match activity.completed_at {
                Some(at) => Some(at),
                None if progress.status.is_terminal() => Some(now),
                None => None,
            };

            if progress == activity.progress() && completed_at == activity.completed_at {
                debug!(%activity_id, kind = %kind, "Activity already reconciled");
                return Ok((activity, progress));
            }

            if !store
                .save_activity_progress(kind, activity_id, &progress, completed_at)
                .await?
            {
                return Err(ServiceError::NotFound(not_found_label(kind)));
            }

            if progress.status != activity.status {
                info!(
                    %activity_id,
                    kind = %kind,
                    from = %activity.status,
                    to = %progress.status,
                    completed = progress.completed,
                    skipped = progress.skipped,
                    total = progress.total,
                    "Activity status changed"
                );
            }

            activity = Activity {
                status: progress.status,
                total_items: progress.total,
                completed_items: progress.completed,
                skipped_items: progress.skipped,
                completed_at,
                ..activity
            };

            let latest = store.list_item_completions(kind, activity_id).await?;
            if latest.len() == completions.len() || pass >= RECONCILE_PASSES {
                return Ok((activity, progress));
            }
            debug!(%activity_id, kind = %kind, pass, "Item records changed while saving");
            completions = latest;
            pass += 1;
        }
    }

    /// Item total used by the status rule
    ///
    /// Diet plans count meals plus snacks of the stored content; workouts use
    /// the exercise count recorded when the workout was stored.
    pub fn total_items(activity: &Activity) -> u32 {
        match activity.kind() {
            ActivityKind::Workout => activity.total_items,
            ActivityKind::Diet => activity.content.item_count(),
        }
    }
}

pub(crate) fn not_found_label(kind: ActivityKind) -> String {
    match kind {
        ActivityKind::Workout => "Workout".to_string(),
        ActivityKind::Diet => "Diet plan".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::fallback;
    use crate::store::{MemoryStore, NewActivity, NewItemCompletion};
    use chrono::NaiveDate;
    use fitness_coach_shared::{
        ActivityContent, ActivityStatus, Exercise, ItemRef, ItemStatus, MealSlot,
    };
    use proptest::prelude::*;

    fn workout_content(exercises: u32) -> ActivityContent {
        let mut content = fallback::workout("Legs", None);
        content.exercises = (0..exercises)
            .map(|i| Exercise::new(format!("Move {}", i), 3, "10"))
            .collect();
        ActivityContent::Workout(content)
    }

    async fn seed(store: &MemoryStore, content: ActivityContent) -> Activity {
        store
            .insert_activity(NewActivity {
                user_id: 1,
                content,
                scheduled_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            })
            .await
            .unwrap()
    }

    async fn record(store: &MemoryStore, activity: &Activity, item: ItemRef, status: ItemStatus) {
        store
            .insert_item_completion(NewItemCompletion {
                activity_kind: activity.kind(),
                activity_id: activity.id,
                item,
                item_name: "item".to_string(),
                status,
                recorded_at: Utc::now(),
            })
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_three_done_two_skipped_completes() {
        let store = MemoryStore::new();
        let workout = seed(&store, workout_content(5)).await;
        for i in 0..3 {
            record(&store, &workout, ItemRef::Exercise(i), ItemStatus::Completed).await;
        }
        for i in 3..5 {
            record(&store, &workout, ItemRef::Exercise(i), ItemStatus::Skipped).await;
        }

        let (activity, progress) =
            CompletionReconciler::reconcile(&store, ActivityKind::Workout, workout.id, Utc::now())
                .await
                .unwrap();
        assert_eq!(progress.status, ActivityStatus::Completed);
        assert_eq!((progress.completed, progress.skipped), (3, 2));
        assert!(activity.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_all_skipped_is_skipped() {
        let store = MemoryStore::new();
        let workout = seed(&store, workout_content(5)).await;
        for i in 0..5 {
            record(&store, &workout, ItemRef::Exercise(i), ItemStatus::Skipped).await;
        }

        let (_, progress) =
            CompletionReconciler::reconcile(&store, ActivityKind::Workout, workout.id, Utc::now())
                .await
                .unwrap();
        assert_eq!(progress.status, ActivityStatus::Skipped);
    }

    #[tokio::test]
    async fn test_four_of_five_stays_scheduled() {
        let store = MemoryStore::new();
        let workout = seed(&store, workout_content(5)).await;
        for i in 0..4 {
            record(&store, &workout, ItemRef::Exercise(i), ItemStatus::Completed).await;
        }

        let (activity, progress) =
            CompletionReconciler::reconcile(&store, ActivityKind::Workout, workout.id, Utc::now())
                .await
                .unwrap();
        assert_eq!(progress.status, ActivityStatus::Scheduled);
        assert_eq!(progress.completed, 4);
        assert!(activity.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let store = MemoryStore::new();
        let diet = seed(&store, ActivityContent::Diet(fallback::diet())).await;
        record(&store, &diet, ItemRef::Meal(MealSlot::Lunch), ItemStatus::Completed).await;

        let first = CompletionReconciler::reconcile(&store, ActivityKind::Diet, diet.id, Utc::now())
            .await
            .unwrap();
        let second =
            CompletionReconciler::reconcile(&store, ActivityKind::Diet, diet.id, Utc::now())
                .await
                .unwrap();
        assert_eq!(first, second);
        assert_eq!(first.1.total, 5);

        let stored = store
            .get_activity(ActivityKind::Diet, diet.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.completed_items, 1);
    }

    #[tokio::test]
    async fn test_missing_activity_is_not_found() {
        let store = MemoryStore::new();
        let result = CompletionReconciler::reconcile(
            &store,
            ActivityKind::Workout,
            Uuid::new_v4(),
            Utc::now(),
        )
        .await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Reconciling any set of outcomes twice yields identical state
        #[test]
        fn prop_reconcile_twice_is_stable(outcomes in proptest::collection::vec(any::<bool>(), 1..8)) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async {
                let store = MemoryStore::new();
                let workout = seed(&store, workout_content(outcomes.len() as u32)).await;
                for (i, done) in outcomes.iter().enumerate() {
                    let status = if *done { ItemStatus::Completed } else { ItemStatus::Skipped };
                    record(&store, &workout, ItemRef::Exercise(i as u32), status).await;
                }

                let now = Utc::now();
                let first = CompletionReconciler::reconcile(&store, ActivityKind::Workout, workout.id, now)
                    .await
                    .unwrap();
                let second = CompletionReconciler::reconcile(&store, ActivityKind::Workout, workout.id, now)
                    .await
                    .unwrap();
                assert_eq!(first, second);
                assert!(first.1.status.is_terminal());
            });
        }
    }
}
