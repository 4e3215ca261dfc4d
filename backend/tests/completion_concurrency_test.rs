//! Concurrent taps on the same item record exactly one outcome

use chrono::{NaiveDate, Utc};
use fitness_coach_backend::{
    generator::fallback,
    services::{CallbackService, ItemOutcome},
    store::{ActivityStore, MemoryStore, NewActivity},
};
use fitness_coach_shared::{Action, ActivityContent, ActivityKind, ItemRef, MealSlot};
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_taps_record_once() {
    let store = Arc::new(MemoryStore::new());
    let diet = store
        .insert_activity(NewActivity {
            user_id: 42,
            content: ActivityContent::Diet(fallback::diet()),
            scheduled_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        })
        .await
        .unwrap();

    let mut handles = Vec::new();
    for n in 0..16 {
        let store = store.clone();
        let action = if n % 2 == 0 { Action::Complete } else { Action::Skip };
        handles.push(tokio::spawn(async move {
            CallbackService::handle_item_action(
                store.as_ref(),
                42,
                diet.id,
                ItemRef::Meal(MealSlot::Lunch),
                action,
                Utc::now(),
            )
            .await
            .unwrap()
        }));
    }

    let mut recorded = 0;
    for handle in handles {
        if matches!(handle.await.unwrap(), ItemOutcome::Recorded { .. }) {
            recorded += 1;
        }
    }
    assert_eq!(recorded, 1);

    let completions = store
        .list_item_completions(ActivityKind::Diet, diet.id)
        .await
        .unwrap();
    assert_eq!(completions.len(), 1);

    let stored = store
        .get_activity(ActivityKind::Diet, diet.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.completed_items + stored.skipped_items, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_taps_on_different_items_all_count() {
    let store = Arc::new(MemoryStore::new());
    let workout = store
        .insert_activity(NewActivity {
            user_id: 42,
            content: ActivityContent::Workout(fallback::workout("Full Body", None)),
            scheduled_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        })
        .await
        .unwrap();

    let handles: Vec<_> = (0..workout.total_items)
        .map(|index| {
            let store = store.clone();
            tokio::spawn(async move {
                CallbackService::handle_item_action(
                    store.as_ref(),
                    42,
                    workout.id,
                    ItemRef::Exercise(index),
                    Action::Complete,
                    Utc::now(),
                )
                .await
                .unwrap()
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let stored = store
        .get_activity(ActivityKind::Workout, workout.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.completed_items, stored.total_items);
    assert_eq!(stored.status.as_str(), "completed");
}
