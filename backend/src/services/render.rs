//! Chat message rendering
//!
//! Texts use Telegram's legacy Markdown, where `*bold*` is a single star.

use super::progress::{ActivitySummary, ProgressReport};
use fitness_coach_shared::schedule::format_clock_time;
use fitness_coach_shared::{
    Action, Activity, ActivityContent, ActivityProgress, ActivityStatus, CallbackAction, Control,
    ItemRef, ItemStatus, MealSlot, Notification, Reminder, ReminderCategory, ReminderSnapshot,
};

/// Exercises listed in a workout reminder before summarizing the rest
const LISTED_EXERCISES: usize = 5;

fn category_emoji(category: ReminderCategory) -> &'static str {
    match category {
        ReminderCategory::Workout => "💪",
        ReminderCategory::Breakfast => "🍳",
        ReminderCategory::Lunch => "🍽️",
        ReminderCategory::Dinner => "🍴",
        ReminderCategory::Snack => "🍎",
    }
}

fn status_emoji(status: ItemStatus) -> &'static str {
    match status {
        ItemStatus::Completed => "✅",
        ItemStatus::Skipped => "⏭️",
    }
}

fn calories(value: Option<u32>) -> String {
    value.map(|c| c.to_string()).unwrap_or_else(|| "N/A".to_string())
}

fn meal_title(category: ReminderCategory) -> &'static str {
    category.meal_slot().map(|slot| slot.title()).unwrap_or("Meal")
}

// ============================================================================
// Reminders
// ============================================================================

/// Message and controls for a due reminder
///
/// `activity` is the related workout or diet plan; when it can no longer be
/// loaded the reminder still goes out with reminder-level controls.
pub fn reminder_notification(reminder: &Reminder, activity: Option<&Activity>) -> Notification {
    let text = reminder_text(reminder, activity);
    let controls = match (reminder.category, activity) {
        (ReminderCategory::Workout, Some(activity)) => workout_controls(reminder, activity),
        (category, Some(activity)) if activity.kind() == category.activity_kind() => {
            meal_controls(reminder, activity)
        }
        _ => reminder_controls(reminder, "✅ Complete", "⏭️ Skip"),
    };
    Notification::with_controls(text, controls)
}

fn reminder_text(reminder: &Reminder, activity: Option<&Activity>) -> String {
    let emoji = category_emoji(reminder.category);
    let at = format_clock_time(reminder.target_time);

    match &reminder.snapshot {
        ReminderSnapshot::Workout {
            workout_type,
            duration_minutes,
            calories_estimate,
        } => {
            let mut text = format!(
                "{emoji} *Workout Reminder*\n\n\
                 Time to get moving! Your workout is scheduled for {at}.\n\n\
                 🎯 *Today's Focus*: {workout_type}\n\
                 ⏱️ *Duration*: {duration_minutes} minutes\n\
                 🔥 *Est. Calories*: {}\n\n",
                calories(*calories_estimate),
            );

            if let Some(ActivityContent::Workout(workout)) = activity.map(|a| &a.content) {
                if !workout.exercises.is_empty() {
                    text.push_str("*Today's Exercises:*\n");
                    for (i, exercise) in workout.exercises.iter().take(LISTED_EXERCISES).enumerate() {
                        text.push_str(&format!(
                            "{}. {} - {} sets × {} reps\n",
                            i + 1,
                            exercise.name,
                            exercise.sets.as_deref().unwrap_or("3"),
                            exercise.reps.as_deref().unwrap_or("10-12"),
                        ));
                    }
                    if workout.exercises.len() > LISTED_EXERCISES {
                        text.push_str(&format!(
                            "... and {} more exercises\n",
                            workout.exercises.len() - LISTED_EXERCISES
                        ));
                    }
                    text.push('\n');
                }
            }

            text.push_str(
                "Get ready to crush your fitness goals! 💪\n\n\
                 Use the buttons below to track your progress!",
            );
            text
        }
        ReminderSnapshot::Meal {
            meal_name,
            total_calories,
        } => {
            let title = meal_title(reminder.category);
            let lower = title.to_lowercase();
            format!(
                "{emoji} *{title} Reminder*\n\n\
                 Time for {lower}! Scheduled for {at}.\n\n\
                 🥗 *Today's {title} Plan*:\n\
                 • {meal_name}\n\
                 • {} calories\n\n\
                 Stay on track with your nutrition goals! 🎯\n\n\
                 Tap 'Complete' when you finish your {lower}, or 'Skip' if you need to reschedule.",
                calories(*total_calories),
            )
        }
    }
}

fn reminder_controls(reminder: &Reminder, complete: &str, skip: &str) -> Vec<Vec<Control>> {
    vec![vec![
        Control::new(complete, CallbackAction::reminder(reminder.id, Action::Complete)),
        Control::new(skip, CallbackAction::reminder(reminder.id, Action::Skip)),
    ]]
}

/// One complete/skip row per exercise, then whole-workout controls
fn workout_controls(reminder: &Reminder, workout: &Activity) -> Vec<Vec<Control>> {
    let mut rows: Vec<Vec<Control>> = (0..workout.content.item_count())
        .map(|index| {
            let item = ItemRef::Exercise(index);
            vec![
                Control::new(
                    format!("✅ Complete {}", index + 1),
                    CallbackAction::item(workout.id, item, Action::Complete),
                ),
                Control::new(
                    format!("⏭️ Skip {}", index + 1),
                    CallbackAction::item(workout.id, item, Action::Skip),
                ),
            ]
        })
        .collect();

    rows.extend(reminder_controls(reminder, "🎉 Complete All", "⏭️ Skip All"));
    rows
}

/// Done/skip for the meal slot; dinner also offers the progress report
fn meal_controls(reminder: &Reminder, diet: &Activity) -> Vec<Vec<Control>> {
    let Some(slot) = reminder.category.meal_slot() else {
        return reminder_controls(reminder, "✅ Complete", "⏭️ Skip");
    };

    let item = ItemRef::Meal(slot);
    let mut rows = vec![vec![
        Control::new("✅ Done", CallbackAction::item(diet.id, item, Action::Complete)),
        Control::new("⏭️ Skip", CallbackAction::item(diet.id, item, Action::Skip)),
    ]];
    if slot == MealSlot::Dinner {
        rows.push(vec![view_progress()]);
    }
    rows
}

fn view_progress() -> Control {
    Control::new("📊 View Progress", CallbackAction::ShowProgress)
}

// ============================================================================
// Item actions
// ============================================================================

/// Updated reminder message after an item was completed or skipped
///
/// The tapped item's controls are removed and a progress line is appended.
/// Once every item is accounted for the keyboard collapses to one status
/// control.
pub fn item_progress(
    current: &Notification,
    activity: &Activity,
    item: ItemRef,
    status: ItemStatus,
    progress: &ActivityProgress,
) -> Notification {
    let emoji = status_emoji(status);
    let mut text = current.text.clone();

    let mut controls: Vec<Vec<Control>> = current
        .controls
        .iter()
        .filter(|row| {
            !row.iter().any(|c| {
                matches!(
                    c.action,
                    CallbackAction::Item { activity_id, item: tapped, .. }
                        if activity_id == activity.id && tapped == item
                )
            })
        })
        .cloned()
        .collect();

    match item {
        ItemRef::Exercise(index) => {
            let prefix = format!("{}. ", index + 1);
            text = text
                .lines()
                .map(|line| {
                    if line.starts_with(&prefix) {
                        format!("{} {}", line, emoji)
                    } else {
                        line.to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join("\n");

            text.push_str(&format!(
                "\n\n{emoji} Exercise {} {}!\n📊 Progress: {} completed, {} skipped out of {} exercises",
                index + 1,
                status,
                progress.completed,
                progress.skipped,
                progress.total,
            ));

            if progress.is_settled() {
                let label = if progress.status == ActivityStatus::Skipped {
                    text.push_str("\n⏭️ Workout marked as skipped (all exercises skipped)");
                    "⏭️ Workout Skipped".to_string()
                } else {
                    text.push_str(&format!(
                        "\n🎉 Workout marked as completed ({} exercises completed)",
                        progress.completed
                    ));
                    format!("🎉 Workout Complete ({}/{})", progress.completed, progress.total)
                };
                controls = vec![vec![Control::new(label, CallbackAction::ShowProgress)]];
            }
        }
        ItemRef::Meal(slot) => {
            let verb = match status {
                ItemStatus::Completed => "Completed",
                ItemStatus::Skipped => "Skipped",
            };
            text.push_str(&format!(
                "\n\n{emoji} *{} {verb}!*\n📊 Progress: {} completed, {} skipped out of {} meals",
                slot.title(),
                progress.completed,
                progress.skipped,
                progress.total,
            ));

            if progress.is_settled() {
                text.push_str(&format!("\n🎉 Diet plan marked as {}", progress.status));
            }
            if slot == MealSlot::Dinner || progress.is_settled() {
                controls = vec![vec![view_progress()]];
            }
        }
    }

    Notification::with_controls(text, controls)
}

/// Toast shown when the item already has an outcome
pub fn already_recorded(item: ItemRef, status: ItemStatus) -> String {
    match item {
        ItemRef::Exercise(_) => format!("⚠️ This exercise was already marked as {}.", status),
        ItemRef::Meal(_) => format!("⚠️ This meal was already marked as {}.", status),
    }
}

// ============================================================================
// Reminder actions
// ============================================================================

/// Confirmation sent after a whole-activity complete or skip
pub fn reminder_confirmation(
    reminder: &Reminder,
    activity: &Activity,
    action: Action,
) -> Notification {
    let text = match (&activity.content, action) {
        (ActivityContent::Workout(workout), Action::Complete) => format!(
            "🎉 *Workout Completed!* 💪\n\n\
             Great job finishing your {} workout!\n\
             You burned approximately {} calories.\n\n\
             🏆 Keep up the amazing work! Your consistency is building strength and discipline.",
            workout.workout_type,
            workout.calories_estimate.unwrap_or(200),
        ),
        (ActivityContent::Workout(_), Action::Skip) => "⏭️ *Workout Skipped*\n\n\
             No worries! You can always try again later. Remember, consistency is key to \
             achieving your fitness goals! 💪"
            .to_string(),
        (ActivityContent::Diet(_), Action::Complete) => format!(
            "✅ *{} Completed!*\n\n\
             Great job following your nutrition plan! Keep up the healthy eating habits! 💪",
            meal_title(reminder.category),
        ),
        (ActivityContent::Diet(_), Action::Skip) => format!(
            "⏭️ *{} Skipped*\n\n\
             No worries! Remember to maintain a balanced diet for your health goals! 🥗",
            meal_title(reminder.category),
        ),
    };
    Notification::text(text)
}

pub fn not_found(what: &str) -> String {
    format!("❌ {} not found. Please try again.", what)
}

// ============================================================================
// Progress
// ============================================================================

fn summary_line(summary: &ActivitySummary, unit: &str) -> String {
    let emoji = match summary.status {
        ActivityStatus::Completed => "✅",
        ActivityStatus::Skipped => "⏭️",
        ActivityStatus::Scheduled => "⏳",
    };
    format!(
        "{emoji} {} - {} ({} completed, {} skipped out of {} {unit})\n",
        summary.scheduled_date, summary.label, summary.completed, summary.skipped, summary.total,
    )
}

/// Text form of the progress report
pub fn progress_report(report: &ProgressReport) -> Notification {
    let mut text = String::from("📊 *Your Fitness Progress Report*\n\n🎯 *Overall Statistics*\n");
    text.push_str(&format!("• Total Workouts: {}\n", report.workouts.total));
    text.push_str(&format!(
        "• Completed Workouts: {} ({:.1}%)\n",
        report.workouts.completed, report.workouts.completion_percent
    ));
    text.push_str(&format!("• Skipped Workouts: {}\n", report.workouts.skipped));
    text.push_str(&format!("• Total Exercises: {}\n", report.exercises.total));
    text.push_str(&format!(
        "• Completed Exercises: {} ({:.1}%)\n",
        report.exercises.completed, report.exercises.completion_percent
    ));
    text.push_str(&format!("• Skipped Exercises: {}\n", report.exercises.skipped));
    text.push_str(&format!(
        "• Diet Plans Followed: {}/{} ({:.1}%)\n",
        report.diets.completed, report.diets.total, report.diets.completion_percent
    ));
    text.push_str(&format!("• Skipped Diet Plans: {}\n", report.diets.skipped));
    text.push_str(&format!("• Total Meals: {}\n", report.meals.total));
    text.push_str(&format!(
        "• Completed Meals: {} ({:.1}%)\n",
        report.meals.completed, report.meals.completion_percent
    ));
    text.push_str(&format!("• Skipped Meals: {}\n", report.meals.skipped));

    if !report.muscle_groups.is_empty() {
        text.push_str("\n💪 *Muscle Groups*\n");
        for (group, count) in &report.muscle_groups {
            text.push_str(&format!("• {}: {}\n", group, count));
        }
    }

    if !report.recent_workouts.is_empty() {
        text.push_str("\n📅 *Recent Activity*\n");
        for summary in &report.recent_workouts {
            text.push_str(&summary_line(summary, "exercises"));
        }
    }

    if !report.recent_diets.is_empty() {
        text.push_str("\n🍽️ *Recent Diet Activity*\n");
        for summary in &report.recent_diets {
            text.push_str(&summary_line(summary, "meals"));
        }
    }

    Notification::text(text.trim_end().to_string())
}
