//! Data models for the Fitness Coach application
//!
//! Status and category fields are closed enumerations. Their string forms
//! are the values persisted in the database and the ones accepted by the
//! HTTP API.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::DomainError;
use crate::progress::ActivityProgress;

// ============================================================================
// Activities
// ============================================================================

/// Which kind of parent activity an item or reminder refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Workout,
    Diet,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Workout => "workout",
            ActivityKind::Diet => "diet",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "workout" | "workouts" => Ok(ActivityKind::Workout),
            "diet" | "diet_plan" | "diet_plans" => Ok(ActivityKind::Diet),
            _ => Err(DomainError::unknown("activity kind", s)),
        }
    }
}

/// Aggregate status of a workout or diet plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    #[default]
    Scheduled,
    Completed,
    Skipped,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Scheduled => "scheduled",
            ActivityStatus::Completed => "completed",
            ActivityStatus::Skipped => "skipped",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ActivityStatus::Scheduled)
    }
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            // Freshly generated plans were historically stored as "generated"
            "scheduled" | "generated" => Ok(ActivityStatus::Scheduled),
            "completed" => Ok(ActivityStatus::Completed),
            "skipped" => Ok(ActivityStatus::Skipped),
            _ => Err(DomainError::unknown("activity status", s)),
        }
    }
}

/// A workout or diet plan scheduled for one user on one date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    pub id: Uuid,
    pub user_id: i64,
    pub content: ActivityContent,
    pub status: ActivityStatus,
    pub total_items: u32,
    pub completed_items: u32,
    pub skipped_items: u32,
    pub scheduled_date: NaiveDate,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Activity {
    pub fn kind(&self) -> ActivityKind {
        self.content.kind()
    }

    /// Current aggregate counts as recorded on the activity row
    pub fn progress(&self) -> ActivityProgress {
        ActivityProgress {
            total: self.total_items,
            completed: self.completed_items,
            skipped: self.skipped_items,
            status: self.status,
        }
    }
}

// ============================================================================
// Content payloads
// ============================================================================

/// Opaque generated content of an activity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "payload", rename_all = "lowercase")]
pub enum ActivityContent {
    Workout(WorkoutContent),
    Diet(DietContent),
}

impl ActivityContent {
    pub fn kind(&self) -> ActivityKind {
        match self {
            ActivityContent::Workout(_) => ActivityKind::Workout,
            ActivityContent::Diet(_) => ActivityKind::Diet,
        }
    }

    /// Number of trackable items: exercises, or meals plus snacks
    pub fn item_count(&self) -> u32 {
        match self {
            ActivityContent::Workout(w) => w.exercises.len() as u32,
            ActivityContent::Diet(d) => (d.meals.len() + d.snacks.len()) as u32,
        }
    }

    /// Resolve an item reference against this content, returning its display name
    ///
    /// Returns `None` when the item does not exist in this content or belongs
    /// to the other activity kind.
    pub fn item_name(&self, item: ItemRef) -> Option<String> {
        match (self, item) {
            (ActivityContent::Workout(w), ItemRef::Exercise(index)) => w
                .exercises
                .get(index as usize)
                .map(|e| e.name.clone()),
            (ActivityContent::Diet(d), ItemRef::Meal(slot)) => d
                .meal_for_slot(slot)
                .map(|m| m.display_name(slot)),
            _ => None,
        }
    }
}

/// Generated workout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutContent {
    #[serde(default = "default_workout_type")]
    pub workout_type: String,
    #[serde(default = "default_duration_minutes", deserialize_with = "lenient::u32_or_default")]
    pub duration_minutes: u32,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    #[serde(default, deserialize_with = "lenient::optional_u32")]
    pub calories_estimate: Option<u32>,
    /// Warmup, cooldown, tips and anything else the generator returned
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_workout_type() -> String {
    "Full Body".to_string()
}

fn default_duration_minutes() -> u32 {
    30
}

/// One exercise of a workout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub name: String,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub sets: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub reps: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Exercise {
    pub fn new(name: impl Into<String>, sets: u32, reps: &str) -> Self {
        Self {
            name: name.into(),
            sets: Some(sets.to_string()),
            reps: Some(reps.to_string()),
            extra: serde_json::Map::new(),
        }
    }
}

/// Generated diet plan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DietContent {
    #[serde(default)]
    pub meals: Vec<Meal>,
    #[serde(default)]
    pub snacks: Vec<Meal>,
    #[serde(default, deserialize_with = "lenient::optional_u32")]
    pub total_calories: Option<u32>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A meal or snack with its food items kept opaque
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Meal {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
    #[serde(default, deserialize_with = "lenient::optional_u32")]
    pub total_calories: Option<u32>,
}

impl Meal {
    pub fn named(name: &str, total_calories: u32) -> Self {
        Self {
            name: Some(name.to_string()),
            time: None,
            items: Vec::new(),
            total_calories: Some(total_calories),
        }
    }

    /// Name used in notifications
    ///
    /// Falls back to the first food item's name, then to the slot label.
    pub fn display_name(&self, slot: MealSlot) -> String {
        self.name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .or_else(|| {
                self.items
                    .first()
                    .and_then(|item| item.get("name"))
                    .and_then(|name| name.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| slot.title().to_string())
    }
}

// ============================================================================
// Items and completions
// ============================================================================

/// Meal slot a diet item or reminder is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealSlot {
    pub const ALL: [MealSlot; 4] = [
        MealSlot::Breakfast,
        MealSlot::Lunch,
        MealSlot::Dinner,
        MealSlot::Snack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::Lunch => "lunch",
            MealSlot::Dinner => "dinner",
            MealSlot::Snack => "snack",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "Breakfast",
            MealSlot::Lunch => "Lunch",
            MealSlot::Dinner => "Dinner",
            MealSlot::Snack => "Snack",
        }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealSlot {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "breakfast" => Ok(MealSlot::Breakfast),
            "lunch" => Ok(MealSlot::Lunch),
            "dinner" => Ok(MealSlot::Dinner),
            "snack" => Ok(MealSlot::Snack),
            _ => Err(DomainError::unknown("meal slot", s)),
        }
    }
}

/// Identifier of one item inside an activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ItemRef {
    /// Zero-based exercise index
    Exercise(u32),
    Meal(MealSlot),
}

impl ItemRef {
    pub fn activity_kind(&self) -> ActivityKind {
        match self {
            ItemRef::Exercise(_) => ActivityKind::Workout,
            ItemRef::Meal(_) => ActivityKind::Diet,
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemRef::Exercise(index) => write!(f, "{}", index),
            ItemRef::Meal(slot) => f.write_str(slot.as_str()),
        }
    }
}

/// Outcome recorded for one item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Completed,
    Skipped,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Completed => "completed",
            ItemStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "completed" => Ok(ItemStatus::Completed),
            "skipped" => Ok(ItemStatus::Skipped),
            _ => Err(DomainError::unknown("item status", s)),
        }
    }
}

/// What the user asked for when tapping a control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Complete,
    Skip,
}

impl Action {
    pub fn item_status(&self) -> ItemStatus {
        match self {
            Action::Complete => ItemStatus::Completed,
            Action::Skip => ItemStatus::Skipped,
        }
    }

    pub fn activity_status(&self) -> ActivityStatus {
        match self {
            Action::Complete => ActivityStatus::Completed,
            Action::Skip => ActivityStatus::Skipped,
        }
    }

    pub fn reminder_status(&self) -> ReminderStatus {
        match self {
            Action::Complete => ReminderStatus::Completed,
            Action::Skip => ReminderStatus::Skipped,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Complete => "complete",
            Action::Skip => "skip",
        }
    }
}

/// Immutable record that one item was completed or skipped
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemCompletion {
    pub id: Uuid,
    pub activity_kind: ActivityKind,
    pub activity_id: Uuid,
    pub item: ItemRef,
    pub item_name: String,
    pub status: ItemStatus,
    pub recorded_at: DateTime<Utc>,
}

// ============================================================================
// Reminders
// ============================================================================

/// Reminder slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderCategory {
    Workout,
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl ReminderCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderCategory::Workout => "workout",
            ReminderCategory::Breakfast => "breakfast",
            ReminderCategory::Lunch => "lunch",
            ReminderCategory::Dinner => "dinner",
            ReminderCategory::Snack => "snack",
        }
    }

    pub fn activity_kind(&self) -> ActivityKind {
        match self {
            ReminderCategory::Workout => ActivityKind::Workout,
            _ => ActivityKind::Diet,
        }
    }

    pub fn meal_slot(&self) -> Option<MealSlot> {
        match self {
            ReminderCategory::Workout => None,
            ReminderCategory::Breakfast => Some(MealSlot::Breakfast),
            ReminderCategory::Lunch => Some(MealSlot::Lunch),
            ReminderCategory::Dinner => Some(MealSlot::Dinner),
            ReminderCategory::Snack => Some(MealSlot::Snack),
        }
    }
}

impl From<MealSlot> for ReminderCategory {
    fn from(slot: MealSlot) -> Self {
        match slot {
            MealSlot::Breakfast => ReminderCategory::Breakfast,
            MealSlot::Lunch => ReminderCategory::Lunch,
            MealSlot::Dinner => ReminderCategory::Dinner,
            MealSlot::Snack => ReminderCategory::Snack,
        }
    }
}

impl fmt::Display for ReminderCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReminderCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "workout" => Ok(ReminderCategory::Workout),
            "breakfast" => Ok(ReminderCategory::Breakfast),
            "lunch" => Ok(ReminderCategory::Lunch),
            "dinner" => Ok(ReminderCategory::Dinner),
            "snack" => Ok(ReminderCategory::Snack),
            _ => Err(DomainError::unknown("reminder category", s)),
        }
    }
}

/// Reminder lifecycle state
///
/// `Failed` is terminal and only reached from `Pending` once delivery has
/// exhausted its attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Pending,
    Sent,
    Completed,
    Skipped,
    Failed,
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderStatus::Pending => "pending",
            ReminderStatus::Sent => "sent",
            ReminderStatus::Completed => "completed",
            ReminderStatus::Skipped => "skipped",
            ReminderStatus::Failed => "failed",
        }
    }

    /// Whether moving from `self` to `next` respects forward-only ordering
    pub fn can_transition_to(&self, next: ReminderStatus) -> bool {
        use ReminderStatus::*;
        matches!(
            (self, next),
            (Pending, Sent)
                | (Pending, Completed)
                | (Pending, Skipped)
                | (Pending, Failed)
                | (Sent, Completed)
                | (Sent, Skipped)
        )
    }

    pub fn is_open(&self) -> bool {
        matches!(self, ReminderStatus::Pending | ReminderStatus::Sent)
    }
}

impl fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReminderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ReminderStatus::Pending),
            "sent" => Ok(ReminderStatus::Sent),
            "completed" => Ok(ReminderStatus::Completed),
            "skipped" => Ok(ReminderStatus::Skipped),
            "failed" => Ok(ReminderStatus::Failed),
            _ => Err(DomainError::unknown("reminder status", s)),
        }
    }
}

/// Denormalized display fields captured when a reminder is created
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReminderSnapshot {
    Workout {
        workout_type: String,
        duration_minutes: u32,
        calories_estimate: Option<u32>,
    },
    Meal {
        meal_name: String,
        total_calories: Option<u32>,
    },
}

/// A scheduled notification for one activity slot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reminder {
    pub id: Uuid,
    pub user_id: i64,
    pub category: ReminderCategory,
    /// Calendar date of the activity the reminder announces
    pub scheduled_date: NaiveDate,
    /// When the activity itself happens
    pub target_time: NaiveTime,
    /// Wall-clock time of day the reminder fires
    pub fire_time: NaiveTime,
    /// Wall-clock instant the reminder becomes due, already shifted to the
    /// previous day when the lead crosses midnight
    pub fire_at: NaiveDateTime,
    pub snapshot: ReminderSnapshot,
    pub related_id: Uuid,
    pub related_kind: ActivityKind,
    pub status: ReminderStatus,
    pub attempts: u32,
    pub next_attempt_at: Option<NaiveDateTime>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Users
// ============================================================================

/// User profile with daily time preferences
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UserProfile {
    pub user_id: i64,
    pub first_name: Option<String>,
    pub age: Option<i32>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub fitness_level: Option<String>,
    pub goals: Option<String>,
    pub workout_time: Option<NaiveTime>,
    pub breakfast_time: Option<NaiveTime>,
    pub lunch_time: Option<NaiveTime>,
    pub dinner_time: Option<NaiveTime>,
    pub snack_time: Option<NaiveTime>,
}

impl UserProfile {
    /// A profile is complete once every field the generator needs is present
    pub fn is_complete(&self) -> bool {
        self.age.is_some()
            && self.height_cm.is_some()
            && self.weight_kg.is_some()
            && self.fitness_level.is_some()
            && self.goals.is_some()
    }

    pub fn daily_times(&self) -> crate::schedule::DailyTimes {
        crate::schedule::DailyTimes {
            workout: self.workout_time,
            breakfast: self.breakfast_time,
            lunch: self.lunch_time,
            dinner: self.dinner_time,
            snack: self.snack_time,
        }
    }
}

// ============================================================================
// Lenient deserializers for generator output
// ============================================================================

mod lenient {
    use super::*;
    use serde_json::Value;

    fn value_to_u32(value: &Value) -> Option<u32> {
        match value {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
                .and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse::<u32>().ok(),
            _ => None,
        }
    }

    pub fn optional_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(value_to_u32))
    }

    pub fn u32_or_default<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value
            .as_ref()
            .and_then(value_to_u32)
            .unwrap_or_else(default_duration_minutes))
    }

    pub fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_status_accepts_generated_alias() {
        assert_eq!(
            "generated".parse::<ActivityStatus>().unwrap(),
            ActivityStatus::Scheduled
        );
        assert!("done".parse::<ActivityStatus>().is_err());
    }

    #[test]
    fn test_reminder_transitions_are_forward_only() {
        use ReminderStatus::*;
        assert!(Pending.can_transition_to(Sent));
        assert!(Sent.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Completed));
        assert!(!Sent.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Sent));
        assert!(!Failed.can_transition_to(Sent));
        assert!(!Skipped.can_transition_to(Completed));
    }

    #[test]
    fn test_workout_content_tolerates_loose_generator_output() {
        let json = serde_json::json!({
            "workout_type": "Legs",
            "duration_minutes": "45",
            "calories_estimate": 320.4,
            "exercises": [
                {"name": "Squats", "sets": 3, "reps": "10-12", "rest_seconds": 60},
                {"name": "Lunges", "sets": "4", "reps": 12}
            ],
            "tips": ["Keep your back straight"]
        });

        let content: WorkoutContent = serde_json::from_value(json).unwrap();
        assert_eq!(content.duration_minutes, 45);
        assert_eq!(content.calories_estimate, Some(320));
        assert_eq!(content.exercises[0].reps.as_deref(), Some("10-12"));
        assert_eq!(content.exercises[1].sets.as_deref(), Some("4"));
        assert!(content.exercises[0].extra.contains_key("rest_seconds"));
        assert!(content.extra.contains_key("tips"));
    }

    #[test]
    fn test_item_count_sums_meals_and_snacks() {
        let diet = ActivityContent::Diet(DietContent {
            meals: vec![Meal::named("Oats", 300), Meal::named("Dal", 450)],
            snacks: vec![Meal::named("Apple", 100)],
            total_calories: Some(850),
            extra: Default::default(),
        });
        assert_eq!(diet.item_count(), 3);
    }

    #[test]
    fn test_item_name_rejects_mismatched_kind() {
        let workout = ActivityContent::Workout(WorkoutContent {
            workout_type: "Arms".into(),
            duration_minutes: 30,
            difficulty: None,
            exercises: vec![Exercise::new("Curls", 3, "12")],
            calories_estimate: None,
            extra: Default::default(),
        });
        assert_eq!(workout.item_name(ItemRef::Exercise(0)).as_deref(), Some("Curls"));
        assert_eq!(workout.item_name(ItemRef::Exercise(1)), None);
        assert_eq!(workout.item_name(ItemRef::Meal(MealSlot::Lunch)), None);
    }
}
