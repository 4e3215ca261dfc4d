//! Deterministic plans used when the LLM is unavailable

use fitness_coach_shared::{DietContent, Exercise, Meal, WorkoutContent};
use serde_json::{json, Map, Value};

const FALLBACK_DURATION_MINUTES: u32 = 30;
const FALLBACK_WORKOUT_CALORIES: u32 = 150;
const FALLBACK_DIET_CALORIES: u32 = 2000;

/// Rep range and rest period by fitness level
fn intensity(fitness_level: Option<&str>) -> (&'static str, u32) {
    match fitness_level.map(str::to_lowercase).as_deref() {
        Some("advanced") => ("12-15", 45),
        Some("intermediate") => ("10-12", 60),
        _ => ("8-10", 90),
    }
}

fn exercise(name: &str, kind: &str, reps: &str, rest_seconds: u32) -> Exercise {
    let mut exercise = Exercise::new(name, 3, reps);
    exercise.extra.insert("type".to_string(), json!(kind));
    exercise
        .extra
        .insert("rest_seconds".to_string(), json!(rest_seconds));
    exercise
}

/// Two or three bodyweight movements for the requested muscle group
pub fn workout(muscle_group: &str, fitness_level: Option<&str>) -> WorkoutContent {
    let (reps, rest) = intensity(fitness_level);
    let timed = "30-45 seconds";

    let exercises = match muscle_group {
        "Arms" => vec![
            exercise("Bicep Curls", "strength", reps, rest),
            exercise("Tricep Dips", "strength", reps, rest),
        ],
        "Chest" => vec![
            exercise("Push-ups", "strength", reps, rest),
            exercise("Incline Push-ups", "strength", reps, rest),
        ],
        "Back" => vec![
            exercise("Bent Over Rows", "strength", reps, rest),
            exercise("Superman", "strength", "12-15", rest),
        ],
        "Legs" => vec![
            exercise("Bodyweight Squats", "strength", reps, rest),
            exercise("Lunges", "strength", reps, rest),
        ],
        "Shoulders" => vec![
            exercise("Shoulder Press", "strength", reps, rest),
            exercise("Lateral Raises", "strength", reps, rest),
        ],
        "Abs" => vec![
            exercise("Crunches", "strength", reps, rest),
            exercise("Plank", "strength", timed, rest),
        ],
        "Cardio" => vec![
            exercise("Jumping Jacks", "cardio", timed, rest),
            exercise("High Knees", "cardio", timed, rest),
        ],
        _ => vec![
            exercise("Bodyweight Squats", "strength", reps, rest),
            exercise("Push-ups", "strength", reps, rest),
            exercise("Plank", "strength", timed, rest),
        ],
    };

    let mut extra = Map::new();
    extra.insert(
        "warmup".to_string(),
        json!([
            {"name": "Arm Circles", "duration_seconds": 30},
            {"name": "March in Place", "duration_seconds": 60}
        ]),
    );
    extra.insert(
        "cooldown".to_string(),
        json!([
            {"name": "Forward Fold", "duration_seconds": 30},
            {"name": "Shoulder Stretch", "duration_seconds": 30}
        ]),
    );
    extra.insert(
        "tips".to_string(),
        json!([
            "Focus on proper form over speed",
            "Listen to your body and rest when needed",
            "Stay hydrated throughout your workout"
        ]),
    );

    WorkoutContent {
        workout_type: muscle_group.to_string(),
        duration_minutes: FALLBACK_DURATION_MINUTES,
        difficulty: Some(title_case(fitness_level.unwrap_or("beginner"))),
        exercises,
        calories_estimate: Some(FALLBACK_WORKOUT_CALORIES),
        extra,
    }
}

fn food(name: &str, portion: &str, calories: u32) -> Value {
    json!({"name": name, "portion": portion, "calories": calories})
}

fn meal(name: Option<&str>, time: &str, item: Value, calories: u32) -> Meal {
    Meal {
        name: name.map(str::to_string),
        time: Some(time.to_string()),
        items: vec![item],
        total_calories: Some(calories),
    }
}

/// Three named meals and two snacks totalling 2000 kcal
pub fn diet() -> DietContent {
    DietContent {
        meals: vec![
            meal(
                Some("Breakfast"),
                "7:00 AM",
                food("Masala Oats with Vegetables", "1 bowl", 300),
                300,
            ),
            meal(
                Some("Lunch"),
                "12:30 PM",
                food("Roti with Dal and Sabzi", "2 rotis, 1 bowl dal, 1 bowl sabzi", 450),
                450,
            ),
            meal(
                Some("Dinner"),
                "7:00 PM",
                food("Grilled Chicken with Quinoa", "150g chicken, 1 cup quinoa", 400),
                400,
            ),
        ],
        snacks: vec![
            meal(None, "10:00 AM", food("Sprouts Chaat", "1 bowl", 150), 150),
            meal(
                None,
                "4:00 PM",
                food("Apple with Almonds", "1 medium apple, 10 almonds", 200),
                200,
            ),
        ],
        total_calories: Some(FALLBACK_DIET_CALORIES),
        extra: Map::new(),
    }
}

fn title_case(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
