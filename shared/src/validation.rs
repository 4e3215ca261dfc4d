//! Input validation functions
//!
//! Profile fields collected during onboarding. Ranges match what the chat
//! dialogue accepts.

use crate::schedule::parse_clock_time;

/// Validate age in years (13-100)
pub fn validate_age(age: i32) -> Result<(), String> {
    if !(13..=100).contains(&age) {
        return Err("Age must be between 13 and 100".to_string());
    }
    Ok(())
}

/// Validate height value (in cm)
pub fn validate_height_cm(height_cm: f64) -> Result<(), String> {
    if height_cm.is_nan() || height_cm.is_infinite() {
        return Err("Height must be a valid number".to_string());
    }
    if height_cm < 100.0 {
        return Err("Height must be at least 100 cm".to_string());
    }
    if height_cm > 250.0 {
        return Err("Height must be at most 250 cm".to_string());
    }
    Ok(())
}

/// Validate weight value (in kg)
pub fn validate_weight_kg(weight_kg: f64) -> Result<(), String> {
    if weight_kg.is_nan() || weight_kg.is_infinite() {
        return Err("Weight must be a valid number".to_string());
    }
    if weight_kg < 30.0 {
        return Err("Weight must be at least 30 kg".to_string());
    }
    if weight_kg > 300.0 {
        return Err("Weight must be at most 300 kg".to_string());
    }
    Ok(())
}

/// Valid fitness levels
pub const VALID_FITNESS_LEVELS: &[&str] = &["beginner", "intermediate", "advanced"];

/// Validate fitness level
pub fn validate_fitness_level(level: &str) -> Result<(), String> {
    let normalized = level.to_lowercase();
    if VALID_FITNESS_LEVELS.contains(&normalized.as_str()) {
        Ok(())
    } else {
        Err(format!(
            "Invalid fitness level. Must be one of: {}",
            VALID_FITNESS_LEVELS.join(", ")
        ))
    }
}

/// Validate an `HH:MM` daily time
pub fn validate_clock_time(value: &str) -> Result<(), String> {
    parse_clock_time(value)
        .map(|_| ())
        .map_err(|e| e.to_string())
}
