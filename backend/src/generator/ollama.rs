//! Ollama-backed plan generation

use super::{ContentGenerator, GeneratorError};
use crate::config::AiConfig;
use async_trait::async_trait;
use fitness_coach_shared::{DietContent, UserProfile, WorkoutContent};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Calls `POST {ollama_url}/api/generate` in JSON mode
pub struct OllamaGenerator {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    format: &'static str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaGenerator {
    pub fn new(config: &AiConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &AiConfig) -> Self {
        Self {
            client,
            base_url: config.ollama_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    async fn generate<T: DeserializeOwned>(&self, prompt: String) -> Result<T, GeneratorError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            format: "json",
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let body: GenerateResponse = response.json().await?;
        debug!(model = %self.model, bytes = body.response.len(), "Generator responded");

        serde_json::from_str(&body.response).map_err(|e| {
            warn!(error = %e, "Generator returned malformed JSON");
            GeneratorError::InvalidResponse(e.to_string())
        })
    }
}

fn describe(profile: &UserProfile) -> String {
    let mut parts = Vec::new();
    if let Some(age) = profile.age {
        parts.push(format!("age {}", age));
    }
    if let Some(height) = profile.height_cm {
        parts.push(format!("height {} cm", height));
    }
    if let Some(weight) = profile.weight_kg {
        parts.push(format!("weight {} kg", weight));
    }
    if let Some(level) = &profile.fitness_level {
        parts.push(format!("fitness level {}", level));
    }
    if let Some(goals) = &profile.goals {
        parts.push(format!("goals: {}", goals));
    }
    parts.join(", ")
}

fn workout_prompt(profile: &UserProfile, muscle_group: &str) -> String {
    format!(
        "Create a {muscle_group} home workout for a user with {profile}. \
         Respond with JSON only: {{\"workout_type\": \"{muscle_group}\", \
         \"duration_minutes\": number, \"difficulty\": string, \
         \"exercises\": [{{\"name\": string, \"sets\": number, \"reps\": string}}], \
         \"calories_estimate\": number}}",
        profile = describe(profile),
    )
}

fn diet_prompt(profile: &UserProfile) -> String {
    format!(
        "Create a one-day meal plan for a user with {profile}. \
         Respond with JSON only: {{\"meals\": [{{\"name\": \"Breakfast\", \"time\": string, \
         \"items\": [{{\"name\": string, \"portion\": string, \"calories\": number}}], \
         \"total_calories\": number}}], \"snacks\": [same shape], \
         \"total_calories\": number}}. Include Breakfast, Lunch and Dinner.",
        profile = describe(profile),
    )
}

#[async_trait]
impl ContentGenerator for OllamaGenerator {
    async fn generate_workout(
        &self,
        profile: &UserProfile,
        muscle_group: &str,
    ) -> Result<WorkoutContent, GeneratorError> {
        let mut workout: WorkoutContent = self.generate(workout_prompt(profile, muscle_group)).await?;
        if workout.exercises.is_empty() {
            return Err(GeneratorError::InvalidResponse(
                "workout has no exercises".to_string(),
            ));
        }
        // The rotation decides the group, whatever the model labelled it
        workout.workout_type = muscle_group.to_string();
        Ok(workout)
    }

    async fn generate_diet(&self, profile: &UserProfile) -> Result<DietContent, GeneratorError> {
        let diet: DietContent = self.generate(diet_prompt(profile)).await?;
        if diet.meals.is_empty() && diet.snacks.is_empty() {
            return Err(GeneratorError::InvalidResponse("diet has no meals".to_string()));
        }
        Ok(diet)
    }
}
