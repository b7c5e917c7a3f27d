use serde::{Deserialize, Serialize};

/// Body of `POST /generate_workout`. A missing prompt is an empty prompt.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateWorkoutRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateWorkoutResponse {
    pub result: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
