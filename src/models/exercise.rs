// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Exercise model (individual exercises within a workout).

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Exercise as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: u64,
    pub name: String,
    pub sets: Option<u32>,
    pub reps: Option<u32>,
    /// Weight in kg
    pub weight: Option<f64>,
    /// Duration in minutes
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Create/update payload for an exercise.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct ExerciseDraft {
    /// Owning workout
    pub workout_id: u64,
    #[validate(length(min = 1, max = 100, message = "Exercise name must be 1-100 characters"))]
    pub name: String,
    pub sets: Option<u32>,
    pub reps: Option<u32>,
    #[validate(range(min = 0.0, message = "Weight cannot be negative"))]
    pub weight: Option<f64>,
    pub duration: Option<u32>,
}

impl ExerciseDraft {
    pub fn new(workout_id: u64, name: impl Into<String>) -> Self {
        Self {
            workout_id,
            name: name.into(),
            sets: None,
            reps: None,
            weight: None,
            duration: None,
        }
    }
}
