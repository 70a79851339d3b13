// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout model as exchanged with the API.
//!
//! Records are decoded leniently: an unknown or missing `type` and an
//! unparseable `date` keep their raw value instead of failing the whole list,
//! so aggregation can still group them.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use validator::{Validate, ValidationError};

/// Workout category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Value", into = "String")]
pub enum WorkoutType {
    Cardio,
    Strength,
    Flexibility,
    Sports,
    Other,
    /// Any value the client does not know, kept verbatim ("" when absent)
    Unrecognized(String),
}

impl WorkoutType {
    /// All categories the API accepts.
    pub const KNOWN: [WorkoutType; 5] = [
        WorkoutType::Cardio,
        WorkoutType::Strength,
        WorkoutType::Flexibility,
        WorkoutType::Sports,
        WorkoutType::Other,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            WorkoutType::Cardio => "cardio",
            WorkoutType::Strength => "strength",
            WorkoutType::Flexibility => "flexibility",
            WorkoutType::Sports => "sports",
            WorkoutType::Other => "other",
            WorkoutType::Unrecognized(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, WorkoutType::Unrecognized(_))
    }

    /// Capitalized label for chart axes ("cardio" -> "Cardio").
    pub fn label(&self) -> String {
        let raw = self.as_str();
        let mut chars = raw.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl Default for WorkoutType {
    fn default() -> Self {
        WorkoutType::Unrecognized(String::new())
    }
}

impl From<&str> for WorkoutType {
    fn from(raw: &str) -> Self {
        match raw {
            "cardio" => WorkoutType::Cardio,
            "strength" => WorkoutType::Strength,
            "flexibility" => WorkoutType::Flexibility,
            "sports" => WorkoutType::Sports,
            "other" => WorkoutType::Other,
            _ => WorkoutType::Unrecognized(raw.to_string()),
        }
    }
}

impl From<Value> for WorkoutType {
    fn from(raw: Value) -> Self {
        WorkoutType::from(raw_text(raw).as_str())
    }
}

impl From<WorkoutType> for String {
    fn from(kind: WorkoutType) -> Self {
        match kind {
            WorkoutType::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::str::FromStr for WorkoutType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(WorkoutType::from(s))
    }
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calendar date of a workout.
///
/// Ordering puts every parsed day before any unparseable value; unparseable
/// values order by their raw text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Value", into = "String")]
pub enum WorkoutDate {
    Day(NaiveDate),
    Raw(String),
}

impl WorkoutDate {
    /// Parse a date or timestamp, mapping timestamps to the local calendar day.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();

        if let Ok(day) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return WorkoutDate::Day(day);
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
            return WorkoutDate::Day(ts.with_timezone(&Local).date_naive());
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
            return WorkoutDate::Day(naive.date());
        }

        WorkoutDate::Raw(raw.to_string())
    }

    pub fn day(&self) -> Option<NaiveDate> {
        match self {
            WorkoutDate::Day(day) => Some(*day),
            WorkoutDate::Raw(_) => None,
        }
    }
}

impl Default for WorkoutDate {
    fn default() -> Self {
        WorkoutDate::Raw(String::new())
    }
}

impl From<NaiveDate> for WorkoutDate {
    fn from(day: NaiveDate) -> Self {
        WorkoutDate::Day(day)
    }
}

impl From<Value> for WorkoutDate {
    fn from(raw: Value) -> Self {
        WorkoutDate::parse(&raw_text(raw))
    }
}

/// Wire value as text: strings as-is, null as empty, anything else as JSON.
fn raw_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl From<WorkoutDate> for String {
    fn from(date: WorkoutDate) -> Self {
        date.to_string()
    }
}

impl fmt::Display for WorkoutDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkoutDate::Day(day) => write!(f, "{}", day.format("%Y-%m-%d")),
            WorkoutDate::Raw(raw) => f.write_str(raw),
        }
    }
}

/// Workout as returned by the list and detail endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    pub id: u64,
    #[serde(rename = "type", default)]
    pub kind: WorkoutType,
    #[serde(default)]
    pub date: WorkoutDate,
    /// Duration in minutes
    #[serde(rename = "duration", default)]
    pub duration_minutes: Option<u32>,
    /// Distance in km
    #[serde(rename = "distance", default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Number of exercises (list endpoint only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Create/update payload for a workout.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct WorkoutDraft {
    #[serde(rename = "type")]
    #[validate(custom(function = "validate_known_type"))]
    pub kind: WorkoutType,
    pub date: NaiveDate,
    #[serde(rename = "duration")]
    pub duration_minutes: Option<u32>,
    #[serde(rename = "distance")]
    #[validate(range(min = 0.0, message = "Distance cannot be negative"))]
    pub distance_km: Option<f64>,
    #[validate(length(max = 2000, message = "Notes are too long"))]
    pub notes: String,
}

impl WorkoutDraft {
    pub fn new(kind: WorkoutType, date: NaiveDate) -> Self {
        Self {
            kind,
            date,
            duration_minutes: None,
            distance_km: None,
            notes: String::new(),
        }
    }

    /// Editable copy of an existing record; `None` if its date never parsed.
    pub fn from_record(record: &WorkoutRecord) -> Option<Self> {
        Some(WorkoutDraft {
            kind: record.kind.clone(),
            date: record.date.day()?,
            duration_minutes: record.duration_minutes,
            distance_km: record.distance_km,
            notes: record.notes.clone().unwrap_or_default(),
        })
    }
}

fn validate_known_type(kind: &WorkoutType) -> Result<(), ValidationError> {
    if kind.is_known() {
        Ok(())
    } else {
        let mut err = ValidationError::new("unknown_type");
        let known: Vec<&str> = WorkoutType::KNOWN.iter().map(WorkoutType::as_str).collect();
        err.message = Some(
            format!(
                "\"{}\" is not a valid workout type (expected one of: {})",
                kind,
                known.join(", ")
            )
            .into(),
        );
        Err(err)
    }
}

/// Filters for `GET /workouts/`.
#[derive(Debug, Clone, Default)]
pub struct WorkoutQuery {
    pub limit: Option<u32>,
    pub date: Option<NaiveDate>,
    pub kind: Option<WorkoutType>,
}

impl WorkoutQuery {
    pub fn limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(date) = self.date {
            params.push(("date", date.format("%Y-%m-%d").to_string()));
        }
        if let Some(kind) = &self.kind {
            params.push(("type", kind.to_string()));
        }
        params
    }
}

/// List envelope. A missing `results` decodes as empty.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}
