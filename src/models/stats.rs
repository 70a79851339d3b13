// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout statistics: the dashboard payload served by the API and the
//! chart series aggregated client-side from raw workout records.
//!
//! The aggregation functions are pure: they borrow the input, never fail,
//! and group malformed records under their raw `type`/`date` values.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::models::{WorkoutDate, WorkoutRecord, WorkoutType};

// ─── Server-side Stats ───────────────────────────────────────

/// Response of `GET /dashboard/stats/`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DashboardStats {
    /// Up to five workouts from the last seven days
    #[serde(default)]
    pub recent_workouts: Vec<WorkoutRecord>,
    #[serde(default)]
    pub weekly_stats: WeeklyStats,
    /// Heaviest weight per exercise name
    #[serde(default)]
    pub personal_records: Vec<PersonalRecord>,
}

/// Training volume over the last seven days.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WeeklyStats {
    /// Total minutes (null when there were no workouts)
    pub total_duration: Option<u64>,
    #[serde(default)]
    pub total_workouts: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PersonalRecord {
    pub name: String,
    pub max_weight: f64,
}

// ─── Client-side Aggregation ─────────────────────────────────

/// Per-day totals for time-series charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateBucket {
    pub date: WorkoutDate,
    pub total_duration_minutes: u64,
    pub total_distance_km: f64,
    pub workout_count: u32,
}

/// Number of workouts of one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub kind: WorkoutType,
    pub count: u32,
}

/// Totals across a set of workouts (summary cards).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkoutTotals {
    pub workouts: u32,
    pub duration_minutes: u64,
    pub distance_km: f64,
}

impl WorkoutTotals {
    /// Total duration rounded to whole hours.
    pub fn duration_hours(&self) -> u64 {
        (self.duration_minutes + 30) / 60
    }
}

/// Group records by calendar date, ascending, summing duration and distance.
///
/// Missing duration/distance count as zero. Records whose date never parsed
/// are bucketed under their raw string after all real dates.
pub fn bucket_by_date(records: &[WorkoutRecord]) -> Vec<DateBucket> {
    let mut buckets: BTreeMap<&WorkoutDate, DateBucket> = BTreeMap::new();

    for record in records {
        let bucket = buckets.entry(&record.date).or_insert_with(|| DateBucket {
            date: record.date.clone(),
            total_duration_minutes: 0,
            total_distance_km: 0.0,
            workout_count: 0,
        });
        bucket.total_duration_minutes += u64::from(record.duration_minutes.unwrap_or(0));
        bucket.total_distance_km += record.distance_km.unwrap_or(0.0);
        bucket.workout_count += 1;
    }

    buckets.into_values().collect()
}

/// Count records per workout type, in order of first appearance.
pub fn count_by_type(records: &[WorkoutRecord]) -> Vec<TypeCount> {
    let mut index: HashMap<&WorkoutType, usize> = HashMap::new();
    let mut counts: Vec<TypeCount> = Vec::new();

    for record in records {
        match index.get(&record.kind) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(&record.kind, counts.len());
                counts.push(TypeCount {
                    kind: record.kind.clone(),
                    count: 1,
                });
            }
        }
    }

    counts
}

/// Sum every record into a single total.
pub fn totals(records: &[WorkoutRecord]) -> WorkoutTotals {
    records
        .iter()
        .fold(WorkoutTotals::default(), |mut acc, record| {
            acc.workouts += 1;
            acc.duration_minutes += u64::from(record.duration_minutes.unwrap_or(0));
            acc.distance_km += record.distance_km.unwrap_or(0.0);
            acc
        })
}

/// Everything the charts page renders, derived from one record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartReport {
    pub by_date: Vec<DateBucket>,
    pub by_type: Vec<TypeCount>,
    pub totals: WorkoutTotals,
}

impl ChartReport {
    pub fn from_records(records: &[WorkoutRecord]) -> Self {
        Self {
            by_date: bucket_by_date(records),
            by_type: count_by_type(records),
            totals: totals(records),
        }
    }

    /// Whether a distance series is worth drawing.
    pub fn has_distance(&self) -> bool {
        self.by_date.iter().any(|b| b.total_distance_km > 0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.totals.workouts == 0
    }
}
