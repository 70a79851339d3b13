// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed operations on the fitness API.
//!
//! Every call goes through [`SessionManager::send`], so each one carries the
//! stored access token and gets one refresh-and-retry on 401.

use crate::error::Result;
use crate::models::{
    ChartReport, DashboardStats, Exercise, ExerciseDraft, Page, ProfileUpdate, User,
    WorkoutDraft, WorkoutQuery, WorkoutRecord,
};
use crate::services::api::{paths, ApiRequest};
use crate::services::session::SessionManager;
use futures_util::future::try_join;
use std::sync::Arc;
use validator::Validate;

/// Number of workouts the charts are drawn from unless told otherwise.
pub const DEFAULT_CHART_LIMIT: u32 = 100;

/// A workout together with its exercises.
#[derive(Debug, Clone)]
pub struct WorkoutDetail {
    pub workout: WorkoutRecord,
    pub exercises: Vec<Exercise>,
}

#[derive(Clone)]
pub struct FitlogService {
    session: Arc<SessionManager>,
}

impl FitlogService {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    // ─── Profile ─────────────────────────────────────────────────────────────

    pub async fn profile(&self) -> Result<User> {
        self.session.send_json(&ApiRequest::get(paths::PROFILE)).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        update.validate()?;
        let request = ApiRequest::patch(paths::PROFILE).json(update)?;
        let store = self.session.store();
        let refresh_token = store.refresh_token()?;
        let user: User = self.session.send_json(&request).await?;

        if let Some(refresh_token) = refresh_token {
            if let Err(e) = store.replace_user(&refresh_token, &user) {
                tracing::warn!(error = %e, "Failed to update cached profile");
            }
        }
        Ok(user)
    }

    // ─── Workouts ────────────────────────────────────────────────────────────

    pub async fn list_workouts(&self, query: &WorkoutQuery) -> Result<Page<WorkoutRecord>> {
        let request = ApiRequest::get(paths::WORKOUTS).query(query.to_query());
        self.session.send_json(&request).await
    }

    pub async fn get_workout(&self, id: u64) -> Result<WorkoutRecord> {
        self.session
            .send_json(&ApiRequest::get(paths::workout(id)))
            .await
    }

    /// Create a workout. The draft is validated before anything is sent.
    pub async fn create_workout(&self, draft: &WorkoutDraft) -> Result<WorkoutRecord> {
        draft.validate()?;
        let request = ApiRequest::post(paths::WORKOUTS).json(draft)?;
        let workout: WorkoutRecord = self.session.send_json(&request).await?;
        tracing::info!(workout_id = workout.id, kind = %workout.kind, "Workout created");
        Ok(workout)
    }

    pub async fn update_workout(&self, id: u64, draft: &WorkoutDraft) -> Result<WorkoutRecord> {
        draft.validate()?;
        let request = ApiRequest::patch(paths::workout(id)).json(draft)?;
        self.session.send_json(&request).await
    }

    pub async fn delete_workout(&self, id: u64) -> Result<()> {
        self.session
            .send_empty(&ApiRequest::delete(paths::workout(id)))
            .await?;
        tracing::info!(workout_id = id, "Workout deleted");
        Ok(())
    }

    /// Fetch a workout and its exercises concurrently.
    pub async fn workout_detail(&self, id: u64) -> Result<WorkoutDetail> {
        let (workout, exercises) =
            try_join(self.get_workout(id), self.list_exercises(Some(id))).await?;

        Ok(WorkoutDetail {
            workout,
            exercises: exercises.results,
        })
    }

    // ─── Exercises ───────────────────────────────────────────────────────────

    /// List exercises, optionally only those of one workout.
    pub async fn list_exercises(&self, workout_id: Option<u64>) -> Result<Page<Exercise>> {
        let mut request = ApiRequest::get(paths::EXERCISES);
        if let Some(id) = workout_id {
            request = request.query(vec![("workout_id", id.to_string())]);
        }
        self.session.send_json(&request).await
    }

    pub async fn get_exercise(&self, id: u64) -> Result<Exercise> {
        self.session
            .send_json(&ApiRequest::get(paths::exercise(id)))
            .await
    }

    pub async fn create_exercise(&self, draft: &ExerciseDraft) -> Result<Exercise> {
        draft.validate()?;
        let request = ApiRequest::post(paths::EXERCISES).json(draft)?;
        self.session.send_json(&request).await
    }

    pub async fn update_exercise(&self, id: u64, draft: &ExerciseDraft) -> Result<Exercise> {
        draft.validate()?;
        let request = ApiRequest::patch(paths::exercise(id)).json(draft)?;
        self.session.send_json(&request).await
    }

    pub async fn delete_exercise(&self, id: u64) -> Result<()> {
        self.session
            .send_empty(&ApiRequest::delete(paths::exercise(id)))
            .await
    }

    // ─── Stats ───────────────────────────────────────────────────────────────

    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        self.session
            .send_json(&ApiRequest::get(paths::DASHBOARD_STATS))
            .await
    }

    /// Fetch up to `limit` workouts (default [`DEFAULT_CHART_LIMIT`]) and
    /// aggregate them for the charts.
    pub async fn chart_report(&self, limit: Option<u32>) -> Result<ChartReport> {
        let query = WorkoutQuery::limit(limit.unwrap_or(DEFAULT_CHART_LIMIT));
        let page = self.list_workouts(&query).await?;

        tracing::debug!(workouts = page.results.len(), "Aggregating chart data");
        Ok(ChartReport::from_records(&page.results))
    }
}
