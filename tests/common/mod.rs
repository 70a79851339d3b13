// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process mock of the fitness API for integration tests.
//!
//! Accepts exactly one access token at a time (`MockState::valid_access`).
//! Any other bearer gets a 401, so tests can expire a session by rotating the
//! server-side token.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use fitlog::services::{ApiClient, FitlogService, SessionManager};
use fitlog::store::{CredentialStore, MemoryStore, StoredSession};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PASSWORD: &str = "secret";
pub const REFRESH_TOKEN: &str = "refresh-1";

/// Server-side state of the mock API.
pub struct MockState {
    /// The only bearer token currently accepted
    pub valid_access: Mutex<String>,
    /// Refresh token the server will honour
    pub valid_refresh: Mutex<String>,
    pub refresh_enabled: AtomicBool,
    /// Delay before answering a refresh, to let concurrent 401s pile up
    pub refresh_delay: Mutex<Duration>,
    pub refresh_calls: AtomicUsize,
    pub profile_calls: AtomicUsize,
    /// Every request that reached an authenticated route, as "METHOD path"
    pub requests: Mutex<Vec<String>>,
    /// Query string of the most recent list call
    pub last_query: Mutex<HashMap<String, String>>,
    pub workouts: Mutex<Vec<Value>>,
    pub exercises: Mutex<Vec<Value>>,
    next_id: AtomicU64,
    token_counter: AtomicU64,
}

impl MockState {
    fn new() -> Self {
        Self {
            valid_access: Mutex::new("access-1".into()),
            valid_refresh: Mutex::new(REFRESH_TOKEN.into()),
            refresh_enabled: AtomicBool::new(true),
            refresh_delay: Mutex::new(Duration::ZERO),
            refresh_calls: AtomicUsize::new(0),
            profile_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            last_query: Mutex::new(HashMap::new()),
            workouts: Mutex::new(Vec::new()),
            exercises: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(100),
            token_counter: AtomicU64::new(1),
        }
    }

    /// Invalidate the current access token, as if it had expired.
    #[allow(dead_code)]
    pub fn expire_access_token(&self) {
        *self.valid_access.lock().unwrap() = "server-rotated".into();
    }

    #[allow(dead_code)]
    pub fn current_access(&self) -> String {
        self.valid_access.lock().unwrap().clone()
    }

    #[allow(dead_code)]
    pub fn request_count(&self, line: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.as_str() == line)
            .count()
    }

    #[allow(dead_code)]
    pub fn add_workout(&self, kind: &str, date: &str, duration: Option<u32>, distance: Option<f64>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.workouts.lock().unwrap().push(json!({
            "id": id,
            "type": kind,
            "date": date,
            "duration": duration,
            "distance": distance,
            "notes": "",
            "exercise_count": 0,
        }));
        id
    }

    #[allow(dead_code)]
    pub fn add_exercise(&self, workout_id: u64, name: &str) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.exercises.lock().unwrap().push(json!({
            "id": id,
            "workout_id": workout_id,
            "name": name,
            "sets": 3,
            "reps": 10,
            "weight": 60.0,
            "duration": null,
        }));
        id
    }
}

pub fn user_json() -> Value {
    json!({"id": 1, "username": "ana", "email": "ana@example.com", "created_at": "2024-01-01T00:00:00Z"})
}

/// A running mock API.
pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::new());

        let app = Router::new()
            .route("/api/users/login/", post(login))
            .route("/api/users/register/", post(register))
            .route("/api/users/profile/", get(profile).patch(update_profile))
            .route("/api/token/refresh/", post(refresh))
            .route("/api/workouts/", get(list_workouts).post(create_workout))
            .route("/api/workouts/{id}/", get(get_workout).delete(delete_workout))
            .route("/api/exercises/", get(list_exercises))
            .route("/api/dashboard/stats/", get(dashboard_stats))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api", addr),
            state,
        }
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(self.base_url.clone(), Duration::from_secs(5)).unwrap()
    }

    /// Manager over an empty in-memory store.
    #[allow(dead_code)]
    pub fn session(&self) -> (Arc<SessionManager>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let manager = SessionManager::new(self.client(), store.clone());
        (Arc::new(manager), store)
    }

    /// Manager whose store already holds a session with `access_token`.
    #[allow(dead_code)]
    pub fn signed_in_session(&self, access_token: &str) -> (Arc<SessionManager>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_session(StoredSession {
            access_token: access_token.into(),
            refresh_token: REFRESH_TOKEN.into(),
            user: serde_json::from_value(user_json()).unwrap(),
        }));
        let manager = SessionManager::new(self.client(), store.clone());
        (Arc::new(manager), store)
    }

    /// Service signed in with the currently valid token.
    #[allow(dead_code)]
    pub fn service(&self) -> (FitlogService, Arc<MemoryStore>) {
        let (session, store) = self.signed_in_session(&self.state.current_access());
        (FitlogService::new(session), store)
    }
}

/// Base URL of a local port with nothing listening on it.
#[allow(dead_code)]
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api", addr)
}

/// Manager over `store` whose API calls cannot connect.
#[allow(dead_code)]
pub async fn offline_session(store: Arc<MemoryStore>) -> Arc<SessionManager> {
    let client = ApiClient::new(unreachable_url().await, Duration::from_secs(5)).unwrap();
    Arc::new(SessionManager::new(client, store))
}

#[allow(dead_code)]
pub fn stored_access(store: &MemoryStore) -> Option<String> {
    store.access_token().unwrap()
}

// ─── Handlers ────────────────────────────────────────────────

type Shared = State<Arc<MockState>>;

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Given token not valid for any token type"})),
    )
        .into_response()
}

/// Record the request and check its bearer token.
fn authorize(state: &MockState, headers: &HeaderMap, line: String) -> Result<(), Response> {
    state.requests.lock().unwrap().push(line);

    let expected = format!("Bearer {}", state.valid_access.lock().unwrap());
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(unauthorized()),
    }
}

async fn login(State(state): Shared, Json(body): Json<Value>) -> Response {
    let identifier = body["email_or_username"].as_str().unwrap_or_default();
    if (identifier == "ana" || identifier == "ana@example.com") && body["password"] == PASSWORD {
        let tokens = json!({
            "access": state.current_access(),
            "refresh": state.valid_refresh.lock().unwrap().clone(),
        });
        return Json(json!({"user": user_json(), "tokens": tokens})).into_response();
    }

    (
        StatusCode::BAD_REQUEST,
        Json(json!({"non_field_errors": ["Invalid credentials"]})),
    )
        .into_response()
}

async fn register(State(state): Shared, Json(body): Json<Value>) -> Response {
    if body["username"] == "taken" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"username": ["A user with that username already exists."]})),
        )
            .into_response();
    }
    if body["username"] == "weak" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "username": ["A user with that username already exists."],
                "password": ["This password is too short."],
            })),
        )
            .into_response();
    }
    if body["password"] != body["password_confirm"] {
        return (StatusCode::BAD_REQUEST, Json(json!({}))).into_response();
    }

    let user = json!({"id": 2, "username": body["username"], "email": body["email"]});
    let tokens = json!({
        "access": state.current_access(),
        "refresh": state.valid_refresh.lock().unwrap().clone(),
    });
    (StatusCode::CREATED, Json(json!({"user": user, "tokens": tokens}))).into_response()
}

async fn profile(State(state): Shared, headers: HeaderMap) -> Response {
    state.profile_calls.fetch_add(1, Ordering::SeqCst);
    if let Err(r) = authorize(&state, &headers, "GET /users/profile/".into()) {
        return r;
    }
    let mut user = user_json();
    user["username"] = json!("ana-fresh");
    Json(user).into_response()
}

async fn update_profile(State(state): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(r) = authorize(&state, &headers, "PATCH /users/profile/".into()) {
        return r;
    }
    let mut user = user_json();
    if let Some(fields) = body.as_object() {
        for (key, value) in fields {
            user[key] = value.clone();
        }
    }
    Json(user).into_response()
}

async fn refresh(State(state): Shared, Json(body): Json<Value>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);

    let delay = *state.refresh_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let valid = *state.valid_refresh.lock().unwrap() == body["refresh"].as_str().unwrap_or_default();
    if !state.refresh_enabled.load(Ordering::SeqCst) || !valid {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Token is invalid or expired", "code": "token_not_valid"})),
        )
            .into_response();
    }

    let n = state.token_counter.fetch_add(1, Ordering::SeqCst) + 1;
    let access = format!("access-{}", n);
    *state.valid_access.lock().unwrap() = access.clone();
    Json(json!({"access": access})).into_response()
}

async fn list_workouts(
    State(state): Shared,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(r) = authorize(&state, &headers, "GET /workouts/".into()) {
        return r;
    }

    let workouts = state.workouts.lock().unwrap().clone();
    let limit = query
        .get("limit")
        .and_then(|l| l.parse::<usize>().ok())
        .unwrap_or(usize::MAX);
    let results: Vec<Value> = workouts
        .into_iter()
        .filter(|w| query.get("type").map_or(true, |t| w["type"] == t.as_str()))
        .filter(|w| query.get("date").map_or(true, |d| w["date"] == d.as_str()))
        .take(limit)
        .collect();

    *state.last_query.lock().unwrap() = query;
    Json(json!({"count": results.len(), "next": null, "previous": null, "results": results}))
        .into_response()
}

async fn create_workout(State(state): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(r) = authorize(&state, &headers, "POST /workouts/".into()) {
        return r;
    }

    let duplicate = state
        .workouts
        .lock()
        .unwrap()
        .iter()
        .any(|w| w["type"] == body["type"] && w["date"] == body["date"]);
    if duplicate {
        return (StatusCode::CONFLICT, Json(json!({}))).into_response();
    }

    let id = state.next_id.fetch_add(1, Ordering::SeqCst);
    let mut workout = body.clone();
    workout["id"] = json!(id);
    state.workouts.lock().unwrap().push(workout.clone());
    (StatusCode::CREATED, Json(workout)).into_response()
}

fn find_workout(state: &MockState, id: u64) -> Option<Value> {
    state
        .workouts
        .lock()
        .unwrap()
        .iter()
        .find(|w| w["id"] == id)
        .cloned()
}

async fn get_workout(State(state): Shared, headers: HeaderMap, Path(id): Path<u64>) -> Response {
    if let Err(r) = authorize(&state, &headers, format!("GET /workouts/{}/", id)) {
        return r;
    }
    match find_workout(&state, id) {
        Some(workout) => Json(workout).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response(),
    }
}

async fn delete_workout(State(state): Shared, headers: HeaderMap, Path(id): Path<u64>) -> Response {
    if let Err(r) = authorize(&state, &headers, format!("DELETE /workouts/{}/", id)) {
        return r;
    }
    let mut workouts = state.workouts.lock().unwrap();
    let before = workouts.len();
    workouts.retain(|w| w["id"] != id);
    if workouts.len() == before {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn list_exercises(
    State(state): Shared,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(r) = authorize(&state, &headers, "GET /exercises/".into()) {
        return r;
    }

    let workout_id = query.get("workout_id").and_then(|id| id.parse::<u64>().ok());
    let results: Vec<Value> = state
        .exercises
        .lock()
        .unwrap()
        .iter()
        .filter(|e| workout_id.map_or(true, |id| e["workout_id"] == id))
        .cloned()
        .collect();

    *state.last_query.lock().unwrap() = query;
    Json(json!({"count": results.len(), "results": results})).into_response()
}

async fn dashboard_stats(State(state): Shared, headers: HeaderMap) -> Response {
    if let Err(r) = authorize(&state, &headers, "GET /dashboard/stats/".into()) {
        return r;
    }
    let recent: Vec<Value> = state.workouts.lock().unwrap().iter().take(5).cloned().collect();
    Json(json!({
        "recent_workouts": recent,
        "weekly_stats": {"total_duration": 90, "total_workouts": recent.len()},
        "personal_records": [{"name": "Squat", "max_weight": 100.0}],
    }))
    .into_response()
}
