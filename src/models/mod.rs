// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod exercise;
pub mod stats;
pub mod user;
pub mod workout;

pub use exercise::{Exercise, ExerciseDraft};
pub use stats::{ChartReport, DashboardStats, DateBucket, TypeCount, WorkoutTotals};
pub use user::{AuthResponse, LoginRequest, ProfileUpdate, RegisterRequest, TokenPair, User};
pub use workout::{Page, WorkoutDate, WorkoutDraft, WorkoutQuery, WorkoutRecord, WorkoutType};
