// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! fitlog command-line client
//!
//! Logs in to the workout API, keeps the session on disk between runs, and
//! prints workouts, stats and chart summaries as plain text.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use fitlog::{
    config::Config,
    error::ApiError,
    models::{
        ChartReport, DashboardStats, LoginRequest, RegisterRequest, WorkoutDraft, WorkoutQuery,
        WorkoutRecord, WorkoutType,
    },
    services::DEFAULT_CHART_LIMIT,
    store::CredentialStore,
    time_utils::parse_day,
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "fitlog", version, about = "Log and review workouts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in with an email address or username
    Login { identifier: String, password: String },
    /// Create an account and sign in
    Register {
        username: String,
        email: String,
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List recent workouts
    Workouts { limit: Option<u32> },
    /// Show a workout and its exercises
    Show { id: u64 },
    /// Log a workout
    Add {
        #[arg(value_name = "TYPE")]
        kind: WorkoutType,
        #[arg(value_parser = parse_day)]
        date: NaiveDate,
        /// Minutes
        duration: Option<u32>,
        /// Kilometres
        distance: Option<f64>,
        notes: Option<String>,
    },
    /// Delete a workout
    Delete { id: u64 },
    /// Show the dashboard summary
    Stats,
    /// Summarize workouts per day and per type
    Charts { limit: Option<u32> },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::debug!(api_url = %config.api_url, session_file = %config.session_file.display(), "Configuration loaded");

    let app = AppState::new(config).context("Failed to initialize client")?;

    match run(&app, cli.command).await {
        Ok(()) => Ok(()),
        Err(e) => {
            if e.requires_login() {
                eprintln!("Run `fitlog login <identifier> <password>` to sign in.");
            }
            let message = e.user_message();
            Err(anyhow::Error::new(e).context(message))
        }
    }
}

async fn run(app: &AppState, command: Command) -> Result<(), ApiError> {
    let session = &app.session;
    let service = &app.service;

    match command {
        Command::Login {
            identifier,
            password,
        } => {
            let user = session
                .login(&LoginRequest {
                    identifier,
                    password,
                })
                .await?;
            println!("Signed in as {}", user.display_name());
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let user = session
                .register(&RegisterRequest {
                    username,
                    email,
                    password_confirm: password.clone(),
                    password,
                })
                .await?;
            println!("Welcome, {}!", user.display_name());
        }
        Command::Logout => {
            session.logout()?;
            println!("Signed out");
        }
        command => {
            // The stored session is only dropped when the server rejects it,
            // so a run without network keeps it for the next one.
            if session.store().load()?.is_none() {
                return Err(ApiError::SessionExpired(String::new()));
            }

            match command {
                Command::Whoami => {
                    let user = service.profile().await?;
                    println!("{} <{}> (id {})", user.username, user.email, user.id);
                }
                Command::Workouts { limit } => {
                    let query = WorkoutQuery {
                        limit,
                        ..WorkoutQuery::default()
                    };
                    let page = service.list_workouts(&query).await?;
                    if page.results.is_empty() {
                        println!("No workouts yet");
                    }
                    for workout in &page.results {
                        println!("{}", workout_line(workout));
                    }
                }
                Command::Show { id } => {
                    let detail = service.workout_detail(id).await?;
                    println!("{}", workout_line(&detail.workout));
                    if let Some(notes) = detail.workout.notes.as_deref().filter(|n| !n.is_empty()) {
                        println!("  {}", notes);
                    }
                    for exercise in &detail.exercises {
                        let mut line = format!("  - {}", exercise.name);
                        if let (Some(sets), Some(reps)) = (exercise.sets, exercise.reps) {
                            line.push_str(&format!(" {}x{}", sets, reps));
                        }
                        if let Some(weight) = exercise.weight {
                            line.push_str(&format!(" @ {} kg", weight));
                        }
                        if let Some(duration) = exercise.duration {
                            line.push_str(&format!(" ({} min)", duration));
                        }
                        println!("{}", line);
                    }
                }
                Command::Add {
                    kind,
                    date,
                    duration,
                    distance,
                    notes,
                } => {
                    let draft = WorkoutDraft {
                        duration_minutes: duration,
                        distance_km: distance,
                        notes: notes.unwrap_or_default(),
                        ..WorkoutDraft::new(kind, date)
                    };
                    let workout = service.create_workout(&draft).await?;
                    println!("Created {}", workout_line(&workout));
                }
                Command::Delete { id } => {
                    service.delete_workout(id).await?;
                    println!("Deleted workout {}", id);
                }
                Command::Stats => print_stats(&service.dashboard_stats().await?),
                Command::Charts { limit } => {
                    let report = service
                        .chart_report(Some(limit.unwrap_or(DEFAULT_CHART_LIMIT)))
                        .await?;
                    print_charts(&report);
                }
                Command::Login { .. } | Command::Register { .. } | Command::Logout => {}
            }
        }
    }

    Ok(())
}

fn workout_line(workout: &WorkoutRecord) -> String {
    let mut line = format!("#{} {} {}", workout.id, workout.date, workout.kind.label());
    if let Some(minutes) = workout.duration_minutes {
        line.push_str(&format!(" {} min", minutes));
    }
    if let Some(km) = workout.distance_km {
        line.push_str(&format!(" {:.1} km", km));
    }
    line
}

fn print_stats(stats: &DashboardStats) {
    println!(
        "This week: {} workouts, {} min",
        stats.weekly_stats.total_workouts,
        stats.weekly_stats.total_duration.unwrap_or(0)
    );

    if !stats.recent_workouts.is_empty() {
        println!("Recent:");
        for workout in &stats.recent_workouts {
            println!("  {}", workout_line(workout));
        }
    }

    if !stats.personal_records.is_empty() {
        println!("Personal records:");
        for record in &stats.personal_records {
            println!("  {}: {} kg", record.name, record.max_weight);
        }
    }
}

fn print_charts(report: &ChartReport) {
    if report.is_empty() {
        println!("No workout data yet");
        return;
    }

    println!(
        "{} workouts, {} h total, {:.1} km",
        report.totals.workouts,
        report.totals.duration_hours(),
        report.totals.distance_km
    );

    println!("By date:");
    for bucket in &report.by_date {
        let mut line = format!(
            "  {}  {} min  ({} workouts)",
            bucket.date, bucket.total_duration_minutes, bucket.workout_count
        );
        if report.has_distance() {
            line.push_str(&format!("  {:.1} km", bucket.total_distance_km));
        }
        println!("{}", line);
    }

    println!("By type:");
    for entry in &report.by_type {
        println!("  {:<12} {}", entry.kind.label(), entry.count);
    }
}

/// Initialize logging to stderr, as JSON when `FITLOG_LOG_JSON` is set.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fitlog=info"));

    let json = std::env::var("FITLOG_LOG_JSON")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(false)
            .with_current_span(true)
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}
