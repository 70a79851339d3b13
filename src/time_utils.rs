// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for calendar dates entered on the command line.

use chrono::{Duration, Local, NaiveDate};

/// Today's date in the local time zone.
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a `YYYY-MM-DD` date, or one of `today` / `yesterday`.
pub fn parse_day(input: &str) -> Result<NaiveDate, String> {
    match input.trim().to_ascii_lowercase().as_str() {
        "today" => Ok(today_local()),
        "yesterday" => Ok(today_local() - Duration::days(1)),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
            .map_err(|_| format!("invalid date '{}': expected YYYY-MM-DD", input)),
    }
}
