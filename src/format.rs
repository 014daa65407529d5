// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Pure formatting helpers for dashboard display values.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

const BYTE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Format an integer with decimal thousands separators ("1,234,567").
#[must_use]
pub fn format_number(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    if n < 0 {
        out.push('-');
    }

    let lead = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - lead) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }

    out
}

/// Format a duration given in milliseconds.
///
/// Durations under one second render as milliseconds, everything else as
/// seconds, both with two decimal places.
#[must_use]
pub fn format_duration(milliseconds: f64) -> String {
    if milliseconds < 1000.0 {
        format!("{milliseconds:.2}ms")
    } else {
        format!("{:.2}s", milliseconds / 1000.0)
    }
}

/// Format a byte count using base-1024 units up to GB.
///
/// Values are rounded to two decimal places with trailing zeros trimmed,
/// so `1536` renders as "1.5 KB" and `1024` as "1 KB".
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let exponent = (((bytes as f64).ln() / 1024_f64.ln()).floor() as usize)
        .min(BYTE_UNITS.len() - 1);
    let value = bytes as f64 / 1024_f64.powi(exponent as i32);
    let rounded = (value * 100.0).round() / 100.0;

    let mut formatted = format!("{rounded:.2}");
    while formatted.ends_with('0') {
        formatted.pop();
    }
    if formatted.ends_with('.') {
        formatted.pop();
    }

    format!("{} {}", formatted, BYTE_UNITS[exponent])
}

/// Format an ISO timestamp string for display ("YYYY-MM-DD HH:MM:SS").
///
/// Accepts timestamps with or without a UTC offset. Unparseable input is
/// returned unchanged so a malformed backend timestamp still shows something.
#[must_use]
pub fn format_date(timestamp: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return dt.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    if let Ok(dt) = timestamp.parse::<NaiveDateTime>() {
        return dt.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    timestamp.to_string()
}

/// An inclusive date range as ISO dates (no time component).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    /// Range start, "YYYY-MM-DD".
    pub start: String,
    /// Range end, "YYYY-MM-DD".
    pub end: String,
}

/// Get the date range ending today (UTC) and starting `days` days earlier.
#[must_use]
pub fn date_range(days: i64) -> DateRange {
    date_range_from(Utc::now(), days)
}

fn date_range_from(end: DateTime<Utc>, days: i64) -> DateRange {
    let start = end - Duration::days(days);
    DateRange {
        start: start.format("%Y-%m-%d").to_string(),
        end: end.format("%Y-%m-%d").to_string(),
    }
}
