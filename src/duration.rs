//! Worklog duration formatting and manual-entry parsing.

use chrono::Duration;

use crate::error::{Error, Result};

/// Longest duration a manual entry may ask for.
pub const MAX_DURATION_HOURS: i64 = 10_000;

/// Format a duration the way Jira's `timeSpent` field expects it.
///
/// Only whole hours and minutes are kept. Anything under a minute is
/// reported as `1m` so a logged session never reads as zero.
pub fn format_duration(duration: Duration) -> String {
    let hours = duration.num_hours();
    let minutes = duration.num_minutes() % 60;

    if hours > 0 && minutes > 0 {
        format!("{}h {}m", hours, minutes)
    } else if hours > 0 {
        format!("{}h", hours)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        "1m".to_string()
    }
}

/// Parse a manually entered duration such as `1h 30m`, `1h30m`, `45m`,
/// `1.5h` or `90s`.
///
/// Whitespace between components is ignored. The result must be positive.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let invalid = || Error::InvalidDuration(input.to_string());

    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(invalid());
    }

    let mut total_ms: f64 = 0.0;
    let mut rest = compact.as_str();

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        if number_len == 0 {
            return Err(invalid());
        }
        let value: f64 = rest[..number_len].parse().map_err(|_| invalid())?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit_ms = match &rest[..unit_len] {
            "h" => 3_600_000.0,
            "m" => 60_000.0,
            "s" => 1_000.0,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];

        total_ms += value * unit_ms;
    }

    let max_ms = (MAX_DURATION_HOURS * 3_600_000) as f64;
    if !total_ms.is_finite() || total_ms < 1.0 || total_ms > max_ms {
        return Err(invalid());
    }

    Ok(Duration::milliseconds(total_ms.round() as i64))
}
