use anyhow::Result;
use chrono::{Duration, Local, NaiveDate};

use crate::duration::{format_duration, parse_duration};
use crate::models::TimeLogEntry;
use crate::worklog::WorkLogStore;

use super::truncate;

/// Print the work logged on `date` (default today) with a total.
pub fn run(store: &WorkLogStore, date: Option<NaiveDate>) -> Result<()> {
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let entries = store.query_by_date(date);

    if entries.is_empty() {
        println!("No work logged on {}.", date);
        return Ok(());
    }

    println!("Work logged on {}:", date);
    for entry in &entries {
        let logged_at = entry.logged_at.with_timezone(&Local).format("%H:%M");
        println!(
            "  {}  {:<12} {:>7}  {}",
            logged_at,
            entry.issue_id,
            entry.duration_text,
            truncate(&entry.summary, 50)
        );
    }
    println!(
        "Total: {} across {} entries",
        format_duration(total_logged(&entries)),
        entries.len()
    );

    Ok(())
}

/// Sum of the durations that were submitted. Entries whose duration text
/// no longer parses count their tracked interval instead.
pub fn total_logged(entries: &[TimeLogEntry]) -> Duration {
    entries
        .iter()
        .map(|entry| {
            parse_duration(&entry.duration_text)
                .unwrap_or_else(|_| entry.end_time - entry.start_time)
        })
        .fold(Duration::zero(), |total, d| total + d)
}
