use anyhow::{bail, Result};
use chrono::{DateTime, Utc};

use crate::db::Database;
use crate::duration::{format_duration, parse_duration};
use crate::session::{Session, SessionState};

use super::{format_elapsed, normalize_issue_key};

pub fn start(db: &Database, issue_key: Option<&str>) -> Result<()> {
    let mut session = db.load_session()?;

    if let Some(key) = issue_key {
        session.select(&normalize_issue_key(key)?, None)?;
    }

    let Some(issue) = session.issue.clone() else {
        bail!("No issue selected. Run 'jiratime start <KEY>' or 'jiratime select <KEY>' first.");
    };

    session.start()?;
    db.save_session(&session)?;

    match issue.summary {
        Some(summary) => println!("Started timer for {}: {}", issue.key, summary),
        None => println!("Started timer for {}", issue.key),
    }
    println!("Run 'jiratime stop' when done.");

    Ok(())
}

pub fn stop(db: &Database) -> Result<()> {
    let mut session = db.load_session()?;
    let elapsed = session.stop()?;
    db.save_session(&session)?;

    println!(
        "Stopped timer for {}",
        session.issue_key().unwrap_or("(no issue)")
    );
    println!("Time spent: {}", format_elapsed(elapsed));
    println!("Will log as: {}", format_duration(elapsed));
    println!("Run 'jiratime log' to submit it.");

    Ok(())
}

pub fn reset(db: &Database) -> Result<()> {
    let mut session = db.load_session()?;
    session.reset();
    db.save_session(&session)?;

    println!("Timer reset.");
    Ok(())
}

pub fn status(db: &Database) -> Result<()> {
    let session = db.load_session()?;
    for line in status_lines(&session, Utc::now()) {
        println!("{}", line);
    }
    Ok(())
}

fn status_lines(session: &Session, now: DateTime<Utc>) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push(match &session.issue {
        Some(issue) => match &issue.summary {
            Some(summary) => format!("Issue: {} {}", issue.key, summary),
            None => format!("Issue: {}", issue.key),
        },
        None => "No issue selected.".to_string(),
    });

    lines.push(match session.state() {
        SessionState::Running => {
            let started_at = session.start_time.unwrap_or(now);
            format!("Timer running: {}", format_elapsed(now - started_at))
        }
        SessionState::Stopped => match session.resolve_duration() {
            Ok(duration) => format!("Stopped. Ready to log {}", format_duration(duration)),
            Err(e) => format!("Stopped. {}", e),
        },
        SessionState::Idle => "No timer running.".to_string(),
    });

    lines
}

/// Enter a duration by hand instead of timing one. An empty value clears it.
pub fn duration(db: &Database, text: &str) -> Result<()> {
    let mut session = db.load_session()?;

    if text.trim().is_empty() {
        session.set_manual_duration("")?;
        db.save_session(&session)?;
        println!("Manual duration cleared.");
        return Ok(());
    }

    let parsed = parse_duration(text)?;
    session.set_manual_duration(text)?;
    db.save_session(&session)?;

    println!("Manual duration set: {}", format_duration(parsed));
    Ok(())
}
