use anyhow::{bail, Result};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration as StdDuration;

use chrono::Utc;
use tracing::debug;

use crate::db::Database;
use crate::duration::format_duration;
use crate::session::SessionState;

use super::{format_elapsed, normalize_issue_key};

pub const TICK: StdDuration = StdDuration::from_secs(1);

/// Run the timer in the foreground until `stop` is raised, then stop it and
/// save the result. A timer that is already running is picked up rather
/// than restarted.
pub fn run_until(
    db: &Database,
    issue_key: Option<&str>,
    stop: Arc<AtomicBool>,
    tick: StdDuration,
) -> Result<()> {
    let mut session = db.load_session()?;

    if let Some(key) = issue_key {
        session.select(&normalize_issue_key(key)?, None)?;
    }

    let Some(key) = session.issue_key().map(str::to_string) else {
        bail!("No issue selected. Run 'jiratime track <KEY>' or 'jiratime select <KEY>' first.");
    };

    if session.state() != SessionState::Running {
        session.start()?;
        db.save_session(&session)?;
    }

    println!("Tracking {}. Press Ctrl-C to stop.", key);

    let started = session.start_time.unwrap_or_else(Utc::now);
    let mut stdout = std::io::stdout();
    while !stop.load(Ordering::Relaxed) {
        let elapsed = Utc::now().signed_duration_since(started);
        print!("\r{}  {}", key, format_elapsed(elapsed));
        let _ = stdout.flush();
        thread::sleep(tick);
    }
    println!();
    debug!(issue = %key, "Stop requested");

    let elapsed = session.stop()?;
    db.save_session(&session)?;

    println!("Stopped timer for {}", key);
    println!("Time spent: {}", format_elapsed(elapsed));
    println!("Run 'jiratime log' to submit {}.", format_duration(elapsed));

    Ok(())
}
