use anyhow::{Context, Result};

use crate::db::Database;
use crate::tracker::IssueTracker;
use crate::worklog::WorkLogStore;

/// Submit the stopped session (or `duration`, if given) as a worklog.
///
/// The session is only saved back after a successful submission, so a
/// failed log can be retried as is.
pub fn run(
    db: &Database,
    tracker: &dyn IssueTracker,
    store: &WorkLogStore,
    duration: Option<&str>,
    comment: Option<&str>,
) -> Result<()> {
    let mut session = db.load_session()?;

    if let Some(text) = duration {
        session.set_manual_duration(text)?;
    }

    let key = session.issue_key().unwrap_or_default().to_string();
    let logged = session
        .log(comment, store, tracker)
        .with_context(|| format!("Failed to log work on {}", key))?;
    db.save_session(&session)?;

    println!("Logged {} on {}", logged.time_spent, logged.entry.issue_id);
    if !logged.saved_locally {
        eprintln!(
            "Warning: could not write local work log {}",
            store.path().display()
        );
    }

    Ok(())
}
