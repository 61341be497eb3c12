use anyhow::{Context, Result};

use crate::db::Database;
use crate::tracker::IssueTracker;

use super::normalize_issue_key;

pub fn run(db: &Database, tracker: &dyn IssueTracker, issue_key: &str) -> Result<()> {
    let key = normalize_issue_key(issue_key)?;
    let summary = tracker
        .fetch_summary(&key)
        .with_context(|| format!("Failed to look up {}", key))?;

    let mut session = db.load_session()?;
    session.select(&key, Some(summary.clone()))?;
    db.save_session(&session)?;

    println!("Selected {}: {}", key, summary);
    Ok(())
}
