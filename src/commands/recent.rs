use anyhow::{Context, Result};

use crate::models::RecentIssue;
use crate::tracker::IssueTracker;

use super::truncate;

pub const DEFAULT_LIMIT: usize = 50;

pub fn run(tracker: &dyn IssueTracker, limit: usize) -> Result<()> {
    let issues = tracker
        .recent_issues(limit)
        .context("Failed to fetch recent issues")?;

    if issues.is_empty() {
        println!("No recent issues assigned to you.");
        return Ok(());
    }

    for issue in &issues {
        println!("{}", format_row(issue));
    }

    Ok(())
}

fn format_row(issue: &RecentIssue) -> String {
    format!(
        "{:<12} {:<14} {}",
        issue.key,
        truncate(&issue.status, 14),
        truncate(&issue.summary, 60)
    )
}
