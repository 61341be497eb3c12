use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{RawTransition, RecentIssue, StatusInfo};

/// Remote operations the time-tracking core relies on.
///
/// `JiraClient` implements this over HTTP. Every call blocks until the
/// tracker answers or the request fails.
pub trait IssueTracker {
    fn fetch_status(&self, issue_key: &str) -> Result<StatusInfo>;

    fn fetch_transitions(&self, issue_key: &str) -> Result<Vec<RawTransition>>;

    fn execute_transition(&self, issue_key: &str, transition_id: &str) -> Result<()>;

    fn submit_worklog(
        &self,
        issue_key: &str,
        time_spent: &str,
        comment: &str,
        started: DateTime<Utc>,
    ) -> Result<()>;

    fn fetch_summary(&self, issue_key: &str) -> Result<String>;

    fn recent_issues(&self, max_results: usize) -> Result<Vec<RecentIssue>>;
}
