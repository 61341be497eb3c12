use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A workflow status as reported by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Status category key ("new", "indeterminate", "done", or a custom key).
    pub category: String,
}

/// A transition offered by the tracker before direction is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTransition {
    pub id: String,
    pub name: String,
    pub target: StatusInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub id: String,
    pub name: String,
    pub target: StatusInfo,
    pub is_forward: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentIssue {
    pub key: String,
    pub summary: String,
    pub status: String,
}

/// A completed session as persisted in the local work log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeLogEntry {
    #[serde(rename = "jiraId")]
    pub issue_id: String,
    pub summary: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(rename = "duration")]
    pub duration_text: String,
    pub comment: String,
    pub logged_at: DateTime<Utc>,
}
