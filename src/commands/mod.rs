pub mod init;
pub mod log;
pub mod open;
pub mod recent;
pub mod select;
pub mod timer;
pub mod today;
pub mod track;
pub mod transition;

use anyhow::{bail, Result};

use crate::db::Database;

/// The issue to act on: the one given on the command line, else the one
/// selected in the saved session.
pub fn resolve_issue_key(db: &Database, key: Option<&str>) -> Result<String> {
    if let Some(key) = key {
        return normalize_issue_key(key);
    }

    match db.load_session()?.issue {
        Some(issue) => Ok(issue.key),
        None => bail!("No issue selected. Run 'jiratime select <KEY>' first."),
    }
}

/// Upper-case a user-supplied issue key and check it looks like `PROJ-123`.
pub fn normalize_issue_key(key: &str) -> Result<String> {
    let key = key.trim().to_uppercase();

    let valid = match key.split_once('-') {
        Some((project, number)) => {
            project.starts_with(|c: char| c.is_ascii_uppercase())
                && project.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
                && !number.is_empty()
                && number.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    };

    if !valid {
        bail!("Invalid issue key '{}'. Expected something like PROJ-123.", key);
    }
    Ok(key)
}

pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars - 3).collect();
        format!("{}...", truncated)
    }
}

pub(crate) fn format_elapsed(duration: chrono::Duration) -> String {
    let hours = duration.num_hours();
    let minutes = duration.num_minutes() % 60;
    let seconds = duration.num_seconds() % 60;
    format!("{}h {}m {}s", hours, minutes, seconds)
}
