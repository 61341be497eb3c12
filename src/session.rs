//! The timing session for the currently selected issue.
//!
//! A session moves Idle -> Running -> Stopped and back to Idle through a
//! reset or a successful log. Supplying a manual duration while idle puts
//! the session straight into Stopped.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::duration::{format_duration, parse_duration};
use crate::error::{Error, Result};
use crate::models::TimeLogEntry;
use crate::tracker::IssueTracker;
use crate::worklog::WorkLogStore;

pub const DEFAULT_COMMENT: &str = "Time tracked via JiraTimeWidget";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedIssue {
    pub key: String,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Stopped,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SessionState::Idle => "idle",
            SessionState::Running => "running",
            SessionState::Stopped => "stopped",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub issue: Option<SelectedIssue>,
    pub start_time: Option<DateTime<Utc>>,
    pub stop_time: Option<DateTime<Utc>>,
    pub elapsed: Duration,
    pub manual_duration: Option<String>,
}

/// What a successful `log` produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedWork {
    pub entry: TimeLogEntry,
    pub time_spent: String,
    /// False when the local work log could not be written. The remote
    /// worklog was still submitted.
    pub saved_locally: bool,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            issue: None,
            start_time: None,
            stop_time: None,
            elapsed: Duration::zero(),
            manual_duration: None,
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        match (self.start_time, self.stop_time) {
            (Some(_), None) => SessionState::Running,
            (_, Some(_)) => SessionState::Stopped,
            (None, None) if self.has_manual_duration() => SessionState::Stopped,
            (None, None) => SessionState::Idle,
        }
    }

    pub fn issue_key(&self) -> Option<&str> {
        self.issue.as_ref().map(|i| i.key.as_str())
    }

    fn has_manual_duration(&self) -> bool {
        self.manual_duration
            .as_deref()
            .is_some_and(|text| !text.trim().is_empty())
    }

    fn running_label(&self) -> String {
        self.issue_key().unwrap_or("(no issue)").to_string()
    }

    /// Select the issue to track. Switching to a different issue discards
    /// any stopped timer or manual duration; a running timer must be
    /// stopped first.
    pub fn select(&mut self, key: &str, summary: Option<String>) -> Result<()> {
        if self.issue_key() == Some(key) {
            if let Some(issue) = self.issue.as_mut() {
                if summary.is_some() {
                    issue.summary = summary;
                }
            }
            return Ok(());
        }

        if self.state() == SessionState::Running {
            return Err(Error::AlreadyRunning(self.running_label()));
        }

        self.clear_timer();
        self.issue = Some(SelectedIssue {
            key: key.to_string(),
            summary,
        });
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        self.start_at(Utc::now())
    }

    pub fn start_at(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.state() == SessionState::Running {
            return Err(Error::AlreadyRunning(self.running_label()));
        }

        self.start_time = Some(now);
        self.stop_time = None;
        self.elapsed = Duration::zero();
        self.manual_duration = None;
        info!(issue = ?self.issue_key(), "Timer started");
        Ok(())
    }

    pub fn stop(&mut self) -> Result<Duration> {
        self.stop_at(Utc::now())
    }

    /// Stop the running timer and return the measured duration.
    ///
    /// Fails with `NotStarted`, leaving the session untouched, unless the
    /// timer is running.
    pub fn stop_at(&mut self, now: DateTime<Utc>) -> Result<Duration> {
        let started = match (self.start_time, self.stop_time) {
            (Some(started), None) => started,
            _ => return Err(Error::NotStarted),
        };

        self.stop_time = Some(now);
        self.elapsed = now - started;
        info!(
            issue = ?self.issue_key(),
            elapsed_secs = self.elapsed.num_seconds(),
            "Timer stopped"
        );
        Ok(self.elapsed)
    }

    pub fn reset(&mut self) {
        self.clear_timer();
        info!(issue = ?self.issue_key(), "Timer reset");
    }

    /// Record a manually entered duration. An empty string clears it.
    pub fn set_manual_duration(&mut self, text: &str) -> Result<()> {
        if self.state() == SessionState::Running {
            return Err(Error::TimerRunning(self.running_label()));
        }

        let text = text.trim();
        self.manual_duration = if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        };
        Ok(())
    }

    /// The duration a log would submit: the manual entry when one is
    /// present, otherwise the measured time.
    pub fn resolve_duration(&self) -> Result<Duration> {
        if let Some(text) = self.manual_duration.as_deref() {
            if !text.trim().is_empty() {
                return parse_duration(text);
            }
        }

        if self.elapsed > Duration::zero() {
            return Ok(self.elapsed);
        }

        Err(Error::NoDuration)
    }

    pub fn log(
        &mut self,
        comment: Option<&str>,
        store: &WorkLogStore,
        tracker: &dyn IssueTracker,
    ) -> Result<LoggedWork> {
        self.log_at(Utc::now(), comment, store, tracker)
    }

    /// Record the session locally and submit it to the tracker.
    ///
    /// The local entry is written first and is kept even if the remote
    /// submission fails. On success the timer is cleared and the issue
    /// stays selected; on failure the session is left as it was.
    pub fn log_at(
        &mut self,
        now: DateTime<Utc>,
        comment: Option<&str>,
        store: &WorkLogStore,
        tracker: &dyn IssueTracker,
    ) -> Result<LoggedWork> {
        let issue = self.issue.clone().ok_or(Error::NoIssueSelected)?;

        if self.state() == SessionState::Running {
            return Err(Error::TimerRunning(issue.key));
        }

        let duration = self.resolve_duration()?;
        let time_spent = format_duration(duration);
        let comment = match comment.map(str::trim) {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => DEFAULT_COMMENT.to_string(),
        };

        let (start_time, end_time) = match (self.start_time, self.stop_time) {
            (Some(start), Some(stop)) => (start, stop),
            _ => {
                let start = now
                    .checked_sub_signed(duration)
                    .ok_or_else(|| Error::InvalidDuration(time_spent.clone()))?;
                (start, now)
            }
        };

        let entry = TimeLogEntry {
            issue_id: issue.key.clone(),
            summary: issue.summary.clone().unwrap_or_default(),
            start_time,
            end_time,
            duration_text: time_spent.clone(),
            comment: comment.clone(),
            logged_at: now,
        };

        let saved_locally = match store.append(entry.clone()) {
            Ok(()) => true,
            Err(e) => {
                warn!(issue = %issue.key, error = %e, "Failed to save local work log entry");
                false
            }
        };

        tracker
            .submit_worklog(&issue.key, &time_spent, &comment, start_time)
            .inspect_err(|e| {
                warn!(issue = %issue.key, error = %e, "Failed to submit worklog");
            })?;

        info!(issue = %issue.key, time_spent = %time_spent, "Logged work");
        self.clear_timer();

        Ok(LoggedWork {
            entry,
            time_spent,
            saved_locally,
        })
    }

    fn clear_timer(&mut self) {
        self.start_time = None;
        self.stop_time = None;
        self.elapsed = Duration::zero();
        self.manual_duration = None;
    }
}
