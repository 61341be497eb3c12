use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::error::Result;
use crate::session::{SelectedIssue, Session};

const SCHEMA_VERSION: i32 = 1;

/// Keeps the interactive session between invocations of the CLI.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        let version: i32 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap_or(0);

        if version < SCHEMA_VERSION {
            self.conn.execute_batch(
                r#"
                -- Single-row snapshot of the active session
                CREATE TABLE IF NOT EXISTS session (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    issue_key TEXT,
                    issue_summary TEXT,
                    started_at TEXT,
                    stopped_at TEXT,
                    elapsed_ns INTEGER NOT NULL DEFAULT 0,
                    manual_duration TEXT,
                    updated_at TEXT NOT NULL
                );
                "#,
            )?;

            self.conn
                .execute(&format!("PRAGMA user_version = {}", SCHEMA_VERSION), [])?;
        }

        Ok(())
    }

    /// The saved session, or a fresh idle one if nothing was saved yet.
    pub fn load_session(&self) -> Result<Session> {
        let row = self
            .conn
            .query_row(
                "SELECT issue_key, issue_summary, started_at, stopped_at, elapsed_ns, manual_duration FROM session WHERE id = 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, Option<String>>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((issue_key, summary, started_at, stopped_at, elapsed_ns, manual)) = row else {
            return Ok(Session::new());
        };

        Ok(Session {
            issue: issue_key.map(|key| SelectedIssue { key, summary }),
            start_time: started_at.and_then(parse_datetime),
            stop_time: stopped_at.and_then(parse_datetime),
            elapsed: Duration::nanoseconds(elapsed_ns),
            manual_duration: manual,
        })
    }

    pub fn save_session(&self, session: &Session) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let (issue_key, summary) = match &session.issue {
            Some(issue) => (Some(issue.key.as_str()), issue.summary.as_deref()),
            None => (None, None),
        };

        self.conn.execute(
            r#"
            INSERT INTO session (id, issue_key, issue_summary, started_at, stopped_at, elapsed_ns, manual_duration, updated_at)
            VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                issue_key = excluded.issue_key,
                issue_summary = excluded.issue_summary,
                started_at = excluded.started_at,
                stopped_at = excluded.stopped_at,
                elapsed_ns = excluded.elapsed_ns,
                manual_duration = excluded.manual_duration,
                updated_at = excluded.updated_at
            "#,
            params![
                issue_key,
                summary,
                session.start_time.map(format_datetime),
                session.stop_time.map(format_datetime),
                session.elapsed.num_nanoseconds().unwrap_or(i64::MAX),
                session.manual_duration,
                now
            ],
        )?;
        Ok(())
    }
}

fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_datetime(s: String) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
