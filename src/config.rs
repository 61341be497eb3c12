//! Settings for reaching the tracker and locating local files.
//!
//! Values come from `~/.jirarc` (JSON) and may be overridden per invocation
//! by command-line flags or their environment variables. The resulting
//! `Config` is handed explicitly to whatever needs it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

pub const RC_FILE_NAME: &str = ".jirarc";
pub const DATA_DIR_NAME: &str = ".jiratime";
pub const WORK_LOG_FILE_NAME: &str = ".jira_time_log.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Path suffix of the GraphQL gateway URL older configurations store as
/// the base URL.
const GRAPHQL_SUFFIX: &str = "/gateway/api/graphql";

/// On-disk shape of `~/.jirarc`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RcFile {
    /// API token.
    pub jira: Option<String>,
    pub email: Option<String>,
    pub base_url: Option<String>,
    pub log_file: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

/// Per-invocation overrides, usually from CLI flags.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub api_token: Option<String>,
    pub email: Option<String>,
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: Option<String>,
    pub api_token: Option<String>,
    pub email: Option<String>,
    pub log_file: PathBuf,
    pub data_dir: PathBuf,
    pub timeout: Duration,
}

/// Connection settings once both base URL and token are known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    pub base_url: String,
    pub api_token: String,
    pub email: Option<String>,
    pub timeout: Duration,
}

pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| Error::Config("Home directory not found".to_string()))
}

pub fn default_rc_path() -> Result<PathBuf> {
    Ok(home_dir()?.join(RC_FILE_NAME))
}

impl RcFile {
    /// Read the rc file. A missing file yields empty settings.
    pub fn read(path: &Path) -> Result<Self> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No rc file, using defaults");
                return Ok(RcFile::default());
            }
            Err(e) => {
                return Err(Error::Config(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&data)
            .map_err(|e| Error::Config(format!("{} is malformed: {}", path.display(), e)))
    }
}

impl Config {
    /// Load from the rc file at `rc_path` (or `~/.jirarc`), then apply
    /// `overrides`. Local paths are rooted at `home`.
    pub fn load(rc_path: Option<&Path>, home: &Path, overrides: Overrides) -> Result<Self> {
        let rc_path = rc_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| home.join(RC_FILE_NAME));
        let rc = RcFile::read(&rc_path)?;
        Ok(Self::resolve(rc, home, overrides))
    }

    pub fn resolve(rc: RcFile, home: &Path, overrides: Overrides) -> Self {
        let base_url = overrides
            .base_url
            .or(rc.base_url)
            .map(|url| normalize_base_url(&url))
            .filter(|url| !url.is_empty());
        let api_token = overrides.api_token.or(rc.jira).filter(|t| !t.is_empty());
        let email = overrides.email.or(rc.email).filter(|e| !e.is_empty());
        let log_file = overrides
            .log_file
            .or(rc.log_file)
            .unwrap_or_else(|| home.join(WORK_LOG_FILE_NAME));

        Config {
            base_url,
            api_token,
            email,
            log_file,
            data_dir: home.join(DATA_DIR_NAME),
            timeout: Duration::from_secs(rc.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        }
    }

    pub fn session_db_path(&self) -> PathBuf {
        self.data_dir.join("session.db")
    }

    /// Connection settings, or an error naming what is missing.
    pub fn remote(&self) -> Result<RemoteSettings> {
        let base_url = self.base_url.clone().ok_or_else(|| {
            Error::Config(
                "No Jira base URL. Set \"baseUrl\" in ~/.jirarc or JIRA_BASE_URL".to_string(),
            )
        })?;
        let api_token = self.api_token.clone().ok_or_else(|| {
            Error::Config(
                "No Jira API token. Set \"jira\" in ~/.jirarc or JIRA_API_TOKEN".to_string(),
            )
        })?;

        Ok(RemoteSettings {
            base_url,
            api_token,
            email: self.email.clone(),
            timeout: self.timeout,
        })
    }

    /// Browser URL for an issue.
    pub fn browse_url(&self, issue_key: &str) -> Result<String> {
        let base = self
            .base_url
            .as_deref()
            .ok_or_else(|| Error::Config("No Jira base URL configured".to_string()))?;
        Ok(format!("{}/browse/{}", base, issue_key))
    }
}

fn normalize_base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    url.strip_suffix(GRAPHQL_SUFFIX).unwrap_or(url).to_string()
}
