use anyhow::{Context, Result};

use crate::config::Config;
use crate::db::Database;

use super::resolve_issue_key;

pub fn issue_url(db: &Database, config: &Config, issue_key: Option<&str>) -> Result<String> {
    let key = resolve_issue_key(db, issue_key)?;
    Ok(config.browse_url(&key)?)
}

pub fn run(db: &Database, config: &Config, issue_key: Option<&str>) -> Result<()> {
    let url = issue_url(db, config, issue_key)?;
    open::that(&url).with_context(|| format!("Failed to open {}", url))?;
    println!("Opened {}", url);
    Ok(())
}
