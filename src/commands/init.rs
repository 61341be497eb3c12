use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::config::{DATA_DIR_NAME, RC_FILE_NAME};
use crate::db::Database;

// Embed the settings template at compile time
const RC_TEMPLATE: &str = include_str!("../../resources/jirarc.example");

pub fn run(home: &Path, force: bool) -> Result<()> {
    let rc_path = home.join(RC_FILE_NAME);
    let data_dir = home.join(DATA_DIR_NAME);

    let rc_exists = rc_path.exists();
    let data_exists = data_dir.exists();

    if rc_exists && data_exists && !force {
        println!("Already initialized at {}", home.display());
        println!("Use --force to overwrite {} with the template.", rc_path.display());
        return Ok(());
    }

    if !data_exists {
        fs::create_dir_all(&data_dir).context("Failed to create data directory")?;
        Database::open(&data_dir.join("session.db"))?;
        println!("Created {}", data_dir.display());
    }

    if !rc_exists || force {
        fs::write(&rc_path, RC_TEMPLATE)
            .with_context(|| format!("Failed to write {}", rc_path.display()))?;

        if force && rc_exists {
            println!("Replaced {} with the template", rc_path.display());
        } else {
            println!("Created {}", rc_path.display());
        }
    }

    println!("jiratime initialized successfully!");
    println!("\nNext steps:");
    println!("  Edit {} and add your API token", rc_path.display());
    println!("  jiratime recent             # Pick an issue");
    println!("  jiratime start PROJ-123     # Start timing");

    Ok(())
}
