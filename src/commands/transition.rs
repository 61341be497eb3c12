use anyhow::{bail, Context, Result};

use crate::db::Database;
use crate::models::Transition;
use crate::tracker::IssueTracker;
use crate::transitions::{available_transitions, execute_status_transition};

use super::resolve_issue_key;

fn arrow(transition: &Transition) -> &'static str {
    if transition.is_forward {
        "→"
    } else {
        "←"
    }
}

fn format_transition(t: &Transition) -> String {
    format!("  {} {:<6} {:<24} -> {}", arrow(t), t.id, t.name, t.target.name)
}

pub fn list(db: &Database, tracker: &dyn IssueTracker, issue_key: Option<&str>) -> Result<()> {
    let key = resolve_issue_key(db, issue_key)?;
    let transitions = available_transitions(tracker, &key)
        .with_context(|| format!("Failed to load transitions for {}", key))?;

    if transitions.is_empty() {
        println!("No transitions available for {}.", key);
        return Ok(());
    }

    println!("Transitions for {}:", key);
    for t in &transitions {
        println!("{}", format_transition(t));
    }

    Ok(())
}

/// Move the issue along the transition named by `transition`, given either
/// as its id or as its name (case-insensitive).
pub fn move_to(
    db: &Database,
    tracker: &dyn IssueTracker,
    transition: &str,
    issue_key: Option<&str>,
) -> Result<()> {
    let key = resolve_issue_key(db, issue_key)?;
    let transitions = available_transitions(tracker, &key)
        .with_context(|| format!("Failed to load transitions for {}", key))?;

    let wanted = transition.trim();
    let Some(chosen) = transitions
        .iter()
        .find(|t| t.id == wanted)
        .or_else(|| transitions.iter().find(|t| t.name.eq_ignore_ascii_case(wanted)))
    else {
        let offered: Vec<String> = transitions
            .iter()
            .map(|t| format!("{} ({})", t.id, t.name))
            .collect();
        if offered.is_empty() {
            bail!("No transitions available for {}", key);
        }
        bail!(
            "Transition '{}' is not available for {}. Available: {}",
            wanted,
            key,
            offered.join(", ")
        );
    };

    execute_status_transition(tracker, &key, &chosen.id)
        .with_context(|| format!("Failed to move {} via '{}'", key, chosen.name))?;

    println!(
        "{} {} moved to {} ({})",
        arrow(chosen),
        key,
        chosen.target.name,
        if chosen.is_forward { "forward" } else { "back" }
    );
    Ok(())
}
