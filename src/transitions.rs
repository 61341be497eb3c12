//! Transition direction inference and the transition operations built on it.

use tracing::{debug, info, warn};

use crate::classify::classify;
use crate::error::Result;
use crate::models::{RawTransition, StatusInfo, Transition};
use crate::tracker::IssueTracker;

/// Decide whether moving from `current` to the target status reads as
/// progress (`true`) or as a step back (`false`).
///
/// Impediment statuses are always backward. Moves within the same category
/// order are lateral and count as forward, so every transition gets a
/// direction.
pub fn resolve_direction(current: &StatusInfo, target_category: &str, target_name: &str) -> bool {
    let target = classify(target_category, target_name);
    if target.is_impediment {
        return false;
    }

    let current_order = classify(&current.category, &current.name).order;

    debug!(
        current_category = %current.category,
        current_order,
        target_category,
        target_order = target.order,
        target_name,
        "Resolving transition direction"
    );

    if target.order == current_order {
        return true;
    }
    target.order > current_order
}

/// Annotate raw transitions with their direction relative to `current`.
pub fn annotate(current: &StatusInfo, raw: Vec<RawTransition>) -> Vec<Transition> {
    raw.into_iter()
        .map(|t| {
            let is_forward = resolve_direction(current, &t.target.category, &t.target.name);
            Transition {
                id: t.id,
                name: t.name,
                target: t.target,
                is_forward,
            }
        })
        .collect()
}

/// Fetch the current status and the offered transitions for an issue and
/// return the transitions with `is_forward` populated.
pub fn available_transitions(tracker: &dyn IssueTracker, issue_key: &str) -> Result<Vec<Transition>> {
    let current = tracker.fetch_status(issue_key).inspect_err(|e| {
        warn!(issue = issue_key, error = %e, "Failed to fetch current status");
    })?;

    let raw = tracker.fetch_transitions(issue_key).inspect_err(|e| {
        warn!(issue = issue_key, error = %e, "Failed to fetch transitions");
    })?;

    Ok(annotate(&current, raw))
}

pub fn execute_status_transition(
    tracker: &dyn IssueTracker,
    issue_key: &str,
    transition_id: &str,
) -> Result<()> {
    match tracker.execute_transition(issue_key, transition_id) {
        Ok(()) => {
            info!(issue = issue_key, transition = transition_id, "Executed transition");
            Ok(())
        }
        Err(e) => {
            warn!(issue = issue_key, transition = transition_id, error = %e, "Transition failed");
            Err(e)
        }
    }
}
