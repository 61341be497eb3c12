//! Status category classification.
//!
//! Maps a workflow status onto the ordered scale new < indeterminate < done
//! and flags statuses whose names mark work as stalled.

/// Ordinal assigned to category keys the tracker may invent for custom
/// workflows. Sits in the middle of the scale.
pub const UNKNOWN_CATEGORY_ORDER: u8 = 2;

const CATEGORY_ORDER: &[(&str, u8)] = &[("new", 1), ("indeterminate", 2), ("done", 3)];

const IMPEDIMENT_STATUSES: &[&str] = &["on hold", "blocked", "hold", "paused", "waiting", "deferred"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub order: u8,
    pub is_impediment: bool,
}

pub fn classify(category_key: &str, status_name: &str) -> Classification {
    Classification {
        order: category_order(category_key),
        is_impediment: is_impediment(status_name),
    }
}

pub fn category_order(category_key: &str) -> u8 {
    CATEGORY_ORDER
        .iter()
        .find(|(key, _)| *key == category_key)
        .map(|(_, order)| *order)
        .unwrap_or(UNKNOWN_CATEGORY_ORDER)
}

pub fn is_impediment(status_name: &str) -> bool {
    let normalized = status_name.to_lowercase();
    IMPEDIMENT_STATUSES.contains(&normalized.as_str())
}
