//! Renders the previous check-in as priming context for a new session.

use crate::session::WellnessEntry;
use crate::store::RecordStore;

pub const FIRST_CHECKIN: &str = "This is the user's first check-in. Welcome them warmly.";

const CONTINUITY_HINT: &str =
    "Reference the previous check-in naturally in your conversation to show continuity and care.";

/// Describe the most recent check-in.
///
/// `total` is the number of check-ins on record, including `last`.
pub fn build_context(last: Option<&WellnessEntry>, total: usize) -> String {
    let Some(last) = last else {
        return FIRST_CHECKIN.to_string();
    };

    let mut parts = vec![
        format!(
            "The user has completed {} previous check-in(s).",
            total.max(1)
        ),
        format!("Last check-in was on {}.", last.date.format("%Y-%m-%d")),
    ];

    if let Some(ref mood) = last.mood {
        parts.push(format!("Last mood: {}.", mood));
    }
    if let Some(level) = last.energy_level {
        parts.push(format!("Last energy level: {}.", level));
    }
    if !last.objectives.is_empty() {
        let objectives: Vec<&str> = last.objectives.iter().take(3).map(String::as_str).collect();
        parts.push(format!("Last objectives: {}.", objectives.join(", ")));
    }

    format!("{}\n\n{}", parts.join(" "), CONTINUITY_HINT)
}

/// Read the store once and build the context for a new check-in
pub fn context_from_store(store: &RecordStore) -> String {
    let history = store.load_history();
    build_context(history.last(), history.len())
}
