//! Test fixtures for building cards and sets.
//!
//! Completions are stamped with a fixed date so fixtures compare equal
//! across runs.

use chrono::{TimeZone, Utc};
use std::time::Duration;

use crate::domain::{Card, Completion, Outcome, Set};

/// A one-minute completion on a fixed date. `None` makes it unattributed.
pub fn completion(user: Option<&str>) -> Completion {
    Completion::new(
        Utc.with_ymd_and_hms(2021, 2, 16, 10, 18, 0).unwrap(),
        Duration::from_secs(60),
        user.map(str::to_string),
    )
}

/// Card with `count` completions of each listed outcome. An empty user
/// records unattributed completions.
pub fn card_with(id: &str, path: &str, history: &[(Outcome, usize, &str)]) -> Card {
    let mut card = Card::new(id, path);
    for (outcome, count, user) in history {
        let user = if user.is_empty() { None } else { Some(*user) };
        for _ in 0..*count {
            card.add_completion(*outcome, completion(user));
        }
    }
    card
}

/// Set of cards with no completions at the given paths, using the path as id.
pub fn fresh_set(paths: &[&str]) -> Set {
    paths.iter().map(|path| Card::new(*path, *path)).collect()
}
