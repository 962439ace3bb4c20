//! Card filters used by the store layer to carve a set out of a collection.
//!
//! The engine never filters on its own; callers build a filter list (usually
//! from a configured set) and apply it with [`Set::filter`](crate::domain::Set::filter).

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::domain::Card;

/// Predicate deciding whether a card belongs in a set.
pub type Filter = Box<dyn Fn(&Card) -> bool + Send + Sync>;

/// Allow cards whose path starts with any of `paths`.
pub fn paths(paths: Vec<String>) -> Filter {
    Box::new(move |card| paths.iter().any(|path| card.path.starts_with(path.as_str())))
}

/// Allow cards carrying every tag in `tags`.
pub fn tags(tags: Vec<String>) -> Filter {
    Box::new(move |card| tags.iter().all(|tag| card.tags.contains(tag)))
}

/// Allow cards added strictly before `date`. Undated cards are excluded.
pub fn before_date(date: DateTime<Utc>) -> Filter {
    Box::new(move |card| card.date.is_some_and(|added| added < date))
}

/// Allow cards added strictly after `date`. Undated cards are excluded.
pub fn after_date(date: DateTime<Utc>) -> Filter {
    Box::new(move |card| card.date.is_some_and(|added| added > date))
}

/// Allow cards added more than `age` before `now`.
pub fn before_duration(age: Duration, now: DateTime<Utc>) -> Filter {
    before_date(cutoff(age, now))
}

/// Allow cards added within `age` of `now`.
pub fn after_duration(age: Duration, now: DateTime<Utc>) -> Filter {
    after_date(cutoff(age, now))
}

fn cutoff(age: Duration, now: DateTime<Utc>) -> DateTime<Utc> {
    chrono::Duration::from_std(age)
        .ok()
        .and_then(|age| now.checked_sub_signed(age))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
