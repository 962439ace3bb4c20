//! Baseline views that ignore difficulty.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::domain::{Card, Set};
use crate::srs::card_selector::pick_uniform;

/// Any card, uniformly.
#[derive(Debug, Clone)]
pub struct RandomView {
  rng: ChaCha8Rng,
}

impl RandomView {
  pub fn new(seed: u64) -> Self {
    Self {
      rng: ChaCha8Rng::seed_from_u64(seed),
    }
  }

  pub fn next<'a>(&mut self, set: &'a Set) -> Option<&'a Card> {
    let cards: Vec<&Card> = set.iter().collect();
    pick_uniform(&mut self.rng, &cards)
  }
}

/// Any card the user has never completed, uniformly.
#[derive(Debug, Clone)]
pub struct UnseenView {
  rng: ChaCha8Rng,
}

impl UnseenView {
  pub fn new(seed: u64) -> Self {
    Self {
      rng: ChaCha8Rng::seed_from_u64(seed),
    }
  }

  pub fn next<'a>(&mut self, set: &'a Set, user: &str) -> Option<&'a Card> {
    let unseen: Vec<&Card> = set.iter().filter(|card| card.is_unanswered_by(user)).collect();
    pick_uniform(&mut self.rng, &unseen)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Outcome;
  use crate::testing::{card_with, fresh_set};
  use std::collections::HashSet;

  #[test]
  fn test_random_covers_whole_set() {
    let set = fresh_set(&["a/1", "a/2", "b/3"]);
    let mut view = RandomView::new(4);

    let seen: HashSet<&str> = (0..100)
      .map(|_| view.next(&set).unwrap().id.as_str())
      .collect();
    assert_eq!(seen.len(), 3);
  }

  #[test]
  fn test_random_empty_set() {
    let mut view = RandomView::new(4);
    assert!(view.next(&Set::default()).is_none());
  }

  #[test]
  fn test_unseen_only_returns_unanswered_cards() {
    let set = Set::new(vec![
      card_with("seen-1", "algebra/q1", &[(Outcome::Perfect, 1, "alice")]),
      card_with("seen-2", "algebra/q2", &[(Outcome::Major, 2, "alice")]),
      card_with("fresh-1", "algebra/q3", &[(Outcome::Perfect, 1, "bob")]),
      card_with("seen-3", "geometry/q4", &[(Outcome::Minor, 1, "alice")]),
      card_with("fresh-2", "geometry/q5", &[]),
    ]);
    let mut view = UnseenView::new(21);

    let mut seen = HashSet::new();
    for _ in 0..200 {
      let card = view.next(&set, "alice").unwrap();
      assert!(card.id.starts_with("fresh"), "picked answered card {}", card.id);
      seen.insert(card.id.clone());
    }
    assert_eq!(seen.len(), 2);
  }

  #[test]
  fn test_unseen_empty_user_counts_all_completions() {
    let set = Set::new(vec![
      card_with("a", "algebra/q1", &[(Outcome::Perfect, 1, "bob")]),
      card_with("b", "algebra/q2", &[]),
    ]);
    let mut view = UnseenView::new(2);
    for _ in 0..20 {
      assert_eq!(view.next(&set, "").unwrap().id, "b");
    }
  }

  #[test]
  fn test_unseen_none_when_everything_answered() {
    let set = Set::new(vec![card_with("a", "algebra/q1", &[(Outcome::Perfect, 1, "alice")])]);
    let mut view = UnseenView::new(2);
    assert!(view.next(&set, "alice").is_none());
  }
}
