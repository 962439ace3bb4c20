//! Draw helpers shared by the views: candidate pools and weighted or
//! uniform random picks.

use rand::Rng;

use crate::domain::{Card, Set};

/// Scale applied to a [0, 1] score to turn it into an integer weight
pub const WEIGHT_SCALE: f64 = 1000.0;

/// A category path with its integer selection weight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathWeight<'a> {
  pub path: &'a str,
  pub weight: u64,
}

impl<'a> PathWeight<'a> {
  /// Weight from a [0, 1] score, scaled by [`WEIGHT_SCALE`].
  pub fn from_score(path: &'a str, score: f64) -> Self {
    Self {
      path,
      weight: (score.max(0.0) * WEIGHT_SCALE).round() as u64,
    }
  }
}

/// Cards under `category` with no completions by `user` (everyone if empty).
pub fn unanswered_cards<'a>(set: &'a Set, category: &str, user: &str) -> Vec<&'a Card> {
  set
    .iter()
    .filter(|card| card.is_under(category) && card.is_unanswered_by(user))
    .collect()
}

/// Uniform pick from `cards`.
pub fn pick_uniform<'a, R: Rng>(rng: &mut R, cards: &[&'a Card]) -> Option<&'a Card> {
  if cards.is_empty() {
    return None;
  }
  Some(cards[rng.random_range(0..cards.len())])
}

/// Index of a weighted random pick. Higher weight = more likely to be selected.
/// Falls back to a uniform pick if every weight is zero.
pub fn weighted_random_select<R: Rng>(rng: &mut R, weights: &[PathWeight<'_>]) -> Option<usize> {
  if weights.is_empty() {
    return None;
  }

  let total_weight: u64 = weights.iter().map(|w| w.weight).sum();
  if total_weight == 0 {
    return Some(rng.random_range(0..weights.len()));
  }

  let mut target = rng.random_range(0..total_weight);
  for (index, w) in weights.iter().enumerate() {
    if target < w.weight {
      return Some(index);
    }
    target -= w.weight;
  }

  // Unreachable while target < total_weight
  Some(weights.len() - 1)
}
