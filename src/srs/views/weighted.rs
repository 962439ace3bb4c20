//! Difficulty-weighted view.
//!
//! Categories are ranked by propagated difficulty (lowest modeled perfect
//! rate first) and only the hardest `top_percent` are kept as the focus
//! window. A weighted draw then picks a category from the window and a
//! uniform draw picks one of its unanswered cards.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::domain::{Card, Set};
use crate::srs::card_selector::{pick_uniform, unanswered_cards, weighted_random_select, PathWeight};
use crate::srs::difficulty::{propagate, DifficultyParams};
use crate::srs::trie::ProbabilityTrie;

/// Weighted draws attempted before restricting the draw to categories that
/// still have unanswered cards
const MAX_DRAWS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightedParams {
  /// Exponent applied to difficulty before ranking
  pub power: f64,
  /// Fraction of ranked categories kept in the focus window
  pub top_percent: f64,
}

impl Default for WeightedParams {
  fn default() -> Self {
    Self {
      power: 2.0,
      top_percent: 0.4,
    }
  }
}

impl WeightedParams {
  /// Number of categories kept out of `len`, rounded up.
  pub fn window_len(&self, len: usize) -> usize {
    let keep = (len as f64 * self.top_percent.clamp(0.0, 1.0)).ceil() as usize;
    keep.min(len)
  }
}

#[derive(Debug, Clone)]
pub struct DifficultyWeightedView {
  difficulty: DifficultyParams,
  params: WeightedParams,
  rng: ChaCha8Rng,
}

impl DifficultyWeightedView {
  pub fn new(difficulty: DifficultyParams, params: WeightedParams, seed: u64) -> Self {
    Self {
      difficulty,
      params,
      rng: ChaCha8Rng::seed_from_u64(seed),
    }
  }

  pub fn next<'a>(&mut self, set: &'a Set, user: &str) -> Option<&'a Card> {
    let trie = propagated_trie(set, user, &self.difficulty);
    let window = focus_window(&trie, &self.params);

    let pools: Vec<Vec<&Card>> = window
      .iter()
      .map(|(path, _)| unanswered_cards(set, path, user))
      .collect();

    tracing::debug!(
      categories = trie.len(),
      window = window.len(),
      open = pools.iter().filter(|pool| !pool.is_empty()).count(),
      "Built difficulty focus window"
    );

    if pools.iter().all(Vec::is_empty) {
      return None;
    }

    // Raw difficulty is the weight, so inside the window the easier
    // categories (higher perfect rate) are drawn more often.
    let weights: Vec<PathWeight> = window
      .iter()
      .map(|(path, difficulty)| PathWeight::from_score(path, *difficulty))
      .collect();

    // A draw landing on an exhausted category is wasted and retried.
    for _ in 0..MAX_DRAWS {
      let index = weighted_random_select(&mut self.rng, &weights)?;
      if let Some(card) = pick_uniform(&mut self.rng, &pools[index]) {
        return Some(card);
      }
    }

    tracing::warn!("Weighted draws kept hitting exhausted categories, restricting to open ones");
    let open: Vec<usize> = (0..pools.len()).filter(|i| !pools[*i].is_empty()).collect();
    let open_weights: Vec<PathWeight> = open.iter().map(|i| weights[*i].clone()).collect();
    let index = open[weighted_random_select(&mut self.rng, &open_weights)?];
    pick_uniform(&mut self.rng, &pools[index])
  }

  pub fn difficulties(&self, set: &Set, user: &str) -> Vec<(String, f64)> {
    difficulties(set, user, &self.difficulty)
  }
}

fn propagated_trie(set: &Set, user: &str, params: &DifficultyParams) -> ProbabilityTrie {
  let mut trie = ProbabilityTrie::build(set, user);
  propagate(&mut trie, params);
  trie
}

/// The hardest categories: ranked by `difficulty ^ power` ascending (ties in
/// path order) and cut to the leading `top_percent`.
pub fn focus_window<'t>(trie: &'t ProbabilityTrie, params: &WeightedParams) -> Vec<(&'t str, f64)> {
  let mut ranked: Vec<(&str, f64)> = trie.iter().map(|(path, node)| (path, node.difficulty)).collect();
  ranked.sort_by(|a, b| a.1.powf(params.power).total_cmp(&b.1.powf(params.power)));
  ranked.truncate(params.window_len(ranked.len()));
  ranked
}

/// Propagated difficulty per category, hardest first, ties broken by path.
pub fn difficulties(set: &Set, user: &str, params: &DifficultyParams) -> Vec<(String, f64)> {
  let trie = propagated_trie(set, user, params);
  let mut scores: Vec<(String, f64)> = trie
    .iter()
    .map(|(path, node)| (path.to_string(), node.difficulty))
    .collect();
  scores.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
  scores
}
