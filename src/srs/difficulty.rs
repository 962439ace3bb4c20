//! Smoothed difficulty per category.
//!
//! A category's difficulty is its modeled probability of a perfect answer.
//! Local evidence (`perfect / total`) is blended with the parent's difficulty
//! using a logistic confidence weight, so sparse categories lean on their
//! ancestors and well-practised ones stand on their own evidence.

use serde::{Deserialize, Serialize};

use super::trie::{ProbabilityNode, ProbabilityTrie};

/// Tuning for difficulty propagation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyParams {
  /// Prior assumed one level above the top-level categories
  pub base_probability: f64,
  /// Discount applied to the inherited prior of a category with no completions
  pub damping_factor: f64,
  /// Completion count at which local evidence and prior weigh equally
  pub confidence_midpoint: f64,
  /// Steepness of the confidence curve
  pub confidence_slope: f64,
}

impl Default for DifficultyParams {
  fn default() -> Self {
    Self {
      base_probability: 0.5,
      damping_factor: 0.6,
      confidence_midpoint: 6.0,
      confidence_slope: 1.0 / 3.0,
    }
  }
}

impl DifficultyParams {
  /// Weight given to local evidence after `total` completions: near 0 for a
  /// handful of completions, 0.5 at the midpoint, approaching 1 beyond it.
  pub fn confidence(&self, total: u64) -> f64 {
    let exponent = self.confidence_slope * (self.confidence_midpoint - total as f64);
    1.0 / (1.0 + exponent.exp())
  }

  /// Difficulty of `node` given the difficulty of its parent (`general`).
  pub fn node_difficulty(&self, node: &ProbabilityNode, general: f64) -> f64 {
    let total = node.total();
    if total == 0 {
      return general * self.damping_factor;
    }

    let sample = node.perfect as f64 / total as f64;
    let confidence = self.confidence(total);
    sample * confidence + general * (1.0 - confidence)
  }
}

/// Fill in `difficulty` for every node, parents before children.
pub fn propagate(trie: &mut ProbabilityTrie, params: &DifficultyParams) {
  for path in trie.breadth_first() {
    let general = trie
      .parent(&path)
      .map(|parent| parent.difficulty)
      .unwrap_or(params.base_probability);

    if let Some(node) = trie.get_mut(&path) {
      node.difficulty = params.node_difficulty(node, general);
    }
  }
}
