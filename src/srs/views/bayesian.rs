//! Thompson-sampling view.
//!
//! Each category gets a Beta posterior over its perfect-answer rate:
//! `Beta(prior_alpha + perfect, prior_beta + minor + major)`. Every attempt
//! draws one sample per category and takes the smallest, i.e. the category
//! that currently looks hardest. Categories with nothing left to answer are
//! blacklisted for the rest of the call.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{SelectError, SelectResult};
use crate::domain::Set;
use crate::srs::beta::{beta_mean, sample_beta};
use crate::srs::card_selector::{pick_uniform, unanswered_cards};
use crate::srs::trie::{ProbabilityNode, ProbabilityTrie};

/// Pseudo-counts added to every posterior. The default is mildly pessimistic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BayesianParams {
  pub prior_alpha: f64,
  pub prior_beta: f64,
}

impl Default for BayesianParams {
  fn default() -> Self {
    Self {
      prior_alpha: 2.0,
      prior_beta: 4.0,
    }
  }
}

impl BayesianParams {
  /// Posterior (alpha, beta) for a category's counts.
  pub fn posterior(&self, node: &ProbabilityNode) -> (f64, f64) {
    (
      self.prior_alpha + node.perfect as f64,
      self.prior_beta + node.failures() as f64,
    )
  }
}

#[derive(Debug, Clone)]
pub struct BayesianView {
  params: BayesianParams,
  rng: ChaCha8Rng,
}

impl BayesianView {
  pub fn new(params: BayesianParams, seed: u64) -> Self {
    Self {
      params,
      rng: ChaCha8Rng::seed_from_u64(seed),
    }
  }

  pub fn next<'a>(&mut self, set: &'a Set, user: &str) -> SelectResult<'a> {
    self.select(set, user, |path| tracing::trace!(path, "Trying category"))
  }

  /// Thompson selection, reporting each category tried to `on_try` in order.
  pub(crate) fn select<'a>(
    &mut self,
    set: &'a Set,
    user: &str,
    mut on_try: impl FnMut(&str),
  ) -> SelectResult<'a> {
    let trie = ProbabilityTrie::build(set, user);
    let mut blacklist: HashSet<&str> = HashSet::new();

    tracing::debug!(categories = trie.len(), "Thompson sampling over categories");

    loop {
      let Some(path) = self.hardest_sample(&trie, &blacklist)? else {
        tracing::debug!(exhausted = blacklist.len(), "Every category is exhausted");
        return Ok(None);
      };
      on_try(path);

      let pool = unanswered_cards(set, path, user);
      if pool.is_empty() {
        tracing::debug!(path, "Blacklisting exhausted category");
        blacklist.insert(path);
        continue;
      }

      return Ok(pick_uniform(&mut self.rng, &pool));
    }
  }

  /// Draw one posterior sample per open category and return the category
  /// with the smallest sample.
  fn hardest_sample<'t>(
    &mut self,
    trie: &'t ProbabilityTrie,
    blacklist: &HashSet<&str>,
  ) -> Result<Option<&'t str>, SelectError> {
    let mut hardest: Option<(&str, f64)> = None;

    for (path, node) in trie.iter() {
      if blacklist.contains(path) {
        continue;
      }

      let (alpha, beta) = self.params.posterior(node);
      let sample = sample_beta(&mut self.rng, alpha, beta).ok_or_else(|| SelectError::InvalidBeta {
        path: path.to_string(),
        alpha,
        beta,
      })?;

      if hardest.is_none_or(|(_, lowest)| sample < lowest) {
        hardest = Some((path, sample));
      }
    }

    Ok(hardest.map(|(path, _)| path))
  }

  pub fn difficulties(&self, set: &Set, user: &str) -> Vec<(String, f64)> {
    difficulties(set, user, &self.params)
  }
}

/// Posterior mean perfect-answer rate per category, lowest first, ties
/// broken by path.
pub fn difficulties(set: &Set, user: &str, params: &BayesianParams) -> Vec<(String, f64)> {
  let trie = ProbabilityTrie::build(set, user);
  let mut means: Vec<(String, f64)> = trie
    .iter()
    .map(|(path, node)| {
      let (alpha, beta) = params.posterior(node);
      (path.to_string(), beta_mean(alpha, beta))
    })
    .collect();
  means.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
  means
}
