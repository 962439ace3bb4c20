//! Views: the different ways of choosing the next card from a set.
//!
//! Every view answers the same question, "which card next?", through
//! [`View::next`]. A view owns nothing but its seeded random generator, so
//! repeated calls on the same set diverge while two views built from the same
//! seed replay identically.

pub mod baseline;
pub mod bayesian;
pub mod weighted;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{Card, Set};
use crate::srs::difficulty::DifficultyParams;

pub use baseline::{RandomView, UnseenView};
pub use bayesian::{BayesianParams, BayesianView};
pub use weighted::{DifficultyWeightedView, WeightedParams};

/// Which selection strategy a view uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
  Random,
  Unseen,
  DifficultyWeighted,
  Bayesian,
}

impl ViewKind {
  pub const ALL: [ViewKind; 4] = [
    ViewKind::Random,
    ViewKind::Unseen,
    ViewKind::DifficultyWeighted,
    ViewKind::Bayesian,
  ];

  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "random" => Some(Self::Random),
      "unseen" => Some(Self::Unseen),
      "difficulty" | "difficulty_weighted" | "weighted" => Some(Self::DifficultyWeighted),
      "bayesian" => Some(Self::Bayesian),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Random => "random",
      Self::Unseen => "unseen",
      Self::DifficultyWeighted => "difficulty",
      Self::Bayesian => "bayesian",
    }
  }
}

/// Tuning shared by the views that model difficulty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewParams {
  pub difficulty: DifficultyParams,
  pub weighted: WeightedParams,
  pub bayesian: BayesianParams,
}

/// Selection errors. Running out of cards is not an error; views return
/// `Ok(None)` for that.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectError {
  /// A category's posterior could not be sampled
  InvalidBeta { path: String, alpha: f64, beta: f64 },
  UnknownView(String),
}

impl std::fmt::Display for SelectError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      SelectError::InvalidBeta { path, alpha, beta } => write!(
        f,
        "Cannot sample Beta({}, {}) for category '{}'",
        alpha, beta, path
      ),
      SelectError::UnknownView(name) => write!(f, "Unknown view '{}'", name),
    }
  }
}

impl SelectError {
  /// Returns a user-facing error message without internal parameters.
  pub fn user_message(&self) -> &'static str {
    match self {
      SelectError::InvalidBeta { .. } => "Failed to model category difficulty",
      SelectError::UnknownView(_) => "Unknown view",
    }
  }
}

impl std::error::Error for SelectError {}

pub type SelectResult<'a> = Result<Option<&'a Card>, SelectError>;

/// A card selection strategy with its own random generator.
#[derive(Debug, Clone)]
pub enum View {
  Random(RandomView),
  Unseen(UnseenView),
  DifficultyWeighted(DifficultyWeightedView),
  Bayesian(BayesianView),
}

impl View {
  pub fn new(kind: ViewKind, params: &ViewParams, seed: u64) -> Self {
    match kind {
      ViewKind::Random => View::Random(RandomView::new(seed)),
      ViewKind::Unseen => View::Unseen(UnseenView::new(seed)),
      ViewKind::DifficultyWeighted => View::DifficultyWeighted(DifficultyWeightedView::new(
        params.difficulty,
        params.weighted,
        seed,
      )),
      ViewKind::Bayesian => View::Bayesian(BayesianView::new(params.bayesian, seed)),
    }
  }

  pub fn kind(&self) -> ViewKind {
    match self {
      View::Random(_) => ViewKind::Random,
      View::Unseen(_) => ViewKind::Unseen,
      View::DifficultyWeighted(_) => ViewKind::DifficultyWeighted,
      View::Bayesian(_) => ViewKind::Bayesian,
    }
  }

  /// Choose the next card for `user` (everyone if empty), or None if the set
  /// has nothing left to offer.
  pub fn next<'a>(&mut self, set: &'a Set, user: &str) -> SelectResult<'a> {
    let card = match self {
      View::Random(view) => Ok(view.next(set)),
      View::Unseen(view) => Ok(view.next(set, user)),
      View::DifficultyWeighted(view) => Ok(view.next(set, user)),
      View::Bayesian(view) => view.next(set, user),
    }?;

    match card {
      Some(card) => tracing::debug!(view = self.kind().as_str(), card = %card.path, "Selected card"),
      None => tracing::debug!(view = self.kind().as_str(), cards = set.len(), "No card available"),
    }

    Ok(card)
  }
}

/// Named views available to callers. Each view is seeded independently from
/// the registry seed.
#[derive(Debug, Clone)]
pub struct ViewRegistry {
  views: BTreeMap<ViewKind, View>,
}

impl ViewRegistry {
  pub fn with_seed(params: &ViewParams, seed: u64) -> Self {
    let mut seeder = ChaCha8Rng::seed_from_u64(seed);
    let views = ViewKind::ALL
      .iter()
      .map(|kind| {
        let view_seed: u64 = seeder.random();
        (*kind, View::new(*kind, params, view_seed))
      })
      .collect();
    Self { views }
  }

  /// Registry seeded from the OS. The seed is logged so a run can be replayed.
  pub fn from_entropy(params: &ViewParams) -> Self {
    let seed: u64 = rand::random();
    tracing::debug!(seed, "Seeding views from entropy");
    Self::with_seed(params, seed)
  }

  pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
    self.views.keys().map(|kind| kind.as_str())
  }

  pub fn get_mut(&mut self, name: &str) -> Result<&mut View, SelectError> {
    ViewKind::from_str(name)
      .and_then(|kind| self.views.get_mut(&kind))
      .ok_or_else(|| SelectError::UnknownView(name.to_string()))
  }

  /// Run the view called `name` against `set`.
  pub fn next<'a>(&mut self, name: &str, set: &'a Set, user: &str) -> SelectResult<'a> {
    self.get_mut(name)?.next(set, user)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Outcome;
  use crate::testing::card_with;

  fn practice_set() -> Set {
    Set::new(vec![
      card_with("a1", "algebra/ex1/a1", &[(Outcome::Perfect, 3, "alice")]),
      card_with("a2", "algebra/ex1/a2", &[]),
      card_with("a3", "algebra/ex2/a3", &[(Outcome::Major, 2, "alice")]),
      card_with("a4", "algebra/ex2/a4", &[]),
      card_with("g1", "geometry/g1", &[(Outcome::Minor, 1, "alice")]),
      card_with("g2", "geometry/g2", &[]),
      card_with("c1", "calculus/limits/c1", &[]),
    ])
  }

  #[test]
  fn test_view_kind_from_str() {
    assert_eq!(ViewKind::from_str("random"), Some(ViewKind::Random));
    assert_eq!(ViewKind::from_str("unseen"), Some(ViewKind::Unseen));
    assert_eq!(ViewKind::from_str("difficulty"), Some(ViewKind::DifficultyWeighted));
    assert_eq!(ViewKind::from_str("weighted"), Some(ViewKind::DifficultyWeighted));
    assert_eq!(ViewKind::from_str("bayesian"), Some(ViewKind::Bayesian));
    assert_eq!(ViewKind::from_str("Bayesian"), None);
  }

  #[test]
  fn test_view_kind_as_str_roundtrip() {
    for kind in ViewKind::ALL {
      assert_eq!(ViewKind::from_str(kind.as_str()), Some(kind));
    }
  }

  #[test]
  fn test_registry_names() {
    let registry = ViewRegistry::with_seed(&ViewParams::default(), 1);
    let names: Vec<&str> = registry.names().collect();
    assert_eq!(names, vec!["random", "unseen", "difficulty", "bayesian"]);
  }

  #[test]
  fn test_registry_unknown_view() {
    let mut registry = ViewRegistry::with_seed(&ViewParams::default(), 1);
    let set = practice_set();
    assert_eq!(
      registry.next("spaced", &set, "alice"),
      Err(SelectError::UnknownView("spaced".to_string()))
    );
  }

  #[test]
  fn test_every_view_handles_empty_set() {
    let mut registry = ViewRegistry::with_seed(&ViewParams::default(), 5);
    let empty = Set::default();
    for kind in ViewKind::ALL {
      assert_eq!(registry.next(kind.as_str(), &empty, "alice"), Ok(None));
    }
  }

  #[test]
  fn test_same_seed_same_sequence() {
    let set = practice_set();
    for kind in ViewKind::ALL {
      let mut first = View::new(kind, &ViewParams::default(), 1234);
      let mut second = View::new(kind, &ViewParams::default(), 1234);

      for _ in 0..25 {
        let a = first.next(&set, "alice").unwrap().map(|c| c.id.clone());
        let b = second.next(&set, "alice").unwrap().map(|c| c.id.clone());
        assert_eq!(a, b, "{} diverged", kind.as_str());
      }
    }
  }

  #[test]
  fn test_same_registry_seed_same_sequence() {
    let set = practice_set();
    let mut first = ViewRegistry::with_seed(&ViewParams::default(), 77);
    let mut second = ViewRegistry::with_seed(&ViewParams::default(), 77);

    for name in ["bayesian", "difficulty", "random", "bayesian", "unseen"] {
      let a = first.next(name, &set, "alice").unwrap().map(|c| c.id.clone());
      let b = second.next(name, &set, "alice").unwrap().map(|c| c.id.clone());
      assert_eq!(a, b);
    }
  }

  #[test]
  fn test_repeated_calls_diverge() {
    let set = practice_set();
    let mut view = View::new(ViewKind::Random, &ViewParams::default(), 9);
    let picks: std::collections::HashSet<String> = (0..50)
      .filter_map(|_| view.next(&set, "").unwrap().map(|c| c.id.clone()))
      .collect();
    assert!(picks.len() > 1);
  }

  #[test]
  fn test_select_error_display() {
    let err = SelectError::InvalidBeta {
      path: "algebra".to_string(),
      alpha: 0.0,
      beta: 4.0,
    };
    assert_eq!(err.to_string(), "Cannot sample Beta(0, 4) for category 'algebra'");
    assert_eq!(err.user_message(), "Failed to model category difficulty");
  }
}
