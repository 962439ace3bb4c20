pub mod beta;
pub mod card_selector;
pub mod difficulty;
pub mod trie;
pub mod views;

pub use difficulty::{propagate, DifficultyParams};
pub use trie::{ProbabilityNode, ProbabilityTrie};
pub use views::{
  BayesianParams, SelectError, View, ViewKind, ViewParams, ViewRegistry, WeightedParams,
};
