//! Per-category outcome counts keyed by category path.
//!
//! Every card contributes its (user-filtered) counts to each prefix of its
//! category path: `maths/core/ex1a/q1` feeds `maths`, `maths/core` and
//! `maths/core/ex1a`. The card's own path never gets a node.
//!
//! Tries are built fresh for every selection call and never cached, since
//! completion history can change between calls.

use std::collections::BTreeMap;

use crate::domain::{Outcome, Set};

/// Aggregated counts for one category path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbabilityNode {
  pub perfect: u64,
  pub minor: u64,
  pub major: u64,
  /// Modeled probability of a perfect answer, filled in by
  /// [`propagate`](super::difficulty::propagate)
  pub difficulty: f64,
}

impl ProbabilityNode {
  pub fn total(&self) -> u64 {
    self.perfect + self.minor + self.major
  }

  /// Completions that were not perfect.
  pub fn failures(&self) -> u64 {
    self.minor + self.major
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbabilityTrie {
  nodes: BTreeMap<String, ProbabilityNode>,
}

impl ProbabilityTrie {
  /// Aggregate the completions of every card in `set` made by `user`
  /// (all users if empty).
  pub fn build(set: &Set, user: &str) -> Self {
    let mut nodes: BTreeMap<String, ProbabilityNode> = BTreeMap::new();

    for card in set.iter() {
      let Some(category) = card.category_path() else {
        continue;
      };

      let perfect = card.user_count(Outcome::Perfect, user);
      let minor = card.user_count(Outcome::Minor, user);
      let major = card.user_count(Outcome::Major, user);

      for prefix in category_prefixes(category) {
        let node = nodes.entry(prefix.to_string()).or_default();
        node.perfect += perfect;
        node.minor += minor;
        node.major += major;
      }
    }

    Self { nodes }
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub fn get(&self, path: &str) -> Option<&ProbabilityNode> {
    self.nodes.get(path)
  }

  pub(crate) fn get_mut(&mut self, path: &str) -> Option<&mut ProbabilityNode> {
    self.nodes.get_mut(path)
  }

  /// Nodes in path order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &ProbabilityNode)> {
    self.nodes.iter().map(|(path, node)| (path.as_str(), node))
  }

  /// The node one level above `path`, if it is in the trie.
  pub fn parent(&self, path: &str) -> Option<&ProbabilityNode> {
    parent_path(path).and_then(|parent| self.nodes.get(parent))
  }

  /// Paths ordered shallowest first, then by path. Every parent comes
  /// before all of its children.
  pub fn breadth_first(&self) -> Vec<String> {
    let mut paths: Vec<&String> = self.nodes.keys().collect();
    paths.sort_by(|a, b| depth(a).cmp(&depth(b)).then_with(|| a.cmp(b)));
    paths.into_iter().cloned().collect()
  }
}

/// Every non-empty prefix of `category` ending on a segment boundary,
/// shortest first, including `category` itself.
pub fn category_prefixes(category: &str) -> impl Iterator<Item = &str> {
  category
    .match_indices('/')
    .map(move |(index, _)| &category[..index])
    .chain(std::iter::once(category))
    .filter(|prefix| !prefix.is_empty())
}

pub fn parent_path(path: &str) -> Option<&str> {
  path
    .rsplit_once('/')
    .map(|(parent, _)| parent)
    .filter(|parent| !parent.is_empty())
}

fn depth(path: &str) -> usize {
  path.matches('/').count()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Card;
  use crate::testing::card_with;

  fn sample_set() -> Set {
    Set::new(vec![
      card_with(
        "q1",
        "maths/core/ex1a/q1",
        &[(Outcome::Perfect, 2, "alice"), (Outcome::Major, 1, "bob")],
      ),
      card_with("q2", "maths/core/ex1b/q2", &[(Outcome::Minor, 1, "alice")]),
      card_with("q3", "maths/stats/q3", &[(Outcome::Major, 2, "alice")]),
      card_with("q4", "physics/q4", &[]),
    ])
  }

  #[test]
  fn test_category_prefixes() {
    let prefixes: Vec<&str> = category_prefixes("maths/core/ex1a").collect();
    assert_eq!(prefixes, vec!["maths", "maths/core", "maths/core/ex1a"]);

    let single: Vec<&str> = category_prefixes("maths").collect();
    assert_eq!(single, vec!["maths"]);
  }

  #[test]
  fn test_category_prefixes_skips_empty_leading_segment() {
    let prefixes: Vec<&str> = category_prefixes("/maths").collect();
    assert_eq!(prefixes, vec!["/maths"]);
  }

  #[test]
  fn test_parent_path() {
    assert_eq!(parent_path("maths/core/ex1a"), Some("maths/core"));
    assert_eq!(parent_path("maths"), None);
  }

  #[test]
  fn test_build_creates_node_per_category_prefix() {
    let trie = ProbabilityTrie::build(&sample_set(), "");
    let paths: Vec<&str> = trie.iter().map(|(path, _)| path).collect();

    assert_eq!(
      paths,
      vec![
        "maths",
        "maths/core",
        "maths/core/ex1a",
        "maths/core/ex1b",
        "maths/stats",
        "physics",
      ]
    );
    assert!(trie.get("maths/core/ex1a/q1").is_none());
  }

  #[test]
  fn test_build_sums_counts_up_the_tree() {
    let trie = ProbabilityTrie::build(&sample_set(), "");

    let maths = trie.get("maths").unwrap();
    assert_eq!((maths.perfect, maths.minor, maths.major), (2, 1, 3));

    let core = trie.get("maths/core").unwrap();
    assert_eq!((core.perfect, core.minor, core.major), (2, 1, 1));

    assert_eq!(trie.get("physics").unwrap().total(), 0);
  }

  #[test]
  fn test_build_filters_by_user() {
    let trie = ProbabilityTrie::build(&sample_set(), "bob");

    assert_eq!(trie.len(), 6);
    let maths = trie.get("maths").unwrap();
    assert_eq!((maths.perfect, maths.minor, maths.major), (0, 0, 1));
    assert_eq!(trie.get("maths/stats").unwrap().total(), 0);
  }

  #[test]
  fn test_build_is_independent_of_card_order() {
    let set = sample_set();
    let mut reversed = set.clone();
    reversed.cards.reverse();
    let mut rotated = set.clone();
    rotated.cards.rotate_left(2);

    let expected = ProbabilityTrie::build(&set, "alice");
    assert_eq!(ProbabilityTrie::build(&reversed, "alice"), expected);
    assert_eq!(ProbabilityTrie::build(&rotated, "alice"), expected);
  }

  #[test]
  fn test_build_twice_gives_same_counts() {
    let set = sample_set();
    assert_eq!(ProbabilityTrie::build(&set, ""), ProbabilityTrie::build(&set, ""));
  }

  #[test]
  fn test_top_level_cards_contribute_nothing() {
    let set = Set::new(vec![Card::new("a", "q1"), Card::new("b", "")]);
    assert!(ProbabilityTrie::build(&set, "").is_empty());
  }

  #[test]
  fn test_breadth_first_puts_parents_first() {
    let trie = ProbabilityTrie::build(&sample_set(), "");
    let order = trie.breadth_first();

    for (index, path) in order.iter().enumerate() {
      if let Some(parent) = parent_path(path) {
        let parent_index = order.iter().position(|p| p == parent).unwrap();
        assert!(parent_index < index, "{} visited before its parent", path);
      }
    }
    assert_eq!(order[0], "maths");
    assert_eq!(order[1], "physics");
  }
}
