use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How well a card was answered. Ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
  Perfect,
  Minor,
  Major,
}

impl Outcome {
  pub const ALL: [Outcome; 3] = [Outcome::Perfect, Outcome::Minor, Outcome::Major];

  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "perfect" => Some(Self::Perfect),
      "minor" => Some(Self::Minor),
      "major" => Some(Self::Major),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Perfect => "perfect",
      Self::Minor => "minor",
      Self::Major => "major",
    }
  }
}

/// A single attempt at a card: when it happened, how long it took and who did it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
  pub date: DateTime<Utc>,
  #[serde(rename = "time", with = "super::duration::text")]
  pub duration: Duration,
  /// None for legacy completions recorded before users were tracked
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub user: Option<String>,
}

impl Completion {
  pub fn new(date: DateTime<Utc>, duration: Duration, user: Option<String>) -> Self {
    Self { date, duration, user }
  }

  /// True if this completion counts for `user`. An empty user matches everything;
  /// unattributed completions only match the empty user.
  pub fn is_by(&self, user: &str) -> bool {
    user.is_empty() || self.user.as_deref() == Some(user)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Completions {
  #[serde(default)]
  pub perfect: Vec<Completion>,
  #[serde(default)]
  pub minor: Vec<Completion>,
  #[serde(default)]
  pub major: Vec<Completion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
  pub id: String,
  /// `/`-delimited path; the last segment is the card itself, the rest are categories
  pub path: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub date: Option<DateTime<Utc>>,
  #[serde(default)]
  pub tags: Vec<String>,
  #[serde(default)]
  pub notes: String,
  #[serde(default)]
  pub completions: Completions,
}

impl Card {
  pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      path: path.into(),
      date: None,
      tags: Vec::new(),
      notes: String::new(),
      completions: Completions::default(),
    }
  }

  /// The card's category: its path without the final segment.
  /// None for cards that sit at the top level.
  pub fn category_path(&self) -> Option<&str> {
    self
      .path
      .rsplit_once('/')
      .map(|(parent, _)| parent)
      .filter(|parent| !parent.is_empty())
  }

  /// True if the card lives somewhere below `category`.
  pub fn is_under(&self, category: &str) -> bool {
    self
      .path
      .strip_prefix(category)
      .is_some_and(|rest| rest.starts_with('/'))
  }

  pub fn completions(&self, outcome: Outcome) -> &[Completion] {
    match outcome {
      Outcome::Perfect => &self.completions.perfect,
      Outcome::Minor => &self.completions.minor,
      Outcome::Major => &self.completions.major,
    }
  }

  pub fn add_completion(&mut self, outcome: Outcome, completion: Completion) {
    let list = match outcome {
      Outcome::Perfect => &mut self.completions.perfect,
      Outcome::Minor => &mut self.completions.minor,
      Outcome::Major => &mut self.completions.major,
    };
    list.push(completion);
  }

  /// Number of `outcome` completions by `user` (all users if empty).
  pub fn user_count(&self, outcome: Outcome, user: &str) -> u64 {
    self
      .completions(outcome)
      .iter()
      .filter(|completion| completion.is_by(user))
      .count() as u64
  }

  pub fn total_completions(&self) -> u64 {
    Outcome::ALL
      .iter()
      .map(|outcome| self.completions(*outcome).len() as u64)
      .sum()
  }

  pub fn total_completions_by(&self, user: &str) -> u64 {
    Outcome::ALL
      .iter()
      .map(|outcome| self.user_count(*outcome, user))
      .sum()
  }

  /// Cards with no completions by `user` are still open for practice.
  pub fn is_unanswered_by(&self, user: &str) -> bool {
    self.total_completions_by(user) == 0
  }
}
