//! A collection of cards handed to a view in one selection call.

use serde::Serialize;
use std::collections::BTreeMap;

use super::card::{Card, Outcome};
use crate::filters::Filter;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Set {
  pub cards: Vec<Card>,
}

/// Practice activity for one calendar day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeatmapDay {
  pub day: String,
  /// Total time spent, in whole seconds
  pub seconds: u64,
  pub perfect: u64,
  pub minor: u64,
  pub major: u64,
}

impl Set {
  pub fn new(cards: Vec<Card>) -> Self {
    Self { cards }
  }

  pub fn len(&self) -> usize {
    self.cards.len()
  }

  pub fn is_empty(&self) -> bool {
    self.cards.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Card> {
    self.cards.iter()
  }

  /// Subset of cards matching every filter.
  pub fn filter(&self, filters: &[Filter]) -> Set {
    let cards = self
      .cards
      .iter()
      .filter(|card| filters.iter().all(|filter| filter(*card)))
      .cloned()
      .collect();
    Set { cards }
  }

  /// Per-day completion counts and time spent by `user` (everyone if empty),
  /// sorted by day.
  pub fn heatmap(&self, user: &str) -> Vec<HeatmapDay> {
    let mut days: BTreeMap<String, HeatmapDay> = BTreeMap::new();

    for card in &self.cards {
      for outcome in Outcome::ALL {
        for completion in card.completions(outcome).iter().filter(|c| c.is_by(user)) {
          let day = completion.date.format("%Y-%m-%d").to_string();
          let entry = days.entry(day.clone()).or_insert_with(|| HeatmapDay {
            day,
            ..HeatmapDay::default()
          });

          entry.seconds += completion.duration.as_secs();
          match outcome {
            Outcome::Perfect => entry.perfect += 1,
            Outcome::Minor => entry.minor += 1,
            Outcome::Major => entry.major += 1,
          }
        }
      }
    }

    days.into_values().collect()
  }
}

impl FromIterator<Card> for Set {
  fn from_iter<I: IntoIterator<Item = Card>>(iter: I) -> Self {
    Set {
      cards: iter.into_iter().collect(),
    }
  }
}
