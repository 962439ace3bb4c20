//! Card collection loading and saving - reads cards from a JSON file and
//! writes recorded completions back to it.
//!
//! The file holds a single object with a `cards` array:
//!
//! ```json
//! { "cards": [ { "id": "...", "path": "maths/algebra/q1", "completions": { ... } } ] }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{Card, Completion, Outcome, Set};
use crate::filters::Filter;

/// Container for cards in a collection file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardCollection {
    #[serde(default)]
    pub cards: Vec<Card>,
}

/// Load cards from a collection file.
pub fn load_cards(path: &Path) -> Result<Vec<Card>, CardLoadError> {
    if !path.exists() {
        return Err(CardLoadError::FileNotFound(path.display().to_string()));
    }

    let content = fs::read_to_string(path)
        .map_err(|e| CardLoadError::IoError(path.display().to_string(), e.to_string()))?;

    let data: CardCollection = serde_json::from_str(&content)
        .map_err(|e| CardLoadError::ParseError(path.display().to_string(), e.to_string()))?;

    warn_duplicate_ids(&data.cards);
    Ok(data.cards)
}

fn warn_duplicate_ids(cards: &[Card]) {
    let mut seen = HashSet::new();
    for card in cards {
        if !seen.insert(card.id.as_str()) {
            tracing::warn!(id = %card.id, "Duplicate card id, completions will go to the first match");
        }
    }
}

/// A card collection tied to the file it was read from.
#[derive(Debug, Clone)]
pub struct CardStore {
    path: PathBuf,
    collection: CardCollection,
}

impl CardStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CardLoadError> {
        let path = path.into();
        let cards = load_cards(&path)?;
        tracing::debug!("Loaded {} cards from {}", cards.len(), path.display());
        Ok(Self {
            path,
            collection: CardCollection { cards },
        })
    }

    /// A store that hasn't been read from disk; `save` creates the file.
    pub fn from_cards(path: impl Into<PathBuf>, cards: Vec<Card>) -> Self {
        Self {
            path: path.into(),
            collection: CardCollection { cards },
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cards(&self) -> &[Card] {
        &self.collection.cards
    }

    /// Every card in the collection.
    pub fn all(&self) -> Set {
        self.collection.cards.iter().cloned().collect()
    }

    /// Cards matching every filter.
    pub fn set(&self, filters: &[Filter]) -> Set {
        self.collection
            .cards
            .iter()
            .filter(|card| filters.iter().all(|filter| filter(*card)))
            .cloned()
            .collect()
    }

    /// Record a completion on the card whose id (or, failing that, path)
    /// equals `key`. Returns the updated card.
    pub fn record_completion(
        &mut self,
        key: &str,
        outcome: Outcome,
        completion: Completion,
    ) -> Result<&Card, CardLoadError> {
        let index = self
            .collection
            .cards
            .iter()
            .position(|card| card.id == key)
            .or_else(|| self.collection.cards.iter().position(|card| card.path == key))
            .ok_or_else(|| CardLoadError::CardNotFound(key.to_string()))?;

        let card = &mut self.collection.cards[index];
        card.add_completion(outcome, completion);
        tracing::info!(card = %card.path, outcome = outcome.as_str(), "Recorded completion");
        Ok(card)
    }

    /// Write the collection back to its file, creating parent directories.
    pub fn save(&self) -> Result<(), CardLoadError> {
        let io_err = |e: std::io::Error| CardLoadError::IoError(self.path.display().to_string(), e.to_string());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(&self.collection)
            .map_err(|e| CardLoadError::ParseError(self.path.display().to_string(), e.to_string()))?;
        fs::write(&self.path, json).map_err(io_err)?;

        tracing::debug!("Saved {} cards to {}", self.collection.cards.len(), self.path.display());
        Ok(())
    }
}

/// Card loading errors.
#[derive(Debug)]
pub enum CardLoadError {
    FileNotFound(String),
    IoError(String, String),
    ParseError(String, String),
    CardNotFound(String),
}

impl std::fmt::Display for CardLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CardLoadError::FileNotFound(path) => write!(f, "Card file not found: {}", path),
            CardLoadError::IoError(path, err) => write!(f, "IO error reading {}: {}", path, err),
            CardLoadError::ParseError(path, err) => write!(f, "Parse error in {}: {}", path, err),
            CardLoadError::CardNotFound(key) => write!(f, "No card with id or path '{}'", key),
        }
    }
}

impl CardLoadError {
    /// Returns a user-facing error message without exposing filesystem paths.
    pub fn user_message(&self) -> &'static str {
        match self {
            CardLoadError::FileNotFound(_) => "Card file not found",
            CardLoadError::IoError(_, _) => "Failed to read card file",
            CardLoadError::ParseError(_, _) => "Failed to parse card file",
            CardLoadError::CardNotFound(_) => "Card not found",
        }
    }
}

impl std::error::Error for CardLoadError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters;
    use crate::testing::completion;
    use std::time::Duration;
    use tempfile::TempDir;

    const COLLECTION: &str = r#"{
        "cards": [
            {
                "id": "q1",
                "path": "algebra/ex1/q1",
                "tags": ["@exam"],
                "completions": {
                    "perfect": [{"date": "2021-02-16T10:18:00Z", "time": "3m47s", "user": "alice"}]
                }
            },
            {"id": "q2", "path": "geometry/q2"}
        ]
    }"#;

    fn write_collection(contents: &str) -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cards.json");
        fs::write(&path, contents).unwrap();
        (temp, path)
    }

    #[test]
    fn test_load_cards() {
        let (_temp, path) = write_collection(COLLECTION);
        let cards = load_cards(&path).unwrap();

        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].path, "algebra/ex1/q1");
        assert_eq!(cards[0].completions.perfect[0].duration, Duration::from_secs(227));
        assert!(cards[1].completions.perfect.is_empty());
        assert!(cards[1].tags.is_empty());
    }

    #[test]
    fn test_load_millisecond_times() {
        let (_temp, path) = write_collection(
            r#"{"cards": [{"id": "q1", "path": "algebra/q1", "completions": {
                "major": [{"date": "2021-02-16T10:18:00Z", "time": "3m47.345s"}],
                "minor": [{"date": "2021-02-16T10:20:00Z", "time": "350ms"}]
            }}]}"#,
        );
        let store = CardStore::open(&path).unwrap();
        let card = &store.cards()[0];
        assert_eq!(card.completions.major[0].duration, Duration::from_millis(227_345));
        assert_eq!(card.completions.minor[0].duration, Duration::from_millis(350));

        store.save().unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains(r#""time": "3m47.345s""#));
        assert!(written.contains(r#""time": "350ms""#));
    }

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = load_cards(&temp.path().join("nonexistent.json"));
        assert!(matches!(result, Err(CardLoadError::FileNotFound(_))));
    }

    #[test]
    fn test_malformed_file() {
        let (_temp, path) = write_collection(r#"{"cards": [{"id": 3}]}"#);
        let err = load_cards(&path).unwrap_err();
        assert!(matches!(err, CardLoadError::ParseError(_, _)));
        assert_eq!(err.user_message(), "Failed to parse card file");
    }

    #[test]
    fn test_store_set_applies_filters() {
        let (_temp, path) = write_collection(COLLECTION);
        let store = CardStore::open(&path).unwrap();

        assert_eq!(store.all().len(), 2);
        let exam = store.set(&[filters::tags(vec!["@exam".to_string()])]);
        assert_eq!(exam.len(), 1);
        assert_eq!(exam.cards[0].id, "q1");
    }

    #[test]
    fn test_record_completion_and_save() {
        let (_temp, path) = write_collection(COLLECTION);
        let mut store = CardStore::open(&path).unwrap();

        let card = store
            .record_completion("q2", Outcome::Minor, completion(Some("bob")))
            .unwrap();
        assert_eq!(card.user_count(Outcome::Minor, "bob"), 1);
        store.save().unwrap();

        let reloaded = CardStore::open(&path).unwrap();
        let q2 = reloaded.cards().iter().find(|c| c.id == "q2").unwrap();
        assert_eq!(q2.completions.minor.len(), 1);
        assert_eq!(q2.completions.minor[0].user.as_deref(), Some("bob"));
        let q1 = reloaded.cards().iter().find(|c| c.id == "q1").unwrap();
        assert_eq!(q1.completions.perfect.len(), 1);
    }

    #[test]
    fn test_record_completion_by_path() {
        let (_temp, path) = write_collection(COLLECTION);
        let mut store = CardStore::open(&path).unwrap();

        store
            .record_completion("algebra/ex1/q1", Outcome::Major, completion(None))
            .unwrap();
        assert_eq!(store.cards()[0].completions.major.len(), 1);
    }

    #[test]
    fn test_record_completion_unknown_card() {
        let mut store = CardStore::from_cards("unused.json", Vec::new());
        let result = store.record_completion("nope", Outcome::Perfect, completion(None));
        assert!(matches!(result, Err(CardLoadError::CardNotFound(_))));
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("dir").join("cards.json");
        let store = CardStore::from_cards(&path, vec![Card::new("a", "algebra/a")]);

        store.save().unwrap();
        assert_eq!(load_cards(&path).unwrap().len(), 1);
    }
}
