//! Card content on disk.
//!
//! A collection is a single JSON file of cards with their recorded
//! completions. [`CardStore`] reads it, hands out filtered [`Set`]s and
//! writes new completions back.
//!
//! [`Set`]: crate::domain::Set

pub mod cards;

pub use cards::{load_cards, CardCollection, CardLoadError, CardStore};
