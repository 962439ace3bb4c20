//! Application configuration.
//!
//! Values resolve with priority: config.toml > environment (.env) > default.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::domain::parse_duration;
use crate::filters::{self, Filter};
use crate::srs::{ViewKind, ViewParams, ViewRegistry};

// ==================== Defaults ====================

/// Config file looked up when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Card collection used when neither config nor environment names one
pub const DEFAULT_CARDS_PATH: &str = "data/cards.json";

/// View used when a request doesn't name one
pub const DEFAULT_VIEW: &str = "bayesian";

/// Name of the built-in set containing every card
pub const ALL_SET: &str = "all";

/// Date format for set date bounds, e.g. `2021-02-16 10:18`
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

// ==================== Config Structure ====================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cards_path: Option<String>,
    pub engine: EngineConfig,
    pub sets: BTreeMap<String, ConfigSet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fixed seed for reproducible selection; entropy when absent
    pub seed: Option<u64>,
    pub default_view: String,
    #[serde(flatten)]
    pub params: ViewParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            default_view: DEFAULT_VIEW.to_string(),
            params: ViewParams::default(),
        }
    }
}

/// A named set definition. Every listed criterion must hold for a card to be
/// included; `paths` match if any prefix matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigSet {
    pub name: String,
    pub description: String,
    pub paths: Vec<String>,
    pub tags: Vec<String>,
    pub before_date: Option<String>,
    pub after_date: Option<String>,
    pub before_duration: Option<String>,
    pub after_duration: Option<String>,
}

impl ConfigSet {
    /// The built-in set containing every card.
    pub fn all() -> Self {
        Self {
            name: "All".to_string(),
            description: "This set contains all cards added to the program.".to_string(),
            ..Self::default()
        }
    }

    /// Filters implementing this set's criteria, with durations measured back from `now`.
    pub fn filters(&self, now: DateTime<Utc>) -> Result<Vec<Filter>, ConfigError> {
        let mut list = Vec::new();

        if !self.paths.is_empty() {
            list.push(filters::paths(self.paths.clone()));
        }
        if !self.tags.is_empty() {
            list.push(filters::tags(self.tags.clone()));
        }
        if let Some(raw) = &self.before_date {
            list.push(filters::before_date(parse_date("before_date", raw)?));
        }
        if let Some(raw) = &self.after_date {
            list.push(filters::after_date(parse_date("after_date", raw)?));
        }
        if let Some(raw) = &self.before_duration {
            let age = parse_duration(raw).map_err(|e| invalid("before_duration", e))?;
            list.push(filters::before_duration(age, now));
        }
        if let Some(raw) = &self.after_duration {
            let age = parse_duration(raw).map_err(|e| invalid("after_duration", e))?;
            list.push(filters::after_duration(age, now));
        }

        Ok(list)
    }
}

fn parse_date(field: &str, raw: &str) -> Result<DateTime<Utc>, ConfigError> {
    NaiveDateTime::parse_from_str(raw, DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| invalid(field, format!("{:?} is not a '{}' date: {}", raw, DATE_FORMAT, e)))
}

fn invalid(field: &str, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidValue(field.to_string(), err.to_string())
}

// ==================== Loading ====================

/// Load configuration from `path`, falling back to defaults if the file
/// doesn't exist. Environment variables fill anything the file leaves unset.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let mut config = match std::fs::read_to_string(path) {
        Ok(contents) => {
            tracing::info!("Using config from {}", path.display());
            toml::from_str::<Config>(&contents)
                .map_err(|e| ConfigError::ParseError(path.display().to_string(), e.to_string()))?
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("No config at {}, using defaults", path.display());
            Config::default()
        }
        Err(e) => return Err(ConfigError::IoError(path.display().to_string(), e.to_string())),
    };

    config.apply_env(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Fill unset values from the environment.
    ///
    /// - `SERGEANT_CARDS`: card collection path
    /// - `SERGEANT_SEED`: selection seed
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if self.cards_path.is_none() {
            if let Some(path) = lookup("SERGEANT_CARDS") {
                tracing::info!("Using cards from SERGEANT_CARDS env: {}", path);
                self.cards_path = Some(path);
            }
        }

        if self.engine.seed.is_none() {
            if let Some(raw) = lookup("SERGEANT_SEED") {
                let seed = raw.trim().parse::<u64>().map_err(|e| invalid("SERGEANT_SEED", e))?;
                self.engine.seed = Some(seed);
            }
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let params = &self.engine.params;

        check_unit("difficulty.base_probability", params.difficulty.base_probability)?;
        check_unit("difficulty.damping_factor", params.difficulty.damping_factor)?;
        check_unit("weighted.top_percent", params.weighted.top_percent)?;
        check_finite("difficulty.confidence_midpoint", params.difficulty.confidence_midpoint)?;
        check_finite("difficulty.confidence_slope", params.difficulty.confidence_slope)?;
        check_finite("weighted.power", params.weighted.power)?;
        check_positive("bayesian.prior_alpha", params.bayesian.prior_alpha)?;
        check_positive("bayesian.prior_beta", params.bayesian.prior_beta)?;

        if ViewKind::from_str(&self.engine.default_view).is_none() {
            return Err(invalid(
                "engine.default_view",
                format!("unknown view '{}'", self.engine.default_view),
            ));
        }

        Ok(())
    }

    pub fn cards_path(&self) -> PathBuf {
        PathBuf::from(self.cards_path.as_deref().unwrap_or(DEFAULT_CARDS_PATH))
    }

    /// Look up a set by name. `all` exists even if not configured.
    pub fn set(&self, name: &str) -> Option<ConfigSet> {
        match self.sets.get(name) {
            Some(set) => Some(set.clone()),
            None if name == ALL_SET => Some(ConfigSet::all()),
            None => None,
        }
    }

    pub fn set_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sets.keys().cloned().collect();
        if !self.sets.contains_key(ALL_SET) {
            names.insert(0, ALL_SET.to_string());
        }
        names
    }

    /// View registry seeded from the configured seed, or from entropy.
    pub fn registry(&self) -> ViewRegistry {
        match self.engine.seed {
            Some(seed) => ViewRegistry::with_seed(&self.engine.params, seed),
            None => ViewRegistry::from_entropy(&self.engine.params),
        }
    }
}

fn check_unit(field: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, format!("{} is outside [0, 1]", value)))
    }
}

fn check_positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{} must be greater than 0", value)))
    }
}

fn check_finite(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, format!("{} is not a finite number", value)))
    }
}

// ==================== Errors ====================

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String, String),
    ParseError(String, String),
    InvalidValue(String, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, err) => write!(f, "IO error reading {}: {}", path, err),
            ConfigError::ParseError(path, err) => write!(f, "Parse error in {}: {}", path, err),
            ConfigError::InvalidValue(field, err) => write!(f, "Invalid value for {}: {}", field, err),
        }
    }
}

impl ConfigError {
    /// Returns a user-facing error message without exposing filesystem paths.
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::IoError(_, _) => "Failed to read config file",
            ConfigError::ParseError(_, _) => "Failed to parse config file",
            ConfigError::InvalidValue(_, _) => "Invalid config value",
        }
    }
}

impl std::error::Error for ConfigError {}
