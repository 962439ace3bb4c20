use chrono::Utc;
use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sergeant::config::{self, Config, ALL_SET};
use sergeant::content::CardStore;
use sergeant::domain::{parse_duration, Completion, Outcome, Set};
use sergeant::srs::views::{bayesian, weighted};
use sergeant::srs::ViewKind;

#[derive(Parser)]
#[command(name = "sergeant")]
#[command(about = "Pick the next flashcard to practise from your weakest categories", long_about = None)]
#[command(version)]
struct Cli {
  /// Config file
  #[arg(short, long, global = true, default_value = config::DEFAULT_CONFIG_PATH)]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Print the next card to practise
  Next {
    /// View to select with (defaults to the configured view)
    #[arg(short, long)]
    view: Option<String>,
    #[arg(short, long, default_value = ALL_SET)]
    set: String,
    #[arg(short, long, default_value = "", env = "SERGEANT_USER")]
    user: String,
  },
  /// Record a completion for a card
  Complete {
    #[arg(value_parser = parse_outcome)]
    outcome: Outcome,
    /// Card id or path
    #[arg(long)]
    id: String,
    /// Time spent, e.g. 3m47s
    #[arg(short, long, value_parser = parse_duration, default_value = "0s")]
    time: Duration,
    #[arg(short, long, default_value = "", env = "SERGEANT_USER")]
    user: String,
  },
  /// Print the modeled difficulty of each category
  Difficulties {
    #[arg(short, long, default_value = "bayesian")]
    view: String,
    #[arg(short, long, default_value = ALL_SET)]
    set: String,
    #[arg(short, long, default_value = "", env = "SERGEANT_USER")]
    user: String,
  },
  /// Print completions per day as JSON
  Heatmap {
    #[arg(short, long, default_value = ALL_SET)]
    set: String,
    #[arg(short, long, default_value = "", env = "SERGEANT_USER")]
    user: String,
  },
  /// List the views, paths or sets currently loaded
  Query {
    #[arg(value_parser = ["views", "paths", "sets", "config"])]
    what: String,
  },
}

fn parse_outcome(s: &str) -> Result<Outcome, String> {
  Outcome::from_str(s).ok_or_else(|| format!("expected one of perfect, minor, major; got '{}'", s))
}

fn main() -> ExitCode {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "sergeant=info".into()),
    )
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();

  let cli = Cli::parse();

  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      eprintln!("sergeant: {}", e);
      ExitCode::FAILURE
    }
  }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
  let config = config::load_config(&cli.config)?;

  match cli.command {
    Command::Next { view, set, user } => {
      let store = CardStore::open(config.cards_path())?;
      let cards = load_set(&config, &store, &set)?;
      let view = view.unwrap_or_else(|| config.engine.default_view.clone());

      let mut registry = config.registry();
      match registry.next(&view, &cards, &user)? {
        Some(card) => println!("{}", serde_json::to_string_pretty(card)?),
        None => println!("no card available"),
      }
    }
    Command::Complete { outcome, id, time, user } => {
      let mut store = CardStore::open(config.cards_path())?;
      let user = (!user.is_empty()).then_some(user);
      let card = store.record_completion(&id, outcome, Completion::new(Utc::now(), time, user))?;
      println!("{} {}", outcome.as_str(), card.path);
      store.save()?;
    }
    Command::Difficulties { view, set, user } => {
      let store = CardStore::open(config.cards_path())?;
      let cards = load_set(&config, &store, &set)?;
      let params = &config.engine.params;

      let scores = match ViewKind::from_str(&view) {
        Some(ViewKind::DifficultyWeighted) => weighted::difficulties(&cards, &user, &params.difficulty),
        Some(ViewKind::Bayesian) => bayesian::difficulties(&cards, &user, &params.bayesian),
        _ => return Err(format!("view '{}' does not model difficulty", view).into()),
      };
      for (path, score) in scores {
        println!("{}\t{:.4}", path, score);
      }
    }
    Command::Heatmap { set, user } => {
      let store = CardStore::open(config.cards_path())?;
      let cards = load_set(&config, &store, &set)?;
      println!("{}", serde_json::to_string_pretty(&cards.heatmap(&user))?);
    }
    Command::Query { what } => match what.as_str() {
      "views" => {
        for name in config.registry().names() {
          println!("{}", name);
        }
      }
      "paths" => {
        let store = CardStore::open(config.cards_path())?;
        for card in store.cards() {
          println!("{}", card.path);
        }
      }
      "sets" => {
        for name in config.set_names() {
          println!("{}", name);
        }
      }
      _ => println!("{}", serde_json::to_string_pretty(&config)?),
    },
  }

  Ok(())
}

fn load_set(config: &Config, store: &CardStore, name: &str) -> Result<Set, Box<dyn Error>> {
  let definition = config.set(name).ok_or_else(|| format!("no set named '{}'", name))?;
  let filters = definition.filters(Utc::now())?;
  let cards = store.set(&filters);
  tracing::debug!(set = name, cards = cards.len(), "Loaded set");
  Ok(cards)
}
