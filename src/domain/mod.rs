pub mod card;
pub mod duration;
pub mod set;

pub use card::{Card, Completion, Completions, Outcome};
pub use duration::{format_duration, parse_duration, DurationParseError};
pub use set::{HeatmapDay, Set};
