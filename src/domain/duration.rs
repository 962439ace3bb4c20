//! Go-style duration text (`1h30m`, `3m47.345s`, `350ms`) used for
//! completion times and relative set filters.

use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Fraction digits kept when parsing; finer digits are below a nanosecond
const MAX_FRACTION_DIGITS: usize = 18;

const UNITS: [(&str, u128); 9] = [
  ("ns", 1),
  ("us", 1_000),
  ("\u{b5}s", 1_000),
  ("\u{3bc}s", 1_000),
  ("ms", 1_000_000),
  ("s", NANOS_PER_SEC),
  ("m", 60 * NANOS_PER_SEC),
  ("h", 3_600 * NANOS_PER_SEC),
  ("d", 86_400 * NANOS_PER_SEC),
];

/// Duration text parsing errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurationParseError {
  Empty,
  InvalidNumber(String),
  MissingUnit(String),
  UnknownUnit(String, String),
}

impl std::fmt::Display for DurationParseError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      DurationParseError::Empty => write!(f, "Duration is empty"),
      DurationParseError::InvalidNumber(input) => write!(f, "Invalid number in duration {:?}", input),
      DurationParseError::MissingUnit(input) => write!(f, "Missing unit at end of duration {:?}", input),
      DurationParseError::UnknownUnit(input, unit) => write!(
        f,
        "Unknown unit {:?} in duration {:?} (expected ns, us, ms, s, m, h or d)",
        unit, input
      ),
    }
  }
}

impl std::error::Error for DurationParseError {}

/// Parse a duration such as `3m47s`, `3m47.345s`, `1.5h`, `350ms` or `2d`.
/// Each number may carry a decimal fraction. A bare `0` is accepted.
pub fn parse_duration(input: &str) -> Result<Duration, DurationParseError> {
  let text = input.trim();
  if text.is_empty() {
    return Err(DurationParseError::Empty);
  }
  if text == "0" {
    return Ok(Duration::ZERO);
  }

  let invalid = || DurationParseError::InvalidNumber(input.to_string());
  let mut total: u128 = 0;
  let mut rest = text;

  while !rest.is_empty() {
    let (whole, after) = split_digits(rest);
    let (fraction, after) = match after.strip_prefix('.') {
      Some(after) => split_digits(after),
      None => ("", after),
    };
    if whole.is_empty() && fraction.is_empty() {
      return Err(invalid());
    }

    let unit_len = after
      .find(|c: char| c.is_ascii_digit() || c == '.')
      .unwrap_or(after.len());
    let (unit, after) = after.split_at(unit_len);
    if unit.is_empty() {
      return Err(DurationParseError::MissingUnit(input.to_string()));
    }

    let scale = UNITS
      .iter()
      .find(|(name, _)| *name == unit)
      .map(|(_, scale)| *scale)
      .ok_or_else(|| DurationParseError::UnknownUnit(input.to_string(), unit.to_string()))?;

    let whole: u128 = if whole.is_empty() {
      0
    } else {
      whole.parse().map_err(|_| invalid())?
    };
    total = total
      .saturating_add(whole.saturating_mul(scale))
      .saturating_add(fraction_nanos(fraction, scale).ok_or_else(invalid)?);
    rest = after;
  }

  Ok(from_nanos(total))
}

fn split_digits(text: &str) -> (&str, &str) {
  let len = text.find(|c: char| !c.is_ascii_digit()).unwrap_or(text.len());
  text.split_at(len)
}

/// Nanoseconds contributed by the digits after the decimal point.
fn fraction_nanos(fraction: &str, scale: u128) -> Option<u128> {
  let digits = &fraction[..fraction.len().min(MAX_FRACTION_DIGITS)];
  if digits.is_empty() {
    return Some(0);
  }
  let value: u128 = digits.parse().ok()?;
  Some(value * scale / 10u128.pow(digits.len() as u32))
}

fn from_nanos(nanos: u128) -> Duration {
  match u64::try_from(nanos / NANOS_PER_SEC) {
    Ok(secs) => Duration::new(secs, (nanos % NANOS_PER_SEC) as u32),
    Err(_) => Duration::MAX,
  }
}

/// Format a duration the way Go prints it: `0s`, `350ms`, `1.5µs`,
/// `3m47.345s`, `1h0m0s`.
pub fn format_duration(duration: &Duration) -> String {
  let nanos = duration.as_nanos();
  if nanos == 0 {
    return "0s".to_string();
  }

  if nanos < NANOS_PER_SEC {
    let (scale, unit) = match nanos {
      0..1_000 => (1, "ns"),
      1_000..1_000_000 => (1_000, "\u{b5}s"),
      _ => (1_000_000, "ms"),
    };
    return format!("{}{}", decimal(nanos, scale), unit);
  }

  let secs = duration.as_secs();
  let (hours, minutes) = (secs / 3_600, (secs % 3_600) / 60);
  let seconds = decimal(
    u128::from(secs % 60) * NANOS_PER_SEC + u128::from(duration.subsec_nanos()),
    NANOS_PER_SEC,
  );

  if hours > 0 {
    format!("{}h{}m{}s", hours, minutes, seconds)
  } else if minutes > 0 {
    format!("{}m{}s", minutes, seconds)
  } else {
    format!("{}s", seconds)
  }
}

/// `value / scale` with the fraction's trailing zeros dropped.
fn decimal(value: u128, scale: u128) -> String {
  let (whole, remainder) = (value / scale, value % scale);
  if remainder == 0 {
    return whole.to_string();
  }
  let width = scale.ilog10() as usize;
  let fraction = format!("{:0width$}", remainder, width = width);
  format!("{}.{}", whole, fraction.trim_end_matches('0'))
}

/// Serde adapter storing a [`Duration`] as duration text.
pub mod text {
  use serde::{Deserialize, Deserializer, Serializer};
  use std::time::Duration;

  pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&super::format_duration(duration))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let raw = String::deserialize(deserializer)?;
    super::parse_duration(&raw).map_err(serde::de::Error::custom)
  }
}
