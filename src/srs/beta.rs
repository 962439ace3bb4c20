//! Beta distribution sampling for Thompson sampling.
//!
//! Beta(a, b) is drawn as X / (X + Y) with X ~ Gamma(a) and Y ~ Gamma(b),
//! using Marsaglia-Tsang for the gamma draws.

use rand::Rng;

/// Smallest uniform draw fed to `ln`
const EPSILON: f64 = 1e-10;

/// Rejection loop cap for a single gamma draw
const MAX_GAMMA_ITERATIONS: usize = 1000;

/// Mean of Beta(alpha, beta).
pub fn beta_mean(alpha: f64, beta: f64) -> f64 {
  alpha / (alpha + beta)
}

/// One draw from Beta(alpha, beta). Returns None when either parameter is
/// not a finite positive number, or when the gamma draws can't produce a
/// usable ratio (rejection cap reached, X + Y zero or overflowing).
pub fn sample_beta<R: Rng>(rng: &mut R, alpha: f64, beta: f64) -> Option<f64> {
  if !is_valid_shape(alpha) || !is_valid_shape(beta) {
    return None;
  }

  let x = sample_gamma(rng, alpha)?;
  let y = sample_gamma(rng, beta)?;
  let sum = x + y;

  (sum > 0.0 && sum.is_finite()).then(|| x / sum)
}

fn is_valid_shape(shape: f64) -> bool {
  shape.is_finite() && shape > 0.0
}

/// Gamma(shape, 1) draw. `shape` must be positive. None if every
/// rejection round fails.
fn sample_gamma<R: Rng>(rng: &mut R, shape: f64) -> Option<f64> {
  if shape < 1.0 {
    // Gamma(a) = Gamma(a + 1) * U^(1/a)
    let u: f64 = rng.random::<f64>().max(EPSILON);
    return Some(sample_gamma(rng, shape + 1.0)? * u.powf(1.0 / shape));
  }

  let d = shape - 1.0 / 3.0;
  let c = 1.0 / (9.0 * d).sqrt();

  for _ in 0..MAX_GAMMA_ITERATIONS {
    let x = sample_normal(rng);
    let v_term = 1.0 + c * x;
    if v_term <= 0.0 {
      continue;
    }

    let v = v_term.powi(3);
    let u: f64 = rng.random();
    let x2 = x * x;

    if u < 1.0 - 0.0331 * x2 * x2 {
      return Some(d * v);
    }
    if u.max(EPSILON).ln() < 0.5 * x2 + d * (1.0 - v + v.ln()) {
      return Some(d * v);
    }
  }

  tracing::warn!(shape, "Gamma rejection sampling gave up");
  None
}

/// Standard normal draw (Box-Muller).
fn sample_normal<R: Rng>(rng: &mut R) -> f64 {
  let u1: f64 = rng.random::<f64>().max(EPSILON);
  let u2: f64 = rng.random();
  (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
