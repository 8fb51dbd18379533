use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Statistical shape of a randomized delay.
///
/// With `weighted` off the value is uniform in `[min, max]`. With it on,
/// values bunch up just above `target` with a long tail whose spread is set
/// by `deviation`, then get clamped into `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayShape {
    pub weighted: bool,
    pub min: u64,
    pub max: u64,
    pub deviation: u64,
    pub target: u64,
}

impl DelayShape {
    fn bounds(&self) -> (u64, u64) {
        if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        }
    }
}

/// Draws a fresh value from `shape` on every call.
pub fn sample<R: Rng + ?Sized>(rng: &mut R, shape: &DelayShape) -> u64 {
    let (min, max) = shape.bounds();
    if !shape.weighted {
        return rng.gen_range(min..=max);
    }

    let g = standard_normal(rng).abs().max(f64::MIN_POSITIVE);
    let value = -g.ln() * shape.deviation as f64 + shape.target as f64;
    // f64 can't hold every u64; clamp again after the cast
    (value.round().clamp(min as f64, max as f64) as u64).clamp(min, max)
}

/// Box-Muller over two uniforms.
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1: f64 = 1.0 - rng.gen::<f64>(); // (0, 1]
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Human reaction pause before confirming an action, shape in milliseconds.
pub fn reaction_delay(shape: &DelayShape) -> Duration {
    Duration::from_millis(sample(&mut rand::thread_rng(), shape))
}

/// Number of ticks to stay idle, shape in tick units.
pub fn wait_ticks(shape: &DelayShape) -> u32 {
    sample(&mut rand::thread_rng(), shape).min(u32::MAX as u64) as u32
}

/// Sleep for exact milliseconds (no jitter).
pub fn sleep_ms(ms: u64) {
    std::thread::sleep(Duration::from_millis(ms));
}
