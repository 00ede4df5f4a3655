//! Randomized "thinking time" for AI seats.

use std::time::Duration;

use rand::Rng;

use super::error::LobbyError;

/// Triangular distribution over `[min, max]` peaking at `mode`.
///
/// Density rises linearly from `min` to `mode` and falls linearly from `mode`
/// to `max`, so AI seats usually pick around `mode` but occasionally answer
/// fast or dawdle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriangularDelay {
    min: Duration,
    mode: Duration,
    max: Duration,
}

impl TriangularDelay {
    pub fn new(min: Duration, mode: Duration, max: Duration) -> Result<Self, LobbyError> {
        if !(min <= mode && mode <= max) {
            return Err(LobbyError::invalid_argument(
                "AI delay must satisfy min <= mode <= max",
            ));
        }
        Ok(Self { min, mode, max })
    }

    pub fn from_millis(min: u64, mode: u64, max: u64) -> Result<Self, LobbyError> {
        Self::new(
            Duration::from_millis(min),
            Duration::from_millis(mode),
            Duration::from_millis(max),
        )
    }

    /// Inverse CDF: map `u` in `[0, 1)` to a delay, truncated to whole ms.
    pub fn at_quantile(&self, u: f64) -> Duration {
        let min = self.min.as_millis() as f64;
        let mode = self.mode.as_millis() as f64;
        let max = self.max.as_millis() as f64;
        let span = max - min;
        if span <= 0.0 {
            return self.min;
        }

        let u = u.clamp(0.0, 1.0);
        let split = (mode - min) / span;
        let ms = if u < split {
            min + (u * span * (mode - min)).sqrt()
        } else {
            max - ((1.0 - u) * span * (max - mode)).sqrt()
        };
        Duration::from_millis(ms.floor() as u64)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        self.at_quantile(rng.gen::<f64>())
    }
}

impl Default for TriangularDelay {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(3000),
            mode: Duration::from_millis(6500),
            max: Duration::from_millis(15000),
        }
    }
}
