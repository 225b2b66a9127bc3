//! Retransmission backoff policies.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::Tick;

/// How far a node defers its next attempt after a collision.
///
/// The stage is the node's consecutive collision count, clamped to
/// [`max_stage`](Self::max_stage). A delay is drawn uniformly from
/// `(0, bound(stage)]` and rounded up to whole slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffAlgorithm {
    /// Binary exponential backoff: bound `2^stage`, stage at most 10.
    Exponential,
    /// Linear backoff: bound `stage`, stage at most 1024.
    Linear,
}

impl BackoffAlgorithm {
    /// Returns the largest stage this policy uses.
    pub fn max_stage(self) -> u32 {
        match self {
            BackoffAlgorithm::Exponential => 10,
            BackoffAlgorithm::Linear => 1024,
        }
    }

    /// Returns the upper bound of the delay drawn after `collisions` collisions.
    pub fn bound(self, collisions: u32) -> Tick {
        let stage = collisions.min(self.max_stage());
        match self {
            BackoffAlgorithm::Exponential => 1 << stage,
            BackoffAlgorithm::Linear => Tick::from(stage),
        }
    }

    /// Draws a delay, in slots, after `collisions` consecutive collisions.
    ///
    /// The result lies in `1..=bound(collisions)`. A raw draw of exactly zero
    /// is lifted to one slot so the node never reschedules into a slot that
    /// has already been resolved.
    pub fn draw<R: Rng + ?Sized>(self, collisions: u32, rng: &mut R) -> Tick {
        assert!(collisions > 0, "backoff drawn before any collision");
        let bound = self.bound(collisions) as f64;
        let delay = rng.gen_range(0.0..bound).ceil() as Tick;
        delay.max(1)
    }

    /// Returns the lowercase name used on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            BackoffAlgorithm::Exponential => "exponential",
            BackoffAlgorithm::Linear => "linear",
        }
    }
}

impl fmt::Display for BackoffAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown backoff algorithm name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown backoff algorithm '{0}' (expected 'exponential' or 'linear')")]
pub struct ParseBackoffError(pub String);

impl FromStr for BackoffAlgorithm {
    type Err = ParseBackoffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exponential" => Ok(BackoffAlgorithm::Exponential),
            "linear" => Ok(BackoffAlgorithm::Linear),
            other => Err(ParseBackoffError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_bounds_clamp_at_max_stage() {
        assert_eq!(BackoffAlgorithm::Exponential.bound(1), 2);
        assert_eq!(BackoffAlgorithm::Exponential.bound(10), 1024);
        assert_eq!(BackoffAlgorithm::Exponential.bound(25), 1024);
        assert_eq!(BackoffAlgorithm::Linear.bound(3), 3);
        assert_eq!(BackoffAlgorithm::Linear.bound(5000), 1024);
    }

    #[test]
    fn test_draws_stay_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for algorithm in [BackoffAlgorithm::Exponential, BackoffAlgorithm::Linear] {
            for collisions in 1..40 {
                let bound = algorithm.bound(collisions);
                for _ in 0..50 {
                    let delay = algorithm.draw(collisions, &mut rng);
                    assert!((1..=bound).contains(&delay), "{algorithm} stage {collisions}: {delay}");
                }
            }
        }
    }

    #[test]
    fn test_first_linear_backoff_is_one_slot() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(BackoffAlgorithm::Linear.draw(1, &mut rng), 1);
        }
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("linear".parse::<BackoffAlgorithm>(), Ok(BackoffAlgorithm::Linear));
        assert_eq!(
            "exponential".parse::<BackoffAlgorithm>().map(|a| a.to_string()),
            Ok("exponential".to_string())
        );
        let err = "quadratic".parse::<BackoffAlgorithm>().unwrap_err();
        assert!(err.to_string().contains("quadratic"));
    }
}
