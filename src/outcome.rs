use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Degrees on the wheel; the game slice spans `[0, probability * WHEEL_DEGREES)`.
pub const WHEEL_DEGREES: f64 = 360.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
pub enum Outcome {
    Study,
    Game,
}

/// A single draw: where the wheel landed and what that means.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinDraw {
    pub landing_angle: f64,
    pub outcome: Outcome,
}

/// Draws independent, biased Study/Game outcomes.
///
/// Every call is its own Bernoulli trial, so over a session of `n` hours the
/// number of Game hours is Binomial(n, p) rather than exactly the requested
/// count. Small sessions can land well away from the requested split.
#[derive(Debug, Clone)]
pub struct OutcomeEngine {
    rng: StdRng,
}

impl OutcomeEngine {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Spin the wheel for a game probability in `[0, 1]`.
    pub fn spin(&mut self, probability_game: f64) -> SpinDraw {
        let landing_angle = self.rng.gen_range(0.0..WHEEL_DEGREES);
        SpinDraw {
            landing_angle,
            outcome: outcome_for_angle(landing_angle, probability_game),
        }
    }

    pub fn resolve(&mut self, probability_game: f64) -> Outcome {
        self.spin(probability_game).outcome
    }
}

impl Default for OutcomeEngine {
    fn default() -> Self {
        Self::new()
    }
}

pub fn outcome_for_angle(landing_angle: f64, probability_game: f64) -> Outcome {
    let threshold = probability_game.clamp(0.0, 1.0) * WHEEL_DEGREES;
    if landing_angle < threshold {
        Outcome::Game
    } else {
        Outcome::Study
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_for_angle_boundaries() {
        assert_eq!(outcome_for_angle(0.0, 0.5), Outcome::Game);
        assert_eq!(outcome_for_angle(179.999, 0.5), Outcome::Game);
        // strictly less than the threshold is Game
        assert_eq!(outcome_for_angle(180.0, 0.5), Outcome::Study);
        assert_eq!(outcome_for_angle(359.9, 0.5), Outcome::Study);
    }

    #[test]
    fn test_zero_probability_never_games() {
        let mut engine = OutcomeEngine::with_seed(7);
        for _ in 0..10_000 {
            assert_eq!(engine.resolve(0.0), Outcome::Study);
        }
    }

    #[test]
    fn test_full_probability_always_games() {
        let mut engine = OutcomeEngine::with_seed(7);
        for _ in 0..10_000 {
            assert_eq!(engine.resolve(1.0), Outcome::Game);
        }
    }

    #[test]
    fn test_empirical_frequency_converges() {
        let mut engine = OutcomeEngine::with_seed(42);
        for &p in &[0.1, 0.25, 0.5, 0.75] {
            let n = 100_000;
            let games = (0..n)
                .filter(|_| engine.resolve(p) == Outcome::Game)
                .count();
            let freq = games as f64 / n as f64;
            assert!((freq - p).abs() < 0.02, "p={} freq={}", p, freq);
        }
    }

    #[test]
    fn test_spin_angle_in_range() {
        let mut engine = OutcomeEngine::with_seed(1);
        for _ in 0..1_000 {
            let draw = engine.spin(0.3);
            assert!(draw.landing_angle >= 0.0 && draw.landing_angle < WHEEL_DEGREES);
            assert_eq!(draw.outcome, outcome_for_angle(draw.landing_angle, 0.3));
        }
    }

    #[test]
    fn test_seeded_engines_repeat() {
        let mut a = OutcomeEngine::with_seed(99);
        let mut b = OutcomeEngine::with_seed(99);
        let left: Vec<Outcome> = (0..50).map(|_| a.resolve(0.4)).collect();
        let right: Vec<Outcome> = (0..50).map(|_| b.resolve(0.4)).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(Outcome::Study.to_string(), "Study");
        assert_eq!(Outcome::Game.to_string(), "Game");
    }
}
