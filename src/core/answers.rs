//! Answer Selector: uniform draw from a fixed pool

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::types::AnswerMode;

/// The classic pool
pub const MYSTICAL_ANSWERS: [&str; 20] = [
    "It is certain",
    "It is decidedly so",
    "Without a doubt",
    "Yes definitely",
    "You may rely on it",
    "As I see it, yes",
    "Most likely",
    "Outlook good",
    "Yes",
    "Signs point to yes",
    "Reply hazy, try again",
    "Ask again later",
    "Better not tell you now",
    "Cannot predict now",
    "Concentrate and ask again",
    "Don't count on it",
    "My reply is no",
    "My sources say no",
    "Outlook not so good",
    "Very doubtful",
];

pub const BINARY_ANSWERS: [&str; 2] = ["Yes", "No"];

/// Pool for a mode
pub fn pool(mode: AnswerMode) -> &'static [&'static str] {
    match mode {
        AnswerMode::Normal => &MYSTICAL_ANSWERS,
        AnswerMode::Binary => &BINARY_ANSWERS,
    }
}

/// Draws answers with a pluggable random source
pub struct AnswerSelector {
    rng: Box<dyn RngCore + Send>,
}

impl std::fmt::Debug for AnswerSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerSelector").finish_non_exhaustive()
    }
}

impl Default for AnswerSelector {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl AnswerSelector {
    /// OS-seeded generator
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic sequence for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: impl RngCore + Send + 'static) -> Self {
        Self { rng: Box::new(rng) }
    }

    /// Index `floor(u * len)` with `u` uniform in [0, 1)
    pub fn select(&mut self, mode: AnswerMode) -> &'static str {
        let pool = pool(mode);
        let u: f64 = self.rng.gen();
        let index = ((u * pool.len() as f64).floor() as usize).min(pool.len() - 1);
        pool[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use std::collections::HashMap;

    #[test]
    fn test_pool_sizes() {
        assert_eq!(pool(AnswerMode::Normal).len(), 20);
        assert_eq!(pool(AnswerMode::Binary), &["Yes", "No"]);
    }

    #[test]
    fn test_binary_only_yes_no() {
        let mut selector = AnswerSelector::seeded(7);
        for _ in 0..200 {
            let a = selector.select(AnswerMode::Binary);
            assert!(a == "Yes" || a == "No", "unexpected {}", a);
        }
    }

    #[test]
    fn test_normal_from_pool() {
        let mut selector = AnswerSelector::seeded(7);
        for _ in 0..200 {
            assert!(MYSTICAL_ANSWERS.contains(&selector.select(AnswerMode::Normal)));
        }
    }

    #[test]
    fn test_same_seed_same_answers() {
        let mut a = AnswerSelector::seeded(42);
        let mut b = AnswerSelector::seeded(42);
        let xs: Vec<_> = (0..20).map(|_| a.select(AnswerMode::Normal)).collect();
        let ys: Vec<_> = (0..20).map(|_| b.select(AnswerMode::Normal)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_roughly_uniform() {
        let mut selector = AnswerSelector::seeded(2024);
        let draws = 20_000;
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for _ in 0..draws {
            *counts.entry(selector.select(AnswerMode::Normal)).or_default() += 1;
        }
        assert_eq!(counts.len(), 20);
        let expected = draws / 20;
        for (answer, n) in counts {
            assert!(
                n > expected * 8 / 10 && n < expected * 12 / 10,
                "{} drawn {} times, expected ~{}",
                answer,
                n,
                expected
            );
        }
    }

    #[test]
    fn test_extreme_rng_values_stay_in_bounds() {
        // all-zero bits → u = 0.0 → first entry
        let mut low = AnswerSelector::with_rng(StepRng::new(0, 0));
        assert_eq!(low.select(AnswerMode::Normal), "It is certain");

        // all-one bits → u just below 1.0 → last entry
        let mut high = AnswerSelector::with_rng(StepRng::new(u64::MAX, 0));
        assert_eq!(high.select(AnswerMode::Normal), "Very doubtful");
        assert_eq!(high.select(AnswerMode::Binary), "No");
    }
}
