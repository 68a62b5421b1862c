use crate::error::{BattleError, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Source of every random draw in a battle. Draws are inclusive integer ranges.
pub trait BattleRng {
    fn range(&mut self, low: u32, high: u32) -> Result<u32>;

    /// True with probability 1/n.
    fn one_in(&mut self, n: u32) -> Result<bool> {
        Ok(self.range(1, n)? == 1)
    }

    fn percent(&mut self, chance: u8) -> Result<bool> {
        Ok(self.range(1, 100)? <= u32::from(chance))
    }
}

pub struct SeededRng {
    inner: SmallRng,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: SmallRng::seed_from_u64(seed),
        }
    }
}

impl BattleRng for SeededRng {
    fn range(&mut self, low: u32, high: u32) -> Result<u32> {
        if low > high {
            return Err(BattleError::RandomSource(format!(
                "empty range {low}..={high}"
            )));
        }
        Ok(self.inner.gen_range(low..=high))
    }
}

/// Replays scripted values, clamped into each requested range.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRng {
    values: VecDeque<u32>,
    fallback: Option<u32>,
    draws: usize,
}

impl ScriptedRng {
    pub fn new(values: impl IntoIterator<Item = u32>) -> Self {
        Self {
            values: values.into_iter().collect(),
            fallback: None,
            draws: 0,
        }
    }

    pub fn repeating(value: u32) -> Self {
        Self {
            values: VecDeque::new(),
            fallback: Some(value),
            draws: 0,
        }
    }

    /// Scripted values first, then `value` forever.
    pub fn then_repeat(mut self, value: u32) -> Self {
        self.fallback = Some(value);
        self
    }

    pub fn draws(&self) -> usize {
        self.draws
    }
}

impl BattleRng for ScriptedRng {
    fn range(&mut self, low: u32, high: u32) -> Result<u32> {
        if low > high {
            return Err(BattleError::RandomSource(format!(
                "empty range {low}..={high}"
            )));
        }
        let value = match self.values.pop_front().or(self.fallback) {
            Some(v) => v,
            None => {
                return Err(BattleError::RandomSource(format!(
                    "script exhausted after {} draws",
                    self.draws
                )))
            }
        };
        self.draws += 1;
        Ok(value.clamp(low, high))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_draws_are_reproducible() {
        let mut a = SeededRng::new(42);
        let mut b = SeededRng::new(42);
        for _ in 0..50 {
            assert_eq!(a.range(1, 100).unwrap(), b.range(1, 100).unwrap());
        }
    }

    #[test]
    fn seeded_draws_stay_in_range() {
        let mut rng = SeededRng::new(7);
        for _ in 0..500 {
            let v = rng.range(85, 100).unwrap();
            assert!((85..=100).contains(&v));
        }
    }

    #[test]
    fn scripted_values_are_clamped() {
        let mut rng = ScriptedRng::new([0, 500, 3]);
        assert_eq!(rng.range(1, 16).unwrap(), 1);
        assert_eq!(rng.range(85, 100).unwrap(), 100);
        assert_eq!(rng.range(1, 4).unwrap(), 3);
    }

    #[test]
    fn scripted_exhaustion_is_an_error() {
        let mut rng = ScriptedRng::new([1]);
        assert!(rng.range(1, 2).is_ok());
        assert!(matches!(
            rng.range(1, 2),
            Err(BattleError::RandomSource(_))
        ));
    }

    #[test]
    fn then_repeat_falls_back_after_script() {
        let mut rng = ScriptedRng::new([2]).then_repeat(1);
        assert!(!rng.one_in(2).unwrap());
        assert!(rng.one_in(2).unwrap());
        assert!(rng.one_in(16).unwrap());
        assert_eq!(rng.draws(), 3);
    }
}
