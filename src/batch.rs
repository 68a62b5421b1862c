use crate::config::BattleConfig;
use crate::error::Result;
use crate::sim::ai::RandomSelector;
use crate::sim::battle::{Battle, BattleOutcome};
use crate::sim::combatant::Combatant;
use crate::sim::rng::SeededRng;
use crate::sim::Side;
use crate::types::TypeChart;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Tally {
    pub a_wins: u64,
    pub b_wins: u64,
    pub draws: u64,
}

impl Tally {
    pub fn record(&mut self, outcome: BattleOutcome) {
        match outcome {
            BattleOutcome::Winner(Side::A) => self.a_wins += 1,
            BattleOutcome::Winner(Side::B) => self.b_wins += 1,
            BattleOutcome::Draw => self.draws += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.a_wins + self.b_wins + self.draws
    }

    /// Side A's win rate, counting draws as half.
    pub fn win_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.a_wins as f64 + 0.5 * self.draws as f64) / total as f64
    }
}

/// Plays one battle with random selectors, all randomness derived from `seed`.
pub fn simulate_one(
    a: &Combatant,
    b: &Combatant,
    chart: &TypeChart,
    config: &BattleConfig,
    seed: u64,
) -> Result<BattleOutcome> {
    let mut battle = Battle::new(a.clone(), b.clone(), chart, config.clone())?;
    let mut rng = SeededRng::new(seed);
    let mut select_a = RandomSelector::new(seed ^ 0xA);
    let mut select_b = RandomSelector::new(seed ^ 0xB);
    battle.run(&mut select_a, &mut select_b, &mut rng)
}

/// Runs `battles` independent battles in parallel, seeded from `config.seed`.
pub fn simulate_many(
    a: &Combatant,
    b: &Combatant,
    chart: &TypeChart,
    config: &BattleConfig,
    battles: usize,
) -> Result<Tally> {
    let mut seeder = SmallRng::seed_from_u64(config.seed);
    let seeds: Vec<u64> = (0..battles).map(|_| seeder.gen()).collect();
    let outcomes = seeds
        .par_iter()
        .map(|seed| simulate_one(a, b, chart, config, *seed))
        .collect::<Result<Vec<_>>>()?;
    let mut tally = Tally::default();
    for outcome in outcomes {
        tally.record(outcome);
    }
    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::moves::{Move, MoveCategory};
    use crate::sim::stats::StatBlock;
    use crate::types::Type;

    fn mon(name: &str, attack: u32) -> Combatant {
        let stats = StatBlock {
            hp: 150,
            attack,
            defense: 100,
            sp_attack: 100,
            sp_defense: 100,
            speed: 100,
        };
        let moves = vec![Move::new("Tackle", Type::Normal, MoveCategory::Physical, 40).with_pp(40)];
        Combatant::new(name, vec![Type::Normal], 50, stats, moves).unwrap()
    }

    #[test]
    fn same_seed_gives_same_tally() {
        let chart = TypeChart::standard();
        let config = BattleConfig {
            seed: 7,
            ..BattleConfig::default()
        };
        let a = mon("A", 120);
        let b = mon("B", 100);
        let first = simulate_many(&a, &b, &chart, &config, 16).unwrap();
        let second = simulate_many(&a, &b, &chart, &config, 16).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.total(), 16);
    }

    #[test]
    fn win_rate_counts_draws_as_half() {
        let tally = Tally {
            a_wins: 2,
            b_wins: 1,
            draws: 1,
        };
        assert_eq!(tally.win_rate(), 0.625);
        assert_eq!(Tally::default().win_rate(), 0.0);
    }
}
