use crate::error::BattleError;
use crate::sim::battle::BattleContext;
use crate::sim::mega;
use crate::sim::Side;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Choice {
    /// Index into the combatant's move slots.
    Move(usize),
    /// Mega evolve before the round's moves, then use this slot.
    Mega(usize),
    Pass,
}

impl Choice {
    pub fn slot(self) -> Option<usize> {
        match self {
            Choice::Move(idx) | Choice::Mega(idx) => Some(idx),
            Choice::Pass => None,
        }
    }
}

/// Picks an action for one side each round.
pub trait ActionSelector {
    fn choose(&mut self, ctx: &BattleContext, side: Side) -> Choice;

    /// Called when a choice was illegal; the selector is asked again afterwards.
    fn rejected(&mut self, _choice: Choice, _reason: &BattleError) {}
}

/// Uniform pick among moves that still have PP. Mega evolves whenever it can.
pub struct RandomSelector {
    rng: SmallRng,
}

impl RandomSelector {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl ActionSelector for RandomSelector {
    fn choose(&mut self, ctx: &BattleContext, side: Side) -> Choice {
        let combatant = ctx.combatant(side);
        let usable = combatant.usable_moves();
        let Some(idx) = usable.choose(&mut self.rng).copied() else {
            return Choice::Pass;
        };
        if mega::can_mega_evolve(combatant) {
            Choice::Mega(idx)
        } else {
            Choice::Move(idx)
        }
    }
}

pub struct FirstUsable;

impl ActionSelector for FirstUsable {
    fn choose(&mut self, ctx: &BattleContext, side: Side) -> Choice {
        ctx.combatant(side)
            .usable_moves()
            .first()
            .map_or(Choice::Pass, |idx| Choice::Move(*idx))
    }
}

/// Replays a fixed list of choices, then repeats the fallback.
#[derive(Debug, Clone)]
pub struct ScriptedSelector {
    queue: VecDeque<Choice>,
    fallback: Choice,
    rejections: Vec<(Choice, BattleError)>,
}

impl ScriptedSelector {
    pub fn new(choices: impl IntoIterator<Item = Choice>) -> Self {
        Self {
            queue: choices.into_iter().collect(),
            fallback: Choice::Move(0),
            rejections: Vec::new(),
        }
    }

    pub fn always(choice: Choice) -> Self {
        Self::new([]).with_fallback(choice)
    }

    pub fn with_fallback(mut self, choice: Choice) -> Self {
        self.fallback = choice;
        self
    }

    pub fn rejections(&self) -> &[(Choice, BattleError)] {
        &self.rejections
    }
}

impl ActionSelector for ScriptedSelector {
    fn choose(&mut self, _ctx: &BattleContext, _side: Side) -> Choice {
        self.queue.pop_front().unwrap_or(self.fallback)
    }

    fn rejected(&mut self, choice: Choice, reason: &BattleError) {
        self.rejections.push((choice, reason.clone()));
    }
}
