use crate::error::Result;
use crate::sim::combatant::Combatant;
use crate::sim::rng::BattleRng;
use crate::sim::stats::{effective_stat, Stat};
use crate::types::Type;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::trace;

/// A non-volatile status to inflict; counters are drawn on infliction.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Burn,
    Freeze,
    Paralysis,
    Poison,
    BadPoison,
    Sleep,
}

impl StatusKind {
    pub fn code(self) -> &'static str {
        match self {
            StatusKind::Burn => "brn",
            StatusKind::Freeze => "frz",
            StatusKind::Paralysis => "par",
            StatusKind::Poison => "psn",
            StatusKind::BadPoison => "tox",
            StatusKind::Sleep => "slp",
        }
    }

    fn immune_types(self) -> &'static [Type] {
        match self {
            StatusKind::Burn => &[Type::Fire],
            StatusKind::Freeze => &[Type::Ice],
            StatusKind::Paralysis => &[Type::Electric],
            StatusKind::Poison | StatusKind::BadPoison => &[Type::Poison, Type::Steel],
            StatusKind::Sleep => &[],
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum NonVolatile {
    #[default]
    Healthy,
    Burned,
    Frozen,
    Paralyzed,
    Poisoned,
    BadlyPoisoned { counter: u32 },
    Asleep { counter: u8 },
}

impl NonVolatile {
    pub fn kind(&self) -> Option<StatusKind> {
        match self {
            NonVolatile::Healthy => None,
            NonVolatile::Burned => Some(StatusKind::Burn),
            NonVolatile::Frozen => Some(StatusKind::Freeze),
            NonVolatile::Paralyzed => Some(StatusKind::Paralysis),
            NonVolatile::Poisoned => Some(StatusKind::Poison),
            NonVolatile::BadlyPoisoned { .. } => Some(StatusKind::BadPoison),
            NonVolatile::Asleep { .. } => Some(StatusKind::Sleep),
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, NonVolatile::Healthy)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Volatile {
    Confused,
    Flinched,
    Trapped,
    Cursed,
    LeechSeeded,
    Attracted,
    Taunted,
}

pub const TAUNT_TURNS: u8 = 3;

/// Volatile flags with their counters.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Volatiles {
    entries: BTreeMap<Volatile, u8>,
}

impl Volatiles {
    pub fn has(&self, kind: Volatile) -> bool {
        self.entries.contains_key(&kind)
    }

    pub fn counter(&self, kind: Volatile) -> Option<u8> {
        self.entries.get(&kind).copied()
    }

    pub fn insert(&mut self, kind: Volatile, counter: u8) {
        self.entries.insert(kind, counter);
    }

    pub fn remove(&mut self, kind: Volatile) -> bool {
        self.entries.remove(&kind).is_some()
    }

    fn counter_mut(&mut self, kind: Volatile) -> Option<&mut u8> {
        self.entries.get_mut(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Volatile, u8)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, *v))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InflictOutcome {
    Inflicted,
    AlreadyAffected,
    Immune,
}

/// Applies a non-volatile status. Any existing status makes this a no-op.
pub fn inflict(
    target: &mut Combatant,
    kind: StatusKind,
    rng: &mut dyn BattleRng,
) -> Result<InflictOutcome> {
    if !target.status.is_healthy() {
        return Ok(InflictOutcome::AlreadyAffected);
    }
    if kind.immune_types().iter().any(|t| target.has_type(*t)) {
        return Ok(InflictOutcome::Immune);
    }
    target.status = match kind {
        StatusKind::Burn => NonVolatile::Burned,
        StatusKind::Freeze => NonVolatile::Frozen,
        StatusKind::Paralysis => NonVolatile::Paralyzed,
        StatusKind::Poison => NonVolatile::Poisoned,
        StatusKind::BadPoison => NonVolatile::BadlyPoisoned { counter: 1 },
        StatusKind::Sleep => NonVolatile::Asleep {
            counter: rng.range(1, 3)? as u8,
        },
    };
    trace!(target = %target.name, ?kind, "status inflicted");
    Ok(InflictOutcome::Inflicted)
}

pub fn inflict_volatile(
    target: &mut Combatant,
    kind: Volatile,
    rng: &mut dyn BattleRng,
) -> Result<InflictOutcome> {
    if target.volatiles.has(kind) {
        return Ok(InflictOutcome::AlreadyAffected);
    }
    if kind == Volatile::LeechSeeded && target.has_type(Type::Grass) {
        return Ok(InflictOutcome::Immune);
    }
    let counter = match kind {
        Volatile::Confused => rng.range(1, 4)? as u8,
        Volatile::Taunted => TAUNT_TURNS,
        _ => 0,
    };
    target.volatiles.insert(kind, counter);
    Ok(InflictOutcome::Inflicted)
}

pub fn cure(target: &mut Combatant) -> Option<StatusKind> {
    let previous = target.status.kind();
    target.status = NonVolatile::Healthy;
    previous
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Prevented {
    Asleep,
    Frozen,
    Paralyzed,
    Confusion { self_damage: u32 },
    Flinched,
    Attracted,
    /// Status move chosen while taunted.
    Taunted,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GateNote {
    WokeUp,
    Thawed,
    SnappedOutOfConfusion,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Gate {
    pub notes: Vec<GateNote>,
    pub prevented: Option<Prevented>,
}

impl Gate {
    pub fn proceeds(&self) -> bool {
        self.prevented.is_none()
    }
}

/// Runs the action gates in order: non-volatile, confusion, flinch, attraction.
pub fn before_action(actor: &mut Combatant, rng: &mut dyn BattleRng) -> Result<Gate> {
    let mut gate = Gate {
        notes: Vec::new(),
        prevented: None,
    };

    match actor.status {
        NonVolatile::Asleep { counter } if counter > 0 => {
            actor.status = NonVolatile::Asleep { counter: counter - 1 };
            gate.prevented = Some(Prevented::Asleep);
            return Ok(gate);
        }
        NonVolatile::Asleep { .. } => {
            actor.status = NonVolatile::Healthy;
            gate.notes.push(GateNote::WokeUp);
        }
        NonVolatile::Frozen => {
            if rng.one_in(5)? {
                actor.status = NonVolatile::Healthy;
                gate.notes.push(GateNote::Thawed);
            } else {
                gate.prevented = Some(Prevented::Frozen);
                return Ok(gate);
            }
        }
        NonVolatile::Paralyzed => {
            if rng.one_in(4)? {
                gate.prevented = Some(Prevented::Paralyzed);
                return Ok(gate);
            }
        }
        _ => {}
    }

    if let Some(counter) = actor.volatiles.counter_mut(Volatile::Confused) {
        if *counter == 0 {
            actor.volatiles.remove(Volatile::Confused);
            gate.notes.push(GateNote::SnappedOutOfConfusion);
        } else {
            *counter -= 1;
            if rng.one_in(2)? {
                let self_damage = effective_stat(actor, Stat::Attack) / 10;
                actor.take_damage(self_damage);
                gate.prevented = Some(Prevented::Confusion { self_damage });
                return Ok(gate);
            }
        }
    }

    if actor.volatiles.has(Volatile::Flinched) {
        gate.prevented = Some(Prevented::Flinched);
        return Ok(gate);
    }

    if actor.volatiles.has(Volatile::Attracted) && rng.one_in(2)? {
        gate.prevented = Some(Prevented::Attracted);
    }
    Ok(gate)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResidualSource {
    Poison,
    BadPoison,
    Burn,
    Curse,
}

/// End-of-turn status damage. Badly poisoned counters advance after each tick.
pub fn residual(combatant: &mut Combatant) -> Vec<(ResidualSource, u32)> {
    let max_hp = combatant.max_hp();
    let mut ticks = Vec::new();
    match combatant.status {
        NonVolatile::Poisoned => ticks.push((ResidualSource::Poison, max_hp / 8)),
        NonVolatile::Burned => ticks.push((ResidualSource::Burn, max_hp / 16)),
        NonVolatile::BadlyPoisoned { counter } => {
            ticks.push((ResidualSource::BadPoison, max_hp / 16 * counter));
            combatant.status = NonVolatile::BadlyPoisoned {
                counter: counter.saturating_add(1),
            };
        }
        _ => {}
    }
    if combatant.volatiles.has(Volatile::Cursed) {
        ticks.push((ResidualSource::Curse, max_hp / 4));
    }
    for (_, amount) in ticks.iter_mut() {
        *amount = combatant.take_damage(*amount);
    }
    ticks
}

/// Moves HP from the seeded combatant to its opponent. Returns (drained, healed).
pub fn leech_seed(seeded: &mut Combatant, receiver: &mut Combatant) -> Option<(u32, u32)> {
    if !seeded.volatiles.has(Volatile::LeechSeeded) || seeded.is_fainted() {
        return None;
    }
    let drained = seeded.take_damage(seeded.max_hp() / 8);
    let healed = receiver.heal(drained);
    Some((drained, healed))
}

/// Clears flinch and ticks taunt. Returns volatiles that ended.
pub fn end_of_turn_volatiles(combatant: &mut Combatant) -> Vec<Volatile> {
    let mut ended = Vec::new();
    if combatant.volatiles.remove(Volatile::Flinched) {
        ended.push(Volatile::Flinched);
    }
    if let Some(turns) = combatant.volatiles.counter_mut(Volatile::Taunted) {
        *turns = turns.saturating_sub(1);
        if *turns == 0 {
            combatant.volatiles.remove(Volatile::Taunted);
            ended.push(Volatile::Taunted);
        }
    }
    ended
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::combatant::Combatant;
    use crate::sim::moves::{Move, MoveCategory};
    use crate::sim::rng::ScriptedRng;
    use crate::sim::stats::StatBlock;

    fn make_combatant(types: Vec<Type>, hp: u32) -> Combatant {
        let stats = StatBlock {
            hp,
            attack: 100,
            defense: 100,
            sp_attack: 100,
            sp_defense: 100,
            speed: 100,
        };
        let tackle = Move::new("Tackle", Type::Normal, MoveCategory::Physical, 40);
        Combatant::new("Testmon", types, 50, stats, vec![tackle]).unwrap()
    }

    #[test]
    fn burn_on_poisoned_target_is_a_no_op() {
        let mut mon = make_combatant(vec![Type::Normal], 160);
        let mut rng = ScriptedRng::new([]);
        let poison = inflict(&mut mon, StatusKind::Poison, &mut rng).unwrap();
        assert_eq!(poison, InflictOutcome::Inflicted);
        let burn = inflict(&mut mon, StatusKind::Burn, &mut rng).unwrap();
        assert_eq!(burn, InflictOutcome::AlreadyAffected);
        assert_eq!(mon.status, NonVolatile::Poisoned);
    }

    #[test]
    fn type_immunities_block_status() {
        let mut mon = make_combatant(vec![Type::Electric], 160);
        let mut rng = ScriptedRng::new([]);
        let outcome = inflict(&mut mon, StatusKind::Paralysis, &mut rng).unwrap();
        assert_eq!(outcome, InflictOutcome::Immune);
        assert!(mon.status.is_healthy());
        let mut grass = make_combatant(vec![Type::Grass], 160);
        assert_eq!(
            inflict_volatile(&mut grass, Volatile::LeechSeeded, &mut rng).unwrap(),
            InflictOutcome::Immune
        );
    }

    #[test]
    fn badly_poisoned_damage_scales_with_turns() {
        let mut mon = make_combatant(vec![Type::Normal], 320);
        let mut rng = ScriptedRng::new([]);
        inflict(&mut mon, StatusKind::BadPoison, &mut rng).unwrap();
        for k in 1..=4u32 {
            let ticks = residual(&mut mon);
            assert_eq!(ticks, vec![(ResidualSource::BadPoison, 320 / 16 * k)]);
        }
        assert_eq!(mon.current_hp, 320 - 20 * (1 + 2 + 3 + 4));
    }

    #[test]
    fn sleep_skips_counter_turns_then_wakes() {
        let mut mon = make_combatant(vec![Type::Normal], 160);
        let mut rng = ScriptedRng::new([2]);
        inflict(&mut mon, StatusKind::Sleep, &mut rng).unwrap();
        assert_eq!(mon.status, NonVolatile::Asleep { counter: 2 });
        assert_eq!(before_action(&mut mon, &mut rng).unwrap().prevented, Some(Prevented::Asleep));
        assert_eq!(before_action(&mut mon, &mut rng).unwrap().prevented, Some(Prevented::Asleep));
        let gate = before_action(&mut mon, &mut rng).unwrap();
        assert!(gate.proceeds());
        assert_eq!(gate.notes, vec![GateNote::WokeUp]);
        assert!(mon.status.is_healthy());
    }

    #[test]
    fn frozen_thaws_on_one_in_five_and_acts() {
        let mut mon = make_combatant(vec![Type::Normal], 160);
        mon.status = NonVolatile::Frozen;
        let mut rng = ScriptedRng::new([1]);
        let gate = before_action(&mut mon, &mut rng).unwrap();
        assert!(gate.proceeds());
        assert_eq!(gate.notes, vec![GateNote::Thawed]);
        assert!(mon.status.is_healthy());
    }

    #[test]
    fn frozen_stays_frozen_otherwise() {
        let mut mon = make_combatant(vec![Type::Normal], 160);
        mon.status = NonVolatile::Frozen;
        let mut rng = ScriptedRng::new([3, 5]);
        for _ in 0..2 {
            let gate = before_action(&mut mon, &mut rng).unwrap();
            assert_eq!(gate.prevented, Some(Prevented::Frozen));
            assert!(gate.notes.is_empty());
        }
        assert_eq!(mon.status, NonVolatile::Frozen);
    }

    #[test]
    fn paralysis_prevents_on_one_in_four() {
        let mut mon = make_combatant(vec![Type::Normal], 160);
        mon.status = NonVolatile::Paralyzed;
        let mut rng = ScriptedRng::new([1, 2]);
        let gate = before_action(&mut mon, &mut rng).unwrap();
        assert_eq!(gate.prevented, Some(Prevented::Paralyzed));
        assert!(before_action(&mut mon, &mut rng).unwrap().proceeds());
    }

    #[test]
    fn confusion_self_hit_uses_attack_over_ten() {
        let mut mon = make_combatant(vec![Type::Normal], 160);
        let mut rng = ScriptedRng::new([2, 1]);
        inflict_volatile(&mut mon, Volatile::Confused, &mut rng).unwrap();
        let gate = before_action(&mut mon, &mut rng).unwrap();
        assert_eq!(gate.prevented, Some(Prevented::Confusion { self_damage: 10 }));
        assert_eq!(mon.current_hp, 150);
        assert_eq!(mon.volatiles.counter(Volatile::Confused), Some(1));
    }

    #[test]
    fn confusion_clears_when_counter_is_spent() {
        let mut mon = make_combatant(vec![Type::Normal], 160);
        mon.volatiles.insert(Volatile::Confused, 0);
        let mut rng = ScriptedRng::new([]);
        let gate = before_action(&mut mon, &mut rng).unwrap();
        assert!(gate.proceeds());
        assert_eq!(gate.notes, vec![GateNote::SnappedOutOfConfusion]);
        assert!(!mon.volatiles.has(Volatile::Confused));
    }

    #[test]
    fn flinch_prevents_and_clears_at_end_of_turn() {
        let mut mon = make_combatant(vec![Type::Normal], 160);
        mon.volatiles.insert(Volatile::Flinched, 0);
        let mut rng = ScriptedRng::new([]);
        assert_eq!(before_action(&mut mon, &mut rng).unwrap().prevented, Some(Prevented::Flinched));
        assert_eq!(end_of_turn_volatiles(&mut mon), vec![Volatile::Flinched]);
        assert!(before_action(&mut mon, &mut rng).unwrap().proceeds());
    }

    #[test]
    fn leech_seed_conserves_hp() {
        let mut seeded = make_combatant(vec![Type::Normal], 160);
        let mut receiver = make_combatant(vec![Type::Normal], 200);
        receiver.current_hp = 100;
        seeded.volatiles.insert(Volatile::LeechSeeded, 0);
        let before = seeded.current_hp + receiver.current_hp;
        let (drained, healed) = leech_seed(&mut seeded, &mut receiver).unwrap();
        assert_eq!(drained, 20);
        assert_eq!(healed, 20);
        assert_eq!(seeded.current_hp + receiver.current_hp, before);
    }

    #[test]
    fn leech_seed_heal_is_capped_at_max_hp() {
        let mut seeded = make_combatant(vec![Type::Normal], 160);
        let mut receiver = make_combatant(vec![Type::Normal], 200);
        receiver.current_hp = 195;
        seeded.volatiles.insert(Volatile::LeechSeeded, 0);
        let (drained, healed) = leech_seed(&mut seeded, &mut receiver).unwrap();
        assert_eq!((drained, healed), (20, 5));
        assert_eq!(receiver.current_hp, 200);
    }

    #[test]
    fn taunt_wears_off_after_three_turns() {
        let mut mon = make_combatant(vec![Type::Normal], 160);
        let mut rng = ScriptedRng::new([]);
        inflict_volatile(&mut mon, Volatile::Taunted, &mut rng).unwrap();
        assert!(end_of_turn_volatiles(&mut mon).is_empty());
        assert!(end_of_turn_volatiles(&mut mon).is_empty());
        assert_eq!(end_of_turn_volatiles(&mut mon), vec![Volatile::Taunted]);
    }
}
