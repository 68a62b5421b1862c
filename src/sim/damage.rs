use crate::error::Result;
use crate::sim::combatant::Combatant;
use crate::sim::effects::{EffectBus, EventContext, EventKind, Owner};
use crate::sim::field::{weather_damage_modifier, Field};
use crate::sim::moves::{Move, MoveCategory};
use crate::sim::rng::BattleRng;
use crate::sim::stats::{effective_stat, stage_multiplier, StageStat, Stat};
use crate::sim::Side;
use crate::types::TypeChart;
use tracing::trace;

const STAB: f64 = 1.5;
const CRIT: f64 = 1.5;
const CRIT_ODDS: u32 = 16;
// keeps exact products such as 0.95 * 120 from flooring one short
const FLOOR_SLACK: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub damage: u32,
    pub critical: bool,
    pub modifier: f64,
    pub effectiveness: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DamageOutcome {
    /// Status moves deal no damage and roll nothing here.
    NoDamage,
    Missed,
    Hit(Hit),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Calculation {
    pub outcome: DamageOutcome,
    pub messages: Vec<(Owner, String)>,
}

/// Everything read-only a damage roll looks at.
#[derive(Clone, Copy)]
pub struct DamageInput<'a> {
    pub attacker: Side,
    pub mv: &'a Move,
    pub combatants: &'a [Combatant; 2],
    pub field: &'a Field,
    pub chart: &'a TypeChart,
}

impl<'a> DamageInput<'a> {
    fn attacker(&self) -> &'a Combatant {
        &self.combatants[self.attacker.index()]
    }

    fn defender(&self) -> &'a Combatant {
        &self.combatants[self.attacker.opponent().index()]
    }

    fn event(&self, kind: EventKind) -> EventContext<'a> {
        let defender = self.attacker.opponent();
        EventContext::new(kind, self.attacker, defender, self.combatants, self.field)
            .with_move(self.mv)
    }
}

pub fn compute_base_damage(level: u8, attack: u32, defense: u32, power: u32) -> u32 {
    let level = u64::from(level);
    let mut base = 2 * level / 5 + 2;
    base *= u64::from(power);
    base *= u64::from(attack);
    base /= u64::from(defense.max(1));
    base /= 50;
    (base + 2) as u32
}

/// Accuracy check. Draws one value in [1, 100]; misses when it exceeds effective accuracy.
pub fn roll_accuracy(
    input: &DamageInput<'_>,
    bus: &mut EffectBus,
    rng: &mut dyn BattleRng,
    messages: &mut Vec<(Owner, String)>,
) -> Result<bool> {
    let accuracy = f64::from(input.mv.accuracy)
        * stage_multiplier(input.attacker().stage(StageStat::Accuracy))
        / stage_multiplier(input.defender().stage(StageStat::Evasion));
    let dispatch = bus.dispatch(&input.event(EventKind::ModifyAccuracy).with_value(accuracy));
    messages.extend(dispatch.messages.iter().cloned());
    let accuracy = dispatch.first_value(accuracy);
    let draw = rng.range(1, 100)?;
    trace!(draw, accuracy, "accuracy roll");
    Ok(f64::from(draw) <= accuracy)
}

pub fn calculate(
    input: &DamageInput<'_>,
    bus: &mut EffectBus,
    rng: &mut dyn BattleRng,
) -> Result<Calculation> {
    let mut messages = Vec::new();
    let mv = input.mv;
    if !mv.is_damaging() {
        return Ok(Calculation {
            outcome: DamageOutcome::NoDamage,
            messages,
        });
    }
    if !roll_accuracy(input, bus, rng, &mut messages)? {
        return Ok(Calculation {
            outcome: DamageOutcome::Missed,
            messages,
        });
    }

    let attacker = input.attacker();
    let defender = input.defender();
    let (attack_stat, defense_stat) = match mv.category {
        MoveCategory::Physical => (Stat::Attack, Stat::Defense),
        _ => (Stat::SpAttack, Stat::SpDefense),
    };
    let attack = effective_stat(attacker, attack_stat);
    let defense = effective_stat(defender, defense_stat);

    let power_event = input.event(EventKind::ModifyBasePower).with_value(f64::from(mv.power));
    let power_dispatch = bus.dispatch(&power_event);
    messages.extend(power_dispatch.messages.iter().cloned());
    let power = power_dispatch.first_value(f64::from(mv.power)).max(0.0).floor() as u32;
    let base = compute_base_damage(attacker.level, attack, defense, power);

    let spread = f64::from(rng.range(85, 100)?) / 100.0;
    let stab = if attacker.has_type(mv.move_type) { STAB } else { 1.0 };
    let effectiveness = input.chart.effectiveness(mv.move_type, &defender.types);
    let weather = weather_damage_modifier(input.field.weather, mv.move_type);
    let critical = rng.one_in(CRIT_ODDS)?;
    let crit = if critical { CRIT } else { 1.0 };

    if effectiveness == 0.0 {
        return Ok(Calculation {
            outcome: DamageOutcome::Hit(Hit {
                damage: 0,
                critical: false,
                modifier: 0.0,
                effectiveness,
            }),
            messages,
        });
    }

    let mut modifier = spread * stab * effectiveness * weather * crit;
    let damage_dispatch = bus.dispatch(
        &input
            .event(EventKind::ModifyDamage)
            .with_value(f64::from(base) * modifier)
            .with_hit(effectiveness, critical),
    );
    messages.extend(damage_dispatch.messages.iter().cloned());
    let (multiplier, replaced) = damage_dispatch.damage_adjustment();
    modifier *= multiplier;

    let damage = match replaced {
        Some(value) => value.max(0.0).floor() as u32,
        None => floor_damage(f64::from(base) * modifier, modifier),
    };
    trace!(base, power, attack, defense, modifier, damage, critical, "damage roll");
    Ok(Calculation {
        outcome: DamageOutcome::Hit(Hit {
            damage,
            critical,
            modifier,
            effectiveness,
        }),
        messages,
    })
}

fn floor_damage(raw: f64, modifier: f64) -> u32 {
    if modifier <= 0.0 {
        return 0;
    }
    ((raw + FLOOR_SLACK).floor() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::rng::ScriptedRng;
    use crate::sim::stats::StatBlock;
    use crate::types::Type;

    fn make_pokemon(types: Vec<Type>, level: u8, attack: u32, defense: u32) -> Combatant {
        let stats = StatBlock {
            hp: 300,
            attack,
            defense,
            sp_attack: attack,
            sp_defense: defense,
            speed: 100,
        };
        let mv = Move::new("Strike", Type::Normal, MoveCategory::Physical, 90);
        Combatant::new("Mon", types, level, stats, vec![mv]).unwrap()
    }

    #[test]
    fn base_damage_uses_integer_steps() {
        assert_eq!(compute_base_damage(100, 250, 150, 90), 128);
        assert_eq!(compute_base_damage(50, 100, 100, 40), 19);
    }

    #[test]
    fn neutral_hit_with_full_spread() {
        let combatants = [
            make_pokemon(vec![Type::Fighting], 100, 250, 100),
            make_pokemon(vec![Type::Normal], 100, 100, 150),
        ];
        let mv = Move::new("Strike", Type::Normal, MoveCategory::Physical, 90);
        let field = Field::default();
        let chart = TypeChart::standard();
        let input = DamageInput {
            attacker: Side::A,
            mv: &mv,
            combatants: &combatants,
            field: &field,
            chart: &chart,
        };
        let mut rng = ScriptedRng::new([1, 100, 2]);
        let calc = calculate(&input, &mut EffectBus::new(), &mut rng).unwrap();
        let DamageOutcome::Hit(hit) = calc.outcome else {
            panic!("expected a hit, got {:?}", calc.outcome);
        };
        assert_eq!(hit.damage, 128);
        assert!(!hit.critical);
        assert_eq!(hit.effectiveness, 1.0);
    }

    #[test]
    fn immune_target_takes_exactly_zero() {
        let combatants = [
            make_pokemon(vec![Type::Normal], 50, 100, 100),
            make_pokemon(vec![Type::Ghost], 50, 100, 100),
        ];
        let mv = Move::new("Strike", Type::Normal, MoveCategory::Physical, 90);
        let field = Field::default();
        let chart = TypeChart::standard();
        let input = DamageInput {
            attacker: Side::A,
            mv: &mv,
            combatants: &combatants,
            field: &field,
            chart: &chart,
        };
        let mut rng = ScriptedRng::repeating(1);
        let calc = calculate(&input, &mut EffectBus::new(), &mut rng).unwrap();
        assert!(matches!(calc.outcome, DamageOutcome::Hit(Hit { damage: 0, .. })));
    }

    #[test]
    fn high_draw_misses() {
        let combatants = [
            make_pokemon(vec![Type::Normal], 50, 100, 100),
            make_pokemon(vec![Type::Normal], 50, 100, 100),
        ];
        let mv =
            Move::new("Wild Swing", Type::Normal, MoveCategory::Physical, 90).with_accuracy(70);
        let field = Field::default();
        let chart = TypeChart::standard();
        let input = DamageInput {
            attacker: Side::A,
            mv: &mv,
            combatants: &combatants,
            field: &field,
            chart: &chart,
        };
        let mut rng = ScriptedRng::new([71]);
        let calc = calculate(&input, &mut EffectBus::new(), &mut rng).unwrap();
        assert_eq!(calc.outcome, DamageOutcome::Missed);
    }

    #[test]
    fn minimum_damage_is_one() {
        assert_eq!(floor_damage(0.4, 0.25), 1);
        assert_eq!(floor_damage(0.0, 0.0), 0);
        assert_eq!(floor_damage(108.8, 0.85), 108);
        assert_eq!(floor_damage(113.99999999999, 0.95), 114);
    }
}
