use super::{Command, EffectHook, EventContext, EventKind, Infliction, Reaction};
use crate::sim::field::{Weather, WEATHER_TURNS};
use crate::sim::normalize_id;
use crate::sim::stats::{StageStat, MAX_STAGE};
use crate::sim::status::{StatusKind, Volatile};
use crate::sim::Side;
use crate::types::Type;
use phf::phf_map;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AbilityKind {
    Intimidate,
    Drought,
    Drizzle,
    Technician,
    SpeedBoost,
    Blaze,
    Torrent,
    Overgrow,
    Static,
    RoughSkin,
    IronBarbs,
    RainDish,
    InnerFocus,
    CompoundEyes,
    /// Any ability without battle behaviour here.
    #[default]
    Inert,
}

static ABILITIES: phf::Map<&'static str, AbilityKind> = phf_map! {
    "intimidate" => AbilityKind::Intimidate,
    "drought" => AbilityKind::Drought,
    "drizzle" => AbilityKind::Drizzle,
    "technician" => AbilityKind::Technician,
    "speedboost" => AbilityKind::SpeedBoost,
    "blaze" => AbilityKind::Blaze,
    "torrent" => AbilityKind::Torrent,
    "overgrow" => AbilityKind::Overgrow,
    "static" => AbilityKind::Static,
    "roughskin" => AbilityKind::RoughSkin,
    "ironbarbs" => AbilityKind::IronBarbs,
    "raindish" => AbilityKind::RainDish,
    "innerfocus" => AbilityKind::InnerFocus,
    "compoundeyes" => AbilityKind::CompoundEyes,
};

impl AbilityKind {
    pub fn from_name(name: &str) -> AbilityKind {
        ABILITIES
            .get(normalize_id(name).as_str())
            .copied()
            .unwrap_or(AbilityKind::Inert)
    }

    /// Abilities that only ever react to nothing are not registered.
    pub fn has_hooks(self) -> bool {
        self != AbilityKind::Inert
    }

    fn pinch_type(self) -> Option<Type> {
        match self {
            AbilityKind::Blaze => Some(Type::Fire),
            AbilityKind::Torrent => Some(Type::Water),
            AbilityKind::Overgrow => Some(Type::Grass),
            _ => None,
        }
    }
}

impl EffectHook for AbilityKind {
    fn name(&self) -> &'static str {
        match self {
            AbilityKind::Intimidate => "Intimidate",
            AbilityKind::Drought => "Drought",
            AbilityKind::Drizzle => "Drizzle",
            AbilityKind::Technician => "Technician",
            AbilityKind::SpeedBoost => "Speed Boost",
            AbilityKind::Blaze => "Blaze",
            AbilityKind::Torrent => "Torrent",
            AbilityKind::Overgrow => "Overgrow",
            AbilityKind::Static => "Static",
            AbilityKind::RoughSkin => "Rough Skin",
            AbilityKind::IronBarbs => "Iron Barbs",
            AbilityKind::RainDish => "Rain Dish",
            AbilityKind::InnerFocus => "Inner Focus",
            AbilityKind::CompoundEyes => "Compound Eyes",
            AbilityKind::Inert => "",
        }
    }

    fn reacts_to(&self, kind: EventKind) -> bool {
        match self {
            AbilityKind::Intimidate | AbilityKind::Drought | AbilityKind::Drizzle => {
                kind == EventKind::SwitchIn
            }
            AbilityKind::Technician => kind == EventKind::ModifyBasePower,
            AbilityKind::SpeedBoost | AbilityKind::RainDish => kind == EventKind::EndOfTurn,
            AbilityKind::Blaze | AbilityKind::Torrent | AbilityKind::Overgrow => {
                kind == EventKind::ModifyDamage
            }
            AbilityKind::Static | AbilityKind::RoughSkin | AbilityKind::IronBarbs => {
                kind == EventKind::AfterMove
            }
            AbilityKind::InnerFocus => kind == EventKind::StatusInflict,
            AbilityKind::CompoundEyes => kind == EventKind::ModifyAccuracy,
            AbilityKind::Inert => false,
        }
    }

    fn react(&mut self, owner: Side, ctx: &EventContext<'_>) -> Option<Reaction> {
        let holder = ctx.combatant(owner);
        match self {
            AbilityKind::Intimidate if ctx.user == owner => {
                let foe = owner.opponent();
                Some(
                    Reaction::command(Command::Stage {
                        side: foe,
                        stat: StageStat::Attack,
                        delta: -1,
                    })
                    .message(format!(
                        "{}'s Intimidate cuts {}'s attack!",
                        holder.name,
                        ctx.combatant(foe).name
                    )),
                )
            }
            AbilityKind::Drought | AbilityKind::Drizzle if ctx.user == owner => {
                let weather = if *self == AbilityKind::Drought {
                    Weather::HarshSunlight
                } else {
                    Weather::Rain
                };
                if ctx.field.weather == weather {
                    return None;
                }
                Some(Reaction::command(Command::SetWeather {
                    weather,
                    turns: WEATHER_TURNS,
                }))
            }
            AbilityKind::Technician
                if ctx.user == owner && ctx.value > 0.0 && ctx.value <= 60.0 =>
            {
                Some(Reaction::multiply(1.5))
            }
            AbilityKind::SpeedBoost if ctx.user == owner => {
                if holder.stages.get(StageStat::Speed) >= MAX_STAGE {
                    return None;
                }
                Some(Reaction::command(Command::Stage {
                    side: owner,
                    stat: StageStat::Speed,
                    delta: 1,
                }))
            }
            AbilityKind::RainDish if ctx.user == owner => {
                if ctx.field.weather != Weather::Rain || holder.current_hp >= holder.max_hp() {
                    return None;
                }
                Some(Reaction::command(Command::Heal {
                    side: owner,
                    amount: (holder.max_hp() / 16).max(1),
                }))
            }
            AbilityKind::Blaze | AbilityKind::Torrent | AbilityKind::Overgrow
                if ctx.user == owner =>
            {
                let boosted = self.pinch_type()?;
                let in_pinch = holder.current_hp * 3 <= holder.max_hp();
                match ctx.mv {
                    Some(mv) if mv.move_type == boosted && in_pinch => {
                        Some(Reaction::multiply(1.5))
                    }
                    _ => None,
                }
            }
            AbilityKind::Static if ctx.target == owner && ctx.contact() && ctx.value > 0.0 => {
                Some(Reaction::command(Command::Inflict {
                    side: ctx.user,
                    status: StatusKind::Paralysis,
                    chance: 30,
                }))
            }
            AbilityKind::RoughSkin | AbilityKind::IronBarbs
                if ctx.target == owner && ctx.contact() && ctx.value > 0.0 =>
            {
                let attacker = ctx.combatant(ctx.user);
                Some(
                    Reaction::command(Command::Damage {
                        side: ctx.user,
                        amount: (attacker.max_hp() / 8).max(1),
                    })
                    .message(format!(
                        "{} was hurt by {}'s {}!",
                        attacker.name,
                        holder.name,
                        self.name()
                    )),
                )
            }
            AbilityKind::InnerFocus
                if ctx.target == owner
                    && ctx.infliction == Some(Infliction::Volatile(Volatile::Flinched)) =>
            {
                Some(Reaction::block())
            }
            AbilityKind::CompoundEyes if ctx.user == owner => Some(Reaction::multiply(1.3)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::combatant::Combatant;
    use crate::sim::field::Field;
    use crate::sim::moves::{Move, MoveCategory};
    use crate::sim::stats::StatBlock;

    fn make_combatant(name: &str) -> Combatant {
        let stats = StatBlock {
            hp: 120,
            attack: 100,
            defense: 100,
            sp_attack: 100,
            sp_defense: 100,
            speed: 100,
        };
        let tackle = Move::new("Tackle", Type::Normal, MoveCategory::Physical, 40);
        Combatant::new(name, vec![Type::Normal], 50, stats, vec![tackle]).unwrap()
    }

    #[test]
    fn unknown_names_resolve_to_inert() {
        assert_eq!(AbilityKind::from_name("Speed Boost"), AbilityKind::SpeedBoost);
        assert_eq!(AbilityKind::from_name("rough-skin"), AbilityKind::RoughSkin);
        assert_eq!(AbilityKind::from_name("Wonder Guard"), AbilityKind::Inert);
        assert!(!AbilityKind::Inert.reacts_to(EventKind::SwitchIn));
    }

    #[test]
    fn technician_boosts_weak_moves_only() {
        let combatants = [make_combatant("A"), make_combatant("B")];
        let field = Field::default();
        let weak =
            EventContext::new(EventKind::ModifyBasePower, Side::A, Side::B, &combatants, &field)
                .with_value(40.0);
        let strong = weak.with_value(80.0);
        let mut ability = AbilityKind::Technician;
        assert_eq!(ability.react(Side::A, &weak), Some(Reaction::multiply(1.5)));
        assert_eq!(ability.react(Side::A, &strong), None);
        assert_eq!(ability.react(Side::B, &weak), None);
    }

    #[test]
    fn intimidate_targets_the_opponent_on_switch_in() {
        let combatants = [make_combatant("Gyarados"), make_combatant("Machamp")];
        let field = Field::default();
        let ctx = EventContext::new(EventKind::SwitchIn, Side::A, Side::B, &combatants, &field);
        let reaction = AbilityKind::Intimidate.react(Side::A, &ctx).unwrap();
        assert_eq!(
            reaction.commands,
            vec![Command::Stage {
                side: Side::B,
                stat: StageStat::Attack,
                delta: -1
            }]
        );
    }

    #[test]
    fn blaze_needs_low_hp_and_matching_type() {
        let mut combatants = [make_combatant("A"), make_combatant("B")];
        let ember = Move::new("Ember", Type::Fire, MoveCategory::Special, 40);
        let field = Field::default();
        {
            let ctx =
                EventContext::new(EventKind::ModifyDamage, Side::A, Side::B, &combatants, &field)
                    .with_move(&ember);
            assert_eq!(AbilityKind::Blaze.react(Side::A, &ctx), None);
        }
        combatants[0].current_hp = 40;
        let ctx = EventContext::new(EventKind::ModifyDamage, Side::A, Side::B, &combatants, &field)
            .with_move(&ember);
        assert_eq!(AbilityKind::Blaze.react(Side::A, &ctx), Some(Reaction::multiply(1.5)));
    }
}
