use super::{EffectHook, EventContext, EventKind, Reaction};
use crate::sim::field::SideCondition;
use crate::sim::moves::MoveCategory;
use crate::sim::Side;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Condition {
    /// Reflect or Light Screen on the owning side.
    Screen(SideCondition),
    Substitute { hp: u32 },
}

impl EffectHook for Condition {
    fn name(&self) -> &'static str {
        match self {
            Condition::Screen(kind) => kind.name(),
            Condition::Substitute { .. } => "Substitute",
        }
    }

    fn reacts_to(&self, kind: EventKind) -> bool {
        match self {
            Condition::Screen(_) => kind == EventKind::ModifyDamage,
            Condition::Substitute { .. } => {
                matches!(kind, EventKind::DamageTaken | EventKind::StatusInflict)
            }
        }
    }

    fn priority(&self) -> i32 {
        match self {
            Condition::Substitute { .. } => 100,
            Condition::Screen(_) => 0,
        }
    }

    fn react(&mut self, owner: Side, ctx: &EventContext<'_>) -> Option<Reaction> {
        if ctx.target != owner || ctx.user == owner {
            return None;
        }
        match self {
            Condition::Screen(kind) => {
                let category = ctx.mv?.category;
                let screened = match kind {
                    SideCondition::Reflect => category == MoveCategory::Physical,
                    SideCondition::LightScreen => category == MoveCategory::Special,
                    SideCondition::StealthRock => false,
                };
                (screened && !ctx.critical).then(|| Reaction::multiply(0.5))
            }
            Condition::Substitute { hp } => {
                if *hp == 0 {
                    return None;
                }
                if ctx.kind == EventKind::StatusInflict {
                    // abilities and items reach past the substitute
                    return ctx.mv.map(|_| Reaction::block());
                }
                let absorbed = (ctx.value.max(0.0) as u32).min(*hp);
                *hp -= absorbed;
                let text = if *hp == 0 {
                    "The substitute broke!"
                } else {
                    "The substitute took damage for its user!"
                };
                Some(Reaction::replace(0.0).message(text))
            }
        }
    }

    fn exhausted(&self) -> bool {
        matches!(self, Condition::Substitute { hp: 0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::combatant::Combatant;
    use crate::sim::effects::{Infliction, Modifier};
    use crate::sim::status::StatusKind;
    use crate::sim::field::Field;
    use crate::sim::moves::Move;
    use crate::sim::stats::StatBlock;
    use crate::types::Type;

    fn pair() -> [Combatant; 2] {
        let stats = StatBlock {
            hp: 100,
            attack: 100,
            defense: 100,
            sp_attack: 100,
            sp_defense: 100,
            speed: 100,
        };
        let tackle = Move::new("Tackle", Type::Normal, MoveCategory::Physical, 40);
        let make = |name: &str| {
            Combatant::new(name, vec![Type::Normal], 50, stats, vec![tackle.clone()]).unwrap()
        };
        [make("A"), make("B")]
    }

    #[test]
    fn reflect_halves_physical_but_not_critical_hits() {
        let combatants = pair();
        let field = Field::default();
        let slash = Move::new("Slash", Type::Normal, MoveCategory::Physical, 70);
        let surf = Move::new("Surf", Type::Water, MoveCategory::Special, 90);
        let mut reflect = Condition::Screen(SideCondition::Reflect);
        let ctx = EventContext::new(EventKind::ModifyDamage, Side::A, Side::B, &combatants, &field)
            .with_move(&slash);
        assert_eq!(reflect.react(Side::B, &ctx), Some(Reaction::multiply(0.5)));
        assert_eq!(reflect.react(Side::B, &ctx.with_hit(1.0, true)), None);
        assert_eq!(reflect.react(Side::B, &ctx.with_move(&surf)), None);
        assert_eq!(reflect.react(Side::A, &ctx), None);
    }

    #[test]
    fn substitute_absorbs_until_broken() {
        let combatants = pair();
        let field = Field::default();
        let mut sub = Condition::Substitute { hp: 25 };
        let ctx = EventContext::new(EventKind::DamageTaken, Side::A, Side::B, &combatants, &field)
            .with_value(10.0);
        assert_eq!(sub.react(Side::B, &ctx).unwrap().modifier, Some(Modifier::Replace(0.0)));
        assert_eq!(sub, Condition::Substitute { hp: 15 });
        assert!(!sub.exhausted());
        let reaction = sub.react(Side::B, &ctx.with_value(40.0)).unwrap();
        assert_eq!(reaction.message.as_deref(), Some("The substitute broke!"));
        assert!(sub.exhausted());
    }

    #[test]
    fn substitute_blocks_move_inflictions_only() {
        let combatants = pair();
        let field = Field::default();
        let wave = Move::new("Thunder Wave", Type::Electric, MoveCategory::Status, 0);
        let mut sub = Condition::Substitute { hp: 25 };
        let ctx = EventContext::new(EventKind::StatusInflict, Side::A, Side::B, &combatants, &field)
            .with_infliction(Infliction::Status(StatusKind::Paralysis));
        assert_eq!(sub.react(Side::B, &ctx), None);
        assert_eq!(sub.react(Side::B, &ctx.with_move(&wave)), Some(Reaction::block()));
    }
}
