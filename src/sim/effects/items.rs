use super::{Command, EffectHook, EventContext, EventKind, Reaction};
use crate::sim::combatant::Combatant;
use crate::sim::normalize_id;
use crate::sim::stats::{Stat, StageStat};
use crate::sim::status::StatusKind;
use crate::sim::Side;
use phf::phf_map;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ItemKind {
    Leftovers,
    SitrusBerry,
    LumBerry,
    ChoiceBand,
    ChoiceSpecs,
    ChoiceScarf,
    LifeOrb,
    FocusSash,
    WeaknessPolicy,
    FlameOrb,
    ToxicOrb,
    #[default]
    Inert,
}

static ITEMS: phf::Map<&'static str, ItemKind> = phf_map! {
    "leftovers" => ItemKind::Leftovers,
    "sitrusberry" => ItemKind::SitrusBerry,
    "lumberry" => ItemKind::LumBerry,
    "choiceband" => ItemKind::ChoiceBand,
    "choicespecs" => ItemKind::ChoiceSpecs,
    "choicescarf" => ItemKind::ChoiceScarf,
    "lifeorb" => ItemKind::LifeOrb,
    "focussash" => ItemKind::FocusSash,
    "weaknesspolicy" => ItemKind::WeaknessPolicy,
    "flameorb" => ItemKind::FlameOrb,
    "toxicorb" => ItemKind::ToxicOrb,
};

impl ItemKind {
    pub fn from_name(name: &str) -> ItemKind {
        ITEMS
            .get(normalize_id(name).as_str())
            .copied()
            .unwrap_or(ItemKind::Inert)
    }

    pub fn is_choice(self) -> bool {
        matches!(self, ItemKind::ChoiceBand | ItemKind::ChoiceSpecs | ItemKind::ChoiceScarf)
    }

    /// Items that act through the effect bus rather than stats or end of turn.
    pub fn has_hooks(self) -> bool {
        matches!(self, ItemKind::LifeOrb | ItemKind::FocusSash | ItemKind::WeaknessPolicy)
    }

    pub fn stat_ratio(self, stat: Stat) -> (u32, u32) {
        match (self, stat) {
            (ItemKind::ChoiceBand, Stat::Attack) | (ItemKind::ChoiceSpecs, Stat::SpAttack) => {
                (3, 2)
            }
            _ => (1, 1),
        }
    }

    pub fn order_speed_ratio(self) -> (u32, u32) {
        match self {
            ItemKind::ChoiceScarf => (3, 2),
            _ => (1, 1),
        }
    }
}

impl EffectHook for ItemKind {
    fn name(&self) -> &'static str {
        match self {
            ItemKind::Leftovers => "Leftovers",
            ItemKind::SitrusBerry => "Sitrus Berry",
            ItemKind::LumBerry => "Lum Berry",
            ItemKind::ChoiceBand => "Choice Band",
            ItemKind::ChoiceSpecs => "Choice Specs",
            ItemKind::ChoiceScarf => "Choice Scarf",
            ItemKind::LifeOrb => "Life Orb",
            ItemKind::FocusSash => "Focus Sash",
            ItemKind::WeaknessPolicy => "Weakness Policy",
            ItemKind::FlameOrb => "Flame Orb",
            ItemKind::ToxicOrb => "Toxic Orb",
            ItemKind::Inert => "",
        }
    }

    fn reacts_to(&self, kind: EventKind) -> bool {
        match self {
            ItemKind::LifeOrb => matches!(kind, EventKind::ModifyDamage | EventKind::AfterMove),
            ItemKind::FocusSash => kind == EventKind::DamageTaken,
            ItemKind::WeaknessPolicy => kind == EventKind::AfterMove,
            _ => false,
        }
    }

    fn priority(&self) -> i32 {
        match self {
            ItemKind::FocusSash => 50,
            _ => 0,
        }
    }

    fn react(&mut self, owner: Side, ctx: &EventContext<'_>) -> Option<Reaction> {
        let holder = ctx.combatant(owner);
        match (*self, ctx.kind) {
            (ItemKind::LifeOrb, EventKind::ModifyDamage) if ctx.user == owner => {
                Some(Reaction::multiply(1.3))
            }
            (ItemKind::LifeOrb, EventKind::AfterMove) if ctx.user == owner && ctx.value > 0.0 => {
                Some(
                    Reaction::command(Command::Damage {
                        side: owner,
                        amount: (holder.max_hp() / 10).max(1),
                    })
                    .message(format!("{} lost some of its HP!", holder.name)),
                )
            }
            (ItemKind::FocusSash, EventKind::DamageTaken) if ctx.target == owner => {
                let hp = holder.current_hp;
                if hp != holder.max_hp() || hp <= 1 || ctx.value < f64::from(hp) {
                    return None;
                }
                Some(
                    Reaction::replace(f64::from(hp - 1))
                        .and(Command::ConsumeItem { side: owner })
                        .message(format!("{} hung on using its Focus Sash!", holder.name)),
                )
            }
            (ItemKind::WeaknessPolicy, EventKind::AfterMove)
                if ctx.target == owner
                    && ctx.effectiveness > 1.0
                    && ctx.value > 0.0
                    && !holder.is_fainted() =>
            {
                Some(
                    Reaction::command(Command::Stage {
                        side: owner,
                        stat: StageStat::Attack,
                        delta: 2,
                    })
                    .and(Command::Stage {
                        side: owner,
                        stat: StageStat::SpAttack,
                        delta: 2,
                    })
                    .and(Command::ConsumeItem { side: owner }),
                )
            }
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EndOfTurnItem {
    Heal { amount: u32, consume: bool },
    Cure,
    Inflict(StatusKind),
}

/// What the held item does during the end-of-turn item step, if anything.
pub fn end_of_turn_effect(holder: &Combatant) -> Option<EndOfTurnItem> {
    let item = holder.item_kind()?;
    let max_hp = holder.max_hp();
    match item {
        ItemKind::Leftovers if holder.current_hp < max_hp => Some(EndOfTurnItem::Heal {
            amount: (max_hp / 16).max(1),
            consume: false,
        }),
        ItemKind::SitrusBerry if holder.current_hp * 2 <= max_hp => Some(EndOfTurnItem::Heal {
            amount: (max_hp / 4).max(1),
            consume: true,
        }),
        ItemKind::LumBerry if !holder.status.is_healthy() => Some(EndOfTurnItem::Cure),
        ItemKind::FlameOrb if holder.status.is_healthy() => {
            Some(EndOfTurnItem::Inflict(StatusKind::Burn))
        }
        ItemKind::ToxicOrb if holder.status.is_healthy() => {
            Some(EndOfTurnItem::Inflict(StatusKind::BadPoison))
        }
        _ => None,
    }
}
