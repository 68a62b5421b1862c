use crate::error::{BattleError, Result};
use crate::model::{CombatantSpec, MoveSpec, StatSource};
use crate::sim::effects::{AbilityKind, EffectHook, ItemKind};
use crate::sim::moves::{Move, MoveEffect};
use crate::sim::stats::{
    StageStat, Stat, StatBlock, StatBuild, StatStages, MAX_BASE_STAT, MAX_EV, MAX_EV_TOTAL, MAX_IV,
    MAX_STAGE, MAX_STAT_VALUE, MIN_STAGE,
};
use crate::sim::status::{NonVolatile, Volatiles};
use crate::types::Type;

pub const MAX_MOVES: usize = 4;

#[derive(Clone, Debug, PartialEq)]
pub struct MoveSlot {
    pub template: Move,
    pub pp: u8,
    pub max_pp: u8,
}

impl MoveSlot {
    pub fn new(template: Move) -> Self {
        let pp = template.pp;
        Self {
            template,
            pp,
            max_pp: pp,
        }
    }

    pub fn usable(&self) -> bool {
        self.pp > 0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HeldItem {
    pub name: String,
    pub kind: ItemKind,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Combatant {
    pub species: String,
    pub name: String,
    pub level: u8,
    pub types: Vec<Type>,
    /// Nature-adjusted stats; `stats.hp` is max HP.
    pub stats: StatBlock,
    pub current_hp: u32,
    pub stages: StatStages,
    pub status: NonVolatile,
    pub volatiles: Volatiles,
    pub moves: Vec<MoveSlot>,
    pub ability_name: Option<String>,
    pub ability: AbilityKind,
    pub item: Option<HeldItem>,
    /// Slot index a choice item has locked the holder into.
    pub locked_move: Option<usize>,
    /// Present when stats were scaled from base values.
    pub build: Option<StatBuild>,
    pub mega_evolved: bool,
}

fn check_block(species: &str, label: &str, block: &StatBlock, low: u32, high: u32) -> Result<()> {
    for stat in Stat::ALL {
        let value = block.get(stat);
        if !(low..=high).contains(&value) {
            return Err(BattleError::validation(format!(
                "{species}: {label} {} {value} outside {low}..={high}",
                stat.name()
            )));
        }
    }
    Ok(())
}

impl Combatant {
    /// Builds a combatant from final stats.
    pub fn new(
        name: &str,
        types: Vec<Type>,
        level: u8,
        stats: StatBlock,
        moves: Vec<Move>,
    ) -> Result<Self> {
        let combatant = Self {
            species: name.to_string(),
            name: name.to_string(),
            level,
            types,
            stats,
            current_hp: stats.hp,
            stages: StatStages::default(),
            status: NonVolatile::Healthy,
            volatiles: Volatiles::default(),
            moves: moves.into_iter().map(MoveSlot::new).collect(),
            ability_name: None,
            ability: AbilityKind::Inert,
            item: None,
            locked_move: None,
            build: None,
            mega_evolved: false,
        };
        combatant.validate()?;
        Ok(combatant)
    }

    pub fn from_spec(spec: &CombatantSpec) -> Result<Self> {
        if !(1..=100).contains(&spec.level) {
            return Err(BattleError::validation(format!(
                "{}: level {} outside 1..=100",
                spec.species, spec.level
            )));
        }
        let (stats, build) = match &spec.stats {
            StatSource::Base(base) => {
                check_block(&spec.species, "base", base, 1, MAX_BASE_STAT)?;
                check_block(&spec.species, "iv", &spec.ivs, 0, MAX_IV)?;
                check_block(&spec.species, "ev", &spec.evs, 0, MAX_EV)?;
                if spec.evs.total() > MAX_EV_TOTAL {
                    return Err(BattleError::validation(format!(
                        "{}: ev total {} above {MAX_EV_TOTAL}",
                        spec.species,
                        spec.evs.total()
                    )));
                }
                let build = StatBuild {
                    base: *base,
                    ivs: spec.ivs,
                    evs: spec.evs,
                    nature: spec.nature,
                };
                (build.stats_at(spec.level), Some(build))
            }
            StatSource::Final(stats) => (*stats, None),
        };
        let moves = spec
            .moves
            .iter()
            .map(move_from_spec)
            .collect::<Result<Vec<_>>>()?;
        let name = spec.name.clone().unwrap_or_else(|| spec.species.clone());
        let mut combatant = Self::new(&name, spec.types.clone(), spec.level, stats, moves)?;
        combatant.species = spec.species.clone();
        combatant.build = build;
        if let Some(ability) = &spec.ability {
            combatant = combatant.with_ability(ability);
        }
        if let Some(item) = &spec.item {
            combatant = combatant.with_item(item);
        }
        if let Some(hp) = spec.current_hp {
            if hp < 0 || hp > i64::from(combatant.max_hp()) {
                return Err(BattleError::validation(format!(
                    "{name}: current hp {hp} outside 0..={}",
                    combatant.max_hp()
                )));
            }
            combatant.current_hp = hp as u32;
        }
        for (stat, stage) in &spec.stages {
            if !(MIN_STAGE..=MAX_STAGE).contains(stage) {
                return Err(BattleError::validation(format!(
                    "{name}: {} stage {stage} outside -6..=6",
                    stat.name()
                )));
            }
            combatant.stages.apply(*stat, *stage);
        }
        Ok(combatant)
    }

    pub fn with_ability(mut self, name: &str) -> Self {
        self.ability = AbilityKind::from_name(name);
        self.ability_name = Some(name.to_string());
        self
    }

    pub fn with_item(mut self, name: &str) -> Self {
        self.item = Some(HeldItem {
            name: name.to_string(),
            kind: ItemKind::from_name(name),
        });
        self
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(BattleError::validation(format!("{}: {msg}", self.name)));
        if !(1..=100).contains(&self.level) {
            return fail(format!("level {} outside 1..=100", self.level));
        }
        if self.types.is_empty() || self.types.len() > 2 {
            return fail(format!("needs one or two types, got {}", self.types.len()));
        }
        if self.stats.hp == 0 {
            return fail("max hp must be positive".to_string());
        }
        let oversized = Stat::ALL
            .into_iter()
            .find(|stat| self.stats.get(*stat) > MAX_STAT_VALUE);
        if let Some(stat) = oversized {
            return fail(format!("{} {} above {MAX_STAT_VALUE}", stat.name(), self.stats.get(stat)));
        }
        if self.current_hp > self.stats.hp {
            return fail(format!("current hp {} above max {}", self.current_hp, self.stats.hp));
        }
        if self.moves.is_empty() || self.moves.len() > MAX_MOVES {
            return fail(format!("needs 1..=4 moves, got {}", self.moves.len()));
        }
        for slot in &self.moves {
            slot.template.validate()?;
        }
        Ok(())
    }

    pub fn max_hp(&self) -> u32 {
        self.stats.hp
    }

    pub fn is_fainted(&self) -> bool {
        self.current_hp == 0
    }

    pub fn has_type(&self, ty: Type) -> bool {
        self.types.contains(&ty)
    }

    /// Returns the HP actually removed.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let dealt = amount.min(self.current_hp);
        self.current_hp -= dealt;
        dealt
    }

    /// Returns the HP actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        if self.is_fainted() {
            return 0;
        }
        let healed = amount.min(self.max_hp() - self.current_hp);
        self.current_hp += healed;
        healed
    }

    pub fn has_usable_move(&self) -> bool {
        self.moves.iter().any(MoveSlot::usable)
    }

    pub fn usable_moves(&self) -> Vec<usize> {
        self.moves
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.usable())
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn item_kind(&self) -> Option<ItemKind> {
        self.item.as_ref().map(|item| item.kind)
    }

    pub fn holds_choice_item(&self) -> bool {
        self.item_kind().map_or(false, ItemKind::is_choice)
    }

    pub fn item_stat_ratio(&self, stat: Stat) -> (u32, u32) {
        self.item_kind().map_or((1, 1), |item| item.stat_ratio(stat))
    }

    pub fn item_order_speed_ratio(&self) -> (u32, u32) {
        self.item_kind().map_or((1, 1), ItemKind::order_speed_ratio)
    }

    pub fn item_display_name(&self) -> Option<&str> {
        self.item.as_ref().map(|item| match item.kind {
            ItemKind::Inert => item.name.as_str(),
            kind => kind.name(),
        })
    }

    pub fn consume_item(&mut self) -> Option<HeldItem> {
        self.item.take()
    }

    pub fn stage(&self, stat: StageStat) -> i8 {
        self.stages.get(stat)
    }
}

fn move_from_spec(spec: &MoveSpec) -> Result<Move> {
    let mv = Move {
        name: spec.name.clone(),
        move_type: spec.move_type,
        category: spec.category,
        power: spec.power,
        accuracy: spec.accuracy,
        priority: spec.priority,
        pp: spec.pp,
        contact: spec.contact.unwrap_or(spec.category == crate::sim::moves::MoveCategory::Physical),
        secondary: spec.secondary.clone(),
        effect: MoveEffect::from_name(&spec.name),
    };
    mv.validate()?;
    Ok(mv)
}
