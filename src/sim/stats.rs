use crate::sim::combatant::Combatant;
use crate::sim::status::NonVolatile;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nature {
    #[default]
    Hardy,
    Lonely,
    Brave,
    Adamant,
    Naughty,
    Bold,
    Docile,
    Relaxed,
    Impish,
    Lax,
    Timid,
    Hasty,
    Serious,
    Jolly,
    Naive,
    Modest,
    Mild,
    Quiet,
    Bashful,
    Rash,
    Calm,
    Gentle,
    Sassy,
    Careful,
    Quirky,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Hp,
    Attack,
    Defense,
    SpAttack,
    SpDefense,
    Speed,
}

impl Stat {
    pub const ALL: [Stat; 6] = [
        Stat::Hp,
        Stat::Attack,
        Stat::Defense,
        Stat::SpAttack,
        Stat::SpDefense,
        Stat::Speed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stat::Hp => "hp",
            Stat::Attack => "attack",
            Stat::Defense => "defense",
            Stat::SpAttack => "sp_attack",
            Stat::SpDefense => "sp_defense",
            Stat::Speed => "speed",
        }
    }
}

/// The seven stats that carry a battle stage.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStat {
    Attack,
    Defense,
    SpAttack,
    SpDefense,
    Speed,
    Accuracy,
    Evasion,
}

impl StageStat {
    pub const ALL: [StageStat; 7] = [
        StageStat::Attack,
        StageStat::Defense,
        StageStat::SpAttack,
        StageStat::SpDefense,
        StageStat::Speed,
        StageStat::Accuracy,
        StageStat::Evasion,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            StageStat::Attack => "atk",
            StageStat::Defense => "def",
            StageStat::SpAttack => "spa",
            StageStat::SpDefense => "spd",
            StageStat::Speed => "spe",
            StageStat::Accuracy => "accuracy",
            StageStat::Evasion => "evasion",
        }
    }
}

pub const MIN_STAGE: i8 = -6;
pub const MAX_STAGE: i8 = 6;

pub fn nature_modifier(nature: Nature, stat: Stat) -> (u32, u32) {
    match nature {
        Nature::Hardy | Nature::Docile | Nature::Serious | Nature::Bashful | Nature::Quirky => {
            (1, 1)
        }
        Nature::Lonely => bonus(stat, Stat::Attack, Stat::Defense),
        Nature::Brave => bonus(stat, Stat::Attack, Stat::Speed),
        Nature::Adamant => bonus(stat, Stat::Attack, Stat::SpAttack),
        Nature::Naughty => bonus(stat, Stat::Attack, Stat::SpDefense),
        Nature::Bold => bonus(stat, Stat::Defense, Stat::Attack),
        Nature::Relaxed => bonus(stat, Stat::Defense, Stat::Speed),
        Nature::Impish => bonus(stat, Stat::Defense, Stat::SpAttack),
        Nature::Lax => bonus(stat, Stat::Defense, Stat::SpDefense),
        Nature::Timid => bonus(stat, Stat::Speed, Stat::Attack),
        Nature::Hasty => bonus(stat, Stat::Speed, Stat::Defense),
        Nature::Jolly => bonus(stat, Stat::Speed, Stat::SpAttack),
        Nature::Naive => bonus(stat, Stat::Speed, Stat::SpDefense),
        Nature::Modest => bonus(stat, Stat::SpAttack, Stat::Attack),
        Nature::Mild => bonus(stat, Stat::SpAttack, Stat::Defense),
        Nature::Quiet => bonus(stat, Stat::SpAttack, Stat::Speed),
        Nature::Rash => bonus(stat, Stat::SpAttack, Stat::SpDefense),
        Nature::Calm => bonus(stat, Stat::SpDefense, Stat::Attack),
        Nature::Gentle => bonus(stat, Stat::SpDefense, Stat::Defense),
        Nature::Sassy => bonus(stat, Stat::SpDefense, Stat::Speed),
        Nature::Careful => bonus(stat, Stat::SpDefense, Stat::SpAttack),
    }
}

fn bonus(stat: Stat, boosted: Stat, lowered: Stat) -> (u32, u32) {
    if stat == boosted {
        (11, 10)
    } else if stat == lowered {
        (9, 10)
    } else {
        (1, 1)
    }
}

pub const MAX_BASE_STAT: u32 = 255;
pub const MAX_IV: u32 = 31;
pub const MAX_EV: u32 = 252;
pub const MAX_EV_TOTAL: u32 = 510;
/// Upper bound on any final stat a definition may supply.
pub const MAX_STAT_VALUE: u32 = 9999;

pub fn calc_hp(base: u32, iv: u32, ev: u32, level: u8) -> u32 {
    let base_value = base * 2 + iv + ev / 4;
    let intermediate = base_value * u32::from(level) / 100;
    intermediate + u32::from(level) + 10
}

pub fn calc_stat(base: u32, iv: u32, ev: u32, level: u8, nature: Nature, stat: Stat) -> u32 {
    let base_value = base * 2 + iv + ev / 4;
    let intermediate = base_value * u32::from(level) / 100;
    apply_nature(intermediate + 5, nature, stat)
}

pub fn apply_nature(value: u32, nature: Nature, stat: Stat) -> u32 {
    let (num, den) = nature_modifier(nature, stat);
    value * num / den
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct StatBlock {
    pub hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub sp_attack: u32,
    pub sp_defense: u32,
    pub speed: u32,
}

impl StatBlock {
    pub fn get(&self, stat: Stat) -> u32 {
        match stat {
            Stat::Hp => self.hp,
            Stat::Attack => self.attack,
            Stat::Defense => self.defense,
            Stat::SpAttack => self.sp_attack,
            Stat::SpDefense => self.sp_defense,
            Stat::Speed => self.speed,
        }
    }

    pub fn total(&self) -> u32 {
        Stat::ALL.iter().map(|stat| self.get(*stat)).sum()
    }

    /// Level-scaled stats from species base values, nature applied once.
    /// Inputs are expected within the base, IV and EV bounds above.
    pub fn at_level(
        base: &StatBlock,
        ivs: &StatBlock,
        evs: &StatBlock,
        level: u8,
        nature: Nature,
    ) -> Self {
        let other = |stat: Stat| {
            calc_stat(base.get(stat), ivs.get(stat), evs.get(stat), level, nature, stat)
        };
        Self {
            hp: calc_hp(base.hp, ivs.hp, evs.hp, level),
            attack: other(Stat::Attack),
            defense: other(Stat::Defense),
            sp_attack: other(Stat::SpAttack),
            sp_defense: other(Stat::SpDefense),
            speed: other(Stat::Speed),
        }
    }
}

/// Inputs a level-scaled stat block was computed from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StatBuild {
    pub base: StatBlock,
    pub ivs: StatBlock,
    pub evs: StatBlock,
    pub nature: Nature,
}

impl StatBuild {
    pub fn stats_at(&self, level: u8) -> StatBlock {
        StatBlock::at_level(&self.base, &self.ivs, &self.evs, level, self.nature)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct StatStages {
    stages: [i8; 7],
}

impl StatStages {
    pub fn get(&self, stat: StageStat) -> i8 {
        self.stages[stat.index()]
    }

    /// Applies `delta` clamped to [-6, 6] and returns the change actually made.
    pub fn apply(&mut self, stat: StageStat, delta: i8) -> i8 {
        let before = self.get(stat);
        let after = before.saturating_add(delta).clamp(MIN_STAGE, MAX_STAGE);
        self.stages[stat.index()] = after;
        after - before
    }
}

/// Stage multiplier as an exact ratio.
pub fn stage_ratio(stage: i8) -> (u32, u32) {
    let stage = stage.clamp(MIN_STAGE, MAX_STAGE) as i32;
    if stage >= 0 {
        ((2 + stage) as u32, 2)
    } else {
        (2, (2 - stage) as u32)
    }
}

pub fn stage_multiplier(stage: i8) -> f64 {
    let (num, den) = stage_ratio(stage);
    f64::from(num) / f64::from(den)
}

fn status_ratio(status: &NonVolatile, stat: Stat) -> (u32, u32) {
    match (status, stat) {
        (NonVolatile::Burned, Stat::Attack) => (1, 2),
        (NonVolatile::Paralyzed, Stat::Speed) => (1, 2),
        _ => (1, 1),
    }
}

/// floor(stat * stage * status * item), computed exactly.
pub fn effective_stat(combatant: &Combatant, stat: Stat) -> u32 {
    let raw = u64::from(combatant.stats.get(stat));
    if stat == Stat::Hp {
        return raw as u32;
    }
    let stage = match stat {
        Stat::Attack => StageStat::Attack,
        Stat::Defense => StageStat::Defense,
        Stat::SpAttack => StageStat::SpAttack,
        Stat::SpDefense => StageStat::SpDefense,
        _ => StageStat::Speed,
    };
    let ratios = [
        stage_ratio(combatant.stages.get(stage)),
        status_ratio(&combatant.status, stat),
        combatant.item_stat_ratio(stat),
    ];
    let (num, den) = ratios
        .iter()
        .fold((raw, 1u64), |(n, d), (rn, rd)| (n * u64::from(*rn), d * u64::from(*rd)));
    (num / den) as u32
}

/// Effective speed, scaled by a speed-boosting choice item for turn order.
pub fn turn_order_speed(combatant: &Combatant) -> u32 {
    let speed = effective_stat(combatant, Stat::Speed);
    let (num, den) = combatant.item_order_speed_ratio();
    speed * num / den
}
