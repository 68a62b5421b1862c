use crate::error::{BattleError, Result};
use crate::sim::field::{SideCondition, Weather};
use crate::sim::normalize_id;
use crate::sim::stats::{StageStat, MAX_STAGE, MIN_STAGE};
use crate::sim::status::{StatusKind, Volatile};
use crate::types::Type;
use phf::phf_map;
use serde::{Deserialize, Serialize};

pub const STRUGGLE: &str = "Struggle";
pub const MIN_PRIORITY: i8 = -6;
pub const MAX_PRIORITY: i8 = 5;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveCategory {
    Physical,
    Special,
    Status,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectTarget {
    #[serde(rename = "self")]
    User,
    #[default]
    Opponent,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct StageChange {
    pub stat: StageStat,
    pub delta: i8,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondaryPayload {
    Status(StatusKind),
    StatChanges(Vec<StageChange>),
    Flinch,
    Volatile(Volatile),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SecondaryEffect {
    pub chance: u8,
    #[serde(default)]
    pub target: EffectTarget,
    pub effect: SecondaryPayload,
}

/// Primary behaviour of a status move, resolved from its name once.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MoveEffect {
    Weather(Weather),
    Heal { num: u32, den: u32 },
    Synthesis,
    Boost(&'static [(StageStat, i8)]),
    Lower(&'static [(StageStat, i8)]),
    Inflict(StatusKind),
    Confuse,
    LeechSeed,
    Hazard(SideCondition),
    Screen(SideCondition),
    Substitute,
    TrickRoom,
}

static MOVE_EFFECTS: phf::Map<&'static str, MoveEffect> = phf_map! {
    "sunnyday" => MoveEffect::Weather(Weather::HarshSunlight),
    "raindance" => MoveEffect::Weather(Weather::Rain),
    "sandstorm" => MoveEffect::Weather(Weather::Sandstorm),
    "hail" => MoveEffect::Weather(Weather::Hail),
    "recover" => MoveEffect::Heal { num: 1, den: 2 },
    "roost" => MoveEffect::Heal { num: 1, den: 2 },
    "softboiled" => MoveEffect::Heal { num: 1, den: 2 },
    "synthesis" => MoveEffect::Synthesis,
    "swordsdance" => MoveEffect::Boost(&[(StageStat::Attack, 2)]),
    "calmmind" => MoveEffect::Boost(&[(StageStat::SpAttack, 1), (StageStat::SpDefense, 1)]),
    "agility" => MoveEffect::Boost(&[(StageStat::Speed, 2)]),
    "doubleteam" => MoveEffect::Boost(&[(StageStat::Evasion, 1)]),
    "withdraw" => MoveEffect::Boost(&[(StageStat::Defense, 1)]),
    "growl" => MoveEffect::Lower(&[(StageStat::Attack, -1)]),
    "sleeppowder" => MoveEffect::Inflict(StatusKind::Sleep),
    "thunderwave" => MoveEffect::Inflict(StatusKind::Paralysis),
    "willowisp" => MoveEffect::Inflict(StatusKind::Burn),
    "toxic" => MoveEffect::Inflict(StatusKind::BadPoison),
    "confuseray" => MoveEffect::Confuse,
    "leechseed" => MoveEffect::LeechSeed,
    "stealthrock" => MoveEffect::Hazard(SideCondition::StealthRock),
    "reflect" => MoveEffect::Screen(SideCondition::Reflect),
    "lightscreen" => MoveEffect::Screen(SideCondition::LightScreen),
    "substitute" => MoveEffect::Substitute,
    "trickroom" => MoveEffect::TrickRoom,
};

impl MoveEffect {
    pub fn from_name(name: &str) -> Option<MoveEffect> {
        MOVE_EFFECTS.get(normalize_id(name).as_str()).copied()
    }

    /// Effects aimed at the opposing combatant roll accuracy.
    pub fn targets_opponent(&self) -> bool {
        matches!(
            self,
            MoveEffect::Lower(_)
                | MoveEffect::Inflict(_)
                | MoveEffect::Confuse
                | MoveEffect::LeechSeed
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Move {
    pub name: String,
    pub move_type: Type,
    pub category: MoveCategory,
    pub power: u32,
    pub accuracy: u8,
    pub priority: i8,
    pub pp: u8,
    pub contact: bool,
    pub secondary: Vec<SecondaryEffect>,
    pub effect: Option<MoveEffect>,
}

impl Move {
    pub fn new(name: &str, move_type: Type, category: MoveCategory, power: u32) -> Self {
        Self {
            name: name.to_string(),
            move_type,
            category,
            power,
            accuracy: 100,
            priority: 0,
            pp: 10,
            contact: category == MoveCategory::Physical,
            secondary: Vec::new(),
            effect: MoveEffect::from_name(name),
        }
    }

    pub fn with_accuracy(mut self, accuracy: u8) -> Self {
        self.accuracy = accuracy;
        self
    }

    pub fn with_priority(mut self, priority: i8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_pp(mut self, pp: u8) -> Self {
        self.pp = pp;
        self
    }

    pub fn is_damaging(&self) -> bool {
        self.category != MoveCategory::Status
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(BattleError::validation(format!("move {}: {msg}", self.name)));
        if self.name.trim().is_empty() {
            return Err(BattleError::validation("move name must not be empty"));
        }
        if self.accuracy > 100 {
            return fail(format!("accuracy {} outside 0..=100", self.accuracy));
        }
        if self.accuracy == 0 && self.is_damaging() {
            return fail("accuracy 0 is only valid for status moves".to_string());
        }
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&self.priority) {
            return fail(format!("priority {} outside -6..=5", self.priority));
        }
        if self.pp == 0 {
            return fail("pp must be at least 1".to_string());
        }
        if self.is_damaging() && self.power == 0 {
            return fail("damaging moves need power".to_string());
        }
        for effect in &self.secondary {
            if effect.chance > 100 {
                return fail(format!("secondary chance {} outside 0..=100", effect.chance));
            }
            if let SecondaryPayload::StatChanges(changes) = &effect.effect {
                if changes
                    .iter()
                    .any(|c| !(MIN_STAGE..=MAX_STAGE).contains(&c.delta))
                {
                    return fail("stage change outside -6..=6".to_string());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_move_names_resolve_to_effects() {
        assert_eq!(
            MoveEffect::from_name("Sunny Day"),
            Some(MoveEffect::Weather(Weather::HarshSunlight))
        );
        assert_eq!(
            MoveEffect::from_name("Thunder Wave"),
            Some(MoveEffect::Inflict(StatusKind::Paralysis))
        );
        assert_eq!(MoveEffect::from_name("Splash"), None);
    }

    #[test]
    fn defaults_follow_the_template_rules() {
        let mv = Move::new("Flamethrower", Type::Fire, MoveCategory::Special, 90);
        assert_eq!(mv.accuracy, 100);
        assert_eq!(mv.pp, 10);
        assert_eq!(mv.priority, 0);
        assert!(!mv.contact);
        assert!(mv.validate().is_ok());
    }

    #[test]
    fn invalid_templates_are_rejected() {
        let base = Move::new("Tackle", Type::Normal, MoveCategory::Physical, 40);
        assert!(base.clone().with_accuracy(0).validate().is_err());
        assert!(base.clone().with_accuracy(101).validate().is_err());
        assert!(base.clone().with_priority(6).validate().is_err());
        assert!(base.clone().with_pp(0).validate().is_err());
        let never_miss = Move::new("Toxic", Type::Poison, MoveCategory::Status, 0).with_accuracy(0);
        assert!(never_miss.validate().is_ok());
    }
}
