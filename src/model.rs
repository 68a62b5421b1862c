use crate::config::BattleConfig;
use crate::sim::moves::{MoveCategory, SecondaryEffect};
use crate::sim::stats::{Nature, StageStat, StatBlock};
use crate::types::Type;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

fn default_accuracy() -> u8 {
    100
}

fn default_priority() -> i8 {
    0
}

fn default_pp() -> u8 {
    10
}

fn default_level() -> u8 {
    50
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub move_type: Type,
    pub category: MoveCategory,
    #[serde(default)]
    pub power: u32,
    #[serde(default = "default_accuracy")]
    pub accuracy: u8,
    #[serde(default = "default_priority")]
    pub priority: i8,
    #[serde(default = "default_pp")]
    pub pp: u8,
    /// Defaults to true for physical moves.
    #[serde(default)]
    pub contact: Option<bool>,
    #[serde(default)]
    pub secondary: Vec<SecondaryEffect>,
}

/// Species base stats to scale by level, or final nature-adjusted stats.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatSource {
    Base(StatBlock),
    Final(StatBlock),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatantSpec {
    pub species: String,
    #[serde(default)]
    pub name: Option<String>,
    pub types: Vec<Type>,
    #[serde(default = "default_level")]
    pub level: u8,
    pub stats: StatSource,
    #[serde(default)]
    pub ivs: StatBlock,
    #[serde(default)]
    pub evs: StatBlock,
    #[serde(default)]
    pub nature: Nature,
    pub moves: Vec<MoveSpec>,
    #[serde(default)]
    pub ability: Option<String>,
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default)]
    pub current_hp: Option<i64>,
    #[serde(default)]
    pub stages: BTreeMap<StageStat, i8>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleFile {
    pub side_a: CombatantSpec,
    pub side_b: CombatantSpec,
    #[serde(default)]
    pub config: Option<BattleConfig>,
    /// Overrides on top of the standard chart, `{ "fire": { "grass": 2.0 } }`.
    #[serde(default)]
    pub type_chart: Option<HashMap<String, HashMap<String, f64>>>,
}
