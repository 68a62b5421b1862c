use crate::sim::battle::BattleOutcome;
use crate::sim::field::{SideCondition, Weather};
use crate::sim::stats::StageStat;
use crate::sim::status::{InflictOutcome, Prevented, StatusKind, Volatile};
use crate::sim::Side;
use serde::Serialize;
use serde_json::json;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DamageCause {
    Move,
    Struggle,
    Recoil,
    Confusion,
    Weather(Weather),
    Status(StatusKind),
    Curse,
    LeechSeed,
    Substitute,
    Effect(String),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogKind {
    BattleStarted,
    TurnStarted,
    MoveUsed { name: String },
    LockedInto { name: String },
    MegaEvolved { forme: String },
    Idle,
    Missed,
    NoEffect,
    MoveFailed,
    Critical,
    Effectiveness { multiplier: f64 },
    Damage { amount: u32, hp: u32, max_hp: u32, cause: DamageCause },
    Heal { amount: u32, hp: u32, max_hp: u32, cause: String },
    StatusInflicted { status: StatusKind },
    StatusFailed { status: StatusKind, result: InflictOutcome },
    StatusCured { status: StatusKind },
    VolatileStarted { volatile: Volatile },
    VolatileFailed { volatile: Volatile, result: InflictOutcome },
    VolatileEnded { volatile: Volatile },
    /// An effect such as a substitute stopped an infliction.
    Blocked,
    Prevented(Prevented),
    WokeUp,
    Thawed,
    SnappedOutOfConfusion,
    StageChanged { stat: StageStat, delta: i8, stage: i8 },
    StageUnchanged { stat: StageStat, rising: bool },
    WeatherStarted { weather: Weather },
    WeatherEnded { weather: Weather },
    SideConditionStarted { condition: SideCondition },
    SideConditionEnded { condition: SideCondition },
    TrickRoomStarted,
    TrickRoomEnded,
    SubstituteCreated,
    ItemConsumed { item: String },
    HandlerExpired { name: String },
    Effect { text: String },
    Fainted,
    BattleEnded { outcome: BattleOutcome },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LogEntry {
    pub turn: u32,
    pub actor: Option<Side>,
    #[serde(flatten)]
    pub kind: LogKind,
}

/// Ordered record of everything that happened in a battle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BattleLog {
    names: [String; 2],
    entries: Vec<LogEntry>,
}

impl BattleLog {
    pub fn new(name_a: &str, name_b: &str) -> Self {
        Self {
            names: [name_a.to_string(), name_b.to_string()],
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, turn: u32, actor: Option<Side>, kind: LogKind) {
        self.entries.push(LogEntry { turn, actor, kind });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "sides": { "p1": self.names[0], "p2": self.names[1] },
            "log": self.entries,
        })
    }

    pub fn ident(&self, side: Side) -> String {
        format!("{}: {}", side.ident(), self.names[side.index()])
    }

    pub fn render_lines(&self) -> Vec<String> {
        self.entries.iter().filter_map(|e| self.render(e)).collect()
    }

    fn render(&self, entry: &LogEntry) -> Option<String> {
        let who = entry.actor.map(|side| self.ident(side)).unwrap_or_default();
        let line = match &entry.kind {
            LogKind::BattleStarted => format!("|start|{}|{}", self.names[0], self.names[1]),
            LogKind::TurnStarted => format!("|turn|{}", entry.turn),
            LogKind::MoveUsed { name } => format!("|move|{who}|{name}"),
            LogKind::LockedInto { name } => format!("|-locked|{who}|{name}"),
            LogKind::MegaEvolved { forme } => format!("|-mega|{who}|{forme}"),
            LogKind::Idle => format!("|cant|{who}|idle"),
            LogKind::Missed => format!("|-miss|{who}"),
            LogKind::NoEffect => format!("|-immune|{who}"),
            LogKind::MoveFailed => format!("|-fail|{who}"),
            LogKind::Critical => "|-crit|".to_string(),
            LogKind::Effectiveness { multiplier } if *multiplier > 1.0 => {
                "|-supereffective|".to_string()
            }
            LogKind::Effectiveness { .. } => "|-resisted|".to_string(),
            LogKind::Damage { hp, max_hp, cause, .. } => match cause {
                DamageCause::Move | DamageCause::Struggle => {
                    format!("|-damage|{who}|{hp}/{max_hp}")
                }
                other => format!("|-damage|{who}|{hp}/{max_hp}|[from] {}", cause_label(other)),
            },
            LogKind::Heal { hp, max_hp, cause, .. } => {
                format!("|-heal|{who}|{hp}/{max_hp}|[from] {cause}")
            }
            LogKind::StatusInflicted { status } => format!("|-status|{who}|{}", status.code()),
            LogKind::StatusFailed { .. } => format!("|-fail|{who}"),
            LogKind::VolatileFailed { .. } => format!("|-fail|{who}"),
            LogKind::Blocked => format!("|-activate|{who}|blocked"),
            LogKind::StatusCured { status } => format!("|-curestatus|{who}|{}", status.code()),
            LogKind::VolatileStarted { volatile } => format!("|-start|{who}|{volatile:?}"),
            LogKind::VolatileEnded { volatile } => format!("|-end|{who}|{volatile:?}"),
            LogKind::Prevented(reason) => format!("|cant|{who}|{}", prevented_label(reason)),
            LogKind::WokeUp => format!("|-curestatus|{who}|slp"),
            LogKind::Thawed => format!("|-curestatus|{who}|frz"),
            LogKind::SnappedOutOfConfusion => format!("|-end|{who}|confusion"),
            LogKind::StageChanged { stat, delta, .. } if *delta > 0 => {
                format!("|-boost|{who}|{}|{delta}", stat.name())
            }
            LogKind::StageChanged { stat, delta, .. } => {
                format!("|-unboost|{who}|{}|{}", stat.name(), -delta)
            }
            LogKind::StageUnchanged { stat, .. } => format!("|-fail|{who}|{}", stat.name()),
            LogKind::WeatherStarted { weather } => format!("|-weather|{}", weather.name()),
            LogKind::WeatherEnded { .. } => "|-weather|none".to_string(),
            LogKind::SideConditionStarted { condition } => {
                format!("|-sidestart|{who}|{}", condition.name())
            }
            LogKind::SideConditionEnded { condition } => {
                format!("|-sideend|{who}|{}", condition.name())
            }
            LogKind::TrickRoomStarted => "|-fieldstart|Trick Room".to_string(),
            LogKind::TrickRoomEnded => "|-fieldend|Trick Room".to_string(),
            LogKind::SubstituteCreated => format!("|-start|{who}|Substitute"),
            LogKind::ItemConsumed { item } => format!("|-enditem|{who}|{item}"),
            LogKind::HandlerExpired { .. } => return None,
            LogKind::Effect { text } => format!("|-message|{text}"),
            LogKind::Fainted => format!("|faint|{who}"),
            LogKind::BattleEnded { outcome } => match outcome {
                BattleOutcome::Winner(side) => format!("|win|{}", self.names[side.index()]),
                BattleOutcome::Draw => "|tie".to_string(),
            },
        };
        Some(line)
    }
}

fn cause_label(cause: &DamageCause) -> String {
    match cause {
        DamageCause::Move => "move".to_string(),
        DamageCause::Struggle => "Struggle".to_string(),
        DamageCause::Recoil => "Recoil".to_string(),
        DamageCause::Confusion => "confusion".to_string(),
        DamageCause::Weather(weather) => weather.name().to_string(),
        DamageCause::Status(status) => status.code().to_string(),
        DamageCause::Curse => "Curse".to_string(),
        DamageCause::LeechSeed => "Leech Seed".to_string(),
        DamageCause::Substitute => "Substitute".to_string(),
        DamageCause::Effect(name) => name.clone(),
    }
}

fn prevented_label(reason: &Prevented) -> &'static str {
    match reason {
        Prevented::Asleep => "slp",
        Prevented::Frozen => "frz",
        Prevented::Paralyzed => "par",
        Prevented::Confusion { .. } => "confusion",
        Prevented::Flinched => "flinch",
        Prevented::Attracted => "attract",
        Prevented::Taunted => "Taunt",
    }
}
