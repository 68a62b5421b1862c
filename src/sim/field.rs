use crate::sim::Side;
use crate::types::Type;
use serde::Serialize;

pub const WEATHER_TURNS: u8 = 5;
pub const SCREEN_TURNS: u8 = 5;
pub const TRICK_ROOM_TURNS: u8 = 5;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    #[default]
    Clear,
    Rain,
    HarshSunlight,
    Sandstorm,
    Hail,
}

impl Weather {
    pub fn name(self) -> &'static str {
        match self {
            Weather::Clear => "none",
            Weather::Rain => "RainDance",
            Weather::HarshSunlight => "SunnyDay",
            Weather::Sandstorm => "Sandstorm",
            Weather::Hail => "Hail",
        }
    }
}

pub fn weather_damage_modifier(weather: Weather, move_type: Type) -> f64 {
    match weather {
        Weather::HarshSunlight => match move_type {
            Type::Fire => 1.5,
            Type::Water => 0.5,
            _ => 1.0,
        },
        Weather::Rain => match move_type {
            Type::Water => 1.5,
            Type::Fire => 0.5,
            _ => 1.0,
        },
        _ => 1.0,
    }
}

/// Whether a combatant with `types` takes residual damage from `weather`.
pub fn hurt_by_weather(weather: Weather, types: &[Type]) -> bool {
    match weather {
        Weather::Sandstorm => !types
            .iter()
            .any(|t| matches!(t, Type::Rock | Type::Ground | Type::Steel)),
        Weather::Hail => !types.contains(&Type::Ice),
        _ => false,
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SideCondition {
    Reflect,
    LightScreen,
    StealthRock,
}

impl SideCondition {
    pub fn name(self) -> &'static str {
        match self {
            SideCondition::Reflect => "Reflect",
            SideCondition::LightScreen => "Light Screen",
            SideCondition::StealthRock => "Stealth Rock",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct ActiveCondition {
    pub kind: SideCondition,
    /// `None` for hazards, which last until cleared.
    pub turns: Option<u8>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Field {
    pub weather: Weather,
    pub weather_turns: u8,
    pub trick_room_turns: u8,
    sides: [Vec<ActiveCondition>; 2],
}

impl Field {
    /// Returns false when the same weather is already active.
    pub fn set_weather(&mut self, weather: Weather, turns: u8) -> bool {
        if self.weather == weather {
            return false;
        }
        self.weather = weather;
        self.weather_turns = turns;
        true
    }

    /// Counts weather down; returns the weather that just ended.
    pub fn tick_weather(&mut self) -> Option<Weather> {
        if self.weather == Weather::Clear {
            return None;
        }
        self.weather_turns = self.weather_turns.saturating_sub(1);
        if self.weather_turns == 0 {
            let ended = self.weather;
            self.weather = Weather::Clear;
            return Some(ended);
        }
        None
    }

    pub fn trick_room(&self) -> bool {
        self.trick_room_turns > 0
    }

    /// Starts trick room, or ends it when already active. Returns whether it is now active.
    pub fn toggle_trick_room(&mut self) -> bool {
        if self.trick_room() {
            self.trick_room_turns = 0;
            false
        } else {
            self.trick_room_turns = TRICK_ROOM_TURNS;
            true
        }
    }

    pub fn conditions(&self, side: Side) -> &[ActiveCondition] {
        &self.sides[side.index()]
    }

    pub fn has_condition(&self, side: Side, kind: SideCondition) -> bool {
        self.sides[side.index()].iter().any(|c| c.kind == kind)
    }

    /// Returns false when the condition is already up on that side.
    pub fn add_condition(&mut self, side: Side, kind: SideCondition, turns: Option<u8>) -> bool {
        if self.has_condition(side, kind) {
            return false;
        }
        self.sides[side.index()].push(ActiveCondition { kind, turns });
        true
    }

    /// Counts down side conditions and trick room; returns what ended.
    pub fn tick_conditions(&mut self) -> (Vec<(Side, SideCondition)>, bool) {
        let mut ended = Vec::new();
        for side in Side::BOTH {
            let list = std::mem::take(&mut self.sides[side.index()]);
            self.sides[side.index()] = list
                .into_iter()
                .filter_map(|mut cond| match cond.turns {
                    None => Some(cond),
                    Some(turns) => {
                        let left = turns.saturating_sub(1);
                        if left == 0 {
                            ended.push((side, cond.kind));
                            None
                        } else {
                            cond.turns = Some(left);
                            Some(cond)
                        }
                    }
                })
                .collect();
        }
        let trick_room_ended = if self.trick_room() {
            self.trick_room_turns -= 1;
            self.trick_room_turns == 0
        } else {
            false
        };
        (ended, trick_room_ended)
    }
}
