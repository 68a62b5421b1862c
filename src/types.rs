use crate::error::{BattleError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    Normal,
    Fire,
    Water,
    Electric,
    Grass,
    Ice,
    Fighting,
    Poison,
    Ground,
    Flying,
    Psychic,
    Bug,
    Rock,
    Ghost,
    Dragon,
    Dark,
    Steel,
    Fairy,
}

impl Type {
    pub const ALL: [Type; 18] = [
        Type::Normal,
        Type::Fire,
        Type::Water,
        Type::Electric,
        Type::Grass,
        Type::Ice,
        Type::Fighting,
        Type::Poison,
        Type::Ground,
        Type::Flying,
        Type::Psychic,
        Type::Bug,
        Type::Rock,
        Type::Ghost,
        Type::Dragon,
        Type::Dark,
        Type::Steel,
        Type::Fairy,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Type::Normal => "normal",
            Type::Fire => "fire",
            Type::Water => "water",
            Type::Electric => "electric",
            Type::Grass => "grass",
            Type::Ice => "ice",
            Type::Fighting => "fighting",
            Type::Poison => "poison",
            Type::Ground => "ground",
            Type::Flying => "flying",
            Type::Psychic => "psychic",
            Type::Bug => "bug",
            Type::Rock => "rock",
            Type::Ghost => "ghost",
            Type::Dragon => "dragon",
            Type::Dark => "dark",
            Type::Steel => "steel",
            Type::Fairy => "fairy",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Type {
    type Err = BattleError;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        Type::ALL
            .iter()
            .copied()
            .find(|t| t.name() == lowered)
            .ok_or_else(|| BattleError::validation(format!("unknown type {s:?}")))
    }
}

/// Immutable attacking-type x defending-type multiplier table.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeChart {
    table: [[f64; 18]; 18],
}

impl Default for TypeChart {
    fn default() -> Self {
        Self::standard()
    }
}

impl TypeChart {
    // Ref: pokemon-showdown/sim/dex-data.ts type chart.
    pub fn standard() -> Self {
        let mut table = [[1.0; 18]; 18];
        for attacking in Type::ALL {
            for defending in Type::ALL {
                table[attacking.index()][defending.index()] =
                    standard_effectiveness(attacking, defending);
            }
        }
        Self { table }
    }

    /// A neutral chart with every pair at 1.
    pub fn neutral() -> Self {
        Self {
            table: [[1.0; 18]; 18],
        }
    }

    /// Builds a chart from `{ "fire": { "grass": 2.0 } }`; absent pairs are 1.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let parsed: HashMap<String, HashMap<String, f64>> = serde_json::from_str(raw)
            .map_err(|err| BattleError::validation(format!("type chart: {err}")))?;
        let mut chart = Self::neutral();
        chart.apply_overrides(&parsed)?;
        Ok(chart)
    }

    /// Overwrites the named pairs, keyed by attacking then defending type name.
    pub fn apply_overrides(
        &mut self,
        overrides: &HashMap<String, HashMap<String, f64>>,
    ) -> Result<()> {
        for (attacking, row) in overrides {
            let attacking: Type = attacking.parse()?;
            for (defending, value) in row {
                let defending: Type = defending.parse()?;
                self.set(attacking, defending, *value)?;
            }
        }
        Ok(())
    }

    pub fn set(&mut self, attacking: Type, defending: Type, value: f64) -> Result<()> {
        if ![0.0, 0.5, 1.0, 2.0].contains(&value) {
            return Err(BattleError::validation(format!(
                "type chart entry {attacking}->{defending} must be 0, 0.5, 1 or 2, got {value}"
            )));
        }
        self.table[attacking.index()][defending.index()] = value;
        Ok(())
    }

    pub fn single(&self, attacking: Type, defending: Type) -> f64 {
        self.table[attacking.index()][defending.index()]
    }

    /// Product across every defending type.
    pub fn effectiveness(&self, attacking: Type, defending: &[Type]) -> f64 {
        defending
            .iter()
            .map(|t| self.single(attacking, *t))
            .product()
    }
}

fn standard_effectiveness(attacking: Type, defending: Type) -> f64 {
    use Type::*;
    match attacking {
        Normal => match defending {
            Rock | Steel => 0.5,
            Ghost => 0.0,
            _ => 1.0,
        },
        Fire => match defending {
            Fire | Water | Rock | Dragon => 0.5,
            Grass | Ice | Bug | Steel => 2.0,
            _ => 1.0,
        },
        Water => match defending {
            Water | Grass | Dragon => 0.5,
            Fire | Ground | Rock => 2.0,
            _ => 1.0,
        },
        Electric => match defending {
            Electric | Grass | Dragon => 0.5,
            Water | Flying => 2.0,
            Ground => 0.0,
            _ => 1.0,
        },
        Grass => match defending {
            Fire | Grass | Poison | Flying | Bug | Dragon | Steel => 0.5,
            Water | Ground | Rock => 2.0,
            _ => 1.0,
        },
        Ice => match defending {
            Fire | Water | Ice | Steel => 0.5,
            Grass | Ground | Flying | Dragon => 2.0,
            _ => 1.0,
        },
        Fighting => match defending {
            Normal | Ice | Rock | Dark | Steel => 2.0,
            Poison | Flying | Psychic | Bug | Fairy => 0.5,
            Ghost => 0.0,
            _ => 1.0,
        },
        Poison => match defending {
            Grass | Fairy => 2.0,
            Poison | Ground | Rock | Ghost => 0.5,
            Steel => 0.0,
            _ => 1.0,
        },
        Ground => match defending {
            Fire | Electric | Poison | Rock | Steel => 2.0,
            Grass | Bug => 0.5,
            Flying => 0.0,
            _ => 1.0,
        },
        Flying => match defending {
            Grass | Fighting | Bug => 2.0,
            Electric | Rock | Steel => 0.5,
            _ => 1.0,
        },
        Psychic => match defending {
            Fighting | Poison => 2.0,
            Psychic | Steel => 0.5,
            Dark => 0.0,
            _ => 1.0,
        },
        Bug => match defending {
            Grass | Psychic | Dark => 2.0,
            Fire | Fighting | Poison | Flying | Ghost | Steel | Fairy => 0.5,
            _ => 1.0,
        },
        Rock => match defending {
            Fire | Ice | Flying | Bug => 2.0,
            Fighting | Ground | Steel => 0.5,
            _ => 1.0,
        },
        Ghost => match defending {
            Ghost | Psychic => 2.0,
            Dark => 0.5,
            Normal => 0.0,
            _ => 1.0,
        },
        Dragon => match defending {
            Dragon => 2.0,
            Steel => 0.5,
            Fairy => 0.0,
            _ => 1.0,
        },
        Dark => match defending {
            Psychic | Ghost => 2.0,
            Fighting | Dark | Fairy => 0.5,
            _ => 1.0,
        },
        Steel => match defending {
            Rock | Ice | Fairy => 2.0,
            Fire | Water | Electric | Steel => 0.5,
            _ => 1.0,
        },
        Fairy => match defending {
            Fighting | Dragon | Dark => 2.0,
            Fire | Poison | Steel => 0.5,
            _ => 1.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ice_against_water_ground_is_neutral() {
        let chart = TypeChart::standard();
        assert_eq!(chart.effectiveness(Type::Ice, &[Type::Water, Type::Ground]), 1.0);
    }

    #[test]
    fn dual_weakness_and_immunity_multiply() {
        let chart = TypeChart::standard();
        assert_eq!(chart.effectiveness(Type::Ice, &[Type::Dragon, Type::Flying]), 4.0);
        assert_eq!(chart.effectiveness(Type::Electric, &[Type::Water, Type::Ground]), 0.0);
    }

    #[test]
    fn json_chart_defaults_missing_pairs_to_neutral() {
        let chart =
            TypeChart::from_json_str(r#"{ "fire": { "grass": 2.0, "water": 0.5 } }"#).unwrap();
        assert_eq!(chart.single(Type::Fire, Type::Grass), 2.0);
        assert_eq!(chart.single(Type::Fire, Type::Water), 0.5);
        assert_eq!(chart.single(Type::Water, Type::Fire), 1.0);
    }

    #[test]
    fn json_chart_rejects_bad_values_and_names() {
        assert!(TypeChart::from_json_str(r#"{ "fire": { "grass": 3.0 } }"#).is_err());
        assert!(TypeChart::from_json_str(r#"{ "plasma": { "grass": 2.0 } }"#).is_err());
    }

    #[test]
    fn type_names_parse_case_insensitively() {
        assert_eq!("Fire".parse::<Type>().unwrap(), Type::Fire);
        assert_eq!(" STEEL ".parse::<Type>().unwrap(), Type::Steel);
    }
}
