pub mod ai;
pub mod battle;
pub mod combatant;
pub mod damage;
pub mod effects;
pub mod field;
pub mod mega;
pub mod moves;
pub mod rng;
pub mod stats;
pub mod status;

use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::A, Side::B];

    pub fn opponent(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }

    /// Protocol identifier: p1a / p2a.
    pub fn ident(self) -> &'static str {
        match self {
            Side::A => "p1a",
            Side::B => "p2a",
        }
    }
}

pub(crate) fn normalize_id(name: &str) -> String {
    name.to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}
