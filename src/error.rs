use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BattleError {
    #[error("invalid definition: {0}")]
    Validation(String),
    #[error("illegal action: {0}")]
    IllegalAction(String),
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    #[error("random source failure: {0}")]
    RandomSource(String),
    #[error("battle is over")]
    BattleOver,
}

impl BattleError {
    pub fn validation(msg: impl Into<String>) -> Self {
        BattleError::Validation(msg.into())
    }

    /// Fatal errors abort the battle; illegal actions are re-queried.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, BattleError::IllegalAction(_))
    }
}

pub type Result<T, E = BattleError> = std::result::Result<T, E>;
