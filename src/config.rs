use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

fn default_max_turns() -> u32 {
    500
}

fn default_max_selection_attempts() -> u32 {
    3
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BattleConfig {
    /// A battle still running after this many rounds ends in a draw.
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
    #[serde(default = "default_max_selection_attempts")]
    pub max_selection_attempts: u32,
    #[serde(default)]
    pub seed: u64,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            max_selection_attempts: default_max_selection_attempts(),
            seed: 0,
        }
    }
}

impl BattleConfig {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// Applies `BATTLE_SEED` and `BATTLE_MAX_TURNS` when set.
    pub fn with_env_overrides(mut self) -> anyhow::Result<Self> {
        if let Ok(seed) = std::env::var("BATTLE_SEED") {
            self.seed = seed
                .parse()
                .with_context(|| format!("BATTLE_SEED must be an integer, got {seed}"))?;
        }
        if let Ok(turns) = std::env::var("BATTLE_MAX_TURNS") {
            self.max_turns = turns
                .parse()
                .with_context(|| format!("BATTLE_MAX_TURNS must be an integer, got {turns}"))?;
        }
        Ok(self)
    }
}
