pub mod batch;
pub mod battle_log;
pub mod config;
pub mod error;
pub mod model;
pub mod sim;
pub mod types;

pub use crate::error::{BattleError, Result};
pub use crate::sim::battle::{Battle, BattleOutcome};

use crate::batch::simulate_many;
use crate::config::BattleConfig;
use crate::model::BattleFile;
use crate::sim::ai::RandomSelector;
use crate::sim::combatant::Combatant;
use crate::sim::rng::SeededRng;
use crate::types::TypeChart;
use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct CliOptions {
    pub battle_path: PathBuf,
    pub type_chart_path: Option<PathBuf>,
    /// Replaces the battle file's `config` section.
    pub config_path: Option<PathBuf>,
    pub seed: Option<u64>,
    pub battles: usize,
    pub log_json: Option<PathBuf>,
}

/// A parsed battle file, ready to play.
#[derive(Debug, Clone)]
pub struct LoadedBattle {
    pub side_a: Combatant,
    pub side_b: Combatant,
    pub chart: TypeChart,
    pub config: BattleConfig,
}

pub fn load_battle(path: &Path) -> anyhow::Result<LoadedBattle> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read battle file at {}", path.display()))?;
    let parsed: BattleFile = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse JSON from {}", path.display()))?;
    let side_a = Combatant::from_spec(&parsed.side_a).context("Invalid side A")?;
    let side_b = Combatant::from_spec(&parsed.side_b).context("Invalid side B")?;
    let mut chart = TypeChart::standard();
    if let Some(overrides) = &parsed.type_chart {
        chart.apply_overrides(overrides).context("Invalid type chart overrides")?;
    }
    Ok(LoadedBattle {
        side_a,
        side_b,
        chart,
        config: parsed.config.unwrap_or_default(),
    })
}

pub fn load_type_chart(path: &Path) -> anyhow::Result<TypeChart> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read type chart at {}", path.display()))?;
    TypeChart::from_json_str(&raw)
        .with_context(|| format!("Invalid type chart in {}", path.display()))
}

pub fn run(opts: CliOptions) -> anyhow::Result<()> {
    if opts.battles == 0 {
        anyhow::bail!("--battles must be > 0");
    }
    let mut loaded = load_battle(&opts.battle_path)?;
    if let Some(path) = &opts.type_chart_path {
        loaded.chart = load_type_chart(path)?;
    }
    if let Some(path) = &opts.config_path {
        loaded.config = BattleConfig::from_path(path)?;
    }
    let mut config = loaded.config.clone().with_env_overrides()?;
    if let Some(seed) = opts.seed {
        config.seed = seed;
    }

    if opts.battles > 1 {
        let tally = simulate_many(
            &loaded.side_a,
            &loaded.side_b,
            &loaded.chart,
            &config,
            opts.battles,
        )?;
        println!(
            "{} vs {}: {} wins, {} losses, {} draws (win rate {:.4})",
            loaded.side_a.name,
            loaded.side_b.name,
            tally.a_wins,
            tally.b_wins,
            tally.draws,
            tally.win_rate()
        );
        return Ok(());
    }

    let seed = config.seed;
    let mut battle = Battle::new(loaded.side_a, loaded.side_b, &loaded.chart, config)?;
    let mut rng = SeededRng::new(seed);
    let mut select_a = RandomSelector::new(seed ^ 0xA);
    let mut select_b = RandomSelector::new(seed ^ 0xB);
    let outcome = battle.run(&mut select_a, &mut select_b, &mut rng)?;
    info!(?outcome, turns = battle.turn(), "battle finished");
    for line in battle.log().render_lines() {
        println!("{line}");
    }
    if let Some(path) = &opts.log_json {
        let json = serde_json::to_string_pretty(&battle.log().to_json())?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write log to {}", path.display()))?;
    }
    Ok(())
}
